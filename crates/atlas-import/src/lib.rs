//! Mapping-driven spreadsheet ingestion.
//!
//! A YAML mapping document declares, per sheet, how spreadsheet headers map
//! onto typed asset fields, which business fields form the natural key, and
//! which subtype table (if any) receives the remainder. The importer walks a
//! workbook sheet by sheet, parses each row through the declared types,
//! decides insert-vs-update by trying the natural key in order, and applies
//! each row atomically. Dry runs do all of the work inside a transaction that
//! is always rolled back.

pub mod importer;
pub mod mapping;
pub mod value;

pub use importer::{ImportOptions, ImportOutcome, ImportSummary, RowError, SheetSummary};
pub use mapping::MappingConfig;
