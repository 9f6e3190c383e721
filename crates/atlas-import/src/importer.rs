//! The sheet-by-sheet import engine.
//!
//! The whole workbook runs inside one transaction on the caller's tenant
//! session; every row gets its own savepoint so a bad row rolls back only
//! itself. Dry runs always roll the outer transaction back, which keeps the
//! database byte-identical no matter how far the import got. Real runs that
//! blow the error budget commit what succeeded and report a top-level error
//! next to the partial summary.

use calamine::{Data, Reader, Xlsx};
use serde::Serialize;
use sqlx::{Acquire, Postgres, QueryBuilder, Transaction};
use std::collections::BTreeMap;
use std::io::Cursor;

use atlas_core::AppError;
use atlas_db::session::TenantSession;

use crate::mapping::{
    ComputedFn, MappingConfig, NaturalKey, SheetMapping, SubtypeMapping, ASSET_FIELDS,
};
use crate::value::{cidr_from, parse_cell, CellValue};

/// Per-sheet cap on recorded error samples; the error *count* is unbounded.
pub const ERROR_SAMPLE_CAP: usize = 10;

pub const DEFAULT_MAX_ERRORS: usize = 50;

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub site_id: i64,
    pub dry_run: bool,
    pub max_errors: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    pub sheet: String,
    /// 1-based, counting the header row as row 1.
    pub row: u32,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SheetSummary {
    pub name: String,
    pub inserted: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errors: u64,
    #[serde(rename = "error_samples", skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<RowError>,
}

impl SheetSummary {
    fn new(name: &str) -> Self {
        SheetSummary {
            name: name.to_string(),
            inserted: 0,
            updated: 0,
            skipped: 0,
            errors: 0,
            samples: Vec::new(),
        }
    }

    fn record_error(&mut self, sheet: &str, row: u32, message: String) {
        self.errors += 1;
        if self.samples.len() < ERROR_SAMPLE_CAP {
            self.samples.push(RowError {
                sheet: sheet.to_string(),
                row,
                message,
            });
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub inserted: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errors: u64,
    pub dry_run: bool,
    pub sheets: Vec<SheetSummary>,
}

impl ImportSummary {
    fn new(dry_run: bool) -> Self {
        ImportSummary {
            inserted: 0,
            updated: 0,
            skipped: 0,
            errors: 0,
            dry_run,
            sheets: Vec::new(),
        }
    }

    fn absorb(&mut self, sheet: SheetSummary) {
        self.inserted += sheet.inserted;
        self.updated += sheet.updated;
        self.skipped += sheet.skipped;
        self.errors += sheet.errors;
        self.sheets.push(sheet);
    }
}

/// Result of a run: the summary plus, when the error budget was exceeded, a
/// top-level failure message to surface alongside the partial summary.
#[derive(Debug)]
pub struct ImportOutcome {
    pub summary: ImportSummary,
    pub error: Option<String>,
}

enum RowAction {
    Inserted,
    Updated,
}

/// Run a workbook import on the tenant session.
pub async fn import_workbook(
    session: &mut TenantSession,
    bytes: &[u8],
    mapping: &MappingConfig,
    opts: &ImportOptions,
) -> Result<ImportOutcome, AppError> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| AppError::Validation(format!("failed to open Excel file: {e}")))?;

    let org_id = session.org_id();
    let mut summary = ImportSummary::new(opts.dry_run);
    let mut failure: Option<String> = None;

    let mut tx = session.conn().begin().await?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    for sheet_name in sheet_names {
        // Sheets without a mapping entry are silently skipped.
        let Some(sheet_cfg) = mapping.sheets.get(&sheet_name) else {
            continue;
        };
        let range = match workbook.worksheet_range(&sheet_name) {
            Ok(range) => range,
            Err(e) => {
                let mut sheet_summary = SheetSummary::new(&sheet_name);
                sheet_summary.record_error(&sheet_name, 1, format!("failed to read sheet: {e}"));
                summary.absorb(sheet_summary);
                continue;
            }
        };

        let mut sheet_summary = SheetSummary::new(&sheet_name);
        let mut rows = range.rows();
        let Some(header_cells) = rows.next() else {
            summary.absorb(sheet_summary);
            continue;
        };
        let headers = resolve_headers(&to_strings(header_cells), sheet_cfg);

        for (i, row_cells) in rows.enumerate() {
            // 1-based row number counting the header row as row 1.
            let display_row = i as u32 + 2;
            let cells = to_strings(row_cells);
            if cells.iter().all(|c| c.is_empty()) {
                sheet_summary.skipped += 1;
                continue;
            }

            let outcome = match build_row(&cells, &headers, sheet_cfg, &mapping.default_fields) {
                Ok(row) => apply_row(&mut tx, org_id, opts.site_id, sheet_cfg, &row).await,
                Err(message) => Err(message),
            };

            match outcome {
                Ok(RowAction::Inserted) => sheet_summary.inserted += 1,
                Ok(RowAction::Updated) => sheet_summary.updated += 1,
                Err(message) => {
                    sheet_summary.record_error(&sheet_name, display_row, message);
                    if summary.errors + sheet_summary.errors > opts.max_errors as u64 {
                        failure = Some(format!(
                            "too many errors ({}), stopping import",
                            summary.errors + sheet_summary.errors
                        ));
                        break;
                    }
                }
            }
        }

        tracing::debug!(
            sheet = %sheet_name,
            inserted = sheet_summary.inserted,
            updated = sheet_summary.updated,
            skipped = sheet_summary.skipped,
            errors = sheet_summary.errors,
            "sheet processed"
        );
        summary.absorb(sheet_summary);
        if failure.is_some() {
            break;
        }
    }

    if opts.dry_run {
        tx.rollback().await?;
    } else {
        tx.commit().await?;
    }

    Ok(ImportOutcome {
        summary,
        error: failure,
    })
}

fn to_strings(cells: &[Data]) -> Vec<String> {
    cells
        .iter()
        .map(|cell| match cell {
            Data::Empty => String::new(),
            Data::String(s) => s.trim().to_string(),
            Data::Int(i) => i.to_string(),
            Data::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{}", *f as i64)
                } else {
                    f.to_string()
                }
            }
            Data::Bool(b) => b.to_string(),
            Data::DateTime(dt) => dt
                .as_datetime()
                .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
            Data::DateTimeIso(s) => s.trim().to_string(),
            Data::DurationIso(s) => s.trim().to_string(),
            Data::Error(_) => String::new(),
        })
        .collect()
}

struct ResolvedHeaders {
    /// Declared column header key → sheet column index.
    columns: BTreeMap<String, usize>,
    /// Headers present in the sheet but not declared anywhere; these feed the
    /// asset's `extras` map.
    unknown: Vec<(String, usize)>,
}

fn resolve_headers(cells: &[String], sheet: &SheetMapping) -> ResolvedHeaders {
    let mut by_upper: BTreeMap<String, usize> = BTreeMap::new();
    for (idx, header) in cells.iter().enumerate() {
        if header.is_empty() {
            continue;
        }
        by_upper.entry(header.to_uppercase()).or_insert(idx);
    }

    let mut columns = BTreeMap::new();
    let mut claimed = vec![false; cells.len()];

    for (header_key, column) in &sheet.columns {
        let mut found = by_upper.get(&header_key.to_uppercase()).copied();
        if found.is_none() {
            // Aliases may be keyed by the column header or the target field.
            let alias_lists = [sheet.aliases.get(header_key), sheet.aliases.get(&column.field)];
            'aliases: for aliases in alias_lists.into_iter().flatten() {
                for alias in aliases {
                    if let Some(idx) = by_upper.get(&alias.to_uppercase()) {
                        found = Some(*idx);
                        break 'aliases;
                    }
                }
            }
        }
        if let Some(idx) = found {
            columns.insert(header_key.clone(), idx);
            claimed[idx] = true;
        }
    }

    let unknown = cells
        .iter()
        .enumerate()
        .filter(|(idx, header)| !header.is_empty() && !claimed[*idx])
        .map(|(idx, header)| (header.clone(), idx))
        .collect();

    ResolvedHeaders { columns, unknown }
}

#[derive(Debug)]
struct RowData {
    /// Parsed values keyed by target field name.
    fields: BTreeMap<String, CellValue>,
    /// Cells under undeclared headers, kept verbatim.
    extras: serde_json::Map<String, serde_json::Value>,
}

fn build_row(
    cells: &[String],
    headers: &ResolvedHeaders,
    sheet: &SheetMapping,
    defaults: &BTreeMap<String, String>,
) -> Result<RowData, String> {
    let mut fields = BTreeMap::new();

    for (header_key, column) in &sheet.columns {
        let raw = headers
            .columns
            .get(header_key)
            .and_then(|idx| cells.get(*idx))
            .map(String::as_str)
            .unwrap_or("");
        if raw.is_empty() {
            if column.optional {
                continue;
            }
            return Err(format!("required column {header_key} is missing"));
        }
        let value = parse_cell(raw, column.ty)
            .map_err(|msg| format!("failed to parse {header_key}: {msg}"))?;
        fields.insert(column.field.clone(), value);
    }

    for (field, literal) in &sheet.to_asset {
        fields.insert(field.clone(), CellValue::Text(literal.clone()));
    }

    for (field, computed) in &sheet.computed {
        match computed.function {
            ComputedFn::CidrFrom => {
                let network = fields.get(&computed.args[0]);
                let prefix = fields.get(&computed.args[1]);
                // Absent arguments just skip the computation; present but
                // mistyped arguments are a row error.
                if let (Some(network), Some(prefix)) = (network, prefix) {
                    let value = cidr_from(network, prefix)?;
                    fields.insert(field.clone(), value);
                }
            }
        }
    }

    if !fields.contains_key("status") {
        if let Some(status) = defaults.get("status_default") {
            fields.insert("status".to_string(), CellValue::Text(status.clone()));
        }
    }

    let mut extras = serde_json::Map::new();
    for (header, idx) in &headers.unknown {
        if let Some(raw) = cells.get(*idx) {
            if !raw.is_empty() {
                extras.insert(header.clone(), serde_json::Value::String(raw.clone()));
            }
        }
    }

    Ok(RowData { fields, extras })
}

fn row_asset_type<'a>(row: &'a RowData, sheet: &'a SheetMapping) -> &'a str {
    row.fields
        .get("asset_type")
        .and_then(CellValue::as_text)
        .unwrap_or(&sheet.asset_type)
}

fn push_cell(qb: &mut QueryBuilder<'_, Postgres>, value: &CellValue) {
    match value {
        CellValue::Text(s) => {
            qb.push_bind(s.clone());
        }
        CellValue::Int(i) => {
            qb.push_bind(*i);
        }
        CellValue::Bool(b) => {
            qb.push_bind(*b);
        }
        CellValue::Inet(ip) => {
            qb.push_bind(*ip);
        }
        CellValue::Cidr(net) => {
            qb.push_bind(*net);
        }
        CellValue::Timestamp(ts) => {
            qb.push_bind(*ts);
        }
    }
}

async fn apply_row(
    tx: &mut Transaction<'_, Postgres>,
    org_id: i64,
    site_id: i64,
    sheet: &SheetMapping,
    row: &RowData,
) -> Result<RowAction, String> {
    let mut sp = tx.begin().await.map_err(|e| e.to_string())?;
    let result = apply_row_inner(&mut sp, org_id, site_id, sheet, row).await;
    match result {
        Ok(action) => {
            sp.commit().await.map_err(|e| e.to_string())?;
            Ok(action)
        }
        Err(message) => {
            let _ = sp.rollback().await;
            Err(message)
        }
    }
}

async fn apply_row_inner(
    sp: &mut Transaction<'_, Postgres>,
    org_id: i64,
    site_id: i64,
    sheet: &SheetMapping,
    row: &RowData,
) -> Result<RowAction, String> {
    let asset_type = row_asset_type(row, sheet);

    let existing = find_existing(sp, org_id, site_id, asset_type, row, &sheet.natural_key)
        .await
        .map_err(|e| e.to_string())?;

    let (asset_id, action) = match existing {
        Some(id) => {
            update_asset(sp, id, org_id, row).await.map_err(db_message)?;
            (id, RowAction::Updated)
        }
        None => {
            let id = insert_asset(sp, org_id, site_id, asset_type, row)
                .await
                .map_err(db_message)?;
            (id, RowAction::Inserted)
        }
    };

    if let Some(subtype) = &sheet.subtype {
        write_subtype(sp, subtype, asset_id, row)
            .await
            .map_err(db_message)?;
    }

    Ok(action)
}

fn db_message(err: sqlx::Error) -> String {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            "duplicate row violates a unique constraint".to_string()
        }
        _ => err.to_string(),
    }
}

async fn find_existing(
    sp: &mut Transaction<'_, Postgres>,
    org_id: i64,
    site_id: i64,
    asset_type: &str,
    row: &RowData,
    keys: &[NaturalKey],
) -> Result<Option<i64>, sqlx::Error> {
    for key in keys {
        let Some(value) = row.fields.get(key.field()) else {
            continue;
        };

        let id: Option<i64> = match key {
            NaturalKey::Serial | NaturalKey::Name => {
                let Some(text) = value.as_text() else { continue };
                sqlx::query_scalar(&format!(
                    "SELECT id FROM assets \
                     WHERE org_id = $1 AND site_id = $2 AND asset_type = $3 AND {} = $4",
                    key.field()
                ))
                .bind(org_id)
                .bind(site_id)
                .bind(asset_type)
                .bind(text)
                .fetch_optional(&mut **sp)
                .await?
            }
            NaturalKey::MgmtIp => {
                let Some(ip) = value.as_inet() else { continue };
                sqlx::query_scalar(
                    "SELECT id FROM assets \
                     WHERE org_id = $1 AND site_id = $2 AND asset_type = $3 AND mgmt_ip = $4",
                )
                .bind(org_id)
                .bind(site_id)
                .bind(asset_type)
                .bind(ip)
                .fetch_optional(&mut **sp)
                .await?
            }
            NaturalKey::VlanId => {
                let Some(vlan_id) = value.as_int() else { continue };
                sqlx::query_scalar(
                    "SELECT a.id FROM assets a \
                     JOIN asset_vlans v ON a.id = v.asset_id \
                     WHERE a.org_id = $1 AND a.site_id = $2 AND a.asset_type = $3 \
                       AND v.vlan_id = $4",
                )
                .bind(org_id)
                .bind(site_id)
                .bind(asset_type)
                .bind(vlan_id)
                .fetch_optional(&mut **sp)
                .await?
            }
        };

        if id.is_some() {
            return Ok(id);
        }
    }
    Ok(None)
}

async fn insert_asset(
    sp: &mut Transaction<'_, Postgres>,
    org_id: i64,
    site_id: i64,
    asset_type: &str,
    row: &RowData,
) -> Result<i64, sqlx::Error> {
    let present: Vec<(&str, &CellValue)> = ASSET_FIELDS
        .iter()
        .filter_map(|field| row.fields.get(*field).map(|v| (*field, v)))
        .collect();

    let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO assets (org_id, site_id, asset_type");
    for (field, _) in &present {
        qb.push(format!(", {field}"));
    }
    qb.push(", extras) VALUES (");
    qb.push_bind(org_id);
    qb.push(", ").push_bind(site_id);
    qb.push(", ").push_bind(asset_type.to_string());
    for (_, value) in &present {
        qb.push(", ");
        push_cell(&mut qb, value);
    }
    qb.push(", ")
        .push_bind(serde_json::Value::Object(row.extras.clone()))
        .push(") RETURNING id");

    qb.build_query_scalar().fetch_one(&mut **sp).await
}

async fn update_asset(
    sp: &mut Transaction<'_, Postgres>,
    asset_id: i64,
    org_id: i64,
    row: &RowData,
) -> Result<(), sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new("UPDATE assets SET updated_at = now()");
    for field in ASSET_FIELDS {
        if let Some(value) = row.fields.get(*field) {
            qb.push(format!(", {field} = "));
            push_cell(&mut qb, value);
        }
    }
    if !row.extras.is_empty() {
        // Merge, keeping keys from earlier imports that this file omits.
        qb.push(", extras = extras || ")
            .push_bind(serde_json::Value::Object(row.extras.clone()));
    }
    qb.push(" WHERE id = ")
        .push_bind(asset_id)
        .push(" AND org_id = ")
        .push_bind(org_id);

    qb.build().execute(&mut **sp).await?;
    Ok(())
}

async fn write_subtype(
    sp: &mut Transaction<'_, Postgres>,
    subtype: &SubtypeMapping,
    asset_id: i64,
    row: &RowData,
) -> Result<(), sqlx::Error> {
    let present: Vec<(&str, &CellValue)> = subtype
        .fields
        .iter()
        .filter_map(|(sub_field, source)| {
            row.fields.get(source).map(|v| (sub_field.as_str(), v))
        })
        .collect();
    if present.is_empty() {
        return Ok(());
    }

    let table = subtype.table.table_name();
    let mut qb = QueryBuilder::<Postgres>::new(format!("INSERT INTO {table} (asset_id"));
    for (field, _) in &present {
        qb.push(format!(", {field}"));
    }
    qb.push(") VALUES (");
    qb.push_bind(asset_id);
    for (_, value) in &present {
        qb.push(", ");
        push_cell(&mut qb, value);
    }
    qb.push(") ON CONFLICT (asset_id) DO UPDATE SET ");
    for (i, (field, _)) in present.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(format!("{field} = EXCLUDED.{field}"));
    }

    qb.build().execute(&mut **sp).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MappingConfig;

    fn mapping() -> MappingConfig {
        MappingConfig::builtin().unwrap()
    }

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn headers_resolve_directly_and_via_alias() {
        let mapping = mapping();
        let sheet = &mapping.sheets["Equipment"];
        let headers = resolve_headers(
            &strings(&["Name", "Serial Number", "mgmt ip", "Rack"]),
            sheet,
        );
        assert_eq!(headers.columns["Name"], 0);
        assert_eq!(headers.columns["Serial"], 1, "alias should resolve");
        assert_eq!(headers.columns["MgmtIP"], 2, "aliases are case-insensitive");
        assert_eq!(headers.unknown, vec![("Rack".to_string(), 3)]);
    }

    #[test]
    fn row_parses_declared_columns_and_collects_extras() {
        let mapping = mapping();
        let sheet = &mapping.sheets["Equipment"];
        let headers = resolve_headers(
            &strings(&["Name", "Serial", "MgmtIP", "NumPorts", "Rack"]),
            sheet,
        );
        let row = build_row(
            &strings(&["core-sw-01", "FDX1234", "10.0.0.1", "48", "R12"]),
            &headers,
            sheet,
            &mapping.default_fields,
        )
        .unwrap();

        assert_eq!(
            row.fields["name"],
            CellValue::Text("core-sw-01".to_string())
        );
        assert_eq!(row.fields["ports_total"], CellValue::Int(48));
        assert!(matches!(row.fields["mgmt_ip"], CellValue::Inet(_)));
        assert_eq!(row.extras["Rack"], serde_json::json!("R12"));
    }

    #[test]
    fn status_default_applies_only_when_absent() {
        let mapping = mapping();
        let sheet = &mapping.sheets["Equipment"];
        let headers = resolve_headers(&strings(&["Name", "Status"]), sheet);

        let row = build_row(
            &strings(&["sw-1", ""]),
            &headers,
            sheet,
            &mapping.default_fields,
        )
        .unwrap();
        assert_eq!(row.fields["status"], CellValue::Text("active".to_string()));

        let row = build_row(
            &strings(&["sw-1", "retired"]),
            &headers,
            sheet,
            &mapping.default_fields,
        )
        .unwrap();
        assert_eq!(row.fields["status"], CellValue::Text("retired".to_string()));
    }

    #[test]
    fn bad_ip_is_a_row_error() {
        let mapping = mapping();
        let sheet = &mapping.sheets["Equipment"];
        let headers = resolve_headers(&strings(&["Name", "MgmtIP"]), sheet);
        let err = build_row(
            &strings(&["sw-1", "not-an-ip"]),
            &headers,
            sheet,
            &mapping.default_fields,
        )
        .unwrap_err();
        assert!(err.contains("MgmtIP"), "{err}");
        assert!(err.contains("invalid IP address"), "{err}");
    }

    #[test]
    fn required_column_missing_is_a_row_error() {
        let mapping = mapping();
        let sheet = &mapping.sheets["VLANs"];
        // VlanID is required (INT without the optional marker).
        let headers = resolve_headers(&strings(&["Name"]), sheet);
        let err = build_row(
            &strings(&["office-vlan"]),
            &headers,
            sheet,
            &mapping.default_fields,
        )
        .unwrap_err();
        assert!(err.contains("VlanID"), "{err}");
    }

    #[test]
    fn computed_subnet_from_network_and_prefix() {
        let mapping = mapping();
        let sheet = &mapping.sheets["VLANs"];
        let headers = resolve_headers(&strings(&["VlanID", "Network", "Prefix"]), sheet);
        let row = build_row(
            &strings(&["120", "10.20.0.0", "24"]),
            &headers,
            sheet,
            &mapping.default_fields,
        )
        .unwrap();
        assert_eq!(
            row.fields["subnet"],
            CellValue::Cidr("10.20.0.0/24".parse().unwrap())
        );
    }

    #[test]
    fn computed_is_skipped_when_arguments_are_absent() {
        let mapping = mapping();
        let sheet = &mapping.sheets["VLANs"];
        let headers = resolve_headers(&strings(&["VlanID", "Network"]), sheet);
        let row = build_row(
            &strings(&["120", "10.20.0.0"]),
            &headers,
            sheet,
            &mapping.default_fields,
        )
        .unwrap();
        assert!(!row.fields.contains_key("subnet"));
    }

    #[test]
    fn to_asset_literal_overrides_sheet_type() {
        let yaml = r#"
version: 1
sheets:
  Gear:
    asset_type: device
    columns:
      Name: { field: name, type: "TEXT?" }
    to_asset:
      asset_type: firewall
"#;
        let mapping = MappingConfig::from_yaml(yaml).unwrap();
        let sheet = &mapping.sheets["Gear"];
        let headers = resolve_headers(&strings(&["Name"]), sheet);
        let row = build_row(&strings(&["fw-1"]), &headers, sheet, &BTreeMap::new()).unwrap();
        assert_eq!(row_asset_type(&row, sheet), "firewall");
    }

    #[test]
    fn summary_wire_shape() {
        let mut sheet = SheetSummary::new("Equipment");
        sheet.inserted = 3;
        sheet.record_error("Equipment", 4, "failed to parse MgmtIP".to_string());
        let mut summary = ImportSummary::new(true);
        summary.absorb(sheet);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["inserted"], 3);
        assert_eq!(json["errors"], 1);
        assert_eq!(json["dry_run"], true);
        assert_eq!(json["sheets"][0]["name"], "Equipment");
        assert_eq!(json["sheets"][0]["error_samples"][0]["row"], 4);
        assert_eq!(json["sheets"][0]["error_samples"][0]["sheet"], "Equipment");
    }

    #[test]
    fn clean_sheets_omit_error_samples() {
        let mut summary = ImportSummary::new(false);
        summary.absorb(SheetSummary::new("Equipment"));
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json["sheets"][0].get("error_samples").is_none());
    }

    #[test]
    fn error_samples_are_capped() {
        let mut sheet = SheetSummary::new("Equipment");
        for row in 0..25u32 {
            sheet.record_error("Equipment", row + 2, "bad row".to_string());
        }
        assert_eq!(sheet.errors, 25);
        assert_eq!(sheet.samples.len(), ERROR_SAMPLE_CAP);
    }

    #[test]
    fn cell_rendering() {
        let cells = vec![
            Data::String("  sw-1  ".into()),
            Data::Float(48.0),
            Data::Float(1.5),
            Data::Int(7),
            Data::Bool(true),
            Data::Empty,
        ];
        assert_eq!(to_strings(&cells), vec!["sw-1", "48", "1.5", "7", "true", ""]);
    }

    #[test]
    fn empty_row_detection() {
        let cells = to_strings(&[Data::Empty, Data::String("  ".into())]);
        assert!(cells.iter().all(|c| c.is_empty()));
    }
}
