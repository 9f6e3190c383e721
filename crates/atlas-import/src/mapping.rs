//! The declarative header→field mapping document.
//!
//! Mappings are YAML, versioned, and validated strictly at load time: unknown
//! keys, unknown column types, unsupported natural keys, and non-identifier
//! field names are all rejected before any spreadsheet is touched. Field and
//! table names from the document end up inside SQL, so everything that is not
//! a bind parameter must pass the identifier check or a whitelist.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::value::ColumnType;

/// Asset columns a mapping may write to directly.
pub const ASSET_FIELDS: &[&str] = &[
    "name", "vendor", "model", "serial", "mgmt_ip", "status", "notes",
];

const BUILTIN_MAPPING: &str = include_str!("../mappings/equipment.yaml");

#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("failed to read mapping document: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid mapping document: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid mapping document: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMapping {
    version: u32,
    #[serde(default)]
    default_fields: BTreeMap<String, String>,
    sheets: BTreeMap<String, RawSheet>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSheet {
    asset_type: String,
    #[serde(default)]
    natural_key: Vec<String>,
    #[serde(default)]
    aliases: BTreeMap<String, Vec<String>>,
    columns: BTreeMap<String, RawColumn>,
    #[serde(default)]
    computed: BTreeMap<String, RawComputed>,
    #[serde(default)]
    subtype: Option<String>,
    #[serde(default)]
    subtype_fields: BTreeMap<String, String>,
    #[serde(default)]
    to_asset: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawColumn {
    field: String,
    #[serde(rename = "type")]
    ty: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawComputed {
    #[serde(rename = "fn")]
    function: String,
    args: Vec<String>,
}

/// Validated mapping document.
#[derive(Debug, Clone)]
pub struct MappingConfig {
    pub version: u32,
    pub default_fields: BTreeMap<String, String>,
    pub sheets: BTreeMap<String, SheetMapping>,
}

#[derive(Debug, Clone)]
pub struct SheetMapping {
    pub asset_type: String,
    pub natural_key: Vec<NaturalKey>,
    pub aliases: BTreeMap<String, Vec<String>>,
    pub columns: BTreeMap<String, ColumnMapping>,
    pub computed: BTreeMap<String, ComputedField>,
    pub subtype: Option<SubtypeMapping>,
    pub to_asset: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct ColumnMapping {
    pub field: String,
    pub ty: ColumnType,
    pub optional: bool,
}

/// Business fields usable for update-vs-insert resolution, in declared order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaturalKey {
    Serial,
    Name,
    MgmtIp,
    VlanId,
}

impl NaturalKey {
    pub fn field(&self) -> &'static str {
        match self {
            NaturalKey::Serial => "serial",
            NaturalKey::Name => "name",
            NaturalKey::MgmtIp => "mgmt_ip",
            NaturalKey::VlanId => "vlan_id",
        }
    }

    fn parse(s: &str) -> Option<NaturalKey> {
        match s {
            "serial" => Some(NaturalKey::Serial),
            "name" => Some(NaturalKey::Name),
            "mgmt_ip" => Some(NaturalKey::MgmtIp),
            "vlan_id" => Some(NaturalKey::VlanId),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComputedField {
    pub function: ComputedFn,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputedFn {
    CidrFrom,
}

#[derive(Debug, Clone)]
pub struct SubtypeMapping {
    pub table: SubtypeTable,
    /// subtype column → source field in the parsed row.
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtypeTable {
    Switches,
    Vlans,
}

impl SubtypeTable {
    pub fn table_name(&self) -> &'static str {
        match self {
            SubtypeTable::Switches => "asset_switches",
            SubtypeTable::Vlans => "asset_vlans",
        }
    }

    fn parse(s: &str) -> Option<SubtypeTable> {
        match s {
            "asset_switches" => Some(SubtypeTable::Switches),
            "asset_vlans" => Some(SubtypeTable::Vlans),
            _ => None,
        }
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl MappingConfig {
    /// Load a mapping from a file path, falling back to the built-in
    /// equipment mapping when the path does not exist.
    pub fn load(path: &str) -> Result<MappingConfig, MappingError> {
        if Path::new(path).exists() {
            let text = std::fs::read_to_string(path)?;
            Self::from_yaml(&text)
        } else {
            Self::builtin()
        }
    }

    pub fn builtin() -> Result<MappingConfig, MappingError> {
        Self::from_yaml(BUILTIN_MAPPING)
    }

    pub fn from_yaml(text: &str) -> Result<MappingConfig, MappingError> {
        let raw: RawMapping = serde_yaml::from_str(text)?;
        Self::compile(raw)
    }

    fn compile(raw: RawMapping) -> Result<MappingConfig, MappingError> {
        if raw.version != 1 {
            return Err(MappingError::Invalid(format!(
                "unsupported mapping version {}",
                raw.version
            )));
        }

        let mut sheets = BTreeMap::new();
        for (sheet_name, raw_sheet) in raw.sheets {
            let sheet = compile_sheet(&sheet_name, raw_sheet)?;
            sheets.insert(sheet_name, sheet);
        }

        Ok(MappingConfig {
            version: raw.version,
            default_fields: raw.default_fields,
            sheets,
        })
    }
}

fn compile_sheet(sheet_name: &str, raw: RawSheet) -> Result<SheetMapping, MappingError> {
    if raw.asset_type.trim().is_empty() {
        return Err(MappingError::Invalid(format!(
            "sheet {sheet_name}: asset_type must not be empty"
        )));
    }

    let mut natural_key = Vec::with_capacity(raw.natural_key.len());
    for key in &raw.natural_key {
        let parsed = NaturalKey::parse(key).ok_or_else(|| {
            MappingError::Invalid(format!("sheet {sheet_name}: unsupported natural key {key}"))
        })?;
        natural_key.push(parsed);
    }

    let mut columns = BTreeMap::new();
    for (header, raw_col) in raw.columns {
        if !is_identifier(&raw_col.field) {
            return Err(MappingError::Invalid(format!(
                "sheet {sheet_name}: column {header} maps to invalid field name {}",
                raw_col.field
            )));
        }
        let (ty_str, optional) = match raw_col.ty.strip_suffix('?') {
            Some(base) => (base, true),
            None => (raw_col.ty.as_str(), false),
        };
        let ty = ColumnType::parse(ty_str).ok_or_else(|| {
            MappingError::Invalid(format!(
                "sheet {sheet_name}: column {header} has unknown type {}",
                raw_col.ty
            ))
        })?;
        columns.insert(
            header,
            ColumnMapping {
                field: raw_col.field,
                ty,
                optional,
            },
        );
    }

    let mut computed = BTreeMap::new();
    for (field, raw_comp) in raw.computed {
        if !is_identifier(&field) {
            return Err(MappingError::Invalid(format!(
                "sheet {sheet_name}: computed field has invalid name {field}"
            )));
        }
        let function = match raw_comp.function.as_str() {
            "cidr_from" => ComputedFn::CidrFrom,
            other => {
                return Err(MappingError::Invalid(format!(
                    "sheet {sheet_name}: unknown computed function {other}"
                )))
            }
        };
        if raw_comp.args.len() != 2 {
            return Err(MappingError::Invalid(format!(
                "sheet {sheet_name}: cidr_from takes exactly two arguments"
            )));
        }
        computed.insert(
            field,
            ComputedField {
                function,
                args: raw_comp.args,
            },
        );
    }

    let subtype = match raw.subtype {
        Some(table) => {
            let table = SubtypeTable::parse(&table).ok_or_else(|| {
                MappingError::Invalid(format!(
                    "sheet {sheet_name}: unknown subtype table {table}"
                ))
            })?;
            for (sub_field, source) in &raw.subtype_fields {
                if !is_identifier(sub_field) || !is_identifier(source) {
                    return Err(MappingError::Invalid(format!(
                        "sheet {sheet_name}: invalid subtype field mapping {sub_field}: {source}"
                    )));
                }
            }
            Some(SubtypeMapping {
                table,
                fields: raw.subtype_fields,
            })
        }
        None if !raw.subtype_fields.is_empty() => {
            return Err(MappingError::Invalid(format!(
                "sheet {sheet_name}: subtype_fields given without a subtype table"
            )));
        }
        None => None,
    };

    for field in raw.to_asset.keys() {
        if field != "asset_type" && !ASSET_FIELDS.contains(&field.as_str()) {
            return Err(MappingError::Invalid(format!(
                "sheet {sheet_name}: to_asset targets unknown asset field {field}"
            )));
        }
    }

    Ok(SheetMapping {
        asset_type: raw.asset_type,
        natural_key,
        aliases: raw.aliases,
        columns,
        computed,
        subtype,
        to_asset: raw.to_asset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version: 1
default_fields:
  status_default: active
sheets:
  Equipment:
    asset_type: switch
    natural_key: [serial, name]
    aliases:
      Serial: ["Serial Number", "S/N"]
    columns:
      Name: { field: name, type: "TEXT?" }
      Serial: { field: serial, type: "TEXT?" }
      MgmtIP: { field: mgmt_ip, type: "INET?" }
      NumPorts: { field: ports_total, type: "INT?" }
    subtype: asset_switches
    subtype_fields:
      ports_total: ports_total
"#;

    #[test]
    fn sample_mapping_loads() {
        let mapping = MappingConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(mapping.version, 1);
        let sheet = &mapping.sheets["Equipment"];
        assert_eq!(sheet.asset_type, "switch");
        assert_eq!(sheet.natural_key, vec![NaturalKey::Serial, NaturalKey::Name]);
        let serial = &sheet.columns["Serial"];
        assert!(serial.optional);
        assert_eq!(serial.ty, crate::value::ColumnType::Text);
        let subtype = sheet.subtype.as_ref().unwrap();
        assert_eq!(subtype.table.table_name(), "asset_switches");
    }

    #[test]
    fn builtin_mapping_is_valid() {
        let mapping = MappingConfig::builtin().unwrap();
        assert!(mapping.sheets.contains_key("Equipment"));
        assert!(mapping.sheets.contains_key("VLANs"));
    }

    #[test]
    fn unknown_top_level_keys_are_rejected() {
        let text = SAMPLE.replace("default_fields", "defualt_fields");
        assert!(MappingConfig::from_yaml(&text).is_err());
    }

    #[test]
    fn unknown_column_type_is_rejected() {
        let text = SAMPLE.replace("\"INET?\"", "\"IPADDR\"");
        let err = MappingConfig::from_yaml(&text).unwrap_err();
        assert!(err.to_string().contains("unknown type"));
    }

    #[test]
    fn unsupported_natural_key_is_rejected() {
        let text = SAMPLE.replace("[serial, name]", "[serial, firmware]");
        let err = MappingConfig::from_yaml(&text).unwrap_err();
        assert!(err.to_string().contains("unsupported natural key"));
    }

    #[test]
    fn subtype_table_is_whitelisted() {
        let text = SAMPLE.replace("asset_switches", "pg_catalog");
        assert!(MappingConfig::from_yaml(&text).is_err());
    }

    #[test]
    fn hostile_field_names_are_rejected() {
        let text = SAMPLE.replace("field: serial", "field: \"serial; DROP TABLE assets\"");
        assert!(MappingConfig::from_yaml(&text).is_err());
    }

    #[test]
    fn wrong_version_is_rejected() {
        let text = SAMPLE.replace("version: 1", "version: 2");
        assert!(MappingConfig::from_yaml(&text).is_err());
    }

    #[test]
    fn identifier_check() {
        assert!(is_identifier("ports_total"));
        assert!(is_identifier("_private"));
        assert!(!is_identifier("Ports"));
        assert!(!is_identifier("1port"));
        assert!(!is_identifier("drop table"));
        assert!(!is_identifier(""));
    }
}
