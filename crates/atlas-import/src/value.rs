//! Typed cell parsing for the import pipeline.

use chrono::NaiveDateTime;
use ipnetwork::IpNetwork;
use std::net::IpAddr;

/// Column type declared in the mapping document. A trailing `?` in the
/// document marks the column optional and is stripped during mapping load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Int,
    Bool,
    Inet,
    Cidr,
    Timestamp,
}

impl ColumnType {
    pub fn parse(s: &str) -> Option<ColumnType> {
        match s {
            "TEXT" => Some(ColumnType::Text),
            "INT" => Some(ColumnType::Int),
            "BOOL" => Some(ColumnType::Bool),
            "INET" => Some(ColumnType::Inet),
            "CIDR" => Some(ColumnType::Cidr),
            "TIMESTAMP" => Some(ColumnType::Timestamp),
            _ => None,
        }
    }
}

/// A parsed cell, carrying the concrete type the database column expects.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Int(i64),
    Bool(bool),
    Inet(IpAddr),
    Cidr(IpNetwork),
    Timestamp(NaiveDateTime),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            CellValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_inet(&self) -> Option<IpAddr> {
        match self {
            CellValue::Inet(ip) => Some(*ip),
            _ => None,
        }
    }
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y",
    "%m/%d/%Y %H:%M:%S",
];

/// Parse a trimmed, non-empty cell into the declared type.
pub fn parse_cell(raw: &str, ty: ColumnType) -> Result<CellValue, String> {
    match ty {
        ColumnType::Text => Ok(CellValue::Text(raw.to_string())),
        ColumnType::Int => raw
            .parse::<i64>()
            .map(CellValue::Int)
            .map_err(|_| format!("invalid integer: {raw}")),
        ColumnType::Bool => {
            let lower = raw.to_lowercase();
            Ok(CellValue::Bool(matches!(
                lower.as_str(),
                "yes" | "y" | "true" | "1"
            )))
        }
        ColumnType::Inet => raw
            .parse::<IpAddr>()
            .map(CellValue::Inet)
            .map_err(|_| format!("invalid IP address: {raw}")),
        ColumnType::Cidr => raw
            .parse::<IpNetwork>()
            .map(CellValue::Cidr)
            .map_err(|_| format!("invalid CIDR: {raw}")),
        ColumnType::Timestamp => {
            for format in TIMESTAMP_FORMATS {
                if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
                    return Ok(CellValue::Timestamp(ts));
                }
                // Date-only formats need the midnight time added by hand.
                if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, format) {
                    return Ok(CellValue::Timestamp(date.and_hms_opt(0, 0, 0).unwrap()));
                }
            }
            Err(format!("invalid timestamp format: {raw}"))
        }
    }
}

/// `cidr_from(network, prefix)`: combine an INET field and an INT prefix into
/// a CIDR value. The only computed function the mapping document supports.
pub fn cidr_from(network: &CellValue, prefix: &CellValue) -> Result<CellValue, String> {
    let ip = network
        .as_inet()
        .ok_or_else(|| "cidr_from: network argument is not an IP address".to_string())?;
    let prefix = prefix
        .as_int()
        .ok_or_else(|| "cidr_from: prefix argument is not an integer".to_string())?;
    let prefix = u8::try_from(prefix).map_err(|_| format!("cidr_from: invalid prefix {prefix}"))?;
    IpNetwork::new(ip, prefix)
        .map(CellValue::Cidr)
        .map_err(|e| format!("cidr_from: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_passes_through() {
        assert_eq!(
            parse_cell("core-sw-01", ColumnType::Text).unwrap(),
            CellValue::Text("core-sw-01".into())
        );
    }

    #[test]
    fn int_parsing() {
        assert_eq!(
            parse_cell("48", ColumnType::Int).unwrap(),
            CellValue::Int(48)
        );
        assert!(parse_cell("forty-eight", ColumnType::Int).is_err());
    }

    #[test]
    fn bool_accepts_the_documented_spellings() {
        for truthy in ["yes", "y", "true", "1", "Yes", "TRUE"] {
            assert_eq!(
                parse_cell(truthy, ColumnType::Bool).unwrap(),
                CellValue::Bool(true),
                "{truthy}"
            );
        }
        for falsy in ["no", "n", "false", "0", "maybe"] {
            assert_eq!(
                parse_cell(falsy, ColumnType::Bool).unwrap(),
                CellValue::Bool(false),
                "{falsy}"
            );
        }
    }

    #[test]
    fn inet_accepts_v4_and_v6() {
        assert!(matches!(
            parse_cell("10.0.0.1", ColumnType::Inet).unwrap(),
            CellValue::Inet(IpAddr::V4(_))
        ));
        assert!(matches!(
            parse_cell("fe80::1", ColumnType::Inet).unwrap(),
            CellValue::Inet(IpAddr::V6(_))
        ));
        assert!(parse_cell("10.0.0.300", ColumnType::Inet).is_err());
        assert!(parse_cell("not-an-ip", ColumnType::Inet).is_err());
    }

    #[test]
    fn cidr_parsing() {
        assert!(matches!(
            parse_cell("10.20.0.0/24", ColumnType::Cidr).unwrap(),
            CellValue::Cidr(_)
        ));
        assert!(parse_cell("10.20.0.0", ColumnType::Cidr).is_ok());
        assert!(parse_cell("10.20.0.0/33", ColumnType::Cidr).is_err());
    }

    #[test]
    fn timestamp_accepts_all_documented_formats() {
        for raw in [
            "2024-03-01",
            "2024-03-01 14:30:00",
            "03/01/2024",
            "03/01/2024 14:30:00",
        ] {
            assert!(
                matches!(parse_cell(raw, ColumnType::Timestamp), Ok(CellValue::Timestamp(_))),
                "{raw}"
            );
        }
        assert!(parse_cell("01.03.2024", ColumnType::Timestamp).is_err());
    }

    #[test]
    fn cidr_from_combines_network_and_prefix() {
        let network = CellValue::Inet("10.30.0.0".parse().unwrap());
        let prefix = CellValue::Int(16);
        let combined = cidr_from(&network, &prefix).unwrap();
        assert_eq!(combined, CellValue::Cidr("10.30.0.0/16".parse().unwrap()));
    }

    #[test]
    fn cidr_from_rejects_bad_arguments() {
        let network = CellValue::Text("10.30.0.0".into());
        assert!(cidr_from(&network, &CellValue::Int(16)).is_err());
        let network = CellValue::Inet("10.30.0.0".parse().unwrap());
        assert!(cidr_from(&network, &CellValue::Int(64)).is_err());
        assert!(cidr_from(&network, &CellValue::Text("16".into())).is_err());
    }

    #[test]
    fn column_type_parsing() {
        assert_eq!(ColumnType::parse("TEXT"), Some(ColumnType::Text));
        assert_eq!(ColumnType::parse("TIMESTAMP"), Some(ColumnType::Timestamp));
        assert_eq!(ColumnType::parse("text"), None);
        assert_eq!(ColumnType::parse("UUID"), None);
    }
}
