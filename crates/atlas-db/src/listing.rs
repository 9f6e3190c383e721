//! Pagination and sort-whitelist helpers shared by the list queries.

/// Clamped limit/offset pair. Limit defaults to 50 and is capped at 100;
/// offset is never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub limit: i64,
    pub offset: i64,
}

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 100;

impl PageParams {
    pub fn clamped(limit: Option<i64>, offset: Option<i64>) -> Self {
        let limit = match limit {
            Some(l) if l >= 1 => l.min(MAX_LIMIT),
            _ => DEFAULT_LIMIT,
        };
        let offset = offset.filter(|o| *o >= 0).unwrap_or(0);
        PageParams { limit, offset }
    }
}

impl Default for PageParams {
    fn default() -> Self {
        PageParams {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// Build a safe `ORDER BY` clause from a comma-separated sort parameter.
///
/// `allowed` maps incoming keys to column identifiers; anything not in the
/// whitelist is dropped. A `-` prefix sorts descending. Falls back to the
/// whitelisted `id` column ascending.
pub fn build_order_by(sort: &str, allowed: &[(&str, &str)]) -> String {
    let fallback = || {
        let id_col = allowed
            .iter()
            .find(|(key, _)| *key == "id")
            .map(|(_, col)| *col)
            .unwrap_or("id");
        format!(" ORDER BY {id_col} ASC")
    };

    if sort.trim().is_empty() {
        return fallback();
    }

    let mut clauses = Vec::new();
    for raw in sort.split(',') {
        let mut key = raw.trim();
        if key.is_empty() {
            continue;
        }
        let desc = key.starts_with('-');
        if desc {
            key = &key[1..];
        }
        if let Some((_, col)) = allowed.iter().find(|(k, _)| *k == key) {
            clauses.push(format!("{col} {}", if desc { "DESC" } else { "ASC" }));
        }
    }

    if clauses.is_empty() {
        fallback()
    } else {
        format!(" ORDER BY {}", clauses.join(", "))
    }
}

/// Treat a provided-but-empty string as NULL on partial updates.
pub fn null_if_empty(s: &str) -> Option<&str> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOWED: &[(&str, &str)] = &[
        ("id", "id"),
        ("name", "name"),
        ("created_at", "created_at"),
    ];

    #[test]
    fn limit_defaults_and_caps() {
        assert_eq!(PageParams::clamped(None, None).limit, 50);
        assert_eq!(PageParams::clamped(Some(0), None).limit, 50);
        assert_eq!(PageParams::clamped(Some(-3), None).limit, 50);
        assert_eq!(PageParams::clamped(Some(25), None).limit, 25);
        assert_eq!(PageParams::clamped(Some(1000), None).limit, 100);
    }

    #[test]
    fn offset_is_never_negative() {
        assert_eq!(PageParams::clamped(None, Some(-1)).offset, 0);
        assert_eq!(PageParams::clamped(None, Some(30)).offset, 30);
    }

    #[test]
    fn empty_sort_falls_back_to_id() {
        assert_eq!(build_order_by("", ALLOWED), " ORDER BY id ASC");
        assert_eq!(build_order_by("  ", ALLOWED), " ORDER BY id ASC");
    }

    #[test]
    fn descending_prefix() {
        assert_eq!(
            build_order_by("-created_at", ALLOWED),
            " ORDER BY created_at DESC"
        );
    }

    #[test]
    fn multiple_keys_preserve_order() {
        assert_eq!(
            build_order_by("name,-id", ALLOWED),
            " ORDER BY name ASC, id DESC"
        );
    }

    #[test]
    fn unknown_keys_are_dropped() {
        assert_eq!(
            build_order_by("password,name", ALLOWED),
            " ORDER BY name ASC"
        );
        assert_eq!(
            build_order_by("password; DROP TABLE assets", ALLOWED),
            " ORDER BY id ASC"
        );
    }

    #[test]
    fn aliased_columns_are_substituted() {
        let allowed = [("id", "a.id"), ("vlan_id", "v.vlan_id")];
        assert_eq!(
            build_order_by("-vlan_id", &allowed),
            " ORDER BY v.vlan_id DESC"
        );
    }

    #[test]
    fn empty_string_means_null() {
        assert_eq!(null_if_empty(""), None);
        assert_eq!(null_if_empty("   "), None);
        assert_eq!(null_if_empty("x"), Some("x"));
    }
}
