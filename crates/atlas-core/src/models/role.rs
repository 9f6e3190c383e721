//! Role set and validation helpers.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Roles a user may carry. A user holds a set of these; route guards check
/// for intersection with a declared set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Viewer,
    ProjectAdmin,
    OrgAdmin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Viewer, Role::ProjectAdmin, Role::OrgAdmin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::ProjectAdmin => "project_admin",
            Role::OrgAdmin => "org_admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "viewer" => Some(Role::Viewer),
            "project_admin" => Some(Role::ProjectAdmin),
            "org_admin" => Some(Role::OrgAdmin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True when `roles` is non-empty and every entry names a known role.
pub fn validate_roles(roles: &[String]) -> bool {
    !roles.is_empty() && roles.iter().all(|r| Role::parse(r).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("superuser"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn role_set_validation() {
        assert!(validate_roles(&["viewer".into()]));
        assert!(validate_roles(&["org_admin".into(), "project_admin".into()]));
        assert!(!validate_roles(&[]));
        assert!(!validate_roles(&["viewer".into(), "root".into()]));
    }

    #[test]
    fn serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&Role::ProjectAdmin).unwrap(),
            "\"project_admin\""
        );
        let role: Role = serde_json::from_str("\"org_admin\"").unwrap();
        assert_eq!(role, Role::OrgAdmin);
    }
}
