//! Authenticated request context.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use atlas_core::models::organization::MAIN_TENANT_ORG_ID;
use atlas_core::models::Role;
use atlas_core::AppError;

use crate::auth::jwt::Claims;
use crate::error::HttpAppError;

/// Identity attached to every authenticated request by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: i64,
    pub org_id: i64,
    pub roles: Vec<String>,
    pub claims: Claims,
}

impl AuthContext {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.iter().any(|r| r == role.as_str())
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.has_role(*role))
    }

    /// Members of org 1 may see and mutate data across organizations.
    pub fn is_main_tenant(&self) -> bool {
        self.org_id == MAIN_TENANT_ORG_ID
    }

    /// Resolve the organization an operation should target. The main tenant
    /// may name any organization; anyone else naming a different one is
    /// rejected.
    pub fn target_org(&self, requested: Option<i64>) -> Result<i64, AppError> {
        match requested {
            None => Ok(self.org_id),
            Some(org) if org == self.org_id => Ok(org),
            Some(org) if self.is_main_tenant() => Ok(org),
            Some(_) => Err(AppError::ForbiddenOrgChange),
        }
    }
}

impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(HttpAppError(AppError::AuthenticationRequired))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(org_id: i64, roles: &[&str]) -> AuthContext {
        AuthContext {
            user_id: 10,
            org_id,
            roles: roles.iter().map(|s| s.to_string()).collect(),
            claims: Claims {
                sub: 10,
                org_id,
                roles: roles.iter().map(|s| s.to_string()).collect(),
                iss: "atlas-inventory".into(),
                aud: "atlas-inventory".into(),
                iat: 0,
                nbf: 0,
                exp: i64::MAX,
            },
        }
    }

    #[test]
    fn role_checks() {
        let ctx = context(2, &["project_admin"]);
        assert!(ctx.has_role(Role::ProjectAdmin));
        assert!(!ctx.has_role(Role::OrgAdmin));
        assert!(ctx.has_any_role(&[Role::OrgAdmin, Role::ProjectAdmin]));
        assert!(!ctx.has_any_role(&[Role::Viewer]));
    }

    #[test]
    fn main_tenant_may_target_any_org() {
        let ctx = context(1, &["org_admin"]);
        assert!(ctx.is_main_tenant());
        assert_eq!(ctx.target_org(None).unwrap(), 1);
        assert_eq!(ctx.target_org(Some(42)).unwrap(), 42);
    }

    #[test]
    fn other_tenants_may_only_target_their_own() {
        let ctx = context(2, &["org_admin"]);
        assert!(!ctx.is_main_tenant());
        assert_eq!(ctx.target_org(None).unwrap(), 2);
        assert_eq!(ctx.target_org(Some(2)).unwrap(), 2);
        assert!(matches!(
            ctx.target_org(Some(42)),
            Err(AppError::ForbiddenOrgChange)
        ));
    }
}
