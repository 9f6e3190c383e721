//! User accounts and the auth request/response bodies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::organization::MAIN_TENANT_ORG_ID;
use super::role::Role;

#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct User {
    pub id: i64,
    pub email: String,
    /// Argon2 digest. Never serialized; no operation returns it.
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password_digest: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub org_id: i64,
    pub roles: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.iter().any(|r| r == role.as_str())
    }

    pub fn is_main_tenant(&self) -> bool {
        self.org_id == MAIN_TENANT_ORG_ID
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Main-tenant org_admins may target any organization; everyone else may
    /// only omit this or name their own.
    pub org_id: Option<i64>,
    #[validate(length(min = 1))]
    pub roles: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub org_id: Option<i64>,
    pub roles: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 8))]
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 7,
            email: "ops@example.com".into(),
            password_digest: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".into(),
            first_name: Some("Sam".into()),
            last_name: None,
            org_id: 2,
            roles: vec!["viewer".into(), "project_admin".into()],
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_login_at: None,
        }
    }

    #[test]
    fn password_digest_is_never_serialized() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("password_digest").is_none());
        assert_eq!(json["email"], "ops@example.com");
    }

    #[test]
    fn role_membership() {
        let user = sample_user();
        assert!(user.has_role(Role::Viewer));
        assert!(user.has_role(Role::ProjectAdmin));
        assert!(!user.has_role(Role::OrgAdmin));
    }

    #[test]
    fn main_tenant_is_org_one() {
        let mut user = sample_user();
        assert!(!user.is_main_tenant());
        user.org_id = 1;
        assert!(user.is_main_tenant());
    }
}
