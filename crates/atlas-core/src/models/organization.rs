//! Organization (tenant) records. The organization with `id = 1` is the main
//! tenant: it can never be deleted and its org_admins may operate across
//! organizations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// The singleton main tenant's organization id.
pub const MAIN_TENANT_ORG_ID: i64 = 1;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create and update share the same body: organizations only carry a name.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}

/// Per-organization entity counts returned by the stats endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrganizationStats {
    pub organization: Organization,
    pub users: i64,
    pub sites: i64,
    pub vendors: i64,
    pub projects: i64,
    pub items: i64,
}
