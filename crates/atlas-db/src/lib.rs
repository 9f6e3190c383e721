//! Persistence layer: tenant-bound sessions and per-entity repositories.
//!
//! Every tenant-scoped query runs on a [`session::TenantSession`], a dedicated
//! pooled connection bound to the request's organization. Repositories add an
//! explicit `org_id` predicate to every read and write on top of the optional
//! row-level-security policy, so isolation holds with the flag on or off.

pub mod asset;
pub mod item;
pub mod listing;
pub mod organization;
pub mod project;
pub mod session;
pub mod site;
pub mod user;
pub mod vendor;

use atlas_core::AppError;
use sqlx::PgPool;

/// Round-trip check used by the `/dbping` probe.
pub async fn ping(pool: &PgPool) -> Result<(), AppError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
