//! Per-request tenant binding.
//!
//! A `TenantSession` checks one connection out of the pool and holds it for
//! the life of the request. When row-level security is enabled it sets the
//! `app.current_org_id` session variable on that connection, which the
//! database policies read through `current_org_id()`. Dropping the session
//! returns the connection to the pool on every exit path.

use atlas_core::models::organization::MAIN_TENANT_ORG_ID;
use atlas_core::AppError;
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, PgPool, Postgres};

pub struct TenantSession {
    conn: PoolConnection<Postgres>,
    org_id: i64,
}

impl TenantSession {
    pub async fn acquire(
        pool: &PgPool,
        org_id: i64,
        rls_enabled: bool,
    ) -> Result<Self, AppError> {
        let mut conn = pool.acquire().await?;
        tracing::trace!(org_id, rls_enabled, "tenant session acquired");
        if rls_enabled {
            // Session-level GUC: re-set on every acquisition, so a recycled
            // connection can never carry another tenant's value into a query.
            sqlx::query("SELECT set_config('app.current_org_id', $1, false)")
                .bind(org_id.to_string())
                .execute(&mut *conn)
                .await?;
        }
        Ok(Self { conn, org_id })
    }

    /// Organization this session is bound to.
    pub fn org_id(&self) -> i64 {
        self.org_id
    }

    /// Main-tenant sessions see rows of every organization; repositories skip
    /// the org predicate for them, mirroring the row-level-security policy.
    pub fn is_main(&self) -> bool {
        self.org_id == MAIN_TENANT_ORG_ID
    }

    /// The bound connection. All tenant-scoped queries must go through this.
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.conn
    }
}
