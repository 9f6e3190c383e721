//! Application state shared across handlers.

use sqlx::PgPool;

use atlas_core::{AppError, Config};
use atlas_db::session::TenantSession;

use crate::auth::context::AuthContext;
use crate::auth::jwt::JwtManager;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub jwt: JwtManager,
}

impl AppState {
    /// Acquire the request's tenant-bound database session. Handlers hold the
    /// returned session for the rest of the request; dropping it releases the
    /// connection.
    pub async fn tenant_session(&self, ctx: &AuthContext) -> Result<TenantSession, AppError> {
        TenantSession::acquire(&self.pool, ctx.org_id, self.config.rls_enabled).await
    }
}

fn _assert_state_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AppState>();
}
