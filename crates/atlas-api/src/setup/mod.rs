//! Startup wiring: database pool, migrations, state, and the router.

pub mod database;
pub mod routes;
pub mod server;

use std::sync::Arc;

use atlas_core::Config;

use crate::auth::jwt::JwtManager;
use crate::state::AppState;

pub async fn initialize_app(
    config: Config,
) -> Result<(Arc<AppState>, axum::Router), anyhow::Error> {
    let pool = database::setup_database(&config).await?;
    let jwt = JwtManager::new(&config.jwt);

    let state = Arc::new(AppState { pool, config, jwt });
    let router = routes::build_router(state.clone());
    Ok((state, router))
}
