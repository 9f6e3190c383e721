//! Route table and middleware stack.
//!
//! The router is split public vs protected; the auth middleware wraps only
//! the protected half. Role guards are `route_layer`s so a failed guard
//! cannot leak whether a path exists to unauthorized roles.

use axum::extract::{DefaultBodyLimit, Request};
use axum::http::header;
use axum::middleware::{from_fn, from_fn_with_state, Next};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa_rapidoc::RapiDoc;

use atlas_core::AppError;

use crate::auth::guard::{matrix, require_roles};
use crate::auth::middleware::auth_middleware;
use crate::auth::AuthState;
use crate::error::HttpAppError;
use crate::handlers;
use crate::metrics;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let auth_state = Arc::new(AuthState {
        jwt: state.jwt.clone(),
    });

    let mut public = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/dbping", get(handlers::health::dbping))
        .route("/auth/login", post(handlers::auth::login));

    if state.config.metrics_enabled {
        public = public.route("/metrics", get(metrics_endpoint));
    }

    let protected = protected_routes(&state)
        .layer(from_fn_with_state(auth_state, auth_middleware));

    let mut app = public
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    if state.config.docs_enabled {
        app = app
            .route("/openapi.yaml", get(openapi_yaml))
            .merge(RapiDoc::new("/openapi.yaml").path("/docs"));
    }
    if state.config.metrics_enabled {
        app = app.layer(from_fn(metrics::track_requests));
    }

    app
}

async fn admin_only(request: Request, next: Next) -> axum::response::Response {
    require_roles(matrix::ADMIN_ONLY, request, next).await
}

async fn writers(request: Request, next: Next) -> axum::response::Response {
    require_roles(matrix::WRITERS, request, next).await
}

async fn importers(request: Request, next: Next) -> axum::response::Response {
    require_roles(matrix::IMPORTERS, request, next).await
}

fn protected_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    // Self-service, any authenticated role.
    let profile = Router::new()
        .route(
            "/auth/profile",
            get(handlers::auth::get_profile).put(handlers::auth::update_profile),
        )
        .route("/auth/change-password", put(handlers::auth::change_password));

    // Organization and user management: org_admin; main-tenant scoping is
    // enforced inside the handlers.
    let admin = Router::new()
        .route(
            "/organizations",
            get(handlers::organizations::list).post(handlers::organizations::create),
        )
        .route(
            "/organizations/{id}",
            get(handlers::organizations::get)
                .put(handlers::organizations::update)
                .delete(handlers::organizations::delete),
        )
        .route("/organizations/{id}/stats", get(handlers::organizations::stats))
        .route("/users", get(handlers::users::list).post(handlers::users::create))
        .route(
            "/users/{id}",
            get(handlers::users::get)
                .put(handlers::users::update)
                .delete(handlers::users::delete),
        )
        .route_layer(from_fn(admin_only));

    // Reads are open to every authenticated role.
    let reads = Router::new()
        .route("/sites", get(handlers::sites::list))
        .route("/sites/{id}", get(handlers::sites::get))
        .route("/sites/{id}/asset-categories", get(handlers::assets::site_categories))
        .route("/vendors", get(handlers::vendors::list))
        .route("/vendors/{id}", get(handlers::vendors::get))
        .route("/projects", get(handlers::projects::list))
        .route("/projects/{id}", get(handlers::projects::get))
        .route("/items", get(handlers::items::list))
        .route("/items/{id}", get(handlers::items::get))
        .route("/assets", get(handlers::assets::list))
        .route("/assets/{id}", get(handlers::assets::get))
        .route("/switches", get(handlers::assets::list_switches))
        .route("/vlans", get(handlers::assets::list_vlans));

    // Items and assets accept writes from project_admin as well.
    let writes = Router::new()
        .route("/items", post(handlers::items::create))
        .route("/items/{id}", put(handlers::items::update))
        .route("/assets", post(handlers::assets::create))
        .route("/assets/{id}", put(handlers::assets::update))
        .route_layer(from_fn(writers));

    // Deletes and site/vendor/project writes stay org_admin.
    let admin_writes = Router::new()
        .route("/items/{id}", delete(handlers::items::delete))
        .route("/assets/{id}", delete(handlers::assets::delete))
        .route("/sites", post(handlers::sites::create))
        .route("/sites/{id}", put(handlers::sites::update).delete(handlers::sites::delete))
        .route("/vendors", post(handlers::vendors::create))
        .route(
            "/vendors/{id}",
            put(handlers::vendors::update).delete(handlers::vendors::delete),
        )
        .route("/projects", post(handlers::projects::create))
        .route(
            "/projects/{id}",
            put(handlers::projects::update).delete(handlers::projects::delete),
        )
        .route_layer(from_fn(admin_only));

    let imports = Router::new()
        .route("/imports/excel", post(handlers::imports::upload_excel))
        .route_layer(from_fn(importers))
        .layer(DefaultBodyLimit::max(state.config.import_max_bytes));

    profile
        .merge(admin)
        .merge(reads)
        .merge(writes)
        .merge(admin_writes)
        .merge(imports)
}

async fn metrics_endpoint() -> Result<impl IntoResponse, HttpAppError> {
    let (buffer, content_type) = metrics::render()
        .map_err(|e| AppError::Internal(format!("failed to render metrics: {e}")))?;
    Ok(([(header::CONTENT_TYPE, content_type)], buffer))
}

async fn openapi_yaml() -> Result<impl IntoResponse, HttpAppError> {
    let yaml = crate::api_doc::openapi_yaml()
        .map_err(|e| AppError::Internal(format!("failed to render OpenAPI spec: {e}")))?;
    Ok(([(header::CONTENT_TYPE, "application/yaml")], yaml))
}
