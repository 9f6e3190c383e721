//! Site CRUD.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

use atlas_core::models::{CreateSiteRequest, Site, UpdateSiteRequest};
use atlas_core::AppError;
use atlas_db::site;

use crate::auth::AuthContext;
use crate::error::{AppJson, ErrorBody, HttpAppError, ValidatedJson};
use crate::listing::{ListQuery, ListResponse};
use crate::state::AppState;

#[utoipa::path(get, path = "/sites", tag = "sites", params(ListQuery), responses(
    (status = 200, description = "Sites page")
))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    let (sites, total) = site::list(&mut session, query.q(), query.page(), query.sort()).await?;
    Ok(Json(ListResponse::new(sites, query.page(), total)))
}

#[utoipa::path(post, path = "/sites", tag = "sites", request_body = CreateSiteRequest, responses(
    (status = 201, description = "Created", body = Site)
))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateSiteRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    let site = site::create(
        &mut session,
        &req.name,
        req.location.as_deref(),
        req.notes.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(site)))
}

#[utoipa::path(get, path = "/sites/{id}", tag = "sites", params(("id" = i64, Path)), responses(
    (status = 200, description = "Site", body = Site),
    (status = 404, description = "Not found", body = ErrorBody)
))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    let site = site::get(&mut session, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Site not found".to_string()))?;
    Ok(Json(site))
}

#[utoipa::path(put, path = "/sites/{id}", tag = "sites", params(("id" = i64, Path)), request_body = UpdateSiteRequest, responses(
    (status = 200, description = "Updated", body = Site),
    (status = 404, description = "Not found", body = ErrorBody)
))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<i64>,
    AppJson(req): AppJson<UpdateSiteRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if req.name.is_none() && req.location.is_none() && req.notes.is_none() {
        return Err(AppError::Validation("no fields to update".to_string()).into());
    }
    let mut session = state.tenant_session(&ctx).await?;
    let site = site::update(
        &mut session,
        id,
        req.name.as_deref(),
        req.location.as_deref(),
        req.notes.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Site not found".to_string()))?;
    Ok(Json(site))
}

#[utoipa::path(delete, path = "/sites/{id}", tag = "sites", params(("id" = i64, Path)), responses(
    (status = 204, description = "Deleted"),
    (status = 404, description = "Not found", body = ErrorBody)
))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    if !site::delete(&mut session, id).await? {
        return Err(AppError::NotFound("Site not found".to_string()).into());
    }
    Ok(StatusCode::NO_CONTENT)
}
