//! Vendor CRUD.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

use atlas_core::models::{CreateVendorRequest, UpdateVendorRequest, Vendor};
use atlas_core::AppError;
use atlas_db::vendor;

use crate::auth::AuthContext;
use crate::error::{AppJson, ErrorBody, HttpAppError, ValidatedJson};
use crate::listing::{ListQuery, ListResponse};
use crate::state::AppState;

#[utoipa::path(get, path = "/vendors", tag = "vendors", params(ListQuery), responses(
    (status = 200, description = "Vendors page")
))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    let (vendors, total) = vendor::list(&mut session, query.q(), query.page(), query.sort()).await?;
    Ok(Json(ListResponse::new(vendors, query.page(), total)))
}

#[utoipa::path(post, path = "/vendors", tag = "vendors", request_body = CreateVendorRequest, responses(
    (status = 201, description = "Created", body = Vendor)
))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateVendorRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    let vendor = vendor::create(
        &mut session,
        &req.name,
        req.email.as_deref(),
        req.phone.as_deref(),
        req.notes.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(vendor)))
}

#[utoipa::path(get, path = "/vendors/{id}", tag = "vendors", params(("id" = i64, Path)), responses(
    (status = 200, description = "Vendor", body = Vendor),
    (status = 404, description = "Not found", body = ErrorBody)
))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    let vendor = vendor::get(&mut session, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Vendor not found".to_string()))?;
    Ok(Json(vendor))
}

#[utoipa::path(put, path = "/vendors/{id}", tag = "vendors", params(("id" = i64, Path)), request_body = UpdateVendorRequest, responses(
    (status = 200, description = "Updated", body = Vendor),
    (status = 404, description = "Not found", body = ErrorBody)
))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<i64>,
    AppJson(req): AppJson<UpdateVendorRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if req.name.is_none() && req.email.is_none() && req.phone.is_none() && req.notes.is_none() {
        return Err(AppError::Validation("no fields to update".to_string()).into());
    }
    let mut session = state.tenant_session(&ctx).await?;
    let vendor = vendor::update(
        &mut session,
        id,
        req.name.as_deref(),
        req.email.as_deref(),
        req.phone.as_deref(),
        req.notes.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Vendor not found".to_string()))?;
    Ok(Json(vendor))
}

#[utoipa::path(delete, path = "/vendors/{id}", tag = "vendors", params(("id" = i64, Path)), responses(
    (status = 204, description = "Deleted"),
    (status = 404, description = "Not found", body = ErrorBody)
))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    if !vendor::delete(&mut session, id).await? {
        return Err(AppError::NotFound("Vendor not found".to_string()).into());
    }
    Ok(StatusCode::NO_CONTENT)
}
