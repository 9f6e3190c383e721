//! Generic inventory CRUD.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

use atlas_core::models::{CreateItemRequest, Item, UpdateItemRequest};
use atlas_core::AppError;
use atlas_db::item;

use crate::auth::AuthContext;
use crate::error::{AppJson, ErrorBody, HttpAppError, ValidatedJson};
use crate::listing::{ListQuery, ListResponse};
use crate::state::AppState;

#[utoipa::path(get, path = "/items", tag = "items", params(ListQuery), responses(
    (status = 200, description = "Inventory page")
))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    let (items, total) = item::list(&mut session, query.q(), query.page(), query.sort()).await?;
    Ok(Json(ListResponse::new(items, query.page(), total)))
}

#[utoipa::path(post, path = "/items", tag = "items", request_body = CreateItemRequest, responses(
    (status = 201, description = "Created", body = Item),
    (status = 409, description = "asset_tag already exists", body = ErrorBody)
))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateItemRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    let item = item::create(&mut session, &req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(get, path = "/items/{id}", tag = "items", params(("id" = i64, Path)), responses(
    (status = 200, description = "Item", body = Item),
    (status = 404, description = "Not found", body = ErrorBody)
))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    let item = item::get(&mut session, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;
    Ok(Json(item))
}

#[utoipa::path(put, path = "/items/{id}", tag = "items", params(("id" = i64, Path)), request_body = UpdateItemRequest, responses(
    (status = 200, description = "Updated", body = Item),
    (status = 404, description = "Not found", body = ErrorBody),
    (status = 409, description = "asset_tag already exists", body = ErrorBody)
))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<i64>,
    AppJson(req): AppJson<UpdateItemRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if req.asset_tag.is_none()
        && req.name.is_none()
        && req.manufacturer.is_none()
        && req.model.is_none()
        && req.device_type.is_none()
        && req.site.is_none()
        && req.installed_at.is_none()
        && req.warranty_end.is_none()
        && req.notes.is_none()
    {
        return Err(AppError::Validation("no fields to update".to_string()).into());
    }
    let mut session = state.tenant_session(&ctx).await?;
    let item = item::update(&mut session, id, &req)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;
    Ok(Json(item))
}

#[utoipa::path(delete, path = "/items/{id}", tag = "items", params(("id" = i64, Path)), responses(
    (status = 204, description = "Deleted"),
    (status = 404, description = "Not found", body = ErrorBody)
))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    if !item::delete(&mut session, id).await? {
        return Err(AppError::NotFound("Item not found".to_string()).into());
    }
    Ok(StatusCode::NO_CONTENT)
}
