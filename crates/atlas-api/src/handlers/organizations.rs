//! Organization CRUD and stats. Every operation here is reserved to
//! org_admins of the main tenant; the role guard handles the role half and
//! the handlers enforce the tenancy half.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

use atlas_core::models::{CreateOrganizationRequest, Organization, OrganizationStats};
use atlas_core::AppError;
use atlas_db::organization;

use crate::auth::AuthContext;
use crate::error::{ErrorBody, HttpAppError, ValidatedJson};
use crate::listing::{ListQuery, ListResponse};
use crate::state::AppState;

fn require_main_tenant(ctx: &AuthContext) -> Result<(), AppError> {
    if ctx.is_main_tenant() {
        Ok(())
    } else {
        Err(AppError::AccessDenied)
    }
}

#[utoipa::path(get, path = "/organizations", tag = "organizations", params(ListQuery), responses(
    (status = 200, description = "Organizations page"),
    (status = 403, description = "Not the main tenant", body = ErrorBody)
))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    require_main_tenant(&ctx)?;
    let (orgs, total) = organization::list(&state.pool, query.page(), query.sort()).await?;
    Ok(Json(ListResponse::new(orgs, query.page(), total)))
}

#[utoipa::path(post, path = "/organizations", tag = "organizations", request_body = CreateOrganizationRequest, responses(
    (status = 201, description = "Created", body = Organization),
    (status = 409, description = "Name already taken", body = ErrorBody)
))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateOrganizationRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    require_main_tenant(&ctx)?;
    let org = organization::create(&state.pool, &req.name).await?;
    tracing::info!(org_id = org.id, name = %org.name, "organization created");
    Ok((StatusCode::CREATED, Json(org)))
}

#[utoipa::path(get, path = "/organizations/{id}", tag = "organizations", params(("id" = i64, Path)), responses(
    (status = 200, description = "Organization", body = Organization),
    (status = 404, description = "Not found", body = ErrorBody)
))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    require_main_tenant(&ctx)?;
    let org = organization::get(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;
    Ok(Json(org))
}

#[utoipa::path(put, path = "/organizations/{id}", tag = "organizations", params(("id" = i64, Path)), request_body = CreateOrganizationRequest, responses(
    (status = 200, description = "Updated", body = Organization),
    (status = 404, description = "Not found", body = ErrorBody)
))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<CreateOrganizationRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    require_main_tenant(&ctx)?;
    let org = organization::rename(&state.pool, id, &req.name)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;
    Ok(Json(org))
}

#[utoipa::path(delete, path = "/organizations/{id}", tag = "organizations", params(("id" = i64, Path)), responses(
    (status = 204, description = "Deleted"),
    (status = 400, description = "Main tenant or organization still owns data", body = ErrorBody),
    (status = 404, description = "Not found", body = ErrorBody)
))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    require_main_tenant(&ctx)?;
    if !organization::delete(&state.pool, id).await? {
        return Err(AppError::NotFound("Organization not found".to_string()).into());
    }
    tracing::info!(org_id = id, "organization deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/organizations/{id}/stats", tag = "organizations", params(("id" = i64, Path)), responses(
    (status = 200, description = "Entity counts", body = OrganizationStats),
    (status = 404, description = "Not found", body = ErrorBody)
))]
pub async fn stats(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    require_main_tenant(&ctx)?;
    let stats = organization::stats(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;
    Ok(Json(stats))
}
