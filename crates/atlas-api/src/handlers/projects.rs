//! Project CRUD.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

use atlas_core::models::{CreateProjectRequest, Project, UpdateProjectRequest};
use atlas_core::AppError;
use atlas_db::project;

use crate::auth::AuthContext;
use crate::error::{AppJson, ErrorBody, HttpAppError, ValidatedJson};
use crate::listing::{ListQuery, ListResponse};
use crate::state::AppState;

#[utoipa::path(get, path = "/projects", tag = "projects", params(ListQuery), responses(
    (status = 200, description = "Projects page")
))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    let (projects, total) =
        project::list(&mut session, query.q(), query.page(), query.sort()).await?;
    Ok(Json(ListResponse::new(projects, query.page(), total)))
}

#[utoipa::path(post, path = "/projects", tag = "projects", request_body = CreateProjectRequest, responses(
    (status = 201, description = "Created", body = Project),
    (status = 409, description = "Code already used in this organization", body = ErrorBody)
))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateProjectRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    let project = project::create(
        &mut session,
        &req.code,
        &req.name,
        req.description.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(project)))
}

#[utoipa::path(get, path = "/projects/{id}", tag = "projects", params(("id" = i64, Path)), responses(
    (status = 200, description = "Project", body = Project),
    (status = 404, description = "Not found", body = ErrorBody)
))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    let project = project::get(&mut session, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    Ok(Json(project))
}

#[utoipa::path(put, path = "/projects/{id}", tag = "projects", params(("id" = i64, Path)), request_body = UpdateProjectRequest, responses(
    (status = 200, description = "Updated", body = Project),
    (status = 404, description = "Not found", body = ErrorBody),
    (status = 409, description = "Code already used in this organization", body = ErrorBody)
))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<i64>,
    AppJson(req): AppJson<UpdateProjectRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if req.code.is_none() && req.name.is_none() && req.description.is_none() {
        return Err(AppError::Validation("no fields to update".to_string()).into());
    }
    let mut session = state.tenant_session(&ctx).await?;
    let project = project::update(
        &mut session,
        id,
        req.code.as_deref(),
        req.name.as_deref(),
        req.description.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;
    Ok(Json(project))
}

#[utoipa::path(delete, path = "/projects/{id}", tag = "projects", params(("id" = i64, Path)), responses(
    (status = 204, description = "Deleted"),
    (status = 404, description = "Not found", body = ErrorBody)
))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    if !project::delete(&mut session, id).await? {
        return Err(AppError::NotFound("Project not found".to_string()).into());
    }
    Ok(StatusCode::NO_CONTENT)
}
