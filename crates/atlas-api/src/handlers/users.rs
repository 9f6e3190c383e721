//! User management. org_admin only (role guard); the main tenant may target
//! other organizations, everyone else stays inside their own.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

use atlas_core::models::{validate_roles, CreateUserRequest, Role, UpdateUserRequest, User};
use atlas_core::AppError;
use atlas_db::user::{self, NewUser, UserPatch};

use crate::auth::AuthContext;
use crate::error::{AppJson, ErrorBody, HttpAppError, ValidatedJson};
use crate::listing::{ListQuery, ListResponse};
use crate::password::hash_password;
use crate::state::AppState;

#[utoipa::path(get, path = "/users", tag = "users", params(ListQuery), responses(
    (status = 200, description = "Users page")
))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    let (users, total) = user::list(&mut session, query.org_id, query.page(), query.sort()).await?;
    Ok(Json(ListResponse::new(users, query.page(), total)))
}

#[utoipa::path(post, path = "/users", tag = "users", request_body = CreateUserRequest, responses(
    (status = 201, description = "Created", body = User),
    (status = 403, description = "Cannot target that organization", body = ErrorBody),
    (status = 409, description = "Email already in use", body = ErrorBody)
))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if !validate_roles(&req.roles) {
        return Err(AppError::Validation("invalid roles provided".to_string()).into());
    }
    let target_org = ctx.target_org(req.org_id)?;
    let digest = hash_password(&req.password)?;

    let mut session = state.tenant_session(&ctx).await?;
    let user = user::create(
        &mut session,
        NewUser {
            email: req.email,
            password_digest: digest,
            first_name: req.first_name,
            last_name: req.last_name,
            org_id: target_org,
            roles: req.roles,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, org_id = user.org_id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(get, path = "/users/{id}", tag = "users", params(("id" = i64, Path)), responses(
    (status = 200, description = "User", body = User),
    (status = 404, description = "Not found", body = ErrorBody)
))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    let user = user::get(&mut session, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

#[utoipa::path(put, path = "/users/{id}", tag = "users", params(("id" = i64, Path)), request_body = UpdateUserRequest, responses(
    (status = 200, description = "Updated", body = User),
    (status = 400, description = "Invalid roles or last-admin violation", body = ErrorBody),
    (status = 403, description = "Cross-org move without main tenant", body = ErrorBody),
    (status = 404, description = "Not found", body = ErrorBody)
))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<i64>,
    AppJson(req): AppJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    let existing = user::get(&mut session, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if let Some(new_org) = req.org_id {
        if new_org != existing.org_id && !ctx.is_main_tenant() {
            return Err(AppError::ForbiddenOrgChange.into());
        }
    }
    if let Some(roles) = &req.roles {
        if !validate_roles(roles) {
            return Err(AppError::Validation("invalid roles provided".to_string()).into());
        }
    }

    let patch = UserPatch {
        first_name: req.first_name,
        last_name: req.last_name,
        org_id: req.org_id,
        roles: req.roles,
        is_active: req.is_active,
    };
    if patch.is_empty() {
        return Err(AppError::Validation("no fields to update".to_string()).into());
    }

    // Deactivating the last active org_admin, or stripping its admin role,
    // would leave the organization unmanageable.
    let loses_admin = matches!(patch.is_active, Some(false))
        || patch
            .roles
            .as_ref()
            .is_some_and(|roles| !roles.iter().any(|r| r == Role::OrgAdmin.as_str()));
    if loses_admin && existing.is_active && existing.has_role(Role::OrgAdmin) {
        let others = user::count_other_active_admins(&mut session, existing.org_id, id).await?;
        if others == 0 {
            return Err(AppError::CannotDeleteLastAdmin.into());
        }
    }

    let user = user::update(&mut session, id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

#[utoipa::path(delete, path = "/users/{id}", tag = "users", params(("id" = i64, Path)), responses(
    (status = 204, description = "Deleted"),
    (status = 400, description = "Last active org_admin", body = ErrorBody),
    (status = 404, description = "Not found", body = ErrorBody)
))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut session = state.tenant_session(&ctx).await?;
    let existing = user::get(&mut session, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if existing.is_active && existing.has_role(Role::OrgAdmin) {
        let others = user::count_other_active_admins(&mut session, existing.org_id, id).await?;
        if others == 0 {
            return Err(AppError::CannotDeleteLastAdmin.into());
        }
    }

    if !user::delete(&mut session, id).await? {
        return Err(AppError::NotFound("User not found".to_string()).into());
    }
    tracing::info!(user_id = id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
