//! Login and self-service profile handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

use atlas_core::models::{
    ChangePasswordRequest, LoginRequest, LoginResponse, UpdateProfileRequest, User,
};
use atlas_core::AppError;
use atlas_db::user;

use crate::auth::AuthContext;
use crate::error::{AppJson, ErrorBody, HttpAppError, ValidatedJson};
use crate::password::{hash_password, verify_password};
use crate::state::AppState;

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = LoginRequest, responses(
    (status = 200, description = "Token issued", body = LoginResponse),
    (status = 401, description = "Invalid credentials", body = ErrorBody)
))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    // Same error for unknown email and bad password.
    let user = user::find_active_by_email(&state.pool, &req.email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&req.password, &user.password_digest) {
        return Err(AppError::InvalidCredentials.into());
    }

    if let Err(e) = user::touch_last_login(&state.pool, user.id).await {
        tracing::warn!(error = %e, user_id = user.id, "failed to update last_login_at");
    }

    let token = state
        .jwt
        .issue(user.id, user.org_id, &user.roles)
        .map_err(|e| AppError::Internal(format!("failed to issue token: {e}")))?;

    tracing::info!(user_id = user.id, org_id = user.org_id, "user logged in");
    Ok(Json(LoginResponse { token, user }))
}

#[utoipa::path(get, path = "/auth/profile", tag = "auth", responses(
    (status = 200, description = "Current user", body = User),
    (status = 404, description = "User not found", body = ErrorBody)
))]
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
) -> Result<impl IntoResponse, HttpAppError> {
    let user = user::get_by_id(&state.pool, ctx.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

#[utoipa::path(put, path = "/auth/profile", tag = "auth", request_body = UpdateProfileRequest, responses(
    (status = 200, description = "Updated user", body = User),
    (status = 400, description = "Nothing to update", body = ErrorBody)
))]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    AppJson(req): AppJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if req.first_name.is_none() && req.last_name.is_none() {
        return Err(AppError::Validation("no fields to update".to_string()).into());
    }
    let user = user::update_profile(
        &state.pool,
        ctx.user_id,
        req.first_name.as_deref(),
        req.last_name.as_deref(),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

#[utoipa::path(put, path = "/auth/change-password", tag = "auth", request_body = ChangePasswordRequest, responses(
    (status = 204, description = "Password changed"),
    (status = 400, description = "Current password incorrect", body = ErrorBody)
))]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    ctx: AuthContext,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let user = user::get_by_id(&state.pool, ctx.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !verify_password(&req.current_password, &user.password_digest) {
        return Err(AppError::Validation("current password is incorrect".to_string()).into());
    }

    let digest = hash_password(&req.new_password)?;
    user::update_password(&state.pool, ctx.user_id, &digest).await?;
    Ok(StatusCode::NO_CONTENT)
}
