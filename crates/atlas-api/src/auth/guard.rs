//! Role guard applied as a per-route layer.
//!
//! Routes declare the roles that may pass with
//! `route_layer(middleware::from_fn(|req, next| require_roles(ROLES, req, next)))`.
//! Declaring an empty set is a programming error and fails the request with
//! an internal error, not `insufficient_permissions`.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use atlas_core::models::Role;
use atlas_core::AppError;

use crate::auth::context::AuthContext;
use crate::error::HttpAppError;

pub async fn require_roles(roles: &'static [Role], request: Request, next: Next) -> Response {
    if roles.is_empty() {
        return HttpAppError(AppError::Internal(
            "no roles declared for this route".to_string(),
        ))
        .into_response();
    }

    let Some(context) = request.extensions().get::<AuthContext>() else {
        return HttpAppError(AppError::AuthenticationRequired).into_response();
    };

    if !context.has_any_role(roles) {
        return HttpAppError(AppError::InsufficientPermissions).into_response();
    }

    next.run(request).await
}

/// Role sets from the access matrix.
pub mod matrix {
    use atlas_core::models::Role;

    /// Create/update on items and assets.
    pub const WRITERS: &[Role] = &[Role::OrgAdmin, Role::ProjectAdmin];
    /// Deletes, plus writes on sites, vendors, projects, users, orgs.
    pub const ADMIN_ONLY: &[Role] = &[Role::OrgAdmin];
    /// Spreadsheet imports.
    pub const IMPORTERS: &[Role] = &[Role::OrgAdmin, Role::ProjectAdmin];
}
