//! Error taxonomy shared across the workspace.
//!
//! Every recoverable failure is an `AppError` variant with a stable machine
//! code and an HTTP status. The API crate wraps this in `HttpAppError` for
//! `IntoResponse`; repositories convert `sqlx::Error` through `From`.

use sqlx::Error as SqlxError;

/// Log level a variant should be reported at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Warn,
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Authentication (401)
    #[error("Authorization header required")]
    MissingAuthHeader,
    #[error("Invalid authorization header format. Expected: Bearer <token>")]
    InvalidAuthFormat,
    #[error("Token is required")]
    MissingToken,
    #[error("Invalid token format: {0}")]
    InvalidTokenFormat(String),
    #[error("Token is malformed")]
    MalformedToken,
    #[error("Invalid token signing method")]
    InvalidSigningMethod,
    #[error("Token has expired")]
    TokenExpired,
    #[error("Invalid user ID in token")]
    InvalidUserId,
    #[error("Invalid organization ID in token")]
    InvalidOrgId,
    #[error("No roles assigned to user")]
    NoRoles,
    #[error("Authentication required")]
    AuthenticationRequired,
    #[error("Invalid credentials")]
    InvalidCredentials,

    // Authorization (403)
    #[error("Insufficient permissions")]
    InsufficientPermissions,
    #[error("Cannot operate on a different organization")]
    ForbiddenOrgChange,
    #[error("Access denied")]
    AccessDenied,

    // Input (400)
    #[error("{0}")]
    Validation(String),
    #[error("Invalid JSON body: {0}")]
    InvalidJson(String),

    // Resource (404)
    #[error("{0}")]
    NotFound(String),

    // Conflict (409)
    #[error("asset_tag already exists")]
    DuplicateAssetTag,
    #[error("Project with this code already exists for this organization")]
    DuplicateProjectCode,
    #[error("{0}")]
    Duplicate(String),

    // Business rules (400)
    #[error("Cannot delete or deactivate the last active org_admin in the organization")]
    CannotDeleteLastAdmin,
    #[error("Cannot delete the main tenant organization")]
    CannotDeleteMainTenant,
    #[error("Cannot delete an organization with existing data")]
    CannotDeleteOrgWithData,

    // Import (422)
    #[error("Import failed: {details}")]
    ImportFailed { details: String },

    // System (500)
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),
    #[error("Database unavailable")]
    DbUnavailable,
}

impl AppError {
    /// HTTP status the variant maps to.
    pub fn http_status(&self) -> u16 {
        use AppError::*;
        match self {
            MissingAuthHeader | InvalidAuthFormat | MissingToken | InvalidTokenFormat(_)
            | MalformedToken | InvalidSigningMethod | TokenExpired | InvalidUserId
            | InvalidOrgId | NoRoles | AuthenticationRequired | InvalidCredentials => 401,
            InsufficientPermissions | ForbiddenOrgChange | AccessDenied => 403,
            Validation(_) | InvalidJson(_) | CannotDeleteLastAdmin | CannotDeleteMainTenant
            | CannotDeleteOrgWithData => 400,
            NotFound(_) => 404,
            DuplicateAssetTag | DuplicateProjectCode | Duplicate(_) => 409,
            ImportFailed { .. } => 422,
            Internal(_) | Database(_) | DbUnavailable => 500,
        }
    }

    /// Stable machine code exposed in error bodies.
    pub fn code(&self) -> &'static str {
        use AppError::*;
        match self {
            MissingAuthHeader => "missing_auth_header",
            InvalidAuthFormat => "invalid_auth_format",
            MissingToken => "missing_token",
            InvalidTokenFormat(_) => "invalid_token_format",
            MalformedToken => "malformed_token",
            InvalidSigningMethod => "invalid_signing_method",
            TokenExpired => "token_expired",
            InvalidUserId => "invalid_user_id",
            InvalidOrgId => "invalid_org_id",
            NoRoles => "no_roles",
            AuthenticationRequired => "authentication_required",
            InvalidCredentials => "invalid_credentials",
            InsufficientPermissions => "insufficient_permissions",
            ForbiddenOrgChange => "forbidden_org_change",
            AccessDenied => "access_denied",
            Validation(_) => "validation_error",
            InvalidJson(_) => "invalid_json",
            NotFound(_) => "not_found",
            DuplicateAssetTag => "duplicate_asset_tag",
            DuplicateProjectCode => "duplicate_project_code",
            Duplicate(_) => "duplicate",
            CannotDeleteLastAdmin => "cannot_delete_last_admin",
            CannotDeleteMainTenant => "cannot_delete_main_tenant",
            CannotDeleteOrgWithData => "cannot_delete_org_with_data",
            ImportFailed { .. } => "import_failed",
            Internal(_) => "internal_error",
            Database(_) => "internal_error",
            DbUnavailable => "db_unavailable",
        }
    }

    /// Message safe to hand to a client. Internal and database failures are
    /// collapsed so details never leak.
    pub fn client_message(&self) -> String {
        match self {
            AppError::Internal(_) | AppError::Database(_) => {
                "Internal server error".to_string()
            }
            AppError::DbUnavailable => "Database unavailable".to_string(),
            other => other.to_string(),
        }
    }

    pub fn log_level(&self) -> LogLevel {
        use AppError::*;
        match self {
            Internal(_) | Database(_) | DbUnavailable => LogLevel::Error,
            ImportFailed { .. } => LogLevel::Warn,
            _ => LogLevel::Debug,
        }
    }
}

impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        match err {
            SqlxError::PoolTimedOut | SqlxError::PoolClosed | SqlxError::Io(_) => {
                AppError::DbUnavailable
            }
            other => AppError::Database(other),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidJson(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_401() {
        for err in [
            AppError::MissingAuthHeader,
            AppError::InvalidAuthFormat,
            AppError::MissingToken,
            AppError::MalformedToken,
            AppError::TokenExpired,
            AppError::AuthenticationRequired,
            AppError::InvalidCredentials,
        ] {
            assert_eq!(err.http_status(), 401, "{:?}", err);
        }
        assert_eq!(AppError::MissingAuthHeader.code(), "missing_auth_header");
        assert_eq!(AppError::TokenExpired.code(), "token_expired");
    }

    #[test]
    fn authz_errors_map_to_403() {
        assert_eq!(AppError::InsufficientPermissions.http_status(), 403);
        assert_eq!(
            AppError::InsufficientPermissions.code(),
            "insufficient_permissions"
        );
        assert_eq!(AppError::ForbiddenOrgChange.code(), "forbidden_org_change");
        assert_eq!(AppError::AccessDenied.code(), "access_denied");
    }

    #[test]
    fn conflict_errors_map_to_409() {
        assert_eq!(AppError::Duplicate("x".into()).http_status(), 409);
        assert_eq!(AppError::DuplicateAssetTag.code(), "duplicate_asset_tag");
        assert_eq!(
            AppError::DuplicateProjectCode.code(),
            "duplicate_project_code"
        );
    }

    #[test]
    fn business_rules_map_to_400() {
        assert_eq!(AppError::CannotDeleteLastAdmin.http_status(), 400);
        assert_eq!(AppError::CannotDeleteMainTenant.http_status(), 400);
        assert_eq!(
            AppError::CannotDeleteOrgWithData.code(),
            "cannot_delete_org_with_data"
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::Internal("secret connection string".into());
        assert_eq!(err.client_message(), "Internal server error");
        assert_eq!(err.http_status(), 500);
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn pool_errors_become_db_unavailable() {
        let err: AppError = SqlxError::PoolTimedOut.into();
        assert_eq!(err.code(), "db_unavailable");
        let err: AppError = SqlxError::RowNotFound.into();
        assert_eq!(err.code(), "internal_error");
    }

    #[test]
    fn import_failed_maps_to_422() {
        let err = AppError::ImportFailed {
            details: "too many errors".into(),
        };
        assert_eq!(err.http_status(), 422);
        assert_eq!(err.code(), "import_failed");
    }
}
