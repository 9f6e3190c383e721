//! HTTP error response conversion.
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`; any `AppError`
//! converts into `HttpAppError` and renders as the stable
//! `{ "error": <message>, "code": <machine code> }` body with the taxonomy's
//! HTTP status. Internal details are logged server-side, never returned.

use atlas_core::{AppError, LogLevel};
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

/// Wrapper so `IntoResponse` can be implemented for the core error type
/// without violating the orphan rule.
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl<E> From<E> for HttpAppError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        HttpAppError(err.into())
    }
}

fn log_error(error: &AppError) {
    match error.log_level() {
        LogLevel::Debug => tracing::debug!(error = %error, code = error.code(), "request failed"),
        LogLevel::Warn => tracing::warn!(error = %error, code = error.code(), "request failed"),
        LogLevel::Error => tracing::error!(error = %error, code = error.code(), "request failed"),
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let error = &self.0;
        log_error(error);

        let status = StatusCode::from_u16(error.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            error: error.client_message(),
            code: error.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn rejection_error(rejection: JsonRejection) -> AppError {
    AppError::InvalidJson(rejection.body_text())
}

/// JSON extractor that renders deserialization failures in our error shape.
#[derive(Debug, Clone, Copy)]
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_error)?;
        Ok(AppJson(inner))
    }
}

/// JSON extractor that additionally runs the `validator` rules, mapping
/// failures to `validation_error`.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_error)?;
        inner.validate().map_err(AppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_body_shape_is_stable() {
        let body = ErrorBody {
            error: "Token has expired".into(),
            code: "token_expired".into(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({
            "error": "Token has expired",
            "code": "token_expired",
        }));
    }

    #[tokio::test]
    async fn app_error_renders_with_taxonomy_status() {
        let response = HttpAppError(AppError::InsufficientPermissions).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = HttpAppError(AppError::NotFound("asset not found".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = HttpAppError(AppError::Duplicate("dup".into())).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
