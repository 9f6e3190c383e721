//! Bearer-token authentication middleware.
//!
//! Public paths bypass; everything else needs a valid `Authorization:
//! Bearer <token>` header. Each failure mode maps to its own machine code so
//! clients can tell a missing header from a stale token. Responses to
//! requests whose token expires within the hour gain advisory
//! `X-Token-Expires-At` / `X-Token-Expires-In` headers.

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::DateTime;
use std::sync::Arc;
use std::time::Duration;

use atlas_core::AppError;

use crate::auth::context::AuthContext;
use crate::auth::jwt::{JwtManager, TokenError};
use crate::error::HttpAppError;

/// Advisory expiry headers appear when less than this much lifetime remains.
const EXPIRY_WARNING_WINDOW: Duration = Duration::from_secs(3600);

#[derive(Clone)]
pub struct AuthState {
    pub jwt: JwtManager,
}

/// Paths reachable without a token. `/docs` is a prefix match for the doc UI
/// assets; the rest are exact.
pub fn is_public_path(path: &str) -> bool {
    matches!(path, "/health" | "/dbping" | "/auth/login" | "/openapi.yaml" | "/metrics")
        || path == "/docs"
        || path.starts_with("/docs/")
}

fn token_error(err: TokenError) -> AppError {
    match err {
        TokenError::Expired => AppError::TokenExpired,
        TokenError::NotYetValid => AppError::MalformedToken,
        TokenError::Malformed => AppError::MalformedToken,
        TokenError::BadSignature => AppError::MalformedToken,
        TokenError::WrongAlgorithm => AppError::InvalidSigningMethod,
        TokenError::BadIssuer | TokenError::BadAudience => AppError::MalformedToken,
        TokenError::InvalidUserId => AppError::InvalidUserId,
        TokenError::InvalidOrgId => AppError::InvalidOrgId,
        TokenError::NoRoles => AppError::NoRoles,
        TokenError::InvalidInput(msg) => AppError::Internal(msg),
    }
}

pub async fn auth_middleware(
    State(auth): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if is_public_path(request.uri().path()) {
        return next.run(request).await;
    }

    let header = match request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => return HttpAppError(AppError::MissingAuthHeader).into_response(),
    };

    let Some(token) = header.strip_prefix("Bearer ") else {
        return HttpAppError(AppError::InvalidAuthFormat).into_response();
    };
    if token.is_empty() {
        return HttpAppError(AppError::MissingToken).into_response();
    }
    if token.len() > 8192 || token.split('.').count() != 3 {
        return HttpAppError(AppError::InvalidTokenFormat(
            "expected a three-segment token".to_string(),
        ))
        .into_response();
    }

    let claims = match auth.jwt.verify(token) {
        Ok(claims) => claims,
        Err(err) => return HttpAppError(token_error(err)).into_response(),
    };

    let expiring_soon = claims.expires_within(EXPIRY_WARNING_WINDOW);
    let expires_at = claims.exp;

    let context = AuthContext {
        user_id: claims.sub,
        org_id: claims.org_id,
        roles: claims.roles.clone(),
        claims,
    };
    request.extensions_mut().insert(context);

    let mut response = next.run(request).await;

    if expiring_soon {
        if let Some(at) = DateTime::from_timestamp(expires_at, 0) {
            let remaining = (expires_at - chrono::Utc::now().timestamp()).max(0);
            let headers = response.headers_mut();
            if let Ok(value) = HeaderValue::from_str(&at.to_rfc3339()) {
                headers.insert("X-Token-Expires-At", value);
            }
            if let Ok(value) = HeaderValue::from_str(&format!("{remaining}s")) {
                headers.insert("X-Token-Expires-In", value);
            }
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_path_classification() {
        for path in ["/health", "/dbping", "/auth/login", "/metrics", "/openapi.yaml", "/docs", "/docs/index.html"] {
            assert!(is_public_path(path), "{path}");
        }
        for path in ["/assets", "/users", "/auth/profile", "/dockets"] {
            assert!(!is_public_path(path), "{path}");
        }
    }

    #[test]
    fn token_errors_map_to_distinct_codes() {
        assert_eq!(token_error(TokenError::Expired).code(), "token_expired");
        assert_eq!(
            token_error(TokenError::WrongAlgorithm).code(),
            "invalid_signing_method"
        );
        assert_eq!(token_error(TokenError::Malformed).code(), "malformed_token");
        assert_eq!(
            token_error(TokenError::InvalidUserId).code(),
            "invalid_user_id"
        );
        assert_eq!(
            token_error(TokenError::InvalidOrgId).code(),
            "invalid_org_id"
        );
        assert_eq!(token_error(TokenError::NoRoles).code(), "no_roles");
    }
}
