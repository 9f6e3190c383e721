//! Auth gate and role guard behavior, driven over HTTP against an in-process
//! router with stub handlers. No database is involved: the gate only needs
//! the token manager.

use axum::extract::Request;
use axum::middleware::{from_fn, from_fn_with_state, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use axum_test::TestServer;
use std::sync::Arc;
use std::time::Duration;

use atlas_api::auth::guard::require_roles;
use atlas_api::auth::middleware::auth_middleware;
use atlas_api::auth::{AuthContext, AuthState, JwtManager};
use atlas_core::config::JwtConfig;
use atlas_core::models::Role;

const SECRET: &str = "0123456789abcdef0123456789abcdef";

fn jwt(expiry: Duration) -> JwtManager {
    JwtManager::new(&JwtConfig {
        secret: SECRET.to_string(),
        issuer: "atlas-inventory".to_string(),
        audience: "atlas-inventory".to_string(),
        expiry,
    })
}

async fn whoami(ctx: AuthContext) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "user_id": ctx.user_id,
        "org_id": ctx.org_id,
        "roles": ctx.roles,
    }))
}

async fn admin_guard(request: Request, next: Next) -> Response {
    require_roles(&[Role::OrgAdmin], request, next).await
}

async fn empty_guard(request: Request, next: Next) -> Response {
    require_roles(&[], request, next).await
}

fn test_server(expiry: Duration) -> (TestServer, JwtManager) {
    let jwt = jwt(expiry);
    let auth_state = Arc::new(AuthState { jwt: jwt.clone() });

    let router = Router::new()
        .route("/whoami", get(whoami))
        .route(
            "/admin-only",
            get(|| async { "ok" }).route_layer(from_fn(admin_guard)),
        )
        .route(
            "/misconfigured",
            get(|| async { "ok" }).route_layer(from_fn(empty_guard)),
        )
        .layer(from_fn_with_state(auth_state, auth_middleware));

    (TestServer::new(router).unwrap(), jwt)
}

fn roles(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn missing_header_is_401_with_code() {
    let (server, _) = test_server(Duration::from_secs(3600));
    let response = server.get("/whoami").await;
    assert_eq!(response.status_code(), 401);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "missing_auth_header");
}

#[tokio::test]
async fn wrong_scheme_is_invalid_auth_format() {
    let (server, _) = test_server(Duration::from_secs(3600));
    let response = server
        .get("/whoami")
        .add_header("Authorization", "Basic dXNlcjpwYXNz")
        .await;
    assert_eq!(response.status_code(), 401);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "invalid_auth_format");
}

#[tokio::test]
async fn empty_token_is_missing_token() {
    let (server, _) = test_server(Duration::from_secs(3600));
    let response = server
        .get("/whoami")
        .add_header("Authorization", "Bearer ")
        .await;
    assert_eq!(response.status_code(), 401);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "missing_token");
}

#[tokio::test]
async fn non_jwt_structure_is_invalid_token_format() {
    let (server, _) = test_server(Duration::from_secs(3600));
    let response = server
        .get("/whoami")
        .add_header("Authorization", "Bearer just-a-string")
        .await;
    assert_eq!(response.status_code(), 401);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "invalid_token_format");
}

#[tokio::test]
async fn tampered_token_is_rejected() {
    let (server, jwt) = test_server(Duration::from_secs(3600));
    let token = jwt.issue(1, 1, &roles(&["viewer"])).unwrap();
    let mut parts: Vec<&str> = token.split('.').collect();
    parts[2] = "AAAAAAAAAAAAAAAAAAAAAA";
    let token = parts.join(".");
    let response = server
        .get("/whoami")
        .add_header("Authorization", format!("Bearer {token}"))
        .await;
    assert_eq!(response.status_code(), 401);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "malformed_token");
}

#[tokio::test]
async fn valid_token_reaches_handler_with_context() {
    let (server, jwt) = test_server(Duration::from_secs(24 * 3600));
    let token = jwt.issue(42, 7, &roles(&["project_admin"])).unwrap();
    let response = server
        .get("/whoami")
        .add_header("Authorization", format!("Bearer {token}"))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["user_id"], 42);
    assert_eq!(body["org_id"], 7);
    assert_eq!(body["roles"], serde_json::json!(["project_admin"]));
}

#[tokio::test]
async fn short_lived_token_gets_expiry_headers() {
    let (server, jwt) = test_server(Duration::from_secs(30 * 60));
    let token = jwt.issue(1, 1, &roles(&["viewer"])).unwrap();
    let response = server
        .get("/whoami")
        .add_header("Authorization", format!("Bearer {token}"))
        .await;
    assert_eq!(response.status_code(), 200);
    assert!(response.maybe_header("X-Token-Expires-At").is_some());
    let expires_in = response
        .maybe_header("X-Token-Expires-In")
        .expect("expiry hint header");
    let expires_in = expires_in.to_str().unwrap().trim_end_matches('s').parse::<i64>().unwrap();
    assert!(expires_in > 0 && expires_in <= 3600);
}

#[tokio::test]
async fn long_lived_token_gets_no_expiry_headers() {
    let (server, jwt) = test_server(Duration::from_secs(24 * 3600));
    let token = jwt.issue(1, 1, &roles(&["viewer"])).unwrap();
    let response = server
        .get("/whoami")
        .add_header("Authorization", format!("Bearer {token}"))
        .await;
    assert_eq!(response.status_code(), 200);
    assert!(response.maybe_header("X-Token-Expires-At").is_none());
    assert!(response.maybe_header("X-Token-Expires-In").is_none());
}

#[tokio::test]
async fn viewer_is_rejected_by_admin_guard() {
    let (server, jwt) = test_server(Duration::from_secs(3600));
    let token = jwt.issue(1, 2, &roles(&["viewer"])).unwrap();
    let response = server
        .get("/admin-only")
        .add_header("Authorization", format!("Bearer {token}"))
        .await;
    assert_eq!(response.status_code(), 403);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "insufficient_permissions");
}

#[tokio::test]
async fn org_admin_passes_admin_guard() {
    let (server, jwt) = test_server(Duration::from_secs(3600));
    let token = jwt.issue(1, 2, &roles(&["org_admin", "viewer"])).unwrap();
    let response = server
        .get("/admin-only")
        .add_header("Authorization", format!("Bearer {token}"))
        .await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn empty_role_set_is_an_internal_error_not_403() {
    let (server, jwt) = test_server(Duration::from_secs(3600));
    let token = jwt.issue(1, 2, &roles(&["org_admin"])).unwrap();
    let response = server
        .get("/misconfigured")
        .add_header("Authorization", format!("Bearer {token}"))
        .await;
    assert_eq!(response.status_code(), 500);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "internal_error");
}
