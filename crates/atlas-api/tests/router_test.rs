//! Route-table behavior over the real router. The pool is lazy and points at
//! a closed port, so anything that reaches the database surfaces
//! `db_unavailable` — which is itself part of the contract under test. The
//! auth and authorization paths never touch the database.

use axum_test::TestServer;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

use atlas_api::auth::JwtManager;
use atlas_api::setup::routes::build_router;
use atlas_api::state::AppState;
use atlas_core::config::JwtConfig;
use atlas_core::Config;

const SECRET: &str = "0123456789abcdef0123456789abcdef";

fn test_config() -> Config {
    Config {
        database_url: "postgres://nobody@127.0.0.1:1/atlas".into(),
        server_port: 0,
        environment: "test".into(),
        jwt: JwtConfig {
            secret: SECRET.into(),
            issuer: "atlas-inventory".into(),
            audience: "atlas-inventory".into(),
            expiry: Duration::from_secs(24 * 3600),
        },
        rls_enabled: false,
        metrics_enabled: true,
        docs_enabled: true,
        db_max_connections: 2,
        db_acquire_timeout_secs: 1,
        import_max_bytes: 20 << 20,
        import_default_mapping: "configs/mapping/equipment.yaml".into(),
    }
}

fn test_server() -> (TestServer, JwtManager) {
    let config = test_config();
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .connect_lazy(&config.database_url)
        .expect("lazy pool");
    let jwt = JwtManager::new(&config.jwt);
    let state = Arc::new(AppState {
        pool,
        config,
        jwt: jwt.clone(),
    });
    (TestServer::new(build_router(state)).unwrap(), jwt)
}

fn token(jwt: &JwtManager, org_id: i64, roles: &[&str]) -> String {
    let roles: Vec<String> = roles.iter().map(|s| s.to_string()).collect();
    jwt.issue(1, org_id, &roles).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let (server, _) = test_server();
    let response = server.get("/health").await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn dbping_reports_database_unavailable() {
    let (server, _) = test_server();
    let response = server.get("/dbping").await;
    assert_eq!(response.status_code(), 500);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "db_unavailable");
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let (server, _) = test_server();
    for path in ["/assets", "/items", "/sites", "/users", "/auth/profile"] {
        let response = server.get(path).await;
        assert_eq!(response.status_code(), 401, "{path}");
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "missing_auth_header", "{path}");
    }
}

#[tokio::test]
async fn viewer_cannot_write_items() {
    let (server, jwt) = test_server();
    let token = token(&jwt, 2, &["viewer"]);
    let response = server
        .post("/items")
        .add_header("Authorization", format!("Bearer {token}"))
        .json(&serde_json::json!({ "asset_tag": "A-1", "name": "router" }))
        .await;
    assert_eq!(response.status_code(), 403);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "insufficient_permissions");
}

#[tokio::test]
async fn viewer_cannot_delete_assets() {
    let (server, jwt) = test_server();
    let token = token(&jwt, 2, &["viewer", "project_admin"]);
    // project_admin may write assets but deletes stay org_admin.
    let response = server
        .delete("/assets/1")
        .add_header("Authorization", format!("Bearer {token}"))
        .await;
    assert_eq!(response.status_code(), 403);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "insufficient_permissions");
}

#[tokio::test]
async fn viewer_cannot_manage_users() {
    let (server, jwt) = test_server();
    let token = token(&jwt, 2, &["viewer", "project_admin"]);
    let response = server
        .get("/users")
        .add_header("Authorization", format!("Bearer {token}"))
        .await;
    assert_eq!(response.status_code(), 403);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "insufficient_permissions");
}

#[tokio::test]
async fn non_main_org_admin_is_denied_org_management() {
    let (server, jwt) = test_server();
    let token = token(&jwt, 2, &["org_admin"]);
    let response = server
        .get("/organizations")
        .add_header("Authorization", format!("Bearer {token}"))
        .await;
    assert_eq!(response.status_code(), 403);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "access_denied");
}

#[tokio::test]
async fn import_rejects_non_multipart_uploads() {
    let (server, jwt) = test_server();
    let token = token(&jwt, 1, &["project_admin"]);
    let response = server
        .post("/imports/excel")
        .add_header("Authorization", format!("Bearer {token}"))
        .json(&serde_json::json!({ "site_id": 5 }))
        .await;
    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn metrics_endpoint_is_public_text() {
    let (server, _) = test_server();
    // A completed request first, so the counters have at least one sample.
    let _ = server.get("/health").await;
    let response = server.get("/metrics").await;
    assert_eq!(response.status_code(), 200);
    assert!(response.text().contains("atlas_http_requests_total"));
}

#[tokio::test]
async fn openapi_spec_lists_the_surface() {
    let (server, _) = test_server();
    let response = server.get("/openapi.yaml").await;
    assert_eq!(response.status_code(), 200);
    let yaml = response.text();
    for path in [
        "/auth/login",
        "/organizations",
        "/users",
        "/assets",
        "/switches",
        "/vlans",
        "/imports/excel",
        "/sites/{id}/asset-categories",
    ] {
        assert!(yaml.contains(path), "{path} missing from spec");
    }
}

#[tokio::test]
async fn foreign_signature_is_rejected_on_real_routes() {
    let (server, _) = test_server();
    // Issued under a different key: signature failure maps to malformed_token.
    let other = JwtManager::new(&JwtConfig {
        secret: "ffffffffffffffffffffffffffffffff".into(),
        issuer: "atlas-inventory".into(),
        audience: "atlas-inventory".into(),
        expiry: Duration::from_secs(600),
    });
    let token = other.issue(1, 1, &["viewer".to_string()]).unwrap();
    let response = server
        .get("/assets")
        .add_header("Authorization", format!("Bearer {token}"))
        .await;
    assert_eq!(response.status_code(), 401);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "malformed_token");
}
