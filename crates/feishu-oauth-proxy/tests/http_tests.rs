//! End-to-end tests for the proxy endpoints via axum's Router.
//!
//! Feishu is replaced by a wiremock server; requests go through the full
//! middleware stack with `oneshot`.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{any, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use feishu_oauth_proxy::config::Config;
use feishu_oauth_proxy::proxy::ProxyService;
use feishu_oauth_proxy::server::ProxyServer;

const TOKEN_PATH: &str = "/open-apis/authen/v2/oauth/token";
const REFRESH_PATH: &str = "/open-apis/auth/v3/app_access_token/refresh";
const USER_INFO_PATH: &str = "/open-apis/authen/v1/user_info";
const TENANT_TOKEN_PATH: &str = "/open-apis/auth/v3/tenant_access_token/internal";

const TENANT_ID: &str = "cli_tenant0001";
const TENANT_SECRET: &str = "tenant-secret-value";

fn build_router(config: Config) -> axum::Router {
    let service = ProxyService::new(config).unwrap();
    ProxyServer::new(service).router()
}

fn router_for(mock_server: &MockServer) -> axum::Router {
    build_router(Config::for_testing(&mock_server.uri()))
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn send_text(app: axum::Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn mount_tenant_check(mock_server: &MockServer, code: i64, expected_calls: u64) {
    let msg = if code == 0 { "ok" } else { "app secret invalid" };

    Mock::given(method("POST"))
        .and(path(TENANT_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": code,
            "msg": msg,
            "tenant_access_token": "t-xxx",
            "expire": 7200
        })))
        .expect(expected_calls)
        .mount(mock_server)
        .await;
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_reports_configuration() {
    let app = build_router(Config::for_testing("http://unused.localhost"));

    let (status, body) = send(app, Request::get("/health").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["features"]["multiTenant"], true);
    assert_eq!(body["config"]["defaultAppId"], "cli_default0001");
    assert_eq!(body["config"]["hasDefaultAppSecret"], true);
    assert_eq!(body["endpoints"]["tokenExchange"], "/feishu/oauth/token");
    assert_eq!(body["endpoints"]["oauthCallback"], "/feishu/oauth/callback");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_health_without_default_credential() {
    let mut config = Config::for_testing("http://unused.localhost");
    config.default_credential = None;

    let (status, body) =
        send(build_router(config), Request::get("/health").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["config"]["defaultAppId"].is_null());
    assert_eq!(body["config"]["hasDefaultAppSecret"], false);
}

// =============================================================================
// Token exchange
// =============================================================================

#[tokio::test]
async fn test_token_with_default_credential() {
    let mock_server = MockServer::start().await;
    mount_tenant_check(&mock_server, 0, 0).await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_partial_json(json!({
            "client_id": "cli_default0001",
            "client_secret": "default-secret-value",
            "code": "auth-code"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "u-access",
            "refresh_token": "u-refresh",
            "expires_in": 6900,
            "scope": "contact:user.base:readonly"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (status, body) =
        send(router_for(&mock_server), post_json("/feishu/oauth/token", &json!({"code": "auth-code"})))
            .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": true,
            "access_token": "u-access",
            "refresh_token": "u-refresh",
            "expires_in": 6900,
            "scope": "contact:user.base:readonly"
        })
    );
}

#[tokio::test]
async fn test_token_with_tenant_credential() {
    let mock_server = MockServer::start().await;
    mount_tenant_check(&mock_server, 0, 1).await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_partial_json(json!({"client_id": TENANT_ID, "client_secret": TENANT_SECRET})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": {"access_token": "tenant-access"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = post_json(
        "/feishu/oauth/token",
        &json!({"code": "auth-code", "app_id": TENANT_ID, "app_secret": TENANT_SECRET}),
    );
    let (status, body) = send(router_for(&mock_server), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["access_token"], "tenant-access");
    assert_eq!(body["refresh_token"], "");
    assert_eq!(body["expires_in"], 7200);
}

#[tokio::test]
async fn test_token_with_rejected_tenant_credential() {
    let mock_server = MockServer::start().await;
    mount_tenant_check(&mock_server, 10014, 1).await;

    Mock::given(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let request = post_json(
        "/feishu/oauth/token",
        &json!({"code": "auth-code", "app_id": TENANT_ID, "app_secret": TENANT_SECRET}),
    );
    let (status, body) = send(router_for(&mock_server), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "invalid credential, check App ID and App Secret");
}

#[tokio::test]
async fn test_token_with_app_id_only() {
    let mock_server = MockServer::start().await;
    Mock::given(any()).respond_with(ResponseTemplate::new(200)).expect(0).mount(&mock_server).await;

    let request = post_json("/feishu/oauth/token", &json!({"code": "auth-code", "app_id": TENANT_ID}));
    let (status, body) = send(router_for(&mock_server), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "incomplete credential, supply both or neither");
}

#[tokio::test]
async fn test_token_with_app_secret_only() {
    let mock_server = MockServer::start().await;
    Mock::given(any()).respond_with(ResponseTemplate::new(200)).expect(0).mount(&mock_server).await;

    let request =
        post_json("/feishu/oauth/token", &json!({"code": "auth-code", "app_secret": TENANT_SECRET}));
    let (status, body) = send(router_for(&mock_server), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "parameter mismatch, supply both App ID and App Secret or neither");
}

#[tokio::test]
async fn test_token_missing_code() {
    let mock_server = MockServer::start().await;
    Mock::given(any()).respond_with(ResponseTemplate::new(200)).expect(0).mount(&mock_server).await;

    for body in [json!({}), json!({"code": ""})] {
        let (status, response) =
            send(router_for(&mock_server), post_json("/feishu/oauth/token", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response, json!({"success": false, "error": "missing code"}));
    }
}

#[tokio::test]
async fn test_token_without_any_credential() {
    let mut config = Config::for_testing("http://unused.localhost");
    config.default_credential = None;

    let (status, body) =
        send(build_router(config), post_json("/feishu/oauth/token", &json!({"code": "auth-code"})))
            .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "no default credential configured, supply App ID and App Secret");
}

#[tokio::test]
async fn test_token_provider_error_is_bad_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 20003, "msg": "bad"})))
        .mount(&mock_server)
        .await;

    let (status, body) =
        send(router_for(&mock_server), post_json("/feishu/oauth/token", &json!({"code": "x"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Feishu API error: bad");
}

#[tokio::test]
async fn test_token_transport_failure_is_internal_error() {
    let app = build_router(Config::for_testing("http://127.0.0.1:1"));

    let (status, body) = send(app, post_json("/feishu/oauth/token", &json!({"code": "x"}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"success": false, "error": "Internal server error"}));
}

#[tokio::test]
async fn test_invalid_json_body() {
    let app = build_router(Config::for_testing("http://unused.localhost"));

    let request = Request::post("/feishu/oauth/token")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().starts_with("invalid request body"));
}

// =============================================================================
// Refresh
// =============================================================================

#[tokio::test]
async fn test_refresh_with_default_credential() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(REFRESH_PATH))
        .and(body_partial_json(json!({
            "app_id": "cli_default0001",
            "refresh_token": "old-refresh"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "app_access_token": "a-new",
            "expire": 3600
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (status, body) = send(
        router_for(&mock_server),
        post_json("/feishu/oauth/refresh", &json!({"refresh_token": "old-refresh"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": true,
            "access_token": "a-new",
            "refresh_token": "old-refresh",
            "expires_in": 3600,
            "scope": ""
        })
    );
}

#[tokio::test]
async fn test_refresh_missing_token() {
    let mock_server = MockServer::start().await;
    Mock::given(any()).respond_with(ResponseTemplate::new(200)).expect(0).mount(&mock_server).await;

    let (status, body) =
        send(router_for(&mock_server), post_json("/feishu/oauth/refresh", &json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "missing refresh_token");
}

#[tokio::test]
async fn test_refresh_without_any_credential() {
    let mut config = Config::for_testing("http://unused.localhost");
    config.default_credential = None;

    let (status, body) = send(
        build_router(config),
        post_json("/feishu/oauth/refresh", &json!({"refresh_token": "old-refresh"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "no default credential configured, supply App ID and App Secret");
}

// =============================================================================
// User info
// =============================================================================

#[tokio::test]
async fn test_user_info_missing_token_makes_no_call() {
    let mock_server = MockServer::start().await;
    Mock::given(any()).respond_with(ResponseTemplate::new(200)).expect(0).mount(&mock_server).await;

    for body in [json!({}), json!({"access_token": ""})] {
        let (status, response) =
            send(router_for(&mock_server), post_json("/feishu/user/info", &body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response, json!({"success": false, "error": "missing access_token"}));
    }
}

#[tokio::test]
async fn test_user_info_returns_profile() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(USER_INFO_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "data": {"name": "Li Si", "open_id": "ou_456"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (status, body) = send(
        router_for(&mock_server),
        post_json("/feishu/user/info", &json!({"access_token": "u-access"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "data": {"name": "Li Si", "open_id": "ou_456"}}));
}

#[tokio::test]
async fn test_user_info_provider_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(USER_INFO_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"code": 99991677, "msg": "token expired"})),
        )
        .mount(&mock_server)
        .await;

    let (status, body) = send(
        router_for(&mock_server),
        post_json("/feishu/user/info", &json!({"access_token": "u-access"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Feishu API error: token expired");
}

// =============================================================================
// Credential validation
// =============================================================================

#[tokio::test]
async fn test_validate_credentials_valid() {
    let mock_server = MockServer::start().await;
    mount_tenant_check(&mock_server, 0, 1).await;

    let (status, body) = send(
        router_for(&mock_server),
        post_json(
            "/feishu/validate-credentials",
            &json!({"app_id": TENANT_ID, "app_secret": TENANT_SECRET}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["valid"], true);
    assert_eq!(body["message"], "Credential validation succeeded");
}

#[tokio::test]
async fn test_validate_credentials_rejected_by_provider() {
    let mock_server = MockServer::start().await;
    mount_tenant_check(&mock_server, 10014, 1).await;

    let (status, body) = send(
        router_for(&mock_server),
        post_json(
            "/feishu/validate-credentials",
            &json!({"app_id": TENANT_ID, "app_secret": TENANT_SECRET}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["valid"], false);
}

#[tokio::test]
async fn test_validate_credentials_bad_format_makes_no_call() {
    let mock_server = MockServer::start().await;
    mount_tenant_check(&mock_server, 0, 0).await;

    let (status, body) = send(
        router_for(&mock_server),
        post_json("/feishu/validate-credentials", &json!({"app_id": "app_123", "app_secret": "short"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
}

#[tokio::test]
async fn test_validate_credentials_missing_fields() {
    let mock_server = MockServer::start().await;
    mount_tenant_check(&mock_server, 0, 0).await;

    let (status, body) = send(
        router_for(&mock_server),
        post_json("/feishu/validate-credentials", &json!({"app_id": TENANT_ID})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"success": false, "valid": false, "error": "missing App ID or App Secret"})
    );
}

// =============================================================================
// OAuth callback
// =============================================================================

#[tokio::test]
async fn test_callback_with_code_serves_success_page() {
    let app = build_router(Config::for_testing("http://unused.localhost"));

    let request =
        Request::get("/feishu/oauth/callback?code=abc123&state=xyz").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains(r#"const code = "abc123";"#));
    assert!(html.contains(r#"const state = "xyz";"#));
    assert!(html.contains("feishu_oauth_code"));
    assert!(html.contains("FEISHU_OAUTH_CALLBACK"));
}

#[tokio::test]
async fn test_callback_without_code_serves_waiting_page() {
    let app = build_router(Config::for_testing("http://unused.localhost"));

    let (status, html) =
        send_text(app, Request::get("/feishu/oauth/callback").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains("window.location.reload()"));
}

#[tokio::test]
async fn test_callback_with_error() {
    let app = build_router(Config::for_testing("http://unused.localhost"));

    let request = Request::get("/feishu/oauth/callback?error=access_denied&code=abc")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": "OAuth authorization failed: access_denied"}));
}

// =============================================================================
// Middleware
// =============================================================================

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let app = build_router(Config::for_testing("http://unused.localhost"));

    let request = Request::get("/health")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = build_router(Config::for_testing("http://unused.localhost"));

    let response =
        app.oneshot(Request::get("/feishu/unknown").body(Body::empty()).unwrap()).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
