//! HTTP routes for the proxy.

use std::any::Any;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::callback;
use crate::credential::present;
use crate::error::{ProxyError, ProxyResult};
use crate::models::{
    CallbackQuery, TokenExchangeRequest, TokenRefreshRequest, TokenResponseBody, UserInfoRequest,
    UserInfoResponseBody, ValidateCredentialsRequest, ValidationResponseBody,
};
use crate::proxy::ProxyService;

pub const HEALTH_PATH: &str = "/health";
pub const TOKEN_PATH: &str = "/feishu/oauth/token";
pub const REFRESH_PATH: &str = "/feishu/oauth/refresh";
pub const VALIDATE_CREDENTIALS_PATH: &str = "/feishu/validate-credentials";
pub const USER_INFO_PATH: &str = "/feishu/user/info";
pub const CALLBACK_PATH: &str = "/feishu/oauth/callback";

/// Endpoint names and paths, as reported by `/health` and the startup log.
pub const ENDPOINTS: &[(&str, &str)] = &[
    ("tokenExchange", TOKEN_PATH),
    ("tokenRefresh", REFRESH_PATH),
    ("credentialValidation", VALIDATE_CREDENTIALS_PATH),
    ("userInfo", USER_INFO_PATH),
    ("oauthCallback", CALLBACK_PATH),
];

/// Shared state for HTTP handlers.
pub struct HttpState {
    pub service: ProxyService,
}

/// Create the HTTP router for the proxy.
pub fn create_router(service: ProxyService) -> Router {
    let state = Arc::new(HttpState { service });

    Router::new()
        .route(HEALTH_PATH, get(health_check))
        .route(TOKEN_PATH, post(handle_token))
        .route(REFRESH_PATH, post(handle_refresh))
        .route(VALIDATE_CREDENTIALS_PATH, post(handle_validate_credentials))
        .route(USER_INFO_PATH, post(handle_user_info))
        .route(CALLBACK_PATH, get(handle_callback))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health_check(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let config = state.service.config();
    let endpoints: serde_json::Map<String, serde_json::Value> = ENDPOINTS
        .iter()
        .map(|(name, path)| ((*name).to_string(), serde_json::Value::from(*path)))
        .collect();

    Json(serde_json::json!({
        "success": true,
        "status": "ok",
        "service": "feishu-oauth-proxy",
        "version": env!("CARGO_PKG_VERSION"),
        "message": "OAuth proxy is running (multi-tenant mode)",
        "timestamp": Utc::now().to_rfc3339(),
        "features": {
            "multiTenant": true,
            "dynamicCredentials": true,
            "credentialValidation": true
        },
        "config": {
            "defaultAppId": config.default_credential.as_ref().map(|c| c.app_id.as_str()),
            "hasDefaultAppSecret": config
                .default_credential
                .as_ref()
                .is_some_and(|c| !c.app_secret.is_empty())
        },
        "endpoints": endpoints
    }))
}

/// `POST /feishu/oauth/token`
async fn handle_token(
    State(state): State<Arc<HttpState>>,
    payload: Result<Json<TokenExchangeRequest>, JsonRejection>,
) -> ProxyResult<Json<TokenResponseBody>> {
    let token = state.service.exchange_code(json_body(payload)?).await?;
    Ok(Json(token.into()))
}

/// `POST /feishu/oauth/refresh`
async fn handle_refresh(
    State(state): State<Arc<HttpState>>,
    payload: Result<Json<TokenRefreshRequest>, JsonRejection>,
) -> ProxyResult<Json<TokenResponseBody>> {
    let token = state.service.refresh_token(json_body(payload)?).await?;
    Ok(Json(token.into()))
}

/// `POST /feishu/validate-credentials`
///
/// Failures keep `valid: false` in the body so the browser can treat every
/// answer the same way.
async fn handle_validate_credentials(
    State(state): State<Arc<HttpState>>,
    payload: Result<Json<ValidateCredentialsRequest>, JsonRejection>,
) -> Response {
    let result = match json_body(payload) {
        Ok(req) => state.service.validate_credentials(req).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(outcome) => {
            let message = if outcome.valid {
                "Credential validation succeeded"
            } else {
                "Credential validation failed, check App ID and App Secret"
            };
            Json(ValidationResponseBody {
                success: true,
                valid: outcome.valid,
                message: message.to_string(),
            })
            .into_response()
        }
        Err(err) => {
            err.log();
            (
                err.status_code(),
                Json(serde_json::json!({
                    "success": false,
                    "valid": false,
                    "error": err.to_user_message()
                })),
            )
                .into_response()
        }
    }
}

/// `POST /feishu/user/info`
async fn handle_user_info(
    State(state): State<Arc<HttpState>>,
    payload: Result<Json<UserInfoRequest>, JsonRejection>,
) -> ProxyResult<Json<UserInfoResponseBody>> {
    let data = state.service.user_info(json_body(payload)?).await?;
    Ok(Json(UserInfoResponseBody { success: true, data }))
}

/// `GET /feishu/oauth/callback`
async fn handle_callback(
    State(state): State<Arc<HttpState>>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    tracing::info!(
        has_code = present(query.code.as_deref()).is_some(),
        state = ?query.state,
        error = ?query.error,
        "OAuth callback received"
    );

    if let Some(error) = present(query.error.as_deref()) {
        return ProxyError::AuthorizationDenied(error.to_string()).into_response();
    }

    let Some(code) = present(query.code.as_deref()) else {
        tracing::debug!("No authorization code yet, serving waiting page");
        return Html(callback::render_waiting_page()).into_response();
    };

    Html(callback::render_success_page(
        code,
        query.state.as_deref(),
        state.service.config().callback_close_delay,
    ))
    .into_response()
}

/// Unwrap a JSON body, mapping decode failures to a caller error.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ProxyResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ProxyError::InvalidBody(rejection.body_text()))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| err.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());

    ProxyError::internal(format!("handler panicked: {detail}")).into_response()
}
