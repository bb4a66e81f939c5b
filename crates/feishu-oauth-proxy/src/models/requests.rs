//! Request and response bodies for the proxy endpoints.
//!
//! Request types implement `Debug` by hand so secrets and tokens never reach
//! the logs.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::token::TokenResult;

/// Body of `POST /feishu/oauth/token`.
#[derive(Default, Deserialize)]
pub struct TokenExchangeRequest {
    pub code: Option<String>,
    pub app_id: Option<String>,
    pub app_secret: Option<String>,
}

/// Body of `POST /feishu/oauth/refresh`.
#[derive(Default, Deserialize)]
pub struct TokenRefreshRequest {
    pub refresh_token: Option<String>,
    pub app_id: Option<String>,
    pub app_secret: Option<String>,
}

/// Body of `POST /feishu/validate-credentials`.
#[derive(Default, Deserialize)]
pub struct ValidateCredentialsRequest {
    pub app_id: Option<String>,
    pub app_secret: Option<String>,
}

/// Body of `POST /feishu/user/info`.
#[derive(Default, Deserialize)]
pub struct UserInfoRequest {
    pub access_token: Option<String>,
}

/// Query of `GET /feishu/oauth/callback`.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Successful token exchange or refresh.
#[derive(Debug, Serialize)]
pub struct TokenResponseBody {
    pub success: bool,
    #[serde(flatten)]
    pub token: TokenResult,
}

impl From<TokenResult> for TokenResponseBody {
    fn from(token: TokenResult) -> Self {
        Self { success: true, token }
    }
}

/// Answer of `POST /feishu/validate-credentials`.
#[derive(Debug, Serialize)]
pub struct ValidationResponseBody {
    pub success: bool,
    pub valid: bool,
    pub message: String,
}

/// Answer of `POST /feishu/user/info`.
#[derive(Debug, Serialize)]
pub struct UserInfoResponseBody {
    pub success: bool,
    pub data: serde_json::Value,
}

fn redacted(value: Option<&String>) -> &'static str {
    if value.is_some_and(|v| !v.is_empty()) { "[REDACTED]" } else { "<none>" }
}

impl fmt::Debug for TokenExchangeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenExchangeRequest")
            .field("code", &redacted(self.code.as_ref()))
            .field("app_id", &self.app_id)
            .field("app_secret", &redacted(self.app_secret.as_ref()))
            .finish()
    }
}

impl fmt::Debug for TokenRefreshRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRefreshRequest")
            .field("refresh_token", &redacted(self.refresh_token.as_ref()))
            .field("app_id", &self.app_id)
            .field("app_secret", &redacted(self.app_secret.as_ref()))
            .finish()
    }
}

impl fmt::Debug for ValidateCredentialsRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidateCredentialsRequest")
            .field("app_id", &self.app_id)
            .field("app_secret", &redacted(self.app_secret.as_ref()))
            .finish()
    }
}

impl fmt::Debug for UserInfoRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserInfoRequest")
            .field("access_token", &redacted(self.access_token.as_ref()))
            .finish()
    }
}
