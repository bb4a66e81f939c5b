//! Token payloads and normalization of the provider's response shapes.
//!
//! Feishu answers the code exchange in two layouts: the OAuth 2.0 standard one
//! with `access_token` at the top level, and its own envelope
//! `{code, msg, data: {access_token, ...}}`. Errors arrive either as
//! `{error, error_description}` or as a non-zero `code`. The provider is loose
//! with types, so fields are read with JavaScript-style truthiness: `null`,
//! `false`, `0` and `""` count as absent.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::api::DEFAULT_EXPIRES_IN;
use crate::error::{ClientError, ClientResult};

/// Message used when the provider reports failure without one.
pub const UNKNOWN_ERROR: &str = "unknown error";

/// Normalized token pair returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResult {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    #[serde(default)]
    pub scope: String,
}

const fn default_expires_in() -> u64 {
    DEFAULT_EXPIRES_IN
}

/// A code-exchange response decoded by shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenResponse {
    /// `{error, error_description?}`
    OAuthError { message: String },
    /// `{code != 0, msg?}`
    ProviderError { message: String },
    /// Top-level `access_token`.
    Standard(TokenResult),
    /// `data.access_token` inside the provider envelope.
    Wrapped(TokenResult),
    /// None of the above.
    Unrecognized,
}

impl TokenResponse {
    /// Decode a response body. Shapes are tried in priority order; an
    /// explicit error field wins over a token that is also present.
    #[must_use]
    pub fn classify(body: &Value) -> Self {
        if let Some(error) = truthy(body.get("error")) {
            let message = truthy(body.get("error_description")).unwrap_or(error);
            return Self::OAuthError { message: display(message) };
        }

        if let Some(message) = error_code_message(body) {
            return Self::ProviderError { message };
        }

        if let Some(token) = TokenResult::from_object(body) {
            return Self::Standard(token);
        }

        if let Some(token) = truthy(body.get("data")).and_then(TokenResult::from_object) {
            return Self::Wrapped(token);
        }

        Self::Unrecognized
    }

    /// Collapse into the caller-facing result.
    pub fn into_result(self) -> ClientResult<TokenResult> {
        match self {
            Self::OAuthError { message } | Self::ProviderError { message } => {
                Err(ClientError::provider(message))
            }
            Self::Standard(token) | Self::Wrapped(token) => Ok(token),
            Self::Unrecognized => Err(ClientError::UnrecognizedFormat),
        }
    }
}

impl TokenResult {
    /// Read `{access_token, refresh_token?, expires_in?, scope?}` from an object.
    fn from_object(object: &Value) -> Option<Self> {
        let access_token = truthy(object.get("access_token")).map(display)?;

        Some(Self {
            access_token,
            refresh_token: optional_string(object.get("refresh_token")),
            expires_in: seconds(object.get("expires_in")),
            scope: optional_string(object.get("scope")),
        })
    }

    /// Map a refresh response (`app_access_token`, `expire`).
    ///
    /// The caller's refresh token is kept when the provider does not rotate it.
    pub fn from_refresh(body: &Value, original_refresh_token: &str) -> ClientResult<Self> {
        if let Some(message) = error_code_message(body) {
            return Err(ClientError::provider(message));
        }

        let access_token = truthy(body.get("app_access_token"))
            .map(display)
            .ok_or(ClientError::UnrecognizedFormat)?;

        let refresh_token = truthy(body.get("refresh_token"))
            .map(display)
            .unwrap_or_else(|| original_refresh_token.to_string());

        Ok(Self {
            access_token,
            refresh_token,
            expires_in: seconds(body.get("expire")),
            scope: optional_string(body.get("scope")),
        })
    }
}

/// The value itself when it is truthy.
fn truthy(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

/// Provider `msg` when present, else `None`.
pub(crate) fn message_of(body: &Value) -> Option<String> {
    truthy(body.get("msg")).map(display)
}

/// Message for a present, non-zero `code`.
fn error_code_message(body: &Value) -> Option<String> {
    body.get("code")
        .filter(|code| !is_zero(code))
        .map(|_| message_of(body).unwrap_or_else(|| UNKNOWN_ERROR.to_string()))
}

fn is_zero(value: &Value) -> bool {
    value.as_f64() == Some(0.0)
}

/// Render a JSON value without quoting strings.
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn optional_string(value: Option<&Value>) -> String {
    truthy(value).map(display).unwrap_or_default()
}

fn seconds(value: Option<&Value>) -> u64 {
    truthy(value)
        .and_then(|v| match v {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .filter(|&secs| secs > 0)
        .unwrap_or(DEFAULT_EXPIRES_IN)
}
