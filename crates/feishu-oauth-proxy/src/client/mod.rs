//! Feishu open API client.
//!
//! One method per upstream call the proxy makes:
//! - tenant token issuance (credential check)
//! - authorization code exchange
//! - token refresh
//! - user info
//!
//! Each call is a single request awaited to completion; there are no retries.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde_json::{Value, json};

use crate::config::{Config, api};
use crate::credential::{CredentialVerifier, TenantCredential, ValidationOutcome};
use crate::error::{ClientError, ClientResult};
use crate::models::{TokenResponse, TokenResult, UNKNOWN_ERROR, message_of};

/// Feishu open API client.
#[derive(Clone)]
pub struct FeishuClient {
    /// Pooled HTTP client.
    client: Client,

    /// API base URL, without trailing slash.
    api_base_url: String,

    /// Redirect URI sent with code exchanges.
    redirect_uri: String,
}

impl FeishuClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or HTTP client initialization fails.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        url::Url::parse(&config.api_base_url)?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json; charset=utf-8"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(api::MAX_KEEPALIVE)
            .pool_idle_timeout(api::KEEPALIVE_EXPIRY)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            redirect_uri: config.redirect_uri.clone(),
        })
    }

    /// API base URL this client talks to.
    #[must_use]
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Request an internal tenant access token; the provider's `code` tells
    /// whether it accepts the credential.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or an unparsable body.
    pub async fn request_tenant_token(
        &self,
        credential: &TenantCredential,
    ) -> ClientResult<ValidationOutcome> {
        let url = self.endpoint(api::TENANT_ACCESS_TOKEN_PATH);

        let body = json!({
            "app_id": credential.app_id,
            "app_secret": credential.app_secret
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let value: Value = response.json().await?;

        Ok(ValidationOutcome::from_provider(
            value.get("code").and_then(Value::as_i64),
            message_of(&value),
        ))
    }

    /// Exchange an authorization code for a user token pair.
    ///
    /// Transport failure, a non-2xx status, an unparsable body and a provider
    /// error each surface as a distinct [`ClientError`].
    ///
    /// # Errors
    ///
    /// Returns error on any of the failures above or an unrecognized body.
    pub async fn exchange_code(
        &self,
        code: &str,
        credential: &TenantCredential,
    ) -> ClientResult<TokenResult> {
        let url = self.endpoint(api::OAUTH_TOKEN_PATH);

        let body = json!({
            "grant_type": "authorization_code",
            "client_id": credential.app_id,
            "client_secret": credential.app_secret,
            "code": code,
            "redirect_uri": self.redirect_uri
        });

        let (status, text) = self.send(self.client.post(&url).json(&body)).await?;

        if !status.is_success() {
            return Err(ClientError::status(status.as_u16(), body_or_reason(text, status)));
        }

        let value: Value = serde_json::from_str(&text)?;
        let decoded = TokenResponse::classify(&value);

        match &decoded {
            TokenResponse::Standard(_) => tracing::debug!("Token exchange: standard OAuth 2.0 shape"),
            TokenResponse::Wrapped(_) => tracing::debug!("Token exchange: provider envelope shape"),
            other => tracing::warn!(response = ?other, "Token exchange rejected by provider"),
        }

        decoded.into_result()
    }

    /// Refresh an access token.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, a non-2xx status (carrying the
    /// provider `msg` or the status text) or an unusable body.
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
        credential: &TenantCredential,
    ) -> ClientResult<TokenResult> {
        let url = self.endpoint(api::REFRESH_TOKEN_PATH);

        let body = json!({
            "app_id": credential.app_id,
            "app_secret": credential.app_secret,
            "grant_type": "refresh_token",
            "refresh_token": refresh_token
        });

        let (status, text) = self.send(self.client.post(&url).json(&body)).await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| message_of(&v))
                .unwrap_or_else(|| reason(status));
            return Err(ClientError::status(status.as_u16(), message));
        }

        let value: Value = serde_json::from_str(&text)?;
        TokenResult::from_refresh(&value, refresh_token)
    }

    /// Fetch the profile behind a user access token.
    ///
    /// Returns the provider's `data` object as-is.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, a non-2xx status, an unparsable
    /// body or a provider `code` other than 0.
    pub async fn user_info(&self, access_token: &str) -> ClientResult<Value> {
        let url = self.endpoint(api::USER_INFO_PATH);

        let (status, text) = self.send(self.client.get(&url).bearer_auth(access_token)).await?;

        if !status.is_success() {
            return Err(ClientError::status(status.as_u16(), body_or_reason(text, status)));
        }

        let mut value: Value = serde_json::from_str(&text)?;

        if value.get("code").and_then(Value::as_i64) != Some(0) {
            let message = message_of(&value).unwrap_or_else(|| UNKNOWN_ERROR.to_string());
            return Err(ClientError::provider(message));
        }

        Ok(value.get_mut("data").map(Value::take).unwrap_or(Value::Null))
    }

    /// Send a request and read the body as text.
    async fn send(&self, request: reqwest::RequestBuilder) -> ClientResult<(StatusCode, String)> {
        let response = request.send().await?;
        let status = response.status();

        tracing::debug!(status = %status, url = %response.url(), "Feishu API responded");

        let text = response.text().await?;
        Ok((status, text))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }
}

#[async_trait]
impl CredentialVerifier for FeishuClient {
    async fn verify(&self, credential: &TenantCredential) -> ValidationOutcome {
        match self.request_tenant_token(credential).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    app_id = %credential.masked_app_id(),
                    error = %e,
                    "Credential check could not reach provider"
                );
                ValidationOutcome::unreachable(e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for FeishuClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeishuClient").field("api_base_url", &self.api_base_url).finish()
    }
}

fn reason(status: StatusCode) -> String {
    status.canonical_reason().unwrap_or("unknown status").to_string()
}

fn body_or_reason(text: String, status: StatusCode) -> String {
    if text.trim().is_empty() { reason(status) } else { text }
}
