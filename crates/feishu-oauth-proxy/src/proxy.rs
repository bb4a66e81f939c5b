//! The token proxy service: one method per endpoint, independent of HTTP.
//!
//! Every method resolves inputs, talks to Feishu at most twice (credential
//! check, then the actual call) and returns a normalized result. Nothing is
//! kept between requests.

use std::sync::Arc;

use serde_json::Value;

use crate::client::FeishuClient;
use crate::config::Config;
use crate::credential::{
    self, CredentialVerifier, ResolvedCredential, ValidationOutcome, masked, present,
};
use crate::error::{ProxyError, ProxyResult};
use crate::models::{
    TokenExchangeRequest, TokenRefreshRequest, TokenResult, UserInfoRequest,
    ValidateCredentialsRequest,
};

/// Characters of an authorization code kept when logging.
const CODE_LOG_PREFIX: usize = 10;

/// Stateless request handler set backed by one Feishu client.
#[derive(Clone)]
pub struct ProxyService {
    config: Arc<Config>,
    client: FeishuClient,
    verifier: Arc<dyn CredentialVerifier>,
}

impl ProxyService {
    /// Create a service that checks tenant credentials against Feishu.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = FeishuClient::new(&config)?;
        let verifier: Arc<dyn CredentialVerifier> = Arc::new(client.clone());
        Ok(Self { config: Arc::new(config), client, verifier })
    }

    /// Replace the credential verifier.
    #[must_use]
    pub fn with_verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Configuration the service was built with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Exchange an authorization code for a token pair.
    pub async fn exchange_code(&self, req: TokenExchangeRequest) -> ProxyResult<TokenResult> {
        tracing::info!(
            code = %masked(req.code.as_deref().unwrap_or_default(), CODE_LOG_PREFIX),
            app_id = %masked(req.app_id.as_deref().unwrap_or_default(), credential::APP_ID_LOG_PREFIX),
            has_app_secret = present(req.app_secret.as_deref()).is_some(),
            "Token exchange requested"
        );

        let code = present(req.code.as_deref()).ok_or(ProxyError::MissingParameter("code"))?;
        let resolved = self.resolve(req.app_id.as_deref(), req.app_secret.as_deref()).await?;

        let token = self.client.exchange_code(code, &resolved.credential).await?;

        tracing::info!(source = %resolved.source, expires_in = token.expires_in, "Token exchange succeeded");
        Ok(token)
    }

    /// Refresh an access token.
    pub async fn refresh_token(&self, req: TokenRefreshRequest) -> ProxyResult<TokenResult> {
        tracing::info!(
            app_id = %masked(req.app_id.as_deref().unwrap_or_default(), credential::APP_ID_LOG_PREFIX),
            has_app_secret = present(req.app_secret.as_deref()).is_some(),
            "Token refresh requested"
        );

        let refresh_token = present(req.refresh_token.as_deref())
            .ok_or(ProxyError::MissingParameter("refresh_token"))?;
        let resolved = self.resolve(req.app_id.as_deref(), req.app_secret.as_deref()).await?;

        let token = self.client.refresh_token(refresh_token, &resolved.credential).await?;

        tracing::info!(source = %resolved.source, expires_in = token.expires_in, "Token refresh succeeded");
        Ok(token)
    }

    /// Check a credential pair on behalf of the browser client.
    pub async fn validate_credentials(
        &self,
        req: ValidateCredentialsRequest,
    ) -> ProxyResult<ValidationOutcome> {
        let app_id = req.app_id.as_deref().unwrap_or_default();

        tracing::info!(
            app_id = %masked(app_id, credential::APP_ID_LOG_PREFIX),
            has_app_secret = present(req.app_secret.as_deref()).is_some(),
            "Credential validation requested"
        );

        let (Some(app_id), Some(app_secret)) =
            (present(req.app_id.as_deref()), present(req.app_secret.as_deref()))
        else {
            return Err(ProxyError::MissingParameter("App ID or App Secret"));
        };

        let outcome = credential::check_credentials(self.verifier.as_ref(), app_id, app_secret).await;

        tracing::info!(
            target: "security",
            event = "CREDENTIAL_VALIDATION",
            app_id = %masked(app_id, credential::APP_ID_LOG_PREFIX),
            result = if outcome.valid { "SUCCESS" } else { "FAILED" },
            "Security event"
        );

        Ok(outcome)
    }

    /// Fetch the user profile for an access token.
    pub async fn user_info(&self, req: UserInfoRequest) -> ProxyResult<Value> {
        let access_token = present(req.access_token.as_deref())
            .ok_or(ProxyError::MissingParameter("access_token"))?;

        tracing::info!("User info requested");

        Ok(self.client.user_info(access_token).await?)
    }

    async fn resolve(
        &self,
        app_id: Option<&str>,
        app_secret: Option<&str>,
    ) -> ProxyResult<ResolvedCredential> {
        let resolved = credential::resolve_credential(
            app_id,
            app_secret,
            self.config.default_credential.as_ref(),
            self.verifier.as_ref(),
        )
        .await?;

        tracing::debug!(
            source = %resolved.source,
            app_id = %resolved.credential.masked_app_id(),
            "Credential resolved"
        );

        Ok(resolved)
    }
}

impl std::fmt::Debug for ProxyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyService")
            .field("client", &self.client)
            .field("has_default_credential", &self.config.has_default_credential())
            .finish()
    }
}
