//! Configuration for the Feishu OAuth proxy.

use std::time::Duration;

use crate::credential::TenantCredential;

/// Feishu API constants.
pub mod api {
    use std::time::Duration;

    /// Base URL for the Feishu open platform.
    pub const BASE_URL: &str = "https://open.feishu.cn/open-apis";

    /// Internal tenant token issuance, used to check app credentials.
    pub const TENANT_ACCESS_TOKEN_PATH: &str = "/auth/v3/tenant_access_token/internal";

    /// Authorization code → user token exchange.
    pub const OAUTH_TOKEN_PATH: &str = "/authen/v2/oauth/token";

    /// Token refresh.
    pub const REFRESH_TOKEN_PATH: &str = "/auth/v3/app_access_token/refresh";

    /// Authenticated user profile.
    pub const USER_INFO_PATH: &str = "/authen/v1/user_info";

    /// Redirect URI sent with the code exchange when none is configured.
    pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3001/feishu/oauth/callback";

    /// Token lifetime reported when the provider omits one (2 hours).
    pub const DEFAULT_EXPIRES_IN: u64 = 7200;

    /// Default listen port.
    pub const DEFAULT_PORT: u16 = 3001;

    /// Request timeout.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Maximum keepalive connections.
    pub const MAX_KEEPALIVE: usize = 10;

    /// Keepalive expiry.
    pub const KEEPALIVE_EXPIRY: Duration = Duration::from_secs(30);
}

/// Proxy configuration.
///
/// Built once at startup and handed to the service; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// App credential used when a request carries none.
    pub default_credential: Option<TenantCredential>,

    /// Base URL for the Feishu open API (for testing with mock servers).
    pub api_base_url: String,

    /// Redirect URI registered with the Feishu app.
    pub redirect_uri: String,

    /// Request timeout.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Close the callback window after this delay. `None` leaves it open.
    pub callback_close_delay: Option<Duration>,
}

impl Config {
    /// Create a new configuration with an optional default credential.
    #[must_use]
    pub fn new(default_credential: Option<TenantCredential>) -> Self {
        Self {
            default_credential,
            api_base_url: api::BASE_URL.to_string(),
            redirect_uri: api::DEFAULT_REDIRECT_URI.to_string(),
            request_timeout: api::REQUEST_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
            callback_close_delay: None,
        }
    }

    /// Create a test configuration pointing at a mock server.
    ///
    /// The mock must serve the Feishu paths under `/open-apis`.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            default_credential: Some(TenantCredential::new("cli_default0001", "default-secret-value")),
            api_base_url: format!("{}/open-apis", base_url.trim_end_matches('/')),
            redirect_uri: "http://localhost/feishu/oauth/callback".to_string(),
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            callback_close_delay: None,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Reads `FEISHU_APP_ID` / `FEISHU_APP_SECRET`, falling back to the
    /// `VITE_FEISHU_*` names used by the web client's `.env`. A default
    /// credential is only set when both halves are present.
    ///
    /// # Errors
    ///
    /// Returns error if a configured URL does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        let app_id = env_any(&["FEISHU_APP_ID", "VITE_FEISHU_APP_ID"]);
        let app_secret = env_any(&["FEISHU_APP_SECRET", "VITE_FEISHU_APP_SECRET"]);

        let default_credential = match (app_id, app_secret) {
            (Some(id), Some(secret)) => Some(TenantCredential::new(id, secret)),
            _ => None,
        };

        let mut config = Self::new(default_credential);

        if let Some(uri) = env_any(&["FEISHU_REDIRECT_URI", "VITE_FEISHU_REDIRECT_URI"]) {
            config.redirect_uri = uri;
        }
        if let Some(base) = env_any(&["FEISHU_API_BASE_URL"]) {
            config.api_base_url = base;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the configured URLs are absolute.
    ///
    /// # Errors
    ///
    /// Returns error naming the offending setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        url::Url::parse(&self.api_base_url)
            .map_err(|e| anyhow::anyhow!("invalid api base url {:?}: {e}", self.api_base_url))?;
        url::Url::parse(&self.redirect_uri)
            .map_err(|e| anyhow::anyhow!("invalid redirect uri {:?}: {e}", self.redirect_uri))?;
        Ok(())
    }

    /// Check if a default credential is configured.
    #[must_use]
    pub const fn has_default_credential(&self) -> bool {
        self.default_credential.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None)
    }
}

/// First non-empty value among the given environment variables.
fn env_any(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.is_empty())
}
