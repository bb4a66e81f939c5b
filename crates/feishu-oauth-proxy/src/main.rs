//! Feishu OAuth Token Proxy - Entry Point

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use feishu_oauth_proxy::{
    config::{Config, api},
    credential::TenantCredential,
    proxy::ProxyService,
    server::ProxyServer,
};

#[derive(Parser, Debug)]
#[command(name = "feishu-oauth-proxy")]
#[command(about = "OAuth 2.0 token-exchange proxy for Feishu/Lark")]
#[command(version)]
struct Cli {
    /// HTTP server port
    #[arg(long, default_value_t = api::DEFAULT_PORT, env = "PORT")]
    port: u16,

    /// Default Feishu App ID (overrides FEISHU_APP_ID / VITE_FEISHU_APP_ID)
    #[arg(long)]
    app_id: Option<String>,

    /// Default Feishu App Secret (overrides FEISHU_APP_SECRET / VITE_FEISHU_APP_SECRET)
    #[arg(long)]
    app_secret: Option<String>,

    /// Redirect URI registered with the Feishu app
    #[arg(long)]
    redirect_uri: Option<String>,

    /// Feishu open API base URL
    #[arg(long)]
    api_base_url: Option<String>,

    /// Close the callback window after this many seconds (stays open if unset)
    #[arg(long, env = "FEISHU_CALLBACK_CLOSE_DELAY_SECS")]
    callback_close_delay: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    /// Layer command-line overrides on top of the environment configuration.
    fn apply(self, mut config: Config) -> anyhow::Result<Config> {
        match (self.app_id, self.app_secret) {
            (Some(id), Some(secret)) => {
                config.default_credential = Some(TenantCredential::new(id, secret));
            }
            (Some(_), None) | (None, Some(_)) => {
                anyhow::bail!("--app-id and --app-secret must be given together");
            }
            (None, None) => {}
        }
        if let Some(uri) = self.redirect_uri {
            config.redirect_uri = uri;
        }
        if let Some(base) = self.api_base_url {
            config.api_base_url = base;
        }
        if let Some(secs) = self.callback_close_delay {
            config.callback_close_delay = Some(Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        subscriber.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Feishu OAuth proxy");

    let port = cli.port;
    let config = cli.apply(Config::from_env()?)?;
    let service = ProxyService::new(config)?;

    ProxyServer::new(service).run_http(port).await
}
