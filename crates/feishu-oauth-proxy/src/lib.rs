//! Feishu OAuth Token Proxy
//!
//! Server-side OAuth 2.0 token exchange for Feishu/Lark. A browser client
//! posts its authorization code here instead of to Feishu, so app secrets
//! never leave the server.
//!
//! # Features
//!
//! - **Multi-tenant**: requests may carry their own App ID/App Secret, which are
//!   validated against Feishu; otherwise the configured default app is used
//! - **Normalized tokens**: both the OAuth 2.0 standard and Feishu's envelope
//!   response shapes come back as one `TokenResult`
//! - **Stateless**: nothing is stored between requests
//!
//! # Example
//!
//! ```no_run
//! use feishu_oauth_proxy::{config::Config, proxy::ProxyService, server::ProxyServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let service = ProxyService::new(config)?;
//!
//!     ProxyServer::new(service).run_http(3001).await
//! }
//! ```

pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod models;
pub mod proxy;
pub mod server;

pub use client::FeishuClient;
pub use config::Config;
pub use credential::{CredentialVerifier, TenantCredential, ValidationOutcome};
pub use error::{ClientError, ProxyError};
pub use proxy::ProxyService;
