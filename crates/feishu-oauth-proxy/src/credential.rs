//! Tenant credentials: format rules, provider validation and per-request resolution.
//!
//! A request may carry its own `app_id`/`app_secret` pair (multi-tenant mode) or
//! none at all, in which case the configured default app is used. The four
//! presence combinations map onto exactly one outcome each:
//!
//! | app_id | app_secret | outcome                               |
//! |--------|------------|---------------------------------------|
//! | yes    | yes        | validated tenant credential, or error |
//! | yes    | no         | [`ProxyError::IncompleteCredential`]  |
//! | no     | no         | default credential                    |
//! | no     | yes        | [`ProxyError::CredentialMismatch`]    |

use std::fmt;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;

use crate::error::{ProxyError, ProxyResult};

/// Feishu app ids look like `cli_a1b2c3d4e5f6`.
static APP_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^cli_[a-zA-Z0-9]+$").expect("valid app id pattern"));

/// Shortest app secret accepted before asking the provider.
pub const MIN_SECRET_LEN: usize = 10;

/// Characters of an app id kept when logging.
pub const APP_ID_LOG_PREFIX: usize = 8;

/// An app id/secret pair.
#[derive(Clone, PartialEq, Eq)]
pub struct TenantCredential {
    pub app_id: String,
    pub app_secret: String,
}

/// Why a credential failed the local format check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FormatViolation {
    #[error("App ID or App Secret is empty")]
    Empty,
    #[error("App ID format is invalid")]
    MalformedAppId,
    #[error("App Secret is too short")]
    SecretTooShort,
}

impl TenantCredential {
    #[must_use]
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self { app_id: app_id.into(), app_secret: app_secret.into() }
    }

    /// Check the credential shape without touching the network.
    pub fn validate_format(&self) -> Result<(), FormatViolation> {
        if self.app_id.is_empty() || self.app_secret.is_empty() {
            return Err(FormatViolation::Empty);
        }
        if !APP_ID_PATTERN.is_match(&self.app_id) {
            return Err(FormatViolation::MalformedAppId);
        }
        if self.app_secret.chars().count() < MIN_SECRET_LEN {
            return Err(FormatViolation::SecretTooShort);
        }
        Ok(())
    }

    /// App id shortened for logs.
    #[must_use]
    pub fn masked_app_id(&self) -> String {
        masked(&self.app_id, APP_ID_LOG_PREFIX)
    }
}

impl fmt::Debug for TenantCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantCredential")
            .field("app_id", &self.app_id)
            .field("app_secret", &"[REDACTED]")
            .finish()
    }
}

/// Result of a credential check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    /// Provider response code, when the provider answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    /// Provider message or local rejection reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationOutcome {
    /// Outcome from a provider response code.
    #[must_use]
    pub fn from_provider(code: Option<i64>, message: Option<String>) -> Self {
        Self { valid: code == Some(0), code, message }
    }

    /// Rejected locally; the provider was not asked.
    #[must_use]
    pub fn rejected(violation: FormatViolation) -> Self {
        Self { valid: false, code: None, message: Some(violation.to_string()) }
    }

    /// Provider could not be reached or answered garbage.
    #[must_use]
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self { valid: false, code: None, message: Some(reason.into()) }
    }
}

/// Asks the identity provider whether it accepts a credential.
///
/// Implementations never fail: transport and parse problems map to an
/// invalid outcome.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, credential: &TenantCredential) -> ValidationOutcome;
}

/// Validate an id/secret pair: format first, then the provider.
///
/// The provider is only contacted when the format check passes.
pub async fn check_credentials(
    verifier: &dyn CredentialVerifier,
    app_id: &str,
    app_secret: &str,
) -> ValidationOutcome {
    let credential = TenantCredential::new(app_id, app_secret);

    if let Err(violation) = credential.validate_format() {
        tracing::info!(
            app_id = %credential.masked_app_id(),
            reason = %violation,
            "Credential rejected before provider check"
        );
        return ValidationOutcome::rejected(violation);
    }

    let outcome = verifier.verify(&credential).await;

    tracing::info!(
        app_id = %credential.masked_app_id(),
        valid = outcome.valid,
        code = ?outcome.code,
        msg = ?outcome.message,
        "Credential checked with provider"
    );

    outcome
}

/// Where a resolved credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Supplied by the caller and validated.
    Tenant,
    /// Process-wide default app.
    Default,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tenant => f.write_str("tenant"),
            Self::Default => f.write_str("default"),
        }
    }
}

/// Credential chosen for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCredential {
    pub credential: TenantCredential,
    pub source: CredentialSource,
}

/// Pick the credential for a request.
///
/// Absent and empty values are treated alike.
pub async fn resolve_credential(
    app_id: Option<&str>,
    app_secret: Option<&str>,
    default: Option<&TenantCredential>,
    verifier: &dyn CredentialVerifier,
) -> ProxyResult<ResolvedCredential> {
    match (present(app_id), present(app_secret)) {
        (Some(id), Some(secret)) => {
            let outcome = check_credentials(verifier, id, secret).await;
            if !outcome.valid {
                return Err(ProxyError::InvalidCredential);
            }
            Ok(ResolvedCredential {
                credential: TenantCredential::new(id, secret),
                source: CredentialSource::Tenant,
            })
        }
        (Some(_), None) => Err(ProxyError::IncompleteCredential),
        (None, None) => {
            let credential = default.cloned().ok_or(ProxyError::NoDefaultCredential)?;
            Ok(ResolvedCredential { credential, source: CredentialSource::Default })
        }
        (None, Some(_)) => Err(ProxyError::CredentialMismatch),
    }
}

/// `Some` only for non-empty values.
#[must_use]
pub fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Keep the first `keep` characters of a value and elide the rest.
#[must_use]
pub fn masked(value: &str, keep: usize) -> String {
    if value.is_empty() {
        return "<none>".to_string();
    }
    let prefix: String = value.chars().take(keep).collect();
    format!("{prefix}...")
}
