//! Environment-driven configuration for the upstream grants integration.
//!
//! All knobs are read through [`mockable::Env`] so tests can inject values
//! without mutating process state. The signing secret is held in a
//! [`Zeroizing`] wrapper and never appears in `Debug` output.

use std::time::Duration;

use mockable::Env;
use thiserror::Error;
use url::Url;
use zeroize::Zeroizing;

use crate::domain::DEFAULT_FANOUT_LIMIT;

/// Base URL of the upstream grants service.
pub const UPSTREAM_BASE_URL: &str = "UPSTREAM_BASE_URL";
/// Identifier of the shared HMAC key, sent in the authorization header.
pub const UPSTREAM_HMAC_KEY_ID: &str = "UPSTREAM_HMAC_KEY_ID";
/// Shared HMAC secret used to sign every upstream request.
pub const UPSTREAM_HMAC_SECRET: &str = "UPSTREAM_HMAC_SECRET";
/// Company whose accounts the dashboard aggregates over.
pub const COMPANY_ID: &str = "COMPANY_ID";
/// Per-request deadline in whole seconds.
pub const UPSTREAM_TIMEOUT_SECS: &str = "UPSTREAM_TIMEOUT_SECS";
/// Upper bound on concurrent upstream requests during fan-out.
pub const UPSTREAM_FANOUT_LIMIT: &str = "UPSTREAM_FANOUT_LIMIT";

/// Deadline applied when [`UPSTREAM_TIMEOUT_SECS`] is unset.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Shared HMAC secret with redacted debug output.
///
/// The wrapped string is zeroed on drop; callers reach the raw bytes only
/// through [`SigningSecret::expose`].
#[derive(Clone)]
pub struct SigningSecret(Zeroizing<String>);

impl SigningSecret {
    /// Wrap a raw secret string.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Zeroizing::new(secret.into()))
    }

    /// Borrow the raw secret for key derivation.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

/// Errors raised while assembling [`UpstreamConfig`] from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required variable was absent.
    #[error("missing required environment variable {name}")]
    MissingEnv {
        /// Variable name.
        name: &'static str,
    },
    /// A variable was present but unusable.
    #[error("invalid value {value:?} for {name}: {reason}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigError {
    fn missing(name: &'static str) -> Self {
        Self::MissingEnv { name }
    }

    fn invalid(name: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEnv {
            name,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Connection settings for the signed upstream client.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL requests are resolved against.
    pub base_url: Url,
    /// Key identifier presented in the authorization header.
    pub key_id: String,
    /// Shared secret the signatures are derived from.
    pub secret: SigningSecret,
    /// Company scoping every analytics query.
    pub company_id: String,
    /// Per-request deadline.
    pub timeout: Duration,
    /// Concurrent-request bound for aggregation fan-out.
    pub fanout_limit: usize,
}

/// Assemble [`UpstreamConfig`] from environment variables.
///
/// # Errors
///
/// Returns [`ConfigError::MissingEnv`] when a required variable is unset
/// and [`ConfigError::InvalidEnv`] when one cannot be parsed.
pub fn upstream_config_from_env<E: Env>(env: &E) -> Result<UpstreamConfig, ConfigError> {
    let base_url = required(env, UPSTREAM_BASE_URL)?;
    let base_url = Url::parse(&base_url)
        .map_err(|error| ConfigError::invalid(UPSTREAM_BASE_URL, base_url, error.to_string()))?;
    let key_id = required(env, UPSTREAM_HMAC_KEY_ID)?;
    let secret = SigningSecret::new(required(env, UPSTREAM_HMAC_SECRET)?);
    let company_id = required(env, COMPANY_ID)?;
    let timeout = match env.string(UPSTREAM_TIMEOUT_SECS) {
        None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        Some(raw) => {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ConfigError::invalid(UPSTREAM_TIMEOUT_SECS, &raw, "expected whole seconds")
            })?;
            if secs == 0 {
                return Err(ConfigError::invalid(
                    UPSTREAM_TIMEOUT_SECS,
                    raw,
                    "deadline must be non-zero",
                ));
            }
            Duration::from_secs(secs)
        }
    };
    let fanout_limit = match env.string(UPSTREAM_FANOUT_LIMIT) {
        None => DEFAULT_FANOUT_LIMIT,
        Some(raw) => {
            let limit: usize = raw.trim().parse().map_err(|_| {
                ConfigError::invalid(UPSTREAM_FANOUT_LIMIT, &raw, "expected a positive integer")
            })?;
            if limit == 0 {
                return Err(ConfigError::invalid(
                    UPSTREAM_FANOUT_LIMIT,
                    raw,
                    "fan-out limit must be non-zero",
                ));
            }
            limit
        }
    };
    Ok(UpstreamConfig {
        base_url,
        key_id,
        secret,
        company_id,
        timeout,
        fanout_limit,
    })
}

fn required<E: Env>(env: &E, name: &'static str) -> Result<String, ConfigError> {
    let value = env.string(name).ok_or_else(|| ConfigError::missing(name))?;
    if value.trim().is_empty() {
        return Err(ConfigError::invalid(name, value, "value must not be blank"));
    }
    Ok(value)
}
