//! Driven port over the upstream grants service.
//!
//! The [`GrantsDirectory`] trait is the only seam between the domain and
//! the signed HTTP adapter. Operations are thin typed accessors with no
//! business logic; every call maps one-to-one onto an upstream endpoint.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::profile::ProfileApp;
use crate::domain::{Account, Grant, Product, User};

/// Errors raised by grants-directory adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrantsDirectoryError {
    /// The request could not reach the upstream or the connection failed.
    #[error("upstream transport failure: {message}")]
    Transport {
        /// Adapter-reported failure description.
        message: String,
    },
    /// The request exceeded the configured deadline.
    #[error("upstream request timed out: {message}")]
    Timeout {
        /// Adapter-reported failure description.
        message: String,
    },
    /// The upstream answered with a non-success HTTP status.
    #[error("upstream returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response text, for operator diagnostics.
        body: String,
    },
    /// A request body could not be serialised.
    #[error("failed to encode request body: {message}")]
    Encode {
        /// Serialisation failure description.
        message: String,
    },
    /// A response body could not be decoded into the expected shape.
    #[error("failed to decode upstream response: {message}")]
    Decode {
        /// Decoding failure description.
        message: String,
    },
}

impl GrantsDirectoryError {
    /// Helper for transport-level failures.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Helper for deadline failures.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Helper for non-success statuses.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Helper for request encoding failures.
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    /// Helper for response decoding failures.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Whether this error is an HTTP 404 from the upstream.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

/// Payload for creating a grant under an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateGrantRequest {
    /// User receiving the entitlement.
    pub user_id: String,
    /// Product being granted.
    pub product_id: String,
    /// Entitlement category, e.g. `subscription`.
    pub entitlement_type: String,
}

/// Typed accessors over the upstream grants service.
///
/// Adapters own authentication, transport, and decoding; callers own retry
/// and partial-failure policy, because only they know whether a failure
/// should abort a computation or merely exclude one unit from it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GrantsDirectory: Send + Sync {
    /// List the accounts belonging to a company.
    async fn accounts_by_company(
        &self,
        company_id: &str,
    ) -> Result<Vec<Account>, GrantsDirectoryError>;

    /// List the grants held under an account.
    async fn account_grants(&self, account_id: &str) -> Result<Vec<Grant>, GrantsDirectoryError>;

    /// Fetch a user record by identifier.
    async fn user(&self, user_id: &str) -> Result<User, GrantsDirectoryError>;

    /// Create a grant under an account.
    async fn create_grant(
        &self,
        account_id: &str,
        request: &CreateGrantRequest,
    ) -> Result<Grant, GrantsDirectoryError>;

    /// Delete a grant under an account.
    async fn delete_grant(
        &self,
        account_id: &str,
        grant_id: &str,
    ) -> Result<(), GrantsDirectoryError>;

    /// Fetch a user's raw profile document for an application.
    async fn user_profile(
        &self,
        user_id: &str,
        app: ProfileApp,
    ) -> Result<Value, GrantsDirectoryError>;

    /// Replace a user's profile document for an application.
    async fn update_user_profile(
        &self,
        user_id: &str,
        app: ProfileApp,
        profile: &Value,
    ) -> Result<(), GrantsDirectoryError>;

    /// List the upstream product catalogue.
    async fn products(&self) -> Result<Vec<Product>, GrantsDirectoryError>;
}

/// Fixture directory for tests that do not exercise upstream access.
///
/// Every listing returns empty and every lookup reports a 404.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureGrantsDirectory;

#[async_trait]
impl GrantsDirectory for FixtureGrantsDirectory {
    async fn accounts_by_company(
        &self,
        _company_id: &str,
    ) -> Result<Vec<Account>, GrantsDirectoryError> {
        Ok(Vec::new())
    }

    async fn account_grants(
        &self,
        _account_id: &str,
    ) -> Result<Vec<Grant>, GrantsDirectoryError> {
        Ok(Vec::new())
    }

    async fn user(&self, user_id: &str) -> Result<User, GrantsDirectoryError> {
        Err(GrantsDirectoryError::status(
            404,
            format!("fixture has no user {user_id}"),
        ))
    }

    async fn create_grant(
        &self,
        account_id: &str,
        _request: &CreateGrantRequest,
    ) -> Result<Grant, GrantsDirectoryError> {
        Err(GrantsDirectoryError::status(
            404,
            format!("fixture has no account {account_id}"),
        ))
    }

    async fn delete_grant(
        &self,
        _account_id: &str,
        _grant_id: &str,
    ) -> Result<(), GrantsDirectoryError> {
        Ok(())
    }

    async fn user_profile(
        &self,
        user_id: &str,
        app: ProfileApp,
    ) -> Result<Value, GrantsDirectoryError> {
        Err(GrantsDirectoryError::status(
            404,
            format!("fixture has no {app} for user {user_id}"),
        ))
    }

    async fn update_user_profile(
        &self,
        _user_id: &str,
        _app: ProfileApp,
        _profile: &Value,
    ) -> Result<(), GrantsDirectoryError> {
        Ok(())
    }

    async fn products(&self) -> Result<Vec<Product>, GrantsDirectoryError> {
        Ok(Vec::new())
    }
}
