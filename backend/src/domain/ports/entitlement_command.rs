//! Driving port for grant mutations and profile access.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::profile::{AvailableProfile, ProfileApp, ProfileDocument};
use crate::domain::{DomainError, Grant};

/// Entitlement type recorded when the caller does not supply one.
pub const DEFAULT_ENTITLEMENT_TYPE: &str = "subscription";

/// Request to grant a product to a user under an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantProductRequest {
    /// Account the grant is created under.
    pub account_id: String,
    /// User receiving the entitlement.
    pub user_id: String,
    /// Product being granted.
    pub product_id: String,
    /// Entitlement category; [`DEFAULT_ENTITLEMENT_TYPE`] when `None`.
    pub entitlement_type: Option<String>,
}

/// Grant mutations and entitlement-gated profile operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntitlementCommand: Send + Sync {
    /// Grant a product to a user; pass-through to the upstream system of
    /// record.
    async fn grant_product(&self, request: GrantProductRequest) -> Result<Grant, DomainError>;

    /// Remove a grant; pass-through to the upstream system of record.
    async fn remove_product(&self, account_id: &str, grant_id: &str) -> Result<(), DomainError>;

    /// List every profile kind with its availability for an account.
    async fn list_available_profiles(
        &self,
        account_id: &str,
    ) -> Result<Vec<AvailableProfile>, DomainError>;

    /// Fetch and validate a user's profile, gated by the account's grants.
    async fn profile(
        &self,
        user_id: &str,
        account_id: &str,
        app: ProfileApp,
    ) -> Result<ProfileDocument, DomainError>;

    /// Validate and write a user's profile, gated by the account's grants.
    ///
    /// Returns the validated document as written.
    async fn update_profile(
        &self,
        user_id: &str,
        account_id: &str,
        app: ProfileApp,
        payload: Value,
    ) -> Result<ProfileDocument, DomainError>;
}
