//! Grant mutations and entitlement-gated profile access.
//!
//! Mutations are simple pass-throughs to the upstream system of record.
//! Profile reads and writes are gated first: the owning account must hold
//! the grant whose product unlocks the requested profile, and the gate is
//! checked before any profile call is issued.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::ports::{
    CreateGrantRequest, DEFAULT_ENTITLEMENT_TYPE, EntitlementCommand, GrantProductRequest,
    GrantsDirectory, GrantsDirectoryError,
};
use crate::domain::profile::{AvailableProfile, ProfileApp, ProfileDocument};
use crate::domain::{DomainError, Grant};

/// Entitlement service over a grants directory.
#[derive(Clone)]
pub struct EntitlementService<D> {
    directory: Arc<D>,
}

impl<D> EntitlementService<D> {
    /// Create a service over the given directory.
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }
}

impl<D> EntitlementService<D>
where
    D: GrantsDirectory,
{
    /// Distinct product ids granted under an account.
    async fn account_products(&self, account_id: &str) -> Result<BTreeSet<String>, DomainError> {
        let grants = self
            .directory
            .account_grants(account_id)
            .await
            .map_err(|error| map_directory_error("account grants", &error))?;
        Ok(grants
            .into_iter()
            .filter_map(|grant| grant.product_id)
            .collect())
    }

    /// Fail with `Forbidden` unless the account's grants unlock `app`.
    ///
    /// The MyLaw default needs no entitlement, so no grant lookup is issued
    /// for it.
    async fn authorize(&self, account_id: &str, app: ProfileApp) -> Result<(), DomainError> {
        let Some(required) = app.required_product() else {
            return Ok(());
        };
        let products = self.account_products(account_id).await?;
        if products.contains(required) {
            Ok(())
        } else {
            Err(DomainError::forbidden(format!(
                "profile {app} not available for this account"
            )))
        }
    }
}

#[async_trait]
impl<D> EntitlementCommand for EntitlementService<D>
where
    D: GrantsDirectory,
{
    async fn grant_product(&self, request: GrantProductRequest) -> Result<Grant, DomainError> {
        let GrantProductRequest {
            account_id,
            user_id,
            product_id,
            entitlement_type,
        } = request;
        let payload = CreateGrantRequest {
            user_id,
            product_id,
            entitlement_type: entitlement_type
                .unwrap_or_else(|| DEFAULT_ENTITLEMENT_TYPE.to_owned()),
        };
        self.directory
            .create_grant(&account_id, &payload)
            .await
            .map_err(|error| map_directory_error("grant creation", &error))
    }

    async fn remove_product(&self, account_id: &str, grant_id: &str) -> Result<(), DomainError> {
        self.directory
            .delete_grant(account_id, grant_id)
            .await
            .map_err(|error| map_directory_error("grant deletion", &error))
    }

    async fn list_available_profiles(
        &self,
        account_id: &str,
    ) -> Result<Vec<AvailableProfile>, DomainError> {
        let products = self.account_products(account_id).await?;
        Ok(ProfileApp::ALL
            .into_iter()
            .map(|app| AvailableProfile {
                app_id: app,
                label: app.label(),
                enabled: app
                    .required_product()
                    .is_none_or(|product| products.contains(product)),
            })
            .collect())
    }

    async fn profile(
        &self,
        user_id: &str,
        account_id: &str,
        app: ProfileApp,
    ) -> Result<ProfileDocument, DomainError> {
        self.authorize(account_id, app).await?;
        let raw = self
            .directory
            .user_profile(user_id, app)
            .await
            .map_err(|error| map_directory_error("profile fetch", &error))?;
        app.decode(raw)
    }

    async fn update_profile(
        &self,
        user_id: &str,
        account_id: &str,
        app: ProfileApp,
        payload: Value,
    ) -> Result<ProfileDocument, DomainError> {
        self.authorize(account_id, app).await?;
        // Validate before anything leaves the process; an invalid payload
        // must never reach the upstream.
        let document = app.decode(payload)?;
        let wire = document.to_value()?;
        self.directory
            .update_user_profile(user_id, app, &wire)
            .await
            .map_err(|error| map_directory_error("profile update", &error))?;
        Ok(document)
    }
}

fn map_directory_error(context: &str, error: &GrantsDirectoryError) -> DomainError {
    if error.is_not_found() {
        return DomainError::not_found(format!("{context} failed: {error}"));
    }
    match error {
        GrantsDirectoryError::Transport { .. } | GrantsDirectoryError::Timeout { .. } => {
            DomainError::service_unavailable(format!("{context} failed: {error}"))
        }
        GrantsDirectoryError::Status { .. }
        | GrantsDirectoryError::Encode { .. }
        | GrantsDirectoryError::Decode { .. } => {
            DomainError::internal(format!("{context} failed: {error}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockGrantsDirectory;

    fn service(directory: MockGrantsDirectory) -> EntitlementService<MockGrantsDirectory> {
        EntitlementService::new(Arc::new(directory))
    }

    fn grant_with_product(product_id: Option<&str>) -> Grant {
        Grant {
            grant_id: "g1".to_owned(),
            user_id: "u1".to_owned(),
            account_id: "acct-a".to_owned(),
            product_id: product_id.map(str::to_owned),
            entitlement_type: "subscription".to_owned(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
                .single()
                .expect("valid timestamp"),
        }
    }

    fn radar_payload() -> Value {
        json!({
            "notifications": true,
            "dataSources": ["filings"],
            "teamView": true,
            "accessLevel": "viewer"
        })
    }

    #[tokio::test]
    async fn radar_grant_enables_radar_but_not_scholar() {
        let mut directory = MockGrantsDirectory::new();
        directory
            .expect_account_grants()
            .times(1)
            .returning(|_| Ok(vec![grant_with_product(Some("radar-prod"))]));
        let service = service(directory);

        let profiles = service
            .list_available_profiles("acct-a")
            .await
            .expect("profiles");

        let enabled = |app: ProfileApp| {
            profiles
                .iter()
                .find(|profile| profile.app_id == app)
                .map(|profile| profile.enabled)
        };
        assert_eq!(enabled(ProfileApp::MyLaw), Some(true), "MyLaw is always on");
        assert_eq!(enabled(ProfileApp::Radar), Some(true));
        assert_eq!(enabled(ProfileApp::Scholar), Some(false));
        assert_eq!(enabled(ProfileApp::Settings), Some(false));
    }

    #[tokio::test]
    async fn scholar_profile_without_grant_is_forbidden_before_any_fetch() {
        let mut directory = MockGrantsDirectory::new();
        directory
            .expect_account_grants()
            .times(1)
            .returning(|_| Ok(vec![grant_with_product(Some("radar-prod"))]));
        directory.expect_user_profile().times(0);
        let service = service(directory);

        let error = service
            .profile("u1", "acct-a", ProfileApp::Scholar)
            .await
            .expect_err("gate rejects");
        assert_eq!(error.code(), ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn mylaw_profile_needs_no_entitlement_lookup() {
        let mut directory = MockGrantsDirectory::new();
        directory.expect_account_grants().times(0);
        directory
            .expect_user_profile()
            .times(1)
            .returning(|_, _| {
                Ok(json!({
                    "newsDigest": true,
                    "favoriteTopics": ["antitrust"],
                    "alertFrequency": "daily",
                    "emailNotifications": false
                }))
            });
        let service = service(directory);

        let document = service
            .profile("u1", "acct-a", ProfileApp::MyLaw)
            .await
            .expect("profile decodes");
        assert_eq!(document.app(), ProfileApp::MyLaw);
    }

    #[tokio::test]
    async fn malformed_profile_response_is_a_validation_failure() {
        let mut directory = MockGrantsDirectory::new();
        directory
            .expect_account_grants()
            .returning(|_| Ok(vec![grant_with_product(Some("radar-prod"))]));
        directory
            .expect_user_profile()
            .returning(|_, _| Ok(json!({ "notifications": "yes" })));
        let service = service(directory);

        let error = service
            .profile("u1", "acct-a", ProfileApp::Radar)
            .await
            .expect_err("schema rejects");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn update_rejects_invalid_payload_before_writing() {
        let mut directory = MockGrantsDirectory::new();
        directory
            .expect_account_grants()
            .returning(|_| Ok(vec![grant_with_product(Some("radar-prod"))]));
        directory.expect_update_user_profile().times(0);
        let service = service(directory);

        let error = service
            .update_profile("u1", "acct-a", ProfileApp::Radar, json!({ "teamView": 3 }))
            .await
            .expect_err("invalid payload rejected");
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn update_writes_validated_document() {
        let mut directory = MockGrantsDirectory::new();
        directory
            .expect_account_grants()
            .returning(|_| Ok(vec![grant_with_product(Some("radar-prod"))]));
        directory
            .expect_update_user_profile()
            .times(1)
            .withf(|user_id, app, wire| {
                user_id == "u1"
                    && *app == ProfileApp::Radar
                    && wire["accessLevel"] == "viewer"
            })
            .returning(|_, _, _| Ok(()));
        let service = service(directory);

        let document = service
            .update_profile("u1", "acct-a", ProfileApp::Radar, radar_payload())
            .await
            .expect("update succeeds");
        assert_eq!(document.app(), ProfileApp::Radar);
    }

    #[tokio::test]
    async fn grant_product_defaults_the_entitlement_type() {
        let mut directory = MockGrantsDirectory::new();
        directory
            .expect_create_grant()
            .times(1)
            .withf(|account_id, request| {
                account_id == "acct-a"
                    && request.user_id == "u1"
                    && request.product_id == "radar-prod"
                    && request.entitlement_type == DEFAULT_ENTITLEMENT_TYPE
            })
            .returning(|_, _| Ok(grant_with_product(Some("radar-prod"))));
        let service = service(directory);

        let grant = service
            .grant_product(GrantProductRequest {
                account_id: "acct-a".to_owned(),
                user_id: "u1".to_owned(),
                product_id: "radar-prod".to_owned(),
                entitlement_type: None,
            })
            .await
            .expect("grant created");
        assert_eq!(grant.product_id.as_deref(), Some("radar-prod"));
    }

    #[tokio::test]
    async fn remove_product_maps_missing_grants_to_not_found() {
        let mut directory = MockGrantsDirectory::new();
        directory
            .expect_delete_grant()
            .returning(|_, _| Err(GrantsDirectoryError::status(404, "no such grant")));
        let service = service(directory);

        let error = service
            .remove_product("acct-a", "g-missing")
            .await
            .expect_err("missing grant");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn upstream_outage_surfaces_as_service_unavailable() {
        let mut directory = MockGrantsDirectory::new();
        directory
            .expect_account_grants()
            .returning(|_| Err(GrantsDirectoryError::timeout("deadline exceeded")));
        let service = service(directory);

        let error = service
            .list_available_profiles("acct-a")
            .await
            .expect_err("outage propagates");
        assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    }
}
