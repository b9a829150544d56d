//! Signed HTTP adapter for the upstream grants service.
//!
//! Every request carries an HMAC-SHA-256 signature over the canonical
//! string `METHOD\nPATH\nTIMESTAMP\nBODY`. The body is serialised once;
//! the exact bytes that were signed are the bytes that are transmitted.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::SecondsFormat;
use hmac::Mac;
use mockable::Clock;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Method, header};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::dto::{AccountDto, GrantDto, ProductDto, ResultsDto, UserDto};
use super::signer::{self, HmacSha256};
use crate::config::UpstreamConfig;
use crate::domain::ports::{CreateGrantRequest, GrantsDirectory, GrantsDirectoryError};
use crate::domain::profile::ProfileApp;
use crate::domain::{Account, Grant, Product, User};

/// Characters percent-encoded inside path segments and query values.
///
/// Everything outside the RFC 3986 unreserved set is encoded, so
/// identifiers containing `/`, spaces, or `?` cannot alter the request
/// path and therefore cannot alter the signed canonical string.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const PRODUCTS_PATH: &str = "/v3/products";

/// Errors raised while constructing [`HttpGrantsDirectory`].
#[derive(Debug, Error)]
pub enum HttpDirectoryBuildError {
    /// The underlying HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    /// The signing secret was rejected by the HMAC implementation.
    #[error("signing secret rejected: {0}")]
    Key(#[from] hmac::digest::InvalidLength),
}

/// [`GrantsDirectory`] implementation backed by signed HTTP requests.
///
/// The keyed MAC is derived once from the shared secret at construction
/// and cloned per request, so the secret itself is only handled here.
pub struct HttpGrantsDirectory {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    mac: HmacSha256,
    clock: Arc<dyn Clock>,
}

impl HttpGrantsDirectory {
    /// Build an adapter from connection settings and a clock.
    ///
    /// # Errors
    ///
    /// Returns [`HttpDirectoryBuildError`] when the HTTP client cannot be
    /// constructed or the secret cannot key the MAC.
    pub fn new(
        config: &UpstreamConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, HttpDirectoryBuildError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let mac = HmacSha256::new_from_slice(config.secret.expose().as_bytes())?;
        Ok(Self {
            client,
            base_url: config.base_url.as_str().trim_end_matches('/').to_owned(),
            key_id: config.key_id.clone(),
            mac,
            clock,
        })
    }

    /// Build one signed request.
    ///
    /// `path` is the path-and-query string relative to the base URL; it is
    /// signed exactly as sent. A `None` body signs over zero body bytes.
    /// Every request carries the content-type header; only the body itself
    /// is conditional.
    fn signed_request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Request, GrantsDirectoryError> {
        let payload = match body {
            Some(value) => serde_json::to_vec(value)
                .map_err(|error| GrantsDirectoryError::encode(error.to_string()))?,
            None => Vec::new(),
        };
        let timestamp = self
            .clock
            .utc()
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        let signature = signer::sign(&self.mac, method.as_str(), path, &timestamp, &payload);
        let mut builder = self
            .client
            .request(method, format!("{}{path}", self.base_url))
            .header(
                header::AUTHORIZATION,
                signer::authorization_value(&self.key_id, &signature),
            )
            .header(signer::TIMESTAMP_HEADER, timestamp.as_str())
            .header(header::CONTENT_TYPE, "application/json");
        if body.is_some() {
            builder = builder.body(payload);
        }
        builder
            .build()
            .map_err(|error| GrantsDirectoryError::transport(error.to_string()))
    }

    /// Sign and dispatch one request, returning the raw response.
    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, GrantsDirectoryError> {
        let request = self.signed_request(method, path, body)?;
        debug!(method = %request.method(), path, "dispatching signed upstream request");
        let response = self.client.execute(request).await.map_err(map_send_error)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GrantsDirectoryError::status(status.as_u16(), text));
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GrantsDirectoryError> {
        let response = self.call(Method::GET, path, None).await?;
        response
            .json()
            .await
            .map_err(|error| GrantsDirectoryError::decode(error.to_string()))
    }
}

fn map_send_error(error: reqwest::Error) -> GrantsDirectoryError {
    if error.is_timeout() {
        GrantsDirectoryError::timeout(error.to_string())
    } else {
        GrantsDirectoryError::transport(error.to_string())
    }
}

fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT).to_string()
}

fn accounts_path(company_id: &str) -> String {
    format!("/v4/accounts?company_id={}", encode_component(company_id))
}

fn account_grants_path(account_id: &str) -> String {
    format!("/v3/accounts/{}/grants", encode_component(account_id))
}

fn grant_path(account_id: &str, grant_id: &str) -> String {
    format!(
        "/v3/accounts/{}/grants/{}",
        encode_component(account_id),
        encode_component(grant_id)
    )
}

fn user_path(user_id: &str) -> String {
    format!("/v3/users/{}", encode_component(user_id))
}

fn profile_path(user_id: &str, app: ProfileApp) -> String {
    format!(
        "/v3/users/{}/profile/{}",
        encode_component(user_id),
        app.app_id()
    )
}

#[async_trait]
impl GrantsDirectory for HttpGrantsDirectory {
    async fn accounts_by_company(
        &self,
        company_id: &str,
    ) -> Result<Vec<Account>, GrantsDirectoryError> {
        let envelope: ResultsDto<AccountDto> = self.get_json(&accounts_path(company_id)).await?;
        Ok(envelope
            .results
            .into_iter()
            .map(AccountDto::into_domain)
            .collect())
    }

    async fn account_grants(&self, account_id: &str) -> Result<Vec<Grant>, GrantsDirectoryError> {
        let envelope: ResultsDto<GrantDto> = self.get_json(&account_grants_path(account_id)).await?;
        Ok(envelope
            .results
            .into_iter()
            .map(GrantDto::into_domain)
            .collect())
    }

    async fn user(&self, user_id: &str) -> Result<User, GrantsDirectoryError> {
        let user: UserDto = self.get_json(&user_path(user_id)).await?;
        Ok(user.into_domain())
    }

    async fn create_grant(
        &self,
        account_id: &str,
        request: &CreateGrantRequest,
    ) -> Result<Grant, GrantsDirectoryError> {
        let body = serde_json::to_value(request)
            .map_err(|error| GrantsDirectoryError::encode(error.to_string()))?;
        let response = self
            .call(Method::POST, &account_grants_path(account_id), Some(&body))
            .await?;
        let grant: GrantDto = response
            .json()
            .await
            .map_err(|error| GrantsDirectoryError::decode(error.to_string()))?;
        Ok(grant.into_domain())
    }

    async fn delete_grant(
        &self,
        account_id: &str,
        grant_id: &str,
    ) -> Result<(), GrantsDirectoryError> {
        self.call(Method::DELETE, &grant_path(account_id, grant_id), None)
            .await?;
        Ok(())
    }

    async fn user_profile(
        &self,
        user_id: &str,
        app: ProfileApp,
    ) -> Result<Value, GrantsDirectoryError> {
        self.get_json(&profile_path(user_id, app)).await
    }

    async fn update_user_profile(
        &self,
        user_id: &str,
        app: ProfileApp,
        profile: &Value,
    ) -> Result<(), GrantsDirectoryError> {
        self.call(Method::PATCH, &profile_path(user_id, app), Some(profile))
            .await?;
        Ok(())
    }

    async fn products(&self) -> Result<Vec<Product>, GrantsDirectoryError> {
        let envelope: ResultsDto<ProductDto> = self.get_json(PRODUCTS_PATH).await?;
        Ok(envelope
            .results
            .into_iter()
            .map(ProductDto::into_domain)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{DateTime, Local, TimeZone, Utc};
    use mockable::DefaultClock;
    use rstest::rstest;
    use serde_json::json;
    use url::Url;

    use super::*;
    use crate::config::SigningSecret;

    struct FixtureClock;

    impl Clock for FixtureClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
                .single()
                .expect("valid timestamp")
        }
    }

    fn config(base_url: &str) -> UpstreamConfig {
        UpstreamConfig {
            base_url: Url::parse(base_url).expect("test URL parses"),
            key_id: "key-1".into(),
            secret: SigningSecret::new("shared-secret"),
            company_id: "company-1".into(),
            timeout: Duration::from_secs(5),
            fanout_limit: 4,
        }
    }

    #[rstest]
    #[case::with_trailing_slash("https://grants.example.com/")]
    #[case::without_trailing_slash("https://grants.example.com")]
    fn base_url_is_normalised_without_trailing_slash(#[case] base_url: &str) {
        let directory = HttpGrantsDirectory::new(&config(base_url), Arc::new(DefaultClock))
            .expect("adapter builds");
        assert_eq!(directory.base_url, "https://grants.example.com");
    }

    fn directory() -> HttpGrantsDirectory {
        HttpGrantsDirectory::new(&config("https://grants.example.com"), Arc::new(FixtureClock))
            .expect("adapter builds")
    }

    #[test]
    fn bodyless_requests_carry_auth_timestamp_and_content_type() {
        let request = directory()
            .signed_request(Method::GET, "/v3/products", None)
            .expect("request builds");

        assert_eq!(request.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(
            request.headers()[signer::TIMESTAMP_HEADER],
            "2024-05-01T12:00:00.000Z"
        );
        let authorization = request.headers()[header::AUTHORIZATION]
            .to_str()
            .expect("ascii header");
        let (scheme, credentials) = authorization
            .split_once(' ')
            .expect("scheme and credentials");
        assert_eq!(scheme, signer::AUTH_SCHEME);
        let (key_id, signature) = credentials.split_once(':').expect("key id and signature");
        assert_eq!(key_id, "key-1");
        assert_eq!(signature.len(), 64, "hex-encoded SHA-256 output");
        assert!(request.body().is_none());
    }

    #[test]
    fn transmitted_body_bytes_are_the_bytes_signed() {
        let payload = json!({ "user_id": "u1", "product_id": "radar-prod" });
        let request = directory()
            .signed_request(
                Method::POST,
                "/v3/accounts/acct-a/grants",
                Some(&payload),
            )
            .expect("request builds");

        assert_eq!(
            request.url().as_str(),
            "https://grants.example.com/v3/accounts/acct-a/grants"
        );
        let bytes = request
            .body()
            .and_then(reqwest::Body::as_bytes)
            .expect("buffered body");
        assert_eq!(bytes, serde_json::to_vec(&payload).expect("serialises"));
    }

    #[test]
    fn accounts_path_encodes_the_company_query_value() {
        assert_eq!(
            accounts_path("acme & co"),
            "/v4/accounts?company_id=acme%20%26%20co"
        );
    }

    #[rstest]
    #[case::plain("u-1", "/v3/users/u-1")]
    #[case::slash("u/1", "/v3/users/u%2F1")]
    #[case::query_chars("u?x=1", "/v3/users/u%3Fx%3D1")]
    fn user_path_encodes_identifier_segments(#[case] user_id: &str, #[case] expected: &str) {
        assert_eq!(user_path(user_id), expected);
    }

    #[test]
    fn grant_path_addresses_the_grant_under_its_account() {
        assert_eq!(
            grant_path("acct-a", "grant 1"),
            "/v3/accounts/acct-a/grants/grant%201"
        );
    }

    #[test]
    fn profile_path_uses_the_application_identifier() {
        assert_eq!(
            profile_path("u-1", ProfileApp::Radar),
            "/v3/users/u-1/profile/RadarProfile"
        );
    }
}
