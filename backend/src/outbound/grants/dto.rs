//! DTOs for decoding upstream grants-service JSON responses.
//!
//! The adapter decodes into these transport DTOs first, then maps into
//! domain records in one pass. List endpoints wrap their payload in a
//! `results` envelope.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::domain::{Account, Grant, Product, User};

/// Envelope the upstream wraps list responses in.
#[derive(Debug, Deserialize)]
pub(super) struct ResultsDto<T> {
    #[serde(default = "Vec::new")]
    pub(super) results: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(super) struct AccountDto {
    pub(super) account_id: String,
    #[serde(default)]
    pub(super) name: Option<String>,
}

impl AccountDto {
    pub(super) fn into_domain(self) -> Account {
        Account {
            account_id: self.account_id,
            name: self.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct GrantDto {
    pub(super) grant_id: String,
    pub(super) user_id: String,
    pub(super) account_id: String,
    #[serde(default)]
    pub(super) product_id: Option<String>,
    pub(super) entitlement_type: String,
    pub(super) created_at: DateTime<Utc>,
}

impl GrantDto {
    pub(super) fn into_domain(self) -> Grant {
        Grant {
            grant_id: self.grant_id,
            user_id: self.user_id,
            account_id: self.account_id,
            product_id: self.product_id,
            entitlement_type: self.entitlement_type,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct UserDto {
    pub(super) user_id: String,
    pub(super) email_address: String,
    #[serde(default)]
    pub(super) first_name: Option<String>,
    #[serde(default)]
    pub(super) last_name: Option<String>,
    pub(super) created_at: DateTime<Utc>,
    #[serde(default)]
    pub(super) last_login: Option<String>,
}

impl UserDto {
    /// Map into the domain record.
    ///
    /// `last_login` is decoded leniently: the activity metrics treat an
    /// undecodable timestamp the same as no login, so a malformed value
    /// must never fail the whole user fetch.
    pub(super) fn into_domain(self) -> User {
        let last_login = self.last_login.as_deref().and_then(|raw| {
            match DateTime::parse_from_rfc3339(raw) {
                Ok(parsed) => Some(parsed.with_timezone(&Utc)),
                Err(error) => {
                    warn!(
                        user_id = %self.user_id,
                        %error,
                        "undecodable last_login; treating user as inactive"
                    );
                    None
                }
            }
        });
        User {
            user_id: self.user_id,
            email_address: self.email_address,
            first_name: self.first_name,
            last_name: self.last_name,
            created_at: self.created_at,
            last_login,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ProductDto {
    #[serde(alias = "id")]
    pub(super) product_id: String,
    #[serde(default, alias = "label")]
    pub(super) name: Option<String>,
}

impl ProductDto {
    pub(super) fn into_domain(self) -> Product {
        Product {
            product_id: self.product_id,
            name: self.name,
        }
    }
}
