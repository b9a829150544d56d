//! Domain entities and derived metric aggregates.
//!
//! Entities mirror the upstream grants service's records; aggregates are
//! pure functions of the entity sets fetched for one company at one point
//! in time. Nothing here is persisted — every aggregate is recomputed on
//! each query and serialised straight to the consuming dashboard.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Billing/organisational unit under a company.
///
/// Company membership is established solely by the upstream's
/// `company_id` filter; the core does not validate membership itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    /// Upstream account identifier.
    pub account_id: String,
    /// Optional display name; rankings fall back to the identifier.
    pub name: Option<String>,
}

/// Entitlement record linking a user, an account, and optionally a product.
///
/// Grants are the only linkage between users and products; a user may hold
/// zero or more grants per account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Grant {
    /// Upstream grant identifier.
    pub grant_id: String,
    /// User the entitlement belongs to.
    pub user_id: String,
    /// Account the entitlement is held under.
    pub account_id: String,
    /// Product the grant entitles, absent for bare account membership.
    pub product_id: Option<String>,
    /// Upstream entitlement category, e.g. `subscription`.
    pub entitlement_type: String,
    /// When the grant was created upstream.
    pub created_at: DateTime<Utc>,
}

/// Identity record fetched independently per discovered `user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Upstream user identifier.
    pub user_id: String,
    /// Primary e-mail address.
    pub email_address: String,
    /// Optional given name.
    pub first_name: Option<String>,
    /// Optional family name.
    pub last_name: Option<String>,
    /// When the user record was created upstream.
    pub created_at: DateTime<Utc>,
    /// Most recent login, when the upstream reports one. Absent or
    /// undecodable values count the user as inactive.
    pub last_login: Option<DateTime<Utc>>,
}

/// Product listed by the upstream catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    /// Upstream product identifier, e.g. `radar-prod`.
    pub product_id: String,
    /// Optional display name supplied by the catalogue.
    pub name: Option<String>,
}

/// User-growth summary for one company.
///
/// `total_users` derives from grant-discovered user ids and does not depend
/// on per-user fetch success; `active_users` counts only successfully
/// fetched users whose `last_login` falls within the trailing window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGrowth {
    /// Unique users discovered across all reachable accounts.
    pub total_users: u64,
    /// Users with a `last_login` inside the trailing window.
    pub active_users: u64,
    /// Always zero: the upstream exposes no signup feed, so new-user counts
    /// await an external data source.
    pub new_users: u64,
    /// `round(active / total × 100)`; zero when no users were discovered.
    pub growth_rate: u32,
}

/// Grant count for one product observed across a company's accounts.
///
/// Percentages are deliberately left to the caller so they are always
/// computed against the entry set actually displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAdoption {
    /// Upstream product identifier.
    pub product_id: String,
    /// Display name derived from the product identifier.
    pub name: String,
    /// Number of grants referencing this product.
    pub grant_count: u64,
}

/// Account-level rollup for one company.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMetrics {
    /// Length of the upstream account list.
    pub total_accounts: u64,
    /// Accounts with at least one successfully fetched grant.
    pub active_accounts: u64,
    /// `round(total_grants / total_accounts)`; zero when no accounts.
    pub average_grants_per_account: u64,
    /// Grants summed across all reachable accounts.
    pub total_grants: u64,
}

/// One row of the top-accounts ranking.
///
/// Accounts whose grant fetch failed stay in the ranking with zero counts
/// rather than disappearing from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopAccount {
    /// Upstream account identifier.
    pub account_id: String,
    /// Display name, falling back to the identifier.
    pub name: String,
    /// Unique users holding grants under this account.
    pub user_count: u64,
    /// Total grants under this account.
    pub grant_count: u64,
}

/// A company user row: one successfully fetched user in its account context.
///
/// A user granted under several accounts produces one row per account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyUser {
    /// Account the user was discovered under.
    pub account_id: String,
    /// The fetched identity record.
    #[serde(flatten)]
    pub user: User,
}

/// Derive a display name from an upstream product identifier.
///
/// Mirrors the dashboard convention: strip the `-prod` suffix and
/// capitalise the first character, so `radar-prod` becomes `Radar`.
#[must_use]
pub fn product_display_name(product_id: &str) -> String {
    let stem = product_id.strip_suffix("-prod").unwrap_or(product_id);
    let mut chars = stem.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("radar-prod", "Radar")]
    #[case("scholar-prod", "Scholar")]
    #[case("newsvault-prod", "Newsvault")]
    #[case("bare", "Bare")]
    #[case("", "")]
    fn product_display_names(#[case] product_id: &str, #[case] expected: &str) {
        assert_eq!(product_display_name(product_id), expected);
    }

    #[test]
    fn user_growth_serialises_camel_case() {
        let growth = UserGrowth {
            total_users: 2,
            active_users: 1,
            new_users: 0,
            growth_rate: 50,
        };
        let json = serde_json::to_value(growth).expect("serialises");
        assert_eq!(json["totalUsers"], 2);
        assert_eq!(json["growthRate"], 50);
    }
}
