//! Driving port for company-level aggregate queries.

use async_trait::async_trait;

use crate::domain::{
    AccountMetrics, CompanyUser, DomainError, ProductAdoption, TopAccount, UserGrowth,
};

/// Trailing activity window applied when the caller does not supply one.
pub const DEFAULT_GROWTH_WINDOW_DAYS: u32 = 30;

/// Ranking size applied when the caller does not supply one.
pub const DEFAULT_TOP_ACCOUNTS_LIMIT: usize = 10;

/// Aggregate queries computed across all accounts of a company.
///
/// Every operation is a best-effort snapshot: once the account list is
/// obtainable it returns a well-formed (possibly zero-valued) result, and
/// only a hard upstream outage surfaces as an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyticsQuery: Send + Sync {
    /// Compute the user-growth summary for a company.
    ///
    /// `days` is the trailing activity window, defaulting to
    /// [`DEFAULT_GROWTH_WINDOW_DAYS`].
    async fn user_growth(
        &self,
        company_id: &str,
        days: Option<u32>,
    ) -> Result<UserGrowth, DomainError>;

    /// Count grants per product across all of a company's accounts.
    async fn product_adoption(
        &self,
        company_id: &str,
    ) -> Result<Vec<ProductAdoption>, DomainError>;

    /// Compute account-level rollups for a company.
    async fn account_metrics(&self, company_id: &str) -> Result<AccountMetrics, DomainError>;

    /// Rank a bounded prefix of a company's accounts by unique-user count.
    ///
    /// The limit bounds the account list before any per-account work, not
    /// the ranked output; defaults to [`DEFAULT_TOP_ACCOUNTS_LIMIT`].
    async fn top_accounts(
        &self,
        company_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<TopAccount>, DomainError>;

    /// List every successfully fetched user across a company's accounts,
    /// one row per account context the user appears in.
    async fn company_users(&self, company_id: &str) -> Result<Vec<CompanyUser>, DomainError>;
}
