//! Company-level aggregation engine.
//!
//! Implements [`AnalyticsQuery`] over the grants-directory port with one
//! shared algorithm: fetch the account list (its failure is fatal — there
//! is no fallback account source), fan grant fetches out concurrently,
//! optionally fan user fetches out for metrics needing per-user detail,
//! then reduce sequentially. Per-account and per-user failures are logged
//! and excluded; they never abort siblings and are never retried.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use mockable::Clock;
use tracing::warn;

use crate::domain::fanout::map_concurrently;
use crate::domain::ports::{
    AnalyticsQuery, DEFAULT_GROWTH_WINDOW_DAYS, DEFAULT_TOP_ACCOUNTS_LIMIT, GrantsDirectory,
    GrantsDirectoryError,
};
use crate::domain::{
    Account, AccountMetrics, CompanyUser, DomainError, Grant, ProductAdoption, TopAccount,
    UserGrowth, model::product_display_name,
};

/// In-flight upstream calls per fan-out stage unless configured otherwise.
pub const DEFAULT_FANOUT_LIMIT: usize = 8;

/// Aggregation service over a grants directory.
#[derive(Clone)]
pub struct AnalyticsService<D> {
    directory: Arc<D>,
    clock: Arc<dyn Clock>,
    fanout_limit: usize,
}

impl<D> AnalyticsService<D> {
    /// Create a service with the default fan-out bound.
    pub fn new(directory: Arc<D>, clock: Arc<dyn Clock>) -> Self {
        Self {
            directory,
            clock,
            fanout_limit: DEFAULT_FANOUT_LIMIT,
        }
    }

    /// Override the per-stage fan-out bound. Zero is clamped to one.
    #[must_use]
    pub fn with_fanout_limit(mut self, limit: usize) -> Self {
        self.fanout_limit = limit.max(1);
        self
    }
}

impl<D> AnalyticsService<D>
where
    D: GrantsDirectory,
{
    async fn company_accounts(&self, company_id: &str) -> Result<Vec<Account>, DomainError> {
        self.directory
            .accounts_by_company(company_id)
            .await
            .map_err(|error| map_account_list_error(company_id, &error))
    }

    /// Fetch grants for every account concurrently; an unreachable account
    /// contributes an empty grant list, identical to an account with none.
    async fn grants_by_account(&self, accounts: Vec<Account>) -> Vec<(Account, Vec<Grant>)> {
        map_concurrently(accounts, self.fanout_limit, |account| {
            let directory = Arc::clone(&self.directory);
            async move {
                let grants = match directory.account_grants(&account.account_id).await {
                    Ok(grants) => grants,
                    Err(error) => {
                        warn!(
                            account_id = %account.account_id,
                            %error,
                            "account grants unavailable; contributing zero grants"
                        );
                        Vec::new()
                    }
                };
                (account, grants)
            }
        })
        .await
    }

    /// Fetch user records concurrently; an unreachable user is skipped.
    async fn fetch_users(&self, user_ids: Vec<String>) -> Vec<crate::domain::User> {
        let fetched = map_concurrently(user_ids, self.fanout_limit, |user_id| {
            let directory = Arc::clone(&self.directory);
            async move {
                match directory.user(&user_id).await {
                    Ok(user) => Some(user),
                    Err(error) => {
                        warn!(%user_id, %error, "user record unavailable; excluded");
                        None
                    }
                }
            }
        })
        .await;
        fetched.into_iter().flatten().collect()
    }
}

#[async_trait]
impl<D> AnalyticsQuery for AnalyticsService<D>
where
    D: GrantsDirectory,
{
    async fn user_growth(
        &self,
        company_id: &str,
        days: Option<u32>,
    ) -> Result<UserGrowth, DomainError> {
        let days = days.unwrap_or(DEFAULT_GROWTH_WINDOW_DAYS);
        let accounts = self.company_accounts(company_id).await?;
        if accounts.is_empty() {
            return Ok(UserGrowth::default());
        }

        let fetched = self.grants_by_account(accounts).await;
        let mut user_ids = BTreeSet::new();
        for (_, grants) in &fetched {
            for grant in grants {
                user_ids.insert(grant.user_id.clone());
            }
        }

        // The denominator comes from grant-derived ids: a user whose record
        // cannot be fetched still counts towards the total, only the
        // activity numerator excludes them.
        let total_users = user_ids.len() as u64;
        let users = self.fetch_users(user_ids.into_iter().collect()).await;
        let cutoff = self.clock.utc() - Duration::days(i64::from(days));
        let active_users = users
            .iter()
            .filter(|user| user.last_login.is_some_and(|at| at >= cutoff))
            .count() as u64;

        Ok(UserGrowth {
            total_users,
            active_users,
            new_users: 0,
            growth_rate: rounded_percentage(active_users, total_users),
        })
    }

    async fn product_adoption(
        &self,
        company_id: &str,
    ) -> Result<Vec<ProductAdoption>, DomainError> {
        let accounts = self.company_accounts(company_id).await?;
        let fetched = self.grants_by_account(accounts).await;

        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for (_, grants) in fetched {
            for grant in grants {
                if let Some(product_id) = grant.product_id {
                    *counts.entry(product_id).or_default() += 1;
                }
            }
        }

        Ok(counts
            .into_iter()
            .map(|(product_id, grant_count)| ProductAdoption {
                name: product_display_name(&product_id),
                product_id,
                grant_count,
            })
            .collect())
    }

    async fn account_metrics(&self, company_id: &str) -> Result<AccountMetrics, DomainError> {
        let accounts = self.company_accounts(company_id).await?;
        let total_accounts = accounts.len() as u64;
        if accounts.is_empty() {
            return Ok(AccountMetrics::default());
        }

        let fetched = self.grants_by_account(accounts).await;
        let active_accounts = fetched.iter().filter(|(_, grants)| !grants.is_empty()).count() as u64;
        let total_grants: u64 = fetched.iter().map(|(_, grants)| grants.len() as u64).sum();

        Ok(AccountMetrics {
            total_accounts,
            active_accounts,
            average_grants_per_account: rounded_average(total_grants, total_accounts),
            total_grants,
        })
    }

    async fn top_accounts(
        &self,
        company_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<TopAccount>, DomainError> {
        let limit = limit.unwrap_or(DEFAULT_TOP_ACCOUNTS_LIMIT);
        let mut accounts = self.company_accounts(company_id).await?;
        // The bound applies to the account list, not the ranked output:
        // only the first `limit` accounts are ever fetched and ranked.
        accounts.truncate(limit);

        let fetched = self.grants_by_account(accounts).await;
        let mut rows: Vec<TopAccount> = fetched
            .into_iter()
            .map(|(account, grants)| {
                let user_count = grants
                    .iter()
                    .map(|grant| grant.user_id.as_str())
                    .collect::<BTreeSet<_>>()
                    .len() as u64;
                TopAccount {
                    name: account
                        .name
                        .clone()
                        .unwrap_or_else(|| account.account_id.clone()),
                    account_id: account.account_id,
                    user_count,
                    grant_count: grants.len() as u64,
                }
            })
            .collect();

        // Stable sort keeps account-list order for equal user counts.
        rows.sort_by(|a, b| b.user_count.cmp(&a.user_count));
        Ok(rows)
    }

    async fn company_users(&self, company_id: &str) -> Result<Vec<CompanyUser>, DomainError> {
        let accounts = self.company_accounts(company_id).await?;
        if accounts.is_empty() {
            return Ok(Vec::new());
        }

        let fetched = self.grants_by_account(accounts).await;
        let mut pairs = Vec::new();
        for (account, grants) in fetched {
            let mut seen = HashSet::new();
            for grant in grants {
                if seen.insert(grant.user_id.clone()) {
                    pairs.push((account.account_id.clone(), grant.user_id));
                }
            }
        }

        let rows = map_concurrently(pairs, self.fanout_limit, |(account_id, user_id)| {
            let directory = Arc::clone(&self.directory);
            async move {
                match directory.user(&user_id).await {
                    Ok(user) => Some(CompanyUser { account_id, user }),
                    Err(error) => {
                        warn!(%user_id, %error, "user record unavailable; excluded");
                        None
                    }
                }
            }
        })
        .await;

        Ok(rows.into_iter().flatten().collect())
    }
}

fn map_account_list_error(company_id: &str, error: &GrantsDirectoryError) -> DomainError {
    DomainError::service_unavailable(format!(
        "account list unavailable for company {company_id}: {error}"
    ))
}

fn rounded_percentage(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

fn rounded_average(total: u64, count: u64) -> u64 {
    if count == 0 {
        return 0;
    }
    (total as f64 / count as f64).round() as u64
}
