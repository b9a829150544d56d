//! Domain ports and supporting types for the hexagonal boundary.

mod analytics_query;
mod entitlement_command;
mod grants_directory;

pub use analytics_query::{
    AnalyticsQuery, DEFAULT_GROWTH_WINDOW_DAYS, DEFAULT_TOP_ACCOUNTS_LIMIT,
};
#[cfg(test)]
pub use analytics_query::MockAnalyticsQuery;
pub use entitlement_command::{
    DEFAULT_ENTITLEMENT_TYPE, EntitlementCommand, GrantProductRequest,
};
#[cfg(test)]
pub use entitlement_command::MockEntitlementCommand;
pub use grants_directory::{
    CreateGrantRequest, FixtureGrantsDirectory, GrantsDirectory, GrantsDirectoryError,
};
#[cfg(test)]
pub use grants_directory::MockGrantsDirectory;
