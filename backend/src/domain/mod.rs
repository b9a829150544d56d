//! Domain entities, ports, and services.
//!
//! Purpose: define the strongly typed core of the entitlement analytics
//! dashboard — entities mirroring the upstream grants service, the ports
//! at the hexagonal boundary, and the services implementing the aggregate
//! queries and entitlement commands. Types are immutable; invariants and
//! serialisation contracts live in each type's Rustdoc.

pub mod analytics_service;
pub mod entitlement_service;
mod error;
mod fanout;
pub mod model;
pub mod ports;
pub mod profile;

pub use self::analytics_service::{AnalyticsService, DEFAULT_FANOUT_LIMIT};
pub use self::entitlement_service::EntitlementService;
pub use self::error::{DomainError, ErrorCode};
pub use self::model::{
    Account, AccountMetrics, CompanyUser, Grant, Product, ProductAdoption, TopAccount, User,
    UserGrowth,
};
