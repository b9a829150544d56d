//! Upstream-integration core for the entitlement analytics dashboard.
//!
//! The crate is organised hexagonally: [`domain`] holds the entities, ports,
//! and the aggregation/entitlement services; [`outbound`] holds the signed
//! HTTP adapter implementing the grants-directory port against the upstream
//! grants service. Inbound transports (RPC routers, dashboards, charts) are
//! consumers of the driving ports and live outside this crate.

pub mod config;
pub mod domain;
pub mod outbound;
