//! Outbound adapter for the upstream grants service.

mod dto;
mod http_directory;
mod signer;

pub use http_directory::{HttpDirectoryBuildError, HttpGrantsDirectory};
