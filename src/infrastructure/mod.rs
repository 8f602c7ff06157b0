//! Infrastructure Layer - External concerns and implementations
//!
//! Manifest parsers, package registries, the vulnerability database, cache
//! backends and the repository host.

pub mod api_clients;
pub mod cache;
pub mod parsers;
pub mod registries;
pub mod repository_source;

// Re-export specific items to avoid ambiguous glob conflicts
pub use api_clients::{OsvClient, VulnerabilityApiClient};
pub use cache::*;
pub use parsers::{PackageFileParser, ParserFactory};
pub use registries::{LatestVersionInfo, PackageRegistryClient, RegistryTable};
pub use repository_source::*;
