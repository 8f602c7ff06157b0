//! Depsight - dependency health analysis for GitHub repositories
//!
//! Finds the dependency manifests of a repository, checks every declared
//! dependency against its package registry and the OSV vulnerability
//! database, and reduces the results into a risk report served over HTTP.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod presentation;

pub use config::Config;
pub use logging::init_tracing;
