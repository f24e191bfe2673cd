//! Library exports for the binary, benchmarks and tests.
/// Application directory layout.
pub mod app_dirs;
/// TOML settings.
pub mod config;
/// Caching, synchronization, classification and paging of dashboard data.
pub mod dashboard;
pub(crate) mod http_client;
/// Tracing setup.
pub mod logging;
/// Campaign and interest records.
pub mod model;
/// Remote collaborators and token storage.
pub mod remote;
/// Capacity-bounded selection sets.
pub mod selection;
