//! Dashboard settings persisted as TOML in the application directory.

mod defaults;
mod errors;
mod io;
mod types;


pub use errors::ConfigError;
pub use io::{config_path, load_from, load_or_default, save, save_to_path};
pub use types::{
    ClassificationOptions, DashboardSettings, PageOptions, RemoteOptions, SchemeConfig,
    SelectionOptions, SyncOptions,
};
