//! Shared types, error model, configuration, and reporting for pdblink.
//!
//! This crate is the foundation depended on by all other pdblink crates.
//! It provides:
//! - [`PdbLinkError`]: the unified error type
//! - Domain types ([`SourceFileRecord`], [`PathPair`], [`DownloadMethod`])
//! - Configuration ([`AppConfig`], [`LinkOptions`], config loading)
//! - The [`Reporter`] sink used by the link pipeline

pub mod config;
pub mod error;
pub mod report;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CustomProviderConfig, DefaultsConfig, LinkOptions, ToolsConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{PdbLinkError, Result};
pub use report::{Reporter, SilentReporter, TracingReporter};
pub use types::{DownloadMethod, PathPair, SourceFileRecord};
