//! Application configuration for pdblink.
//!
//! User config lives at `~/.pdblink/pdblink.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PdbLinkError, Result};
use crate::types::DownloadMethod;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "pdblink.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".pdblink";

// ---------------------------------------------------------------------------
// Config structs (matching pdblink.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// External tool locations.
    #[serde(default)]
    pub tools: ToolsConfig,

    /// User-defined hosting providers, tried before the built-in ones.
    #[serde(default)]
    pub providers: Vec<CustomProviderConfig>,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// How the debugger downloads source files.
    #[serde(default)]
    pub download_method: DownloadMethod,

    /// Skip the checksum verification pass.
    #[serde(default)]
    pub skip_verify: bool,
}

/// `[tools]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Stream-injection tool used to embed the index into the symbol file.
    #[serde(default = "default_pdbstr")]
    pub pdbstr: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            pdbstr: default_pdbstr(),
        }
    }
}

fn default_pdbstr() -> String {
    "pdbstr.exe".into()
}

/// `[[providers]]` entry: a self-hosted or otherwise unknown hosting service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomProviderConfig {
    /// Human-readable name.
    pub name: String,
    /// Regex matched against remote URLs; named captures feed `raw_url`.
    pub pattern: String,
    /// Raw-content URL, optionally with `{revision}` and `{filename}` placeholders.
    pub raw_url: String,
}

// ---------------------------------------------------------------------------
// Link options (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime options for one link operation.
#[derive(Debug, Clone, Default)]
pub struct LinkOptions {
    /// Debug-symbol file to index.
    pub symbol_path: PathBuf,
    /// Explicit working directory of the checkout.
    pub working_dir: Option<PathBuf>,
    /// Explicit revision, bypassing HEAD lookup.
    pub revision: Option<String>,
    /// Explicit remote URL, bypassing remote enumeration.
    pub remote_url: Option<String>,
    pub skip_verify: bool,
    pub download_method: DownloadMethod,
    /// Write the side-car index but do not embed it.
    pub index_only: bool,
}

impl LinkOptions {
    /// Options for `symbol_path` seeded from the config file's defaults.
    pub fn from_config(config: &AppConfig, symbol_path: impl Into<PathBuf>) -> Self {
        Self {
            symbol_path: symbol_path.into(),
            skip_verify: config.defaults.skip_verify,
            download_method: config.defaults.download_method,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.pdblink/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PdbLinkError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.pdblink/pdblink.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PdbLinkError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| PdbLinkError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PdbLinkError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PdbLinkError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PdbLinkError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
