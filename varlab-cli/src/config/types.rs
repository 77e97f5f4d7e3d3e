use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use varlab_core::{CatalogConfig, EngineConfig, PlanningConfig};

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawVarlabConfig {
    #[serde(default)]
    pub server: RawServerConfig,

    #[serde(default)]
    pub storage: RawStorageConfig,

    #[serde(default)]
    pub planning: RawPlanningConfig,

    /// A catalog is replaced as a whole, never merged entry by entry
    #[serde(default)]
    pub catalog: Option<CatalogConfig>,
}

/// Server config as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Storage config as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawStorageConfig {
    /// Local database file
    pub path: Option<PathBuf>,
    /// Remote Turso database URL; takes precedence over `path`
    pub url: Option<String>,
    /// Auth token for the remote database
    pub auth_token: Option<String>,
}

/// Planning defaults as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPlanningConfig {
    pub minimum_detectable_effect: Option<f64>,
    pub power: Option<f64>,
    pub default_confidence: Option<u32>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VarlabConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub planning: PlanningConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl VarlabConfig {
    /// The engine half of the config.
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            planning: self.planning.clone(),
            catalog: self.catalog.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind the HTTP API to
    pub host: String,

    /// Port for the HTTP API
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Local database file; the platform data dir when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing)]
    pub auth_token: Option<String>,
}

/// Default port for the variant-lab server
pub const DEFAULT_PORT: u16 = varlab_server::DEFAULT_PORT;

/// Default host for the variant-lab server
pub const DEFAULT_HOST: &str = "127.0.0.1";
