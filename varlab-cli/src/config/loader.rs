use super::types::{
    DEFAULT_HOST, DEFAULT_PORT, RawPlanningConfig, RawServerConfig, RawStorageConfig,
    RawVarlabConfig, ServerConfig, StorageConfig, VarlabConfig,
};
use anyhow::Result;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use varlab_core::PlanningConfig;

/// Database file name inside the platform data directory
const DATABASE_FILE: &str = "events.db";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<VarlabConfig> {
        let mut raw = RawVarlabConfig::default();

        // Layer 1: User config
        if let Some(user_path) = Self::user_config_path()
            && user_path.exists()
        {
            raw = Self::merge_raw(raw, Self::read_raw(&user_path)?);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&project_path)?);
        }

        Ok(Self::finalize(raw))
    }

    fn read_raw(path: &Path) -> Result<RawVarlabConfig> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "varlab")
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with VARLAB_PROJECT_CONFIG_DIR env var (useful for isolated tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("VARLAB_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".varlab/config.toml")
        }
    }

    /// Local database file: the configured path, else the platform data dir
    pub fn database_path(storage: &StorageConfig) -> PathBuf {
        if let Some(path) = &storage.path {
            return path.clone();
        }
        Self::project_dirs()
            .map(|dirs| dirs.data_dir().join(DATABASE_FILE))
            .unwrap_or_else(|| PathBuf::from(DATABASE_FILE))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawVarlabConfig, overlay: RawVarlabConfig) -> RawVarlabConfig {
        RawVarlabConfig {
            server: RawServerConfig {
                host: overlay.server.host.or(base.server.host),
                port: overlay.server.port.or(base.server.port),
            },
            storage: RawStorageConfig {
                path: overlay.storage.path.or(base.storage.path),
                url: overlay.storage.url.or(base.storage.url),
                auth_token: overlay.storage.auth_token.or(base.storage.auth_token),
            },
            planning: RawPlanningConfig {
                minimum_detectable_effect: overlay
                    .planning
                    .minimum_detectable_effect
                    .or(base.planning.minimum_detectable_effect),
                power: overlay.planning.power.or(base.planning.power),
                default_confidence: overlay
                    .planning
                    .default_confidence
                    .or(base.planning.default_confidence),
            },
            catalog: overlay.catalog.or(base.catalog),
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawVarlabConfig) -> VarlabConfig {
        let planning_defaults = PlanningConfig::default();
        VarlabConfig {
            server: ServerConfig {
                host: raw.server.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: raw.server.port.unwrap_or(DEFAULT_PORT),
            },
            storage: StorageConfig {
                path: raw.storage.path,
                url: raw.storage.url,
                auth_token: raw.storage.auth_token,
            },
            planning: PlanningConfig {
                minimum_detectable_effect: raw
                    .planning
                    .minimum_detectable_effect
                    .unwrap_or(planning_defaults.minimum_detectable_effect),
                power: raw.planning.power.unwrap_or(planning_defaults.power),
                default_confidence: raw
                    .planning
                    .default_confidence
                    .unwrap_or(planning_defaults.default_confidence),
            },
            catalog: raw.catalog.unwrap_or_default(),
        }
    }

    /// Load config from a specific path (for testing)
    #[cfg(test)]
    pub fn load_from_path(path: &Path) -> Result<VarlabConfig> {
        if path.exists() {
            Ok(Self::finalize(Self::read_raw(path)?))
        } else {
            Ok(VarlabConfig::default())
        }
    }
}
