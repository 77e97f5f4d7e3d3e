//! Engine configuration types.
//!
//! ```toml
//! [planning]
//! minimum_detectable_effect = 0.05
//! power = 0.8
//! default_confidence = 95
//!
//! [catalog]
//! version = 1
//! fingerprint = "..."   # optional, pins variant order
//!
//! [[catalog.variants]]
//! id = "variant_a"
//! name = "Compact"
//! description = "..."
//! format = "compact"
//! ```

use serde::{Deserialize, Serialize};

use crate::catalog::{Variant, VariantCatalog};
use crate::error::{ExperimentError, Result};
use crate::significance::{
    ConfidenceLevel, DEFAULT_MINIMUM_DETECTABLE_EFFECT, DEFAULT_POWER, PlanningParams,
};

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub planning: PlanningConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl EngineConfig {
    /// Parse a TOML document. Missing sections fall back to defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ExperimentError::invalid(format!("engine config: {e}")))
    }

    /// Check every section without building anything.
    pub fn validate(&self) -> Result<()> {
        self.planning.confidence()?;
        self.planning.to_params().validate()?;
        self.catalog.build()?;
        Ok(())
    }
}

/// Sample-size planning defaults, overridable per results query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningConfig {
    #[serde(default = "default_effect")]
    pub minimum_detectable_effect: f64,

    #[serde(default = "default_power")]
    pub power: f64,

    /// Confidence level in percent used when a query does not name one
    #[serde(default = "default_confidence")]
    pub default_confidence: u32,
}

fn default_effect() -> f64 {
    DEFAULT_MINIMUM_DETECTABLE_EFFECT
}

fn default_power() -> f64 {
    DEFAULT_POWER
}

fn default_confidence() -> u32 {
    ConfidenceLevel::default().percent()
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            minimum_detectable_effect: default_effect(),
            power: default_power(),
            default_confidence: default_confidence(),
        }
    }
}

impl PlanningConfig {
    #[must_use]
    pub fn to_params(&self) -> PlanningParams {
        PlanningParams {
            minimum_detectable_effect: self.minimum_detectable_effect,
            power: self.power,
            baseline_rate: None,
        }
    }

    pub fn confidence(&self) -> Result<ConfidenceLevel> {
        ConfidenceLevel::from_percent(self.default_confidence)
    }
}

/// Deploy-time variant catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_version")]
    pub version: u32,

    /// Expected catalog fingerprint; a mismatch refuses to load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,

    #[serde(default = "default_variants")]
    pub variants: Vec<Variant>,
}

fn default_catalog_version() -> u32 {
    VariantCatalog::builtin().version()
}

fn default_variants() -> Vec<Variant> {
    VariantCatalog::builtin().variants().to_vec()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            version: default_catalog_version(),
            fingerprint: None,
            variants: default_variants(),
        }
    }
}

impl CatalogConfig {
    /// Build and, if pinned, verify the catalog.
    pub fn build(&self) -> Result<VariantCatalog> {
        let catalog = VariantCatalog::new(self.version, self.variants.clone())?;
        if let Some(expected) = &self.fingerprint {
            catalog.verify_fingerprint(expected)?;
        }
        Ok(catalog)
    }
}
