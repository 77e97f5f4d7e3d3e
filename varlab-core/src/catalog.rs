//! Deploy-time registry of experiment variants.
//!
//! Catalog order is part of the experiment identity: user `u` lands on
//! `variants[u mod N]`, so reordering the list moves every user. The
//! [`VariantCatalog::fingerprint`] captures that order so a deployed config
//! can pin it and refuse a silent reshuffle.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ExperimentError, Result};
use crate::types::VariantId;

/// Presentation format a variant renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantFormat {
    /// One-line summary
    Compact,
    /// Full paragraph explanation
    Detailed,
    /// Chart or badge based rendering
    Visual,
    /// Bulleted list of reasons
    Bullet,
}

impl VariantFormat {
    /// Convert to wire string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Detailed => "detailed",
            Self::Visual => "visual",
            Self::Bullet => "bullet",
        }
    }
}

/// One arm of the experiment. Immutable once deployed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Stable token, never reused for a different presentation
    pub id: VariantId,
    /// Human-readable name
    pub name: String,
    /// What the variant shows
    pub description: String,
    /// Presentation format tag
    pub format: VariantFormat,
}

impl Variant {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        format: VariantFormat,
    ) -> Self {
        Self {
            id: VariantId::new(id),
            name: name.into(),
            description: description.into(),
            format,
        }
    }
}

/// Ordered, versioned set of variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantCatalog {
    version: u32,
    variants: Vec<Variant>,
}

impl VariantCatalog {
    /// Build a catalog, rejecting empty lists and duplicate ids.
    pub fn new(version: u32, variants: Vec<Variant>) -> Result<Self> {
        if variants.is_empty() {
            return Err(ExperimentError::invalid("catalog must contain at least one variant"));
        }

        let mut seen = HashSet::with_capacity(variants.len());
        for variant in &variants {
            if variant.id.as_str().is_empty() {
                return Err(ExperimentError::invalid("variant id must not be empty"));
            }
            if !seen.insert(variant.id.as_str()) {
                return Err(ExperimentError::invalid(format!(
                    "duplicate variant id in catalog: {}",
                    variant.id
                )));
            }
        }

        Ok(Self { version, variants })
    }

    /// The four match-explanation formats shipped by default.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            version: 1,
            variants: vec![
                Variant::new(
                    "variant_a",
                    "Compact",
                    "Single-line match score with the top reason",
                    VariantFormat::Compact,
                ),
                Variant::new(
                    "variant_b",
                    "Detailed",
                    "Paragraph explaining how skills and experience line up",
                    VariantFormat::Detailed,
                ),
                Variant::new(
                    "variant_c",
                    "Visual",
                    "Score gauge with per-criterion badges",
                    VariantFormat::Visual,
                ),
                Variant::new(
                    "variant_d",
                    "Bullet points",
                    "Bulleted list of matching and missing criteria",
                    VariantFormat::Bullet,
                ),
            ],
        }
    }

    /// Catalog version committed alongside the deploy config.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Variants in bucketing order.
    #[must_use]
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Number of variants (N in `user_id mod N`). Never zero.
    #[must_use]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Variant at a bucket index.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Variant> {
        self.variants.get(index)
    }

    /// Look up a variant by id.
    #[must_use]
    pub fn get(&self, id: &VariantId) -> Option<&Variant> {
        self.variants.iter().find(|v| &v.id == id)
    }

    /// Look up a variant by id, failing with `InvalidInput` when unknown.
    pub fn require(&self, id: &VariantId) -> Result<&Variant> {
        self.get(id)
            .ok_or_else(|| ExperimentError::invalid(format!("unknown variant id: {id}")))
    }

    /// Hex SHA-256 over the ordered variant ids.
    ///
    /// Any insertion, removal or reorder changes the fingerprint. Renaming a
    /// variant's display name or description does not.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for variant in &self.variants {
            hasher.update(variant.id.as_str().as_bytes());
            hasher.update(b"\n");
        }
        hex::encode(hasher.finalize())
    }

    /// Check the catalog order against a pinned fingerprint.
    pub fn verify_fingerprint(&self, expected: &str) -> Result<()> {
        let actual = self.fingerprint();
        if actual.eq_ignore_ascii_case(expected.trim()) {
            Ok(())
        } else {
            Err(ExperimentError::invalid(format!(
                "catalog v{} order changed: expected fingerprint {}, computed {}; \
                 reordering reassigns users and needs a new experiment version",
                self.version, expected, actual
            )))
        }
    }
}
