//! Deterministic user bucketing.

use std::sync::Arc;

use crate::catalog::{Variant, VariantCatalog};
use crate::error::Result;
use crate::types::UserId;

/// Maps users onto catalog variants with `user_id mod N`.
///
/// Holds no mutable state, so one instance can be shared across any number
/// of request handlers without locking.
#[derive(Debug, Clone)]
pub struct Assigner {
    catalog: Arc<VariantCatalog>,
}

impl Assigner {
    pub fn new(catalog: Arc<VariantCatalog>) -> Self {
        Self { catalog }
    }

    /// The catalog this assigner buckets into.
    #[must_use]
    pub fn catalog(&self) -> &VariantCatalog {
        &self.catalog
    }

    /// Variant for a raw caller-supplied user id. Negative ids are rejected.
    pub fn assign(&self, user_id: i64) -> Result<&Variant> {
        let user = UserId::parse(user_id)?;
        Ok(self.assign_user(user))
    }

    /// Variant for an already validated user.
    #[must_use]
    pub fn assign_user(&self, user: UserId) -> &Variant {
        let index = self.bucket(user);
        // catalog construction guarantees N >= 1, so the index is in range
        &self.catalog.variants()[index]
    }

    /// Bucket index for a user.
    #[must_use]
    pub fn bucket(&self, user: UserId) -> usize {
        let n = self.catalog.len() as u64;
        (user.get() % n) as usize
    }
}
