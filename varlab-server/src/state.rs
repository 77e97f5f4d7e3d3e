//! Shared application state for the variant-lab server

use std::sync::Arc;

use chrono::{DateTime, Utc};
use varlab_core::{ExperimentService, TursoEventStore, VariantCatalog};

use crate::ServerError;

/// Shared application state accessible by all handlers
#[derive(Clone)]
pub struct AppState {
    /// The experiment engine every route calls into
    pub service: Arc<ExperimentService>,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create state around an already configured service
    pub fn new(service: Arc<ExperimentService>) -> Self {
        Self {
            service,
            started_at: Utc::now(),
        }
    }

    /// Built-in catalog over an in-memory event store (for testing)
    pub async fn in_memory() -> Result<Self, ServerError> {
        let store = TursoEventStore::new_memory()
            .await
            .map_err(|e| ServerError::Internal(format!("in-memory store: {}", e)))?;
        let service = ExperimentService::new(VariantCatalog::builtin(), Arc::new(store));
        Ok(Self::new(Arc::new(service)))
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_app_state_in_memory() {
        let state = AppState::in_memory().await.unwrap();
        assert!(state.uptime_seconds() >= 0);
        assert_eq!(state.service.list_variants().len(), 4);
    }

    #[tokio::test]
    async fn test_app_state_clone_shares_service() {
        let state = AppState::in_memory().await.unwrap();
        let cloned = state.clone();
        assert!(Arc::ptr_eq(&state.service, &cloned.service));
    }
}
