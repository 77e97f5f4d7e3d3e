pub mod assign;
pub mod config;
pub mod plan;
pub mod results;
pub mod serve;
pub mod track;
pub mod variants;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;
use varlab_core::{EventStore, ExperimentError, ExperimentService, TursoEventStore};

use crate::config::{ConfigLoader, StorageConfig, VarlabConfig};
use crate::retry::{RetryPolicy, with_retry};

/// Open the configured event store, retrying transient failures
pub async fn open_store(storage: &StorageConfig) -> Result<Arc<dyn EventStore>> {
    let store = with_retry(RetryPolicy::default_policy(), || async move {
        let opened = match &storage.url {
            Some(url) => {
                debug!(%url, "opening remote event store");
                let token = storage.auth_token.as_deref().unwrap_or_default();
                TursoEventStore::new_remote(url, token).await
            }
            None => {
                let path = ConfigLoader::database_path(storage);
                if let Some(parent) = path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        ExperimentError::invalid(format!(
                            "cannot create {}: {}",
                            parent.display(),
                            e
                        ))
                    })?;
                }
                debug!(path = %path.display(), "opening local event store");
                TursoEventStore::new_local(&path).await
            }
        };
        opened.map_err(ExperimentError::from)
    })
    .await
    .context("failed to open event store")?;

    Ok(Arc::new(store))
}

/// Build the experiment service from the merged config
pub async fn open_service(config: &VarlabConfig) -> Result<ExperimentService> {
    let store = open_store(&config.storage).await?;
    let service = ExperimentService::from_config(&config.engine(), store)
        .context("invalid experiment configuration")?;
    Ok(service)
}

/// Format a rate as a percentage with one decimal
pub fn percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}
