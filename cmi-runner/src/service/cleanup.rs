//! Model cleanup service
//!
//! Deletes an imported model and the storage objects it was imported from.

use cmi_client::{ImportedModelApi, ObjectStore};
use std::sync::Arc;
use tracing::{error, info};

use super::transfer::directory_prefix;
use crate::config::MAX_DELETE_BATCH_SIZE;
use crate::error::CleanupError;

/// Deletes imported models and their backing objects
#[derive(Clone)]
pub struct ModelCleanup {
    models: Arc<dyn ImportedModelApi>,
    store: Arc<dyn ObjectStore>,
    batch_size: usize,
}

impl ModelCleanup {
    /// Creates a cleanup service
    ///
    /// `batch_size` is clamped to 1..=1000, the range a single delete request accepts.
    pub fn new(
        models: Arc<dyn ImportedModelApi>,
        store: Arc<dyn ObjectStore>,
        batch_size: usize,
    ) -> Self {
        Self {
            models,
            store,
            batch_size: batch_size.clamp(1, MAX_DELETE_BATCH_SIZE),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Deletes an imported model
    pub async fn delete_model(&self, model_id: &str) -> Result<(), CleanupError> {
        info!("Deleting imported model: {}", model_id);

        self.models
            .delete_imported_model(model_id)
            .await
            .map_err(|source| {
                error!("Error deleting model {}: {}", model_id, source);
                CleanupError::Model {
                    model_id: model_id.to_string(),
                    source,
                }
            })?;

        info!("Model deleted successfully: {}", model_id);
        Ok(())
    }

    /// Deletes every object under `prefix`, one batch per request
    ///
    /// The prefix names a directory the same way it does for uploads, so
    /// surrounding slashes are ignored and sibling directories sharing a name
    /// stem are left alone.
    ///
    /// # Returns
    /// Number of deleted objects
    pub async fn delete_objects(&self, bucket: &str, prefix: &str) -> Result<usize, CleanupError> {
        let prefix = directory_prefix(prefix);
        info!("Deleting objects from bucket {} under {}", bucket, prefix);

        let keys = self.store.list_keys(bucket, &prefix).await.map_err(|source| {
            error!("Error listing objects in {}: {}", bucket, source);
            CleanupError::List {
                bucket: bucket.to_string(),
                prefix: prefix.clone(),
                source,
            }
        })?;

        let mut deleted = 0;
        for batch in keys.chunks(self.batch_size) {
            self.store
                .delete_keys(bucket, batch)
                .await
                .map_err(|source| {
                    error!("Error deleting objects from {}: {}", bucket, source);
                    CleanupError::Delete {
                        bucket: bucket.to_string(),
                        deleted,
                        source,
                    }
                })?;
            deleted += batch.len();
            info!("Deleted {} object(s) ({} so far)", batch.len(), deleted);
        }

        info!(
            "Objects deleted successfully from bucket {}: {}",
            bucket, deleted
        );
        Ok(deleted)
    }
}
