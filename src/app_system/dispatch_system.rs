use std::sync::Arc;

use tracing::{error, info, warn};

use super::config::AppConfig;
use crate::client::DispatchClient;
use crate::error::DispatchError;
use crate::service::DispatchService;
use crate::session::Session;
use crate::store::{BlobStore, Collections, FileStore, MemoryStore};

/// The running platform: one dispatch service and the handle to reach it.
///
/// Responsible for preparing the store, starting the service and shutting
/// it down again.
pub struct DispatchSystem {
    pub client: DispatchClient,
    config: AppConfig,
    handle: tokio::task::JoinHandle<()>,
}

impl DispatchSystem {
    /// Starts on the backend named by the storage config.
    pub async fn start(config: AppConfig) -> Self {
        let backend: Arc<dyn BlobStore> = match &config.storage.dir {
            Some(dir) => {
                info!(dir = %dir.display(), "Using file storage");
                Arc::new(FileStore::new(dir.clone()))
            }
            None => {
                info!("Using in-memory storage");
                Arc::new(MemoryStore::new())
            }
        };
        Self::with_backend(config, backend).await
    }

    pub async fn with_backend(config: AppConfig, backend: Arc<dyn BlobStore>) -> Self {
        let collections = Collections::new(backend);
        if let Err(e) = collections.initialize().await {
            warn!(error = %e, "Store initialization failed, continuing with empty collections");
        }

        let (service, client) = DispatchService::new(
            config.service.buffer_size,
            collections,
            config.fees,
            config.ledger,
        );
        let handle = tokio::spawn(service.run());
        info!("Dispatch system started");

        Self { client, config, handle }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// A fresh, logged-out session on this system.
    pub fn session(&self) -> Session {
        Session::new(self.client.clone(), self.config.ledger)
    }

    pub async fn shutdown(self) -> Result<(), DispatchError> {
        info!("Shutting down system...");
        self.client.shutdown().await?;

        if let Err(e) = self.handle.await {
            error!("Dispatch service task failed: {:?}", e);
            return Err(DispatchError::ActorCommunicationError(format!("Service task failed: {}", e)));
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
