use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::{ContainerId, ViewerConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewerError {
    #[error("failed to load document: {0}")]
    Load(String),
    #[error("document request failed with status {0}")]
    HttpStatus(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("document is still loading")]
    NotReady,
    #[error("no viewer loaded in container {0}")]
    NotLoaded(ContainerId),
    #[error("load cancelled")]
    Cancelled,
}

/// A loaded document inside one container.
#[async_trait]
pub trait ViewerInstance: Send + Sync {
    /// `None` until the page tree can be queried.
    async fn total_page_count(&self) -> Result<Option<u32>, ViewerError>;
    /// `None` until a page is on screen.
    async fn current_page_index(&self) -> Result<Option<u32>, ViewerError>;
    async fn export_pdf(&self) -> Result<Bytes, ViewerError>;
}

/// The viewer capability the harness drives. `load` resolves once the first
/// page is renderable.
#[async_trait]
pub trait Viewer: Send + Sync {
    /// Mounts the document into `config.container`. Once `cancel` fires the
    /// load resolves with [`ViewerError::Cancelled`] and mounts nothing.
    async fn load(
        &self,
        config: &ViewerConfig,
        cancel: &CancellationToken,
    ) -> Result<Arc<dyn ViewerInstance>, ViewerError>;

    /// Unmounts `instance` from `container`. Whatever else occupies the
    /// container stays mounted and the call fails with `NotLoaded`.
    async fn unload(
        &self,
        container: ContainerId,
        instance: &dyn ViewerInstance,
    ) -> Result<(), ViewerError>;
}

/// Whether `mounted` and `instance` are the same object.
pub fn is_same_instance<T: ViewerInstance>(mounted: &Arc<T>, instance: &dyn ViewerInstance) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(mounted), std::ptr::from_ref(instance))
}
