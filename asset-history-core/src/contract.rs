//! # contract: the seam between the pipeline and the remote asset service
//!
//! The pipeline only talks to the network through [`AssetSource`]. The production implementation
//! is [`crate::download::RemoteClient`]; tests drive the lister and the orchestrator through the
//! generated `MockAssetSource` (enabled by the `test-export-mocks` feature).

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use tokio::io::AsyncRead;

use crate::error::Result;
use crate::version::AssetVersion;

/// Body of one asset version. Owned by whoever fetched it and dropped once consumed.
pub type ContentStream = Box<dyn AsyncRead + Send + Unpin>;

#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// One page (1-based) of the version listing. An empty page ends the listing.
    async fn list_page(&self, asset_id: i64, page: u32) -> Result<Vec<AssetVersion>>;

    /// Streams the content of a single version.
    async fn fetch_content(&self, version: &AssetVersion) -> Result<ContentStream>;

    /// Acquires and attaches session credentials to subsequent requests.
    async fn authenticate(&self) -> Result<()>;
}
