//! Strategy traits for the vector store gateway
//!
//! The provider is the only party that mutates resources. The core talks to it
//! through these traits so the poller and service can run against the real
//! HTTP client or an in-memory fake.
//!
//! ## Strategy Hierarchy
//!
//! ```text
//! ResourceGateway (read-only status fetches)
//!     │
//!     └── VectorStoreGateway (create / attach / batch / search)
//!             └── ProviderClient, ScriptedGateway, ...
//! ```

use crate::error::Result;
use crate::request::{
    AttachFileParams, CreateFileBatchParams, CreateVectorStoreParams, SearchParams, SearchResults,
};
use crate::resource::{FileBatch, VectorStore, VectorStoreFile};
use async_trait::async_trait;

/// Health check capability
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Perform health check
    ///
    /// Returns Ok(()) if healthy, Err with details if not.
    async fn health_check(&self) -> Result<()>;

    /// Get component name for health reporting
    fn component_name(&self) -> &'static str;
}

/// Read-only view of resource state on the provider.
///
/// Every call is a fresh read. Implementations report transport and protocol
/// failures as errors and never retry them.
#[async_trait]
pub trait ResourceGateway: Send + Sync {
    async fn retrieve_vector_store(&self, vector_store_id: &str) -> Result<VectorStore>;

    async fn retrieve_vector_store_file(
        &self,
        vector_store_id: &str,
        file_id: &str,
    ) -> Result<VectorStoreFile>;

    async fn retrieve_file_batch(&self, vector_store_id: &str, batch_id: &str) -> Result<FileBatch>;
}

/// Mutating and search operations, forwarded as-is.
///
/// Parameters arrive already validated.
#[async_trait]
pub trait VectorStoreGateway: ResourceGateway {
    async fn create_vector_store(&self, params: &CreateVectorStoreParams) -> Result<VectorStore>;

    async fn attach_file(
        &self,
        vector_store_id: &str,
        params: &AttachFileParams,
    ) -> Result<VectorStoreFile>;

    async fn create_file_batch(
        &self,
        vector_store_id: &str,
        params: &CreateFileBatchParams,
    ) -> Result<FileBatch>;

    async fn search(&self, vector_store_id: &str, params: &SearchParams) -> Result<SearchResults>;
}
