//! Validate-then-forward service
//!
//! Every inbound request passes the constraint validator before the provider
//! sees it. Mutations that come back non-terminal are handed to the poller.

use crate::poller::{
    wait_for_file_batch, wait_for_vector_store, wait_for_vector_store_file, PollOptions,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use vs_gateway_core::prelude::*;
use vs_gateway_core::{
    AttachFileRequest, CreateFileBatchRequest, CreateVectorStoreRequest, ErrorContext,
    ErrorContextExt, SearchRequest, SearchResults,
};

const COMPONENT: &str = "vector_store_service";

/// Vector store operations over a provider gateway
pub struct VectorStoreService<G: VectorStoreGateway> {
    gateway: Arc<G>,
    validator: ConstraintValidator,
    poll: PollOptions,
}

impl<G: VectorStoreGateway> VectorStoreService<G> {
    pub fn new(gateway: G) -> Self {
        Self::from_parts(Arc::new(gateway), ConstraintValidator::new(), PollOptions::default())
    }

    pub fn from_parts(gateway: Arc<G>, validator: ConstraintValidator, poll: PollOptions) -> Self {
        Self {
            gateway,
            validator,
            poll,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn validator(&self) -> &ConstraintValidator {
        &self.validator
    }

    fn poll_options(&self, max_wait: Option<Duration>) -> PollOptions {
        self.poll.with_max_wait_opt(max_wait)
    }

    /// Create a vector store and wait until it is usable
    pub async fn create_vector_store_and_wait(
        &self,
        request: CreateVectorStoreRequest,
        max_wait: Option<Duration>,
    ) -> Result<VectorStore> {
        let params = request.into_params(&self.validator)?;
        let created = self
            .gateway
            .create_vector_store(&params)
            .await
            .with_context(ErrorContext::new(COMPONENT, "create_vector_store"))?;

        info!(vector_store_id = %created.id, status = created.status.as_str(), "Vector store created");
        if created.is_terminal() {
            return Ok(created);
        }

        wait_for_vector_store(self.gateway.as_ref(), &created.id, &self.poll_options(max_wait))
            .await
            .with_context(
                ErrorContext::new(COMPONENT, "wait_for_vector_store").with_resource(&created.id),
            )
    }

    /// Attach a file and wait for indexing to finish
    pub async fn attach_file_and_wait(
        &self,
        vector_store_id: &str,
        request: AttachFileRequest,
        max_wait: Option<Duration>,
    ) -> Result<VectorStoreFile> {
        let params = request.into_params(&self.validator)?;
        let attached = self
            .gateway
            .attach_file(vector_store_id, &params)
            .await
            .with_context(
                ErrorContext::new(COMPONENT, "attach_file").with_vector_store(vector_store_id),
            )?;

        debug!(vector_store_id, file_id = %attached.id, status = attached.status.as_str(), "File attached");
        if attached.is_terminal() {
            return Ok(attached);
        }

        wait_for_vector_store_file(
            self.gateway.as_ref(),
            vector_store_id,
            &attached.id,
            &self.poll_options(max_wait),
        )
        .await
        .with_context(
            ErrorContext::new(COMPONENT, "wait_for_vector_store_file")
                .with_vector_store(vector_store_id)
                .with_resource(&attached.id),
        )
    }

    /// Add a batch of files and wait for the batch to settle
    pub async fn create_file_batch_and_wait(
        &self,
        vector_store_id: &str,
        request: CreateFileBatchRequest,
        max_wait: Option<Duration>,
    ) -> Result<FileBatch> {
        let params = request.into_params(&self.validator)?;
        let batch = self
            .gateway
            .create_file_batch(vector_store_id, &params)
            .await
            .with_context(
                ErrorContext::new(COMPONENT, "create_file_batch").with_vector_store(vector_store_id),
            )?;

        debug!(vector_store_id, batch_id = %batch.id, status = batch.status.as_str(), "File batch created");
        if batch.is_terminal() {
            return Ok(batch);
        }

        wait_for_file_batch(
            self.gateway.as_ref(),
            vector_store_id,
            &batch.id,
            &self.poll_options(max_wait),
        )
        .await
        .with_context(
            ErrorContext::new(COMPONENT, "wait_for_file_batch")
                .with_vector_store(vector_store_id)
                .with_resource(&batch.id),
        )
    }

    /// Validate filters and forward a search
    pub async fn search(&self, vector_store_id: &str, request: SearchRequest) -> Result<SearchResults> {
        let params = request.into_params(&self.validator)?;
        self.gateway
            .search(vector_store_id, &params)
            .await
            .with_context(ErrorContext::new(COMPONENT, "search").with_vector_store(vector_store_id))
    }
}
