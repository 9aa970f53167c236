//! In-memory gateway with scripted status sequences
//!
//! Each retrieve pops the next scripted status for that resource. The last
//! status repeats once the script runs dry, so a never-terminal resource is a
//! single `InProgress` entry. Create calls consume the head of the same script.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;
use vs_gateway_core::prelude::*;
use vs_gateway_core::{
    AttachFileParams, BatchStatus, CreateFileBatchParams, CreateVectorStoreParams, FileCounts,
    FileStatus, SearchParams, SearchResults, VectorStoreStatus,
};

/// Scripted gateway for tests and dry runs
#[derive(Default)]
pub struct ScriptedGateway {
    store_statuses: Mutex<VecDeque<VectorStoreStatus>>,
    file_statuses: Mutex<HashMap<String, VecDeque<FileStatus>>>,
    batch_statuses: Mutex<VecDeque<BatchStatus>>,
    failure: Mutex<Option<u16>>,
    calls: Mutex<Vec<String>>,
    bodies: Mutex<Vec<Value>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store_statuses(mut self, statuses: impl IntoIterator<Item = VectorStoreStatus>) -> Self {
        self.store_statuses.get_mut().extend(statuses);
        self
    }

    pub fn with_file_statuses(
        mut self,
        file_id: impl Into<String>,
        statuses: impl IntoIterator<Item = FileStatus>,
    ) -> Self {
        self.file_statuses
            .get_mut()
            .entry(file_id.into())
            .or_default()
            .extend(statuses);
        self
    }

    pub fn with_batch_statuses(mut self, statuses: impl IntoIterator<Item = BatchStatus>) -> Self {
        self.batch_statuses.get_mut().extend(statuses);
        self
    }

    /// Every call fails with this HTTP status until cleared
    pub async fn fail_with(&self, status: Option<u16>) {
        *self.failure.lock().await = status;
    }

    /// Calls seen so far, as `operation:id`
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    /// Number of calls whose operation matches
    pub async fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| c.split(':').next() == Some(operation))
            .count()
    }

    /// Provider bodies of mutating calls, in order
    pub async fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().await.clone()
    }

    async fn record(&self, operation: &str, id: &str) -> Result<()> {
        self.calls.lock().await.push(format!("{operation}:{id}"));
        match *self.failure.lock().await {
            Some(status) => Err(GatewayError::provider_status(
                format!("{operation} failed: scripted status {status}"),
                status,
            )),
            None => Ok(()),
        }
    }
}

fn next_status<S: Copy>(script: &mut VecDeque<S>, what: &str) -> Result<S> {
    match script.len() {
        0 => Err(GatewayError::provider_status(format!("{what} not found"), 404)),
        1 => Ok(script[0]),
        _ => script
            .pop_front()
            .ok_or_else(|| GatewayError::Internal("status script drained".into())),
    }
}

fn store(id: &str, status: VectorStoreStatus) -> VectorStore {
    VectorStore {
        id: id.to_string(),
        status,
        name: None,
        created_at: None,
        expires_at: None,
        file_counts: FileCounts::default(),
        usage_bytes: 0,
        metadata: None,
    }
}

fn file(vector_store_id: &str, id: &str, status: FileStatus) -> VectorStoreFile {
    VectorStoreFile {
        id: id.to_string(),
        vector_store_id: vector_store_id.to_string(),
        status,
        last_error: None,
        usage_bytes: 0,
        created_at: None,
    }
}

fn batch(vector_store_id: &str, id: &str, status: BatchStatus) -> FileBatch {
    FileBatch {
        id: id.to_string(),
        vector_store_id: vector_store_id.to_string(),
        status,
        file_counts: FileCounts::default(),
        created_at: None,
    }
}

#[async_trait]
impl HealthCheck for ScriptedGateway {
    async fn health_check(&self) -> Result<()> {
        self.record("health_check", "-").await
    }

    fn component_name(&self) -> &'static str {
        "scripted_gateway"
    }
}

#[async_trait]
impl ResourceGateway for ScriptedGateway {
    async fn retrieve_vector_store(&self, vector_store_id: &str) -> Result<VectorStore> {
        self.record("retrieve_vector_store", vector_store_id).await?;
        let status = next_status(&mut *self.store_statuses.lock().await, vector_store_id)?;
        Ok(store(vector_store_id, status))
    }

    async fn retrieve_vector_store_file(
        &self,
        vector_store_id: &str,
        file_id: &str,
    ) -> Result<VectorStoreFile> {
        self.record("retrieve_vector_store_file", file_id).await?;
        let mut files = self.file_statuses.lock().await;
        let script = files.entry(file_id.to_string()).or_default();
        let status = next_status(script, file_id)?;
        Ok(file(vector_store_id, file_id, status))
    }

    async fn retrieve_file_batch(&self, vector_store_id: &str, batch_id: &str) -> Result<FileBatch> {
        self.record("retrieve_file_batch", batch_id).await?;
        let status = next_status(&mut *self.batch_statuses.lock().await, batch_id)?;
        Ok(batch(vector_store_id, batch_id, status))
    }
}

#[async_trait]
impl VectorStoreGateway for ScriptedGateway {
    async fn create_vector_store(&self, params: &CreateVectorStoreParams) -> Result<VectorStore> {
        self.record("create_vector_store", "vs_scripted").await?;
        self.bodies.lock().await.push(params.to_provider_body());
        let status = next_status(&mut *self.store_statuses.lock().await, "vs_scripted")?;
        let mut created = store("vs_scripted", status);
        created.name = params.name.clone();
        Ok(created)
    }

    async fn attach_file(
        &self,
        vector_store_id: &str,
        params: &AttachFileParams,
    ) -> Result<VectorStoreFile> {
        self.record("attach_file", &params.file_id).await?;
        self.bodies.lock().await.push(params.to_provider_body());
        let mut files = self.file_statuses.lock().await;
        let script = files.entry(params.file_id.clone()).or_default();
        let status = next_status(script, &params.file_id)?;
        Ok(file(vector_store_id, &params.file_id, status))
    }

    async fn create_file_batch(
        &self,
        vector_store_id: &str,
        params: &CreateFileBatchParams,
    ) -> Result<FileBatch> {
        self.record("create_file_batch", "vsfb_scripted").await?;
        self.bodies.lock().await.push(params.to_provider_body());
        let status = next_status(&mut *self.batch_statuses.lock().await, "vsfb_scripted")?;
        Ok(batch(vector_store_id, "vsfb_scripted", status))
    }

    async fn search(&self, vector_store_id: &str, params: &SearchParams) -> Result<SearchResults> {
        self.record("search", vector_store_id).await?;
        self.bodies.lock().await.push(params.to_provider_body());
        Ok(SearchResults {
            search_query: Some(Value::String(params.query.clone())),
            data: Vec::new(),
            has_more: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn last_status_repeats() {
        let gateway = ScriptedGateway::new()
            .with_store_statuses([VectorStoreStatus::InProgress, VectorStoreStatus::Completed]);

        let first = gateway.retrieve_vector_store("vs_1").await.unwrap();
        let second = gateway.retrieve_vector_store("vs_1").await.unwrap();
        let third = gateway.retrieve_vector_store("vs_1").await.unwrap();

        assert_eq!(first.status, VectorStoreStatus::InProgress);
        assert_eq!(second.status, VectorStoreStatus::Completed);
        assert_eq!(third.status, VectorStoreStatus::Completed);
        assert_eq!(gateway.call_count("retrieve_vector_store").await, 3);
    }

    #[tokio::test]
    async fn unscripted_resource_is_not_found() {
        let gateway = ScriptedGateway::new();
        let err = gateway.retrieve_file_batch("vs_1", "vsfb_1").await.unwrap_err();
        assert_eq!(err.provider_status_code(), Some(404));
    }

    #[tokio::test]
    async fn scripted_failure_applies_to_every_call() {
        let gateway = ScriptedGateway::new().with_file_statuses("file_1", [FileStatus::Completed]);
        gateway.fail_with(Some(503)).await;

        let err = gateway
            .retrieve_vector_store_file("vs_1", "file_1")
            .await
            .unwrap_err();
        assert_eq!(err.provider_status_code(), Some(503));
        assert!(gateway.health_check().await.is_err());

        gateway.fail_with(None).await;
        assert!(gateway.retrieve_vector_store_file("vs_1", "file_1").await.is_ok());
    }
}
