//! Provider HTTP client
//!
//! Thin reqwest wrapper over the provider's `/vector_stores` API. Requests are
//! forwarded as-is; nothing here retries.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;
use vs_gateway_core::prelude::*;
use vs_gateway_core::{
    AttachFileParams, CreateFileBatchParams, CreateVectorStoreParams, LatencyTimer,
    ProviderConfig, ProviderMetrics, SearchParams, SearchResults,
};

const BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");
const ORGANIZATION_HEADER: &str = "OpenAI-Organization";

/// Provider API client
pub struct ProviderClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    organization: Option<String>,
}

impl ProviderClient {
    /// Create new provider client
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let base_url = config
            .base_url()
            .map_err(|e| GatewayError::config(format!("provider.base_url: {e}")))?;

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::provider_with_source("Failed to create client", e))?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
            organization: config.organization.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build request with authentication
    fn build_request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        let mut req = self.client.request(method, &url);

        if let Some(ref api_key) = self.api_key {
            req = req.bearer_auth(api_key);
        }
        if let Some(ref org) = self.organization {
            req = req.header(ORGANIZATION_HEADER, org);
        }

        req.header(BETA_HEADER.0, BETA_HEADER.1)
    }

    /// Send a request and decode a 2xx JSON body
    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T> {
        let metrics = ProviderMetrics::new(operation);
        let _timer = LatencyTimer::start(|d| metrics.record_latency(d));

        let mut req = self.build_request(method, path);
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => {
                metrics.record_request("transport");
                return Err(GatewayError::provider_with_source(
                    format!("{operation} request failed"),
                    e,
                ));
            }
        };

        metrics.record_request(status_class(&resp));
        decode(operation, resp).await
    }

    async fn get<T: DeserializeOwned>(&self, operation: &'static str, path: &str) -> Result<T> {
        self.send(operation, Method::GET, path, None).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        body: &Value,
    ) -> Result<T> {
        self.send(operation, Method::POST, path, Some(body)).await
    }
}

fn status_class(resp: &Response) -> &'static str {
    match resp.status().as_u16() {
        200..=299 => "2xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

async fn decode<T: DeserializeOwned>(operation: &'static str, resp: Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(GatewayError::provider_status(
            format!("{operation} failed: {} - {}", status, provider_message(&body)),
            status.as_u16(),
        ));
    }

    resp.json()
        .await
        .map_err(|e| GatewayError::provider_with_source(format!("{operation}: failed to parse response"), e))
}

/// Pull `error.message` out of a provider error body, else the raw text
fn provider_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl HealthCheck for ProviderClient {
    async fn health_check(&self) -> Result<()> {
        let _: Value = self.get("health_check", "/vector_stores?limit=1").await?;
        Ok(())
    }

    fn component_name(&self) -> &'static str {
        "provider_client"
    }
}

#[async_trait]
impl ResourceGateway for ProviderClient {
    async fn retrieve_vector_store(&self, vector_store_id: &str) -> Result<VectorStore> {
        let store: VectorStore = self
            .get("retrieve_vector_store", &format!("/vector_stores/{vector_store_id}"))
            .await?;
        trace!(vector_store_id, status = store.status.as_str(), "Retrieved vector store");
        Ok(store)
    }

    async fn retrieve_vector_store_file(
        &self,
        vector_store_id: &str,
        file_id: &str,
    ) -> Result<VectorStoreFile> {
        let file: VectorStoreFile = self
            .get(
                "retrieve_vector_store_file",
                &format!("/vector_stores/{vector_store_id}/files/{file_id}"),
            )
            .await?;
        trace!(vector_store_id, file_id, status = file.status.as_str(), "Retrieved file");
        Ok(file)
    }

    async fn retrieve_file_batch(&self, vector_store_id: &str, batch_id: &str) -> Result<FileBatch> {
        let batch: FileBatch = self
            .get(
                "retrieve_file_batch",
                &format!("/vector_stores/{vector_store_id}/file_batches/{batch_id}"),
            )
            .await?;
        trace!(vector_store_id, batch_id, status = batch.status.as_str(), "Retrieved file batch");
        Ok(batch)
    }
}

#[async_trait]
impl VectorStoreGateway for ProviderClient {
    async fn create_vector_store(&self, params: &CreateVectorStoreParams) -> Result<VectorStore> {
        let store: VectorStore = self
            .post("create_vector_store", "/vector_stores", &params.to_provider_body())
            .await?;
        debug!(vector_store_id = %store.id, status = store.status.as_str(), "Created vector store");
        Ok(store)
    }

    async fn attach_file(
        &self,
        vector_store_id: &str,
        params: &AttachFileParams,
    ) -> Result<VectorStoreFile> {
        let file: VectorStoreFile = self
            .post(
                "attach_file",
                &format!("/vector_stores/{vector_store_id}/files"),
                &params.to_provider_body(),
            )
            .await?;
        debug!(vector_store_id, file_id = %file.id, status = file.status.as_str(), "Attached file");
        Ok(file)
    }

    async fn create_file_batch(
        &self,
        vector_store_id: &str,
        params: &CreateFileBatchParams,
    ) -> Result<FileBatch> {
        let batch: FileBatch = self
            .post(
                "create_file_batch",
                &format!("/vector_stores/{vector_store_id}/file_batches"),
                &params.to_provider_body(),
            )
            .await?;
        debug!(
            vector_store_id,
            batch_id = %batch.id,
            files = params.file_ids.len(),
            "Created file batch"
        );
        Ok(batch)
    }

    async fn search(&self, vector_store_id: &str, params: &SearchParams) -> Result<SearchResults> {
        let results: SearchResults = self
            .post(
                "search",
                &format!("/vector_stores/{vector_store_id}/search"),
                &params.to_provider_body(),
            )
            .await?;
        debug!(vector_store_id, hits = results.data.len(), "Search completed");
        Ok(results)
    }
}
