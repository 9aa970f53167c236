//! Provider client against a mocked provider API.
//!
//! Uses wiremock to stand in for the `/vector_stores` endpoints, then drives
//! the client directly and through the poller with a short real-time schedule.

use serde_json::json;
use std::time::Duration;
use wiremock::{
    matchers::{body_json, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use vs_gateway_core::prelude::*;
use vs_gateway_core::{
    AttachFileRequest, CreateVectorStoreRequest, FileStatus, PollerConfig, ProviderConfig,
    SearchRequest, VectorStoreStatus,
};
use vs_poller::{wait_for_vector_store, PollOptions, ProviderClient, VectorStoreService};

fn client_for(server: &MockServer) -> ProviderClient {
    let config = ProviderConfig {
        base_url: server.uri(),
        api_key: Some("sk-test".to_string()),
        organization: Some("org-test".to_string()),
        ..Default::default()
    };
    ProviderClient::new(&config).unwrap()
}

fn fast_options() -> PollOptions {
    PollOptions::from_config(&PollerConfig {
        initial_backoff: Duration::from_millis(10),
        backoff_step: Duration::from_millis(10),
        max_backoff: Duration::from_millis(20),
        max_wait: Duration::from_secs(5),
    })
}

fn store_body(status: &str) -> serde_json::Value {
    json!({
        "id": "vs_abc",
        "object": "vector_store",
        "name": "docs",
        "status": status,
        "created_at": 1_700_000_000,
        "file_counts": {"in_progress": 0, "completed": 1, "failed": 0, "cancelled": 0, "total": 1},
        "usage_bytes": 2048
    })
}

#[tokio::test]
async fn retrieve_sends_auth_and_beta_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vector_stores/vs_abc"))
        .and(header("authorization", "Bearer sk-test"))
        .and(header("OpenAI-Organization", "org-test"))
        .and(header("OpenAI-Beta", "assistants=v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(store_body("completed")))
        .expect(1)
        .mount(&server)
        .await;

    let store = client_for(&server).retrieve_vector_store("vs_abc").await.unwrap();

    assert_eq!(store.status, VectorStoreStatus::Completed);
    assert_eq!(store.usage_bytes, 2048);
}

#[tokio::test]
async fn error_status_carries_provider_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vector_stores/vs_missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"message": "No vector store found with id 'vs_missing'.", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .retrieve_vector_store("vs_missing")
        .await
        .unwrap_err();

    assert_eq!(err.provider_status_code(), Some(404));
    assert!(err.to_string().contains("No vector store found"));
}

#[tokio::test]
async fn unknown_status_is_a_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vector_stores/vs_abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(store_body("paused")))
        .mount(&server)
        .await;

    let err = client_for(&server).retrieve_vector_store("vs_abc").await.unwrap_err();
    assert!(matches!(err, GatewayError::Provider { status: None, .. }));
}

#[tokio::test]
async fn polls_until_store_completes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vector_stores/vs_abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(store_body("in_progress")))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vector_stores/vs_abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(store_body("completed")))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let store = wait_for_vector_store(&client, "vs_abc", &fast_options())
        .await
        .unwrap();

    assert_eq!(store.status, VectorStoreStatus::Completed);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn poller_does_not_retry_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vector_stores/vs_abc"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = wait_for_vector_store(&client, "vs_abc", &fast_options())
        .await
        .unwrap_err();

    assert_eq!(err.provider_status_code(), Some(500));
}

#[tokio::test]
async fn create_store_sends_provider_chunking_names() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/vector_stores"))
        .and(body_json(json!({
            "name": "docs",
            "chunking_strategy": {
                "type": "static",
                "static": {"max_chunk_size_tokens": 800, "chunk_overlap_tokens": 400}
            },
            "metadata": {"team": "search"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(store_body("completed")))
        .expect(1)
        .mount(&server)
        .await;

    let service = VectorStoreService::from_parts(
        std::sync::Arc::new(client_for(&server)),
        ConstraintValidator::new(),
        fast_options(),
    );
    let request: CreateVectorStoreRequest = serde_json::from_value(json!({
        "name": "docs",
        "chunking_strategy": {"type": "static", "static": {"maxTokens": 800, "overlapTokens": 400}},
        "metadata": {"team": "search"}
    }))
    .unwrap();

    let store = service.create_vector_store_and_wait(request, None).await.unwrap();
    assert_eq!(store.id, "vs_abc");
}

#[tokio::test]
async fn attach_file_then_poll() {
    let server = MockServer::start().await;
    let file = |status: &str| {
        json!({"id": "file_1", "object": "vector_store.file", "vector_store_id": "vs_abc", "status": status})
    };

    Mock::given(method("POST"))
        .and(path("/vector_stores/vs_abc/files"))
        .and(body_json(json!({"file_id": "file_1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(file("in_progress")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vector_stores/vs_abc/files/file_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(file("completed")))
        .expect(1)
        .mount(&server)
        .await;

    let service = VectorStoreService::from_parts(
        std::sync::Arc::new(client_for(&server)),
        ConstraintValidator::new(),
        fast_options(),
    );
    let request = AttachFileRequest {
        file_id: "file_1".to_string(),
        chunking_strategy: None,
    };

    let attached = service.attach_file_and_wait("vs_abc", request, None).await.unwrap();
    assert_eq!(attached.status, FileStatus::Completed);
}

#[tokio::test]
async fn search_parses_hits() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/vector_stores/vs_abc/search"))
        .and(body_json(json!({
            "query": "refund policy",
            "filters": {"type": "eq", "key": "region", "value": "eu"},
            "max_num_results": 3
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "vector_store.search_results.page",
            "search_query": "refund policy",
            "data": [{
                "file_id": "file_1",
                "filename": "policy.md",
                "score": 0.91,
                "attributes": {"region": "eu"},
                "content": [{"type": "text", "text": "Refunds are issued within 14 days."}]
            }],
            "has_more": false
        })))
        .mount(&server)
        .await;

    let service = VectorStoreService::new(client_for(&server));
    let request: SearchRequest = serde_json::from_value(json!({
        "query": "refund policy",
        "filters": {"type": "eq", "key": "region", "value": "eu"},
        "max_num_results": 3
    }))
    .unwrap();

    let results = service.search("vs_abc", request).await.unwrap();
    assert_eq!(results.data.len(), 1);
    assert_eq!(results.data[0].filename.as_deref(), Some("policy.md"));
}

#[tokio::test]
async fn health_check_lists_one_store() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vector_stores"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"object": "list", "data": []})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client_for(&server).health_check().await.is_ok());
}
