// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Capability discovery and agent directory over HTTP

mod common;

use agentmesh_core::application::agent_directory::AgentDirectory;
use agentmesh_core::application::capability_client::CapabilityRegistryClient;
use agentmesh_core::domain::agent::AgentId;
use agentmesh_core::domain::errors::{DirectoryError, DiscoveryError, ErrorKind};
use common::*;
use serde_json::json;
use std::time::Duration;

fn descriptor(name: &str) -> serde_json::Value {
    json!({ "name": name, "description": format!("{} tool", name), "input_schema": pool_schema() })
}

#[tokio::test]
async fn test_discovery_ignores_remote_ordering_and_shape() {
    let mut wrapped = mockito::Server::new_async().await;
    wrapped
        .mock("GET", "/tools")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "tools": [descriptor("alpha"), descriptor("beta")] }).to_string())
        .create_async()
        .await;
    let mut bare = mockito::Server::new_async().await;
    bare.mock("GET", "/tools")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([descriptor("beta"), descriptor("alpha")]).to_string())
        .create_async()
        .await;

    let client = CapabilityRegistryClient::new(http_transport(), Duration::from_secs(60));
    let first = client.discover(&wrapped.url()).await.unwrap();
    let second = client.discover(&bare.url()).await.unwrap();

    assert_eq!(*first, *second);
    assert_eq!(first.names(), ["alpha", "beta"]);
}

#[tokio::test]
async fn test_fresh_snapshot_is_served_from_cache() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/tools")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "tools": [descriptor("alpha")] }).to_string())
        .expect(1)
        .create_async()
        .await;

    let client = CapabilityRegistryClient::new(http_transport(), Duration::from_secs(60));
    client.snapshot(&server.url()).await.unwrap();
    client.snapshot(&server.url()).await.unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_rediscovery_replaces_instead_of_merging() {
    let (url, registry) = spawn_tool_server(vec![
        scored("concentration_risk", 0, 10),
        scored("market_risk", 0, 20),
        scored("oracle_risk", 0, 30),
    ])
    .await;
    let client = CapabilityRegistryClient::new(http_transport(), Duration::from_secs(60));
    assert_eq!(client.discover(&url).await.unwrap().len(), 3);

    registry.replace_handlers(vec![scored("market_risk", 0, 20)]).unwrap();
    let snapshot = client.discover(&url).await.unwrap();

    assert_eq!(snapshot.names(), ["market_risk"]);
    assert!(!snapshot.contains("oracle_risk"));
}

#[tokio::test]
async fn test_duplicate_tool_names_are_a_protocol_mismatch() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/tools")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([descriptor("alpha"), descriptor("alpha")]).to_string())
        .create_async()
        .await;

    let client = CapabilityRegistryClient::new(http_transport(), Duration::from_secs(60));
    let err = client.discover(&server.url()).await.unwrap_err();

    assert!(matches!(err, DiscoveryError::ProtocolMismatch(_)));
    assert!(client.cached(&server.url()).is_none());
}

#[tokio::test]
async fn test_invoke_validates_before_calling_remote() {
    let (url, _registry) = spawn_tool_server(vec![scored("market_risk", 0, 20)]).await;
    let client = CapabilityRegistryClient::new(http_transport(), Duration::from_secs(60));

    let err = client.invoke(&url, "market_risk", json!({})).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ValidationError);

    let err = client.invoke(&url, "unknown_tool", json!({})).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ToolNotFound);

    let value = client
        .invoke(&url, "market_risk", json!({ "pool_address": POOL }))
        .await
        .unwrap();
    assert_eq!(value["risk_score"], 20);
}

#[tokio::test]
async fn test_directory_resolves_served_card() {
    let agent = spawn_agent("pool_risk", vec![scored("concentration_risk", 0, 10)], vec![], default_planner()).await;
    let directory = AgentDirectory::new(
        http_transport(),
        vec![agent.endpoint("pool_risk")],
        Duration::from_secs(60),
    );

    let card = directory.resolve(&AgentId::new("pool_risk")).await.unwrap();
    assert_eq!(card.base_url, agent.base_url);
    assert_eq!(card.tools_endpoint(), format!("{}/registry", agent.base_url));
    assert!(directory.cached(&AgentId::new("pool_risk")).is_some());

    let err = directory.resolve(&AgentId::new("unknown")).await.unwrap_err();
    assert!(matches!(err, DirectoryError::NotFound(_)));
}

#[tokio::test]
async fn test_directory_rejects_incompatible_protocol() {
    let mut server = mockito::Server::new_async().await;
    let url = server.url();
    server
        .mock("GET", "/.well-known/agent.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "agent_id": "legacy",
                "name": "Legacy",
                "description": "",
                "base_url": url,
                "protocol_version": "2.0",
                "skills": []
            })
            .to_string(),
        )
        .create_async()
        .await;

    let endpoint = agentmesh_core::domain::config::AgentEndpointConfig {
        id: AgentId::new("legacy"),
        base_url: url,
        card_path: "/.well-known/agent.json".to_string(),
    };
    let directory = AgentDirectory::new(http_transport(), vec![endpoint], Duration::from_secs(60));

    let err = directory.resolve(&AgentId::new("legacy")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProtocolMismatch);
}
