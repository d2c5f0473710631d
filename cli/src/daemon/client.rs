// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP client for communicating with the orchestrator API

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use agentmesh_core::domain::protocol::OrchestratorRequest;
use agentmesh_core::domain::result::AggregatedResult;

use super::base_url;

#[derive(Debug, Clone)]
pub struct OrchestratorClient {
    client: Client,
    base_url: String,
}

/// Agent listing as returned by `GET /v1/agents`.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentListing {
    pub agent_id: String,
    pub base_url: String,
    pub card_url: String,
    pub card_cached: bool,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    kind: String,
    message: String,
}

impl OrchestratorClient {
    pub fn new(host: &str, port: u16) -> Result<Self> {
        Self::with_base_url(base_url(host, port))
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            // Requests are bounded by the server's own request timeout
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub async fn ask(&self, request: &OrchestratorRequest) -> Result<AggregatedResult> {
        let response = self
            .client
            .post(format!("{}/v1/orchestrator/invoke", self.base_url))
            .json(request)
            .send()
            .await
            .context("Failed to reach orchestrator")?;

        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .context("Failed to parse orchestrator response");
        }

        let text = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorEnvelope>(&text) {
            Ok(envelope) if status == StatusCode::SERVICE_UNAVAILABLE => {
                anyhow::bail!("{}: {}", envelope.error.kind, envelope.error.message)
            }
            Ok(envelope) => anyhow::bail!("Request rejected ({}): {}", status, envelope.error.message),
            Err(_) => anyhow::bail!("Request failed ({}): {}", status, text),
        }
    }

    pub async fn list_agents(&self) -> Result<Vec<AgentListing>> {
        #[derive(Deserialize)]
        struct Listing {
            agents: Vec<AgentListing>,
        }

        let response = self
            .client
            .get(format!("{}/v1/agents", self.base_url))
            .send()
            .await
            .context("Failed to list agents")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to list agents: {}", error_text);
        }

        let listing: Listing = response
            .json()
            .await
            .context("Failed to parse agent listing")?;
        Ok(listing.agents)
    }

    pub async fn refresh_agents(&self) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/v1/agents/refresh", self.base_url))
            .send()
            .await
            .context("Failed to refresh agents")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to refresh agents: {}", error_text);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentmesh_core::domain::result::OverallStatus;
    use serde_json::json;

    #[tokio::test]
    async fn test_ask_parses_aggregated_result() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/orchestrator/invoke")
            .match_body(mockito::Matcher::PartialJson(json!({ "query": "concentration?" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "answer": "Results",
                    "per_agent_results": [],
                    "overall_status": "complete",
                    "degraded": false,
                    "notes": []
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = OrchestratorClient::with_base_url(server.url()).unwrap();
        let result = client.ask(&OrchestratorRequest::new("concentration?")).await.unwrap();

        assert_eq!(result.overall_status, OverallStatus::Complete);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_ask_surfaces_workflow_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/orchestrator/invoke")
            .with_status(503)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":{"kind":"NoAgentsAvailable","message":"no agents are configured"}}"#)
            .create_async()
            .await;

        let client = OrchestratorClient::with_base_url(server.url()).unwrap();
        let err = client.ask(&OrchestratorRequest::new("anything")).await.unwrap_err();

        assert!(err.to_string().starts_with("NoAgentsAvailable"));
    }

    #[tokio::test]
    async fn test_list_agents() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/agents")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({ "agents": [{
                    "agent_id": "pool_risk",
                    "base_url": "http://127.0.0.1:8101",
                    "card_url": "http://127.0.0.1:8101/.well-known/agent.json",
                    "card_cached": false
                }]})
                .to_string(),
            )
            .create_async()
            .await;

        let client = OrchestratorClient::with_base_url(server.url()).unwrap();
        let agents = client.list_agents().await.unwrap();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].agent_id, "pool_risk");
        assert!(!agents[0].card_cached);
    }
}
