// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP agent transport
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** `AgentTransport` over JSON/HTTP with `reqwest`
//! - **Integration:** Orchestrator → agent card, tool registry and
//!   `/v1/invoke` endpoints
//!
//! Transport failures are mapped onto the engine's error taxonomy:
//! connection failures become `Unreachable`, client-side timeouts become
//! `Timeout`, and bodies that do not parse become `ProtocolMismatch`.
//! Per-invocation deadlines are enforced by the execution coordinator; the
//! client timeout here only bounds discovery requests.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::domain::agent::AgentCard;
use crate::domain::capability::ToolDescriptor;
use crate::domain::errors::{DiscoveryError, ErrorKind, InvocationError};
use crate::domain::protocol::{
    AgentInvokeRequest, AgentInvokeResponse, ToolCallRequest, ToolCallResponse, ToolListing,
};
use crate::domain::transport::AgentTransport;

pub struct HttpAgentTransport {
    client: Client,
    discovery_timeout: Duration,
}

impl HttpAgentTransport {
    pub fn new(discovery_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("agentmesh/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, discovery_timeout))
    }

    pub fn with_client(client: Client, discovery_timeout: Duration) -> Self {
        Self {
            client,
            discovery_timeout,
        }
    }

    async fn get_discovery<T: DeserializeOwned>(&self, url: &str) -> Result<T, DiscoveryError> {
        debug!(url = %url, "Fetching discovery document");
        let response = self
            .client
            .get(url)
            .timeout(self.discovery_timeout)
            .send()
            .await
            .map_err(|e| DiscoveryError::Unreachable(format!("{}: {}", url, e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(DiscoveryError::ProtocolMismatch(format!(
                "{} not found; endpoint does not speak the discovery protocol",
                url
            )));
        }
        if !status.is_success() {
            return Err(DiscoveryError::Unreachable(format!("{} returned HTTP {}", url, status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| DiscoveryError::Unreachable(format!("{}: {}", url, e)))?;
        serde_json::from_slice(&body)
            .map_err(|e| DiscoveryError::ProtocolMismatch(format!("{}: unexpected body: {}", url, e)))
    }
}

fn endpoint_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

fn invocation_error(err: reqwest::Error) -> InvocationError {
    if err.is_timeout() {
        InvocationError::new(ErrorKind::Timeout, err.to_string())
    } else if err.is_decode() {
        InvocationError::new(ErrorKind::ProtocolMismatch, err.to_string())
    } else {
        InvocationError::unreachable(err.to_string())
    }
}

#[async_trait]
impl AgentTransport for HttpAgentTransport {
    async fn fetch_card(&self, card_url: &str) -> Result<AgentCard, DiscoveryError> {
        self.get_discovery(card_url).await
    }

    async fn list_tools(&self, endpoint: &str) -> Result<Vec<ToolDescriptor>, DiscoveryError> {
        let listing: ToolListing = self.get_discovery(&endpoint_url(endpoint, "tools")).await?;
        Ok(listing.into_tools())
    }

    async fn call_tool(
        &self,
        endpoint: &str,
        request: &ToolCallRequest,
    ) -> Result<Value, InvocationError> {
        let url = endpoint_url(endpoint, "tools/call");
        debug!(url = %url, tool = %request.tool_name, "Calling tool");
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(invocation_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(invocation_error)?;
        match serde_json::from_slice::<ToolCallResponse>(&body) {
            Ok(parsed) => parsed.into_result(),
            Err(_) if status.is_server_error() => Err(InvocationError::remote(format!(
                "HTTP {}: {}",
                status,
                String::from_utf8_lossy(&body)
            ))),
            Err(e) => Err(InvocationError::new(
                ErrorKind::ProtocolMismatch,
                format!("HTTP {}: unexpected tool response: {}", status, e),
            )),
        }
    }

    async fn ask_agent(
        &self,
        base_url: &str,
        request: &AgentInvokeRequest,
    ) -> Result<AgentInvokeResponse, InvocationError> {
        let url = endpoint_url(base_url, "v1/invoke");
        debug!(url = %url, "Delegating question to agent");
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(invocation_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(InvocationError::remote(format!("HTTP {}: {}", status, text)));
        }
        response.json().await.map_err(invocation_error)
    }
}
