// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Invocation dispatchers used by the coordinator.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Route a planned call to the right endpoint. Tool calls go
//!   through the capability registry client (local schema check first);
//!   delegations go to the agent's `/v1/invoke`.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::application::capability_client::CapabilityRegistryClient;
use crate::application::coordinator::InvocationDispatcher;
use crate::domain::agent::AgentId;
use crate::domain::capability::CapabilitySet;
use crate::domain::errors::InvocationError;
use crate::domain::plan::{CallTarget, Question};
use crate::domain::protocol::AgentInvokeRequest;
use crate::domain::result::OverallStatus;
use crate::domain::transport::AgentTransport;

struct AgentEndpoints {
    base_url: String,
    tools_url: String,
}

/// Dispatches to remote agents resolved for one request.
pub struct RemoteDispatcher {
    registry: Arc<CapabilityRegistryClient>,
    transport: Arc<dyn AgentTransport>,
    endpoints: BTreeMap<AgentId, AgentEndpoints>,
    question: Question,
}

impl RemoteDispatcher {
    pub fn new(
        registry: Arc<CapabilityRegistryClient>,
        transport: Arc<dyn AgentTransport>,
        capabilities: &CapabilitySet,
        question: Question,
    ) -> Self {
        let endpoints = capabilities
            .agents()
            .map(|(id, caps)| {
                (
                    id.clone(),
                    AgentEndpoints {
                        base_url: caps.card.base_url.clone(),
                        tools_url: caps.card.tools_endpoint().to_string(),
                    },
                )
            })
            .collect();
        Self {
            registry,
            transport,
            endpoints,
            question,
        }
    }
}

#[async_trait]
impl InvocationDispatcher for RemoteDispatcher {
    async fn dispatch(&self, agent_id: &AgentId, call: &CallTarget) -> Result<Value, InvocationError> {
        let endpoints = self.endpoints.get(agent_id).ok_or_else(|| {
            InvocationError::unreachable(format!("agent '{}' was not resolved for this request", agent_id))
        })?;

        match call {
            CallTarget::Tool { tool_name, arguments } => {
                self.registry
                    .invoke(&endpoints.tools_url, tool_name, arguments.clone())
                    .await
            }
            CallTarget::Delegate { question } => {
                let mut request = AgentInvokeRequest::from(&self.question);
                if let Some(text) = question {
                    request.user_question = text.clone();
                }
                let response = self.transport.ask_agent(&endpoints.base_url, &request).await?;
                if response.status == OverallStatus::Failed {
                    return Err(InvocationError::remote(response.answer));
                }
                serde_json::to_value(&response)
                    .map_err(|e| InvocationError::remote(format!("unserializable agent answer: {}", e)))
            }
        }
    }
}

/// Dispatches tool calls to a single registry endpoint. Used by an agent
/// service planning over its own tools.
pub struct ToolEndpointDispatcher {
    registry: Arc<CapabilityRegistryClient>,
    endpoint: String,
}

impl ToolEndpointDispatcher {
    pub fn new(registry: Arc<CapabilityRegistryClient>, endpoint: impl Into<String>) -> Self {
        Self {
            registry,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl InvocationDispatcher for ToolEndpointDispatcher {
    async fn dispatch(&self, _agent_id: &AgentId, call: &CallTarget) -> Result<Value, InvocationError> {
        match call {
            CallTarget::Tool { tool_name, arguments } => {
                self.registry
                    .invoke(&self.endpoint, tool_name, arguments.clone())
                    .await
            }
            CallTarget::Delegate { .. } => Err(InvocationError::remote(
                "an agent cannot delegate a question to itself",
            )),
        }
    }
}
