// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Transport port between the engine and remote agents.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Every network suspension point the engine has. HTTP lives
//!   in `infrastructure::http_transport`; in-process registries in
//!   `infrastructure::local_transport`.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::agent::AgentCard;
use crate::domain::capability::ToolDescriptor;
use crate::domain::errors::{DiscoveryError, InvocationError};
use crate::domain::protocol::{AgentInvokeRequest, AgentInvokeResponse, ToolCallRequest};

#[async_trait]
pub trait AgentTransport: Send + Sync {
    /// Reads the discovery document at `card_url`.
    async fn fetch_card(&self, card_url: &str) -> Result<AgentCard, DiscoveryError>;

    /// Lists every tool advertised by the registry at `endpoint`.
    async fn list_tools(&self, endpoint: &str) -> Result<Vec<ToolDescriptor>, DiscoveryError>;

    async fn call_tool(
        &self,
        endpoint: &str,
        request: &ToolCallRequest,
    ) -> Result<Value, InvocationError>;

    /// Asks a whole agent to answer a question.
    async fn ask_agent(
        &self,
        base_url: &str,
        request: &AgentInvokeRequest,
    ) -> Result<AgentInvokeResponse, InvocationError>;
}
