// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-process agent transport
//!
//! Serves capability registries and agent cards that live in the same
//! process, keyed by the endpoint string a card advertises. Used when an
//! agent service plans over its own registry without an HTTP hop, and by
//! tests.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::application::capability_registry::CapabilityRegistry;
use crate::domain::agent::AgentCard;
use crate::domain::capability::ToolDescriptor;
use crate::domain::errors::{DiscoveryError, InvocationError};
use crate::domain::protocol::{AgentInvokeRequest, AgentInvokeResponse, ToolCallRequest};
use crate::domain::transport::AgentTransport;

#[derive(Default)]
pub struct LocalTransport {
    registries: RwLock<HashMap<String, Arc<CapabilityRegistry>>>,
    cards: RwLock<HashMap<String, AgentCard>>,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount_registry(&self, endpoint: impl Into<String>, registry: Arc<CapabilityRegistry>) {
        self.registries.write().insert(endpoint.into(), registry);
    }

    pub fn unmount_registry(&self, endpoint: &str) {
        self.registries.write().remove(endpoint);
    }

    pub fn publish_card(&self, card_url: impl Into<String>, card: AgentCard) {
        self.cards.write().insert(card_url.into(), card);
    }

    fn registry(&self, endpoint: &str) -> Option<Arc<CapabilityRegistry>> {
        self.registries.read().get(endpoint).cloned()
    }
}

#[async_trait]
impl AgentTransport for LocalTransport {
    async fn fetch_card(&self, card_url: &str) -> Result<AgentCard, DiscoveryError> {
        self.cards
            .read()
            .get(card_url)
            .cloned()
            .ok_or_else(|| DiscoveryError::Unreachable(format!("no local agent card at {}", card_url)))
    }

    async fn list_tools(&self, endpoint: &str) -> Result<Vec<ToolDescriptor>, DiscoveryError> {
        self.registry(endpoint)
            .map(|registry| registry.descriptors())
            .ok_or_else(|| DiscoveryError::Unreachable(format!("no local registry at {}", endpoint)))
    }

    async fn call_tool(
        &self,
        endpoint: &str,
        request: &ToolCallRequest,
    ) -> Result<Value, InvocationError> {
        let registry = self.registry(endpoint).ok_or_else(|| {
            InvocationError::unreachable(format!("no local registry at {}", endpoint))
        })?;
        registry.execute(request.clone()).await
    }

    async fn ask_agent(
        &self,
        base_url: &str,
        _request: &AgentInvokeRequest,
    ) -> Result<AgentInvokeResponse, InvocationError> {
        Err(InvocationError::unreachable(format!(
            "agent delegation is not available in-process ({})",
            base_url
        )))
    }
}
