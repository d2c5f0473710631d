// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Capability Registry Client
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Discovers a remote endpoint's tools, caches the compiled
//!   snapshot with a TTL, and validates arguments locally before invoking.
//!
//! Each discovery replaces the endpoint's snapshot wholesale. A listing with
//! duplicate names or an uncompilable schema is rejected as a protocol
//! mismatch and nothing is cached for it.

use metrics::counter;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::capability::ToolSnapshot;
use crate::domain::errors::{DiscoveryError, ErrorKind, InvocationError};
use crate::domain::protocol::ToolCallRequest;
use crate::domain::transport::AgentTransport;
use crate::infrastructure::cache::SnapshotCache;

pub struct CapabilityRegistryClient {
    transport: Arc<dyn AgentTransport>,
    snapshots: SnapshotCache<String, ToolSnapshot>,
}

impl CapabilityRegistryClient {
    pub fn new(transport: Arc<dyn AgentTransport>, ttl: Duration) -> Self {
        Self {
            transport,
            snapshots: SnapshotCache::new(ttl),
        }
    }

    /// Fetches the full tool list and replaces the cached snapshot.
    pub async fn discover(&self, endpoint: &str) -> Result<Arc<ToolSnapshot>, DiscoveryError> {
        let outcome = self.fetch_snapshot(endpoint).await;
        match &outcome {
            Ok(snapshot) => {
                counter!("agentmesh_discovery_total", "outcome" => "ok").increment(1);
                info!(endpoint = %endpoint, tools = snapshot.len(), "Discovered tools");
            }
            Err(e) => {
                counter!("agentmesh_discovery_total", "outcome" => e.kind().as_str()).increment(1);
                warn!(endpoint = %endpoint, error = %e, "Tool discovery failed");
                self.snapshots.invalidate(&endpoint.to_string());
            }
        }
        outcome
    }

    async fn fetch_snapshot(&self, endpoint: &str) -> Result<Arc<ToolSnapshot>, DiscoveryError> {
        let descriptors = self.transport.list_tools(endpoint).await?;
        let snapshot = ToolSnapshot::build(descriptors)
            .map_err(|e| DiscoveryError::ProtocolMismatch(e.to_string()))?;
        Ok(self.snapshots.replace(endpoint.to_string(), snapshot))
    }

    /// Cached snapshot if still fresh, otherwise a new discovery.
    pub async fn snapshot(&self, endpoint: &str) -> Result<Arc<ToolSnapshot>, DiscoveryError> {
        match self.cached(endpoint) {
            Some(snapshot) => {
                debug!(endpoint = %endpoint, "Using cached tool snapshot");
                Ok(snapshot)
            }
            None => self.discover(endpoint).await,
        }
    }

    pub fn cached(&self, endpoint: &str) -> Option<Arc<ToolSnapshot>> {
        self.snapshots.get(&endpoint.to_string())
    }

    pub fn invalidate(&self, endpoint: &str) {
        self.snapshots.invalidate(&endpoint.to_string());
    }

    pub fn invalidate_all(&self) {
        self.snapshots.invalidate_all();
    }

    /// Validates `arguments` against the cached schema, discovering first
    /// when nothing fresh is cached, then calls the tool. Schema mismatches
    /// and unknown tools fail without a network round-trip.
    pub async fn invoke(
        &self,
        endpoint: &str,
        tool_name: &str,
        arguments: Value,
    ) -> Result<Value, InvocationError> {
        let snapshot = self.snapshot(endpoint).await?;
        snapshot.validate_arguments(tool_name, &arguments)?;

        let request = ToolCallRequest {
            tool_name: tool_name.to_string(),
            arguments,
        };
        let outcome = self.transport.call_tool(endpoint, &request).await;
        if let Err(e) = &outcome {
            if e.kind == ErrorKind::ToolNotFound {
                // remote set changed since the snapshot was taken
                self.invalidate(endpoint);
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::AgentCard;
    use crate::domain::capability::ToolDescriptor;
    use crate::domain::protocol::{AgentInvokeRequest, AgentInvokeResponse};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct ScriptedTransport {
        listings: Mutex<Vec<Result<Vec<ToolDescriptor>, DiscoveryError>>>,
        list_calls: AtomicUsize,
        tool_calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn push(&self, listing: Result<Vec<ToolDescriptor>, DiscoveryError>) {
            self.listings.lock().push(listing);
        }
    }

    #[async_trait]
    impl AgentTransport for ScriptedTransport {
        async fn fetch_card(&self, _: &str) -> Result<AgentCard, DiscoveryError> {
            Err(DiscoveryError::Unreachable("unused".into()))
        }

        async fn list_tools(&self, _: &str) -> Result<Vec<ToolDescriptor>, DiscoveryError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.listings.lock().remove(0)
        }

        async fn call_tool(&self, _: &str, request: &ToolCallRequest) -> Result<Value, InvocationError> {
            self.tool_calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!({ "tool": request.tool_name }))
        }

        async fn ask_agent(
            &self,
            _: &str,
            _: &AgentInvokeRequest,
        ) -> Result<AgentInvokeResponse, InvocationError> {
            Err(InvocationError::unreachable("unused"))
        }
    }

    fn tool(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(
            name,
            "",
            json!({
                "type": "object",
                "properties": { "pool_address": { "type": "string" } },
                "required": ["pool_address"]
            }),
        )
    }

    #[tokio::test]
    async fn test_rediscovery_replaces_snapshot() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push(Ok(vec![tool("a"), tool("b"), tool("c")]));
        transport.push(Ok(vec![tool("b")]));
        let client = CapabilityRegistryClient::new(transport.clone(), Duration::from_secs(60));

        assert_eq!(client.discover("http://agent").await.unwrap().len(), 3);
        let second = client.discover("http://agent").await.unwrap();
        assert_eq!(second.names(), vec!["b"]);
        assert_eq!(client.cached("http://agent").unwrap().names(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_duplicate_names_are_protocol_mismatch() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push(Ok(vec![tool("a"), tool("a")]));
        let client = CapabilityRegistryClient::new(transport, Duration::from_secs(60));

        let err = client.discover("http://agent").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ProtocolMismatch);
        assert!(client.cached("http://agent").is_none());
    }

    #[tokio::test]
    async fn test_invoke_discovers_lazily_and_validates_locally() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push(Ok(vec![tool("concentration_risk")]));
        let client = CapabilityRegistryClient::new(transport.clone(), Duration::from_secs(60));

        let err = client
            .invoke("http://agent", "concentration_risk", json!({ "pool_address": 1 }))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValidationError);
        assert_eq!(transport.list_calls.load(Ordering::SeqCst), 1);
        assert_eq!(transport.tool_calls.load(Ordering::SeqCst), 0);

        let ok = client
            .invoke("http://agent", "concentration_risk", json!({ "pool_address": "0x1" }))
            .await
            .unwrap();
        assert_eq!(ok["tool"], "concentration_risk");
        // second call reused the cached snapshot
        assert_eq!(transport.list_calls.load(Ordering::SeqCst), 1);
        assert_eq!(transport.tool_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_snapshot_is_rediscovered() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push(Ok(vec![tool("a")]));
        transport.push(Ok(vec![tool("a"), tool("b")]));
        let client = CapabilityRegistryClient::new(transport.clone(), Duration::from_millis(20));

        client.snapshot("http://agent").await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(client.cached("http://agent").is_none());
        assert_eq!(client.snapshot("http://agent").await.unwrap().len(), 2);
        assert_eq!(transport.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_discovery_drops_cached_snapshot() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push(Ok(vec![tool("a")]));
        transport.push(Err(DiscoveryError::Unreachable("connection refused".into())));
        let client = CapabilityRegistryClient::new(transport, Duration::from_secs(60));

        client.discover("http://agent").await.unwrap();
        assert!(client.discover("http://agent").await.is_err());
        assert!(client.cached("http://agent").is_none());
    }
}
