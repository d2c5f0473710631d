// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Capability Registry (server role)
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Advertises an agent's own tools and executes a named tool
//!   after validating its arguments against the compiled schema. The handler
//!   set is swapped whole; a call in progress keeps the set it started with.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::capability::{SnapshotError, ToolDescriptor, ToolSnapshot};
use crate::domain::errors::InvocationError;
use crate::domain::protocol::ToolCallRequest;

/// Executes one tool. An `Err` message is reported to the caller as a
/// `RemoteExecutionError`.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn descriptor(&self) -> ToolDescriptor;

    async fn call(&self, arguments: Value) -> Result<Value, String>;
}

struct FnTool<F> {
    descriptor: ToolDescriptor,
    func: F,
}

#[async_trait]
impl<F, Fut> ToolHandler for FnTool<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, String>> + Send,
{
    fn descriptor(&self) -> ToolDescriptor {
        self.descriptor.clone()
    }

    async fn call(&self, arguments: Value) -> Result<Value, String> {
        (self.func)(arguments).await
    }
}

/// Wraps an async closure as a tool handler.
pub fn tool_fn<F, Fut>(descriptor: ToolDescriptor, func: F) -> Arc<dyn ToolHandler>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, String>> + Send + 'static,
{
    Arc::new(FnTool { descriptor, func })
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid tool set: {0}")]
    InvalidToolSet(#[from] SnapshotError),
}

struct RegistryState {
    snapshot: ToolSnapshot,
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl RegistryState {
    fn build(handlers: Vec<Arc<dyn ToolHandler>>) -> Result<Self, RegistryError> {
        let descriptors = handlers.iter().map(|h| h.descriptor()).collect();
        let snapshot = ToolSnapshot::build(descriptors)?;
        let handlers = handlers
            .into_iter()
            .map(|h| (h.descriptor().name, h))
            .collect();
        Ok(Self { snapshot, handlers })
    }
}

pub struct CapabilityRegistry {
    state: RwLock<Arc<RegistryState>>,
    execution_timeout: Duration,
}

impl CapabilityRegistry {
    pub fn new(handlers: Vec<Arc<dyn ToolHandler>>) -> Result<Self, RegistryError> {
        Ok(Self {
            state: RwLock::new(Arc::new(RegistryState::build(handlers)?)),
            execution_timeout: Duration::from_secs(30),
        })
    }

    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout = timeout;
        self
    }

    /// Replaces the whole tool set. On error the previous set stays.
    pub fn replace_handlers(&self, handlers: Vec<Arc<dyn ToolHandler>>) -> Result<(), RegistryError> {
        let next = Arc::new(RegistryState::build(handlers)?);
        *self.state.write() = next;
        Ok(())
    }

    fn current(&self) -> Arc<RegistryState> {
        self.state.read().clone()
    }

    /// Sorted by name.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.current().snapshot.descriptors().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.current().snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub async fn execute(&self, request: ToolCallRequest) -> Result<Value, InvocationError> {
        let state = self.current();
        state
            .snapshot
            .validate_arguments(&request.tool_name, &request.arguments)?;
        let handler = state
            .handlers
            .get(&request.tool_name)
            .ok_or_else(|| InvocationError::tool_not_found(&request.tool_name))?;

        debug!(tool = %request.tool_name, "Executing tool");
        match tokio::time::timeout(self.execution_timeout, handler.call(request.arguments)).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(message)) => {
                warn!(tool = %request.tool_name, error = %message, "Tool execution failed");
                Err(InvocationError::remote(message))
            }
            Err(_) => Err(InvocationError::timeout(self.execution_timeout.as_millis())),
        }
    }
}
