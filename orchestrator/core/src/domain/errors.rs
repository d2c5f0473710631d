// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Error taxonomy shared by discovery, invocation and the workflow.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Typed failures; invocation-level errors travel as data on
//!   the invocation, agent-level errors remove the agent from the candidate
//!   set, and only workflow errors surface as a non-2xx response.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::agent::AgentId;

/// Wire-visible failure kind. Serialized as the bare variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Unreachable,
    ProtocolMismatch,
    AgentNotFound,
    ToolNotFound,
    ValidationError,
    RemoteExecutionError,
    Timeout,
    Cancelled,
    NoAgentsAvailable,
    NoCapabilities,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unreachable => "Unreachable",
            ErrorKind::ProtocolMismatch => "ProtocolMismatch",
            ErrorKind::AgentNotFound => "AgentNotFound",
            ErrorKind::ToolNotFound => "ToolNotFound",
            ErrorKind::ValidationError => "ValidationError",
            ErrorKind::RemoteExecutionError => "RemoteExecutionError",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::Cancelled => "Cancelled",
            ErrorKind::NoAgentsAvailable => "NoAgentsAvailable",
            ErrorKind::NoCapabilities => "NoCapabilities",
        }
    }

    /// Transport-level kinds a retry policy may opt into.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorKind::Unreachable | ErrorKind::Timeout)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single tool or agent invocation.
///
/// Serializes as `{kind, message}`, the same shape the tool server puts
/// under `error` in a `/tools/call` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct InvocationError {
    pub kind: ErrorKind,
    pub message: String,
}

impl InvocationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn tool_not_found(tool_name: &str) -> Self {
        Self::new(
            ErrorKind::ToolNotFound,
            format!("tool '{}' is not registered", tool_name),
        )
    }

    pub fn validation(tool_name: &str, violations: &[String]) -> Self {
        Self::new(
            ErrorKind::ValidationError,
            format!(
                "arguments for '{}' do not match its input schema: {}",
                tool_name,
                violations.join("; ")
            ),
        )
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RemoteExecutionError, message)
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unreachable, message)
    }

    pub fn timeout(after_ms: u128) -> Self {
        Self::new(
            ErrorKind::Timeout,
            format!("no response within {}ms", after_ms),
        )
    }

    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "request cancelled before completion")
    }
}

/// Failure to list a remote endpoint's tools or read its agent card.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiscoveryError {
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("protocol mismatch: {0}")]
    ProtocolMismatch(String),
}

impl DiscoveryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiscoveryError::Unreachable(_) => ErrorKind::Unreachable,
            DiscoveryError::ProtocolMismatch(_) => ErrorKind::ProtocolMismatch,
        }
    }
}

impl From<DiscoveryError> for InvocationError {
    fn from(err: DiscoveryError) -> Self {
        InvocationError::new(err.kind(), err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("agent '{0}' is not configured")]
    NotFound(AgentId),

    #[error("agent '{agent_id}' unreachable: {reason}")]
    Unreachable { agent_id: AgentId, reason: String },

    #[error("agent '{agent_id}' speaks an incompatible protocol: {reason}")]
    ProtocolMismatch { agent_id: AgentId, reason: String },
}

impl DirectoryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DirectoryError::NotFound(_) => ErrorKind::AgentNotFound,
            DirectoryError::Unreachable { .. } => ErrorKind::Unreachable,
            DirectoryError::ProtocolMismatch { .. } => ErrorKind::ProtocolMismatch,
        }
    }
}

/// Request-level failures. These are the only outcomes that do not
/// produce an aggregated answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("no agents available: {0}")]
    NoAgentsAvailable(String),

    #[error("no capabilities discovered: {0}")]
    NoCapabilities(String),
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::NoAgentsAvailable(_) => ErrorKind::NoAgentsAvailable,
            WorkflowError::NoCapabilities(_) => ErrorKind::NoCapabilities,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },
}
