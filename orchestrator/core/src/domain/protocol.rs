// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Request and response bodies exchanged between orchestrator, agent
//! services and tool servers.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Wire shapes only; behaviour lives in the application layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::agent::AgentId;
use crate::domain::capability::ToolDescriptor;
use crate::domain::errors::InvocationError;
use crate::domain::plan::Question;
use crate::domain::result::{InvocationReport, OverallStatus};

/// `GET /tools` body. Servers wrap the list; clients accept either form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolListing {
    Wrapped { tools: Vec<ToolDescriptor> },
    Bare(Vec<ToolDescriptor>),
}

impl ToolListing {
    pub fn into_tools(self) -> Vec<ToolDescriptor> {
        match self {
            ToolListing::Wrapped { tools } | ToolListing::Bare(tools) => tools,
        }
    }
}

/// `POST /tools/call` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub tool_name: String,
    #[serde(default = "empty_object")]
    pub arguments: Value,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolCallResponse {
    Failure { error: InvocationError },
    Success { result: Value },
}

impl ToolCallResponse {
    pub fn into_result(self) -> Result<Value, InvocationError> {
        match self {
            ToolCallResponse::Success { result } => Ok(result),
            ToolCallResponse::Failure { error } => Err(error),
        }
    }
}

impl From<Result<Value, InvocationError>> for ToolCallResponse {
    fn from(outcome: Result<Value, InvocationError>) -> Self {
        match outcome {
            Ok(result) => ToolCallResponse::Success { result },
            Err(error) => ToolCallResponse::Failure { error },
        }
    }
}

/// `POST /v1/invoke` body sent to an agent service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInvokeRequest {
    pub user_question: String,
    #[serde(flatten)]
    pub identifiers: BTreeMap<String, Value>,
}

impl AgentInvokeRequest {
    pub fn into_question(self) -> Question {
        let identifiers = self
            .identifiers
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .collect();
        Question::new(self.user_question).with_identifiers(identifiers)
    }
}

impl From<&Question> for AgentInvokeRequest {
    fn from(question: &Question) -> Self {
        Self {
            user_question: question.text.clone(),
            identifiers: question.identifiers.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInvokeResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<InvocationReport>,
    pub status: OverallStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<f64>,
}

/// `POST /v1/orchestrator/invoke` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_address: Option<String>,
    /// Restricts the candidate agents; all configured agents when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agents: Option<Vec<AgentId>>,
}

impl OrchestratorRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            pool_address: None,
            agents: None,
        }
    }

    pub fn question(&self) -> Question {
        let mut identifiers = BTreeMap::new();
        if let Some(address) = self.pool_address.as_deref().filter(|a| !a.trim().is_empty()) {
            identifiers.insert("pool_address".to_string(), Value::String(address.to_string()));
        }
        Question::new(self.query.clone()).with_identifiers(identifiers)
    }
}
