// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Tool descriptors, compiled tool snapshots and the per-request capability
//! set handed to planners.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Typed tool registry keyed by name with compiled JSON Schema
//!   validators. Dispatch is a lookup plus a schema check.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::domain::agent::{AgentCard, AgentId};
use crate::domain::errors::InvocationError;

/// One invocable capability on an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_input_schema")]
    pub input_schema: Value,
}

fn default_input_schema() -> Value {
    serde_json::json!({ "type": "object" })
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    pub fn required_fields(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn property_names(&self) -> Vec<&str> {
        self.input_schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Fills schema properties missing from `explicit` with request
    /// identifiers of the same name. Explicit arguments win.
    pub fn bind_arguments(&self, identifiers: &BTreeMap<String, Value>, explicit: &Value) -> Value {
        let mut arguments = match explicit {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        for property in self.property_names() {
            if arguments.contains_key(property) {
                continue;
            }
            if let Some(value) = identifiers.get(property) {
                arguments.insert(property.to_string(), value.clone());
            }
        }
        Value::Object(arguments)
    }

    /// Required fields absent from `arguments`.
    pub fn missing_required(&self, arguments: &Value) -> Vec<String> {
        self.required_fields()
            .into_iter()
            .filter(|field| arguments.get(*field).map_or(true, Value::is_null))
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("duplicate tool name '{0}'")]
    DuplicateName(String),

    #[error("tool name cannot be empty")]
    EmptyName,

    #[error("tool '{name}' has an invalid input schema: {reason}")]
    InvalidSchema { name: String, reason: String },
}

struct RegisteredTool {
    descriptor: ToolDescriptor,
    validator: jsonschema::Validator,
}

/// Immutable, compiled set of tools advertised by one endpoint.
///
/// Built whole or not at all. Tools are keyed (and iterated) by name, so two
/// listings with the same content in a different order yield equal
/// snapshots.
pub struct ToolSnapshot {
    tools: BTreeMap<String, RegisteredTool>,
    fetched_at: DateTime<Utc>,
}

impl ToolSnapshot {
    pub fn build(descriptors: Vec<ToolDescriptor>) -> Result<Self, SnapshotError> {
        let mut tools = BTreeMap::new();
        for descriptor in descriptors {
            if descriptor.name.trim().is_empty() {
                return Err(SnapshotError::EmptyName);
            }
            if tools.contains_key(&descriptor.name) {
                return Err(SnapshotError::DuplicateName(descriptor.name));
            }
            let validator = jsonschema::validator_for(&descriptor.input_schema).map_err(|e| {
                SnapshotError::InvalidSchema {
                    name: descriptor.name.clone(),
                    reason: e.to_string(),
                }
            })?;
            tools.insert(
                descriptor.name.clone(),
                RegisteredTool {
                    descriptor,
                    validator,
                },
            );
        }
        Ok(Self {
            tools,
            fetched_at: Utc::now(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name).map(|t| &t.descriptor)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Checks `arguments` against the tool's compiled schema.
    pub fn validate_arguments(&self, name: &str, arguments: &Value) -> Result<(), InvocationError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| InvocationError::tool_not_found(name))?;
        let violations: Vec<String> = tool
            .validator
            .iter_errors(arguments)
            .map(|e| e.to_string())
            .collect();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(InvocationError::validation(name, &violations))
        }
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values().map(|t| &t.descriptor)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

impl PartialEq for ToolSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.tools.len() == other.tools.len()
            && self
                .descriptors()
                .zip(other.descriptors())
                .all(|(a, b)| a == b)
    }
}

impl fmt::Debug for ToolSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSnapshot")
            .field("tools", &self.names())
            .field("fetched_at", &self.fetched_at)
            .finish()
    }
}

/// Resolved card plus discovered tools for one agent.
#[derive(Debug, Clone)]
pub struct AgentCapabilities {
    pub card: Arc<AgentCard>,
    pub tools: Arc<ToolSnapshot>,
}

/// Everything the engine knows it can call for one request.
#[derive(Debug, Clone, Default)]
pub struct CapabilitySet {
    agents: BTreeMap<AgentId, AgentCapabilities>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, card: Arc<AgentCard>, tools: Arc<ToolSnapshot>) {
        self.agents
            .insert(card.agent_id.clone(), AgentCapabilities { card, tools });
    }

    pub fn get(&self, agent_id: &AgentId) -> Option<&AgentCapabilities> {
        self.agents.get(agent_id)
    }

    pub fn contains_agent(&self, agent_id: &AgentId) -> bool {
        self.agents.contains_key(agent_id)
    }

    pub fn has_tool(&self, agent_id: &AgentId, tool_name: &str) -> bool {
        self.agents
            .get(agent_id)
            .is_some_and(|caps| caps.tools.contains(tool_name))
    }

    pub fn agents(&self) -> impl Iterator<Item = (&AgentId, &AgentCapabilities)> {
        self.agents.iter()
    }

    pub fn cards(&self) -> impl Iterator<Item = &AgentCard> {
        self.agents.values().map(|caps| caps.card.as_ref())
    }

    /// Every `(agent, tool)` pair, ordered by agent then tool name.
    pub fn tools(&self) -> impl Iterator<Item = (&AgentId, &ToolDescriptor)> {
        self.agents
            .iter()
            .flat_map(|(id, caps)| caps.tools.descriptors().map(move |tool| (id, tool)))
    }

    pub fn tool_count(&self) -> usize {
        self.agents.values().map(|caps| caps.tools.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Tool names advertised by more than one agent.
    pub fn ambiguous_tool_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut ambiguous: Vec<String> = self
            .tools()
            .filter(|(_, tool)| !seen.insert(tool.name.as_str()))
            .map(|(_, tool)| tool.name.clone())
            .collect();
        ambiguous.sort();
        ambiguous.dedup();
        ambiguous
    }

    /// Plain-text catalog used in planner prompts.
    pub fn catalog_text(&self) -> String {
        let mut out = String::new();
        for (agent_id, caps) in &self.agents {
            out.push_str(&format!("Agent '{}' ({}):\n", agent_id, caps.card.name));
            if caps.tools.is_empty() {
                out.push_str("  (no tools; delegate the whole question)\n");
            }
            for tool in caps.tools.descriptors() {
                out.push_str(&format!(
                    "  - {}: {}\n    input_schema: {}\n",
                    tool.name, tool.description, tool.input_schema
                ));
            }
        }
        out
    }
}
