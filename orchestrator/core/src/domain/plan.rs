// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Plans: ordered invocation groups produced by a planner.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Immutable plan value, its validation against the current
//!   capability set, and `{"$from": tool}` result references between groups.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::domain::agent::AgentId;
use crate::domain::capability::CapabilitySet;

/// Key marking an argument that takes the result of an earlier tool.
pub const RESULT_REFERENCE_KEY: &str = "$from";

/// The user's question plus the domain identifiers that came with it
/// (for example `pool_address`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    #[serde(default)]
    pub identifiers: BTreeMap<String, Value>,
}

impl Question {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            identifiers: BTreeMap::new(),
        }
    }

    pub fn with_identifiers(mut self, identifiers: BTreeMap<String, Value>) -> Self {
        self.identifiers = identifiers;
        self
    }

    pub fn with_identifier(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.identifiers.insert(key.into(), value.into());
        self
    }
}

/// What a planned invocation calls on its agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallTarget {
    /// One named tool from the agent's capability registry.
    Tool {
        tool_name: String,
        #[serde(default)]
        arguments: Value,
    },
    /// The whole agent answers the question through `/v1/invoke`.
    Delegate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        question: Option<String>,
    },
}

impl CallTarget {
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            CallTarget::Tool { tool_name, .. } => Some(tool_name),
            CallTarget::Delegate { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedInvocation {
    pub agent_id: AgentId,
    #[serde(flatten)]
    pub call: CallTarget,
}

impl PlannedInvocation {
    pub fn tool(agent_id: impl Into<AgentId>, tool_name: impl Into<String>, arguments: Value) -> Self {
        Self {
            agent_id: agent_id.into(),
            call: CallTarget::Tool {
                tool_name: tool_name.into(),
                arguments,
            },
        }
    }

    pub fn delegate(agent_id: impl Into<AgentId>) -> Self {
        Self {
            agent_id: agent_id.into(),
            call: CallTarget::Delegate { question: None },
        }
    }
}

impl fmt::Display for PlannedInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.call {
            CallTarget::Tool { tool_name, .. } => write!(f, "{}@{}", tool_name, self.agent_id),
            CallTarget::Delegate { .. } => write!(f, "agent {}", self.agent_id),
        }
    }
}

/// Invocations that do not depend on each other and may run concurrently.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InvocationGroup {
    pub invocations: Vec<PlannedInvocation>,
}

impl InvocationGroup {
    pub fn new(invocations: Vec<PlannedInvocation>) -> Self {
        Self { invocations }
    }

    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("plan targets unknown agent '{0}'")]
    UnknownAgent(AgentId),

    #[error("plan names tool '{tool_name}' which agent '{agent_id}' does not advertise")]
    UnknownTool { agent_id: AgentId, tool_name: String },

    #[error("group {group} references '{reference}' which no earlier group produces")]
    ForwardReference { group: usize, reference: String },

    #[error("group {group} references '{reference}' which more than one earlier invocation produces")]
    AmbiguousReference { group: usize, reference: String },
}

/// Ordered invocation groups. Groups run strictly in sequence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Plan {
    reasoning: String,
    groups: Vec<InvocationGroup>,
}

impl Plan {
    /// Empty groups are dropped.
    pub fn new(reasoning: impl Into<String>, groups: Vec<InvocationGroup>) -> Self {
        Self {
            reasoning: reasoning.into(),
            groups: groups.into_iter().filter(|g| !g.is_empty()).collect(),
        }
    }

    pub fn single_group(reasoning: impl Into<String>, invocations: Vec<PlannedInvocation>) -> Self {
        Self::new(reasoning, vec![InvocationGroup::new(invocations)])
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn groups(&self) -> &[InvocationGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn invocation_count(&self) -> usize {
        self.groups.iter().map(InvocationGroup::len).sum()
    }

    /// Rejects plans naming an agent or tool absent from `capabilities`, and
    /// result references that no single earlier invocation satisfies.
    pub fn validate(&self, capabilities: &CapabilitySet) -> Result<(), PlanError> {
        let mut produced: HashMap<&str, usize> = HashMap::new();
        for (group_index, group) in self.groups.iter().enumerate() {
            for planned in &group.invocations {
                if !capabilities.contains_agent(&planned.agent_id) {
                    return Err(PlanError::UnknownAgent(planned.agent_id.clone()));
                }
                if let CallTarget::Tool { tool_name, arguments } = &planned.call {
                    if !capabilities.has_tool(&planned.agent_id, tool_name) {
                        return Err(PlanError::UnknownTool {
                            agent_id: planned.agent_id.clone(),
                            tool_name: tool_name.clone(),
                        });
                    }
                    for reference in result_references(arguments) {
                        match produced.get(reference.as_str()) {
                            None => {
                                return Err(PlanError::ForwardReference {
                                    group: group_index,
                                    reference,
                                })
                            }
                            Some(&count) if count > 1 => {
                                return Err(PlanError::AmbiguousReference {
                                    group: group_index,
                                    reference,
                                })
                            }
                            Some(_) => {}
                        }
                    }
                }
            }
            for tool_name in group.invocations.iter().filter_map(|p| p.call.tool_name()) {
                *produced.entry(tool_name).or_default() += 1;
            }
        }
        Ok(())
    }
}

/// Planner output. `NoPlan` is a valid, recoverable outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    Plan(Plan),
    NoPlan { reason: String },
}

fn as_reference(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) if map.len() == 1 => map.get(RESULT_REFERENCE_KEY)?.as_str(),
        _ => None,
    }
}

/// Tool names referenced anywhere inside `arguments`.
pub fn result_references(arguments: &Value) -> Vec<String> {
    let mut found = Vec::new();
    collect_references(arguments, &mut found);
    found
}

fn collect_references(value: &Value, found: &mut Vec<String>) {
    if let Some(name) = as_reference(value) {
        found.push(name.to_string());
        return;
    }
    match value {
        Value::Object(map) => map.values().for_each(|v| collect_references(v, found)),
        Value::Array(items) => items.iter().for_each(|v| collect_references(v, found)),
        _ => {}
    }
}

/// Substitutes every reference with the named tool's result. References
/// with no available result become `null` and are returned as gaps.
pub fn resolve_references(arguments: &Value, results: &BTreeMap<String, Value>) -> (Value, Vec<String>) {
    let mut gaps = Vec::new();
    let resolved = substitute(arguments, results, &mut gaps);
    (resolved, gaps)
}

fn substitute(value: &Value, results: &BTreeMap<String, Value>, gaps: &mut Vec<String>) -> Value {
    if let Some(name) = as_reference(value) {
        return match results.get(name) {
            Some(result) => result.clone(),
            None => {
                gaps.push(name.to_string());
                Value::Null
            }
        };
    }
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute(v, results, gaps)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute(v, results, gaps)).collect()),
        other => other.clone(),
    }
}
