// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Aggregated answer and per-source provenance.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** The response value returned once per request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::agent::AgentId;
use crate::domain::errors::InvocationError;
use crate::domain::invocation::{Invocation, InvocationStatus, PlanPosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Complete,
    Partial,
    Failed,
}

impl OverallStatus {
    /// `failed` only if every invocation failed, `partial` if outcomes are
    /// mixed or the answer was assembled degraded, `complete` otherwise.
    /// No invocations at all counts as complete unless degraded.
    pub fn from_outcomes(succeeded: usize, unsuccessful: usize, degraded: bool) -> Self {
        match (succeeded, unsuccessful) {
            (0, n) if n > 0 => OverallStatus::Failed,
            (_, 0) if !degraded => OverallStatus::Complete,
            _ => OverallStatus::Partial,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Complete => "complete",
            OverallStatus::Partial => "partial",
            OverallStatus::Failed => "failed",
        }
    }
}

/// Terminal outcome of one invocation, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationReport {
    pub agent_id: AgentId,
    #[serde(
        rename = "tool",
        alias = "tool_name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tool_name: Option<String>,
    pub status: InvocationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<InvocationError>,
    pub position: PlanPosition,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl InvocationReport {
    pub fn succeeded(&self) -> bool {
        self.status == InvocationStatus::Succeeded
    }

    /// Source label: the tool name, or `agent:<id>` for delegations.
    pub fn source(&self) -> String {
        match &self.tool_name {
            Some(tool) => format!("{}@{}", tool, self.agent_id),
            None => format!("agent:{}", self.agent_id),
        }
    }

    /// Numeric `risk_score` carried by a successful result.
    pub fn risk_score(&self) -> Option<f64> {
        if !self.succeeded() {
            return None;
        }
        self.result.as_ref()?.get("risk_score")?.as_f64()
    }
}

impl From<&Invocation> for InvocationReport {
    fn from(invocation: &Invocation) -> Self {
        Self {
            agent_id: invocation.agent_id.clone(),
            tool_name: invocation.tool_name().map(str::to_string),
            status: invocation.status(),
            result: invocation.result().cloned(),
            error: invocation.error().cloned(),
            position: invocation.position,
            attempts: invocation.attempts(),
            duration_ms: invocation.duration_ms(),
        }
    }
}

/// Final response for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedResult {
    pub answer: String,
    pub per_agent_results: Vec<InvocationReport>,
    pub overall_status: OverallStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<f64>,
    pub degraded: bool,
    #[serde(default)]
    pub notes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_overall_status_rules() {
        assert_eq!(OverallStatus::from_outcomes(3, 0, false), OverallStatus::Complete);
        assert_eq!(OverallStatus::from_outcomes(2, 1, false), OverallStatus::Partial);
        assert_eq!(OverallStatus::from_outcomes(0, 2, false), OverallStatus::Failed);
        assert_eq!(OverallStatus::from_outcomes(0, 2, true), OverallStatus::Failed);
        assert_eq!(OverallStatus::from_outcomes(2, 0, true), OverallStatus::Partial);
        assert_eq!(OverallStatus::from_outcomes(0, 0, false), OverallStatus::Complete);
        assert_eq!(OverallStatus::from_outcomes(0, 0, true), OverallStatus::Partial);
    }

    #[test]
    fn test_risk_score_only_from_successes() {
        let mut report = InvocationReport {
            agent_id: AgentId::new("pool_risk"),
            tool_name: Some("concentration_risk".into()),
            status: InvocationStatus::Succeeded,
            result: Some(json!({ "risk_score": 42.5 })),
            error: None,
            position: PlanPosition::new(0, 0),
            attempts: 1,
            duration_ms: Some(10),
        };
        assert_eq!(report.risk_score(), Some(42.5));
        assert_eq!(report.source(), "concentration_risk@pool_risk");

        report.status = InvocationStatus::Failed;
        assert_eq!(report.risk_score(), None);
    }
}
