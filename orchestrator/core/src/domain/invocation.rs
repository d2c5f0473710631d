// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! A single tool or agent call and its lifecycle.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Monotonic status machine
//!   `pending -> running -> {succeeded | failed | timed-out}`; an invocation
//!   still pending when its request is cancelled may go straight to `failed`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::domain::agent::AgentId;
use crate::domain::errors::{DomainError, ErrorKind, InvocationError};
use crate::domain::plan::CallTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationId(pub Uuid);

impl InvocationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvocationStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    TimedOut,
}

impl InvocationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InvocationStatus::Succeeded | InvocationStatus::Failed | InvocationStatus::TimedOut
        )
    }

    fn can_transition_to(&self, next: InvocationStatus) -> bool {
        use InvocationStatus::*;
        matches!(
            (self, next),
            (Pending, Running) | (Pending, Failed) | (Running, Succeeded) | (Running, Failed) | (Running, TimedOut)
        )
    }
}

impl fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InvocationStatus::Pending => "pending",
            InvocationStatus::Running => "running",
            InvocationStatus::Succeeded => "succeeded",
            InvocationStatus::Failed => "failed",
            InvocationStatus::TimedOut => "timed-out",
        };
        f.write_str(s)
    }
}

/// Group index and index within the group. Aggregation sorts on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlanPosition {
    pub group: usize,
    pub index: usize,
}

impl PlanPosition {
    pub fn new(group: usize, index: usize) -> Self {
        Self { group, index }
    }
}

#[derive(Debug, Clone)]
pub struct Invocation {
    pub id: InvocationId,
    pub position: PlanPosition,
    pub agent_id: AgentId,
    pub call: CallTarget,
    status: InvocationStatus,
    result: Option<Value>,
    error: Option<InvocationError>,
    attempts: u32,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl Invocation {
    pub fn new(position: PlanPosition, agent_id: AgentId, call: CallTarget) -> Self {
        Self {
            id: InvocationId::new(),
            position,
            agent_id,
            call,
            status: InvocationStatus::Pending,
            result: None,
            error: None,
            attempts: 0,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn status(&self) -> InvocationStatus {
        self.status
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&InvocationError> {
        self.error.as_ref()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.call.tool_name()
    }

    pub fn duration_ms(&self) -> Option<u64> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => u64::try_from((end - start).num_milliseconds()).ok(),
            _ => None,
        }
    }

    pub fn start(&mut self) -> Result<(), DomainError> {
        self.transition(InvocationStatus::Running)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    pub fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    /// Records the terminal outcome. A `Timeout` error lands in
    /// `timed-out`, every other error in `failed`.
    pub fn finish(&mut self, outcome: Result<Value, InvocationError>) -> Result<(), DomainError> {
        let next = match &outcome {
            Ok(_) => InvocationStatus::Succeeded,
            Err(e) if e.kind == ErrorKind::Timeout => InvocationStatus::TimedOut,
            Err(_) => InvocationStatus::Failed,
        };
        self.transition(next)?;
        self.completed_at = Some(Utc::now());
        match outcome {
            Ok(value) => self.result = Some(value),
            Err(error) => self.error = Some(error),
        }
        Ok(())
    }

    fn transition(&mut self, next: InvocationStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tool_name() {
            Some(tool) => write!(f, "{}@{}", tool, self.agent_id),
            None => write!(f, "agent {}", self.agent_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invocation() -> Invocation {
        Invocation::new(
            PlanPosition::new(0, 0),
            AgentId::new("pool_risk"),
            CallTarget::Tool {
                tool_name: "concentration_risk".into(),
                arguments: json!({}),
            },
        )
    }

    #[test]
    fn test_success_lifecycle() {
        let mut inv = invocation();
        assert_eq!(inv.status(), InvocationStatus::Pending);
        inv.start().unwrap();
        inv.record_attempt();
        inv.finish(Ok(json!({ "risk_score": 12 }))).unwrap();

        assert_eq!(inv.status(), InvocationStatus::Succeeded);
        assert_eq!(inv.attempts(), 1);
        assert!(inv.duration_ms().is_some());
        assert_eq!(inv.result().unwrap()["risk_score"], 12);
    }

    #[test]
    fn test_timeout_maps_to_timed_out() {
        let mut inv = invocation();
        inv.start().unwrap();
        inv.finish(Err(InvocationError::timeout(500))).unwrap();
        assert_eq!(inv.status(), InvocationStatus::TimedOut);
        assert_eq!(inv.error().unwrap().kind, ErrorKind::Timeout);
    }

    #[test]
    fn test_exactly_one_terminal_state() {
        let mut inv = invocation();
        inv.start().unwrap();
        inv.finish(Ok(json!(null))).unwrap();

        let err = inv.finish(Err(InvocationError::remote("late failure"))).unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition { .. }));
        assert_eq!(inv.status(), InvocationStatus::Succeeded);
        assert!(inv.error().is_none());
        assert!(inv.start().is_err());
    }

    #[test]
    fn test_pending_can_fail_on_cancellation_but_not_succeed() {
        let mut inv = invocation();
        assert!(inv.finish(Ok(json!(1))).is_err());
        inv.finish(Err(InvocationError::cancelled())).unwrap();
        assert_eq!(inv.status(), InvocationStatus::Failed);
        assert!(inv.duration_ms().is_none());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_value(InvocationStatus::TimedOut).unwrap(), json!("timed-out"));
        assert_eq!(InvocationStatus::TimedOut.to_string(), "timed-out");
    }
}
