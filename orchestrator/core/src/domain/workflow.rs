// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Orchestrator workflow state machine.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Legal transitions between the steps of one orchestration
//!   request, with `Errored` absorbing and a degraded shortcut from a failed
//!   discovery or planning step straight to `Aggregated`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::{DomainError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum WorkflowState {
    ReceivedQuestion,
    DirectoryResolved,
    CapabilitiesDiscovered,
    Planned,
    Executing,
    Aggregated,
    Responded,
    Errored(ErrorKind),
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowState::Responded | WorkflowState::Errored(_))
    }

    pub fn can_transition_to(&self, next: &WorkflowState) -> bool {
        use WorkflowState::*;
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (_, Errored(_)) => true,
            (ReceivedQuestion, DirectoryResolved) => true,
            (DirectoryResolved, CapabilitiesDiscovered) => true,
            (DirectoryResolved, Aggregated) => true,
            (CapabilitiesDiscovered, Planned) => true,
            (CapabilitiesDiscovered, Aggregated) => true,
            (Planned, Executing) => true,
            (Planned, Aggregated) => true,
            (Executing, Aggregated) => true,
            (Aggregated, Responded) => true,
            _ => false,
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowState::ReceivedQuestion => write!(f, "ReceivedQuestion"),
            WorkflowState::DirectoryResolved => write!(f, "DirectoryResolved"),
            WorkflowState::CapabilitiesDiscovered => write!(f, "CapabilitiesDiscovered"),
            WorkflowState::Planned => write!(f, "Planned"),
            WorkflowState::Executing => write!(f, "Executing"),
            WorkflowState::Aggregated => write!(f, "Aggregated"),
            WorkflowState::Responded => write!(f, "Responded"),
            WorkflowState::Errored(kind) => write!(f, "Errored({})", kind),
        }
    }
}

/// Visited states of one request plus its degradation notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowTrace {
    history: Vec<WorkflowState>,
    degraded: bool,
    notes: Vec<String>,
}

impl Default for WorkflowTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowTrace {
    pub fn new() -> Self {
        Self {
            history: vec![WorkflowState::ReceivedQuestion],
            degraded: false,
            notes: Vec::new(),
        }
    }

    pub fn current(&self) -> WorkflowState {
        self.history
            .last()
            .copied()
            .unwrap_or(WorkflowState::ReceivedQuestion)
    }

    pub fn history(&self) -> &[WorkflowState] {
        &self.history
    }

    pub fn advance(&mut self, next: WorkflowState) -> Result<(), DomainError> {
        let current = self.current();
        if !current.can_transition_to(&next) {
            return Err(DomainError::InvalidStateTransition {
                from: current.to_string(),
                to: next.to_string(),
            });
        }
        self.history.push(next);
        Ok(())
    }

    /// Records a note without marking the request degraded.
    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn degrade(&mut self, note: impl Into<String>) {
        self.degraded = true;
        self.notes.push(note.into());
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn take_notes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut trace = WorkflowTrace::new();
        for next in [
            WorkflowState::DirectoryResolved,
            WorkflowState::CapabilitiesDiscovered,
            WorkflowState::Planned,
            WorkflowState::Executing,
            WorkflowState::Aggregated,
            WorkflowState::Responded,
        ] {
            trace.advance(next).unwrap();
        }
        assert!(trace.current().is_terminal());
        assert_eq!(trace.history().len(), 7);
    }

    #[test]
    fn test_errored_is_absorbing() {
        let mut trace = WorkflowTrace::new();
        trace
            .advance(WorkflowState::Errored(ErrorKind::NoAgentsAvailable))
            .unwrap();
        assert!(trace.advance(WorkflowState::DirectoryResolved).is_err());
        assert!(trace
            .advance(WorkflowState::Errored(ErrorKind::NoCapabilities))
            .is_err());
    }

    #[test]
    fn test_degraded_shortcut_and_illegal_jumps() {
        let mut trace = WorkflowTrace::new();
        assert!(trace.advance(WorkflowState::Executing).is_err());
        trace.advance(WorkflowState::DirectoryResolved).unwrap();
        trace.advance(WorkflowState::CapabilitiesDiscovered).unwrap();
        trace.degrade("planner unavailable");
        trace.advance(WorkflowState::Aggregated).unwrap();
        assert!(trace.advance(WorkflowState::Executing).is_err());
        assert!(trace.is_degraded());
        assert_eq!(trace.notes(), ["planner unavailable".to_string()]);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(
            WorkflowState::Errored(ErrorKind::NoCapabilities).to_string(),
            "Errored(NoCapabilities)"
        );
    }
}
