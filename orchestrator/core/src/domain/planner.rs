// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Planner and answer-synthesis ports.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Black-box collaborators injected into the workflow. A
//!   planner turns a question and a capability set into a plan; a
//!   synthesizer turns per-source results into prose.

use async_trait::async_trait;

use crate::domain::capability::CapabilitySet;
use crate::domain::plan::{PlanOutcome, Question};
use crate::domain::result::InvocationReport;

#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(
        &self,
        question: &Question,
        capabilities: &CapabilitySet,
    ) -> Result<PlanOutcome, PlannerError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlannerError {
    #[error("planner unavailable: {0}")]
    Unavailable(String),

    #[error("planner returned a malformed plan: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait AnswerSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        question: &Question,
        reports: &[InvocationReport],
    ) -> Result<String, SynthesisError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("answer synthesis failed: {0}")]
pub struct SynthesisError(pub String);
