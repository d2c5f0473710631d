// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Parallel Execution Coordinator
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Runs a plan group by group. Every invocation of a group is
//!   dispatched concurrently under a shared semaphore, each with its own
//!   timeout, and the group is awaited as a barrier before the next starts.
//!
//! A failed invocation never aborts its siblings. The failure policy decides
//! whether later groups still run. Cancellation stops dispatch, fails the
//! in-flight invocations with `Cancelled`, and keeps what already finished.

use async_trait::async_trait;
use futures::future::join_all;
use metrics::{counter, histogram};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::agent::AgentId;
use crate::domain::config::{ExecutionConfig, FailurePolicy};
use crate::domain::errors::{ErrorKind, InvocationError};
use crate::domain::invocation::{Invocation, InvocationStatus, PlanPosition};
use crate::domain::plan::{resolve_references, CallTarget, Plan};

/// Performs one call. Implementations decide how an agent id maps to an
/// endpoint.
#[async_trait]
pub trait InvocationDispatcher: Send + Sync {
    async fn dispatch(&self, agent_id: &AgentId, call: &CallTarget) -> Result<Value, InvocationError>;
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 1 disables retries
    pub max_attempts: u32,
    pub backoff: Duration,
    pub retry_on: Vec<ErrorKind>,
}

impl RetryPolicy {
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
            retry_on: Vec::new(),
        }
    }

    fn should_retry(&self, attempt: u32, error: &InvocationError) -> bool {
        attempt < self.max_attempts && self.retry_on.contains(&error.kind)
    }
}

#[derive(Debug, Clone)]
pub struct ExecutionPolicy {
    pub max_in_flight: usize,
    pub invocation_timeout: Duration,
    pub failure_policy: FailurePolicy,
    pub retry: RetryPolicy,
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self::from_config(&ExecutionConfig::default())
    }
}

impl ExecutionPolicy {
    pub fn from_config(config: &ExecutionConfig) -> Self {
        Self {
            max_in_flight: config.max_in_flight.max(1),
            invocation_timeout: Duration::from_millis(config.invocation_timeout_ms),
            failure_policy: config.failure_policy,
            retry: RetryPolicy {
                max_attempts: config.retry.max_attempts.max(1),
                backoff: Duration::from_millis(config.retry.backoff_ms),
                retry_on: config.retry.retry_on.clone(),
            },
        }
    }
}

/// Terminal invocations of one plan run, plus what did not run.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    pub invocations: Vec<Invocation>,
    pub skipped_groups: usize,
    pub cancelled: bool,
    pub notes: Vec<String>,
}

impl ExecutionReport {
    pub fn succeeded(&self) -> usize {
        self.invocations
            .iter()
            .filter(|i| i.status() == InvocationStatus::Succeeded)
            .count()
    }

    /// Gaps or cancellation mean the answer is assembled degraded.
    pub fn is_degraded(&self) -> bool {
        self.cancelled || self.skipped_groups > 0 || !self.notes.is_empty()
    }
}

pub struct ExecutionCoordinator {
    policy: ExecutionPolicy,
    permits: Arc<Semaphore>,
}

impl ExecutionCoordinator {
    pub fn new(policy: ExecutionPolicy) -> Self {
        let permits = Arc::new(Semaphore::new(policy.max_in_flight.max(1)));
        Self { policy, permits }
    }

    pub fn policy(&self) -> &ExecutionPolicy {
        &self.policy
    }

    pub async fn execute(
        &self,
        plan: &Plan,
        dispatcher: &dyn InvocationDispatcher,
        cancel: &CancellationToken,
    ) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        let mut produced: BTreeMap<String, Value> = BTreeMap::new();
        let total_groups = plan.groups().len();

        for (group_index, group) in plan.groups().iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                report.skipped_groups = total_groups - group_index;
                report.notes.push(format!(
                    "request cancelled before group {}; {} group(s) not run",
                    group_index, report.skipped_groups
                ));
                break;
            }

            let mut pending = Vec::with_capacity(group.len());
            for (index, planned) in group.invocations.iter().enumerate() {
                let call = match &planned.call {
                    CallTarget::Tool { tool_name, arguments } => {
                        let (arguments, gaps) = resolve_references(arguments, &produced);
                        for gap in gaps {
                            report.notes.push(format!(
                                "{} ran without the result of '{}', which did not succeed",
                                planned, gap
                            ));
                        }
                        CallTarget::Tool {
                            tool_name: tool_name.clone(),
                            arguments,
                        }
                    }
                    delegate => delegate.clone(),
                };
                pending.push(Invocation::new(
                    PlanPosition::new(group_index, index),
                    planned.agent_id.clone(),
                    call,
                ));
            }

            debug!(group = group_index, size = pending.len(), "Dispatching invocation group");
            let finished = join_all(
                pending
                    .into_iter()
                    .map(|invocation| self.run(invocation, dispatcher, cancel)),
            )
            .await;

            let group_failed = finished
                .iter()
                .any(|i| i.status() != InvocationStatus::Succeeded);
            for invocation in &finished {
                if let (Some(tool), Some(result)) = (invocation.tool_name(), invocation.result()) {
                    produced.insert(tool.to_string(), result.clone());
                }
            }
            report.invocations.extend(finished);

            let remaining = total_groups - group_index - 1;
            if cancel.is_cancelled() {
                report.cancelled = true;
                if remaining > 0 {
                    report.skipped_groups = remaining;
                    report.notes.push(format!(
                        "request cancelled during group {}; {} group(s) not run",
                        group_index, remaining
                    ));
                }
                break;
            }
            if group_failed && remaining > 0 && self.policy.failure_policy == FailurePolicy::AbortRemaining {
                warn!(group = group_index, skipped = remaining, "Group failed; aborting remaining groups");
                report.skipped_groups = remaining;
                report.notes.push(format!(
                    "group {} had failures; {} later group(s) skipped",
                    group_index, remaining
                ));
                break;
            }
        }

        info!(
            invocations = report.invocations.len(),
            succeeded = report.succeeded(),
            skipped_groups = report.skipped_groups,
            cancelled = report.cancelled,
            "Plan execution finished"
        );
        report
    }

    async fn run(
        &self,
        mut invocation: Invocation,
        dispatcher: &dyn InvocationDispatcher,
        cancel: &CancellationToken,
    ) -> Invocation {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            permit = Arc::clone(&self.permits).acquire_owned() => permit.ok(),
        };
        let Some(_permit) = permit else {
            record(&mut invocation, Err(InvocationError::cancelled()));
            return invocation;
        };

        if let Err(e) = invocation.start() {
            warn!(invocation = %invocation, error = %e, "Could not start invocation");
            return invocation;
        }

        let started = Instant::now();
        let outcome = self.attempt_with_retry(&mut invocation, dispatcher, cancel).await;
        histogram!("agentmesh_invocation_duration_seconds").record(started.elapsed().as_secs_f64());
        record(&mut invocation, outcome);
        invocation
    }

    async fn attempt_with_retry(
        &self,
        invocation: &mut Invocation,
        dispatcher: &dyn InvocationDispatcher,
        cancel: &CancellationToken,
    ) -> Result<Value, InvocationError> {
        let timeout = self.policy.invocation_timeout;
        loop {
            invocation.record_attempt();
            let attempt = invocation.attempts();
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(InvocationError::cancelled()),
                result = tokio::time::timeout(timeout, dispatcher.dispatch(&invocation.agent_id, &invocation.call)) => {
                    result.unwrap_or_else(|_| Err(InvocationError::timeout(timeout.as_millis())))
                }
            };

            match outcome {
                Err(e) if self.policy.retry.should_retry(attempt, &e) => {
                    warn!(invocation = %invocation, attempt, error = %e, "Retrying invocation");
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(InvocationError::cancelled()),
                        _ = tokio::time::sleep(self.policy.retry.backoff) => {}
                    }
                }
                other => return other,
            }
        }
    }
}

fn record(invocation: &mut Invocation, outcome: Result<Value, InvocationError>) {
    if let Err(e) = &outcome {
        debug!(invocation = %invocation, error = %e, "Invocation did not succeed");
    }
    if let Err(e) = invocation.finish(outcome) {
        warn!(invocation = %invocation, error = %e, "Dropped outcome for terminal invocation");
        return;
    }
    counter!("agentmesh_invocations_total", "status" => invocation.status().to_string()).increment(1);
}
