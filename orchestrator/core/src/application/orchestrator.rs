// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Orchestrator Workflow
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Binds directory resolution, tool discovery, planning,
//!   parallel execution and aggregation for one question, driving the
//!   `WorkflowState` machine.
//!
//! Agent-level failures shrink the candidate set and mark the answer
//! degraded. Only an empty candidate set (`NoAgentsAvailable`) or an empty
//! capability set (`NoCapabilities`) ends the request without an answer.

use futures::future::join_all;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::application::aggregator::{AggregationContext, ResultAggregator};
use crate::application::agent_directory::AgentDirectory;
use crate::application::capability_client::CapabilityRegistryClient;
use crate::application::coordinator::ExecutionCoordinator;
use crate::application::dispatch::RemoteDispatcher;
use crate::domain::agent::AgentId;
use crate::domain::capability::CapabilitySet;
use crate::domain::errors::{DomainError, WorkflowError};
use crate::domain::plan::{PlanOutcome, Question};
use crate::domain::planner::{Planner, PlannerError};
use crate::domain::protocol::OrchestratorRequest;
use crate::domain::result::AggregatedResult;
use crate::domain::transport::AgentTransport;
use crate::domain::workflow::{WorkflowState, WorkflowTrace};

/// Result of one request together with the states it went through.
#[derive(Debug)]
pub struct OrchestrationOutcome {
    pub request_id: Uuid,
    pub trace: WorkflowTrace,
    pub result: Result<AggregatedResult, WorkflowError>,
}

pub struct OrchestratorWorkflow {
    directory: Arc<AgentDirectory>,
    registry: Arc<CapabilityRegistryClient>,
    transport: Arc<dyn AgentTransport>,
    planner: Arc<dyn Planner>,
    coordinator: Arc<ExecutionCoordinator>,
    aggregator: Arc<ResultAggregator>,
    request_timeout: Duration,
}

impl OrchestratorWorkflow {
    pub fn new(
        directory: Arc<AgentDirectory>,
        registry: Arc<CapabilityRegistryClient>,
        transport: Arc<dyn AgentTransport>,
        planner: Arc<dyn Planner>,
        coordinator: Arc<ExecutionCoordinator>,
        aggregator: Arc<ResultAggregator>,
    ) -> Self {
        Self {
            directory,
            registry,
            transport,
            planner,
            coordinator,
            aggregator,
            request_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn directory(&self) -> &Arc<AgentDirectory> {
        &self.directory
    }

    pub fn registry(&self) -> &Arc<CapabilityRegistryClient> {
        &self.registry
    }

    /// Drops every cached card and tool snapshot.
    pub fn refresh(&self) {
        self.directory.invalidate_all();
        self.registry.invalidate_all();
    }

    pub async fn handle(&self, request: OrchestratorRequest, cancel: CancellationToken) -> OrchestrationOutcome {
        let request_id = Uuid::new_v4();
        let span = info_span!("orchestrate", request_id = %request_id);
        async move {
            let token = cancel.child_token();
            let _deadline = arm_deadline(token.clone(), self.request_timeout);

            let mut trace = WorkflowTrace::new();
            let result = self.run(&request, &mut trace, &token).await;
            let status = match &result {
                Ok(aggregated) => aggregated.overall_status.as_str(),
                Err(_) => "errored",
            };
            counter!("agentmesh_requests_total", "overall_status" => status).increment(1);
            info!(state = %trace.current(), status, degraded = trace.is_degraded(), "Request finished");

            OrchestrationOutcome {
                request_id,
                trace,
                result,
            }
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        request: &OrchestratorRequest,
        trace: &mut WorkflowTrace,
        cancel: &CancellationToken,
    ) -> Result<AggregatedResult, WorkflowError> {
        let question = request.question();
        info!(question = %question.text, "Received question");

        let candidates = self.candidates(request, trace);
        if candidates.is_empty() {
            let reason = match &request.agents {
                Some(requested) if !requested.is_empty() => "none of the requested agents are configured",
                _ => "no agents are configured",
            };
            let e = WorkflowError::NoAgentsAvailable(reason.to_string());
            advance(trace, WorkflowState::Errored(e.kind()));
            return Err(e);
        }
        let capabilities = match self.resolve_and_discover(&candidates, trace).await {
            Ok(capabilities) => capabilities,
            Err(e) => {
                advance(trace, WorkflowState::Errored(e.kind()));
                return Err(e);
            }
        };

        let planned = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PlannerError::Unavailable("request cancelled while planning".into())),
            outcome = self.planner.plan(&question, &capabilities) => outcome,
        };

        let plan = match planned {
            Ok(PlanOutcome::Plan(plan)) if !plan.is_empty() => match plan.validate(&capabilities) {
                Ok(()) => plan,
                Err(e) => {
                    warn!(error = %e, "Rejected plan");
                    trace.degrade(format!("plan rejected: {}", e));
                    return Ok(self.direct_answer(&question, "the plan named unavailable capabilities", &capabilities, trace));
                }
            },
            Ok(PlanOutcome::Plan(_)) => {
                advance(trace, WorkflowState::Planned);
                return Ok(self.direct_answer(&question, "the planner selected no tools", &capabilities, trace));
            }
            Ok(PlanOutcome::NoPlan { reason }) => {
                advance(trace, WorkflowState::Planned);
                return Ok(self.direct_answer(&question, &reason, &capabilities, trace));
            }
            Err(e) => {
                warn!(error = %e, "Planner failed; answering without a plan");
                trace.degrade(e.to_string());
                return Ok(self.direct_answer(&question, "planning was unavailable", &capabilities, trace));
            }
        };

        advance(trace, WorkflowState::Planned);
        info!(
            groups = plan.groups().len(),
            invocations = plan.invocation_count(),
            reasoning = %plan.reasoning(),
            "Plan accepted"
        );

        advance(trace, WorkflowState::Executing);
        let dispatcher = RemoteDispatcher::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.transport),
            &capabilities,
            question.clone(),
        );
        let execution = self.coordinator.execute(&plan, &dispatcher, cancel).await;
        if execution.cancelled {
            trace.degrade("request cancelled or timed out; remaining work was abandoned");
        }

        let context = AggregationContext {
            degraded: trace.is_degraded(),
            notes: trace.take_notes(),
        };
        let aggregated = self.aggregator.aggregate(&question, execution, context).await;
        advance(trace, WorkflowState::Aggregated);
        advance(trace, WorkflowState::Responded);
        Ok(aggregated)
    }

    fn candidates(&self, request: &OrchestratorRequest, trace: &mut WorkflowTrace) -> Vec<AgentId> {
        match &request.agents {
            Some(requested) if !requested.is_empty() => {
                let mut candidates = Vec::new();
                for agent_id in requested {
                    if self.directory.is_configured(agent_id) {
                        candidates.push(agent_id.clone());
                    } else {
                        trace.note(format!("agent '{}' is not configured; ignored", agent_id));
                    }
                }
                candidates
            }
            _ => self.directory.known_agents(),
        }
    }

    /// Resolves cards and discovers tools for every candidate concurrently.
    async fn resolve_and_discover(
        &self,
        candidates: &[AgentId],
        trace: &mut WorkflowTrace,
    ) -> Result<CapabilitySet, WorkflowError> {
        let resolved = join_all(candidates.iter().map(|id| self.directory.resolve(id))).await;
        let mut cards = Vec::new();
        for outcome in resolved {
            match outcome {
                Ok(card) => cards.push(card),
                Err(e) => {
                    warn!(error = %e, "Dropping agent from candidate set");
                    trace.degrade(e.to_string());
                }
            }
        }
        if cards.is_empty() {
            return Err(WorkflowError::NoAgentsAvailable(format!(
                "none of {} candidate agent(s) could be resolved",
                candidates.len()
            )));
        }
        advance(trace, WorkflowState::DirectoryResolved);

        let discovered = join_all(
            cards
                .iter()
                .map(|card| self.registry.snapshot(card.tools_endpoint())),
        )
        .await;
        let mut capabilities = CapabilitySet::new();
        for (card, outcome) in cards.into_iter().zip(discovered) {
            match outcome {
                Ok(tools) => capabilities.insert(card, tools),
                Err(e) => {
                    warn!(agent_id = %card.agent_id, error = %e, "Tool discovery failed; dropping agent");
                    trace.degrade(format!("agent '{}' capabilities unavailable: {}", card.agent_id, e));
                }
            }
        }
        if capabilities.is_empty() {
            return Err(WorkflowError::NoCapabilities(
                "capability discovery failed for every resolved agent".to_string(),
            ));
        }
        for name in capabilities.ambiguous_tool_names() {
            trace.note(format!("tool '{}' is offered by more than one agent", name));
        }
        advance(trace, WorkflowState::CapabilitiesDiscovered);
        info!(
            agents = capabilities.agents().count(),
            tools = capabilities.tool_count(),
            "Capabilities discovered"
        );
        Ok(capabilities)
    }

    fn direct_answer(
        &self,
        question: &Question,
        reason: &str,
        capabilities: &CapabilitySet,
        trace: &mut WorkflowTrace,
    ) -> AggregatedResult {
        let available: Vec<String> = capabilities.tools().map(|(_, tool)| tool.name.clone()).collect();
        let context = AggregationContext {
            degraded: trace.is_degraded(),
            notes: trace.take_notes(),
        };
        let result = self.aggregator.direct_answer(question, reason, &available, context);
        advance(trace, WorkflowState::Aggregated);
        advance(trace, WorkflowState::Responded);
        result
    }
}

fn advance(trace: &mut WorkflowTrace, next: WorkflowState) {
    if let Err(DomainError::InvalidStateTransition { from, to }) = trace.advance(next) {
        warn!(from = %from, to = %to, "Ignored illegal workflow transition");
    }
}

/// Cancels `token` after `after`. Dropping the guard cancels the token and
/// ends the timer task.
fn arm_deadline(token: CancellationToken, after: Duration) -> DropGuard {
    let watched = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = watched.cancelled() => {}
            _ = tokio::time::sleep(after) => {
                warn!(timeout_ms = after.as_millis() as u64, "Request deadline reached; cancelling");
                watched.cancel();
            }
        }
    });
    token.drop_guard()
}
