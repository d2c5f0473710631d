// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent service runtime.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Lets a domain agent answer `/v1/invoke` by planning over
//!   its own capability registry with the same plan/execute/aggregate
//!   engine the orchestrator uses.

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::application::aggregator::{AggregationContext, ResultAggregator};
use crate::application::capability_client::CapabilityRegistryClient;
use crate::application::coordinator::ExecutionCoordinator;
use crate::application::dispatch::ToolEndpointDispatcher;
use crate::domain::agent::AgentCard;
use crate::domain::capability::{CapabilitySet, ToolSnapshot};
use crate::domain::errors::DiscoveryError;
use crate::domain::plan::{PlanOutcome, Question};
use crate::domain::planner::Planner;
use crate::domain::protocol::{AgentInvokeRequest, AgentInvokeResponse};
use crate::domain::result::{AggregatedResult, OverallStatus};

/// Last known state of the agent's own capability registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RegistryStatus {
    Unknown,
    Available { tool_count: usize },
    Unavailable { reason: String },
}

pub struct AgentService {
    card: AgentCard,
    registry: Arc<CapabilityRegistryClient>,
    planner: Arc<dyn Planner>,
    coordinator: Arc<ExecutionCoordinator>,
    aggregator: Arc<ResultAggregator>,
    status: RwLock<RegistryStatus>,
}

impl AgentService {
    pub fn new(
        card: AgentCard,
        registry: Arc<CapabilityRegistryClient>,
        planner: Arc<dyn Planner>,
        coordinator: Arc<ExecutionCoordinator>,
        aggregator: Arc<ResultAggregator>,
    ) -> Self {
        Self {
            card,
            registry,
            planner,
            coordinator,
            aggregator,
            status: RwLock::new(RegistryStatus::Unknown),
        }
    }

    pub fn card(&self) -> &AgentCard {
        &self.card
    }

    pub fn registry_status(&self) -> RegistryStatus {
        self.status.read().clone()
    }

    fn record_status<T>(&self, outcome: &Result<Arc<ToolSnapshot>, T>)
    where
        T: std::fmt::Display,
    {
        let next = match outcome {
            Ok(snapshot) => RegistryStatus::Available {
                tool_count: snapshot.len(),
            },
            Err(e) => RegistryStatus::Unavailable {
                reason: e.to_string(),
            },
        };
        *self.status.write() = next;
    }

    /// Forces rediscovery of the agent's own tools.
    pub async fn refresh_tools(&self) -> Result<usize, DiscoveryError> {
        let outcome = self.registry.discover(self.card.tools_endpoint()).await;
        self.record_status(&outcome);
        let snapshot = outcome?;
        info!(agent_id = %self.card.agent_id, tools = snapshot.len(), "Refreshed tool registry");
        Ok(snapshot.len())
    }

    pub async fn tools(&self) -> Result<Arc<ToolSnapshot>, DiscoveryError> {
        let outcome = self.registry.snapshot(self.card.tools_endpoint()).await;
        self.record_status(&outcome);
        outcome
    }

    pub async fn invoke(&self, request: AgentInvokeRequest, cancel: &CancellationToken) -> AgentInvokeResponse {
        let question = request.into_question();
        let tools = match self.tools().await {
            Ok(tools) => tools,
            Err(e) => {
                warn!(agent_id = %self.card.agent_id, error = %e, "Tool registry unavailable");
                return AgentInvokeResponse {
                    answer: format!("Tool registry unavailable: {}", e),
                    sources: Vec::new(),
                    status: OverallStatus::Failed,
                    risk_score: None,
                };
            }
        };

        // no skills: the agent must not plan a delegation to itself
        let mut own = self.card.clone();
        own.skills.clear();
        let mut capabilities = CapabilitySet::new();
        capabilities.insert(Arc::new(own), tools);

        let result = self.answer(&question, &capabilities, cancel).await;
        AgentInvokeResponse {
            answer: result.answer,
            sources: result.per_agent_results,
            status: result.overall_status,
            risk_score: result.risk_score,
        }
    }

    async fn answer(
        &self,
        question: &Question,
        capabilities: &CapabilitySet,
        cancel: &CancellationToken,
    ) -> AggregatedResult {
        let available: Vec<String> = capabilities.tools().map(|(_, t)| t.name.clone()).collect();
        let mut context = AggregationContext::default();

        match self.planner.plan(question, capabilities).await {
            Ok(PlanOutcome::Plan(plan)) if !plan.is_empty() => match plan.validate(capabilities) {
                Ok(()) => {
                    let dispatcher = ToolEndpointDispatcher::new(
                        Arc::clone(&self.registry),
                        self.card.tools_endpoint(),
                    );
                    let execution = self.coordinator.execute(&plan, &dispatcher, cancel).await;
                    self.aggregator.aggregate(question, execution, context).await
                }
                Err(e) => {
                    context.degraded = true;
                    context.notes.push(format!("plan rejected: {}", e));
                    self.aggregator
                        .direct_answer(question, "the plan named unavailable tools", &available, context)
                }
            },
            Ok(PlanOutcome::Plan(_)) => {
                self.aggregator
                    .direct_answer(question, "no tools were selected", &available, context)
            }
            Ok(PlanOutcome::NoPlan { reason }) => {
                self.aggregator.direct_answer(question, &reason, &available, context)
            }
            Err(e) => {
                context.degraded = true;
                context.notes.push(e.to_string());
                self.aggregator
                    .direct_answer(question, "planning was unavailable", &available, context)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::capability_registry::{tool_fn, CapabilityRegistry};
    use crate::application::catalog_planner::CatalogPlanner;
    use crate::application::coordinator::ExecutionPolicy;
    use crate::domain::agent::{AgentId, PROTOCOL_VERSION};
    use crate::domain::capability::ToolDescriptor;
    use crate::infrastructure::local_transport::LocalTransport;
    use serde_json::json;
    use std::time::Duration;

    fn service(transport: Arc<LocalTransport>) -> AgentService {
        let card = AgentCard {
            agent_id: AgentId::new("pool_risk"),
            name: "Pool Risk".into(),
            description: String::new(),
            base_url: "local://pool_risk".into(),
            tools_url: Some("local://pool_risk/registry".into()),
            protocol_version: PROTOCOL_VERSION.into(),
            skills: vec![],
        };
        AgentService::new(
            card,
            Arc::new(CapabilityRegistryClient::new(transport, Duration::from_secs(60))),
            Arc::new(CatalogPlanner::new()),
            Arc::new(ExecutionCoordinator::new(ExecutionPolicy::default())),
            Arc::new(ResultAggregator::new()),
        )
    }

    fn registry() -> Arc<CapabilityRegistry> {
        let schema = json!({
            "type": "object",
            "properties": { "pool_address": { "type": "string" } },
            "required": ["pool_address"]
        });
        Arc::new(
            CapabilityRegistry::new(vec![
                tool_fn(ToolDescriptor::new("concentration_risk", "", schema.clone()), |_| async {
                    Ok(json!({ "risk_score": 30 }))
                }),
                tool_fn(ToolDescriptor::new("market_risk", "", schema), |_| async {
                    Ok(json!({ "risk_score": 50 }))
                }),
            ])
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_invoke_plans_over_own_tools() {
        let transport = Arc::new(LocalTransport::new());
        transport.mount_registry("local://pool_risk/registry", registry());
        let service = service(transport);

        let mut request = AgentInvokeRequest {
            user_question: "Give me the overall picture".into(),
            identifiers: Default::default(),
        };
        request.identifiers.insert("pool_address".into(), json!("0xpool"));

        let response = service.invoke(request, &CancellationToken::new()).await;
        assert_eq!(response.status, OverallStatus::Complete);
        assert_eq!(response.sources.len(), 2);
        assert_eq!(response.risk_score, Some(40.0));
        assert_eq!(service.registry_status(), RegistryStatus::Available { tool_count: 2 });
    }

    #[tokio::test]
    async fn test_unavailable_registry_fails_cleanly() {
        let service = service(Arc::new(LocalTransport::new()));
        let response = service
            .invoke(
                AgentInvokeRequest {
                    user_question: "concentration?".into(),
                    identifiers: Default::default(),
                },
                &CancellationToken::new(),
            )
            .await;
        assert_eq!(response.status, OverallStatus::Failed);
        assert!(matches!(service.registry_status(), RegistryStatus::Unavailable { .. }));
        assert!(service.refresh_tools().await.is_err());
    }
}
