// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Shared fixtures: real agent services on loopback ports and an
//! orchestrator wired to them over HTTP.

#![allow(dead_code)]

use agentmesh_core::application::agent_directory::AgentDirectory;
use agentmesh_core::application::agent_service::AgentService;
use agentmesh_core::application::aggregator::ResultAggregator;
use agentmesh_core::application::capability_client::CapabilityRegistryClient;
use agentmesh_core::application::capability_registry::{tool_fn, CapabilityRegistry, ToolHandler};
use agentmesh_core::application::catalog_planner::CatalogPlanner;
use agentmesh_core::application::coordinator::{ExecutionCoordinator, ExecutionPolicy};
use agentmesh_core::application::orchestrator::OrchestratorWorkflow;
use agentmesh_core::domain::agent::{AgentCard, AgentId, AgentSkill, DEFAULT_CARD_PATH, PROTOCOL_VERSION};
use agentmesh_core::domain::capability::ToolDescriptor;
use agentmesh_core::domain::config::AgentEndpointConfig;
use agentmesh_core::domain::planner::Planner;
use agentmesh_core::infrastructure::http_transport::HttpAgentTransport;
use agentmesh_core::infrastructure::local_transport::LocalTransport;
use agentmesh_core::presentation::agent_api::{agent_router, tool_server_router};
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

pub const POOL: &str = "0xpool";

pub struct AgentFixture {
    pub base_url: String,
    pub registry: Arc<CapabilityRegistry>,
}

impl AgentFixture {
    pub fn endpoint(&self, id: &str) -> AgentEndpointConfig {
        AgentEndpointConfig {
            id: AgentId::new(id),
            base_url: self.base_url.clone(),
            card_path: DEFAULT_CARD_PATH.to_string(),
        }
    }
}

pub fn pool_schema() -> Value {
    json!({
        "type": "object",
        "properties": { "pool_address": { "type": "string" } },
        "required": ["pool_address"]
    })
}

/// Tool that sleeps `delay_ms` and then returns `outcome`.
pub fn tool(name: &str, delay_ms: u64, outcome: Result<Value, String>) -> Arc<dyn ToolHandler> {
    tool_fn(
        ToolDescriptor::new(name, format!("{} analysis", name), pool_schema()),
        move |_| {
            let outcome = outcome.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                outcome
            }
        },
    )
}

pub fn scored(name: &str, delay_ms: u64, risk_score: u64) -> Arc<dyn ToolHandler> {
    tool(name, delay_ms, Ok(json!({ "risk_score": risk_score })))
}

pub fn skill(tag: &str) -> AgentSkill {
    AgentSkill {
        id: tag.to_string(),
        name: format!("{} assessment", tag),
        description: String::new(),
        tags: vec![tag.to_string()],
    }
}

/// Serves an agent (card, `/v1/invoke`) with its tool server nested under
/// `/registry` on an ephemeral loopback port.
pub async fn spawn_agent(
    id: &str,
    tools: Vec<Arc<dyn ToolHandler>>,
    skills: Vec<AgentSkill>,
    planner: Arc<dyn Planner>,
) -> AgentFixture {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let tools_url = format!("{}/registry", base_url);

    let registry = Arc::new(CapabilityRegistry::new(tools).unwrap());
    let local = Arc::new(LocalTransport::new());
    local.mount_registry(tools_url.clone(), registry.clone());

    let card = AgentCard {
        agent_id: AgentId::new(id),
        name: id.to_string(),
        description: format!("{} agent", id),
        base_url: base_url.clone(),
        tools_url: Some(tools_url),
        protocol_version: PROTOCOL_VERSION.to_string(),
        skills,
    };
    let service = Arc::new(AgentService::new(
        card,
        Arc::new(CapabilityRegistryClient::new(local, Duration::from_secs(60))),
        planner,
        Arc::new(ExecutionCoordinator::new(ExecutionPolicy::default())),
        Arc::new(ResultAggregator::new()),
    ));

    let app = agent_router(service).nest("/registry", tool_server_router(registry.clone()));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    AgentFixture { base_url, registry }
}

pub async fn spawn_tool_server(tools: Vec<Arc<dyn ToolHandler>>) -> (String, Arc<CapabilityRegistry>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let registry = Arc::new(CapabilityRegistry::new(tools).unwrap());
    let app = tool_server_router(registry.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (url, registry)
}

/// Serves a valid card but no capability registry; every tool listing 404s.
pub async fn spawn_card_only_agent(id: &str) -> AgentFixture {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let card = AgentCard {
        agent_id: AgentId::new(id),
        name: id.to_string(),
        description: format!("{} agent", id),
        base_url: base_url.clone(),
        tools_url: None,
        protocol_version: PROTOCOL_VERSION.to_string(),
        skills: vec![],
    };
    let app = Router::new().route(DEFAULT_CARD_PATH, get(move || async move { Json(card) }));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    AgentFixture {
        base_url,
        registry: Arc::new(CapabilityRegistry::new(vec![]).unwrap()),
    }
}

pub fn default_planner() -> Arc<dyn Planner> {
    Arc::new(CatalogPlanner::new())
}

pub fn http_transport() -> Arc<HttpAgentTransport> {
    Arc::new(HttpAgentTransport::new(Duration::from_secs(2)).unwrap())
}

pub fn orchestrator(endpoints: Vec<AgentEndpointConfig>, policy: ExecutionPolicy) -> OrchestratorWorkflow {
    let transport = http_transport();
    let ttl = Duration::from_secs(60);
    OrchestratorWorkflow::new(
        Arc::new(AgentDirectory::new(transport.clone(), endpoints, ttl)),
        Arc::new(CapabilityRegistryClient::new(transport.clone(), ttl)),
        transport,
        default_planner(),
        Arc::new(ExecutionCoordinator::new(policy)),
        Arc::new(ResultAggregator::new()),
    )
}
