// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Orchestrator HTTP API
//!
//! # Architecture
//!
//! - **Layer:** Presentation Layer
//! - **Purpose:** `POST /v1/orchestrator/invoke` plus directory inspection
//!   and cache refresh. Only `NoAgentsAvailable` and `NoCapabilities` map to
//!   a non-2xx response; every other failure is carried inside the result.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::application::orchestrator::OrchestratorWorkflow;
use crate::domain::protocol::OrchestratorRequest;
use crate::presentation::error_response;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

struct AppState {
    workflow: Arc<OrchestratorWorkflow>,
    shutdown: CancellationToken,
    start_time: Instant,
}

/// Builds the orchestrator router. In-flight requests are cancelled when
/// `shutdown` fires.
pub fn orchestrator_router(workflow: Arc<OrchestratorWorkflow>, shutdown: CancellationToken) -> Router {
    let state = Arc::new(AppState {
        workflow,
        shutdown,
        start_time: Instant::now(),
    });

    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/orchestrator/invoke", post(invoke_handler))
        .route("/v1/agents", get(list_agents_handler))
        .route("/v1/agents/refresh", post(refresh_agents_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
        "agents_configured": state.workflow.directory().len(),
    }))
}

async fn invoke_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<OrchestratorRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, "BadRequest", rejection.body_text());
        }
    };
    if request.query.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "BadRequest", "query must not be empty");
    }

    let outcome = state.workflow.handle(request, state.shutdown.child_token()).await;
    let request_id = HeaderValue::from_str(&outcome.request_id.to_string()).ok();

    let mut response = match outcome.result {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => {
            warn!(request_id = %outcome.request_id, error = %e, "Request failed");
            error_response(StatusCode::SERVICE_UNAVAILABLE, e.kind().as_str(), e.to_string())
        }
    };
    if let Some(value) = request_id {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

async fn list_agents_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({ "agents": state.workflow.directory().entries() }))
}

async fn refresh_agents_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    state.workflow.refresh();
    info!("Agent cards and tool snapshots invalidated");
    Json(json!({
        "status": "ok",
        "agents_configured": state.workflow.directory().len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::agent_directory::AgentDirectory;
    use crate::application::aggregator::ResultAggregator;
    use crate::application::capability_client::CapabilityRegistryClient;
    use crate::application::capability_registry::{tool_fn, CapabilityRegistry};
    use crate::application::catalog_planner::CatalogPlanner;
    use crate::application::coordinator::{ExecutionCoordinator, ExecutionPolicy};
    use crate::domain::agent::{AgentCard, AgentId, DEFAULT_CARD_PATH, PROTOCOL_VERSION};
    use crate::domain::capability::ToolDescriptor;
    use crate::domain::config::AgentEndpointConfig;
    use crate::infrastructure::local_transport::LocalTransport;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;

    fn workflow(configured: bool) -> Arc<OrchestratorWorkflow> {
        let transport = Arc::new(LocalTransport::new());
        let endpoint = AgentEndpointConfig {
            id: AgentId::new("pool_risk"),
            base_url: "local://pool_risk".into(),
            card_path: DEFAULT_CARD_PATH.into(),
        };
        transport.publish_card(
            endpoint.card_url(),
            AgentCard {
                agent_id: AgentId::new("pool_risk"),
                name: "Pool Risk".into(),
                description: String::new(),
                base_url: "local://pool_risk".into(),
                tools_url: Some("local://pool_risk/registry".into()),
                protocol_version: PROTOCOL_VERSION.into(),
                skills: vec![],
            },
        );
        let schema = json!({
            "type": "object",
            "properties": { "pool_address": { "type": "string" } },
            "required": ["pool_address"]
        });
        transport.mount_registry(
            "local://pool_risk/registry",
            Arc::new(
                CapabilityRegistry::new(vec![tool_fn(
                    ToolDescriptor::new("concentration_risk", "Holder concentration", schema),
                    |_| async { Ok(json!({ "risk_score": 72 })) },
                )])
                .unwrap(),
            ),
        );

        let endpoints = if configured { vec![endpoint] } else { vec![] };
        let ttl = Duration::from_secs(60);
        Arc::new(OrchestratorWorkflow::new(
            Arc::new(AgentDirectory::new(transport.clone(), endpoints, ttl)),
            Arc::new(CapabilityRegistryClient::new(transport.clone(), ttl)),
            transport,
            Arc::new(CatalogPlanner::new()),
            Arc::new(ExecutionCoordinator::new(ExecutionPolicy::default())),
            Arc::new(ResultAggregator::new()),
        ))
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Option<HeaderValue>, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let request_id = response.headers().get(REQUEST_ID_HEADER).cloned();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, request_id, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_invoke_returns_aggregated_result() {
        let router = orchestrator_router(workflow(true), CancellationToken::new());
        let (status, request_id, body) = send(
            router,
            post_json(
                "/v1/orchestrator/invoke",
                r#"{"query": "What is the concentration risk?", "pool_address": "0xpool"}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(request_id.is_some());
        assert_eq!(body["overall_status"], "complete");
        assert_eq!(body["per_agent_results"].as_array().unwrap().len(), 1);
        assert_eq!(body["risk_score"], 72.0);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let router = orchestrator_router(workflow(true), CancellationToken::new());
        let (status, _, body) = send(router, post_json("/v1/orchestrator/invoke", r#"{"q": 1}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["kind"], "BadRequest");
    }

    #[tokio::test]
    async fn test_no_agents_is_service_unavailable() {
        let router = orchestrator_router(workflow(false), CancellationToken::new());
        let (status, _, body) = send(
            router,
            post_json("/v1/orchestrator/invoke", r#"{"query": "concentration?"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["kind"], "NoAgentsAvailable");
    }

    #[tokio::test]
    async fn test_agents_listing_and_refresh() {
        let workflow = workflow(true);
        workflow.directory().resolve(&AgentId::new("pool_risk")).await.unwrap();
        let router = orchestrator_router(workflow.clone(), CancellationToken::new());

        let (status, _, body) = send(
            router.clone(),
            Request::builder().uri("/v1/agents").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["agents"][0]["agent_id"], "pool_risk");
        assert_eq!(body["agents"][0]["card_cached"], true);

        let (status, _, _) = send(router.clone(), post_json("/v1/agents/refresh", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(workflow.directory().cached(&AgentId::new("pool_risk")).is_none());

        let (_, _, health) = send(
            router,
            Request::builder().uri("/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(health["agents_configured"], 1);
    }
}
