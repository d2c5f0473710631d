// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent service and tool server HTTP API
//!
//! # Architecture
//!
//! - **Layer:** Presentation Layer
//! - **Purpose:** Exposes a domain agent: its card, `/v1/invoke`, and the
//!   capability registry it serves (`/tools`, `/tools/call`).

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::application::agent_service::{AgentService, RegistryStatus};
use crate::application::capability_registry::CapabilityRegistry;
use crate::domain::agent::DEFAULT_CARD_PATH;
use crate::domain::errors::{ErrorKind, InvocationError};
use crate::domain::protocol::{AgentInvokeRequest, ToolCallRequest, ToolCallResponse};
use crate::presentation::error_response;

/// Routes for a domain agent: card, invoke, health, tools and refresh.
pub fn agent_router(service: Arc<AgentService>) -> Router {
    Router::new()
        .route(DEFAULT_CARD_PATH, get(card_handler))
        .route("/v1/invoke", post(invoke_handler))
        .route("/health", get(health_handler))
        .route("/tools", get(agent_tools_handler))
        .route("/refresh-tools", post(refresh_tools_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Routes for a capability registry.
pub fn tool_server_router(registry: Arc<CapabilityRegistry>) -> Router {
    Router::new()
        .route("/tools", get(list_tools_handler))
        .route("/tools/call", post(call_tool_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

async fn card_handler(State(service): State<Arc<AgentService>>) -> Response {
    Json(service.card().clone()).into_response()
}

async fn invoke_handler(
    State(service): State<Arc<AgentService>>,
    payload: Result<Json<AgentInvokeRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, "BadRequest", rejection.body_text());
        }
    };
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    Json(service.invoke(request, &cancel).await).into_response()
}

async fn health_handler(State(service): State<Arc<AgentService>>) -> Json<serde_json::Value> {
    let registry_status = service.registry_status();
    let (status, tool_count) = match &registry_status {
        RegistryStatus::Available { tool_count } => ("healthy", *tool_count),
        RegistryStatus::Unknown => ("healthy", 0),
        RegistryStatus::Unavailable { .. } => ("degraded", 0),
    };
    Json(json!({
        "status": status,
        "agent_id": service.card().agent_id,
        "capability_registry_status": registry_status,
        "tool_count": tool_count,
    }))
}

async fn agent_tools_handler(State(service): State<Arc<AgentService>>) -> Response {
    match service.tools().await {
        Ok(snapshot) => {
            let tools: Vec<_> = snapshot.descriptors().collect();
            Json(json!({ "tools": tools })).into_response()
        }
        Err(e) => error_response(StatusCode::SERVICE_UNAVAILABLE, e.kind().as_str(), e.to_string()),
    }
}

async fn refresh_tools_handler(State(service): State<Arc<AgentService>>) -> Json<serde_json::Value> {
    match service.refresh_tools().await {
        Ok(tool_count) => Json(json!({ "status": "ok", "tool_count": tool_count })),
        Err(e) => {
            warn!(error = %e, "Tool refresh failed");
            Json(json!({ "status": "error", "tool_count": 0, "message": e.to_string() }))
        }
    }
}

async fn list_tools_handler(State(registry): State<Arc<CapabilityRegistry>>) -> Json<serde_json::Value> {
    Json(json!({ "tools": registry.descriptors() }))
}

async fn call_tool_handler(
    State(registry): State<Arc<CapabilityRegistry>>,
    payload: Result<Json<ToolCallRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let error = InvocationError::new(ErrorKind::ValidationError, rejection.body_text());
            return (StatusCode::BAD_REQUEST, Json(ToolCallResponse::from(Err(error)))).into_response();
        }
    };
    let outcome = registry.execute(request).await;
    let status = match &outcome {
        Ok(_) => StatusCode::OK,
        Err(e) => status_for(e.kind),
    };
    (status, Json(ToolCallResponse::from(outcome))).into_response()
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::ToolNotFound => StatusCode::NOT_FOUND,
        ErrorKind::ValidationError => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
