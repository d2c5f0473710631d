// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`agentmesh-core`)
//!
//! HTTP surface that translates external requests into application
//! service calls. No business logic lives here.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`api`] | Orchestrator endpoints (`/v1/orchestrator/invoke`, `/v1/agents`) |
//! | [`agent_api`] | Agent service and tool server endpoints |

pub mod agent_api;
pub mod api;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// `{error: {kind, message}}` with the given status.
pub(crate) fn error_response(status: StatusCode, kind: &str, message: impl Into<String>) -> Response {
    let message: String = message.into();
    (
        status,
        Json(json!({ "error": { "kind": kind, "message": message } })),
    )
        .into_response()
}
