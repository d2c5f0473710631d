// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Orchestrator server process and its HTTP client
//!
//! Handles:
//! - Wiring services from configuration
//! - HTTP health checks
//! - Graceful shutdown

use anyhow::Result;
use std::time::Duration;

pub mod client;
pub mod server;

pub use client::OrchestratorClient;
pub use server::{build_workflow, start_server};

#[derive(Debug, Clone, PartialEq)]
pub enum ServerStatus {
    Running {
        uptime: Option<u64>,
        agents_configured: Option<u64>,
    },
    Stopped,
    Unhealthy {
        error: String,
    },
}

pub fn base_url(host: &str, port: u16) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{}:{}", host.trim_end_matches('/'), port)
    } else {
        format!("http://{}:{}", host, port)
    }
}

/// Check whether an orchestrator answers its health endpoint
pub async fn check_server_running(host: &str, port: u16) -> Result<ServerStatus> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(500))
        .build()?;

    let health_url = format!("{}/health", base_url(host, port));
    match client.get(&health_url).send().await {
        Ok(resp) if resp.status().is_success() => {
            let body = resp.json::<serde_json::Value>().await.ok();
            Ok(ServerStatus::Running {
                uptime: body.as_ref().and_then(|v| v["uptime_seconds"].as_u64()),
                agents_configured: body.as_ref().and_then(|v| v["agents_configured"].as_u64()),
            })
        }
        Ok(resp) => Ok(ServerStatus::Unhealthy {
            error: format!("HTTP {}", resp.status()),
        }),
        Err(_) => Ok(ServerStatus::Stopped),
    }
}
