// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `agentmesh ask` - send a question to a running orchestrator

use anyhow::{Context, Result};
use colored::Colorize;

use agentmesh_core::domain::agent::AgentId;
use agentmesh_core::domain::invocation::InvocationStatus;
use agentmesh_core::domain::protocol::OrchestratorRequest;
use agentmesh_core::domain::result::{AggregatedResult, OverallStatus};

use crate::daemon::OrchestratorClient;

pub async fn execute(
    host: &str,
    port: u16,
    query: String,
    pool_address: Option<String>,
    agents: Vec<String>,
    json: bool,
) -> Result<()> {
    let request = OrchestratorRequest {
        pool_address,
        agents: (!agents.is_empty()).then(|| agents.iter().map(|a| AgentId::new(a.as_str())).collect()),
        ..OrchestratorRequest::new(query)
    };

    let client = OrchestratorClient::new(host, port)?;
    let result = client.ask(&request).await?;

    if json {
        let text = serde_json::to_string_pretty(&result).context("Failed to render response")?;
        println!("{}", text);
    } else {
        print_result(&result);
    }
    Ok(())
}

fn print_result(result: &AggregatedResult) {
    println!("{}", result.answer);
    println!();

    let status = match result.overall_status {
        OverallStatus::Complete => "complete".green(),
        OverallStatus::Partial => "partial".yellow(),
        OverallStatus::Failed => "failed".red(),
    };
    print!("{} {}", "Status:".bold(), status);
    if result.degraded {
        print!(" {}", "(degraded)".yellow());
    }
    println!();
    if let Some(score) = result.risk_score {
        println!("{} {:.1}", "Risk score:".bold(), score);
    }

    if !result.per_agent_results.is_empty() {
        println!();
        println!("{}", "Sources:".bold());
        for report in &result.per_agent_results {
            let status = match report.status {
                InvocationStatus::Succeeded => report.status.to_string().green(),
                InvocationStatus::TimedOut => report.status.to_string().yellow(),
                _ => report.status.to_string().red(),
            };
            let timing = report
                .duration_ms
                .map(|ms| format!(" {}ms", ms))
                .unwrap_or_default();
            println!("  {} [{}]{}", report.source(), status, timing.dimmed());
            if let Some(error) = &report.error {
                println!("    {} {}", error.kind.to_string().red(), error.message);
            }
        }
    }

    if !result.notes.is_empty() {
        println!();
        println!("{}", "Notes:".bold());
        for note in &result.notes {
            println!("  - {}", note.dimmed());
        }
    }
}
