// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `agentmesh status` - report server health and configured agents

use anyhow::Result;
use colored::Colorize;

use crate::daemon::{check_server_running, OrchestratorClient, ServerStatus};

pub async fn execute(host: &str, port: u16) -> Result<()> {
    match check_server_running(host, port).await? {
        ServerStatus::Running {
            uptime,
            agents_configured,
        } => {
            println!("{}", "✓ Orchestrator is running".green());
            if let Some(uptime) = uptime {
                println!("  Uptime: {}s", uptime);
            }
            if let Some(count) = agents_configured {
                println!("  Agents configured: {}", count);
            }
        }
        ServerStatus::Unhealthy { error } => {
            println!("{}", format!("⚠ Orchestrator is unhealthy: {}", error).yellow());
            return Ok(());
        }
        ServerStatus::Stopped => {
            println!("{}", "Orchestrator is not running.".red());
            println!("Run 'agentmesh serve' to start it.");
            return Ok(());
        }
    }

    let client = OrchestratorClient::new(host, port)?;
    let agents = client.list_agents().await?;
    if agents.is_empty() {
        return Ok(());
    }
    println!();
    println!("{}", "Agents:".bold());
    for agent in agents {
        let cache = if agent.card_cached {
            "card cached".green()
        } else {
            "not resolved".dimmed()
        };
        println!("  {} {} ({})", agent.agent_id.bold(), agent.base_url, cache);
    }
    Ok(())
}
