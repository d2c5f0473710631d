// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `agentmesh agent` - inspect a domain agent without the orchestrator

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::time::Duration;

use agentmesh_core::domain::agent::{AgentCard, DEFAULT_CARD_PATH};
use agentmesh_core::domain::transport::AgentTransport;
use agentmesh_core::infrastructure::http_transport::HttpAgentTransport;

#[derive(Subcommand)]
pub enum AgentCommand {
    /// Fetch and show an agent card
    Card {
        /// Agent base URL
        #[arg(value_name = "BASE_URL")]
        base_url: String,

        /// Card path relative to the base URL
        #[arg(long, default_value = DEFAULT_CARD_PATH)]
        card_path: String,
    },

    /// List the tools an agent advertises
    Tools {
        /// Agent base URL
        #[arg(value_name = "BASE_URL")]
        base_url: String,

        /// Card path relative to the base URL
        #[arg(long, default_value = DEFAULT_CARD_PATH)]
        card_path: String,

        /// Print input schemas
        #[arg(long)]
        schemas: bool,
    },
}

pub async fn handle_command(command: AgentCommand) -> Result<()> {
    let transport = HttpAgentTransport::new(Duration::from_secs(10)).context("Failed to create HTTP client")?;

    match command {
        AgentCommand::Card { base_url, card_path } => {
            let card = fetch_card(&transport, &base_url, &card_path).await?;
            print_card(&card);
        }
        AgentCommand::Tools {
            base_url,
            card_path,
            schemas,
        } => {
            let card = fetch_card(&transport, &base_url, &card_path).await?;
            let tools = transport
                .list_tools(card.tools_endpoint())
                .await
                .with_context(|| format!("Failed to list tools of {}", card.agent_id))?;

            println!("{} ({} tools)", card.name.bold(), tools.len());
            for tool in tools {
                println!("  {} - {}", tool.name.bold(), tool.description);
                if schemas {
                    let schema = serde_json::to_string_pretty(&tool.input_schema)
                        .context("Failed to render schema")?;
                    for line in schema.lines() {
                        println!("      {}", line.dimmed());
                    }
                }
            }
        }
    }
    Ok(())
}

async fn fetch_card(transport: &HttpAgentTransport, base_url: &str, card_path: &str) -> Result<AgentCard> {
    let url = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        card_path.trim_start_matches('/')
    );
    let mut card = transport
        .fetch_card(&url)
        .await
        .with_context(|| format!("Failed to fetch agent card from {}", url))?;
    if card.base_url.is_empty() {
        card.base_url = base_url.to_string();
    }
    if !card.is_compatible() {
        println!(
            "{}",
            format!("⚠ Agent speaks protocol {}", card.protocol_version).yellow()
        );
    }
    Ok(card)
}

fn print_card(card: &AgentCard) {
    println!("{}", "Agent card:".bold());
    println!("  ID: {}", card.agent_id);
    println!("  Name: {}", card.name);
    if !card.description.is_empty() {
        println!("  Description: {}", card.description);
    }
    println!("  Base URL: {}", card.base_url);
    println!("  Tools URL: {}", card.tools_endpoint());
    println!("  Protocol: {}", card.protocol_version);
    if !card.skills.is_empty() {
        println!("  Skills:");
        for skill in &card.skills {
            println!("    - {}: {}", skill.name, skill.description);
            if !skill.tags.is_empty() {
                println!("      tags: {}", skill.tags.join(", ").dimmed());
            }
        }
    }
}
