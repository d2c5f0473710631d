// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # agentmesh CLI
//!
//! The `agentmesh` binary runs the orchestrator server and talks to it.
//!
//! ## Commands
//!
//! - `agentmesh serve` - Run the orchestrator HTTP server
//! - `agentmesh ask <QUERY>` - Send a question to a running server
//! - `agentmesh status` - Check whether a server is up
//! - `agentmesh agent card|tools <BASE_URL>` - Inspect a domain agent
//! - `agentmesh config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use agentmesh_cli::commands::{self, AgentCommand, ConfigCommand};
use agentmesh_cli::daemon;
use agentmesh_core::domain::config::OrchestratorConfigManifest;

/// agentmesh - plan-and-execute orchestration over analysis agents
#[derive(Parser)]
#[command(name = "agentmesh")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "AGENTMESH_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Orchestrator host for client commands
    #[arg(long, global = true, env = "AGENTMESH_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Orchestrator port for client commands; `serve` uses it as a bind override
    #[arg(long, global = true, env = "AGENTMESH_PORT")]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "AGENTMESH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (text, json)
    #[arg(long, global = true, env = "AGENTMESH_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the orchestrator HTTP server
    #[command(name = "serve")]
    Serve {
        /// Bind address override (default: spec.network.bind_address)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Ask the orchestrator a question
    #[command(name = "ask")]
    Ask {
        /// Natural-language question
        #[arg(value_name = "QUERY")]
        query: String,

        /// Pool address passed to tools that take one
        #[arg(long)]
        pool_address: Option<String>,

        /// Restrict to these agent ids (repeatable)
        #[arg(long = "agent", value_name = "AGENT_ID")]
        agents: Vec<String>,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Check orchestrator server status
    #[command(name = "status")]
    Status,

    /// Inspect a domain agent directly
    #[command(name = "agent")]
    Agent {
        #[command(subcommand)]
        command: AgentCommand,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

const DEFAULT_CLIENT_PORT: u16 = 8000;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // Server mode takes its logging defaults from the config file
    let logging = match &cli.command {
        Some(Commands::Serve { .. }) => OrchestratorConfigManifest::load_or_default(cli.config.clone())
            .ok()
            .and_then(|config| config.spec.observability)
            .and_then(|observability| observability.logging),
        _ => None,
    };
    let level = cli
        .log_level
        .clone()
        .or_else(|| logging.as_ref().map(|l| l.level.clone()))
        .unwrap_or_else(|| "info".to_string());
    let format = cli
        .log_format
        .clone()
        .or_else(|| logging.as_ref().map(|l| l.format.clone()))
        .unwrap_or_else(|| "text".to_string());
    init_logging(&level, &format)?;

    let port = cli.port.unwrap_or(DEFAULT_CLIENT_PORT);
    match cli.command {
        Some(Commands::Serve { bind }) => daemon::start_server(cli.config, bind, cli.port).await,
        Some(Commands::Ask {
            query,
            pool_address,
            agents,
            json,
        }) => commands::ask::execute(&cli.host, port, query, pool_address, agents, json).await,
        Some(Commands::Status) => commands::status::execute(&cli.host, port).await,
        Some(Commands::Agent { command }) => commands::agent::handle_command(command).await,
        Some(Commands::Config { command }) => commands::config::handle_command(command, cli.config).await,
        None => {
            eprintln!("{}", "No command specified. Use --help for usage.".yellow());
            std::process::exit(1);
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.compact().init();
    }

    Ok(())
}
