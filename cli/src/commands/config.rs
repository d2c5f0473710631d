// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use agentmesh_core::domain::config::{agent_url_env_var, OrchestratorConfigManifest};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,

        /// Print the effective configuration as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./agentmesh-config.yaml)
        #[arg(short, long, default_value = "./agentmesh-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths, yaml } => show(config_override, paths, yaml),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate {
            output,
            examples,
            force,
        } => generate(output, examples, force),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool, as_yaml: bool) -> Result<()> {
    let config = OrchestratorConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. AGENTMESH_CONFIG_PATH: {}",
            std::env::var("AGENTMESH_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./agentmesh-config.yaml");
        println!("  4. ~/.agentmesh/config.yaml");
        println!("  5. /etc/agentmesh/config.yaml");
        println!();
    }

    if as_yaml {
        let text = serde_yaml::to_string(&config).context("Failed to render configuration")?;
        print!("{}", text);
        return Ok(());
    }

    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!();

    let spec = &config.spec;
    println!("{}", "Agents:".bold());
    if spec.agents.is_empty() {
        println!("  {}", "(none configured)".dimmed());
    }
    for agent in &spec.agents {
        println!("  {} → {}", agent.id.to_string().bold(), agent.base_url);
        println!("    Card: {}", agent.card_url());
        println!("    Override: {}", agent_url_env_var(&agent.id).dimmed());
    }
    println!();

    println!("{}", "Execution:".bold());
    println!("  Max in flight: {}", spec.execution.max_in_flight);
    println!("  Invocation timeout: {}ms", spec.execution.invocation_timeout_ms);
    println!("  Request timeout: {}ms", spec.execution.request_timeout_ms);
    println!("  Failure policy: {:?}", spec.execution.failure_policy);
    println!(
        "  Retry: {} attempt(s), {}ms backoff",
        spec.execution.retry.max_attempts, spec.execution.retry.backoff_ms
    );
    println!();

    println!("{}", "Cache:".bold());
    println!("  Agent card TTL: {}s", spec.cache.agent_card_ttl_seconds);
    println!("  Tool snapshot TTL: {}s", spec.cache.tool_snapshot_ttl_seconds);
    println!();

    println!("{}", "Planner:".bold());
    println!("  Strategy: {:?}", spec.planner.strategy);
    println!("  Synthesize answers: {}", spec.planner.synthesize_answers);
    if let Some(llm) = &spec.llm {
        println!("  LLM: {} ({}) at {}", llm.model, llm.provider_type, llm.endpoint);
    }
    println!();

    println!("{}", "Network:".bold());
    println!("  Listen: {}:{}", spec.network.bind_address, spec.network.port);

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = OrchestratorConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

fn generate(output: PathBuf, with_examples: bool, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!("{} already exists; pass --force to overwrite", output.display());
    }

    std::fs::write(&output, template(with_examples))
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

fn template(with_examples: bool) -> &'static str {
    if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_are_valid_manifests() {
        for with_examples in [false, true] {
            let config = OrchestratorConfigManifest::from_yaml_str(template(with_examples)).unwrap();
            config.validate().unwrap();
        }
    }

    #[test]
    fn test_generate_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agentmesh-config.yaml");

        generate(path.clone(), false, false).unwrap();
        assert!(generate(path.clone(), false, false).is_err());
        generate(path.clone(), true, true).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("kind: OrchestratorConfig"));
    }
}
