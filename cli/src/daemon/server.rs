// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Orchestrator HTTP server

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use agentmesh_core::{
    application::{
        agent_directory::AgentDirectory,
        aggregator::ResultAggregator,
        capability_client::CapabilityRegistryClient,
        catalog_planner::CatalogPlanner,
        coordinator::{ExecutionCoordinator, ExecutionPolicy},
        orchestrator::OrchestratorWorkflow,
    },
    domain::{
        config::{OrchestratorConfigManifest, PlannerStrategy},
        planner::Planner,
    },
    infrastructure::{
        http_transport::HttpAgentTransport,
        llm::{provider_from_config, LlmPlanner, LlmSynthesizer},
    },
    presentation::api::orchestrator_router,
};

pub async fn start_server(
    config_path: Option<PathBuf>,
    bind_override: Option<String>,
    port_override: Option<u16>,
) -> Result<()> {
    let config = OrchestratorConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    info!(
        name = %config.metadata.name,
        agents = config.spec.agents.len(),
        "Configuration loaded"
    );

    if let Some(metrics) = config.spec.observability.as_ref().and_then(|o| o.metrics.as_ref()) {
        if metrics.enabled {
            let addr = SocketAddr::from(([0, 0, 0, 0], metrics.port));
            PrometheusBuilder::new()
                .with_http_listener(addr)
                .install()
                .context("Failed to install Prometheus exporter")?;
            info!("Prometheus metrics on {}", addr);
        }
    }

    let workflow = Arc::new(build_workflow(&config)?);
    let shutdown = CancellationToken::new();
    let app = orchestrator_router(workflow, shutdown.clone());

    let bind = bind_override.unwrap_or_else(|| config.spec.network.bind_address.clone());
    let port = port_override.unwrap_or(config.spec.network.port);
    let addr = format!("{}:{}", bind, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Orchestrator listening on {}", addr);

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_token.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("HTTP server failed")?;

    info!("Orchestrator shutting down");

    Ok(())
}

/// Validates `config` and wires the orchestrator services it describes.
pub fn build_workflow(config: &OrchestratorConfigManifest) -> Result<OrchestratorWorkflow> {
    config
        .validate()
        .context("Configuration validation failed")?;
    let spec = &config.spec;
    let execution = &spec.execution;

    let transport = Arc::new(
        HttpAgentTransport::new(Duration::from_millis(execution.invocation_timeout_ms))
            .context("Failed to build HTTP client")?,
    );
    let directory = Arc::new(AgentDirectory::new(
        transport.clone(),
        spec.agents.clone(),
        Duration::from_secs(spec.cache.agent_card_ttl_seconds),
    ));
    let registry = Arc::new(CapabilityRegistryClient::new(
        transport.clone(),
        Duration::from_secs(spec.cache.tool_snapshot_ttl_seconds),
    ));

    let provider = match &spec.llm {
        Some(llm) => Some(provider_from_config(llm).context("Failed to initialize LLM provider")?),
        None => None,
    };

    // validate() guarantees a provider whenever the strategy or synthesis needs one
    let planner: Arc<dyn Planner> = match (spec.planner.strategy, &provider) {
        (PlannerStrategy::Llm, Some(provider)) => Arc::new(LlmPlanner::new(provider.clone())),
        _ => Arc::new(CatalogPlanner::new()),
    };

    let aggregator = match (&provider, spec.planner.synthesize_answers) {
        (Some(provider), true) => ResultAggregator::with_synthesizer(Arc::new(LlmSynthesizer::new(provider.clone()))),
        _ => ResultAggregator::new(),
    };

    info!(
        planner = ?spec.planner.strategy,
        max_in_flight = execution.max_in_flight,
        failure_policy = ?execution.failure_policy,
        "Orchestrator services initialized"
    );

    Ok(OrchestratorWorkflow::new(
        directory,
        registry,
        transport,
        planner,
        Arc::new(ExecutionCoordinator::new(ExecutionPolicy::from_config(execution))),
        Arc::new(aggregator),
    )
    .with_request_timeout(Duration::from_millis(execution.request_timeout_ms)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentmesh_core::domain::agent::AgentId;

    const CONFIG: &str = r#"
apiVersion: agentmesh.io/v1
kind: OrchestratorConfig
metadata:
  name: test
spec:
  agents:
    - id: pool_risk
      base_url: http://127.0.0.1:8101
    - id: market
      base_url: http://127.0.0.1:8102
  planner:
    strategy: llm
  llm:
    endpoint: http://127.0.0.1:1/v1
    model: local-model
"#;

    #[test]
    fn test_build_workflow_from_config() {
        let config = OrchestratorConfigManifest::from_yaml_str(CONFIG).unwrap();
        let workflow = build_workflow(&config).unwrap();
        assert_eq!(
            workflow.directory().known_agents(),
            vec![AgentId::new("market"), AgentId::new("pool_risk")]
        );
    }

    #[test]
    fn test_llm_planner_requires_llm_section() {
        let mut config = OrchestratorConfigManifest::from_yaml_str(CONFIG).unwrap();
        config.spec.llm = None;
        assert!(build_workflow(&config).is_err());
    }

    #[test]
    fn test_synthesis_without_llm_section_is_rejected() {
        let mut config = OrchestratorConfigManifest::from_yaml_str(CONFIG).unwrap();
        config.spec.planner.strategy = PlannerStrategy::Catalog;
        config.spec.planner.synthesize_answers = true;
        config.spec.llm = None;
        let err = build_workflow(&config).err().expect("expected build_workflow to fail");
        assert!(format!("{:#}", err).contains("spec.llm"));

        config.spec.planner.synthesize_answers = false;
        assert!(build_workflow(&config).is_ok());
    }
}
