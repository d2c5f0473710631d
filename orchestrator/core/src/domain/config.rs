// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Orchestrator Configuration Types
//
// Kubernetes-style manifest (apiVersion/kind/metadata/spec) describing:
// - the peer agents the orchestrator may call
// - execution limits (fan-out, timeouts, failure and retry policy)
// - cache freshness for agent cards and tool snapshots
// - planner selection and the optional LLM backend
// - network and observability settings

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::domain::agent::{AgentId, DEFAULT_CARD_PATH};
use crate::domain::errors::ErrorKind;

pub const API_VERSION: &str = "agentmesh.io/v1";
pub const KIND: &str = "OrchestratorConfig";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfigManifest {
    /// Must be "agentmesh.io/v1"
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Must be "OrchestratorConfig"
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: OrchestratorConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorConfigSpec {
    #[serde(default)]
    pub agents: Vec<AgentEndpointConfig>,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub planner: PlannerConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmConfig>,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEndpointConfig {
    pub id: AgentId,

    /// Root URL of the agent service
    pub base_url: String,

    /// Discovery document path relative to base_url
    #[serde(default = "default_card_path")]
    pub card_path: String,
}

impl AgentEndpointConfig {
    pub fn card_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.card_path.trim_start_matches('/')
        )
    }
}

/// What happens to later groups once a group had a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Run the remaining groups and annotate the gap
    #[default]
    Continue,
    /// Skip every remaining group
    AbortRemaining,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,

    #[serde(default = "default_invocation_timeout_ms")]
    pub invocation_timeout_ms: u64,

    /// Overall budget for one orchestrator request
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
            invocation_timeout_ms: default_invocation_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            failure_policy: FailurePolicy::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Disabled unless max_attempts > 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    #[serde(default = "default_retry_on")]
    pub retry_on: Vec<ErrorKind>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            retry_on: default_retry_on(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_card_ttl")]
    pub agent_card_ttl_seconds: u64,

    #[serde(default = "default_snapshot_ttl")]
    pub tool_snapshot_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            agent_card_ttl_seconds: default_card_ttl(),
            tool_snapshot_ttl_seconds: default_snapshot_ttl(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlannerStrategy {
    /// Deterministic keyword matching over the tool catalog
    #[default]
    Catalog,
    /// OpenAI-compatible model, requires spec.llm
    Llm,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub strategy: PlannerStrategy,

    /// Also use spec.llm to write the final answer
    #[serde(default)]
    pub synthesize_answers: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Only "openai" (any OpenAI-compatible endpoint) is supported
    #[serde(default = "default_provider_type")]
    pub provider_type: String,

    pub endpoint: String,

    /// Literal key or "env:VAR_NAME"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub model: String,
}

impl LlmConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        let raw = self.api_key.as_deref()?;
        match raw.strip_prefix("env:") {
            Some(var) => std::env::var(var).ok(),
            None => Some(raw.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// e.g. "info", "debug", "agentmesh_core=trace"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "json" or "text"
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Prometheus scrape port
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_true() -> bool {
    true
}

fn default_card_path() -> String {
    DEFAULT_CARD_PATH.to_string()
}

fn default_max_in_flight() -> usize {
    8
}

fn default_invocation_timeout_ms() -> u64 {
    30_000
}

fn default_request_timeout_ms() -> u64 {
    120_000
}

fn default_max_attempts() -> u32 {
    1
}

fn default_backoff_ms() -> u64 {
    250
}

fn default_retry_on() -> Vec<ErrorKind> {
    vec![ErrorKind::Unreachable, ErrorKind::Timeout]
}

fn default_card_ttl() -> u64 {
    300
}

fn default_snapshot_ttl() -> u64 {
    60
}

fn default_provider_type() -> String {
    "openai".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_metrics_port() -> u16 {
    9091
}

impl Default for OrchestratorConfigManifest {
    fn default() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "agentmesh".to_string());

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: hostname,
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: OrchestratorConfigSpec::default(),
        }
    }
}

/// `AGENTMESH_<ID>_URL` for an agent id.
pub fn agent_url_env_var(id: &AgentId) -> String {
    let normalized: String = id
        .as_str()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("AGENTMESH_{}_URL", normalized)
}

impl OrchestratorConfigManifest {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. AGENTMESH_CONFIG_PATH environment variable
    /// 2. ./agentmesh-config.yaml (working directory)
    /// 3. ~/.agentmesh/config.yaml (user home)
    /// 4. /etc/agentmesh/config.yaml (system)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("AGENTMESH_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./agentmesh-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".agentmesh").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/agentmesh/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must load
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("AGENTMESH_MAX_IN_FLIGHT") {
            match val.parse::<usize>() {
                Ok(n) => {
                    tracing::info!("Environment override: AGENTMESH_MAX_IN_FLIGHT={}", n);
                    self.spec.execution.max_in_flight = n;
                }
                Err(_) => tracing::warn!(
                    "Invalid value for AGENTMESH_MAX_IN_FLIGHT: '{}'. Ignoring.",
                    val
                ),
            }
        }

        if let Ok(val) = std::env::var("AGENTMESH_INVOCATION_TIMEOUT_MS") {
            match val.parse::<u64>() {
                Ok(ms) => {
                    tracing::info!("Environment override: AGENTMESH_INVOCATION_TIMEOUT_MS={}", ms);
                    self.spec.execution.invocation_timeout_ms = ms;
                }
                Err(_) => tracing::warn!(
                    "Invalid value for AGENTMESH_INVOCATION_TIMEOUT_MS: '{}'. Ignoring.",
                    val
                ),
            }
        }

        for agent in &mut self.spec.agents {
            let var = agent_url_env_var(&agent.id);
            if let Ok(url) = std::env::var(&var) {
                tracing::info!("Environment override: {}={}", var, url);
                agent.base_url = url;
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let mut seen = HashSet::new();
        for agent in &self.spec.agents {
            if agent.id.as_str().trim().is_empty() {
                anyhow::bail!("spec.agents[].id cannot be empty");
            }
            if !seen.insert(agent.id.clone()) {
                anyhow::bail!("Duplicate agent id: '{}'", agent.id);
            }
            if agent.base_url.trim().is_empty() {
                anyhow::bail!("base_url cannot be empty for agent: {}", agent.id);
            }
        }

        let execution = &self.spec.execution;
        if execution.max_in_flight == 0 {
            anyhow::bail!("spec.execution.max_in_flight must be at least 1");
        }
        if execution.invocation_timeout_ms == 0 || execution.request_timeout_ms == 0 {
            anyhow::bail!("spec.execution timeouts must be greater than zero");
        }
        if execution.retry.max_attempts == 0 {
            anyhow::bail!("spec.execution.retry.max_attempts must be at least 1");
        }
        if let Some(kind) = execution.retry.retry_on.iter().find(|k| !k.is_transient()) {
            anyhow::bail!(
                "spec.execution.retry.retry_on only accepts Unreachable or Timeout, got {}",
                kind
            );
        }

        if self.spec.planner.strategy == PlannerStrategy::Llm || self.spec.planner.synthesize_answers {
            let Some(llm) = &self.spec.llm else {
                anyhow::bail!("spec.llm is required by the configured planner");
            };
            if llm.provider_type != "openai" {
                anyhow::bail!("Unsupported LLM provider type: '{}'", llm.provider_type);
            }
            if llm.endpoint.is_empty() || llm.model.is_empty() {
                anyhow::bail!("spec.llm.endpoint and spec.llm.model cannot be empty");
            }
        }

        Ok(())
    }
}
