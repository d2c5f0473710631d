// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Infrastructure - Anti-Corruption Layer Implementations
//
// Provider adapters translate between the domain LLMProvider interface and
// vendor APIs. The planner and synthesizer here are the engine's only LLM
// consumers.

pub mod openai;
pub mod planner;
pub mod synthesizer;

use std::sync::Arc;

use crate::domain::config::LlmConfig;
use crate::domain::llm::LLMProvider;

pub use openai::OpenAIAdapter;
pub use planner::LlmPlanner;
pub use synthesizer::LlmSynthesizer;

/// Builds the provider described by `spec.llm`.
pub fn provider_from_config(config: &LlmConfig) -> anyhow::Result<Arc<dyn LLMProvider>> {
    match config.provider_type.as_str() {
        "openai" => {
            let api_key = config.resolve_api_key().unwrap_or_default();
            if api_key.is_empty() {
                tracing::warn!("No API key resolved for LLM endpoint {}", config.endpoint);
            }
            Ok(Arc::new(OpenAIAdapter::new(
                config.endpoint.clone(),
                api_key,
                config.model.clone(),
            )))
        }
        other => anyhow::bail!("Unsupported LLM provider type: {}", other),
    }
}
