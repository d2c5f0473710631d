// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM answer synthesis
//
// Turns the ordered invocation reports into a prose answer. Callers fall
// back to the plain summary when this fails.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::llm::{GenerationOptions, LLMProvider};
use crate::domain::plan::Question;
use crate::domain::planner::{AnswerSynthesizer, SynthesisError};
use crate::domain::result::InvocationReport;

const SYSTEM_PROMPT: &str = "You write concise answers from tool results. Use only the \
results given. Say plainly which sources failed.";

pub struct LlmSynthesizer {
    provider: Arc<dyn LLMProvider>,
    options: GenerationOptions,
}

impl LlmSynthesizer {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            options: GenerationOptions {
                max_tokens: Some(1024),
                system_prompt: Some(SYSTEM_PROMPT.to_string()),
                ..GenerationOptions::default()
            },
        }
    }
}

fn build_prompt(question: &Question, reports: &[InvocationReport]) -> String {
    let mut prompt = format!("Question: {}\n\nResults:\n", question.text);
    for report in reports {
        let body = match (&report.result, &report.error) {
            (Some(result), _) => result.to_string(),
            (None, Some(error)) => format!("error {}: {}", error.kind, error.message),
            (None, None) => "no result".to_string(),
        };
        prompt.push_str(&format!("- {} [{}]: {}\n", report.source(), report.status, body));
    }
    prompt.push_str("\nAnswer the question.");
    prompt
}

#[async_trait]
impl AnswerSynthesizer for LlmSynthesizer {
    async fn synthesize(
        &self,
        question: &Question,
        reports: &[InvocationReport],
    ) -> Result<String, SynthesisError> {
        let response = self
            .provider
            .generate(&build_prompt(question, reports), &self.options)
            .await
            .map_err(|e| SynthesisError(e.to_string()))?;
        Ok(response.text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::AgentId;
    use crate::domain::errors::InvocationError;
    use crate::domain::invocation::{Invocation, PlanPosition};
    use crate::domain::llm::{GenerationResponse, LLMError};
    use crate::domain::plan::CallTarget;
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct RecordingProvider {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LLMProvider for RecordingProvider {
        async fn generate(&self, prompt: &str, _: &GenerationOptions) -> Result<GenerationResponse, LLMError> {
            self.prompts.lock().push(prompt.to_string());
            Ok(GenerationResponse {
                text: "  Moderate risk overall.\n".into(),
                model: "recorder".into(),
            })
        }
    }

    fn report(tool: &str, outcome: Result<serde_json::Value, InvocationError>) -> InvocationReport {
        let mut invocation = Invocation::new(
            PlanPosition::new(0, 0),
            AgentId::new("pool_risk"),
            CallTarget::Tool {
                tool_name: tool.into(),
                arguments: json!({}),
            },
        );
        invocation.start().unwrap();
        invocation.finish(outcome).unwrap();
        InvocationReport::from(&invocation)
    }

    #[tokio::test]
    async fn test_prompt_lists_successes_and_failures() {
        let provider = Arc::new(RecordingProvider::default());
        let synthesizer = LlmSynthesizer::new(provider.clone());
        let reports = vec![
            report("concentration_risk", Ok(json!({ "risk_score": 30 }))),
            report("market_risk", Err(InvocationError::remote("upstream down"))),
        ];

        let answer = synthesizer
            .synthesize(&Question::new("How risky is the pool?"), &reports)
            .await
            .unwrap();
        assert_eq!(answer, "Moderate risk overall.");

        let prompts = provider.prompts.lock();
        assert!(prompts[0].contains("How risky is the pool?"));
        assert!(prompts[0].contains("\"risk_score\":30"));
        assert!(prompts[0].contains("upstream down"));
    }
}
