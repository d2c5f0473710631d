// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM-backed Planner
//
// Sends the question and the tool catalog to a chat model and parses the
// JSON plan it returns. Request identifiers are bound into tool arguments
// the model left out.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::domain::agent::{format_agents_summary, AgentId};
use crate::domain::capability::CapabilitySet;
use crate::domain::llm::{GenerationOptions, LLMProvider};
use crate::domain::plan::{CallTarget, InvocationGroup, Plan, PlanOutcome, PlannedInvocation, Question};
use crate::domain::planner::{Planner, PlannerError};

const SYSTEM_PROMPT: &str = "You plan tool calls for a multi-agent analysis system. \
Reply with JSON only.";

pub struct LlmPlanner {
    provider: Arc<dyn LLMProvider>,
    options: GenerationOptions,
}

#[derive(Debug, Deserialize)]
struct PlanDocument {
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    groups: Vec<Vec<PlanStep>>,
}

#[derive(Debug, Deserialize)]
struct PlanStep {
    agent_id: AgentId,
    #[serde(default)]
    tool_name: Option<String>,
    #[serde(default)]
    arguments: Value,
    #[serde(default)]
    question: Option<String>,
}

impl LlmPlanner {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            options: GenerationOptions {
                system_prompt: Some(SYSTEM_PROMPT.to_string()),
                ..GenerationOptions::default()
            },
        }
    }

    fn build_prompt(&self, question: &Question, capabilities: &CapabilitySet) -> String {
        let identifiers = if question.identifiers.is_empty() {
            "(none)".to_string()
        } else {
            serde_json::to_string(&question.identifiers).unwrap_or_default()
        };
        format!(
            "Question: {question}\n\
             Identifiers supplied with the question: {identifiers}\n\n\
             Agents:\n{agents}\n\
             Tools:\n{catalog}\n\
             Select only the tools needed to answer the question. Tools in the same \
             group run in parallel and must not depend on each other; put a tool that \
             needs an earlier result in a later group and pass that result as \
             {{\"$from\": \"<tool_name>\"}}. Omit tool_name to hand the whole question \
             to an agent. Return an empty groups list when no tool is relevant.\n\n\
             Respond with JSON of the form:\n\
             {{\"reasoning\": \"...\", \"groups\": [[{{\"agent_id\": \"...\", \
             \"tool_name\": \"...\", \"arguments\": {{}}}}]]}}",
            question = question.text,
            identifiers = identifiers,
            agents = format_agents_summary(capabilities.cards()),
            catalog = capabilities.catalog_text(),
        )
    }

    fn into_outcome(&self, document: PlanDocument, question: &Question, capabilities: &CapabilitySet) -> PlanOutcome {
        let groups: Vec<InvocationGroup> = document
            .groups
            .into_iter()
            .map(|steps| {
                InvocationGroup::new(
                    steps
                        .into_iter()
                        .map(|step| to_invocation(step, question, capabilities))
                        .collect(),
                )
            })
            .collect();
        let plan = Plan::new(document.reasoning.clone(), groups);
        if plan.is_empty() {
            let reason = if document.reasoning.trim().is_empty() {
                "the model selected no tools".to_string()
            } else {
                document.reasoning
            };
            PlanOutcome::NoPlan { reason }
        } else {
            PlanOutcome::Plan(plan)
        }
    }
}

fn to_invocation(step: PlanStep, question: &Question, capabilities: &CapabilitySet) -> PlannedInvocation {
    match step.tool_name {
        Some(tool_name) => {
            let descriptor = capabilities
                .get(&step.agent_id)
                .and_then(|caps| caps.tools.get(&tool_name));
            let arguments = match descriptor {
                Some(descriptor) => descriptor.bind_arguments(&question.identifiers, &step.arguments),
                None => step.arguments,
            };
            PlannedInvocation {
                agent_id: step.agent_id,
                call: CallTarget::Tool { tool_name, arguments },
            }
        }
        None => PlannedInvocation {
            agent_id: step.agent_id,
            call: CallTarget::Delegate {
                question: step.question,
            },
        },
    }
}

/// Extracts the JSON object from a model reply, tolerating code fences
/// and surrounding prose.
fn extract_json(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```"))
        .unwrap_or(trimmed);
    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    (start <= end).then(|| &unfenced[start..=end])
}

#[async_trait]
impl Planner for LlmPlanner {
    async fn plan(
        &self,
        question: &Question,
        capabilities: &CapabilitySet,
    ) -> Result<PlanOutcome, PlannerError> {
        let prompt = self.build_prompt(question, capabilities);
        let response = self
            .provider
            .generate(&prompt, &self.options)
            .await
            .map_err(|e| PlannerError::Unavailable(e.to_string()))?;
        debug!(model = %response.model, "Planner response received");

        let json = extract_json(&response.text)
            .ok_or_else(|| PlannerError::Malformed("no JSON object in model reply".into()))?;
        let document: PlanDocument =
            serde_json::from_str(json).map_err(|e| PlannerError::Malformed(e.to_string()))?;
        Ok(self.into_outcome(document, question, capabilities))
    }
}
