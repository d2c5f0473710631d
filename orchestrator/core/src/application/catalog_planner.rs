// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Deterministic planner over the discovered tool catalog.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Default `Planner`. Matches question words against tool
//!   names, selects every tool for comprehensive questions, and falls back to
//!   delegating to agents whose skills match. Produces a single group.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::domain::agent::question_words;
use crate::domain::capability::CapabilitySet;
use crate::domain::plan::{Plan, PlanOutcome, PlannedInvocation, Question};
use crate::domain::planner::{Planner, PlannerError};

const DEFAULT_COMPREHENSIVE_KEYWORDS: &[&str] = &["full", "comprehensive", "all", "overall"];

/// Words too common in tool names to identify one.
const GENERIC_NAME_TOKENS: &[&str] = &[
    "risk", "score", "analysis", "analyze", "calculate", "get", "check", "compute", "tool", "data",
];

const STEM_CHARS: usize = 6;

pub struct CatalogPlanner {
    comprehensive_keywords: Vec<String>,
}

impl Default for CatalogPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogPlanner {
    pub fn new() -> Self {
        Self {
            comprehensive_keywords: DEFAULT_COMPREHENSIVE_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }

    pub fn with_comprehensive_keywords(keywords: Vec<String>) -> Self {
        Self {
            comprehensive_keywords: keywords.into_iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    fn is_comprehensive(&self, words: &[String]) -> bool {
        words.iter().any(|w| self.comprehensive_keywords.contains(w))
    }
}

fn stem(word: &str) -> String {
    word.chars().take(STEM_CHARS).collect()
}

fn name_matches(tool_name: &str, words: &[String]) -> bool {
    tool_name
        .split(|c: char| c == '_' || c == '-' || c == '.')
        .map(str::to_lowercase)
        .filter(|token| token.len() >= 3 && !GENERIC_NAME_TOKENS.contains(&token.as_str()))
        .any(|token| {
            words.iter().any(|word| {
                word == &token
                    || (token.len() >= STEM_CHARS && word.len() >= STEM_CHARS && stem(word) == stem(&token))
            })
        })
}

#[async_trait]
impl Planner for CatalogPlanner {
    async fn plan(
        &self,
        question: &Question,
        capabilities: &CapabilitySet,
    ) -> Result<PlanOutcome, PlannerError> {
        let words = question_words(&question.text);
        let comprehensive = self.is_comprehensive(&words);

        let mut selected = Vec::new();
        let mut needs_input = Vec::new();
        for (agent_id, tool) in capabilities.tools() {
            if !comprehensive && !name_matches(&tool.name, &words) {
                continue;
            }
            let arguments = tool.bind_arguments(&question.identifiers, &Value::Null);
            let missing = tool.missing_required(&arguments);
            if !missing.is_empty() {
                debug!(tool = %tool.name, missing = ?missing, "Skipping tool with unbound required fields");
                needs_input.push(format!("{} needs {}", tool.name, missing.join(", ")));
                continue;
            }
            selected.push(PlannedInvocation::tool(agent_id.clone(), tool.name.clone(), arguments));
        }

        if !selected.is_empty() {
            let reasoning = if comprehensive {
                format!("comprehensive request; running all {} applicable tools", selected.len())
            } else {
                format!("{} tool(s) named in the question", selected.len())
            };
            return Ok(PlanOutcome::Plan(Plan::single_group(reasoning, selected)));
        }

        let delegates: Vec<PlannedInvocation> = capabilities
            .cards()
            .filter(|card| card.matches_question(&question.text))
            .map(|card| PlannedInvocation::delegate(card.agent_id.clone()))
            .collect();
        if !delegates.is_empty() {
            let reasoning = format!("delegating to {} agent(s) with matching skills", delegates.len());
            return Ok(PlanOutcome::Plan(Plan::single_group(reasoning, delegates)));
        }

        let reason = if needs_input.is_empty() {
            "no capability matched the question".to_string()
        } else {
            format!(
                "matching tools need inputs the request did not supply ({})",
                needs_input.join("; ")
            )
        };
        Ok(PlanOutcome::NoPlan { reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::{AgentCard, AgentId, AgentSkill, PROTOCOL_VERSION};
    use crate::domain::capability::{ToolDescriptor, ToolSnapshot};
    use crate::domain::plan::CallTarget;
    use serde_json::json;
    use std::sync::Arc;

    fn pool_tool(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(
            name,
            "",
            json!({
                "type": "object",
                "properties": { "pool_address": { "type": "string" } },
                "required": ["pool_address"]
            }),
        )
    }

    fn capabilities() -> CapabilitySet {
        let card = AgentCard {
            agent_id: AgentId::new("pool_risk"),
            name: "Pool Risk".into(),
            description: String::new(),
            base_url: "http://pool".into(),
            tools_url: None,
            protocol_version: PROTOCOL_VERSION.into(),
            skills: vec![AgentSkill {
                id: "pool".into(),
                name: "Pool Assessment".into(),
                description: String::new(),
                tags: vec!["liquidity".into()],
            }],
        };
        let tools = ToolSnapshot::build(vec![
            pool_tool("concentration_risk"),
            pool_tool("liquidity_depth"),
            pool_tool("market_risk"),
            pool_tool("behavioral_risk"),
            ToolDescriptor::new(
                "composite_risk_score",
                "",
                json!({ "type": "object", "required": ["results"] }),
            ),
        ])
        .unwrap();
        let mut set = CapabilitySet::new();
        set.insert(Arc::new(card), Arc::new(tools));
        set
    }

    fn tool_names(outcome: &PlanOutcome) -> Vec<String> {
        match outcome {
            PlanOutcome::Plan(plan) => plan.groups()[0]
                .invocations
                .iter()
                .map(|p| p.call.tool_name().unwrap_or("<delegate>").to_string())
                .collect(),
            PlanOutcome::NoPlan { .. } => vec![],
        }
    }

    #[tokio::test]
    async fn test_single_named_tool() {
        let question = Question::new("What is the concentration risk?").with_identifier("pool_address", "0xpool");
        let outcome = CatalogPlanner::new().plan(&question, &capabilities()).await.unwrap();
        assert_eq!(tool_names(&outcome), vec!["concentration_risk"]);

        let PlanOutcome::Plan(plan) = outcome else { panic!("expected a plan") };
        let CallTarget::Tool { arguments, .. } = &plan.groups()[0].invocations[0].call else {
            panic!("expected a tool call")
        };
        assert_eq!(arguments, &json!({ "pool_address": "0xpool" }));
    }

    #[tokio::test]
    async fn test_comprehensive_selects_every_bindable_tool() {
        let question = Question::new("Give me a full risk analysis").with_identifier("pool_address", "0xpool");
        let outcome = CatalogPlanner::new().plan(&question, &capabilities()).await.unwrap();
        assert_eq!(
            tool_names(&outcome),
            vec!["behavioral_risk", "concentration_risk", "liquidity_depth", "market_risk"]
        );
    }

    #[tokio::test]
    async fn test_stemmed_match() {
        let question = Question::new("Any odd behaviour from holders?").with_identifier("pool_address", "0xpool");
        let outcome = CatalogPlanner::new().plan(&question, &capabilities()).await.unwrap();
        assert_eq!(tool_names(&outcome), vec!["behavioral_risk"]);
    }

    #[tokio::test]
    async fn test_unbound_tools_fall_back_to_delegation() {
        let question = Question::new("How is the liquidity?");
        let outcome = CatalogPlanner::new().plan(&question, &capabilities()).await.unwrap();
        assert_eq!(tool_names(&outcome), vec!["<delegate>"]);
    }

    #[tokio::test]
    async fn test_no_match_is_no_plan() {
        let question = Question::new("hello there");
        let outcome = CatalogPlanner::new().plan(&question, &capabilities()).await.unwrap();
        assert!(matches!(outcome, PlanOutcome::NoPlan { .. }));
    }
}
