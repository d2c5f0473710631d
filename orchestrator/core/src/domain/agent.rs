// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent identity as advertised by a remote agent's discovery document.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** `AgentId`, `AgentCard` and the skill summary planners read.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol version this engine speaks. Cards with a different major
/// version are rejected as a protocol mismatch.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Path of the discovery document relative to an agent's base URL.
pub const DEFAULT_CARD_PATH: &str = "/.well-known/agent.json";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSkill {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Advertised identity of a remote agent.
///
/// `base_url` is where the agent answers `/v1/invoke`. `tools_url`, when
/// present, points at the agent's capability registry; otherwise the
/// registry is served from `base_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCard {
    pub agent_id: AgentId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_url: Option<String>,
    pub protocol_version: String,
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

impl AgentCard {
    pub fn tools_endpoint(&self) -> &str {
        self.tools_url.as_deref().unwrap_or(&self.base_url)
    }

    pub fn is_compatible(&self) -> bool {
        major_version(&self.protocol_version) == major_version(PROTOCOL_VERSION)
    }

    /// True when any skill tag, or a word of a skill name, occurs in the
    /// question.
    pub fn matches_question(&self, question: &str) -> bool {
        let words = question_words(question);
        self.skills.iter().any(|skill| {
            skill
                .tags
                .iter()
                .map(|tag| tag.to_lowercase())
                .chain(question_words(&skill.name))
                .filter(|term| term.len() > 3)
                .any(|term| words.iter().any(|w| w == &term))
        })
    }

    /// One block per agent: name, description and skills.
    pub fn summary(&self) -> String {
        let mut out = format!("Agent: {} ({})\n", self.name, self.agent_id);
        if !self.description.is_empty() {
            out.push_str(&format!("Description: {}\n", self.description));
        }
        if !self.skills.is_empty() {
            out.push_str("Skills:\n");
            for skill in &self.skills {
                out.push_str(&format!("  - {}: {}", skill.name, skill.description));
                if !skill.tags.is_empty() {
                    out.push_str(&format!(" [tags: {}]", skill.tags.join(", ")));
                }
                out.push('\n');
            }
        }
        out
    }
}

pub fn format_agents_summary<'a>(cards: impl IntoIterator<Item = &'a AgentCard>) -> String {
    let blocks: Vec<String> = cards.into_iter().map(AgentCard::summary).collect();
    if blocks.is_empty() {
        "No agents available.".to_string()
    } else {
        blocks.join("\n")
    }
}

fn major_version(version: &str) -> &str {
    version.trim().split('.').next().unwrap_or_default()
}

/// Lowercased alphanumeric words of free text.
pub fn question_words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}
