// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent Directory Client
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Resolves configured agent ids to their advertised cards,
//!   independent of tool-level detail. Cards are cached with a TTL and an
//!   unreachable agent's card is discarded.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::agent::{AgentCard, AgentId};
use crate::domain::config::AgentEndpointConfig;
use crate::domain::errors::{DirectoryError, DiscoveryError};
use crate::domain::transport::AgentTransport;
use crate::infrastructure::cache::SnapshotCache;

/// Cache status of one configured agent.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AgentDirectoryEntry {
    pub agent_id: AgentId,
    pub base_url: String,
    pub card_url: String,
    pub card_cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<AgentCard>,
}

pub struct AgentDirectory {
    transport: Arc<dyn AgentTransport>,
    endpoints: BTreeMap<AgentId, AgentEndpointConfig>,
    cards: SnapshotCache<AgentId, AgentCard>,
}

impl AgentDirectory {
    pub fn new(
        transport: Arc<dyn AgentTransport>,
        endpoints: impl IntoIterator<Item = AgentEndpointConfig>,
        ttl: Duration,
    ) -> Self {
        Self {
            transport,
            endpoints: endpoints
                .into_iter()
                .map(|endpoint| (endpoint.id.clone(), endpoint))
                .collect(),
            cards: SnapshotCache::new(ttl),
        }
    }

    pub fn known_agents(&self) -> Vec<AgentId> {
        self.endpoints.keys().cloned().collect()
    }

    pub fn is_configured(&self, agent_id: &AgentId) -> bool {
        self.endpoints.contains_key(agent_id)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub async fn resolve(&self, agent_id: &AgentId) -> Result<Arc<AgentCard>, DirectoryError> {
        let endpoint = self
            .endpoints
            .get(agent_id)
            .ok_or_else(|| DirectoryError::NotFound(agent_id.clone()))?;

        if let Some(card) = self.cards.get(agent_id) {
            debug!(agent_id = %agent_id, "Using cached agent card");
            return Ok(card);
        }

        let card_url = endpoint.card_url();
        let card = match self.transport.fetch_card(&card_url).await {
            Ok(card) => card,
            Err(DiscoveryError::Unreachable(reason)) => {
                warn!(agent_id = %agent_id, reason = %reason, "Agent unreachable; discarding cached card");
                self.cards.invalidate(agent_id);
                return Err(DirectoryError::Unreachable {
                    agent_id: agent_id.clone(),
                    reason,
                });
            }
            Err(DiscoveryError::ProtocolMismatch(reason)) => {
                self.cards.invalidate(agent_id);
                return Err(DirectoryError::ProtocolMismatch {
                    agent_id: agent_id.clone(),
                    reason,
                });
            }
        };

        if !card.is_compatible() {
            self.cards.invalidate(agent_id);
            return Err(DirectoryError::ProtocolMismatch {
                agent_id: agent_id.clone(),
                reason: format!("unsupported protocol version '{}'", card.protocol_version),
            });
        }

        let card = self.normalize(card, endpoint);
        info!(agent_id = %agent_id, name = %card.name, skills = card.skills.len(), "Resolved agent card");
        Ok(self.cards.replace(agent_id.clone(), card))
    }

    /// The configured id and base URL are authoritative over what the card
    /// claims.
    fn normalize(&self, mut card: AgentCard, endpoint: &AgentEndpointConfig) -> AgentCard {
        if card.agent_id != endpoint.id {
            debug!(
                configured = %endpoint.id,
                advertised = %card.agent_id,
                "Agent card advertises a different id; using the configured one"
            );
            card.agent_id = endpoint.id.clone();
        }
        if card.base_url.trim().is_empty() {
            card.base_url = endpoint.base_url.trim_end_matches('/').to_string();
        }
        card
    }

    pub fn invalidate(&self, agent_id: &AgentId) -> bool {
        self.cards.invalidate(agent_id)
    }

    pub fn invalidate_all(&self) {
        self.cards.invalidate_all();
    }

    pub fn cached(&self, agent_id: &AgentId) -> Option<Arc<AgentCard>> {
        self.cards.get(agent_id)
    }

    pub fn entries(&self) -> Vec<AgentDirectoryEntry> {
        self.endpoints
            .values()
            .map(|endpoint| {
                let card = self.cards.get(&endpoint.id);
                AgentDirectoryEntry {
                    agent_id: endpoint.id.clone(),
                    base_url: endpoint.base_url.clone(),
                    card_url: endpoint.card_url(),
                    card_cached: card.is_some(),
                    card: card.map(|c| c.as_ref().clone()),
                }
            })
            .collect()
    }
}
