// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application services.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Use cases built on the domain ports: discovery clients,
//!   the execution coordinator, aggregation, the orchestrator workflow and
//!   the agent-side registry and service.

pub mod agent_directory;
pub mod agent_service;
pub mod aggregator;
pub mod capability_client;
pub mod capability_registry;
pub mod catalog_planner;
pub mod coordinator;
pub mod dispatch;
pub mod orchestrator;
