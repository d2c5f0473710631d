// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain model for the orchestration engine.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Agents, capabilities, plans, invocations and the workflow
//!   state machine, plus the ports (planner, transport, LLM) the
//!   application layer is wired against.

pub mod agent;
pub mod capability;
pub mod config;
pub mod errors;
pub mod invocation;
pub mod llm;
pub mod plan;
pub mod planner;
pub mod protocol;
pub mod result;
pub mod transport;
pub mod workflow;
