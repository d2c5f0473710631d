// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the agentmesh CLI

pub mod agent;
pub mod ask;
pub mod config;
pub mod status;

pub use self::agent::AgentCommand;
pub use self::config::ConfigCommand;
