// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! agentmesh CLI library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** Server wiring, the orchestrator HTTP client and the
//!   subcommand handlers behind the `agentmesh` binary

pub mod commands;
pub mod daemon;
