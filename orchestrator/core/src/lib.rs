// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! agentmesh core
//!
//! Plan-and-execute orchestration over remote analysis agents: discover
//! what each agent can do, plan which capabilities a question needs, run
//! them in parallel and merge the results into one answer.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain model, application services, transports and the
//!   HTTP routers shared by the orchestrator and agent binaries.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
