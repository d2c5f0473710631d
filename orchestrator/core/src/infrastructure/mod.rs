// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Infrastructure adapters.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure Layer
//! - **Purpose:** HTTP and in-process agent transports, the TTL snapshot
//!   cache and the LLM adapters behind the planner and synthesizer ports.

pub mod cache;
pub mod http_transport;
pub mod llm;
pub mod local_transport;
