// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `switchboard-core` — Domain Types and Ports
//!
//! Shared vocabulary for the Switchboard agent orchestration registry.
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `AgentState`, `AgentStatus`, `Message`, `TransportHandle`, `StepExecutor`, `RegistryEvent`, `RegistryConfig` |
//! | [`infrastructure`] | Infrastructure | In-memory `EventBus` |
//!
//! The registry itself lives in `switchboard-swarm`; this crate carries no
//! mutable state.

pub mod domain;
pub mod infrastructure;

pub use domain::*;
