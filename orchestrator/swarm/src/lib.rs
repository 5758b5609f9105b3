// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `switchboard-swarm` — Agent Orchestration Registry
//!
//! Tracks every live agent of a multi-agent system, its parent/child
//! hierarchy and session membership, holds per-agent mailboxes, and wakes
//! idle agents when a message arrives for them.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `AgentRecord`, `AgentRegistry`, `MailboxStore`, `RegistryStats` |
//! | [`application`] | Application | `OrchestrationRegistry` facade, wake-up dispatcher |
//!
//! ## Key Concepts
//!
//! - **Session**: all agents spawned while serving one user conversation.
//!   Cleaning up a session removes every agent indexed under it.
//! - **Mailbox**: FIFO queue keyed by recipient id. A message may be queued
//!   before its recipient is registered.
//! - **Wake-up**: delivering a message to an agent that is not `running`
//!   flips it to `running` and starts one step execution. At most one step
//!   execution is outstanding per agent.
//!
//! All state is in memory and lost on restart.

pub mod application;
pub mod domain;

pub use application::{Delivery, OrchestrationRegistry};
pub use domain::*;
