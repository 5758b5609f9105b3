// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Layer
//!
//! Pure value types exchanged between the registry and its collaborators.
//! No I/O dependencies.
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`agent`] | `AgentState`, `AgentStatus`, `StateError` |
//! | [`message`] | `Message`, `MessageId` |
//! | [`transport`] | `TransportHandle` |
//! | [`executor`] | `StepExecutor`, `StepRequest`, `StepOutcome`, `StepError` |
//! | [`events`] | `RegistryEvent` |
//! | [`registry_config`] | `RegistryConfig` manifest |

pub mod agent;
pub mod events;
pub mod executor;
pub mod message;
pub mod registry_config;
pub mod transport;

pub use agent::{AgentState, AgentStatus, StateError};
pub use events::RegistryEvent;
pub use executor::{StepError, StepExecutor, StepOutcome, StepRequest};
pub use message::{Message, MessageId};
pub use registry_config::RegistryConfig;
pub use transport::TransportHandle;
