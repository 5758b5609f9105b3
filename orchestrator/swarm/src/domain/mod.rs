// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Registry Domain Layer
//!
//! Lock-free data structures for agent bookkeeping. Mutual exclusion is
//! provided by the application layer.
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`record`] | `AgentRecord` |
//! | [`registry`] | `AgentRegistry` (primary table + session/parent indexes) |
//! | [`mailbox`] | `MailboxStore` |
//! | [`lifecycle`] | `RegistryStats`, status updates |
//! | [`error`] | `RegistryError` |

pub mod error;
pub mod lifecycle;
pub mod mailbox;
pub mod record;
pub mod registry;

pub use error::RegistryError;
pub use lifecycle::{RegistryStats, StatusChange};
pub use mailbox::MailboxStore;
pub use record::AgentRecord;
pub use registry::AgentRegistry;
