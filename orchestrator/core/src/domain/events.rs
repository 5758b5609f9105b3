// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::agent::AgentStatus;
use crate::domain::message::MessageId;

/// Registry domain events, published on the [`EventBus`](crate::infrastructure::event_bus::EventBus)
/// in the same critical section as the state change they describe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegistryEvent {
    AgentRegistered {
        agent_id: String,
        session_id: String,
        parent_id: Option<String>,
        status: AgentStatus,
        /// True when an existing record with the same id was overwritten.
        replaced: bool,
        registered_at: DateTime<Utc>,
    },
    AgentStateUpdated {
        agent_id: String,
        previous_status: AgentStatus,
        status: AgentStatus,
        updated_at: DateTime<Utc>,
    },
    AgentRemoved {
        agent_id: String,
        session_id: String,
        dropped_messages: usize,
        removed_at: DateTime<Utc>,
    },
    MessageQueued {
        message_id: MessageId,
        from_agent_id: String,
        to_agent_id: String,
        queue_depth: usize,
        queued_at: DateTime<Utc>,
    },
    AgentWoken {
        agent_id: String,
        message_id: MessageId,
        woken_at: DateTime<Utc>,
    },
    WakeupFailed {
        agent_id: String,
        error: String,
        failed_at: DateTime<Utc>,
    },
}

impl RegistryEvent {
    /// The agent this event is about (the recipient, for queued messages).
    pub fn agent_id(&self) -> &str {
        match self {
            RegistryEvent::AgentRegistered { agent_id, .. }
            | RegistryEvent::AgentStateUpdated { agent_id, .. }
            | RegistryEvent::AgentRemoved { agent_id, .. }
            | RegistryEvent::AgentWoken { agent_id, .. }
            | RegistryEvent::WakeupFailed { agent_id, .. } => agent_id,
            RegistryEvent::MessageQueued { to_agent_id, .. } => to_agent_id,
        }
    }
}
