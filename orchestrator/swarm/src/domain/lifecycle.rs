// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Lifecycle Tracker
//!
//! Status transitions and aggregate statistics over an [`AgentRegistry`].
//!
//! Terminal transitions are always externally driven: the registry never
//! infers `completed`/`failed`/`cancelled` from message traffic.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use switchboard_core::domain::{AgentState, AgentStatus};

use super::registry::AgentRegistry;

/// Registry-wide counts, recomputed from the table on every call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub total_agents: usize,
    pub running_agents: usize,
    pub completed_agents: usize,
    pub failed_agents: usize,
    pub cancelled_agents: usize,
    pub active_sessions: usize,
}

/// Result of applying a state update to a known agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub previous: AgentStatus,
    pub current: AgentStatus,
}

impl AgentRegistry {
    /// Replace the stored state of `agent_state.agent_id` and set its status.
    ///
    /// Returns `None` (and changes nothing) when the agent is not registered;
    /// late reports from executors whose agent was already cleaned up land
    /// here.
    pub fn update_agent_state(
        &mut self,
        agent_state: AgentState,
        status: AgentStatus,
    ) -> Option<StatusChange> {
        let previous = self.get(&agent_state.agent_id)?.status();
        self.replace_state(agent_state, status)?;
        Some(StatusChange {
            previous,
            current: status,
        })
    }

    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats::default();
        let mut sessions = HashSet::new();

        for record in self.records() {
            stats.total_agents += 1;
            match record.status() {
                AgentStatus::Running => stats.running_agents += 1,
                AgentStatus::Completed => stats.completed_agents += 1,
                AgentStatus::Failed => stats.failed_agents += 1,
                AgentStatus::Cancelled => stats.cancelled_agents += 1,
            }
            sessions.insert(record.session_id.as_str());
        }

        stats.active_sessions = sessions.len();
        stats
    }
}
