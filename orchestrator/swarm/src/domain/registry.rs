// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Agent Registry
//!
//! Primary table of live [`AgentRecord`]s keyed by agent id, plus two
//! secondary indexes:
//!
//! - **session index**: `session_id -> {agent_id}`
//! - **parent index**: `parent_id -> {agent_id}`
//!
//! # Invariants
//!
//! - An id is present in the primary table iff it is present in exactly one
//!   session set (the one named by its record) and, when it has a parent, in
//!   exactly one parent set.
//! - Empty index sets are pruned, so an index key exists only while it has
//!   members.
//!
//! The registry is a plain data structure; callers provide mutual exclusion
//! (see `OrchestrationRegistry`).

use std::collections::{HashMap, HashSet};
use switchboard_core::domain::{AgentState, AgentStatus};

use super::record::AgentRecord;

#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: HashMap<String, AgentRecord>,
    sessions: HashMap<String, HashSet<String>>,
    children: HashMap<String, HashSet<String>>,
    next_generation: u64,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record under its agent id (last write wins).
    ///
    /// A replaced record is unindexed first, so re-registering under another
    /// session or parent leaves no dangling index entries. Returns the
    /// replaced record, if any.
    pub fn register(&mut self, mut record: AgentRecord) -> Option<AgentRecord> {
        let agent_id = record.agent_id().to_string();
        let previous = self.detach(&agent_id);

        self.next_generation += 1;
        record.stamp_generation(self.next_generation);

        self.index(&record);
        self.agents.insert(agent_id, record);
        previous
    }

    pub fn get(&self, agent_id: &str) -> Option<&AgentRecord> {
        self.agents.get(agent_id)
    }

    /// Mutable access for status changes. Index-relevant fields must not be
    /// changed through this reference; use [`AgentRegistry::replace_state`].
    pub(crate) fn get_mut(&mut self, agent_id: &str) -> Option<&mut AgentRecord> {
        self.agents.get_mut(agent_id)
    }

    pub fn session_agents(&self, session_id: &str) -> Vec<&AgentRecord> {
        self.resolve(self.sessions.get(session_id))
    }

    pub fn child_agents(&self, parent_id: &str) -> Vec<&AgentRecord> {
        self.resolve(self.children.get(parent_id))
    }

    pub fn has_running_children(&self, parent_id: &str) -> bool {
        self.child_agents(parent_id)
            .iter()
            .any(|child| child.status().is_running())
    }

    /// Ids currently indexed under `session_id`.
    pub fn session_agent_ids(&self, session_id: &str) -> Vec<String> {
        self.sessions
            .get(session_id)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Ids of every record whose `user_input_id` starts with `prefix`.
    pub fn agent_ids_with_user_input_prefix(&self, prefix: &str) -> Vec<String> {
        self.agents
            .values()
            .filter(|record| record.user_input_id.starts_with(prefix))
            .map(|record| record.agent_id().to_string())
            .collect()
    }

    /// Remove a record from the table and both indexes. Unknown ids are a no-op.
    pub fn remove(&mut self, agent_id: &str) -> Option<AgentRecord> {
        self.detach(agent_id)
    }

    /// Swap in a new agent state (and status), re-homing the id in the parent
    /// index if the parent changed. Returns `None` when the id is unknown.
    pub(crate) fn replace_state(
        &mut self,
        agent_state: AgentState,
        status: AgentStatus,
    ) -> Option<&AgentRecord> {
        let agent_id = agent_state.agent_id.clone();
        let record = self.agents.get_mut(&agent_id)?;
        let old_parent = record.agent_state.parent_id.take();
        let new_parent = agent_state.parent_id.clone();

        record.agent_state = agent_state;
        record.set_status(status);

        if old_parent != new_parent {
            if let Some(old_parent) = old_parent {
                unlink(&mut self.children, &old_parent, &agent_id);
            }
            if let Some(new_parent) = new_parent {
                self.children
                    .entry(new_parent)
                    .or_default()
                    .insert(agent_id.clone());
            }
        }

        self.agents.get(&agent_id)
    }

    pub fn records(&self) -> impl Iterator<Item = &AgentRecord> {
        self.agents.values()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Number of sessions with at least one registered agent.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn resolve(&self, ids: Option<&HashSet<String>>) -> Vec<&AgentRecord> {
        ids.map(|ids| ids.iter().filter_map(|id| self.agents.get(id)).collect())
            .unwrap_or_default()
    }

    fn index(&mut self, record: &AgentRecord) {
        let agent_id = record.agent_id().to_string();
        self.sessions
            .entry(record.session_id.clone())
            .or_default()
            .insert(agent_id.clone());
        if let Some(parent_id) = record.parent_id() {
            self.children
                .entry(parent_id.to_string())
                .or_default()
                .insert(agent_id);
        }
    }

    fn detach(&mut self, agent_id: &str) -> Option<AgentRecord> {
        let record = self.agents.remove(agent_id)?;
        unlink(&mut self.sessions, &record.session_id, agent_id);
        if let Some(parent_id) = record.parent_id() {
            unlink(&mut self.children, parent_id, agent_id);
        }
        Some(record)
    }
}

fn unlink(index: &mut HashMap<String, HashSet<String>>, key: &str, agent_id: &str) {
    if let Some(ids) = index.get_mut(key) {
        ids.remove(agent_id);
        if ids.is_empty() {
            index.remove(key);
        }
    }
}
