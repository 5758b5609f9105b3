// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Agent Record
//!
//! One [`AgentRecord`] per live agent. Identity, transport and file context
//! are opaque pass-through fields; `status`, `start_time` and the
//! registration generation are owned by the registry and only readable from
//! outside this crate once the record is registered.

use chrono::{DateTime, Utc};
use serde_json::Value;
use switchboard_core::domain::{AgentState, AgentStatus, TransportHandle};

#[derive(Debug, Clone)]
pub struct AgentRecord {
    /// Step-executor owned state; carries the agent id and optional parent id.
    pub agent_state: AgentState,
    pub session_id: String,
    pub user_id: Option<String>,
    pub fingerprint_id: String,
    /// Originating user request. Children append a suffix to their parent's.
    pub user_input_id: String,
    pub transport: TransportHandle,
    pub file_context: Value,
    start_time: DateTime<Utc>,
    status: AgentStatus,
    generation: u64,
    wake_seq: u64,
}

impl AgentRecord {
    /// A new record in the `running` state, stamped with the current time.
    pub fn new(
        agent_state: AgentState,
        session_id: impl Into<String>,
        user_input_id: impl Into<String>,
    ) -> Self {
        Self {
            agent_state,
            session_id: session_id.into(),
            user_id: None,
            fingerprint_id: String::new(),
            user_input_id: user_input_id.into(),
            transport: TransportHandle::detached(),
            file_context: Value::Null,
            start_time: Utc::now(),
            status: AgentStatus::Running,
            generation: 0,
            wake_seq: 0,
        }
    }

    /// Initial status to register with.
    pub fn with_status(mut self, status: AgentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_fingerprint_id(mut self, fingerprint_id: impl Into<String>) -> Self {
        self.fingerprint_id = fingerprint_id.into();
        self
    }

    pub fn with_transport(mut self, transport: TransportHandle) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_file_context(mut self, file_context: Value) -> Self {
        self.file_context = file_context;
        self
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_state.agent_id
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.agent_state.parent_id.as_deref()
    }

    pub fn status(&self) -> AgentStatus {
        self.status
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Registration generation; bumps every time this id is (re-)registered.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn set_status(&mut self, status: AgentStatus) {
        self.status = status;
    }

    pub(crate) fn stamp_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    /// Flip to `running` for a wake-up and return its sequence number.
    pub(crate) fn begin_wake(&mut self) -> u64 {
        self.status = AgentStatus::Running;
        self.wake_seq += 1;
        self.wake_seq
    }

    pub(crate) fn wake_seq(&self) -> u64 {
        self.wake_seq
    }
}
