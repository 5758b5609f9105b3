// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Orchestration Registry
//!
//! The facade the rest of the system talks to. Composes the agent table,
//! mailboxes, lifecycle tracker and wake-up trigger behind a single
//! `parking_lot::Mutex`, so every public operation is atomic with respect to
//! every other and no reader can observe a record in one index but not in
//! another.
//!
//! Registry events are published inside the same critical section as the
//! change they describe. The lock is never held across a step execution.

use chrono::Utc;
use metrics::counter;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use switchboard_core::domain::{
    AgentState, AgentStatus, Message, RegistryConfig, RegistryEvent, StepError, StepExecutor,
};
use switchboard_core::infrastructure::event_bus::{AgentEventReceiver, EventBus, EventReceiver};
use tracing::{debug, info, warn};

use super::wakeup::{decide, Delivery, WakeDecision, WakeReport, WakeupDispatcher};
use crate::domain::{AgentRecord, AgentRegistry, MailboxStore, RegistryError, RegistryStats};

#[derive(Default)]
struct RegistryState {
    agents: AgentRegistry,
    mailboxes: MailboxStore,
}

struct Shared {
    state: Mutex<RegistryState>,
    events: EventBus,
}

/// Thread-safe, cheaply cloneable handle to one in-process registry.
#[derive(Clone)]
pub struct OrchestrationRegistry {
    shared: Arc<Shared>,
    dispatcher: WakeupDispatcher,
    config: Arc<RegistryConfig>,
}

impl OrchestrationRegistry {
    pub fn new(executor: Arc<dyn StepExecutor>) -> Self {
        Self::with_config(executor, RegistryConfig::default())
    }

    pub fn with_config(executor: Arc<dyn StepExecutor>, config: RegistryConfig) -> Self {
        let dispatcher = WakeupDispatcher::new(executor, &config.spec.wakeup);
        let events = EventBus::new(config.spec.events.capacity.max(1));
        info!(
            registry = %config.metadata.name,
            max_concurrent = ?config.spec.wakeup.max_concurrent,
            step_timeout = ?config.spec.wakeup.step_timeout(),
            "Orchestration registry created"
        );
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(RegistryState::default()),
                events,
            }),
            dispatcher,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.shared.events
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.shared.events.subscribe()
    }

    /// Events concerning a single agent, including messages addressed to it.
    pub fn subscribe_agent(&self, agent_id: impl Into<String>) -> AgentEventReceiver {
        self.shared.events.subscribe_agent(agent_id)
    }

    // ── Agent registry ──────────────────────────────────────────────────

    /// Insert or replace a record (last write wins). Returns the replaced
    /// record when the id was already registered.
    pub fn register_agent(&self, record: AgentRecord) -> Result<Option<AgentRecord>, RegistryError> {
        if record.agent_id().is_empty() {
            return Err(RegistryError::MissingAgentId);
        }
        if record.session_id.is_empty() {
            return Err(RegistryError::MissingSessionId(record.agent_id().to_string()));
        }

        let agent_id = record.agent_id().to_string();
        let session_id = record.session_id.clone();
        let parent_id = record.agent_state.parent_id.clone();
        let status = record.status();

        let mut state = self.shared.state.lock();
        let previous = state.agents.register(record);

        if let Some(previous) = &previous {
            warn!(
                agent_id = %agent_id,
                previous_session = %previous.session_id,
                "Agent id re-registered, previous record overwritten"
            );
        }
        info!(agent_id = %agent_id, session_id = %session_id, %status, "Agent registered");
        counter!("switchboard_agents_registered_total").increment(1);

        self.shared.events.publish(RegistryEvent::AgentRegistered {
            agent_id,
            session_id,
            parent_id,
            status,
            replaced: previous.is_some(),
            registered_at: Utc::now(),
        });

        Ok(previous)
    }

    pub fn get_agent(&self, agent_id: &str) -> Option<AgentRecord> {
        self.shared.state.lock().agents.get(agent_id).cloned()
    }

    pub fn get_session_agents(&self, session_id: &str) -> Vec<AgentRecord> {
        let state = self.shared.state.lock();
        state
            .agents
            .session_agents(session_id)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn get_child_agents(&self, parent_id: &str) -> Vec<AgentRecord> {
        let state = self.shared.state.lock();
        state
            .agents
            .child_agents(parent_id)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn has_running_children(&self, parent_id: &str) -> bool {
        self.shared.state.lock().agents.has_running_children(parent_id)
    }

    /// Remove an agent and its mailbox. Unknown ids are a no-op.
    pub fn remove_agent(&self, agent_id: &str) -> Option<AgentRecord> {
        let mut state = self.shared.state.lock();
        self.remove_locked(&mut state, agent_id)
    }

    /// Remove every agent indexed under `session_id`. Returns how many were removed.
    pub fn cleanup_session(&self, session_id: &str) -> usize {
        let mut state = self.shared.state.lock();
        let agent_ids = state.agents.session_agent_ids(session_id);
        let removed = agent_ids
            .iter()
            .filter(|agent_id| self.remove_locked(&mut state, agent_id).is_some())
            .count();

        if removed > 0 {
            info!(session_id = %session_id, removed, "Session cleaned up");
        }
        removed
    }

    /// Remove every agent whose `user_input_id` starts with `prefix`,
    /// across all sessions. Returns how many were removed.
    pub fn cleanup_user_input_agents(&self, prefix: &str) -> usize {
        let mut state = self.shared.state.lock();
        let agent_ids = state.agents.agent_ids_with_user_input_prefix(prefix);
        let removed = agent_ids
            .iter()
            .filter(|agent_id| self.remove_locked(&mut state, agent_id).is_some())
            .count();

        if removed > 0 {
            info!(user_input_prefix = %prefix, removed, "User input scope cleaned up");
        }
        removed
    }

    fn remove_locked(&self, state: &mut RegistryState, agent_id: &str) -> Option<AgentRecord> {
        let record = state.agents.remove(agent_id)?;
        let dropped_messages = state.mailboxes.discard(agent_id);

        info!(agent_id = %agent_id, dropped_messages, "Agent removed");
        counter!("switchboard_agents_removed_total").increment(1);

        self.shared.events.publish(RegistryEvent::AgentRemoved {
            agent_id: agent_id.to_string(),
            session_id: record.session_id.clone(),
            dropped_messages,
            removed_at: Utc::now(),
        });
        Some(record)
    }

    // ── Lifecycle tracker ───────────────────────────────────────────────

    /// Replace the stored state of `agent_state.agent_id` and set `status`.
    ///
    /// Silently ignored when the agent is not registered. Returns whether
    /// the update was applied.
    pub fn update_agent_state(&self, agent_state: AgentState, status: AgentStatus) -> bool {
        let mut state = self.shared.state.lock();
        self.apply_update_locked(&mut state, agent_state, status)
    }

    /// [`OrchestrationRegistry::update_agent_state`] for untyped payloads, as
    /// reported by step executors that speak JSON.
    pub fn update_agent_state_json(
        &self,
        agent_state: Value,
        status: &str,
    ) -> Result<bool, RegistryError> {
        let status: AgentStatus = status.parse()?;
        let agent_state = AgentState::from_value(agent_state)?;
        Ok(self.update_agent_state(agent_state, status))
    }

    fn apply_update_locked(
        &self,
        state: &mut RegistryState,
        agent_state: AgentState,
        status: AgentStatus,
    ) -> bool {
        let agent_id = agent_state.agent_id.clone();
        match state.agents.update_agent_state(agent_state, status) {
            Some(change) => {
                debug!(agent_id = %agent_id, from = %change.previous, to = %change.current, "Agent state updated");
                self.shared.events.publish(RegistryEvent::AgentStateUpdated {
                    agent_id,
                    previous_status: change.previous,
                    status: change.current,
                    updated_at: Utc::now(),
                });
                true
            }
            None => {
                debug!(agent_id = %agent_id, "State update for unknown agent ignored");
                false
            }
        }
    }

    pub fn get_stats(&self) -> RegistryStats {
        self.shared.state.lock().agents.stats()
    }

    // ── Mailboxes & wake-up ─────────────────────────────────────────────

    /// Queue `message` for its recipient and wake the recipient if it is idle.
    ///
    /// The message is always queued before the wake-up decision. A wake-up
    /// runs the step executor on a spawned task; outside a tokio runtime an
    /// idle recipient is left idle and the message only queues.
    pub fn send_message(&self, message: Message) -> Result<Delivery, RegistryError> {
        if message.to_agent_id.is_empty() {
            return Err(RegistryError::MissingRecipient);
        }

        let decision = {
            let mut state = self.shared.state.lock();
            let queue_depth = state.mailboxes.enqueue(message.clone());
            counter!("switchboard_messages_enqueued_total").increment(1);
            debug!(
                message_id = %message.id,
                from = %message.from_agent_id,
                to = %message.to_agent_id,
                queue_depth,
                "Message queued"
            );
            self.shared.events.publish(RegistryEvent::MessageQueued {
                message_id: message.id,
                from_agent_id: message.from_agent_id.clone(),
                to_agent_id: message.to_agent_id.clone(),
                queue_depth,
                queued_at: Utc::now(),
            });

            let decision = decide(&mut state.agents, &message, self.dispatcher.is_accepting());
            if let WakeDecision::Wake(ticket) = &decision {
                info!(agent_id = %ticket.agent_id, message_id = %ticket.message_id, "Waking idle agent");
                self.shared.events.publish(RegistryEvent::AgentWoken {
                    agent_id: ticket.agent_id.clone(),
                    message_id: ticket.message_id,
                    woken_at: Utc::now(),
                });
            }
            decision
        };

        let delivery = decision.delivery();
        if let WakeDecision::Wake(ticket) = decision {
            let registry = self.clone();
            self.dispatcher
                .dispatch(*ticket, move |report| registry.complete_wakeup(report));
        }
        Ok(delivery)
    }

    pub fn get_messages(&self, agent_id: &str) -> Vec<Message> {
        self.shared.state.lock().mailboxes.snapshot(agent_id)
    }

    pub fn get_and_clear_messages(&self, agent_id: &str) -> Vec<Message> {
        self.shared.state.lock().mailboxes.drain(agent_id)
    }

    pub fn pending_message_count(&self, agent_id: &str) -> usize {
        self.shared.state.lock().mailboxes.pending(agent_id)
    }

    /// Step executions started by wake-ups and not yet applied.
    pub fn in_flight_wakeups(&self) -> usize {
        self.dispatcher.in_flight()
    }

    /// Stop waking idle agents and wait until every in-flight step execution
    /// has reported back. Messages sent afterwards are still queued.
    pub async fn shutdown(&self) {
        info!(in_flight = self.dispatcher.in_flight(), "Draining wake-ups");
        self.dispatcher.shutdown().await;
    }

    /// Apply a finished step execution. Reports for a record that was removed,
    /// re-registered, re-woken or externally moved out of `running` are stale
    /// and dropped.
    fn complete_wakeup(&self, report: WakeReport) {
        let WakeReport {
            agent_id,
            generation,
            wake_seq,
            result,
        } = report;

        let mut state = self.shared.state.lock();
        let current = state.agents.get(&agent_id).filter(|record| {
            record.generation() == generation
                && record.wake_seq() == wake_seq
                && record.status().is_running()
        });
        let Some(record) = current else {
            debug!(agent_id = %agent_id, "Stale wake-up report ignored");
            return;
        };

        let result = result.and_then(|outcome| {
            if outcome.agent_state.agent_id == agent_id {
                Ok(outcome)
            } else {
                Err(StepError::AgentMismatch {
                    expected: agent_id.clone(),
                    returned: outcome.agent_state.agent_id,
                })
            }
        });

        match result {
            Ok(outcome) => {
                debug!(agent_id = %agent_id, has_end_turn = outcome.has_end_turn, "Step execution finished");
                self.apply_update_locked(&mut state, outcome.agent_state, AgentStatus::Completed);
            }
            Err(error) => {
                warn!(agent_id = %agent_id, error = %error, "Step execution failed");
                counter!("switchboard_wakeup_failures_total").increment(1);
                let agent_state = record.agent_state.clone();
                self.shared.events.publish(RegistryEvent::WakeupFailed {
                    agent_id: agent_id.clone(),
                    error: error.to_string(),
                    failed_at: Utc::now(),
                });
                self.apply_update_locked(&mut state, agent_state, AgentStatus::Failed);
            }
        }
    }
}
