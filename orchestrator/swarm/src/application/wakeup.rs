// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Wake-up Trigger
//!
//! Decides, for every delivered message, whether the recipient's step
//! executor must be started, and runs the executor on a tracked task.
//!
//! ## Policy
//!
//! | Recipient | Decision |
//! |-----------|----------|
//! | not registered | leave queued ([`Delivery::Queued`]) |
//! | `running` | leave queued, the in-flight step drains it ([`Delivery::Busy`]) |
//! | `completed` / `failed` / `cancelled` | flip to `running` and wake ([`Delivery::Woken`]) |
//!
//! [`decide`] runs inside the registry critical section, so reading the
//! status and flipping it to `running` is a single atomic step. At most one
//! step execution is outstanding per agent id.
//!
//! [`WakeupDispatcher`] runs outside that section. It never holds registry
//! locks across the executor call and always produces exactly one
//! [`WakeReport`] per dispatched ticket, converting errors, panics and
//! timeouts into `Err`.

use futures::FutureExt;
use metrics::{counter, gauge};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use switchboard_core::domain::registry_config::WakeupConfig;
use switchboard_core::domain::{Message, MessageId, StepError, StepExecutor, StepOutcome, StepRequest};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::{debug, info_span, Instrument};

use crate::domain::AgentRegistry;

/// What happened to a message after it was queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// No registered recipient (or the registry is shutting down); the
    /// message waits in the mailbox.
    Queued,
    /// Recipient is already running and will drain its own mailbox.
    Busy,
    /// Recipient was idle and a step execution was started.
    Woken,
}

/// Snapshot of everything a wake-up needs, taken under the registry lock.
#[derive(Debug, Clone)]
pub struct WakeTicket {
    pub agent_id: String,
    pub generation: u64,
    pub wake_seq: u64,
    pub message_id: MessageId,
    pub request: StepRequest,
}

#[derive(Debug)]
pub enum WakeDecision {
    Queued,
    Busy,
    Wake(Box<WakeTicket>),
}

impl WakeDecision {
    pub fn delivery(&self) -> Delivery {
        match self {
            WakeDecision::Queued => Delivery::Queued,
            WakeDecision::Busy => Delivery::Busy,
            WakeDecision::Wake(_) => Delivery::Woken,
        }
    }
}

/// Result of one dispatched step execution.
#[derive(Debug)]
pub struct WakeReport {
    pub agent_id: String,
    pub generation: u64,
    pub wake_seq: u64,
    pub result: Result<StepOutcome, StepError>,
}

/// Apply the wake-up policy to `message`, which must already be queued.
///
/// Must be called while holding the lock that guards `registry`.
pub fn decide(registry: &mut AgentRegistry, message: &Message, accepting: bool) -> WakeDecision {
    let Some(record) = registry.get_mut(&message.to_agent_id) else {
        return WakeDecision::Queued;
    };

    if record.status().is_running() {
        return WakeDecision::Busy;
    }

    if !accepting {
        return WakeDecision::Queued;
    }

    let wake_seq = record.begin_wake();
    WakeDecision::Wake(Box::new(WakeTicket {
        agent_id: record.agent_id().to_string(),
        generation: record.generation(),
        wake_seq,
        message_id: message.id,
        request: StepRequest {
            agent_state: record.agent_state.clone(),
            prompt: message.prompt.clone(),
            params: message.params.clone(),
            fingerprint_id: record.fingerprint_id.clone(),
            file_context: record.file_context.clone(),
            transport: record.transport.clone(),
            user_input_id: record.user_input_id.clone(),
        },
    }))
}

/// Runs step executions on tracked tokio tasks.
#[derive(Clone)]
pub struct WakeupDispatcher {
    executor: Arc<dyn StepExecutor>,
    tracker: TaskTracker,
    permits: Option<Arc<Semaphore>>,
    step_timeout: Option<Duration>,
}

impl WakeupDispatcher {
    pub fn new(executor: Arc<dyn StepExecutor>, config: &WakeupConfig) -> Self {
        Self {
            executor,
            tracker: TaskTracker::new(),
            // Zero permits would park every wake-up forever; treat it as unbounded.
            permits: config
                .max_concurrent
                .filter(|limit| *limit > 0)
                .map(|limit| Arc::new(Semaphore::new(limit))),
            step_timeout: config.step_timeout(),
        }
    }

    /// False once [`WakeupDispatcher::shutdown`] has begun, or when the
    /// caller is not inside a tokio runtime and nothing could be spawned.
    pub fn is_accepting(&self) -> bool {
        !self.tracker.is_closed() && Handle::try_current().is_ok()
    }

    /// Step executions spawned and not yet reported.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Spawn the executor for `ticket` and hand its outcome to `report`.
    ///
    /// Must be called from within a tokio runtime; check
    /// [`WakeupDispatcher::is_accepting`] before taking the ticket.
    pub fn dispatch<F>(&self, ticket: WakeTicket, report: F)
    where
        F: FnOnce(WakeReport) + Send + 'static,
    {
        let executor = self.executor.clone();
        let permits = self.permits.clone();
        let step_timeout = self.step_timeout;
        let span = info_span!(
            "wakeup",
            agent_id = %ticket.agent_id,
            message_id = %ticket.message_id,
            wake_seq = ticket.wake_seq
        );

        counter!("switchboard_wakeups_total").increment(1);
        gauge!("switchboard_wakeups_in_flight").increment(1.0);

        self.tracker.spawn(
            async move {
                let WakeTicket {
                    agent_id,
                    generation,
                    wake_seq,
                    request,
                    ..
                } = ticket;

                // Semaphore is never closed, so acquisition only waits.
                let _permit = match permits {
                    Some(permits) => permits.acquire_owned().await.ok(),
                    None => None,
                };

                debug!("Running step executor");
                let result = run_step_guarded(executor, request, step_timeout).await;
                gauge!("switchboard_wakeups_in_flight").decrement(1.0);

                report(WakeReport {
                    agent_id,
                    generation,
                    wake_seq,
                    result,
                });
            }
            .instrument(span),
        );
    }

    /// Stop starting new executions and wait for in-flight ones to report.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

async fn run_step_guarded(
    executor: Arc<dyn StepExecutor>,
    request: StepRequest,
    step_timeout: Option<Duration>,
) -> Result<StepOutcome, StepError> {
    let call = AssertUnwindSafe(executor.run_step(request)).catch_unwind();

    let caught = match step_timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(caught) => caught,
            Err(_) => return Err(StepError::TimedOut(limit)),
        },
        None => call.await,
    };

    caught.unwrap_or_else(|panic| Err(StepError::Panicked(panic_message(panic.as_ref()))))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
