// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Scripted step executors and helpers shared by the registry integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use switchboard_core::domain::{AgentState, StepError, StepExecutor, StepOutcome, StepRequest};
use switchboard_swarm::{AgentRecord, OrchestrationRegistry};
use tokio::sync::Semaphore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Return the agent's state with a `steps` counter bumped.
    Complete,
    Fail,
    Panic,
    /// Never return.
    Hang,
    /// Return state belonging to some other agent.
    WrongAgent,
}

pub struct ScriptedExecutor {
    behavior: Behavior,
    calls: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
    delay: Option<Duration>,
    gate: Option<Arc<Semaphore>>,
    requests: Mutex<Vec<StepRequest>>,
}

impl ScriptedExecutor {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            delay: None,
            gate: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Block every call until a permit is added to `gate`.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed running at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<StepRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl StepExecutor for ScriptedExecutor {
    async fn run_step(&self, request: StepRequest) -> Result<StepOutcome, StepError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(active, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        match self.behavior {
            Behavior::Complete => {
                let mut agent_state = request.agent_state;
                let steps = agent_state
                    .get("steps")
                    .and_then(|value| value.as_u64())
                    .unwrap_or(0);
                agent_state.set("steps", json!(steps + 1));
                Ok(StepOutcome {
                    agent_state,
                    has_end_turn: true,
                })
            }
            Behavior::Fail => Err(StepError::ExecutionFailed("model unavailable".to_string())),
            Behavior::Panic => panic!("executor exploded"),
            Behavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            Behavior::WrongAgent => Ok(StepOutcome {
                agent_state: AgentState::new("impostor"),
                has_end_turn: true,
            }),
        }
    }
}

pub fn record(agent_id: &str, session_id: &str) -> AgentRecord {
    AgentRecord::new(
        AgentState::new(agent_id),
        session_id,
        format!("input-{agent_id}"),
    )
}

/// Wait until every dispatched wake-up has reported back.
pub async fn settle(registry: &OrchestrationRegistry) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while registry.in_flight_wakeups() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("wake-ups did not settle");
}

/// Wait until the executor has been entered `calls` times.
pub async fn wait_for_calls(executor: &ScriptedExecutor, calls: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while executor.calls() < calls {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("executor was not called");
}
