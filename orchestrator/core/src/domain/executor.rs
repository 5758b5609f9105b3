// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Step Executor Port
//!
//! The registry never runs an agent itself. When a message wakes an idle
//! agent, the registry hands a [`StepRequest`] snapshot to a [`StepExecutor`]
//! on a spawned task and applies the returned [`StepOutcome`] (or
//! [`StepError`]) through its own update path.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

use crate::domain::agent::AgentState;
use crate::domain::transport::TransportHandle;

/// Everything the executor needs to advance one agent, captured while the
/// registry lock was held.
#[derive(Debug, Clone)]
pub struct StepRequest {
    pub agent_state: AgentState,
    pub prompt: Option<String>,
    pub params: Option<Map<String, Value>>,
    pub fingerprint_id: String,
    pub file_context: Value,
    pub transport: TransportHandle,
    pub user_input_id: String,
}

#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub agent_state: AgentState,
    /// The agent ended its turn rather than stopping mid-loop.
    pub has_end_turn: bool,
}

#[derive(Debug, Error)]
pub enum StepError {
    #[error("Step execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Step execution timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Step executor panicked: {0}")]
    Panicked(String),

    #[error("Step executor returned state for {returned} while advancing {expected}")]
    AgentMismatch { expected: String, returned: String },
}

impl From<anyhow::Error> for StepError {
    fn from(err: anyhow::Error) -> Self {
        StepError::ExecutionFailed(format!("{:#}", err))
    }
}

/// Advances one agent by one unit of work (typically an LLM turn).
#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn run_step(&self, request: StepRequest) -> Result<StepOutcome, StepError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anyhow_conversion_keeps_context_chain() {
        let err = anyhow::anyhow!("connection reset").context("calling model");
        let step_err: StepError = err.into();
        assert_eq!(
            step_err.to_string(),
            "Step execution failed: calling model: connection reset"
        );
    }

    #[test]
    fn test_timeout_message() {
        let err = StepError::TimedOut(Duration::from_secs(30));
        assert_eq!(err.to_string(), "Step execution timed out after 30s");
    }
}
