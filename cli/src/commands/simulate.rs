// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Scenario simulation
//!
//! Registers the agents listed in a scenario file, delivers its messages in
//! order against a scripted step executor, drains every wake-up and prints a
//! JSON report with the delivery receipts, final agent statuses and registry
//! statistics.
//!
//! ```yaml
//! executor:
//!   outcome: complete   # complete | fail
//!   delayMs: 10
//! agents:
//!   - agentId: planner
//!     sessionId: s1
//!     userInputId: input-1
//!     status: completed
//!   - agentId: coder
//!     parentId: planner
//!     sessionId: s1
//!     userInputId: input-1-coder
//! messages:
//!   - from: coder
//!     to: planner
//!     prompt: "Patch ready for review"
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Args;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use switchboard_core::domain::{
    AgentState, AgentStatus, Message, RegistryConfig, StepError, StepExecutor, StepOutcome,
    StepRequest,
};
use switchboard_swarm::{AgentRecord, Delivery, OrchestrationRegistry, RegistryStats};

#[derive(Args)]
pub struct SimulateCommand {
    /// Scenario file (YAML)
    #[arg(value_name = "SCENARIO")]
    scenario: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(default)]
    pub executor: ExecutorScript,
    #[serde(default)]
    pub agents: Vec<ScenarioAgent>,
    #[serde(default)]
    pub messages: Vec<ScenarioMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorScript {
    #[serde(default)]
    pub outcome: ScriptedOutcome,
    #[serde(default)]
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptedOutcome {
    #[default]
    Complete,
    Fail,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioAgent {
    pub agent_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub session_id: String,
    #[serde(default)]
    pub user_input_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub fingerprint_id: String,
    #[serde(default = "default_status")]
    pub status: AgentStatus,
    /// Extra step-executor fields stored in the agent state
    #[serde(default)]
    pub fields: Map<String, Value>,
}

fn default_status() -> AgentStatus {
    AgentStatus::Running
}

#[derive(Debug, Deserialize)]
pub struct ScenarioMessage {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub params: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReport {
    pub deliveries: Vec<DeliveryLine>,
    pub agents: Vec<AgentLine>,
    pub stats: RegistryStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryLine {
    pub to: String,
    pub delivery: Delivery,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentLine {
    pub agent_id: String,
    pub status: AgentStatus,
    pub pending_messages: usize,
    pub steps: u64,
}

/// Echoes the prompt into the agent state and counts steps.
struct ScriptedExecutor {
    outcome: ScriptedOutcome,
    delay: Duration,
}

#[async_trait]
impl StepExecutor for ScriptedExecutor {
    async fn run_step(&self, request: StepRequest) -> Result<StepOutcome, StepError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.outcome == ScriptedOutcome::Fail {
            return Err(StepError::ExecutionFailed(format!(
                "scripted failure for {}",
                request.agent_state.agent_id
            )));
        }

        let mut agent_state = request.agent_state;
        let steps = agent_state
            .get("steps")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        agent_state.set("steps", json!(steps + 1));
        if let Some(prompt) = request.prompt {
            agent_state.set("lastPrompt", json!(prompt));
        }

        Ok(StepOutcome {
            agent_state,
            has_end_turn: true,
        })
    }
}

pub async fn execute(command: SimulateCommand, config_override: Option<PathBuf>) -> Result<()> {
    let config = RegistryConfig::load_or_default(config_override)
        .context("Failed to load configuration")?;
    config
        .validate()
        .context("Configuration validation failed")?;

    let scenario = load_scenario(&command.scenario)?;
    let report = run_scenario(scenario, config).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario {:?}", path))?;
    serde_yaml::from_str(&content).with_context(|| format!("Failed to parse scenario {:?}", path))
}

pub async fn run_scenario(scenario: Scenario, config: RegistryConfig) -> Result<SimulationReport> {
    let executor = Arc::new(ScriptedExecutor {
        outcome: scenario.executor.outcome,
        delay: Duration::from_millis(scenario.executor.delay_ms),
    });
    let registry = OrchestrationRegistry::with_config(executor, config);

    let mut agent_ids = Vec::with_capacity(scenario.agents.len());
    for agent in scenario.agents {
        let mut state = AgentState::new(&agent.agent_id);
        state.parent_id = agent.parent_id;
        state.fields = agent.fields;

        let mut record = AgentRecord::new(state, agent.session_id, agent.user_input_id)
            .with_status(agent.status)
            .with_fingerprint_id(agent.fingerprint_id);
        if let Some(user_id) = agent.user_id {
            record = record.with_user_id(user_id);
        }

        registry
            .register_agent(record)
            .with_context(|| format!("Failed to register agent '{}'", agent.agent_id))?;
        agent_ids.push(agent.agent_id);
    }

    let mut deliveries = Vec::with_capacity(scenario.messages.len());
    for message in scenario.messages {
        let mut outgoing = Message::new(message.from, message.to.clone());
        outgoing.prompt = message.prompt;
        outgoing.params = message.params;

        let delivery = registry
            .send_message(outgoing)
            .with_context(|| format!("Failed to deliver message to '{}'", message.to))?;
        deliveries.push(DeliveryLine {
            to: message.to,
            delivery,
        });
    }

    registry.shutdown().await;
    info!(
        agents = agent_ids.len(),
        messages = deliveries.len(),
        "Scenario finished"
    );

    let agents = agent_ids
        .iter()
        .filter_map(|agent_id| registry.get_agent(agent_id))
        .map(|record| AgentLine {
            agent_id: record.agent_id().to_string(),
            status: record.status(),
            pending_messages: registry.pending_message_count(record.agent_id()),
            steps: record
                .agent_state
                .get("steps")
                .and_then(Value::as_u64)
                .unwrap_or(0),
        })
        .collect();

    Ok(SimulationReport {
        deliveries,
        agents,
        stats: registry.get_stats(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SCENARIO: &str = r#"
agents:
  - agentId: planner
    sessionId: s1
    userInputId: input-1
    status: completed
  - agentId: coder
    parentId: planner
    sessionId: s1
    userInputId: input-1-coder
messages:
  - from: coder
    to: planner
    prompt: "Patch ready"
  - from: planner
    to: coder
    prompt: "Keep going"
  - from: planner
    to: reviewer
"#;

    #[test]
    fn test_scenario_parses_with_defaults() {
        let scenario: Scenario = serde_yaml::from_str(SCENARIO).unwrap();
        assert_eq!(scenario.executor.outcome, ScriptedOutcome::Complete);
        assert_eq!(scenario.agents.len(), 2);
        assert_eq!(scenario.agents[1].status, AgentStatus::Running);
        assert_eq!(scenario.agents[1].parent_id.as_deref(), Some("planner"));
        assert_eq!(scenario.messages[2].prompt, None);
    }

    #[test]
    fn test_load_scenario_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SCENARIO.as_bytes()).unwrap();
        let scenario = load_scenario(file.path()).unwrap();
        assert_eq!(scenario.messages.len(), 3);
    }

    #[tokio::test]
    async fn test_run_scenario_reports_deliveries_and_stats() {
        let scenario: Scenario = serde_yaml::from_str(SCENARIO).unwrap();
        let report = run_scenario(scenario, RegistryConfig::default()).await.unwrap();

        let receipts: Vec<Delivery> = report.deliveries.iter().map(|d| d.delivery).collect();
        assert_eq!(
            receipts,
            vec![Delivery::Woken, Delivery::Busy, Delivery::Queued]
        );

        let planner = &report.agents[0];
        assert_eq!(planner.status, AgentStatus::Completed);
        assert_eq!(planner.steps, 1);
        assert_eq!(planner.pending_messages, 1);

        assert_eq!(report.stats.total_agents, 2);
        assert_eq!(report.stats.running_agents, 1);
        assert_eq!(report.stats.completed_agents, 1);
        assert_eq!(report.stats.active_sessions, 1);
    }

    #[tokio::test]
    async fn test_failing_executor_marks_agents_failed() {
        let mut scenario: Scenario = serde_yaml::from_str(SCENARIO).unwrap();
        scenario.executor.outcome = ScriptedOutcome::Fail;
        let report = run_scenario(scenario, RegistryConfig::default()).await.unwrap();

        assert_eq!(report.agents[0].status, AgentStatus::Failed);
        assert_eq!(report.stats.failed_agents, 1);
    }
}
