// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle status of a registered agent.
///
/// Only `Running` blocks a wake-up; the other three are idle states that a
/// new message may wake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl AgentStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, AgentStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Running => "running",
            AgentStatus::Completed => "completed",
            AgentStatus::Failed => "failed",
            AgentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentStatus {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(AgentStatus::Running),
            "completed" => Ok(AgentStatus::Completed),
            "failed" => Ok(AgentStatus::Failed),
            "cancelled" => Ok(AgentStatus::Cancelled),
            other => Err(StateError::UnknownStatus(other.to_string())),
        }
    }
}

/// Step-executor owned state of one agent.
///
/// The registry only reads `agent_id` and `parent_id`; everything else is
/// carried in `fields` and round-trips untouched. Serialized as a flat JSON
/// object (`{"agentId": .., "parentId": .., ...}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentState {
    pub agent_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl AgentState {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            parent_id: None,
            fields: Map::new(),
        }
    }

    /// Mark this agent as spawned by `parent_id`.
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(key.into(), value)
    }

    /// Build a state from an untyped JSON document.
    ///
    /// A missing, non-string or empty `agentId` is a caller bug and is
    /// reported as such rather than defaulted.
    pub fn from_value(value: Value) -> Result<Self, StateError> {
        let object = match &value {
            Value::Object(object) => object,
            other => return Err(StateError::NotAnObject(json_kind(other))),
        };

        match object.get("agentId") {
            Some(Value::String(id)) if !id.is_empty() => {}
            Some(Value::String(_)) | None => return Err(StateError::MissingAgentId),
            Some(other) => {
                return Err(StateError::InvalidField {
                    field: "agentId",
                    expected: "string",
                    found: json_kind(other),
                })
            }
        }

        if let Some(parent) = object.get("parentId") {
            if !parent.is_string() && !parent.is_null() {
                return Err(StateError::InvalidField {
                    field: "parentId",
                    expected: "string",
                    found: json_kind(parent),
                });
            }
        }

        Ok(serde_json::from_value(value)?)
    }

    pub fn to_value(&self) -> Value {
        // Map keys are strings and values are already JSON, so this cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Malformed agent state or status input.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("agent state must be a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("agent state is missing a non-empty agentId")]
    MissingAgentId,

    #[error("agent state field {field} must be a {expected}, found {found}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("unknown agent status: {0}")]
    UnknownStatus(String),

    #[error("agent state decode error: {0}")]
    Decode(#[from] serde_json::Error),
}
