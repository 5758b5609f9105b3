// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Registry Configuration Types
//
// Kubernetes-style manifest (apiVersion/kind/metadata/spec) controlling:
// - Wake-up dispatch (concurrency bound, per-step timeout)
// - Event bus buffering

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_VERSION: &str = "switchboard.dev/v1";
pub const KIND: &str = "RegistryConfig";

/// Top-level registry configuration manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// API version (must be "switchboard.dev/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "RegistryConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: RegistryConfigSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable registry name, used in log lines
    pub name: String,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfigSpec {
    #[serde(default)]
    pub wakeup: WakeupConfig,

    #[serde(default)]
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WakeupConfig {
    /// Upper bound on step executions running at once. Unbounded when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent: Option<usize>,

    /// Per-invocation timeout; expiry marks the agent failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_timeout_secs: Option<u64>,
}

impl WakeupConfig {
    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventsConfig {
    /// Broadcast channel capacity before slow subscribers start lagging
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

fn default_event_capacity() -> usize {
    1000
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "switchboard".to_string(),
                labels: HashMap::new(),
            },
            spec: RegistryConfigSpec::default(),
        }
    }
}

impl RegistryConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. SWITCHBOARD_CONFIG_PATH environment variable
    /// 2. ./switchboard.yaml (working directory)
    /// 3. ~/.switchboard/config.yaml (user home)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("SWITCHBOARD_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./switchboard.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".switchboard").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SWITCHBOARD_MAX_CONCURRENT_WAKEUPS") {
            match val.parse::<usize>() {
                Ok(0) => {
                    tracing::info!("Environment override: SWITCHBOARD_MAX_CONCURRENT_WAKEUPS=0 (unbounded)");
                    self.spec.wakeup.max_concurrent = None;
                }
                Ok(n) => {
                    tracing::info!("Environment override: SWITCHBOARD_MAX_CONCURRENT_WAKEUPS={}", n);
                    self.spec.wakeup.max_concurrent = Some(n);
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for SWITCHBOARD_MAX_CONCURRENT_WAKEUPS: '{}'. Expected an integer. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.wakeup.max_concurrent == Some(0) {
            anyhow::bail!("spec.wakeup.max_concurrent must be at least 1 (omit it for unbounded)");
        }

        if self.spec.wakeup.step_timeout_secs == Some(0) {
            anyhow::bail!("spec.wakeup.step_timeout_secs must be at least 1 (omit it to disable)");
        }

        if self.spec.events.capacity == 0 {
            anyhow::bail!("spec.events.capacity must be at least 1");
        }

        Ok(())
    }
}
