// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use switchboard_core::domain::StateError;
use thiserror::Error;

/// Caller errors surfaced by the registry API.
///
/// Unknown ids are never errors; only malformed input is.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("agent record has an empty agentId")]
    MissingAgentId,

    #[error("agent {0} has an empty sessionId")]
    MissingSessionId(String),

    #[error("message has an empty toAgentId")]
    MissingRecipient,

    #[error(transparent)]
    InvalidState(#[from] StateError),
}
