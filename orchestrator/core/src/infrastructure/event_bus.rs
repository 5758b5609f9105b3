// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Event Bus Implementation - Pub/Sub for Registry Events
//
// In-memory fan-out over a tokio broadcast channel. Events are lost on
// restart and slow subscribers lag rather than block publishers.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{trace, warn};

use crate::domain::events::RegistryEvent;

/// Event bus for publishing and subscribing to registry events
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<RegistryEvent>>,
}

impl EventBus {
    /// Create a new event bus with specified channel capacity
    /// Capacity determines how many events can be buffered before dropping old ones
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create event bus with default capacity (1000)
    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    /// Publish an event to all subscribers. Never blocks.
    pub fn publish(&self, event: RegistryEvent) {
        trace!("Publishing event: {:?}", event);

        // send() only fails when nobody is subscribed
        if self.sender.send(event).is_err() {
            trace!("No subscribers listening to event");
        }
    }

    /// Subscribe to all registry events
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Subscribe to events about a single agent
    pub fn subscribe_agent(&self, agent_id: impl Into<String>) -> AgentEventReceiver {
        AgentEventReceiver {
            receiver: self.sender.subscribe(),
            agent_id: agent_id.into(),
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

fn map_recv_error(e: broadcast::error::RecvError) -> EventBusError {
    match e {
        broadcast::error::RecvError::Closed => EventBusError::Closed,
        broadcast::error::RecvError::Lagged(n) => {
            warn!("Event receiver lagged by {} events", n);
            EventBusError::Lagged(n)
        }
    }
}

/// Receiver for all registry events
pub struct EventReceiver {
    receiver: broadcast::Receiver<RegistryEvent>,
}

impl EventReceiver {
    /// Receive the next event (waits until one is available)
    pub async fn recv(&mut self) -> Result<RegistryEvent, EventBusError> {
        self.receiver.recv().await.map_err(map_recv_error)
    }

    /// Try to receive an event without waiting
    pub fn try_recv(&mut self) -> Result<RegistryEvent, EventBusError> {
        self.receiver.try_recv().map_err(|e| match e {
            broadcast::error::TryRecvError::Empty => EventBusError::Empty,
            broadcast::error::TryRecvError::Closed => EventBusError::Closed,
            broadcast::error::TryRecvError::Lagged(n) => {
                warn!("Event receiver lagged by {} events", n);
                EventBusError::Lagged(n)
            }
        })
    }
}

/// Receiver filtered to one agent id
pub struct AgentEventReceiver {
    receiver: broadcast::Receiver<RegistryEvent>,
    agent_id: String,
}

impl AgentEventReceiver {
    /// Receive the next event about this receiver's agent, skipping the rest
    pub async fn recv(&mut self) -> Result<RegistryEvent, EventBusError> {
        loop {
            let event = self.receiver.recv().await.map_err(map_recv_error)?;
            if event.agent_id() == self.agent_id {
                return Ok(event);
            }
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }
}

/// Errors that can occur when receiving events
#[derive(Debug, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus is closed")]
    Closed,

    #[error("No events available")]
    Empty,

    #[error("Receiver lagged by {0} events (events were dropped)")]
    Lagged(u64),
}
