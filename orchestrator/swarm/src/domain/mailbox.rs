// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Mailbox Store
//!
//! Per-agent FIFO queues keyed by recipient id. A mailbox does not require
//! the recipient to be registered: messages for a child that has not been
//! spawned yet wait here until it drains them.

use std::collections::{HashMap, VecDeque};
use switchboard_core::domain::Message;

#[derive(Debug, Default)]
pub struct MailboxStore {
    mailboxes: HashMap<String, VecDeque<Message>>,
}

impl MailboxStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the recipient's queue, creating it if absent. Returns the
    /// queue depth after the append.
    pub fn enqueue(&mut self, message: Message) -> usize {
        let queue = self
            .mailboxes
            .entry(message.to_agent_id.clone())
            .or_default();
        queue.push_back(message);
        queue.len()
    }

    /// Oldest-first copy of the queue. Empty when there is no mailbox.
    pub fn snapshot(&self, agent_id: &str) -> Vec<Message> {
        self.mailboxes
            .get(agent_id)
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Take the whole queue and delete the mailbox.
    pub fn drain(&mut self, agent_id: &str) -> Vec<Message> {
        self.mailboxes
            .remove(agent_id)
            .map(Vec::from)
            .unwrap_or_default()
    }

    /// Drop the mailbox without reading it. Returns how many messages were discarded.
    pub fn discard(&mut self, agent_id: &str) -> usize {
        self.mailboxes
            .remove(agent_id)
            .map(|queue| queue.len())
            .unwrap_or(0)
    }

    pub fn pending(&self, agent_id: &str) -> usize {
        self.mailboxes.get(agent_id).map_or(0, VecDeque::len)
    }

    /// Number of mailboxes currently held.
    pub fn len(&self) -> usize {
        self.mailboxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mailboxes.is_empty()
    }
}
