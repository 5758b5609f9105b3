// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application layer: the registry facade and the wake-up trigger it drives.

pub mod orchestration;
pub mod wakeup;

pub use orchestration::OrchestrationRegistry;
pub use wakeup::{Delivery, WakeupDispatcher};
