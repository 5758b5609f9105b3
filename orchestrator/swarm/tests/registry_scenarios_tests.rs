// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end behaviour of the orchestration registry: registration,
//! hierarchy queries, mailboxes, idle wake-ups and cleanup.

mod common;

use common::{record, settle, Behavior, ScriptedExecutor};
use serde_json::json;
use std::sync::Arc;
use switchboard_core::domain::{AgentState, AgentStatus, Message};
use switchboard_swarm::{AgentRecord, Delivery, OrchestrationRegistry, RegistryError, RegistryStats};

fn registry_with(behavior: Behavior) -> (OrchestrationRegistry, Arc<ScriptedExecutor>) {
    let executor = Arc::new(ScriptedExecutor::new(behavior));
    (OrchestrationRegistry::new(executor.clone()), executor)
}

#[test]
fn test_register_and_lookup_running_agent() {
    let (registry, _) = registry_with(Behavior::Complete);

    let replaced = registry.register_agent(record("A", "s1")).unwrap();

    assert!(replaced.is_none());
    assert_eq!(registry.get_agent("A").unwrap().status(), AgentStatus::Running);
    assert_eq!(registry.get_session_agents("s1").len(), 1);
    assert!(registry.get_agent("B").is_none());
    assert!(registry.get_session_agents("s2").is_empty());
}

#[tokio::test]
async fn test_message_to_idle_agent_wakes_it_once() {
    let (registry, executor) = registry_with(Behavior::Complete);
    registry
        .register_agent(record("A", "s1").with_status(AgentStatus::Completed))
        .unwrap();

    let delivery = registry
        .send_message(Message::new("B", "A").with_prompt("Test message"))
        .unwrap();
    assert_eq!(delivery, Delivery::Woken);

    settle(&registry).await;

    let messages = registry.get_messages("A");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].prompt.as_deref(), Some("Test message"));
    assert_eq!(executor.calls(), 1);

    let request = &executor.requests()[0];
    assert_eq!(request.agent_state.agent_id, "A");
    assert_eq!(request.prompt.as_deref(), Some("Test message"));
    assert_eq!(request.user_input_id, "input-A");

    let agent = registry.get_agent("A").unwrap();
    assert_eq!(agent.status(), AgentStatus::Completed);
    assert_eq!(agent.agent_state.get("steps"), Some(&json!(1)));
}

#[test]
fn test_idle_agent_is_left_idle_without_runtime() {
    let (registry, executor) = registry_with(Behavior::Complete);
    registry
        .register_agent(record("A", "s1").with_status(AgentStatus::Completed))
        .unwrap();

    let delivery = registry
        .send_message(Message::new("B", "A").with_prompt("Test message"))
        .unwrap();

    assert_eq!(delivery, Delivery::Queued);
    assert_eq!(registry.get_agent("A").unwrap().status(), AgentStatus::Completed);
    assert_eq!(registry.pending_message_count("A"), 1);
    assert_eq!(registry.in_flight_wakeups(), 0);
    assert_eq!(executor.calls(), 0);
}

#[tokio::test]
async fn test_message_to_running_agent_only_queues() {
    let (registry, executor) = registry_with(Behavior::Complete);
    registry.register_agent(record("A", "s1")).unwrap();

    let delivery = registry
        .send_message(Message::new("B", "A").with_prompt("Test message"))
        .unwrap();

    assert_eq!(delivery, Delivery::Busy);
    settle(&registry).await;
    assert_eq!(executor.calls(), 0);
    assert_eq!(registry.get_messages("A").len(), 1);
    assert_eq!(registry.get_agent("A").unwrap().status(), AgentStatus::Running);
}

#[test]
fn test_children_and_running_children() {
    let (registry, _) = registry_with(Behavior::Complete);
    registry.register_agent(record("P", "s1")).unwrap();
    registry
        .register_agent(AgentRecord::new(
            AgentState::new("C").with_parent("P"),
            "s1",
            "input-P-C",
        ))
        .unwrap();

    assert_eq!(registry.get_child_agents("P").len(), 1);
    assert!(registry.has_running_children("P"));

    assert!(registry.update_agent_state(
        AgentState::new("C").with_parent("P"),
        AgentStatus::Completed
    ));
    assert!(!registry.has_running_children("P"));
    assert_eq!(registry.get_child_agents("P").len(), 1);
}

#[test]
fn test_cleanup_user_input_agents_by_prefix() {
    let (registry, _) = registry_with(Behavior::Complete);
    for (agent_id, user_input_id, session_id) in [
        ("agent-1", "input-123-agent-1", "s1"),
        ("agent-2", "input-123-agent-2", "s2"),
        ("agent-3", "input-456-agent-3", "s1"),
    ] {
        registry
            .register_agent(AgentRecord::new(
                AgentState::new(agent_id),
                session_id,
                user_input_id,
            ))
            .unwrap();
    }

    assert_eq!(registry.cleanup_user_input_agents("input-123"), 2);

    assert!(registry.get_agent("agent-1").is_none());
    assert!(registry.get_agent("agent-2").is_none());
    assert!(registry.get_agent("agent-3").is_some());
    assert!(registry.get_session_agents("s2").is_empty());
    assert_eq!(registry.get_session_agents("s1").len(), 1);
}

#[test]
fn test_stats_across_sessions() {
    let (registry, _) = registry_with(Behavior::Complete);
    registry.register_agent(record("a", "s1")).unwrap();
    registry
        .register_agent(record("b", "s1").with_status(AgentStatus::Completed))
        .unwrap();
    registry
        .register_agent(record("c", "s2").with_status(AgentStatus::Failed))
        .unwrap();

    assert_eq!(
        registry.get_stats(),
        RegistryStats {
            total_agents: 3,
            running_agents: 1,
            completed_agents: 1,
            failed_agents: 1,
            cancelled_agents: 0,
            active_sessions: 2,
        }
    );
}

#[test]
fn test_reregistration_overwrites_and_moves_session() {
    let (registry, _) = registry_with(Behavior::Complete);
    registry.register_agent(record("A", "s1")).unwrap();

    let replaced = registry
        .register_agent(record("A", "s2").with_status(AgentStatus::Completed))
        .unwrap();

    assert_eq!(replaced.unwrap().session_id, "s1");
    assert!(registry.get_session_agents("s1").is_empty());
    assert_eq!(registry.get_session_agents("s2").len(), 1);
    assert_eq!(registry.get_stats().total_agents, 1);
    assert_eq!(registry.get_agent("A").unwrap().status(), AgentStatus::Completed);
}

#[test]
fn test_register_rejects_missing_identity() {
    let (registry, _) = registry_with(Behavior::Complete);

    assert!(matches!(
        registry.register_agent(record("", "s1")),
        Err(RegistryError::MissingAgentId)
    ));
    assert!(matches!(
        registry.register_agent(record("A", "")),
        Err(RegistryError::MissingSessionId(id)) if id == "A"
    ));
    assert_eq!(registry.get_stats(), RegistryStats::default());
}

#[test]
fn test_untyped_state_update() {
    let (registry, _) = registry_with(Behavior::Complete);
    registry.register_agent(record("A", "s1")).unwrap();

    let applied = registry
        .update_agent_state_json(json!({"agentId": "A", "report": "done"}), "completed")
        .unwrap();
    assert!(applied);
    let agent = registry.get_agent("A").unwrap();
    assert_eq!(agent.status(), AgentStatus::Completed);
    assert_eq!(agent.agent_state.get("report"), Some(&json!("done")));

    assert!(matches!(
        registry.update_agent_state_json(json!({"agentId": "A"}), "paused"),
        Err(RegistryError::InvalidState(_))
    ));
    assert!(matches!(
        registry.update_agent_state_json(json!({"report": "orphan"}), "failed"),
        Err(RegistryError::InvalidState(_))
    ));
    assert_eq!(registry.get_agent("A").unwrap().status(), AgentStatus::Completed);
}

#[test]
fn test_update_unknown_agent_is_ignored() {
    let (registry, _) = registry_with(Behavior::Complete);
    assert!(!registry.update_agent_state(AgentState::new("ghost"), AgentStatus::Completed));
    assert!(registry.get_agent("ghost").is_none());
}

#[test]
fn test_messages_wait_for_unregistered_recipient() {
    let (registry, executor) = registry_with(Behavior::Complete);

    let first = registry
        .send_message(Message::new("P", "child").with_prompt("one"))
        .unwrap();
    registry
        .send_message(Message::new("P", "child").with_prompt("two"))
        .unwrap();

    assert_eq!(first, Delivery::Queued);
    assert_eq!(registry.pending_message_count("child"), 2);

    registry.register_agent(record("child", "s1")).unwrap();
    let drained = registry.get_and_clear_messages("child");
    let prompts: Vec<_> = drained.iter().filter_map(|m| m.prompt.as_deref()).collect();
    assert_eq!(prompts, vec!["one", "two"]);
    assert!(registry.get_messages("child").is_empty());
    assert_eq!(executor.calls(), 0);
}

#[test]
fn test_send_without_recipient_is_rejected() {
    let (registry, _) = registry_with(Behavior::Complete);
    let result = registry.send_message(Message::new("A", ""));
    assert!(matches!(result, Err(RegistryError::MissingRecipient)));
}

#[test]
fn test_remove_agent_drops_mailbox_and_indexes() {
    let (registry, _) = registry_with(Behavior::Complete);
    registry.register_agent(record("P", "s1")).unwrap();
    registry
        .register_agent(AgentRecord::new(
            AgentState::new("C").with_parent("P"),
            "s1",
            "input-C",
        ))
        .unwrap();
    registry
        .send_message(Message::new("P", "C").with_prompt("hello"))
        .unwrap();

    let removed = registry.remove_agent("C").unwrap();

    assert_eq!(removed.agent_id(), "C");
    assert!(registry.get_messages("C").is_empty());
    assert!(registry.get_child_agents("P").is_empty());
    assert_eq!(registry.get_session_agents("s1").len(), 1);
    assert!(registry.remove_agent("C").is_none());
}

#[test]
fn test_cleanup_session_removes_only_that_session() {
    let (registry, _) = registry_with(Behavior::Complete);
    registry.register_agent(record("a", "s1")).unwrap();
    registry.register_agent(record("b", "s1")).unwrap();
    registry.register_agent(record("c", "s2")).unwrap();
    registry
        .send_message(Message::new("x", "a").with_prompt("queued"))
        .unwrap();

    assert_eq!(registry.cleanup_session("s1"), 2);
    assert_eq!(registry.cleanup_session("s1"), 0);
    assert!(registry.get_messages("a").is_empty());
    assert_eq!(registry.get_stats().total_agents, 1);
    assert_eq!(registry.get_stats().active_sessions, 1);
}
