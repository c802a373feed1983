//! Property-based tests for the resolver
//!
//! Shape preservation, update ordering and idempotence over arbitrary
//! conversations.

use super::testing::RecordingChannel;
use super::*;
use crate::conversation::{Role, ToolInvocation};
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// Arbitrary Generators
// ============================================================================

/// A part before call ids are assigned
#[derive(Debug, Clone)]
enum PartSpec {
    Text(String),
    Call { tool: &'static str, state: ToolState },
}

fn arb_state() -> impl Strategy<Value = ToolState> {
    prop_oneof![
        any::<bool>().prop_map(|partial| ToolState::Pending { partial }),
        Just(ToolState::AwaitingExecution(Decision::Approved)),
        Just(ToolState::AwaitingExecution(Decision::Denied)),
        Just(ToolState::Denied),
        "[a-zA-Z ]{0,20}".prop_map(|s| ToolState::Resolved(json!(s))),
    ]
}

fn arb_tool() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("working"), Just("failing"), Just("unregistered")]
}

fn arb_part() -> impl Strategy<Value = PartSpec> {
    prop_oneof![
        "[a-z ]{0,20}".prop_map(PartSpec::Text),
        (arb_tool(), arb_state()).prop_map(|(tool, state)| PartSpec::Call { tool, state }),
    ]
}

fn arb_message() -> impl Strategy<Value = (bool, Option<Vec<PartSpec>>)> {
    (
        any::<bool>(),
        prop::option::of(prop::collection::vec(arb_part(), 0..5)),
    )
}

fn arb_conversation() -> impl Strategy<Value = Vec<Message>> {
    prop::collection::vec(arb_message(), 0..6).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(mi, (from_user, parts))| {
                let role = if from_user { Role::User } else { Role::Assistant };
                let mut message = Message::new(format!("m{mi}"), role, "");
                message.parts = parts.map(|parts| {
                    parts
                        .into_iter()
                        .enumerate()
                        .map(|(pi, spec)| match spec {
                            PartSpec::Text(text) => Part::text(text),
                            PartSpec::Call { tool, state } => Part::tool_invocation(
                                ToolInvocation::new(format!("call-{mi}-{pi}"), tool, json!({}))
                                    .with_state(state),
                            ),
                        })
                        .collect()
                });
                message
            })
            .collect()
    })
}

// ============================================================================
// Test Helpers
// ============================================================================

fn test_resolver(max_concurrent: usize) -> Resolver {
    let mut registry = ExecutionRegistry::new();
    registry.register_fn("working", |_args, ctx| async move {
        Ok::<_, ToolError>(json!(format!("done {}", ctx.tool_call_id)))
    });
    registry.register_fn("failing", |_args, _ctx| async move {
        Err::<Value, _>(ToolError::failed("nope"))
    });
    Resolver::new(Arc::new(registry)).with_max_concurrent(max_concurrent)
}

fn run(resolver: &Resolver, messages: Vec<Message>) -> (Vec<Message>, Vec<ToolUpdate>) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let channel = RecordingChannel::default();
    let output = rt.block_on(resolver.resolve(messages, &channel));
    (output, channel.updates())
}

fn awaiting_ids(messages: &[Message]) -> Vec<String> {
    messages
        .iter()
        .flat_map(Message::tool_invocations)
        .filter(|inv| matches!(inv.state, ToolState::AwaitingExecution(_)))
        .map(|inv| inv.tool_call_id.clone())
        .collect()
}

fn has_awaiting(message: &Message) -> bool {
    message
        .tool_invocations()
        .any(|inv| matches!(inv.state, ToolState::AwaitingExecution(_)))
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_shape_is_preserved(conversation in arb_conversation(), concurrency in 1usize..4) {
        let (output, _) = run(&test_resolver(concurrency), conversation.clone());

        prop_assert_eq!(output.len(), conversation.len());
        for (before, after) in conversation.iter().zip(&output) {
            prop_assert_eq!(&before.id, &after.id);
            prop_assert_eq!(before.role, after.role);
            if !has_awaiting(before) {
                prop_assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn prop_one_update_per_decision_in_scan_order(
        conversation in arb_conversation(),
        concurrency in 1usize..4,
    ) {
        let expected = awaiting_ids(&conversation);
        let (output, updates) = run(&test_resolver(concurrency), conversation);

        let streamed: Vec<String> = updates.iter().map(|u| u.tool_call_id.clone()).collect();
        prop_assert_eq!(streamed, expected);
        prop_assert!(awaiting_ids(&output).is_empty());

        // Every streamed result matches what ended up in the conversation
        for update in &updates {
            let inv = output
                .iter()
                .flat_map(Message::tool_invocations)
                .find(|inv| inv.tool_call_id == update.tool_call_id)
                .unwrap();
            prop_assert!(inv.state.is_terminal());
            prop_assert_eq!(inv.state.wire_result(), Some(update.result.clone()));
        }
    }

    #[test]
    fn prop_resolution_is_idempotent(conversation in arb_conversation()) {
        let resolver = test_resolver(2);
        let (once, _) = run(&resolver, conversation);
        let (twice, updates) = run(&resolver, once.clone());

        prop_assert_eq!(twice, once);
        prop_assert!(updates.is_empty());
    }

    #[test]
    fn prop_wire_round_trip_keeps_resolution(conversation in arb_conversation()) {
        let (output, _) = run(&test_resolver(1), conversation);

        let wire = serde_json::to_value(&output).unwrap();
        let reparsed: Vec<Message> = serde_json::from_value(wire).unwrap();
        prop_assert!(awaiting_ids(&reparsed).is_empty());

        let (again, updates) = run(&test_resolver(1), reparsed);
        prop_assert!(updates.is_empty());
        prop_assert_eq!(
            serde_json::to_value(&again).unwrap(),
            serde_json::to_value(&output).unwrap()
        );
    }
}
