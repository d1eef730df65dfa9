//! Tests for the node processor and the interaction handlers.
//!
//! All tests run on a paused clock, so the simulated typing delays elapse
//! instantly while still going through the real timer path.
mod common;
use common::*;
use kaiwa::prelude::*;
use std::collections::HashMap;

#[tokio::test(start_paused = true)]
async fn start_reveals_elements_in_order() {
    let flow = doc(
        vec![node(
            "start",
            NodeKind::Start,
            vec![text_el("e1", "First"), text_el("e2", "Second")],
        )],
        vec![],
    );
    let runtime = Runtime::builder(flow).build();
    assert!(runtime.is_loading());
    runtime.start().await.expect("start succeeds");
    assert!(!runtime.is_loading());

    let transcript = runtime.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].content, "First");
    assert_eq!(transcript[1].content, "Second");
    assert!(transcript.iter().all(|m| !m.is_typing));
    assert!(transcript.iter().all(|m| m.sender == Sender::Bot));
    assert_eq!(transcript[0].node_id.as_deref(), Some("start"));
    assert_ne!(transcript[0].id, transcript[1].id);
    assert!(!runtime.is_awaiting_interaction());
}

#[tokio::test(start_paused = true)]
async fn reveal_stops_at_interactive_element() {
    let flow = doc(
        vec![node(
            "start",
            NodeKind::Start,
            vec![
                text_el("e1", "Intro"),
                options_el("e2", "Pick one", vec![opt("A", None), opt("B", None)]),
                text_el("e3", "Never revealed"),
            ],
        )],
        vec![],
    );
    let runtime = Runtime::builder(flow).build();
    runtime.start().await.expect("start succeeds");

    let transcript = runtime.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1].kind, MessageKind::Options);
    assert!(runtime.is_awaiting_interaction());
}

#[tokio::test(start_paused = true)]
async fn empty_start_node_is_a_noop() {
    let flow = doc(vec![node("start", NodeKind::Start, vec![])], vec![]);
    let runtime = Runtime::builder(flow).build();
    runtime.start().await.expect("start succeeds");
    assert!(runtime.transcript().is_empty());
}

#[tokio::test(start_paused = true)]
async fn missing_start_node_is_fatal() {
    // Two standard nodes in a cycle: no start marker, no node without an
    // incoming edge.
    let flow = doc(
        vec![
            node("a", NodeKind::Standard, vec![text_el("e1", "A")]),
            node("b", NodeKind::Standard, vec![text_el("e2", "B")]),
        ],
        vec![edge("a", "b"), edge("b", "a")],
    );
    let runtime = Runtime::builder(flow).build();
    assert!(matches!(
        runtime.start().await,
        Err(InitError::StartNodeNotFound)
    ));
}

#[tokio::test(start_paused = true)]
async fn node_without_incoming_edges_is_the_fallback_start() {
    let flow = doc(
        vec![
            node("later", NodeKind::Standard, vec![text_el("e1", "Later")]),
            node("first", NodeKind::Standard, vec![text_el("e2", "First")]),
        ],
        vec![edge("first", "later")],
    );
    let runtime = Runtime::builder(flow).build();
    runtime.start().await.expect("start succeeds");
    assert_eq!(runtime.current_node_id().as_deref(), Some("first"));
    assert_eq!(runtime.transcript()[0].content, "First");
}

async fn answered_question(runtime: &Runtime) -> String {
    runtime.start().await.expect("start succeeds");
    runtime.advance().await;
    let prompt = runtime.transcript().last().cloned().expect("prompt");
    assert_eq!(prompt.kind, MessageKind::Options);
    prompt.id
}

#[tokio::test(start_paused = true)]
async fn option_with_target_overrides_default_edge() {
    let runtime = Runtime::builder(branching_flow()).build();
    let prompt_id = answered_question(&runtime).await;

    runtime.select_option(&prompt_id, "Yes").await;

    assert_eq!(runtime.current_node_id().as_deref(), Some("c"));
    let transcript = runtime.transcript();
    let last = transcript.last().unwrap();
    assert_eq!(last.content, "Great!");
    // The user's reply sits between the prompt and the next node's text.
    let reply = &transcript[transcript.len() - 2];
    assert_eq!(reply.sender, Sender::User);
    assert_eq!(reply.kind, MessageKind::Option);
    assert_eq!(reply.content, "Yes");
}

#[tokio::test(start_paused = true)]
async fn option_without_target_follows_default_edge() {
    let runtime = Runtime::builder(branching_flow()).build();
    let prompt_id = answered_question(&runtime).await;

    runtime.select_option(&prompt_id, "No").await;

    assert_eq!(runtime.current_node_id().as_deref(), Some("d"));
    assert_eq!(runtime.transcript().last().unwrap().content, "Okay.");
}

#[tokio::test(start_paused = true)]
async fn unresolvable_option_target_falls_back_to_default_edge() {
    let flow = doc(
        vec![
            node(
                "start",
                NodeKind::Start,
                vec![options_el("e1", "Pick", vec![opt("Go", Some("ghost"))])],
            ),
            node("next", NodeKind::Standard, vec![text_el("e2", "Landed")]),
        ],
        vec![edge("start", "next")],
    );
    let runtime = Runtime::builder(flow).build();
    runtime.start().await.expect("start succeeds");
    let prompt_id = runtime.transcript().last().unwrap().id.clone();

    runtime.select_option(&prompt_id, "Go").await;

    assert_eq!(runtime.current_node_id().as_deref(), Some("next"));
    assert_eq!(runtime.transcript().last().unwrap().content, "Landed");
}

#[tokio::test(start_paused = true)]
async fn select_option_with_unknown_context_is_a_noop() {
    let runtime = Runtime::builder(branching_flow()).build();
    let prompt_id = answered_question(&runtime).await;
    let before = runtime.transcript().len();

    runtime.select_option("no-such-message", "Yes").await;
    runtime.select_option(&prompt_id, "Not an option").await;

    assert_eq!(runtime.transcript().len(), before);
    assert_eq!(runtime.current_node_id().as_deref(), Some("question"));
}

#[tokio::test(start_paused = true)]
async fn reselecting_an_answered_prompt_is_a_noop() {
    let runtime = Runtime::builder(branching_flow()).build();
    let prompt_id = answered_question(&runtime).await;

    runtime.select_option(&prompt_id, "Yes").await;
    let after_first = runtime.transcript().len();

    runtime.select_option(&prompt_id, "No").await;

    assert_eq!(runtime.transcript().len(), after_first);
    assert_eq!(runtime.current_node_id().as_deref(), Some("c"));
}

fn form_flow() -> FlowDocument {
    doc(
        vec![
            node(
                "start",
                NodeKind::Start,
                vec![form_el(
                    "e1",
                    "Tell us about yourself",
                    vec![field("name", "Name", true), field("company", "Company", false)],
                )],
            ),
            node("next", NodeKind::Standard, vec![text_el("e2", "Thanks!")]),
        ],
        vec![edge("start", "next")],
    )
}

#[tokio::test(start_paused = true)]
async fn form_submission_with_missing_required_field_changes_nothing() {
    let runtime = Runtime::builder(form_flow()).build();
    runtime.start().await.expect("start succeeds");
    let prompt_id = runtime.transcript().last().unwrap().id.clone();
    let before = runtime.transcript().len();

    let values = HashMap::from([("company".to_string(), "Acme".to_string())]);
    let result = runtime.submit_form(&prompt_id, &values).await;

    assert_eq!(
        result,
        Err(InteractionError::MissingRequiredFields {
            fields: vec!["name".to_string()]
        })
    );
    assert_eq!(runtime.transcript().len(), before);
    assert_eq!(runtime.current_node_id().as_deref(), Some("start"));
}

#[tokio::test(start_paused = true)]
async fn whitespace_does_not_satisfy_a_required_field() {
    let runtime = Runtime::builder(form_flow()).build();
    runtime.start().await.expect("start succeeds");
    let prompt_id = runtime.transcript().last().unwrap().id.clone();

    let values = HashMap::from([("name".to_string(), "   ".to_string())]);
    assert!(runtime.submit_form(&prompt_id, &values).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn form_submission_formats_one_reply_in_field_order() {
    let runtime = Runtime::builder(form_flow()).build();
    runtime.start().await.expect("start succeeds");
    let prompt_id = runtime.transcript().last().unwrap().id.clone();

    let values = HashMap::from([
        ("company".to_string(), "Analytical Engines".to_string()),
        ("name".to_string(), "Ada".to_string()),
    ]);
    runtime
        .submit_form(&prompt_id, &values)
        .await
        .expect("valid submission");

    let transcript = runtime.transcript();
    let reply = transcript
        .iter()
        .find(|m| m.sender == Sender::User)
        .expect("user reply");
    assert_eq!(reply.kind, MessageKind::Form);
    assert_eq!(reply.content, "Name: Ada\nCompany: Analytical Engines");
    assert_eq!(runtime.current_node_id().as_deref(), Some("next"));
    assert_eq!(transcript.last().unwrap().content, "Thanks!");
}

fn input_flow(kind: InputKind) -> FlowDocument {
    doc(
        vec![
            node(
                "start",
                NodeKind::Start,
                vec![input_el("e1", "Your answer?", kind)],
            ),
            node("next", NodeKind::Standard, vec![text_el("e2", "Noted.")]),
        ],
        vec![edge("start", "next")],
    )
}

#[tokio::test(start_paused = true)]
async fn email_input_rejects_malformed_addresses() {
    let runtime = Runtime::builder(input_flow(InputKind::Email)).build();
    runtime.start().await.expect("start succeeds");
    let prompt_id = runtime.transcript().last().unwrap().id.clone();

    for bad in ["not-an-email", "a@b", "a b@c.co", "@b.co", "a@b."] {
        let result = runtime.submit_input(&prompt_id, bad).await;
        assert!(result.is_err(), "'{}' should be rejected", bad);
    }
    assert_eq!(runtime.current_node_id().as_deref(), Some("start"));

    runtime
        .submit_input(&prompt_id, "a@b.co")
        .await
        .expect("valid email");

    let transcript = runtime.transcript();
    let reply = transcript
        .iter()
        .find(|m| m.sender == Sender::User)
        .expect("user reply");
    assert_eq!(reply.kind, MessageKind::Text);
    assert_eq!(reply.content, "a@b.co");
    assert_eq!(runtime.current_node_id().as_deref(), Some("next"));
}

#[tokio::test(start_paused = true)]
async fn number_input_must_parse() {
    let runtime = Runtime::builder(input_flow(InputKind::Number)).build();
    runtime.start().await.expect("start succeeds");
    let prompt_id = runtime.transcript().last().unwrap().id.clone();

    assert_eq!(
        runtime.submit_input(&prompt_id, "twelve").await,
        Err(InteractionError::InvalidNumber("twelve".to_string()))
    );
    runtime
        .submit_input(&prompt_id, "12.5")
        .await
        .expect("valid number");
    assert_eq!(runtime.current_node_id().as_deref(), Some("next"));
}

#[tokio::test(start_paused = true)]
async fn blank_input_is_rejected() {
    let runtime = Runtime::builder(input_flow(InputKind::Text)).build();
    runtime.start().await.expect("start succeeds");
    let prompt_id = runtime.transcript().last().unwrap().id.clone();

    assert_eq!(
        runtime.submit_input(&prompt_id, "   ").await,
        Err(InteractionError::EmptyInput)
    );
}

#[tokio::test(start_paused = true)]
async fn free_text_matches_options_case_insensitively() {
    let runtime = Runtime::builder(branching_flow()).build();
    answered_question(&runtime).await;

    runtime.send_text("  yes  ").await;

    assert_eq!(runtime.current_node_id().as_deref(), Some("c"));
    assert_eq!(runtime.transcript().last().unwrap().content, "Great!");
}

#[tokio::test(start_paused = true)]
async fn unmatched_free_text_gets_a_fallback_reply() {
    let runtime = Runtime::builder(branching_flow()).build();
    answered_question(&runtime).await;

    runtime.send_text("maybe?").await;

    let transcript = runtime.transcript();
    let last = transcript.last().unwrap();
    assert_eq!(last.sender, Sender::Bot);
    assert!(last.content.contains("pick one of the suggested options"));
    // Traversal did not move.
    assert_eq!(runtime.current_node_id().as_deref(), Some("question"));
}

#[tokio::test(start_paused = true)]
async fn reset_cancels_a_pending_reveal() {
    let flow = doc(
        vec![node(
            "start",
            NodeKind::Start,
            vec![text_el("e1", &"x".repeat(400))],
        )],
        vec![],
    );
    let gateway = RecordingGateway::new();
    let runtime = Runtime::builder(flow).gateway(gateway.clone()).build();

    let background = {
        let runtime = runtime.clone();
        tokio::spawn(async move { runtime.start().await })
    };
    // Let the background start push its typing message, then reset while
    // the reveal delay is still pending.
    drain_spawned_tasks().await;
    assert!(runtime.transcript().iter().any(|m| m.is_typing));

    runtime.reset().await.expect("reset succeeds");
    background.await.unwrap().expect("background start");
    drain_spawned_tasks().await;

    // Only the fresh run's message survived; the cancelled reveal never
    // completed into the new transcript.
    let transcript = runtime.transcript();
    assert_eq!(transcript.len(), 1);
    assert!(!transcript[0].is_typing);
    assert_eq!(gateway.ended_sessions(), 1);
}

#[tokio::test(start_paused = true)]
async fn failing_gateway_never_blocks_traversal() {
    let runtime = Runtime::builder(branching_flow())
        .gateway(FailingGateway)
        .build();
    let prompt_id = answered_question(&runtime).await;

    assert_eq!(runtime.session_id(), None);

    runtime.select_option(&prompt_id, "Yes").await;
    drain_spawned_tasks().await;

    assert_eq!(runtime.current_node_id().as_deref(), Some("c"));
    assert_eq!(runtime.transcript().last().unwrap().content, "Great!");
}

#[tokio::test(start_paused = true)]
async fn analytics_calls_are_reported_per_node() {
    let gateway = RecordingGateway::new();
    let runtime = Runtime::builder(branching_flow())
        .gateway(gateway.clone())
        .build();
    let prompt_id = answered_question(&runtime).await;
    runtime.select_option(&prompt_id, "Yes").await;
    drain_spawned_tasks().await;

    let calls = gateway.calls();
    assert!(calls.contains(&GatewayCall::SessionCreated {
        assistant_id: "flow-1".to_string()
    }));
    assert_eq!(gateway.node_views(), vec!["start", "question", "c"]);
    // The terminal node requested a session end.
    assert_eq!(gateway.ended_sessions(), 1);
    // The chosen option was logged as a user message.
    assert!(calls.iter().any(|call| matches!(
        call,
        GatewayCall::MessageLogged { sender: Sender::User, content, content_type: MessageKind::Option, .. }
            if content == "Yes"
    )));
}

#[tokio::test(start_paused = true)]
async fn saved_transcript_is_restored_without_reprocessing() {
    let store = MemoryStore::new();
    let gateway = RecordingGateway::new();
    store.seed_transcript(
        "flow-1",
        TranscriptSnapshot {
            messages: vec![Message::user(MessageKind::Text, "earlier message")],
            current_node_id: Some("question".to_string()),
        },
    );

    let runtime = Runtime::builder(branching_flow())
        .gateway(gateway.clone())
        .store(store)
        .build();
    runtime.start().await.expect("start succeeds");
    drain_spawned_tasks().await;

    let transcript = runtime.transcript();
    assert_eq!(transcript.len(), 1);
    assert_eq!(transcript[0].content, "earlier message");
    assert_eq!(runtime.current_node_id().as_deref(), Some("question"));
    // No new session, no node processing.
    assert!(gateway.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn transcript_is_persisted_after_mutations() {
    let store = MemoryStore::new();
    let runtime = Runtime::builder(branching_flow())
        .store(store.clone())
        .build();
    runtime.start().await.expect("start succeeds");

    let saved = store.saved_transcript("flow-1").expect("snapshot saved");
    assert_eq!(saved.messages.len(), 1);
    assert_eq!(saved.messages[0].content, "Hello");
    assert_eq!(saved.current_node_id.as_deref(), Some("start"));
}
