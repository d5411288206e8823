// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use serde_json::json;

use super::{Dispatch, Orchestrator, PendingTool, StreamEvent, ToolCall, TurnError, TurnMode, TurnPhase};
use crate::config::Config;
use crate::model::fixtures::{root_of, BOX_A, BOX_B};
use crate::model::{MessagePart, Role, ToolCallId, EMPTY_DOCUMENT};
use crate::orchestrator::InstructionProfile;
use crate::renderer::{ExportError, MemoryRenderer, Renderer};

fn setup() -> (Orchestrator, Arc<MemoryRenderer>) {
    setup_with(Config::default())
}

fn setup_with(config: Config) -> (Orchestrator, Arc<MemoryRenderer>) {
    let renderer = Arc::new(MemoryRenderer::new());
    let dyn_renderer: Arc<dyn Renderer> = renderer.clone();
    (Orchestrator::new(config, dyn_renderer), renderer)
}

fn call_id(value: &str) -> ToolCallId {
    ToolCallId::new(value).expect("valid tool call id")
}

fn display(id: &str, xml: &str) -> ToolCall {
    ToolCall { tool_call_id: call_id(id), tool_name: "display_diagram".into(), input: json!({ "xml": xml }) }
}

fn edit(id: &str, search: &str, replace: &str) -> ToolCall {
    ToolCall {
        tool_call_id: call_id(id),
        tool_name: "edit_diagram".into(),
        input: json!({ "edits": [{ "search": search, "replace": replace }] }),
    }
}

#[tokio::test]
async fn cached_prompt_replays_through_the_normal_pipeline() {
    let (orchestrator, renderer) = setup();
    let start = orchestrator.submit("Draw a simple login flow", Vec::new()).await.expect("submit");
    assert_eq!(start.mode, TurnMode::Create);

    let Dispatch::Cached(events) = start.dispatch else {
        panic!("expected a cached dispatch");
    };
    assert_eq!(events.first(), Some(&StreamEvent::Start));
    assert_eq!(events.last(), Some(&StreamEvent::Finish));

    let results = orchestrator.replay(start.turn, events).await.expect("replay");
    assert_eq!(results.len(), 1);
    assert!(!results[0].is_error, "{}", results[0].output);
    assert_eq!(orchestrator.phase().await, TurnPhase::Settled);
    assert_eq!(renderer.xml(), orchestrator.document().await.xml());

    let conversation = orchestrator.conversation().await;
    assert_eq!(conversation.len(), 2);
    let assistant = conversation.get(1).expect("assistant message");
    assert_eq!(assistant.role, Role::Assistant);
    assert!(matches!(assistant.parts[0], MessagePart::ToolCall { .. }));
    assert!(matches!(assistant.parts[1], MessagePart::ToolResult { .. }));
}

#[tokio::test]
async fn cached_responses_can_be_disabled() {
    let config = Config { cached_responses: false, ..Config::default() };
    let (orchestrator, _) = setup_with(config);
    let start = orchestrator.submit("Draw a simple login flow", Vec::new()).await.expect("submit");
    assert!(matches!(start.dispatch, Dispatch::Model(_)));
}

#[tokio::test]
async fn model_request_carries_the_formatted_export() {
    let (orchestrator, _) = setup();
    let start = orchestrator.submit("draw a cat", Vec::new()).await.expect("submit");
    let Dispatch::Model(request) = start.dispatch else {
        panic!("expected a model dispatch");
    };
    assert_eq!(request.xml, orchestrator.document().await.xml());
    assert!(request.xml.contains('\n'));
    assert_eq!(request.system.len(), 2);
    assert_eq!(request.tools.len(), 2);
    assert_eq!(request.session_id, Some(orchestrator.session_id().await));
    assert_eq!(orchestrator.snapshot(0).await.map(|s| s.xml().to_owned()), Some(request.xml));
}

#[tokio::test]
async fn display_then_edit_switches_to_edit_mode() {
    let (orchestrator, renderer) = setup();
    let first = orchestrator.submit("draw a box", Vec::new()).await.expect("submit");
    let result = orchestrator
        .handle_tool_call(first.turn, display("call-1", &root_of(&[BOX_A])))
        .await
        .expect("tool call");
    assert_eq!(result.output, "Successfully displayed the diagram.");
    orchestrator.settle(first.turn).await.expect("settle");

    let second = orchestrator.submit("rename it", Vec::new()).await.expect("submit");
    assert_eq!(second.mode, TurnMode::Edit);
    assert_eq!(second.profile, InstructionProfile::Extended);

    let result = orchestrator
        .handle_tool_call(second.turn, edit("call-2", r#"value="A""#, r#"value="Alpha""#))
        .await
        .expect("tool call");
    assert!(!result.is_error, "{}", result.output);
    assert_eq!(result.output, "Successfully applied 1 edit(s) to the diagram.");
    assert!(renderer.xml().contains(r#"value="Alpha""#));
}

#[tokio::test]
async fn failed_edit_reports_the_current_document() {
    let (orchestrator, renderer) = setup();
    let start = orchestrator.submit("draw a box", Vec::new()).await.expect("submit");
    orchestrator
        .handle_tool_call(start.turn, display("call-1", &root_of(&[BOX_A])))
        .await
        .expect("display");
    let before = orchestrator.document().await;

    let result = orchestrator
        .handle_tool_call(start.turn, edit("call-2", r#"value="Z""#, r#"value="Y""#))
        .await
        .expect("tool call");
    assert!(result.is_error);
    assert!(result.output.starts_with("Edit failed:"));
    assert!(result.output.contains(before.xml()));
    assert!(result.output.contains("use display_diagram"));
    assert_eq!(orchestrator.document().await, before);
    assert_eq!(renderer.xml(), before.xml());
    assert_eq!(orchestrator.phase().await, TurnPhase::Submitted);
}

#[tokio::test]
async fn invalid_display_keeps_the_document() {
    let (orchestrator, _) = setup();
    let start = orchestrator.submit("draw", Vec::new()).await.expect("submit");
    let before = orchestrator.document().await;
    let nested = r#"<root><mxCell id="0"/><mxCell id="1" parent="0"><mxCell id="x" parent="1"/></mxCell></root>"#;
    let result = orchestrator
        .handle_tool_call(start.turn, display("call-1", nested))
        .await
        .expect("tool call");
    assert!(result.is_error);
    assert_eq!(orchestrator.document().await, before);
}

#[tokio::test]
async fn unknown_tool_is_rejected_at_the_boundary() {
    let (orchestrator, _) = setup();
    let start = orchestrator.submit("draw", Vec::new()).await.expect("submit");
    let call = ToolCall { tool_call_id: call_id("call-9"), tool_name: "rm_rf".into(), input: json!({}) };
    let result = orchestrator.handle_tool_call(start.turn, call).await.expect("tool call");
    assert!(result.is_error);
    assert_eq!(result.tool, "rm_rf");
}

#[tokio::test]
async fn superseded_turn_cannot_touch_the_document() {
    let (orchestrator, _) = setup();
    let stale = orchestrator.submit("first", Vec::new()).await.expect("submit");
    let current = orchestrator.submit("second", Vec::new()).await.expect("submit");
    assert_ne!(stale.turn, current.turn);
    let before = orchestrator.document().await;

    let err = orchestrator
        .handle_tool_call(stale.turn, display("call-1", &root_of(&[BOX_A])))
        .await
        .expect_err("stale turn");
    assert!(matches!(err, TurnError::Stale { turn } if turn == stale.turn));
    assert_eq!(orchestrator.document().await, before);
}

#[tokio::test]
async fn settled_turn_rejects_late_events() {
    let (orchestrator, _) = setup();
    let start = orchestrator.submit("draw", Vec::new()).await.expect("submit");
    orchestrator.settle(start.turn).await.expect("settle");
    let err = orchestrator.record_assistant_text(start.turn, "late").await.expect_err("settled");
    assert!(matches!(err, TurnError::Stale { .. }));
}

#[tokio::test]
async fn streaming_preview_is_replaced_on_settle() {
    let (orchestrator, renderer) = setup();
    let start = orchestrator.submit("draw", Vec::new()).await.expect("submit");
    let id = call_id("call-1");
    let partial = format!("<root>{BOX_A}<mxCell id=\"b\" va");
    let shown = orchestrator.stream_display_input(start.turn, &id, &partial).await.expect("delta");
    assert!(shown);
    assert_eq!(
        orchestrator.phase().await,
        TurnPhase::ToolPending(PendingTool::GenerateWhole)
    );
    assert!(renderer.xml().contains(r#"id="a""#));

    orchestrator.settle(start.turn).await.expect("settle");
    assert_eq!(renderer.xml(), orchestrator.document().await.xml());
    assert!(!renderer.xml().contains(r#"id="a""#));
}

#[tokio::test]
async fn regenerate_restores_the_turn_snapshot() {
    let (orchestrator, renderer) = setup();
    let first = orchestrator.submit("one box", Vec::new()).await.expect("submit");
    orchestrator
        .handle_tool_call(first.turn, display("call-1", &root_of(&[BOX_A])))
        .await
        .expect("display");
    orchestrator.settle(first.turn).await.expect("settle");

    let second = orchestrator.submit("two boxes", Vec::new()).await.expect("submit");
    orchestrator
        .handle_tool_call(second.turn, display("call-2", &root_of(&[BOX_A, BOX_B])))
        .await
        .expect("display");
    orchestrator.settle(second.turn).await.expect("settle");
    assert_eq!(orchestrator.conversation().await.len(), 4);

    let snapshot = orchestrator.snapshot(2).await.expect("snapshot for the second turn");
    let again = orchestrator.regenerate(3).await.expect("regenerate");
    assert_eq!(again.mode, TurnMode::Edit);

    let document = orchestrator.document().await;
    assert_eq!(document.xml(), snapshot.xml());
    assert!(!document.xml().contains(r#"id="b""#));
    assert_eq!(renderer.xml(), snapshot.xml());

    let conversation = orchestrator.conversation().await;
    assert_eq!(conversation.len(), 3);
    assert_eq!(conversation.get(2).map(|m| m.text()), Some("two boxes"));
    assert!(orchestrator.snapshot(3).await.is_none());
}

#[tokio::test]
async fn edit_message_resubmits_with_new_text() {
    let (orchestrator, _) = setup();
    orchestrator.submit("draw a box", Vec::new()).await.expect("submit");
    let start = orchestrator.edit_message(0, "draw a circle").await.expect("edit");
    let conversation = orchestrator.conversation().await;
    assert_eq!(conversation.len(), 1);
    assert_eq!(conversation.get(0).map(|m| m.text()), Some("draw a circle"));
    assert_eq!(start.turn.get(), 2);
}

#[tokio::test]
async fn regenerate_and_edit_reject_wrong_roles() {
    let (orchestrator, _) = setup();
    orchestrator.submit("draw", Vec::new()).await.expect("submit");
    assert!(matches!(
        orchestrator.regenerate(0).await,
        Err(TurnError::NotAssistantMessage { index: 0 })
    ));
    assert!(matches!(
        orchestrator.edit_message(5, "x").await,
        Err(TurnError::NotUserMessage { index: 5 })
    ));
}

#[tokio::test]
async fn empty_and_oversized_submits_are_rejected() {
    let (orchestrator, _) = setup();
    assert!(matches!(orchestrator.submit("  ", Vec::new()).await, Err(TurnError::EmptyMessage)));

    let files = (0..6)
        .map(|_| MessagePart::File { url: "data:image/png;base64,AAAA".into(), media_type: "image/png".into() })
        .collect();
    assert!(matches!(orchestrator.submit("look", files).await, Err(TurnError::Upload(_))));
    assert!(orchestrator.conversation().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn stalled_renderer_fails_the_submit() {
    let (orchestrator, renderer) = setup();
    renderer.set_stalled(true);
    let err = orchestrator.submit("draw", Vec::new()).await.expect_err("timeout");
    assert!(matches!(err, TurnError::Export(ExportError::Timeout { .. })));
    assert!(orchestrator.conversation().await.is_empty());
}

#[tokio::test]
async fn clear_starts_a_fresh_session() {
    let (orchestrator, renderer) = setup();
    let start = orchestrator.submit("draw", Vec::new()).await.expect("submit");
    orchestrator
        .handle_tool_call(start.turn, display("call-1", &root_of(&[BOX_A])))
        .await
        .expect("display");
    let before = orchestrator.session_id().await;

    let after = orchestrator.clear().await;
    assert_ne!(before, after);
    assert!(orchestrator.conversation().await.is_empty());
    assert!(orchestrator.snapshot(0).await.is_none());
    assert_eq!(orchestrator.document().await.xml(), EMPTY_DOCUMENT);
    assert_eq!(renderer.xml(), EMPTY_DOCUMENT);
    assert_eq!(orchestrator.phase().await, TurnPhase::Idle);
    assert!(orchestrator.settle(start.turn).await.is_err());
}

#[tokio::test]
async fn supplied_session_id_is_kept() {
    let renderer: Arc<dyn Renderer> = Arc::new(MemoryRenderer::new());
    let orchestrator = Orchestrator::with_session(Config::default(), renderer, Some("session-abc"));
    assert_eq!(orchestrator.session_id().await.as_str(), "session-abc");
}

#[tokio::test]
async fn submits_save_versions_that_can_be_restored() {
    let (orchestrator, renderer) = setup();
    let first = orchestrator.submit("draw a box", Vec::new()).await.expect("submit");
    let empty = orchestrator.document().await.xml().to_owned();
    orchestrator
        .handle_tool_call(first.turn, display("call-1", &root_of(&[BOX_A])))
        .await
        .expect("display");
    orchestrator.settle(first.turn).await.expect("settle");

    orchestrator.submit("add another", Vec::new()).await.expect("submit");
    let versions = orchestrator.versions().await;
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0].xml(), empty);
    assert!(versions[1].xml().contains(r#"value="A""#));
    assert!(!versions[1].svg().is_empty());

    let before = orchestrator.document().await.rev();
    let rev = orchestrator.restore_version(0).await.expect("restore");
    assert!(rev > before);
    assert_eq!(orchestrator.document().await.xml(), empty);
    assert_eq!(renderer.xml(), empty);
    assert_eq!(orchestrator.versions().await.len(), 2);
}

#[tokio::test]
async fn unchanged_diagram_is_saved_once() {
    let (orchestrator, _) = setup();
    let first = orchestrator.submit("hello", Vec::new()).await.expect("submit");
    orchestrator.settle(first.turn).await.expect("settle");
    orchestrator.submit("hello again", Vec::new()).await.expect("submit");
    assert_eq!(orchestrator.versions().await.len(), 1);
}

#[tokio::test]
async fn unknown_version_is_rejected() {
    let (orchestrator, _) = setup();
    orchestrator.submit("draw", Vec::new()).await.expect("submit");
    let before = orchestrator.document().await;

    let err = orchestrator.restore_version(7).await.expect_err("no such version");
    assert!(matches!(err, TurnError::UnknownVersion { index: 7 }));
    assert_eq!(err.to_string(), "no saved diagram version #7");
    assert_eq!(orchestrator.document().await, before);
}

#[tokio::test]
async fn history_keeps_the_configured_number_of_versions() {
    let config = Config { history_limit: 1, ..Config::default() };
    let (orchestrator, _) = setup_with(config);
    let first = orchestrator.submit("draw a box", Vec::new()).await.expect("submit");
    orchestrator
        .handle_tool_call(first.turn, display("call-1", &root_of(&[BOX_A, BOX_B])))
        .await
        .expect("display");
    orchestrator.settle(first.turn).await.expect("settle");
    orchestrator.submit("and now?", Vec::new()).await.expect("submit");

    let versions = orchestrator.versions().await;
    assert_eq!(versions.len(), 1);
    assert!(versions[0].xml().contains(r#"value="B""#));
}

#[tokio::test]
async fn clear_drops_saved_versions() {
    let (orchestrator, _) = setup();
    orchestrator.submit("draw", Vec::new()).await.expect("submit");
    assert_eq!(orchestrator.versions().await.len(), 1);
    orchestrator.clear().await;
    assert!(orchestrator.versions().await.is_empty());
}
