// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Conversation and tool orchestration.
//!
//! One [`Orchestrator`] owns a chat session: the conversation, the per-turn snapshots and the
//! diagram engine, all behind a single async mutex. Every user turn gets a [`TurnId`]; tool
//! calls and stream events carry it back and are dropped when a newer turn has started.

pub mod cached;
pub mod mode;
pub mod profile;
pub mod request;
pub mod tools;
pub mod turn;

pub use cached::{cached_stream, find_cached_response, CachedResponse, StreamEvent};
pub use mode::{detect_mode, is_minimal, TurnMode};
pub use profile::InstructionProfile;
pub use request::{
    validate_uploads, ContentPart, RequestMessage, SystemMessage, TurnRequest, UploadError,
};
pub use tools::{
    tool_definitions, DisplayDiagramInput, EditDiagramInput, ToolCall, ToolDefinition, ToolInput,
    ToolInputError, ToolResult, DISPLAY_DIAGRAM, EDIT_DIAGRAM,
};
pub use turn::{PendingTool, TurnError, TurnId, TurnPhase};

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::engine::DiagramEngine;
use crate::format::drawio::format_xml;
use crate::model::{
    ChatMessage, Conversation, DiagramVersion, Document, MessagePart, Role, SessionId, Snapshot,
    SnapshotCache, ToolCallId, VersionHistory,
};
use crate::renderer::{ExportBridge, Renderer};
use turn::TurnTracker;

/// What the caller must do to run a freshly started turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Replay these events through [`Orchestrator::replay`]; no model call is needed.
    Cached(Vec<StreamEvent>),
    /// Send this request to the model and feed its events back with the returned turn id.
    Model(TurnRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnStart {
    pub turn: TurnId,
    pub mode: TurnMode,
    pub profile: InstructionProfile,
    pub dispatch: Dispatch,
}

struct SessionState {
    engine: DiagramEngine,
    conversation: Conversation,
    snapshots: SnapshotCache,
    session_id: SessionId,
    turns: TurnTracker,
    streaming: HashMap<ToolCallId, String>,
    history: VersionHistory,
}

pub struct Orchestrator {
    config: Config,
    bridge: ExportBridge,
    state: Mutex<SessionState>,
}

impl Orchestrator {
    pub fn new(config: Config, renderer: Arc<dyn Renderer>) -> Self {
        Self::with_session(config, renderer, None)
    }

    /// Like [`Orchestrator::new`], keeping a client-supplied session id when it is acceptable.
    pub fn with_session(config: Config, renderer: Arc<dyn Renderer>, session: Option<&str>) -> Self {
        let bridge = ExportBridge::new(renderer.clone(), config.export_timeout());
        let state = SessionState {
            engine: DiagramEngine::new(renderer, config.validation()),
            conversation: Conversation::default(),
            snapshots: SnapshotCache::default(),
            session_id: SessionId::accept(session).unwrap_or_else(SessionId::generate),
            turns: TurnTracker::default(),
            streaming: HashMap::new(),
            history: VersionHistory::with_capacity(config.history_limit),
        };
        Self { config, bridge, state: Mutex::new(state) }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sends a new user message.
    ///
    /// The live diagram is exported, re-indented and adopted as the authoritative text, saved as
    /// a version the user can go back to, then snapshotted under the new message's position
    /// before the message is appended.
    pub async fn submit(&self, text: &str, files: Vec<MessagePart>) -> Result<TurnStart, TurnError> {
        let message = ChatMessage::user(text, files);
        if message.text().trim().is_empty() && !message.has_files() {
            return Err(TurnError::EmptyMessage);
        }
        validate_uploads(&message, self.config.uploads)?;

        let mut state = self.state.lock().await;
        let exported = self.bridge.fetch_export().await?;
        if !exported.xml.trim().is_empty() {
            state.engine.adopt(format_xml(&exported.xml));
        }
        let xml = state.engine.document().shared_xml();
        if state.history.record(exported.data, xml.clone()) {
            debug!(versions = state.history.len(), "diagram version saved");
        }

        let index = state.conversation.len();
        state.snapshots.record(index, xml.clone());
        Ok(self.start_turn(&mut state, message, &xml))
    }

    /// Re-runs the user turn that produced the assistant message at `assistant_index`.
    pub async fn regenerate(&self, assistant_index: usize) -> Result<TurnStart, TurnError> {
        let mut state = self.state.lock().await;
        match state.conversation.get(assistant_index) {
            Some(message) if message.role == Role::Assistant => {}
            _ => return Err(TurnError::NotAssistantMessage { index: assistant_index }),
        }
        let Some(user_index) = state.conversation.user_index_before(assistant_index) else {
            return Err(TurnError::NotAssistantMessage { index: assistant_index });
        };
        let message = state
            .conversation
            .get(user_index)
            .cloned()
            .ok_or(TurnError::NotUserMessage { index: user_index })?;
        let xml = self.rewind(&mut state, user_index)?;
        info!(index = user_index, "regenerating turn");
        Ok(self.start_turn(&mut state, message, &xml))
    }

    /// Replaces the text of the user message at `index` and resends it from that point.
    pub async fn edit_message(&self, index: usize, text: &str) -> Result<TurnStart, TurnError> {
        let mut state = self.state.lock().await;
        let message = match state.conversation.get(index) {
            Some(message) if message.role == Role::User => message.with_text(text),
            _ => return Err(TurnError::NotUserMessage { index }),
        };
        validate_uploads(&message, self.config.uploads)?;
        let xml = self.rewind(&mut state, index)?;
        info!(index, "resubmitting edited message");
        Ok(self.start_turn(&mut state, message, &xml))
    }

    /// Runs one tool call of `turn` and records call and result on the assistant message.
    pub async fn handle_tool_call(&self, turn: TurnId, call: ToolCall) -> Result<ToolResult, TurnError> {
        let mut state = self.state.lock().await;
        if let Err(err) = state.turns.check(turn) {
            warn!(%turn, tool = %call.tool_name, "dropping tool call for a stale turn");
            return Err(err);
        }
        state.streaming.remove(&call.tool_call_id);

        let result = match ToolInput::parse(&call.tool_name, call.input.clone()) {
            Ok(input) => self.run_tool(&mut state, call.tool_call_id.clone(), input),
            Err(err) => {
                debug!(%turn, error = %err, "rejected tool input");
                ToolResult::rejected(call.tool_call_id.clone(), &call.tool_name, err.to_string())
            }
        };
        state.turns.enter(TurnPhase::Submitted);

        let assistant = state.conversation.trailing_assistant_mut();
        assistant.parts.push(MessagePart::ToolCall {
            tool_call_id: call.tool_call_id.to_string(),
            tool_name: call.tool_name,
            input: call.input,
        });
        assistant.parts.push(MessagePart::ToolResult {
            tool_call_id: result.tool_call_id.to_string(),
            tool_name: result.tool.clone(),
            output: result.output.clone(),
        });
        Ok(result)
    }

    /// Accumulates streamed `display_diagram` input and previews it. Returns whether the
    /// renderer was updated.
    pub async fn stream_display_input(
        &self,
        turn: TurnId,
        tool_call_id: &ToolCallId,
        delta: &str,
    ) -> Result<bool, TurnError> {
        let mut state = self.state.lock().await;
        state.turns.check(turn)?;
        state.turns.enter(TurnPhase::ToolPending(PendingTool::GenerateWhole));
        let buffer = state.streaming.entry(tool_call_id.clone()).or_default();
        buffer.push_str(delta);
        let partial = buffer.clone();
        Ok(state.engine.preview(&partial))
    }

    pub async fn record_assistant_text(&self, turn: TurnId, text: &str) -> Result<(), TurnError> {
        let mut state = self.state.lock().await;
        state.turns.check(turn)?;
        state
            .conversation
            .trailing_assistant_mut()
            .parts
            .push(MessagePart::Text { text: text.to_owned() });
        Ok(())
    }

    /// Feeds a synthesized event stream through the same pipeline as live model output.
    pub async fn replay(&self, turn: TurnId, events: Vec<StreamEvent>) -> Result<Vec<ToolResult>, TurnError> {
        let mut results = Vec::new();
        for event in events {
            match event {
                StreamEvent::Start | StreamEvent::ToolInputStart { .. } => {}
                StreamEvent::ToolInputDelta { tool_call_id, input_text_delta } => {
                    self.stream_display_input(turn, &tool_call_id, &input_text_delta).await?;
                }
                StreamEvent::ToolInputAvailable { tool_call_id, tool_name, input } => {
                    let call = ToolCall { tool_call_id, tool_name, input };
                    results.push(self.handle_tool_call(turn, call).await?);
                }
                StreamEvent::Finish => self.settle(turn).await?,
            }
        }
        Ok(results)
    }

    /// Ends `turn`. Any preview left over from an unfinished stream is replaced by the
    /// authoritative document.
    pub async fn settle(&self, turn: TurnId) -> Result<(), TurnError> {
        let mut state = self.state.lock().await;
        state.turns.check(turn)?;
        if !state.streaming.is_empty() {
            state.streaming.clear();
            state.engine.restore();
        }
        state.turns.enter(TurnPhase::Settled);
        debug!(%turn, rev = state.engine.document().rev(), "turn settled");
        Ok(())
    }

    /// Starts over: empty diagram, empty conversation, no snapshots or saved versions, new
    /// session id.
    pub async fn clear(&self) -> SessionId {
        let mut state = self.state.lock().await;
        state.engine.reset();
        state.conversation.clear();
        state.snapshots.clear();
        state.history.clear();
        state.streaming.clear();
        state.turns.abandon();
        state.session_id = SessionId::generate();
        info!(session = %state.session_id, "session cleared");
        state.session_id.clone()
    }

    pub async fn document(&self) -> Document {
        self.state.lock().await.engine.document().clone()
    }

    pub async fn conversation(&self) -> Conversation {
        self.state.lock().await.conversation.clone()
    }

    pub async fn session_id(&self) -> SessionId {
        self.state.lock().await.session_id.clone()
    }

    pub async fn phase(&self) -> TurnPhase {
        self.state.lock().await.turns.phase()
    }

    pub async fn snapshot(&self, index: usize) -> Option<Snapshot> {
        self.state.lock().await.snapshots.get(index).cloned()
    }

    /// Saved diagram versions, oldest first.
    pub async fn versions(&self) -> Vec<DiagramVersion> {
        self.state.lock().await.history.iter().cloned().collect()
    }

    /// Puts saved version `index` back on the canvas. The conversation is left as it is; the next
    /// message is sent against the restored diagram.
    pub async fn restore_version(&self, index: usize) -> Result<u64, TurnError> {
        let mut state = self.state.lock().await;
        let xml = state
            .history
            .get(index)
            .map(DiagramVersion::shared_xml)
            .ok_or(TurnError::UnknownVersion { index })?;
        let rev = state.engine.load_snapshot(xml);
        state.streaming.clear();
        info!(index, rev, "restored saved diagram version");
        Ok(rev)
    }

    fn run_tool(&self, state: &mut SessionState, tool_call_id: ToolCallId, input: ToolInput) -> ToolResult {
        let result = match input {
            ToolInput::DisplayDiagram(DisplayDiagramInput { xml }) => {
                state.turns.enter(TurnPhase::ToolPending(PendingTool::GenerateWhole));
                match state.engine.display(&xml) {
                    Ok(outcome) => ToolResult::displayed(tool_call_id, &outcome),
                    Err(err) => {
                        state.engine.restore();
                        let current = state.engine.document().shared_xml();
                        ToolResult::failed(tool_call_id, DISPLAY_DIAGRAM, &err, &current)
                    }
                }
            }
            ToolInput::EditDiagram(EditDiagramInput { edits }) => {
                state.turns.enter(TurnPhase::ToolPending(PendingTool::ApplyEdits));
                match state.engine.edit(&edits) {
                    Ok(outcome) => ToolResult::edited(tool_call_id, &outcome),
                    Err(err) => {
                        let current = state.engine.document().shared_xml();
                        ToolResult::failed(tool_call_id, EDIT_DIAGRAM, &err, &current)
                    }
                }
            }
        };
        if result.is_error {
            warn!(tool = %result.tool, "tool call failed");
        } else {
            info!(tool = %result.tool, rev = state.engine.document().rev(), "tool call applied");
        }
        result
    }

    /// Restores the snapshot taken for the user message at `index` and drops it and everything
    /// after it from the history. Returns the restored text.
    fn rewind(&self, state: &mut SessionState, index: usize) -> Result<Arc<str>, TurnError> {
        let xml = state
            .snapshots
            .get(index)
            .map(Snapshot::shared_xml)
            .ok_or(TurnError::MissingSnapshot { index })?;
        state.engine.load_snapshot(xml.clone());
        let pruned = state.snapshots.prune_after(index);
        state.conversation.truncate(index);
        state.streaming.clear();
        debug!(index, pruned, "rewound to snapshot");
        Ok(xml)
    }

    fn start_turn(&self, state: &mut SessionState, message: ChatMessage, xml: &str) -> TurnStart {
        let has_files = message.has_files();
        let text = message.text().to_owned();
        state.conversation.push(message);

        let turn = state.turns.begin();
        let mode = detect_mode(xml);
        let model_id = self.config.model_id.as_deref();
        let profile = InstructionProfile::select(mode, model_id, &self.config);
        info!(%turn, session = %state.session_id, ?mode, ?profile, "turn submitted");

        let cached = (self.config.cached_responses
            && state.conversation.len() == 1
            && is_minimal(xml))
        .then(|| find_cached_response(&text, has_files))
        .flatten();

        let dispatch = match cached {
            Some(cached) => {
                debug!(%turn, prompt = cached.prompt, "serving cached response");
                Dispatch::Cached(cached_stream(cached.xml))
            }
            None => Dispatch::Model(request::build(
                &self.config,
                &state.session_id,
                profile.instructions(),
                xml,
                state.conversation.messages(),
            )),
        };
        TurnStart { turn, mode, profile, dispatch }
    }
}

#[cfg(test)]
mod tests;
