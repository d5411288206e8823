// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One part of a chat message, shaped like the UI message parts exchanged with the model
/// endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MessagePart {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    File {
        url: String,
        media_type: String,
    },
    #[serde(rename_all = "camelCase")]
    ToolCall {
        tool_call_id: String,
        tool_name: String,
        input: serde_json::Value,
    },
    #[serde(rename_all = "camelCase")]
    ToolResult {
        tool_call_id: String,
        tool_name: String,
        output: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub parts: Vec<MessagePart>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>, files: Vec<MessagePart>) -> Self {
        let mut parts = vec![MessagePart::Text { text: text.into() }];
        parts.extend(files.into_iter().filter(|part| matches!(part, MessagePart::File { .. })));
        Self { role: Role::User, parts }
    }

    pub fn assistant() -> Self {
        Self { role: Role::Assistant, parts: Vec::new() }
    }

    /// Text of the first text part, or `""`.
    pub fn text(&self) -> &str {
        self.parts
            .iter()
            .find_map(|part| match part {
                MessagePart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn files(&self) -> impl Iterator<Item = &MessagePart> {
        self.parts.iter().filter(|part| matches!(part, MessagePart::File { .. }))
    }

    pub fn has_files(&self) -> bool {
        self.files().next().is_some()
    }

    /// Returns a copy whose text parts carry `text` instead; file parts are kept.
    pub fn with_text(&self, text: &str) -> Self {
        let mut parts = self
            .parts
            .iter()
            .map(|part| match part {
                MessagePart::Text { .. } => MessagePart::Text { text: text.to_owned() },
                other => other.clone(),
            })
            .collect::<Vec<_>>();
        if !parts.iter().any(|part| matches!(part, MessagePart::Text { .. })) {
            parts.insert(0, MessagePart::Text { text: text.to_owned() });
        }
        Self { role: self.role, parts }
    }
}

/// Ordered chat history. Indices are stable until the history is truncated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn get(&self, index: usize) -> Option<&ChatMessage> {
        self.messages.get(index)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Appends a message and returns its index.
    pub fn push(&mut self, message: ChatMessage) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    pub fn truncate(&mut self, len: usize) {
        self.messages.truncate(len);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// The trailing assistant message, created when the history ends with anything else.
    pub fn trailing_assistant_mut(&mut self) -> &mut ChatMessage {
        if self.messages.last().map(|m| m.role) != Some(Role::Assistant) {
            self.messages.push(ChatMessage::assistant());
        }
        let last = self.messages.len() - 1;
        &mut self.messages[last]
    }

    /// Index of the closest user message strictly before `index`.
    pub fn user_index_before(&self, index: usize) -> Option<usize> {
        self.messages
            .iter()
            .take(index.min(self.messages.len()))
            .rposition(|message| message.role == Role::User)
    }
}
