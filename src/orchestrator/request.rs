// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The body sent to the model endpoint for one turn.

use serde::Serialize;

use super::tools::{tool_definitions, ToolDefinition};
use crate::config::{Config, UploadLimits};
use crate::model::{ChatMessage, MessagePart, Role, SessionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMessage {
    pub content: String,
    /// Marks a prompt-cache breakpoint after this message.
    pub cache_point: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ContentPart {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        image: String,
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

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMessage {
    pub role: Role,
    pub content: Vec<ContentPart>,
    pub cache_point: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    pub session_id: Option<SessionId>,
    pub model_id: Option<String>,
    /// Document text the turn was built against.
    pub xml: String,
    pub system: Vec<SystemMessage>,
    pub messages: Vec<RequestMessage>,
    pub tools: Vec<ToolDefinition>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("Too many files. Maximum {max} allowed.")]
    TooManyFiles { count: usize, max: usize },
    #[error("File exceeds {}MB limit.", .max / (1024 * 1024))]
    FileTooLarge { index: usize, bytes: usize, max: usize },
}

/// Checks the file parts of the message about to be sent.
pub fn validate_uploads(message: &ChatMessage, limits: UploadLimits) -> Result<(), UploadError> {
    let files = message.files().collect::<Vec<_>>();
    if files.len() > limits.max_files {
        return Err(UploadError::TooManyFiles { count: files.len(), max: limits.max_files });
    }
    for (index, part) in files.into_iter().enumerate() {
        let MessagePart::File { url, .. } = part else {
            continue;
        };
        if let Some(bytes) = data_url_decoded_len(url).filter(|&bytes| bytes > limits.max_file_bytes) {
            return Err(UploadError::FileTooLarge { index, bytes, max: limits.max_file_bytes });
        }
    }
    Ok(())
}

/// Decoded byte length of a base64 `data:` URL payload, without decoding it. Unpadded payloads
/// may be over-counted by up to two bytes.
fn data_url_decoded_len(url: &str) -> Option<usize> {
    let rest = url.strip_prefix("data:")?;
    let (_, payload) = rest.split_once(',')?;
    let payload = payload.trim_end();
    let padding = payload.bytes().rev().take_while(|&b| b == b'=').count().min(2);
    Some(base64::decoded_len_estimate(payload.len()).saturating_sub(padding))
}

pub(crate) fn current_diagram_message(xml: &str) -> String {
    format!(
        "Current diagram XML:\n\"\"\"xml\n{xml}\n\"\"\"\n\
         When using edit_diagram, COPY search patterns exactly from this XML - attribute order matters!"
    )
}

pub(crate) fn format_user_input(text: &str) -> String {
    format!("User input:\n\"\"\"md\n{text}\n\"\"\"")
}

pub(crate) fn build(
    config: &Config,
    session_id: &SessionId,
    instructions: String,
    xml: &str,
    history: &[ChatMessage],
) -> TurnRequest {
    let mut messages = history
        .iter()
        .filter(|message| message.role != Role::System)
        .map(to_request_message)
        .filter(|message| !message.content.is_empty())
        .collect::<Vec<_>>();

    let last_user = messages.len().checked_sub(1).filter(|&last| messages[last].role == Role::User);
    if let (Some(last), Some(source)) = (last_user, history.last()) {
        let mut content = vec![ContentPart::Text { text: format_user_input(source.text()) }];
        content.extend(source.files().filter_map(image_part));
        messages[last].content = content;
    }
    if let Some(end) = last_user {
        if let Some(assistant) = messages[..end].iter_mut().rev().find(|m| m.role == Role::Assistant) {
            assistant.cache_point = true;
        }
    }

    TurnRequest {
        session_id: Some(session_id.clone()),
        model_id: config.model_id.clone(),
        xml: xml.to_owned(),
        system: vec![
            SystemMessage { content: instructions, cache_point: true },
            SystemMessage { content: current_diagram_message(xml), cache_point: true },
        ],
        messages,
        tools: tool_definitions(),
        max_tokens: config.max_tokens,
        temperature: 0.0,
    }
}

fn to_request_message(message: &ChatMessage) -> RequestMessage {
    let content = message
        .parts
        .iter()
        .filter_map(|part| match part {
            MessagePart::Text { text } if text.is_empty() => None,
            MessagePart::Text { text } => Some(ContentPart::Text { text: text.clone() }),
            MessagePart::File { .. } => image_part(part),
            MessagePart::ToolCall { tool_call_id, tool_name, input } => Some(ContentPart::ToolCall {
                tool_call_id: tool_call_id.clone(),
                tool_name: tool_name.clone(),
                input: input.clone(),
            }),
            MessagePart::ToolResult { tool_call_id, tool_name, output } => {
                Some(ContentPart::ToolResult {
                    tool_call_id: tool_call_id.clone(),
                    tool_name: tool_name.clone(),
                    output: output.clone(),
                })
            }
        })
        .collect();
    RequestMessage { role: message.role, content, cache_point: false }
}

fn image_part(part: &MessagePart) -> Option<ContentPart> {
    match part {
        MessagePart::File { url, media_type } => {
            Some(ContentPart::Image { image: url.clone(), media_type: media_type.clone() })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{build, data_url_decoded_len, validate_uploads, ContentPart, UploadError};
    use crate::config::{Config, UploadLimits};
    use crate::model::{ChatMessage, MessagePart, Role, SessionId, EMPTY_DOCUMENT};

    fn file(payload_len: usize) -> MessagePart {
        MessagePart::File {
            url: format!("data:image/png;base64,{}", "A".repeat(payload_len)),
            media_type: "image/png".into(),
        }
    }

    #[rstest]
    #[case("data:image/png;base64,QUJD", Some(3))]
    #[case("data:image/png;base64,QUI=", Some(2))]
    #[case("data:image/png;base64,QQ==", Some(1))]
    #[case::unpadded_rounds_up("data:image/png;base64,QUI", Some(3))]
    #[case("https://example.test/cat.png", None)]
    fn decoded_length(#[case] url: &str, #[case] expected: Option<usize>) {
        assert_eq!(data_url_decoded_len(url), expected);
    }

    #[test]
    fn too_many_files_are_rejected() {
        let message = ChatMessage::user("hi", (0..6).map(|_| file(8)).collect());
        assert_eq!(
            validate_uploads(&message, UploadLimits::default()),
            Err(UploadError::TooManyFiles { count: 6, max: 5 })
        );
    }

    #[test]
    fn oversized_file_is_rejected() {
        let limits = UploadLimits { max_files: 5, max_file_bytes: 6 };
        let message = ChatMessage::user("hi", vec![file(8), file(12)]);
        let err = validate_uploads(&message, limits).expect_err("too large");
        assert_eq!(err, UploadError::FileTooLarge { index: 1, bytes: 9, max: 6 });
        assert!(validate_uploads(&ChatMessage::user("hi", vec![file(8)]), limits).is_ok());
    }

    #[test]
    fn file_limit_message_is_in_megabytes() {
        let err = UploadError::FileTooLarge { index: 0, bytes: 3 << 20, max: 2 << 20 };
        assert_eq!(err.to_string(), "File exceeds 2MB limit.");
    }

    #[test]
    fn request_wraps_the_last_user_message_and_marks_cache_points() {
        let history = vec![
            ChatMessage::user("first", Vec::new()),
            ChatMessage {
                role: Role::Assistant,
                parts: vec![MessagePart::Text { text: "done".into() }],
            },
            ChatMessage::assistant(),
            ChatMessage::user("make it blue", vec![file(8)]),
        ];
        let session = SessionId::generate();
        let request = build(&Config::default(), &session, "rules".into(), EMPTY_DOCUMENT, &history);

        assert_eq!(request.messages.len(), 3, "empty assistant message is dropped");
        assert!(request.messages[1].cache_point);
        assert!(!request.messages[0].cache_point);

        let last = &request.messages[2];
        assert_eq!(
            last.content[0],
            ContentPart::Text { text: "User input:\n\"\"\"md\nmake it blue\n\"\"\"".into() }
        );
        assert!(matches!(last.content[1], ContentPart::Image { .. }));

        assert_eq!(request.system.len(), 2);
        assert!(request.system.iter().all(|message| message.cache_point));
        assert!(request.system[1].content.starts_with("Current diagram XML:\n\"\"\"xml\n<mxfile>"));
        assert_eq!(request.tools.len(), 2);
        assert_eq!(request.max_tokens, 8_000);
        assert_eq!(request.temperature, 0.0);
    }
}
