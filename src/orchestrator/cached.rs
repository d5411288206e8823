// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Canned answers for well-known first prompts, replayed as a synthetic tool-call stream.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::tools::DISPLAY_DIAGRAM;
use crate::model::ToolCallId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedResponse {
    pub prompt: &'static str,
    pub xml: &'static str,
}

/// One event of a UI message stream, in the shape the chat client consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StreamEvent {
    Start,
    #[serde(rename_all = "camelCase")]
    ToolInputStart { tool_call_id: ToolCallId, tool_name: String },
    #[serde(rename_all = "camelCase")]
    ToolInputDelta { tool_call_id: ToolCallId, input_text_delta: String },
    #[serde(rename_all = "camelCase")]
    ToolInputAvailable { tool_call_id: ToolCallId, tool_name: String, input: serde_json::Value },
    Finish,
}

pub fn find_cached_response(prompt: &str, has_attachment: bool) -> Option<&'static CachedResponse> {
    if has_attachment {
        return None;
    }
    let prompt = prompt.trim();
    CACHED_RESPONSES.iter().find(|cached| cached.prompt == prompt)
}

/// The events a model would have produced had it called `display_diagram` with `xml`.
pub fn cached_stream(xml: &str) -> Vec<StreamEvent> {
    let tool_call_id = ToolCallId::cached();
    vec![
        StreamEvent::Start,
        StreamEvent::ToolInputStart {
            tool_call_id: tool_call_id.clone(),
            tool_name: DISPLAY_DIAGRAM.to_owned(),
        },
        StreamEvent::ToolInputDelta {
            tool_call_id: tool_call_id.clone(),
            input_text_delta: xml.to_owned(),
        },
        StreamEvent::ToolInputAvailable {
            tool_call_id,
            tool_name: DISPLAY_DIAGRAM.to_owned(),
            input: json!({ "xml": xml }),
        },
        StreamEvent::Finish,
    ]
}

pub const CACHED_RESPONSES: &[CachedResponse] = &[
    CachedResponse {
        prompt: "Draw a simple login flow",
        xml: r#"<root>
  <mxCell id="0"/>
  <mxCell id="1" parent="0"/>
  <mxCell id="start" value="Open app" style="ellipse;whiteSpace=wrap;html=1;" vertex="1" parent="1">
    <mxGeometry x="320" y="20" width="120" height="60" as="geometry"/>
  </mxCell>
  <mxCell id="form" value="Enter credentials" style="rounded=1;whiteSpace=wrap;html=1;" vertex="1" parent="1">
    <mxGeometry x="310" y="130" width="140" height="60" as="geometry"/>
  </mxCell>
  <mxCell id="check" value="Valid?" style="rhombus;whiteSpace=wrap;html=1;" vertex="1" parent="1">
    <mxGeometry x="330" y="240" width="100" height="80" as="geometry"/>
  </mxCell>
  <mxCell id="home" value="Home screen" style="rounded=1;whiteSpace=wrap;html=1;" vertex="1" parent="1">
    <mxGeometry x="310" y="380" width="140" height="60" as="geometry"/>
  </mxCell>
  <mxCell id="error" value="Show error" style="rounded=1;whiteSpace=wrap;html=1;fillColor=#f8cecc;" vertex="1" parent="1">
    <mxGeometry x="540" y="250" width="120" height="60" as="geometry"/>
  </mxCell>
  <mxCell id="e1" style="endArrow=classic;html=1;" edge="1" parent="1" source="start" target="form">
    <mxGeometry relative="1" as="geometry"/>
  </mxCell>
  <mxCell id="e2" style="endArrow=classic;html=1;" edge="1" parent="1" source="form" target="check">
    <mxGeometry relative="1" as="geometry"/>
  </mxCell>
  <mxCell id="e3" value="yes" style="endArrow=classic;html=1;" edge="1" parent="1" source="check" target="home">
    <mxGeometry relative="1" as="geometry"/>
  </mxCell>
  <mxCell id="e4" value="no" style="endArrow=classic;html=1;" edge="1" parent="1" source="check" target="error">
    <mxGeometry relative="1" as="geometry"/>
  </mxCell>
  <mxCell id="e5" style="endArrow=classic;html=1;edgeStyle=orthogonalEdgeStyle;" edge="1" parent="1" source="error" target="form">
    <mxGeometry relative="1" as="geometry"/>
  </mxCell>
</root>"#,
    },
    CachedResponse {
        prompt: "Draw a three-tier web architecture",
        xml: r#"<root>
  <mxCell id="0"/>
  <mxCell id="1" parent="0"/>
  <mxCell id="client" value="Browser" style="rounded=1;whiteSpace=wrap;html=1;fillColor=#dae8fc;" vertex="1" parent="1">
    <mxGeometry x="40" y="200" width="120" height="60" as="geometry"/>
  </mxCell>
  <mxCell id="web" value="Web tier" style="swimlane;whiteSpace=wrap;html=1;" vertex="1" parent="1">
    <mxGeometry x="220" y="120" width="180" height="220" as="geometry"/>
  </mxCell>
  <mxCell id="lb" value="Load balancer" style="rounded=1;whiteSpace=wrap;html=1;" vertex="1" parent="web">
    <mxGeometry x="30" y="50" width="120" height="50" as="geometry"/>
  </mxCell>
  <mxCell id="app" value="App servers" style="rounded=1;whiteSpace=wrap;html=1;" vertex="1" parent="web">
    <mxGeometry x="30" y="140" width="120" height="50" as="geometry"/>
  </mxCell>
  <mxCell id="db" value="Database" style="shape=cylinder3;whiteSpace=wrap;html=1;fillColor=#d5e8d4;" vertex="1" parent="1">
    <mxGeometry x="470" y="190" width="100" height="80" as="geometry"/>
  </mxCell>
  <mxCell id="c1" value="HTTPS" style="endArrow=classic;html=1;" edge="1" parent="1" source="client" target="lb">
    <mxGeometry relative="1" as="geometry"/>
  </mxCell>
  <mxCell id="c2" style="endArrow=classic;html=1;" edge="1" parent="1" source="lb" target="app">
    <mxGeometry relative="1" as="geometry"/>
  </mxCell>
  <mxCell id="c3" value="SQL" style="endArrow=classic;html=1;" edge="1" parent="1" source="app" target="db">
    <mxGeometry relative="1" as="geometry"/>
  </mxCell>
</root>"#,
    },
];
