// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The two model tools: input parsing at the boundary, schemas, and result texts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::engine::{DisplayOutcome, EditOutcome, EngineError};
use crate::model::ToolCallId;
use crate::ops::{EditOperation, PatchError};
use crate::validate::ValidationReport;

pub const DISPLAY_DIAGRAM: &str = "display_diagram";
pub const EDIT_DIAGRAM: &str = "edit_diagram";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DisplayDiagramInput {
    /// Diagram cells inside <root>…</root>, starting with
    /// <mxCell id="0"/><mxCell id="1" parent="0"/>.
    pub xml: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EditDiagramInput {
    /// Search/replace pairs applied in order; each replaces the first exact match.
    pub edits: Vec<EditOperation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tool", content = "input", rename_all = "snake_case")]
pub enum ToolInput {
    DisplayDiagram(DisplayDiagramInput),
    EditDiagram(EditDiagramInput),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolInputError {
    #[error("unknown tool {name:?} (expected display_diagram or edit_diagram)")]
    UnknownTool { name: String },
    #[error("invalid input for {tool}: {message}")]
    Malformed { tool: &'static str, message: String },
}

impl ToolInput {
    pub fn parse(name: &str, input: serde_json::Value) -> Result<Self, ToolInputError> {
        let malformed = |tool: &'static str| {
            move |err: serde_json::Error| ToolInputError::Malformed { tool, message: err.to_string() }
        };
        match name {
            DISPLAY_DIAGRAM => serde_json::from_value(input)
                .map(Self::DisplayDiagram)
                .map_err(malformed(DISPLAY_DIAGRAM)),
            EDIT_DIAGRAM => serde_json::from_value(input)
                .map(Self::EditDiagram)
                .map_err(malformed(EDIT_DIAGRAM)),
            other => Err(ToolInputError::UnknownTool { name: other.to_owned() }),
        }
    }

    pub fn tool_name(&self) -> &'static str {
        match self {
            Self::DisplayDiagram(_) => DISPLAY_DIAGRAM,
            Self::EditDiagram(_) => EDIT_DIAGRAM,
        }
    }
}

/// A tool call as emitted by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    pub tool_call_id: ToolCallId,
    pub tool_name: String,
    pub input: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: serde_json::Value,
}

pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: DISPLAY_DIAGRAM,
            description: DISPLAY_DESCRIPTION,
            input_schema: schemars::schema_for!(DisplayDiagramInput).to_value(),
        },
        ToolDefinition {
            name: EDIT_DIAGRAM,
            description: EDIT_DESCRIPTION,
            input_schema: schemars::schema_for!(EditDiagramInput).to_value(),
        },
    ]
}

const DISPLAY_DESCRIPTION: &str = r#"Display a diagram on the draw.io canvas, replacing what is there. Pass the cells inside <root> tags; a <root> replaces the first page and keeps the page name and any other pages.

Validation rules (the XML is rejected if one is broken):
1. Every mxCell is a DIRECT child of <root>, never nested inside another mxCell
2. Every mxCell has a unique id
3. Every mxCell except id="0" has a valid parent attribute
4. Edge source/target name existing cell ids
5. Escape special characters in values: &lt; &gt; &amp; &quot;
6. Start with: <mxCell id="0"/><mxCell id="1" parent="0"/>

Example with swimlanes and an edge (all mxCells are siblings):
<root>
  <mxCell id="0"/>
  <mxCell id="1" parent="0"/>
  <mxCell id="lane1" value="Frontend" style="swimlane;" vertex="1" parent="1">
    <mxGeometry x="40" y="40" width="200" height="200" as="geometry"/>
  </mxCell>
  <mxCell id="step1" value="Step 1" style="rounded=1;" vertex="1" parent="lane1">
    <mxGeometry x="20" y="60" width="160" height="40" as="geometry"/>
  </mxCell>
  <mxCell id="lane2" value="Backend" style="swimlane;" vertex="1" parent="1">
    <mxGeometry x="280" y="40" width="200" height="200" as="geometry"/>
  </mxCell>
  <mxCell id="step2" value="Step 2" style="rounded=1;" vertex="1" parent="lane2">
    <mxGeometry x="20" y="60" width="160" height="40" as="geometry"/>
  </mxCell>
  <mxCell id="edge1" style="edgeStyle=orthogonalEdgeStyle;endArrow=classic;" edge="1" parent="1" source="step1" target="step2">
    <mxGeometry relative="1" as="geometry"/>
  </mxCell>
</root>

Notes:
- For AWS diagrams, use the AWS 2025 icon set.
- For animated connectors, add flowAnimation=1 to the edge style."#;

const EDIT_DESCRIPTION: &str = r#"Edit specific parts of the current diagram by replacing exact text. Use it for targeted fixes without regenerating the whole diagram.
Copy each search pattern EXACTLY from the "Current diagram XML" system message. Do not reorder attributes or reformat; attribute order varies between cells and must match.
Keep edits small:
- copy the exact mxCell line from the current XML
- include only the lines that change, plus one or two surrounding lines when needed
- split large changes into several edits; they apply in order and all or none are applied
- every search contains complete lines, never a line cut in the middle
- only the first match is replaced, so be specific enough to hit the right element"#;

/// The text returned to the model for one tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub tool_call_id: ToolCallId,
    pub tool: String,
    pub output: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn displayed(tool_call_id: ToolCallId, outcome: &DisplayOutcome) -> Self {
        let output = with_warnings("Successfully displayed the diagram.".to_owned(), &outcome.report);
        Self { tool_call_id, tool: DISPLAY_DIAGRAM.to_owned(), output, is_error: false }
    }

    pub fn edited(tool_call_id: ToolCallId, outcome: &EditOutcome) -> Self {
        let output = with_warnings(
            format!("Successfully applied {} edit(s) to the diagram.", outcome.applied),
            &outcome.report,
        );
        Self { tool_call_id, tool: EDIT_DIAGRAM.to_owned(), output, is_error: false }
    }

    /// Failure feedback. Edit failures carry the document text the edits were applied to so
    /// the model can build a corrected search pattern.
    pub fn failed(tool_call_id: ToolCallId, tool: &str, err: &EngineError, current_xml: &str) -> Self {
        let output = match err {
            EngineError::Patch(PatchError::NotFound { document, .. }) => edit_failure(err, document),
            _ if tool == EDIT_DIAGRAM => edit_failure(err, current_xml),
            _ => err.to_string(),
        };
        Self { tool_call_id, tool: tool.to_owned(), output, is_error: true }
    }

    pub fn rejected(tool_call_id: ToolCallId, tool: &str, message: impl Into<String>) -> Self {
        Self { tool_call_id, tool: tool.to_owned(), output: message.into(), is_error: true }
    }
}

fn edit_failure(err: &EngineError, xml: &str) -> String {
    format!(
        "Edit failed: {err}\n\nCurrent diagram XML:\n```xml\n{xml}\n```\n\n\
         Please retry with an adjusted search pattern or use display_diagram if retries are exhausted."
    )
}

fn with_warnings(mut output: String, report: &ValidationReport) -> String {
    if !report.warnings.is_empty() {
        output.push_str("\nWarnings:");
        for warning in &report.warnings {
            output.push_str("\n- ");
            output.push_str(&warning.to_string());
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{tool_definitions, ToolInput, ToolInputError, DISPLAY_DIAGRAM, EDIT_DIAGRAM};
    use crate::ops::EditOperation;

    #[test]
    fn display_description_carries_rules_and_an_example() {
        let tools = tool_definitions();
        let display = tools.iter().find(|tool| tool.name == DISPLAY_DIAGRAM).expect("display tool");
        assert!(display.description.contains("6. Start with: <mxCell id=\"0\"/>"));
        assert!(display.description.contains(r#"style="swimlane;""#));
        let edit = tools.iter().find(|tool| tool.name == EDIT_DIAGRAM).expect("edit tool");
        assert!(edit.description.contains("first match"));
    }

    #[test]
    fn parses_display_input() {
        let input = ToolInput::parse(DISPLAY_DIAGRAM, json!({ "xml": "<root/>" })).expect("parse");
        let ToolInput::DisplayDiagram(display) = input else {
            panic!("expected display_diagram");
        };
        assert_eq!(display.xml, "<root/>");
    }

    #[test]
    fn parses_edit_input_in_order() {
        let input = ToolInput::parse(
            EDIT_DIAGRAM,
            json!({ "edits": [{ "search": "a", "replace": "b" }, { "search": "b", "replace": "c" }] }),
        )
        .expect("parse");
        assert_eq!(input.tool_name(), EDIT_DIAGRAM);
        let ToolInput::EditDiagram(edit) = input else {
            panic!("expected edit_diagram");
        };
        assert_eq!(edit.edits, vec![EditOperation::new("a", "b"), EditOperation::new("b", "c")]);
    }

    #[test]
    fn rejects_unknown_tools_and_bad_shapes() {
        assert_eq!(
            ToolInput::parse("delete_everything", json!({})),
            Err(ToolInputError::UnknownTool { name: "delete_everything".into() })
        );
        assert!(matches!(
            ToolInput::parse(DISPLAY_DIAGRAM, json!({ "xml": 42 })),
            Err(ToolInputError::Malformed { tool: DISPLAY_DIAGRAM, .. })
        ));
        assert!(matches!(
            ToolInput::parse(EDIT_DIAGRAM, json!({ "edits": [{ "search": "a" }] })),
            Err(ToolInputError::Malformed { tool: EDIT_DIAGRAM, .. })
        ));
        assert!(ToolInput::parse(DISPLAY_DIAGRAM, json!({ "xml": "x", "extra": 1 })).is_err());
    }

    #[test]
    fn definitions_carry_generated_schemas() {
        let definitions = tool_definitions();
        assert_eq!(definitions.len(), 2);
        let edit = &definitions[1];
        assert_eq!(edit.name, EDIT_DIAGRAM);
        let schema = serde_json::to_string(&edit.input_schema).expect("schema json");
        assert!(schema.contains("\"edits\""));
        assert!(schema.contains("\"search\""));
    }
}
