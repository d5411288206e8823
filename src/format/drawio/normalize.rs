// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Envelope repair for model-produced fragments.
//!
//! Fragments are classified by their outermost recognizable tag and coerced into either a full
//! `<mxfile>` document or a bare `<root>` node-set. Nothing inside the node-set is touched.

use memchr::memmem;
use quick_xml::events::Event;
use quick_xml::Reader;

use super::scan::scan;
use crate::model::{CANVAS_CELL_ID, ROOT_CELL_ID};

const ROOT_SKELETON: &str = r#"<mxCell id="0"/>"#;
const CANVAS_SKELETON: &str = r#"<mxCell id="1" parent="0"/>"#;
const CELL_MARKERS: [&str; 3] = ["mxCell", "object", "UserObject"];

/// A fragment after envelope repair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// A complete `<mxfile>` document; replaces the current document outright.
    Document(String),
    /// A `<root>…</root>` node-set; replaces the first page's root.
    Root(String),
    /// No cell markers were found; the input is passed on unchanged.
    Unrecognized(String),
}

impl Normalized {
    pub fn as_str(&self) -> &str {
        match self {
            Normalized::Document(xml) | Normalized::Root(xml) | Normalized::Unrecognized(xml) => xml,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            Normalized::Document(xml) | Normalized::Root(xml) | Normalized::Unrecognized(xml) => xml,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Normalized::Unrecognized(_))
    }
}

pub fn normalize(fragment: &str) -> Normalized {
    let text = strip_code_fence(fragment);

    if let Some(start) = find_tag(text, "mxfile") {
        return Normalized::Document(slice_element(text, start, "mxfile").to_owned());
    }
    if let Some(start) = find_tag(text, "mxGraphModel") {
        let model = slice_element(text, start, "mxGraphModel");
        return Normalized::Document(synthesize_envelope_around_model(model));
    }
    if let Some(start) = find_tag(text, "root") {
        return Normalized::Root(slice_element(text, start, "root").to_owned());
    }
    match first_cell_marker(text) {
        Some(start) => Normalized::Root(wrap_cells(without_trailing_prose(&text[start..]))),
        None => Normalized::Unrecognized(fragment.to_owned()),
    }
}

/// Wraps a `<root>` node-set in a default single-page envelope.
pub fn synthesize_envelope(root: &str) -> String {
    synthesize_envelope_around_model(&format!("<mxGraphModel>{root}</mxGraphModel>"))
}

fn synthesize_envelope_around_model(model: &str) -> String {
    format!(r#"<mxfile><diagram name="Page-1" id="page-1">{model}</diagram></mxfile>"#)
}

/// Preview of a `display_diagram` input that is still streaming.
///
/// Keeps the complete leading cells and drops a truncated trailing one. Returns `None` until at
/// least one cell is complete.
pub fn normalize_streaming(partial: &str) -> Option<String> {
    let text = strip_code_fence(partial);
    let start = first_cell_marker(text)?;
    let cells = &text[start..];
    let complete = complete_cells_len(cells);
    (complete > 0).then(|| wrap_cells(&cells[..complete]))
}

/// Drops prose after the last complete cell. Trailing markup is kept so that a truncated cell
/// still fails validation.
fn without_trailing_prose(cells: &str) -> &str {
    let complete = complete_cells_len(cells);
    let rest = &cells[complete..];
    if complete > 0 && !rest.contains('<') {
        &cells[..complete]
    } else {
        cells.trim_end()
    }
}

/// Byte length of the leading run of complete top-level elements.
fn complete_cells_len(cells: &str) -> usize {
    let mut reader = Reader::from_str(cells);
    reader.config_mut().check_end_names = false;
    let mut depth = 0usize;
    let mut complete = 0usize;
    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::End(_)) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                if depth == 0 {
                    complete = reader.buffer_position() as usize;
                }
            }
            Ok(Event::Empty(_)) if depth == 0 => complete = reader.buffer_position() as usize,
            Ok(Event::Eof) | Err(_) => break,
            Ok(_) => {}
        }
    }
    complete
}

fn wrap_cells(cells: &str) -> String {
    let candidate = format!("<root>{cells}</root>");
    let Ok(found) = scan(&candidate) else {
        return candidate;
    };
    let has = |id: &str| found.ids().any(|existing| existing == id);
    let mut prefix = String::new();
    if !has(ROOT_CELL_ID) {
        prefix.push_str(ROOT_SKELETON);
    }
    if !has(CANVAS_CELL_ID) {
        prefix.push_str(CANVAS_SKELETON);
    }
    if prefix.is_empty() {
        candidate
    } else {
        format!("<root>{prefix}{cells}</root>")
    }
}

fn strip_code_fence(fragment: &str) -> &str {
    let mut text = fragment.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = rest.split_once('\n').map_or("", |(_, body)| body);
        if let Some(end) = memmem::rfind(text.as_bytes(), b"```") {
            text = &text[..end];
        }
    }
    text.trim()
}

/// Byte offset of the first `<name` that is a full tag name (not a prefix of a longer one).
fn find_tag(text: &str, name: &str) -> Option<usize> {
    let needle = format!("<{name}");
    memmem::find_iter(text.as_bytes(), needle.as_bytes()).find(|&at| {
        matches!(
            text.as_bytes().get(at + needle.len()),
            Some(b'>' | b'/' | b' ' | b'\t' | b'\r' | b'\n')
        )
    })
}

fn first_cell_marker(text: &str) -> Option<usize> {
    CELL_MARKERS.iter().filter_map(|name| find_tag(text, name)).min()
}

/// From `start` through the last closing tag of `name`, or to the end of the text when the
/// element is never closed.
fn slice_element<'a>(text: &'a str, start: usize, name: &str) -> &'a str {
    let closing = format!("</{name}>");
    let end = memmem::rfind(text.as_bytes(), closing.as_bytes())
        .filter(|&at| at >= start)
        .map_or(text.len(), |at| at + closing.len());
    &text[start..end]
}
