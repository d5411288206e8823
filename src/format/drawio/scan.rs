// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Single-pass structural scan of draw.io XML.
//!
//! The scanner checks well-formedness (tag balance, entities, attribute quoting, one document
//! element) and records every `mxCell` together with where it sits in the tree. Validation,
//! mode detection and root merging all work off the same [`Scan`].

use std::ops::Range;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::model::Cell;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed XML at byte {position}: {message}")]
pub struct SyntaxError {
    pub position: usize,
    pub message: String,
}

impl SyntaxError {
    fn at(position: usize, message: impl Into<String>) -> Self {
        Self { position, message: message.into() }
    }
}

/// Where a cell sits relative to the `<root>` element that should own it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Direct child of `<root>`.
    Root,
    /// Child of an `object`/`UserObject` wrapper that is itself a direct child of `<root>`.
    Wrapped,
    /// Somewhere inside the body of another `mxCell`.
    Nested { ancestor_id: Option<String> },
    /// Outside any `<root>`, or under an element that is not `<root>`.
    Stray { container: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRecord {
    pub cell: Cell,
    pub placement: Placement,
    /// Index of the `<root>` element the cell was found in (0 when outside any root).
    pub page: usize,
    /// Number of `mxGeometry` children directly under this cell.
    pub geometry_count: usize,
    /// Byte range of the whole element, wrapper excluded.
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scan {
    /// Name of the single top-level element (`mxfile`, `mxGraphModel`, `root`, ...).
    pub document_element: String,
    pub cells: Vec<CellRecord>,
    /// Byte range of each `<root>` element, in document order.
    pub roots: Vec<Range<usize>>,
}

impl Scan {
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().filter_map(|record| record.cell.id())
    }
}

const CELL: &[u8] = b"mxCell";
const GEOMETRY: &[u8] = b"mxGeometry";
const ROOT: &[u8] = b"root";

pub(crate) fn is_wrapper(name: &[u8]) -> bool {
    name == b"object" || name == b"UserObject"
}

enum Frame {
    Root { start: usize, page: usize },
    Cell { record: usize },
    Wrapper { id: Option<String>, label: Option<String> },
    Other,
}

struct Open {
    name: String,
    frame: Frame,
}

/// Checks well-formedness only.
pub fn check_syntax(xml: &str) -> Result<(), SyntaxError> {
    scan(xml).map(|_| ())
}

pub fn scan(xml: &str) -> Result<Scan, SyntaxError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut scanner = Scanner::default();
    loop {
        let start = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .map_err(|err| SyntaxError::at(reader.error_position() as usize, err.to_string()))?;
        let end = reader.buffer_position() as usize;
        match event {
            Event::Start(tag) => scanner.open(&tag, start, end, false)?,
            Event::Empty(tag) => scanner.open(&tag, start, end, true)?,
            Event::End(_) => scanner.close(start, end)?,
            Event::Text(text) => {
                let text = text.unescape().map_err(|err| SyntaxError::at(start, err.to_string()))?;
                if scanner.stack.is_empty() && !text.trim().is_empty() {
                    return Err(SyntaxError::at(start, "text outside the document element"));
                }
            }
            Event::CData(_) if scanner.stack.is_empty() => {
                return Err(SyntaxError::at(start, "CDATA outside the document element"));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = scanner.stack.last() {
        return Err(SyntaxError::at(xml.len(), format!("unclosed element <{}>", open.name)));
    }
    if scanner.out.document_element.is_empty() {
        return Err(SyntaxError::at(0, "no element found"));
    }
    Ok(scanner.out)
}

#[derive(Default)]
struct Scanner {
    stack: Vec<Open>,
    out: Scan,
    closed_document: bool,
}

impl Scanner {
    fn open(&mut self, tag: &BytesStart<'_>, start: usize, end: usize, empty: bool) -> Result<(), SyntaxError> {
        let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
        if self.stack.is_empty() {
            if self.closed_document {
                return Err(SyntaxError::at(start, format!("second top-level element <{name}>")));
            }
            self.out.document_element = name.clone();
        }
        let attributes = read_attributes(tag, start)?;

        let frame = match tag.name().as_ref() {
            ROOT => {
                let page = self.out.roots.len();
                Frame::Root { start, page }
            }
            CELL => Frame::Cell { record: self.record_cell(attributes, start..end) },
            GEOMETRY => {
                if let Some(Open { frame: Frame::Cell { record }, .. }) = self.stack.last() {
                    self.out.cells[*record].geometry_count += 1;
                }
                Frame::Other
            }
            other if is_wrapper(other) => Frame::Wrapper {
                id: lookup(&attributes, "id"),
                label: lookup(&attributes, "label"),
            },
            _ => Frame::Other,
        };

        let open = Open { name, frame };
        if empty {
            self.finish(open, end);
        } else {
            self.stack.push(open);
        }
        Ok(())
    }

    fn close(&mut self, start: usize, end: usize) -> Result<(), SyntaxError> {
        match self.stack.pop() {
            Some(open) => {
                self.finish(open, end);
                Ok(())
            }
            None => Err(SyntaxError::at(start, "closing tag without a matching opening tag")),
        }
    }

    fn finish(&mut self, open: Open, end: usize) {
        match open.frame {
            Frame::Root { start, .. } => self.out.roots.push(start..end),
            Frame::Cell { record } => self.out.cells[record].span.end = end,
            Frame::Wrapper { .. } | Frame::Other => {}
        }
        if self.stack.is_empty() {
            self.closed_document = true;
        }
    }

    fn record_cell(&mut self, attributes: Vec<(String, String)>, span: Range<usize>) -> usize {
        let wrapper = match self.stack.last() {
            Some(Open { frame: Frame::Wrapper { id, label }, .. }) => Some((id.clone(), label.clone())),
            _ => None,
        };
        let (wrapper_id, wrapper_label) = wrapper.clone().unwrap_or_default();

        let cell = Cell {
            id: lookup(&attributes, "id").or(wrapper_id),
            parent: lookup(&attributes, "parent"),
            value: lookup(&attributes, "value").or(wrapper_label),
            style: lookup(&attributes, "style"),
            vertex: lookup(&attributes, "vertex").as_deref() == Some("1"),
            edge: lookup(&attributes, "edge").as_deref() == Some("1"),
            source: lookup(&attributes, "source"),
            target: lookup(&attributes, "target"),
        };

        let record = CellRecord {
            cell,
            placement: self.placement(wrapper.is_some()),
            page: self.current_page(),
            geometry_count: 0,
            span,
        };
        self.out.cells.push(record);
        self.out.cells.len() - 1
    }

    fn placement(&self, wrapped: bool) -> Placement {
        let ancestor = self.stack.iter().rev().find_map(|open| match open.frame {
            Frame::Cell { record } => Some(record),
            _ => None,
        });
        if let Some(record) = ancestor {
            return Placement::Nested { ancestor_id: self.out.cells[record].cell.id.clone() };
        }

        let depth = self.stack.len();
        let container = if wrapped { depth.checked_sub(2) } else { depth.checked_sub(1) };
        match container.map(|index| &self.stack[index]) {
            Some(Open { frame: Frame::Root { .. }, .. }) if wrapped => Placement::Wrapped,
            Some(Open { frame: Frame::Root { .. }, .. }) => Placement::Root,
            Some(open) => Placement::Stray { container: open.name.clone() },
            None => Placement::Stray { container: "document".to_owned() },
        }
    }

    fn current_page(&self) -> usize {
        self.stack
            .iter()
            .rev()
            .find_map(|open| match open.frame {
                Frame::Root { page, .. } => Some(page),
                _ => None,
            })
            .unwrap_or(0)
    }
}

fn read_attributes(tag: &BytesStart<'_>, position: usize) -> Result<Vec<(String, String)>, SyntaxError> {
    let mut out = Vec::new();
    for attr in tag.attributes() {
        let attr = attr.map_err(|err| SyntaxError::at(position, err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        if memchr::memchr(b'<', &attr.value).is_some() {
            return Err(SyntaxError::at(
                position,
                format!("unescaped '<' in the value of attribute {key:?}"),
            ));
        }
        let value = attr
            .unescape_value()
            .map_err(|err| SyntaxError::at(position, format!("attribute {key:?}: {err}")))?
            .into_owned();
        out.push((key, value));
    }
    Ok(out)
}

fn lookup(attributes: &[(String, String)], key: &str) -> Option<String> {
    attributes.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
}
