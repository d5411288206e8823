// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

/// The document an empty session starts from: one page holding only the two mandatory cells.
pub const EMPTY_DOCUMENT: &str = r#"<mxfile><diagram name="Page-1" id="page-1"><mxGraphModel><root><mxCell id="0"/><mxCell id="1" parent="0"/></root></mxGraphModel></diagram></mxfile>"#;

/// Id of the mandatory root cell.
pub const ROOT_CELL_ID: &str = "0";
/// Id of the mandatory default layer every top-level cell hangs off.
pub const CANVAS_CELL_ID: &str = "1";

/// The authoritative serialized diagram plus a revision counter.
///
/// The text is an `Arc<str>` shared with snapshots and tool results; reconciliation replaces it
/// wholesale and never edits it in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    xml: Arc<str>,
    rev: u64,
}

impl Document {
    pub fn new(xml: impl Into<Arc<str>>) -> Self {
        Self { xml: xml.into(), rev: 0 }
    }

    pub fn empty() -> Self {
        Self::new(EMPTY_DOCUMENT)
    }

    pub fn xml(&self) -> &str {
        &self.xml
    }

    pub fn shared_xml(&self) -> Arc<str> {
        self.xml.clone()
    }

    pub fn rev(&self) -> u64 {
        self.rev
    }

    /// True when there is no cached text at all (nothing has been loaded or exported yet).
    pub fn is_blank(&self) -> bool {
        self.xml.trim().is_empty()
    }

    pub(crate) fn supersede(&mut self, xml: impl Into<Arc<str>>) -> u64 {
        self.xml = xml.into();
        self.rev = self.rev.wrapping_add(1);
        self.rev
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty()
    }
}
