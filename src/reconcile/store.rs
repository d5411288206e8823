// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use crate::model::{Document, EMPTY_DOCUMENT};

/// Single owner of the authoritative document.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    current: Document,
    last_fragment: Option<String>,
}

impl DocumentStore {
    pub fn new(document: Document) -> Self {
        Self { current: document, last_fragment: None }
    }

    pub fn current(&self) -> &Document {
        &self.current
    }

    pub fn last_fragment(&self) -> Option<&str> {
        self.last_fragment.as_deref()
    }

    /// Takes over text captured from the renderer. Returns the new revision when it differed.
    pub fn adopt(&mut self, xml: impl Into<Arc<str>>) -> Option<u64> {
        let xml = xml.into();
        if xml.as_ref() == self.current.xml() {
            return None;
        }
        self.last_fragment = None;
        Some(self.current.supersede(xml))
    }

    /// Unconditionally replaces the document (snapshot restore, clear).
    pub fn replace(&mut self, xml: impl Into<Arc<str>>) -> u64 {
        self.last_fragment = None;
        self.current.supersede(xml)
    }

    pub fn reset(&mut self) -> u64 {
        self.replace(EMPTY_DOCUMENT)
    }

    pub(super) fn commit(&mut self, xml: String, fragment: &str) -> u64 {
        self.last_fragment = Some(fragment.to_owned());
        self.current.supersede(xml)
    }
}
