// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Literal search/replace edits against the serialized document.
//!
//! Edits are applied in order to a working copy. Each edit replaces only the first byte-exact
//! occurrence of its search text in the buffer as left by the previous edits. The first miss
//! aborts the whole batch and the caller's text stays authoritative.

use std::sync::Arc;

use memchr::memmem;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One `(search, replace)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EditOperation {
    /// Exact text to find in the current diagram XML, copied character for character
    /// (attribute order and whitespace included).
    pub search: String,
    /// Text that replaces the first occurrence of `search`.
    pub replace: String,
}

impl EditOperation {
    pub fn new(search: impl Into<String>, replace: impl Into<String>) -> Self {
        Self { search: search.into(), replace: replace.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchResult {
    pub text: String,
    pub applied: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchError {
    #[error("edit #{} has an empty search pattern", index + 1)]
    EmptySearch { index: usize },
    #[error("edit #{} failed: search pattern not found in the current diagram: {search:?}", index + 1)]
    NotFound {
        index: usize,
        search: String,
        /// The untouched document text the batch was applied to.
        document: Arc<str>,
    },
}

impl PatchError {
    pub fn index(&self) -> usize {
        match self {
            Self::EmptySearch { index } | Self::NotFound { index, .. } => *index,
        }
    }
}

pub fn apply_edits(document: &Arc<str>, edits: &[EditOperation]) -> Result<PatchResult, PatchError> {
    let mut text = document.to_string();

    for (index, edit) in edits.iter().enumerate() {
        if edit.search.is_empty() {
            return Err(PatchError::EmptySearch { index });
        }
        let Some(at) = memmem::find(text.as_bytes(), edit.search.as_bytes()) else {
            return Err(PatchError::NotFound {
                index,
                search: edit.search.clone(),
                document: document.clone(),
            });
        };
        text.replace_range(at..at + edit.search.len(), &edit.replace);
    }

    Ok(PatchResult { text, applied: edits.len() })
}
