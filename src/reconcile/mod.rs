// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Merging normalized fragments into the live document.
//!
//! [`DocumentStore`] owns the authoritative document text. [`Reconciler`] is the only path that
//! supersedes it after a tool call: it assembles the candidate document, re-checks its syntax
//! and hands it to the renderer before committing.

mod store;

pub use store::DocumentStore;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::format::drawio::{check_syntax, scan, synthesize_envelope, Normalized, SyntaxError};
use crate::renderer::Renderer;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    #[error("fragment contains no diagram cells")]
    Unrecognized,
    #[error("assembled document failed the syntax check; the renderer was not updated: {0}")]
    Syntax(#[from] SyntaxError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The fragment matched the last applied one; nothing was loaded.
    Unchanged { rev: u64 },
    Loaded { rev: u64 },
}

impl ReconcileOutcome {
    pub fn rev(self) -> u64 {
        match self {
            Self::Unchanged { rev } | Self::Loaded { rev } => rev,
        }
    }

    pub fn changed(self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

pub struct Reconciler {
    renderer: Arc<dyn Renderer>,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler").finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self { renderer }
    }

    /// Assembles the document that results from applying `fragment` to `current`.
    ///
    /// A full document replaces `current`. A root replaces the node-set of the first page,
    /// keeping the envelope and any other pages; when `current` has no usable envelope a default
    /// single-page one is synthesized.
    pub fn merge(current: &str, fragment: &Normalized) -> Result<String, ReconcileError> {
        match fragment {
            Normalized::Document(xml) => Ok(xml.clone()),
            Normalized::Root(root) => Ok(splice_first_root(current, root)
                .unwrap_or_else(|| synthesize_envelope(root))),
            Normalized::Unrecognized(_) => Err(ReconcileError::Unrecognized),
        }
    }

    pub fn apply(
        &self,
        store: &mut DocumentStore,
        fragment: &Normalized,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        if store.last_fragment() == Some(fragment.as_str()) {
            debug!(rev = store.current().rev(), "fragment unchanged, skipping load");
            return Ok(ReconcileOutcome::Unchanged { rev: store.current().rev() });
        }

        let assembled = Self::merge(store.current().xml(), fragment)?;
        if let Err(err) = check_syntax(&assembled) {
            warn!(position = err.position, error = %err.message, "assembled document rejected");
            return Err(err.into());
        }

        self.renderer.load(&assembled);
        let len = assembled.len();
        let rev = store.commit(assembled, fragment.as_str());
        info!(rev, len, "document reconciled");
        Ok(ReconcileOutcome::Loaded { rev })
    }

    /// Shows a fragment in the renderer without touching the authoritative document.
    pub fn preview(&self, store: &DocumentStore, fragment: &Normalized) -> bool {
        let Ok(assembled) = Self::merge(store.current().xml(), fragment) else {
            return false;
        };
        if check_syntax(&assembled).is_err() {
            return false;
        }
        self.renderer.load(&assembled);
        true
    }

    /// Reloads the authoritative document into the renderer.
    pub fn restore(&self, store: &DocumentStore) {
        debug!(rev = store.current().rev(), "restoring renderer from the authoritative document");
        self.renderer.load(store.current().xml());
    }
}

fn splice_first_root(current: &str, root: &str) -> Option<String> {
    if !current.contains("<mxfile") {
        return None;
    }
    let found = scan(current).ok()?;
    let span = found.roots.first()?.clone();
    let mut out = String::with_capacity(current.len() - span.len() + root.len());
    out.push_str(&current[..span.start]);
    out.push_str(root);
    out.push_str(&current[span.end..]);
    Some(out)
}
