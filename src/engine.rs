// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The diagram-mutation pipeline behind both tools.
//!
//! `display` runs Normalizer → Validator → Reconciler; `edit` runs the patch engine against the
//! authoritative text, then validates and reconciles the result like any other fragment.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::format::drawio::{normalize, normalize_streaming, Normalized};
use crate::model::Document;
use crate::ops::{apply_edits, EditOperation, PatchError};
use crate::reconcile::{DocumentStore, ReconcileError, Reconciler};
use crate::renderer::Renderer;
use crate::validate::{validate, ValidationError, ValidationOptions, ValidationReport};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Patch(#[from] PatchError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOutcome {
    pub rev: u64,
    pub changed: bool,
    pub report: ValidationReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub rev: u64,
    pub applied: usize,
    pub report: ValidationReport,
}

pub struct DiagramEngine {
    store: DocumentStore,
    reconciler: Reconciler,
    validation: ValidationOptions,
}

impl fmt::Debug for DiagramEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagramEngine")
            .field("store", &self.store)
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}

impl DiagramEngine {
    pub fn new(renderer: Arc<dyn Renderer>, validation: ValidationOptions) -> Self {
        Self {
            store: DocumentStore::default(),
            reconciler: Reconciler::new(renderer),
            validation,
        }
    }

    pub fn document(&self) -> &Document {
        self.store.current()
    }

    pub fn validation(&self) -> ValidationOptions {
        self.validation
    }

    /// Full regeneration from a model-produced fragment.
    pub fn display(&mut self, xml: &str) -> Result<DisplayOutcome, EngineError> {
        let fragment = normalize(xml);
        let report = validate(fragment.as_str(), self.validation)?;
        let outcome = self.reconciler.apply(&mut self.store, &fragment)?;
        Ok(DisplayOutcome { rev: outcome.rev(), changed: outcome.changed(), report })
    }

    /// Applies `edits` to the authoritative text. On any failure the document is unchanged.
    pub fn edit(&mut self, edits: &[EditOperation]) -> Result<EditOutcome, EngineError> {
        let base = self.store.current().shared_xml();
        let patched = apply_edits(&base, edits)?;
        debug!(applied = patched.applied, len = patched.text.len(), "edits applied to working copy");

        let fragment = normalize(&patched.text);
        let report = validate(fragment.as_str(), self.validation)?;
        let outcome = self.reconciler.apply(&mut self.store, &fragment)?;
        Ok(EditOutcome { rev: outcome.rev(), applied: patched.applied, report })
    }

    /// Loads a preview of a still-streaming `display_diagram` input. Returns whether anything
    /// was shown.
    pub fn preview(&self, partial_xml: &str) -> bool {
        match normalize_streaming(partial_xml) {
            Some(root) => self.reconciler.preview(&self.store, &Normalized::Root(root)),
            None => false,
        }
    }

    /// Puts the authoritative document back into the renderer.
    pub fn restore(&self) {
        self.reconciler.restore(&self.store);
    }

    /// Takes over text exported from the renderer (user edits made outside the tools).
    pub fn adopt(&mut self, xml: impl Into<Arc<str>>) -> Option<u64> {
        self.store.adopt(xml)
    }

    /// Replaces the document with a snapshot and shows it.
    pub fn load_snapshot(&mut self, xml: impl Into<Arc<str>>) -> u64 {
        let rev = self.store.replace(xml);
        self.reconciler.restore(&self.store);
        rev
    }

    /// Back to the empty document.
    pub fn reset(&mut self) -> u64 {
        let rev = self.store.reset();
        self.reconciler.restore(&self.store);
        rev
    }
}
