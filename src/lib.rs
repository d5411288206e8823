// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Diagramstack: conversational draw.io diagram engine.
//!
//! A model edits a live draw.io diagram either by producing a complete document
//! (`display_diagram`) or by literal search/replace patches against the current text
//! (`edit_diagram`). Fragments are normalized, structurally validated and reconciled into a
//! single authoritative [`model::Document`] before any renderer sees them.

pub mod config;
pub mod engine;
pub mod format;
pub mod mcp;
pub mod model;
pub mod ops;
pub mod orchestrator;
pub mod reconcile;
pub mod renderer;
pub mod validate;
