// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use crate::orchestrator::{DisplayDiagramInput as DisplayDiagramParams, EditDiagramInput as EditDiagramParams};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DisplayDiagramResponse {
    pub rev: u64,
    /// False when the fragment equalled the last one applied and nothing was reloaded.
    pub changed: bool,
    pub cells: u64,
    pub pages: u64,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EditDiagramResponse {
    pub rev: u64,
    pub applied: u64,
    pub cells: u64,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct DiagramReadParams {
    /// Export the live diagram from the renderer first, picking up edits made outside the tools.
    #[serde(default)]
    pub refresh: bool,
    /// Also return the instruction text for the current mode and configured model.
    #[serde(default)]
    pub instructions: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DiagramReadResponse {
    pub rev: u64,
    /// `create` for an empty canvas, `edit` otherwise.
    pub mode: String,
    /// Instruction profile that applies in `mode` for the configured model.
    pub profile: String,
    pub xml: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DiagramClearResponse {
    pub rev: u64,
}
