// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};

use crate::format::drawio::scan;
use crate::model::{CANVAS_CELL_ID, ROOT_CELL_ID};

/// Whether the model starts from scratch or modifies an existing diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnMode {
    Create,
    Edit,
}

/// True for blank text and for documents holding nothing but the root and canvas cells.
pub fn is_minimal(xml: &str) -> bool {
    if xml.trim().is_empty() {
        return true;
    }
    match scan(xml) {
        Ok(found) => found.ids().all(|id| id == ROOT_CELL_ID || id == CANVAS_CELL_ID),
        Err(_) => false,
    }
}

pub fn detect_mode(xml: &str) -> TurnMode {
    if is_minimal(xml) {
        TurnMode::Create
    } else {
        TurnMode::Edit
    }
}
