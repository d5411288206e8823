// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Whether a cell is drawn as a shape, a connector, or neither (root, layers, groups).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Vertex,
    Edge,
    Structural,
}

/// A single `mxCell`, as read from the document text.
///
/// Attribute values are stored unescaped. `id`/`value` fall back to the enclosing
/// `object`/`UserObject` wrapper when the cell itself does not carry them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cell {
    pub id: Option<String>,
    pub parent: Option<String>,
    pub value: Option<String>,
    pub style: Option<String>,
    pub vertex: bool,
    pub edge: bool,
    pub source: Option<String>,
    pub target: Option<String>,
}

impl Cell {
    pub fn kind(&self) -> CellKind {
        match (self.vertex, self.edge) {
            (true, false) => CellKind::Vertex,
            (false, true) => CellKind::Edge,
            _ => CellKind::Structural,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref().filter(|parent| !parent.is_empty())
    }
}
