// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model: the draw.io document, its cells, turn snapshots, saved versions and the
//! chat history.

pub mod cell;
pub mod conversation;
pub mod document;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod history;
pub mod ids;
pub mod snapshot;

pub use cell::{Cell, CellKind};
pub use conversation::{ChatMessage, Conversation, MessagePart, Role};
pub use document::{Document, CANVAS_CELL_ID, EMPTY_DOCUMENT, ROOT_CELL_ID};
pub use history::{DiagramVersion, VersionHistory, DEFAULT_HISTORY_CAPACITY};
pub use ids::{Id, IdError, SessionId, ToolCallId, MAX_ID_LEN};
pub use snapshot::{Snapshot, SnapshotCache};
