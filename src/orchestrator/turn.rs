// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::request::UploadError;
use crate::renderer::ExportError;

/// Monotonic tag for one submitted turn. Events tagged with an older id are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TurnId(u64);

impl TurnId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "turn-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingTool {
    /// `display_diagram`
    GenerateWhole,
    /// `edit_diagram`
    ApplyEdits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    #[default]
    Idle,
    Submitted,
    ToolPending(PendingTool),
    Settled,
}

#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("{turn} is no longer current")]
    Stale { turn: TurnId },
    #[error("message #{index} is not a user message")]
    NotUserMessage { index: usize },
    #[error("message #{index} is not an assistant message")]
    NotAssistantMessage { index: usize },
    #[error("no diagram snapshot was recorded for message #{index}")]
    MissingSnapshot { index: usize },
    #[error("no saved diagram version #{index}")]
    UnknownVersion { index: usize },
    #[error("cannot send an empty message")]
    EmptyMessage,
    #[error("could not read the current diagram: {0}")]
    Export(#[from] ExportError),
    #[error(transparent)]
    Upload(#[from] UploadError),
}

#[derive(Debug, Default)]
pub(crate) struct TurnTracker {
    issued: u64,
    current: Option<TurnId>,
    phase: TurnPhase,
}

impl TurnTracker {
    /// Starts a new turn, superseding whatever was in flight.
    pub(crate) fn begin(&mut self) -> TurnId {
        self.issued += 1;
        let turn = TurnId(self.issued);
        self.current = Some(turn);
        self.phase = TurnPhase::Submitted;
        turn
    }

    pub(crate) fn check(&self, turn: TurnId) -> Result<(), TurnError> {
        if self.current == Some(turn) && self.phase != TurnPhase::Settled {
            Ok(())
        } else {
            Err(TurnError::Stale { turn })
        }
    }

    pub(crate) fn enter(&mut self, phase: TurnPhase) {
        self.phase = phase;
    }

    pub(crate) fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Drops the current turn without settling it; later events for it are stale.
    pub(crate) fn abandon(&mut self) {
        self.current = None;
        self.phase = TurnPhase::Idle;
    }
}
