// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};

use super::mode::TurnMode;
use crate::config::Config;

/// Which instruction text the model receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstructionProfile {
    Default,
    /// Stricter XML-safety and editing rules; always used when editing.
    Extended,
}

impl InstructionProfile {
    pub fn select(mode: TurnMode, model_id: Option<&str>, config: &Config) -> Self {
        if mode == TurnMode::Edit || config.wants_extended_profile(model_id) {
            Self::Extended
        } else {
            Self::Default
        }
    }

    pub fn instructions(self) -> String {
        self.text().to_owned()
    }

    pub fn text(self) -> &'static str {
        match self {
            Self::Default => DEFAULT_INSTRUCTIONS,
            Self::Extended => EXTENDED_INSTRUCTIONS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Extended => "extended",
        }
    }
}

const DEFAULT_INSTRUCTIONS: &str = include_str!("prompts/default.md");

/// Long enough to clear the prompt-cache minimum of the models that select it.
const EXTENDED_INSTRUCTIONS: &str = include_str!("prompts/extended.md");
