// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Runtime configuration: defaults, layered with environment variables, then CLI flags.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::DEFAULT_HISTORY_CAPACITY;
use crate::validate::{ReferenceCheck, ValidationOptions};

pub const ENV_MODEL: &str = "AI_MODEL";
pub const ENV_EXTENDED_MODELS: &str = "DIAGRAMSTACK_EXTENDED_MODELS";
pub const ENV_EXPORT_TIMEOUT_MS: &str = "DIAGRAMSTACK_EXPORT_TIMEOUT_MS";
pub const ENV_REFERENCE_CHECK: &str = "DIAGRAMSTACK_REFERENCE_CHECK";
pub const ENV_CACHED_RESPONSES: &str = "DIAGRAMSTACK_CACHED_RESPONSES";
pub const ENV_HISTORY_LIMIT: &str = "DIAGRAMSTACK_HISTORY_LIMIT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadLimits {
    pub max_files: usize,
    /// Decoded size limit per file.
    pub max_file_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self { max_files: 5, max_file_bytes: 2 * 1024 * 1024 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model the turn requests are addressed to.
    pub model_id: Option<String>,
    /// Substrings of model ids that always get the extended instruction profile.
    pub extended_profile_models: Vec<String>,
    pub export_timeout_ms: u64,
    pub reference_check: ReferenceCheck,
    /// Serve canned diagrams for well-known first prompts.
    pub cached_responses: bool,
    pub uploads: UploadLimits,
    pub max_tokens: u32,
    /// Saved diagram versions kept per session.
    pub history_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_id: None,
            extended_profile_models: vec!["claude-opus-4-5".to_owned(), "claude-haiku-4-5".to_owned()],
            export_timeout_ms: 10_000,
            reference_check: ReferenceCheck::default(),
            cached_responses: true,
            uploads: UploadLimits::default(),
            max_tokens: 8_000,
            history_limit: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value {value:?} for {name}: {reason}")]
pub struct ConfigError {
    pub name: &'static str,
    pub value: String,
    pub reason: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Layers the variables returned by `lookup` over the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(model) = lookup(ENV_MODEL).filter(|m| !m.trim().is_empty()) {
            config.model_id = Some(model.trim().to_owned());
        }
        if let Some(models) = lookup(ENV_EXTENDED_MODELS) {
            config.extended_profile_models = models
                .split(',')
                .map(str::trim)
                .filter(|pattern| !pattern.is_empty())
                .map(str::to_owned)
                .collect();
        }
        if let Some(raw) = lookup(ENV_EXPORT_TIMEOUT_MS) {
            config.export_timeout_ms = match raw.trim().parse::<u64>() {
                Ok(0) => return Err(invalid(ENV_EXPORT_TIMEOUT_MS, raw, "must be positive")),
                Ok(ms) => ms,
                Err(err) => return Err(invalid(ENV_EXPORT_TIMEOUT_MS, raw, err.to_string())),
            };
        }
        if let Some(raw) = lookup(ENV_REFERENCE_CHECK) {
            config.reference_check =
                raw.parse().map_err(|reason| invalid(ENV_REFERENCE_CHECK, raw.clone(), reason))?;
        }
        if let Some(raw) = lookup(ENV_CACHED_RESPONSES) {
            config.cached_responses = parse_bool(&raw)
                .ok_or_else(|| invalid(ENV_CACHED_RESPONSES, raw.clone(), "expected a boolean"))?;
        }
        if let Some(raw) = lookup(ENV_HISTORY_LIMIT) {
            config.history_limit = match raw.trim().parse::<usize>() {
                Ok(0) => return Err(invalid(ENV_HISTORY_LIMIT, raw, "must be positive")),
                Ok(limit) => limit,
                Err(err) => return Err(invalid(ENV_HISTORY_LIMIT, raw, err.to_string())),
            };
        }

        Ok(config)
    }

    pub fn export_timeout(&self) -> Duration {
        Duration::from_millis(self.export_timeout_ms)
    }

    pub fn validation(&self) -> ValidationOptions {
        ValidationOptions { reference_check: self.reference_check }
    }

    pub fn wants_extended_profile(&self, model_id: Option<&str>) -> bool {
        model_id.is_some_and(|model| {
            self.extended_profile_models.iter().any(|pattern| model.contains(pattern.as_str()))
        })
    }
}

fn invalid(name: &'static str, value: String, reason: impl Into<String>) -> ConfigError {
    ConfigError { name, value, reason: reason.into() }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
