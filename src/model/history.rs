// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::VecDeque;
use std::sync::Arc;

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// One diagram version the user can go back to: the raw `xmlsvg` export and the diagram XML
/// inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramVersion {
    svg: Arc<str>,
    xml: Arc<str>,
}

impl DiagramVersion {
    pub fn svg(&self) -> &str {
        &self.svg
    }

    pub fn xml(&self) -> &str {
        &self.xml
    }

    pub fn shared_xml(&self) -> Arc<str> {
        self.xml.clone()
    }
}

/// Bounded, oldest-first list of diagram versions captured when the user sends a message.
///
/// Consecutive captures of the same XML collapse into one entry; once `capacity` is reached the
/// oldest entry is evicted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionHistory {
    entries: VecDeque<DiagramVersion>,
    capacity: usize,
}

impl Default for VersionHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl VersionHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { entries: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)), capacity }
    }

    /// Returns whether a new entry was added.
    pub fn record(&mut self, svg: impl Into<Arc<str>>, xml: impl Into<Arc<str>>) -> bool {
        let xml = xml.into();
        if self.entries.back().is_some_and(|last| last.xml == xml) {
            return false;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(DiagramVersion { svg: svg.into(), xml });
        true
    }

    pub fn get(&self, index: usize) -> Option<&DiagramVersion> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagramVersion> + '_ {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
