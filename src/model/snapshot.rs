// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::sync::Arc;

/// Immutable capture of the document text taken right before a user turn was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    turn_index: usize,
    xml: Arc<str>,
}

impl Snapshot {
    pub fn turn_index(&self) -> usize {
        self.turn_index
    }

    pub fn xml(&self) -> &str {
        &self.xml
    }

    pub fn shared_xml(&self) -> Arc<str> {
        self.xml.clone()
    }
}

/// Snapshots keyed by the position of the user message in the conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotCache {
    by_turn: BTreeMap<usize, Snapshot>,
}

impl SnapshotCache {
    pub fn record(&mut self, turn_index: usize, xml: impl Into<Arc<str>>) {
        self.by_turn.insert(turn_index, Snapshot { turn_index, xml: xml.into() });
    }

    pub fn get(&self, turn_index: usize) -> Option<&Snapshot> {
        self.by_turn.get(&turn_index)
    }

    /// Drops every snapshot recorded for a turn after `turn_index`; the snapshot at
    /// `turn_index` itself survives because the resent turn reuses it.
    pub fn prune_after(&mut self, turn_index: usize) -> usize {
        let pruned = self.by_turn.split_off(&(turn_index + 1));
        pruned.len()
    }

    pub fn clear(&mut self) {
        self.by_turn.clear();
    }

    pub fn len(&self) -> usize {
        self.by_turn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_turn.is_empty()
    }

    pub fn turn_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_turn.keys().copied()
    }
}
