// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Mutex;

use tracing::debug;

use super::{ExportFormat, ExportReply, ExportRequest, Renderer};
use crate::model::EMPTY_DOCUMENT;

/// Headless renderer that keeps the loaded diagram in memory.
///
/// Answers `xmlsvg` exports with the plain XML it last loaded. While stalled, export replies are
/// parked until [`MemoryRenderer::set_stalled`] releases them.
#[derive(Debug)]
pub struct MemoryRenderer {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    xml: String,
    loads: u64,
    stalled: bool,
    parked: Vec<ExportReply>,
}

impl Default for MemoryRenderer {
    fn default() -> Self {
        Self::with_xml(EMPTY_DOCUMENT)
    }
}

impl MemoryRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_xml(xml: impl Into<String>) -> Self {
        let state = MemoryState { xml: xml.into(), ..MemoryState::default() };
        Self { state: Mutex::new(state) }
    }

    pub fn xml(&self) -> String {
        self.state.lock().expect("memory renderer lock poisoned").xml.clone()
    }

    /// How many times [`Renderer::load`] has been called.
    pub fn load_count(&self) -> u64 {
        self.state.lock().expect("memory renderer lock poisoned").loads
    }

    /// Simulates an editor that has not answered yet.
    pub fn set_stalled(&self, stalled: bool) {
        let mut state = self.state.lock().expect("memory renderer lock poisoned");
        state.stalled = stalled;
        if !stalled {
            let xml = state.xml.clone();
            for reply in state.parked.drain(..) {
                reply.complete(xml.clone());
            }
        }
    }
}

impl Renderer for MemoryRenderer {
    fn load(&self, xml: &str) {
        let mut state = self.state.lock().expect("memory renderer lock poisoned");
        state.xml = xml.to_owned();
        state.loads += 1;
    }

    fn request_export(&self, request: ExportRequest) {
        if request.format != ExportFormat::XmlSvg {
            debug!(format = request.format.as_str(), "memory renderer only exports xmlsvg");
            return;
        }
        let mut state = self.state.lock().expect("memory renderer lock poisoned");
        if state.stalled {
            state.parked.push(request.reply);
        } else {
            request.reply.complete(state.xml.clone());
        }
    }
}
