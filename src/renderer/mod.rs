// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The diagram editor seen from the engine: a black box that loads XML and answers export
//! requests asynchronously.

mod bridge;
mod file;
mod memory;

pub use bridge::{ExportBridge, ExportError, XmlSvgExport, DEFAULT_EXPORT_TIMEOUT};
pub use file::DrawioFileRenderer;
pub use memory::MemoryRenderer;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// SVG with the diagram XML embedded in its `content` attribute.
    #[default]
    XmlSvg,
    Png,
    Svg,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::XmlSvg => "xmlsvg",
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}

/// Answers one export request. Dropping it without calling [`ExportReply::complete`] resolves
/// the waiting side with [`ExportError::Dropped`].
#[derive(Debug)]
pub struct ExportReply {
    tx: oneshot::Sender<String>,
}

impl ExportReply {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<String>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Delivers the exported data. A reply that arrives after its request timed out is ignored.
    pub fn complete(self, data: impl Into<String>) {
        let _ = self.tx.send(data.into());
    }
}

#[derive(Debug)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub reply: ExportReply,
}

pub trait Renderer: Send + Sync {
    /// Replaces what the editor shows. Fire-and-forget.
    fn load(&self, xml: &str);

    /// Starts an export; the answer goes through `request.reply`.
    fn request_export(&self, request: ExportRequest);
}
