// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::{ExportFormat, ExportReply, ExportRequest, Renderer};
use crate::format::drawio::{extract_diagram_xml, ExtractError};

pub const DEFAULT_EXPORT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("another diagram export is already in flight")]
    Busy,
    #[error("diagram export timed out after {} ms", .after.as_millis())]
    Timeout { after: Duration },
    #[error("the renderer dropped the export request without answering")]
    Dropped,
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// An `xmlsvg` export and the diagram XML embedded in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlSvgExport {
    pub data: String,
    pub xml: String,
}

/// Request/response adapter over a callback-style renderer.
///
/// At most one export is outstanding at a time; every export is bounded by `timeout`, and the
/// slot is released when the export resolves, expires or is cancelled.
pub struct ExportBridge {
    renderer: Arc<dyn Renderer>,
    timeout: Duration,
    in_flight: AtomicBool,
}

impl fmt::Debug for ExportBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportBridge")
            .field("timeout", &self.timeout)
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

struct Slot<'a>(&'a AtomicBool);

impl<'a> Slot<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for Slot<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ExportBridge {
    pub fn new(renderer: Arc<dyn Renderer>, timeout: Duration) -> Self {
        Self { renderer, timeout, in_flight: AtomicBool::new(false) }
    }

    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn export(&self, format: ExportFormat) -> Result<String, ExportError> {
        let _slot = Slot::acquire(&self.in_flight).ok_or(ExportError::Busy)?;
        let (reply, rx) = ExportReply::channel();
        debug!(format = format.as_str(), "requesting diagram export");
        self.renderer.request_export(ExportRequest { format, reply });

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(data)) => Ok(data),
            Ok(Err(_)) => Err(ExportError::Dropped),
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "diagram export timed out");
                Err(ExportError::Timeout { after: self.timeout })
            }
        }
    }

    /// Exports as `xmlsvg` and returns the embedded diagram XML.
    pub async fn fetch_xml(&self) -> Result<String, ExportError> {
        Ok(self.fetch_export().await?.xml)
    }

    /// Exports as `xmlsvg`, keeping the raw export next to the diagram XML extracted from it.
    pub async fn fetch_export(&self) -> Result<XmlSvgExport, ExportError> {
        let data = self.export(ExportFormat::XmlSvg).await?;
        let xml = extract_diagram_xml(&data)?;
        Ok(XmlSvgExport { data, xml })
    }
}
