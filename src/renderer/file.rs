// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use super::{ExportFormat, ExportReply, ExportRequest, Renderer};
use crate::model::EMPTY_DOCUMENT;

/// Renderer backed by a `.drawio` file that draw.io desktop can open and edit.
///
/// `load` replaces the file atomically; exports read it back. A missing file exports as the
/// empty document.
#[derive(Debug, Clone)]
pub struct DrawioFileRenderer {
    path: PathBuf,
}

impl DrawioFileRenderer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Renderer for DrawioFileRenderer {
    fn load(&self, xml: &str) {
        match write_atomic(&self.path, xml.as_bytes()) {
            Ok(()) => debug!(path = %self.path.display(), len = xml.len(), "diagram written"),
            Err(err) => warn!(path = %self.path.display(), error = %err, "failed to write diagram"),
        }
    }

    fn request_export(&self, request: ExportRequest) {
        if request.format != ExportFormat::XmlSvg {
            debug!(format = request.format.as_str(), "file renderer only exports xmlsvg");
            return;
        }
        let path = self.path.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let read = tokio::fs::read_to_string(&path).await;
                    answer(&path, read, request.reply);
                });
            }
            Err(_) => {
                let read = fs::read_to_string(&path);
                answer(&path, read, request.reply);
            }
        }
    }
}

fn answer(path: &Path, read: io::Result<String>, reply: ExportReply) {
    match read {
        Ok(xml) => reply.complete(xml),
        Err(err) if err.kind() == io::ErrorKind::NotFound => reply.complete(EMPTY_DOCUMENT),
        Err(err) => warn!(path = %path.display(), error = %err, "failed to read diagram"),
    }
}

fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other("path has no file name"))?;
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
    let tmp_path = parent.join(format!(".diagramstack.tmp.{}.{nanos}", file_name.to_string_lossy()));

    let mut file = fs::OpenOptions::new().write(true).create_new(true).open(&tmp_path)?;
    if let Err(err) = file.write_all(contents) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }
    drop(file);

    fs::rename(&tmp_path, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp_path);
    })
}
