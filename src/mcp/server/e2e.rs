// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::*;

use crate::model::fixtures::{self, root_of, BOX_A, BOX_B};
use crate::model::EMPTY_DOCUMENT;
use crate::ops::EditOperation;
use crate::renderer::DrawioFileRenderer;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static TEMP_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn new_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().enable_all().build().expect("tokio runtime")
}

struct TempDir {
    path: PathBuf,
}

impl TempDir {
    fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
        let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut path = std::env::temp_dir();
        path.push(format!("diagramstack-e2e-{prefix}-{}-{nanos}-{counter}", std::process::id()));
        std::fs::create_dir_all(&path).expect("create temp dir");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

struct FileHarness {
    _tmp: TempDir,
    diagram: PathBuf,
}

impl FileHarness {
    fn new(prefix: &str) -> Self {
        let tmp = TempDir::new(prefix);
        let diagram = tmp.path().join("diagram.drawio");
        Self { _tmp: tmp, diagram }
    }

    fn server(&self) -> DiagramMcp {
        let renderer: Arc<dyn Renderer> = Arc::new(DrawioFileRenderer::new(&self.diagram));
        DiagramMcp::new(&Config::default(), renderer)
    }

    fn on_disk(&self) -> String {
        std::fs::read_to_string(&self.diagram).expect("read diagram file")
    }

    /// A person editing the file in the draw.io desktop app.
    fn edit_by_hand(&self, from: &str, to: &str) {
        let edited = self.on_disk().replace(from, to);
        std::fs::write(&self.diagram, edited).expect("write diagram file");
    }
}

fn refresh() -> Parameters<DiagramReadParams> {
    Parameters(DiagramReadParams { refresh: true, ..DiagramReadParams::default() })
}

fn edits(pairs: &[(&str, &str)]) -> Parameters<EditDiagramParams> {
    Parameters(EditDiagramParams {
        edits: pairs.iter().map(|(search, replace)| EditOperation::new(*search, *replace)).collect(),
    })
}

#[test]
fn e2e_agent_and_human_share_a_drawio_file() {
    let runtime = new_runtime();
    let harness = FileHarness::new("shared-file");
    let server = harness.server();

    // Agent draws the first version; the file follows.
    runtime
        .block_on(server.display_diagram(Parameters(DisplayDiagramParams { xml: root_of(&[BOX_A, BOX_B]) })))
        .expect("display_diagram");
    assert!(harness.on_disk().contains(r#"value="A""#));

    // Human renames a box in the editor.
    harness.edit_by_hand(r#"value="A""#, r#"value="Login""#);

    // Agent still patches against its last known document.
    let Err(err) =
        runtime.block_on(server.edit_diagram(edits(&[(r#"value="Login""#, r#"value="Sign in""#)])))
    else {
        panic!("agent has not seen the rename");
    };
    let data = err.data.expect("error data");
    assert!(data["document"].as_str().is_some_and(|xml| xml.contains(r#"value="A""#)));
    assert!(harness.on_disk().contains(r#"value="Login""#));

    // After a refresh the rename is part of the authoritative document.
    let Json(read) = runtime
        .block_on(server.diagram_read(refresh()))
        .expect("diagram.read");
    assert!(read.xml.contains(r#"value="Login""#));
    assert_eq!(read.mode, "edit");

    let Json(edited) = runtime
        .block_on(server.edit_diagram(edits(&[(r#"value="Login""#, r#"value="Sign in""#)])))
        .expect("edit_diagram");
    assert_eq!(edited.applied, 1);
    assert!(harness.on_disk().contains(r#"value="Sign in""#));
    assert!(harness.on_disk().contains(r#"value="B""#));

    runtime.block_on(server.diagram_clear()).expect("diagram.clear");
    assert_eq!(harness.on_disk(), EMPTY_DOCUMENT);
}

#[test]
fn e2e_missing_file_reads_as_an_empty_canvas() {
    let runtime = new_runtime();
    let harness = FileHarness::new("missing-file");
    let server = harness.server();

    let Json(read) = runtime
        .block_on(server.diagram_read(refresh()))
        .expect("diagram.read");
    assert_eq!(read.mode, "create");
    assert!(!harness.diagram.exists());
}

#[test]
fn e2e_existing_multi_page_file_is_patched_and_merged_in_place() {
    let runtime = new_runtime();
    let harness = FileHarness::new("existing-file");
    std::fs::write(&harness.diagram, fixtures::two_pages()).expect("seed diagram file");
    let server = harness.server();

    let Json(edited) = runtime
        .block_on(server.edit_diagram(edits(&[(r#"value="A""#, r#"value="Keep""#)])))
        .expect("edit the file the server was started on");
    assert_eq!(edited.applied, 1);
    let on_disk = harness.on_disk();
    assert!(on_disk.contains(r#"value="Keep""#));
    assert!(on_disk.contains(r#"name="Detail""#));

    runtime
        .block_on(server.display_diagram(Parameters(DisplayDiagramParams { xml: root_of(&[BOX_B]) })))
        .expect("display_diagram");
    let on_disk = harness.on_disk();
    assert!(on_disk.contains(r#"name="Overview""#));
    assert!(on_disk.contains(r#"id="p1""#));
    assert!(on_disk.contains(r#"name="Detail""#));
    assert!(!on_disk.contains(r#"value="Keep""#));
}
