// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::{Json, Parameters};
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler, ServiceExt};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::Config;
use crate::engine::{DiagramEngine, EngineError};
use crate::format::drawio::format_xml;
use crate::orchestrator::{detect_mode, InstructionProfile, TurnMode};
use crate::renderer::{ExportBridge, ExportError, Renderer};
use crate::validate::ValidationReport;

use super::types::*;

#[derive(Clone)]
pub struct DiagramMcp {
    state: Arc<Mutex<McpState>>,
    config: Arc<Config>,
    bridge: Arc<ExportBridge>,
    tool_router: ToolRouter<Self>,
}

#[derive(Debug)]
struct McpState {
    engine: DiagramEngine,
    /// Whether the engine has seen the renderer's document at least once.
    synced: bool,
}

#[tool_router]
impl DiagramMcp {
    pub fn new(config: &Config, renderer: Arc<dyn Renderer>) -> Self {
        let bridge = ExportBridge::new(renderer.clone(), config.export_timeout());
        Self {
            state: Arc::new(Mutex::new(McpState {
                engine: DiagramEngine::new(renderer, config.validation()),
                synced: false,
            })),
            config: Arc::new(config.clone()),
            bridge: Arc::new(bridge),
            tool_router: Self::tool_router(),
        }
    }

    pub async fn serve_stdio(self) -> Result<(), rmcp::RmcpError> {
        let service = self.serve((tokio::io::stdin(), tokio::io::stdout())).await?;
        service.waiting().await?;
        Ok(())
    }

    /// Display a complete diagram. Pass draw.io XML: a full `<mxfile>`, a `<root>` or a bare
    /// list of `<mxCell>` elements. Every mxCell must be a direct child of `<root>`.
    #[tool(name = "display_diagram")]
    async fn display_diagram(
        &self,
        params: Parameters<DisplayDiagramParams>,
    ) -> Result<Json<DisplayDiagramResponse>, ErrorData> {
        let DisplayDiagramParams { xml } = params.0;
        let mut state = self.state.lock().await;
        self.sync_from_renderer(&mut state).await?;
        let engine = &mut state.engine;
        let outcome = engine.display(&xml).map_err(|err| {
            engine.restore();
            map_engine_error(err)
        })?;
        info!(rev = outcome.rev, changed = outcome.changed, "mcp display_diagram");

        Ok(Json(DisplayDiagramResponse {
            rev: outcome.rev,
            changed: outcome.changed,
            cells: outcome.report.cells as u64,
            pages: outcome.report.pages as u64,
            warnings: warning_texts(&outcome.report),
        }))
    }

    /// Apply literal search/replace edits to the current diagram XML, in order. Copy search
    /// strings exactly from `diagram.read`; attribute order matters. All edits apply or none do.
    #[tool(name = "edit_diagram")]
    async fn edit_diagram(
        &self,
        params: Parameters<EditDiagramParams>,
    ) -> Result<Json<EditDiagramResponse>, ErrorData> {
        let EditDiagramParams { edits } = params.0;
        let mut state = self.state.lock().await;
        self.sync_from_renderer(&mut state).await?;
        let outcome = state.engine.edit(&edits).map_err(map_engine_error)?;
        info!(rev = outcome.rev, applied = outcome.applied, "mcp edit_diagram");

        Ok(Json(EditDiagramResponse {
            rev: outcome.rev,
            applied: outcome.applied as u64,
            cells: outcome.report.cells as u64,
            warnings: warning_texts(&outcome.report),
        }))
    }

    /// Read the current diagram XML with its revision and the instruction profile that applies;
    /// use before `edit_diagram` to copy exact search patterns.
    #[tool(name = "diagram.read")]
    async fn diagram_read(
        &self,
        params: Parameters<DiagramReadParams>,
    ) -> Result<Json<DiagramReadResponse>, ErrorData> {
        let mut state = self.state.lock().await;
        if params.0.refresh {
            state.synced = false;
        }
        self.sync_from_renderer(&mut state).await?;
        let document = state.engine.document();
        let mode = detect_mode(document.xml());
        let profile = self.profile_for(mode);

        Ok(Json(DiagramReadResponse {
            rev: document.rev(),
            mode: mode_label(mode).to_owned(),
            profile: profile.as_str().to_owned(),
            xml: document.xml().to_owned(),
            instructions: params.0.instructions.then(|| profile.instructions()),
        }))
    }

    /// Reset to an empty single-page diagram.
    #[tool(name = "diagram.clear")]
    async fn diagram_clear(&self) -> Result<Json<DiagramClearResponse>, ErrorData> {
        let mut state = self.state.lock().await;
        let rev = state.engine.reset();
        state.synced = true;
        info!(rev, "mcp diagram.clear");
        Ok(Json(DiagramClearResponse { rev }))
    }
}

impl DiagramMcp {
    fn profile_for(&self, mode: TurnMode) -> InstructionProfile {
        InstructionProfile::select(mode, self.config.model_id.as_deref(), &self.config)
    }

    /// Takes over the renderer's document the first time a tool touches it, so an existing
    /// `.drawio` file is patched and merged into rather than replaced.
    async fn sync_from_renderer(&self, state: &mut McpState) -> Result<(), ErrorData> {
        if state.synced {
            return Ok(());
        }
        let exported = self.bridge.fetch_xml().await.map_err(map_export_error)?;
        let current = state.engine.document().xml();
        if !exported.trim().is_empty() && exported != current {
            if let Some(rev) = state.engine.adopt(format_xml(&exported)) {
                info!(rev, "adopted diagram from the renderer");
            }
        }
        state.synced = true;
        Ok(())
    }
}

#[tool_handler]
impl ServerHandler for DiagramMcp {
    fn get_info(&self) -> ServerInfo {
        let profile = self.profile_for(TurnMode::Create);
        ServerInfo {
            instructions: Some(format!(
                "Diagramstack draw.io diagram server (tools: display_diagram, edit_diagram, \
                 diagram.read, diagram.clear). Once the canvas has content, call diagram.read with \
                 instructions=true for the editing rules.\n\n{}",
                profile.text()
            )),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// Error mapping and response helpers for MCP tool handlers.
include!("server/helpers.rs");

#[cfg(test)]
mod e2e;
