// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Diagramstack CLI entrypoint.
//!
//! By default this serves MCP over streamable HTTP at `http://127.0.0.1:<port>/mcp` until
//! interrupted. Use `--mcp` to serve over stdio instead (intended for tool integrations).

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use rmcp::transport::{
    streamable_http_server::session::local::LocalSessionManager, StreamableHttpServerConfig,
    StreamableHttpService,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use diagramstack::config::Config;
use diagramstack::mcp::DiagramMcp;
use diagramstack::renderer::{DrawioFileRenderer, MemoryRenderer, Renderer};
use diagramstack::validate::ReferenceCheck;

const DEFAULT_MCP_HTTP_PORT: u16 = 27436;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [<diagram.drawio>] [--model <id>] [--strict-refs] [--mcp-http-port <port>]\n  {program} [--diagram <path>] [--model <id>] [--strict-refs] --mcp\n\nServes MCP over streamable HTTP at `http://127.0.0.1:<port>/mcp` by default.\n--mcp-http-port selects the port (0 = ephemeral; default {DEFAULT_MCP_HTTP_PORT}).\n--mcp serves over stdio instead.\n\nWith a diagram path the file is kept in sync with every change; without one the diagram lives in memory.\n--strict-refs rejects edges and parents that point at missing cells."
    );
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct CliOptions {
    mcp: bool,
    diagram: Option<String>,
    mcp_http_port: Option<u16>,
    model: Option<String>,
    strict_refs: bool,
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliOptions, ()> {
    let mut options = CliOptions::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--mcp" => {
                if options.mcp {
                    return Err(());
                }
                options.mcp = true;
            }
            "--strict-refs" => {
                if options.strict_refs {
                    return Err(());
                }
                options.strict_refs = true;
            }
            "--diagram" => {
                if options.diagram.is_some() {
                    return Err(());
                }
                options.diagram = Some(args.next().ok_or(())?);
            }
            "--model" => {
                if options.model.is_some() {
                    return Err(());
                }
                let model = args.next().filter(|model| !model.trim().is_empty()).ok_or(())?;
                options.model = Some(model);
            }
            "--mcp-http-port" => {
                if options.mcp_http_port.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                let port: u16 = raw.parse().map_err(|_| ())?;
                options.mcp_http_port = Some(port);
            }
            _ if arg.starts_with('-') => return Err(()),
            _ => {
                if options.diagram.is_some() {
                    return Err(());
                }
                options.diagram = Some(arg);
            }
        }
    }

    if options.mcp && options.mcp_http_port.is_some() {
        return Err(());
    }

    Ok(options)
}

fn apply_options(config: &mut Config, options: &CliOptions) {
    if let Some(model) = &options.model {
        config.model_id = Some(model.clone());
    }
    if options.strict_refs {
        config.reference_check = ReferenceCheck::Strict;
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("diagramstack=info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() {
    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "diagramstack".to_owned());

    let options = match parse_options(args) {
        Ok(options) => options,
        Err(()) => {
            print_usage(&program);
            std::process::exit(2);
        }
    };

    init_tracing();
    if let Err(err) = run(options) {
        error!("{err:#}");
        eprintln!("diagramstack: {err:#}");
        std::process::exit(1);
    }
}

fn run(options: CliOptions) -> anyhow::Result<()> {
    let mut config = Config::from_env().context("invalid environment configuration")?;
    apply_options(&mut config, &options);
    info!(
        model = config.model_id.as_deref().unwrap_or("<unset>"),
        reference_check = ?config.reference_check,
        export_timeout_ms = config.export_timeout_ms,
        "configuration loaded"
    );

    let renderer: Arc<dyn Renderer> = match &options.diagram {
        Some(path) => {
            info!(path = %path, "syncing diagram file");
            Arc::new(DrawioFileRenderer::new(path))
        }
        None => Arc::new(MemoryRenderer::new()),
    };
    let mcp = DiagramMcp::new(&config, renderer);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the tokio runtime")?;

    if options.mcp {
        runtime.block_on(mcp.serve_stdio()).context("MCP stdio server failed")?;
        return Ok(());
    }

    let mcp_http_port = options.mcp_http_port.unwrap_or(DEFAULT_MCP_HTTP_PORT);
    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", mcp_http_port))
            .await
            .with_context(|| format!("cannot bind 127.0.0.1:{mcp_http_port}"))?;
        let local_addr = listener.local_addr().context("listener has no local address")?;

        let config = StreamableHttpServerConfig {
            stateful_mode: true,
            ..StreamableHttpServerConfig::default()
        };
        let shutdown_token = config.cancellation_token.clone();

        let session_manager = Arc::new(LocalSessionManager::default());
        let mcp_service = StreamableHttpService::new(move || Ok(mcp.clone()), session_manager, config);

        let router = Router::new().nest_service("/mcp", mcp_service);
        info!(%local_addr, "serving MCP at http://{local_addr}/mcp");

        let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(error = %err, "cannot listen for ctrl-c");
            }
            info!("shutting down");
            shutdown_token.cancel();
        });
        serve.await.context("MCP HTTP server error")?;
        Ok(())
    })
}
