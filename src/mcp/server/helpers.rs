// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

fn map_engine_error(err: EngineError) -> ErrorData {
    use crate::ops::PatchError;
    use crate::reconcile::ReconcileError;
    use crate::validate::ValidationError;

    warn!(error = %err, "mcp tool call rejected");
    let message = err.to_string();
    match err {
        EngineError::Validation(ValidationError::FragmentMalformed(syntax)) => ErrorData::invalid_params(
            message,
            Some(serde_json::json!({ "position": syntax.position, "reason": syntax.message })),
        ),
        EngineError::Validation(ValidationError::StructuralViolation(violation)) => {
            ErrorData::invalid_params(
                message,
                Some(serde_json::json!({ "violation": violation.to_string() })),
            )
        }
        EngineError::Patch(PatchError::EmptySearch { index }) => {
            ErrorData::invalid_params(message, Some(serde_json::json!({ "index": index })))
        }
        EngineError::Patch(PatchError::NotFound { index, search, document }) => {
            ErrorData::resource_not_found(
                message,
                Some(serde_json::json!({
                    "index": index,
                    "search": search,
                    "document": document.as_ref(),
                    "retry_tool": "diagram.read",
                })),
            )
        }
        EngineError::Reconcile(ReconcileError::Unrecognized) => ErrorData::invalid_params(message, None),
        EngineError::Reconcile(ReconcileError::Syntax(syntax)) => ErrorData::internal_error(
            message,
            Some(serde_json::json!({ "position": syntax.position })),
        ),
    }
}

fn map_export_error(err: ExportError) -> ErrorData {
    warn!(error = %err, "renderer export failed");
    match err {
        ExportError::Busy => ErrorData::invalid_request(err.to_string(), None),
        ExportError::Timeout { after } => ErrorData::internal_error(
            err.to_string(),
            Some(serde_json::json!({ "timeout_ms": after.as_millis() as u64 })),
        ),
        ExportError::Dropped | ExportError::Extract(_) => ErrorData::internal_error(err.to_string(), None),
    }
}

fn warning_texts(report: &ValidationReport) -> Vec<String> {
    report.warnings.iter().map(ToString::to_string).collect()
}

fn mode_label(mode: crate::orchestrator::TurnMode) -> &'static str {
    match mode {
        crate::orchestrator::TurnMode::Create => "create",
        crate::orchestrator::TurnMode::Edit => "edit",
    }
}
