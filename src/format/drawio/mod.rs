// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! draw.io (`mxfile`) document text: scanning, envelope repair, pretty-printing and export
//! extraction.

pub mod normalize;
pub mod pretty;
pub mod scan;
pub mod svg;

pub use normalize::{normalize, normalize_streaming, synthesize_envelope, Normalized};
pub use pretty::format_xml;
pub use scan::{check_syntax, scan, CellRecord, Placement, Scan, SyntaxError};
pub use svg::{extract_diagram_xml, ExtractError};
