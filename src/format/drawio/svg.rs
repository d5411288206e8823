// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Recovering diagram XML from renderer exports.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use quick_xml::events::Event;
use quick_xml::Reader;

const SVG_DATA_URL_PREFIX: &str = "data:image/svg+xml;base64,";

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("export data URL is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("export payload is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("SVG export carries no embedded diagram (missing `content` attribute)")]
    MissingContent,
    #[error("SVG export is malformed: {0}")]
    Svg(String),
}

/// Pulls the diagram XML out of an `xmlsvg` export.
///
/// Accepts a base64 SVG data URL, raw SVG text with the diagram in its `content` attribute, or
/// plain diagram XML (returned trimmed).
pub fn extract_diagram_xml(data: &str) -> Result<String, ExtractError> {
    let data = data.trim();
    if let Some(encoded) = data.strip_prefix(SVG_DATA_URL_PREFIX) {
        let svg = String::from_utf8(STANDARD.decode(encoded.trim())?)?;
        return content_attribute(&svg);
    }
    if data.starts_with("<svg") || (data.starts_with("<?xml") && data.contains("<svg")) {
        return content_attribute(data);
    }
    Ok(data.to_owned())
}

fn content_attribute(svg: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(svg);
    loop {
        match reader.read_event() {
            Ok(Event::Start(tag) | Event::Empty(tag)) if tag.name().as_ref() == b"svg" => {
                let attr = tag
                    .try_get_attribute("content")
                    .map_err(|err| ExtractError::Svg(err.to_string()))?
                    .ok_or(ExtractError::MissingContent)?;
                let content =
                    attr.unescape_value().map_err(|err| ExtractError::Svg(err.to_string()))?;
                return Ok(content.trim().to_owned());
            }
            Ok(Event::Eof) => return Err(ExtractError::MissingContent),
            Ok(_) => {}
            Err(err) => return Err(ExtractError::Svg(err.to_string())),
        }
    }
}
