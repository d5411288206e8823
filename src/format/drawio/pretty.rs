// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::io::Cursor;

use quick_xml::events::Event;
use quick_xml::{Reader, Writer};

/// Re-indents XML with one element per line and a two-space indent.
///
/// Tags are re-emitted byte for byte, so attribute order and escaping survive. Input that does
/// not parse is returned unchanged.
pub fn format_xml(xml: &str) -> String {
    try_format(xml).unwrap_or_else(|| xml.to_owned())
}

fn try_format(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    loop {
        match reader.read_event().ok()? {
            Event::Eof => break,
            event => writer.write_event(event).ok()?,
        }
    }
    String::from_utf8(writer.into_inner().into_inner()).ok()
}
