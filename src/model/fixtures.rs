// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Hand-written draw.io documents shared by unit tests.

pub(crate) const BOX_A: &str =
    r#"<mxCell id="a" value="A" style="rounded=1;" vertex="1" parent="1"><mxGeometry x="40" y="40" width="120" height="60" as="geometry"/></mxCell>"#;

pub(crate) const BOX_B: &str =
    r#"<mxCell id="b" value="B" style="rounded=1;" vertex="1" parent="1"><mxGeometry x="240" y="40" width="120" height="60" as="geometry"/></mxCell>"#;

pub(crate) const EDGE_AB: &str =
    r#"<mxCell id="e1" style="endArrow=classic;" edge="1" parent="1" source="a" target="b"><mxGeometry relative="1" as="geometry"/></mxCell>"#;

const SKELETON: &str = r#"<mxCell id="0"/><mxCell id="1" parent="0"/>"#;

pub(crate) fn root_of(cells: &[&str]) -> String {
    let mut out = String::from("<root>");
    out.push_str(SKELETON);
    for cell in cells {
        out.push_str(cell);
    }
    out.push_str("</root>");
    out
}

pub(crate) fn document_of(cells: &[&str]) -> String {
    format!(
        r#"<mxfile><diagram name="Page-1" id="page-1"><mxGraphModel><root>{SKELETON}{}</root></mxGraphModel></diagram></mxfile>"#,
        cells.concat()
    )
}

/// Two boxes joined by one edge.
pub(crate) fn two_boxes() -> String {
    document_of(&[BOX_A, BOX_B, EDGE_AB])
}

/// Two pages; only the first one is touched by root merges.
pub(crate) fn two_pages() -> String {
    format!(
        r#"<mxfile host="app"><diagram name="Overview" id="p1"><mxGraphModel dx="800"><root>{SKELETON}{BOX_A}</root></mxGraphModel></diagram><diagram name="Detail" id="p2"><mxGraphModel><root>{SKELETON}{BOX_B}</root></mxGraphModel></diagram></mxfile>"#
    )
}
