// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Deterministic draw.io documents for benchmarks (no RNG).

use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DagParams {
    pub layers: usize,
    pub nodes_per_layer: usize,
    pub fanout: usize,
    pub label_len: usize,
}

impl DagParams {
    pub const fn new(layers: usize, nodes_per_layer: usize, fanout: usize, label_len: usize) -> Self {
        Self { layers, nodes_per_layer, fanout, label_len }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Case {
    Small,
    MediumDense,
    LargeLongLabels,
}

impl Case {
    pub const ALL: [Case; 3] = [Case::Small, Case::MediumDense, Case::LargeLongLabels];

    pub const fn id(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::MediumDense => "medium_dense",
            Self::LargeLongLabels => "large_long_labels",
        }
    }

    pub const fn params(self) -> DagParams {
        match self {
            Self::Small => DagParams::new(6, 10, 2, 12),
            Self::MediumDense => DagParams::new(12, 20, 4, 12),
            Self::LargeLongLabels => DagParams::new(24, 35, 4, 64),
        }
    }
}

pub fn node_id(layer: usize, idx: usize) -> String {
    format!("l{layer:02}_n{idx:04}")
}

fn label(layer: usize, idx: usize, len: usize) -> String {
    let mut label = format!("Node {}", node_id(layer, idx));
    while label.len() < len {
        label.push('x');
    }
    label
}

/// The exact text of one vertex cell, usable as a search pattern.
pub fn vertex(layer: usize, idx: usize, label_len: usize) -> String {
    format!(
        r#"<mxCell id="{}" value="{}" style="rounded=1;whiteSpace=wrap;" vertex="1" parent="1"><mxGeometry x="{}" y="{}" width="120" height="60" as="geometry"/></mxCell>"#,
        node_id(layer, idx),
        label(layer, idx, label_len),
        idx * 160,
        layer * 120,
    )
}

/// Layered DAG: every node links to `fanout` nodes of the next layer.
pub fn root(params: DagParams) -> String {
    let mut out = String::from(r#"<root><mxCell id="0"/><mxCell id="1" parent="0"/>"#);
    for layer in 0..params.layers {
        for idx in 0..params.nodes_per_layer {
            out.push_str(&vertex(layer, idx, params.label_len));
        }
    }
    let fanout = params.fanout.min(params.nodes_per_layer);
    let mut edge = 0usize;
    for layer in 0..params.layers.saturating_sub(1) {
        for idx in 0..params.nodes_per_layer {
            for k in 0..fanout {
                let to = (idx + k) % params.nodes_per_layer;
                let _ = write!(
                    out,
                    r#"<mxCell id="e{edge:06}" edge="1" parent="1" source="{}" target="{}"><mxGeometry relative="1" as="geometry"/></mxCell>"#,
                    node_id(layer, idx),
                    node_id(layer + 1, to),
                );
                edge += 1;
            }
        }
    }
    out.push_str("</root>");
    out
}

pub fn document(case: Case) -> String {
    format!(
        r#"<mxfile><diagram name="Page-1" id="page-1"><mxGraphModel><root>{}</root></mxGraphModel></diagram></mxfile>"#,
        root(case.params()).trim_start_matches("<root>").trim_end_matches("</root>")
    )
}

pub fn checksum(text: &str) -> u64 {
    text.bytes().fold(0u64, |acc, byte| acc.wrapping_mul(131).wrapping_add(u64::from(byte)))
}
