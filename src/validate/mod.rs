// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Diagramstack-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Diagramstack and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Structural validation of candidate diagram XML.
//!
//! Checks run in a fixed order and stop at the first failure:
//! syntax, cell placement, ids, the `0`/`1` skeleton of each page, parents, then (depending on [`ReferenceCheck`]) references.
//! Error text is written to be handed back to the model verbatim.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::format::drawio::{scan, CellRecord, Placement, Scan, SyntaxError};
use crate::model::{CellKind, CANVAS_CELL_ID, ROOT_CELL_ID};

/// How dangling `parent`/`source`/`target` references are treated.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceCheck {
    Off,
    #[default]
    Warn,
    Strict,
}

impl FromStr for ReferenceCheck {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "warn" => Ok(Self::Warn),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown reference check {other:?} (expected off, warn or strict)")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    pub reference_check: ReferenceCheck,
}

impl ValidationOptions {
    pub fn strict() -> Self {
        Self { reference_check: ReferenceCheck::Strict }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub cells: usize,
    pub pages: usize,
    pub warnings: Vec<Violation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Source,
    Target,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Source => "source",
            Self::Target => "target",
        })
    }
}

/// A broken structural rule, naming the offending element.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("no mxCell elements found; the diagram must contain <mxCell> elements inside <root>")]
    NoCells,
    #[error(
        "cell {} is nested inside cell {}; every mxCell must be a direct child of <root>. \
         Express grouping with the parent attribute (parent=\"{}\") instead of nesting elements",
        display_id(.id),
        display_id(.ancestor_id),
        .ancestor_id.as_deref().unwrap_or("<container id>")
    )]
    NestedCell { id: Option<String>, ancestor_id: Option<String> },
    #[error("cell {} sits inside <{container}> instead of <root>", display_id(.id))]
    StrayCell { id: Option<String>, container: String },
    #[error("cell #{} has no id attribute; every mxCell needs a unique id", .index + 1)]
    MissingId { index: usize },
    #[error("duplicate cell id \"{id}\"; cell ids must be unique")]
    DuplicateId { id: String },
    #[error(
        "page {} has no root cell; start <root> with <mxCell id=\"0\"/>",
        .page + 1
    )]
    MissingRootCell { page: usize },
    #[error(
        "page {} has no canvas cell; add <mxCell id=\"1\" parent=\"0\"/> right after the root cell",
        .page + 1
    )]
    MissingCanvas { page: usize },
    #[error("canvas cell \"1\" must have parent=\"0\", found parent=\"{parent}\"")]
    CanvasParent { parent: String },
    #[error("cell \"{id}\" has no parent attribute; every cell except id=\"0\" needs parent=\"1\" or a container id")]
    MissingParent { id: String },
    #[error("cell \"{id}\" is marked both vertex=\"1\" and edge=\"1\"; use exactly one")]
    ConflictingKind { id: String },
    #[error("cell \"{id}\" refers to parent \"{parent}\", which does not exist")]
    DanglingParent { id: String, parent: String },
    #[error("edge \"{id}\" refers to {endpoint} \"{reference}\", which does not exist")]
    DanglingEndpoint { id: String, endpoint: Endpoint, reference: String },
    /// Only ever reported as a warning.
    #[error("cell \"{id}\" has {count} mxGeometry children (expected exactly one)")]
    GeometryCount { id: String, count: usize },
}

fn display_id(id: &Option<String>) -> String {
    match id {
        Some(id) => format!("\"{id}\""),
        None => "(without id)".to_owned(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error(
        "The diagram XML is malformed ({0}). Close every tag, quote every attribute value and \
         escape < > & \" inside attribute values."
    )]
    FragmentMalformed(#[from] SyntaxError),
    #[error("The diagram structure is invalid: {0}")]
    StructuralViolation(#[from] Violation),
}

pub fn validate(xml: &str, options: ValidationOptions) -> Result<ValidationReport, ValidationError> {
    let scan = scan(xml)?;
    check_scan(&scan, options).map_err(ValidationError::from)
}

pub fn check_scan(scan: &Scan, options: ValidationOptions) -> Result<ValidationReport, Violation> {
    if scan.cells.is_empty() {
        return Err(Violation::NoCells);
    }
    check_placement(&scan.cells)?;
    check_ids(&scan.cells)?;
    check_skeleton(&scan.cells)?;
    check_parents(&scan.cells)?;

    let mut warnings = Vec::new();
    if options.reference_check != ReferenceCheck::Off {
        for violation in dangling_references(&scan.cells) {
            match options.reference_check {
                ReferenceCheck::Strict => return Err(violation),
                _ => warnings.push(violation),
            }
        }
    }
    warnings.extend(geometry_warnings(&scan.cells));

    Ok(ValidationReport {
        cells: scan.cells.len(),
        pages: scan.roots.len().max(1),
        warnings,
    })
}

fn check_placement(cells: &[CellRecord]) -> Result<(), Violation> {
    let nested = cells.iter().find_map(|record| match &record.placement {
        Placement::Nested { ancestor_id } => Some((record, ancestor_id)),
        _ => None,
    });
    if let Some((record, ancestor_id)) = nested {
        return Err(Violation::NestedCell {
            id: record.cell.id.clone(),
            ancestor_id: ancestor_id.clone(),
        });
    }
    for record in cells {
        if let Placement::Stray { container } = &record.placement {
            return Err(Violation::StrayCell {
                id: record.cell.id.clone(),
                container: container.clone(),
            });
        }
    }
    Ok(())
}

fn check_ids(cells: &[CellRecord]) -> Result<(), Violation> {
    let mut seen: HashSet<(usize, &str)> = HashSet::with_capacity(cells.len());
    for (index, record) in cells.iter().enumerate() {
        let Some(id) = record.cell.id().filter(|id| !id.is_empty()) else {
            return Err(Violation::MissingId { index });
        };
        if !seen.insert((record.page, id)) {
            return Err(Violation::DuplicateId { id: id.to_owned() });
        }
    }
    Ok(())
}

/// Every page needs the `0` root cell and the `1` canvas beneath it.
fn check_skeleton(cells: &[CellRecord]) -> Result<(), Violation> {
    let mut pages: Vec<usize> = cells.iter().map(|record| record.page).collect();
    pages.dedup();
    for page in pages {
        let mut on_page = cells.iter().filter(|record| record.page == page);
        if !on_page.clone().any(|record| record.cell.id() == Some(ROOT_CELL_ID)) {
            return Err(Violation::MissingRootCell { page });
        }
        let Some(canvas) = on_page.find(|record| record.cell.id() == Some(CANVAS_CELL_ID)) else {
            return Err(Violation::MissingCanvas { page });
        };
        match canvas.cell.parent() {
            Some(ROOT_CELL_ID) => {}
            other => {
                return Err(Violation::CanvasParent { parent: other.unwrap_or_default().to_owned() })
            }
        }
    }
    Ok(())
}

fn check_parents(cells: &[CellRecord]) -> Result<(), Violation> {
    for record in cells {
        let id = record.cell.id().unwrap_or_default();
        if id != ROOT_CELL_ID && record.cell.parent().is_none() {
            return Err(Violation::MissingParent { id: id.to_owned() });
        }
        if record.cell.vertex && record.cell.edge {
            return Err(Violation::ConflictingKind { id: id.to_owned() });
        }
    }
    Ok(())
}

fn dangling_references(cells: &[CellRecord]) -> Vec<Violation> {
    let mut pages: HashMap<usize, HashSet<&str>> = HashMap::new();
    for record in cells {
        if let Some(id) = record.cell.id() {
            pages.entry(record.page).or_default().insert(id);
        }
    }

    let none = HashSet::new();
    let mut found = Vec::new();
    for record in cells {
        let ids = pages.get(&record.page).unwrap_or(&none);
        let id = record.cell.id().unwrap_or_default();
        if let Some(parent) = record.cell.parent().filter(|parent| !ids.contains(parent)) {
            found.push(Violation::DanglingParent { id: id.to_owned(), parent: parent.to_owned() });
        }
        if record.cell.kind() != CellKind::Edge {
            continue;
        }
        let endpoints = [
            (Endpoint::Source, record.cell.source.as_deref()),
            (Endpoint::Target, record.cell.target.as_deref()),
        ];
        for (endpoint, reference) in endpoints {
            if let Some(reference) = reference.filter(|r| !r.is_empty() && !ids.contains(r)) {
                found.push(Violation::DanglingEndpoint {
                    id: id.to_owned(),
                    endpoint,
                    reference: reference.to_owned(),
                });
            }
        }
    }
    found
}

fn geometry_warnings(cells: &[CellRecord]) -> impl Iterator<Item = Violation> + '_ {
    cells
        .iter()
        .filter(|record| record.cell.kind() != CellKind::Structural && record.geometry_count != 1)
        .map(|record| Violation::GeometryCount {
            id: record.cell.id().unwrap_or_default().to_owned(),
            count: record.geometry_count,
        })
}
