// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Format extractors
//!
//! Each extractor turns one payload into a validated [`GeometryGraph`] plus
//! the uniform [`ParsedGeometry`] summaries. The detector picks exactly one
//! [`SourceExtractor`] variant per upload.

mod dxf;
mod ifc;
mod json;

pub use dxf::DxfExtractor;
pub use ifc::IfcExtractor;
pub use json::JsonFloorplanExtractor;

use crate::Result;
use plan_lite_model::{FloorSummary, GeometryGraph, ParsedGeometry, SourceFormat};

/// Capability shared by every extractor
pub trait GeometryExtractor: Send + Sync {
    /// Format this extractor consumes
    fn format(&self) -> SourceFormat;

    /// Parse `payload` into a validated graph and its summaries
    fn extract(&self, payload: &[u8]) -> Result<ParsedGeometry>;
}

/// The extractor selected for one upload
pub enum SourceExtractor {
    /// 2D vector drawing
    Vector(DxfExtractor),
    /// Building information model
    Bim(IfcExtractor),
    /// Declarative floorplan document
    Declarative(JsonFloorplanExtractor),
}

impl GeometryExtractor for SourceExtractor {
    fn format(&self) -> SourceFormat {
        match self {
            SourceExtractor::Vector(e) => e.format(),
            SourceExtractor::Bim(e) => e.format(),
            SourceExtractor::Declarative(e) => e.format(),
        }
    }

    fn extract(&self, payload: &[u8]) -> Result<ParsedGeometry> {
        match self {
            SourceExtractor::Vector(e) => e.extract(payload),
            SourceExtractor::Bim(e) => e.extract(payload),
            SourceExtractor::Declarative(e) => e.extract(payload),
        }
    }
}

/// One floor per level, holding the level's spaces in insertion order
pub(crate) fn summarize_floors(graph: &GeometryGraph) -> Vec<FloorSummary> {
    graph
        .levels()
        .iter()
        .map(|level| FloorSummary {
            name: level.name.clone(),
            unit_ids: graph
                .spaces_on_level(&level.id)
                .map(|space| space.id.clone())
                .collect(),
        })
        .collect()
}

/// Space ids in insertion order
pub(crate) fn unit_ids(graph: &GeometryGraph) -> Vec<String> {
    graph.spaces().iter().map(|space| space.id.clone()).collect()
}
