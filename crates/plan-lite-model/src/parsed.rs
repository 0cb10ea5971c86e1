// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Uniform extractor output

use crate::{GeometryGraph, Metadata};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Source format of a parsed payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// 2D vector drawing
    Dxf,
    /// Building information model (STEP Part 21)
    Ifc,
    /// Declarative floorplan document
    Json,
}

impl SourceFormat {
    /// Tag stored under `metadata.source_format`
    pub fn tag(&self) -> &'static str {
        match self {
            SourceFormat::Dxf => "dxf",
            SourceFormat::Ifc => "ifc",
            SourceFormat::Json => "json",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A detected floor and the ids of the units it holds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloorSummary {
    pub name: String,
    pub unit_ids: Vec<String>,
}

impl FloorSummary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit_ids: Vec::new(),
        }
    }
}

/// Layer record, uniform across formats
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linetype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_count: Option<usize>,
}

impl LayerInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
            linetype: None,
            item_count: None,
        }
    }
}

/// Normalized output of any extractor
#[derive(Clone, Debug)]
pub struct ParsedGeometry {
    pub graph: GeometryGraph,
    pub floors: Vec<FloorSummary>,
    /// Space ids in discovery order
    pub units: Vec<String>,
    pub layers: Vec<LayerInfo>,
    pub metadata: Metadata,
}

impl ParsedGeometry {
    /// Assemble the uniform record
    ///
    /// `metadata` is extended with the source-format tag and the derived
    /// counts; extractor-specific keys already present are kept.
    pub fn assemble(
        format: SourceFormat,
        graph: GeometryGraph,
        floors: Vec<FloorSummary>,
        units: Vec<String>,
        layers: Vec<LayerInfo>,
        mut metadata: Metadata,
    ) -> Self {
        metadata.insert("source_format".into(), Value::from(format.tag()));
        metadata.insert("floor_count".into(), Value::from(floors.len()));
        metadata.insert("unit_count".into(), Value::from(units.len()));
        metadata.insert("layer_count".into(), Value::from(layers.len()));
        metadata.insert("level_count".into(), Value::from(graph.level_count()));
        metadata.insert(
            "relationship_count".into(),
            Value::from(graph.relationship_count()),
        );

        Self {
            graph,
            floors,
            units,
            layers,
            metadata,
        }
    }

    /// Source format recorded in metadata
    pub fn source_format(&self) -> Option<&str> {
        self.metadata.get("source_format").and_then(Value::as_str)
    }

    /// True when every unit id appears in exactly one floor bucket
    pub fn floors_partition_units(&self) -> bool {
        let mut seen: Vec<&str> = self
            .floors
            .iter()
            .flat_map(|f| f.unit_ids.iter().map(String::as_str))
            .collect();
        let mut units: Vec<&str> = self.units.iter().map(String::as_str).collect();
        seen.sort_unstable();
        units.sort_unstable();
        seen == units && {
            let before = seen.len();
            seen.dedup();
            seen.len() == before
        }
    }
}
