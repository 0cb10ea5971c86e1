// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Output record handed to the persistence boundary

use crate::{IngestError, Result};
use plan_lite_model::{FloorSummary, GeometrySerializer, LayerInfo, Metadata, ParsedGeometry};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Serializable import result
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImportRecord {
    /// Number of detected floors
    pub floors: usize,
    /// Number of detected units
    pub units: usize,
    pub detected_floors: Vec<FloorSummary>,
    pub detected_units: Vec<String>,
    pub layer_metadata: Vec<LayerInfo>,
    /// Graph in the `{levels, spaces, relationships}` export shape
    pub graph: Value,
    pub metadata: Metadata,
}

impl ImportRecord {
    pub fn from_parsed(parsed: &ParsedGeometry) -> Result<Self> {
        Ok(Self {
            floors: parsed.floors.len(),
            units: parsed.units.len(),
            detected_floors: parsed.floors.clone(),
            detected_units: parsed.units.clone(),
            layer_metadata: parsed.layers.clone(),
            graph: GeometrySerializer::to_value(&parsed.graph)?,
            metadata: parsed.metadata.clone(),
        })
    }

    /// Source format recorded in metadata
    pub fn source_format(&self) -> Option<&str> {
        self.metadata.get("source_format").and_then(Value::as_str)
    }
}

impl TryFrom<ParsedGeometry> for ImportRecord {
    type Error = IngestError;

    fn try_from(parsed: ParsedGeometry) -> Result<Self> {
        Self::from_parsed(&parsed)
    }
}
