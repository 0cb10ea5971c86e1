// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plain export and re-hydration of a [`GeometryGraph`]
//!
//! The exported shape is `{ "levels": [...], "spaces": [...],
//! "relationships": [...] }` with every member a plain JSON object, so the
//! record can cross any persistence boundary that accepts JSON.

use crate::{GeometryGraph, GraphBuilder, Level, Relationship, SerializeError, Space};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize)]
struct GraphView<'a> {
    levels: &'a [Level],
    spaces: &'a [Space],
    relationships: &'a [Relationship],
}

/// Owned graph document, as produced by [`GeometrySerializer::to_value`]
#[derive(Debug, Default, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub levels: Vec<Level>,
    #[serde(default)]
    pub spaces: Vec<Space>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl GraphDocument {
    /// Populate a builder with every member of the document
    pub fn into_builder(self) -> Result<GraphBuilder, SerializeError> {
        let mut builder = GraphBuilder::new();
        for level in self.levels {
            builder.add_level(level)?;
        }
        for space in self.spaces {
            builder.add_space(space)?;
        }
        for rel in self.relationships {
            builder.add_relationship(rel);
        }
        Ok(builder)
    }
}

/// Graph export / import
pub struct GeometrySerializer;

impl GeometrySerializer {
    /// Export the graph as a plain JSON value
    pub fn to_value(graph: &GeometryGraph) -> Result<Value, SerializeError> {
        let view = GraphView {
            levels: graph.levels(),
            spaces: graph.spaces(),
            relationships: graph.relationships(),
        };
        Ok(serde_json::to_value(view)?)
    }

    /// Export the graph as a JSON string
    pub fn to_json_string(graph: &GeometryGraph) -> Result<String, SerializeError> {
        let view = GraphView {
            levels: graph.levels(),
            spaces: graph.spaces(),
            relationships: graph.relationships(),
        };
        Ok(serde_json::to_string(&view)?)
    }

    /// Re-hydrate a graph from an exported value, re-validating it
    pub fn from_value(value: Value) -> Result<GeometryGraph, SerializeError> {
        let document: GraphDocument = serde_json::from_value(value)?;
        Ok(document.into_builder()?.build()?)
    }

    /// Re-hydrate a graph from a JSON string
    pub fn from_json_str(json: &str) -> Result<GeometryGraph, SerializeError> {
        let document: GraphDocument = serde_json::from_str(json)?;
        Ok(document.into_builder()?.build()?)
    }
}
