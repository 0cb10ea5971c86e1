// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Declarative floorplan extraction
//!
//! A floorplan document declares its floors and units directly:
//!
//! ```json
//! {
//!   "layers": [
//!     { "name": "Plot", "type": "site", "metadata": { "zone": "R3" } },
//!     { "name": "Ground", "type": "floor", "units": [{ "name": "A1", "area": 42.5 }] }
//!   ],
//!   "floors": [
//!     { "name": "First", "elevation": 3.2, "units": [{ "id": "B1", "tenure": "rent" }] }
//!   ]
//! }
//! ```
//!
//! Documents without `layers` or `floors` are read in the exported graph
//! shape (`levels`, `spaces`, `relationships`) instead.

use super::{summarize_floors, unit_ids, GeometryExtractor};
use crate::config::{IngestConfig, LabelConfig, PlaceholderConfig};
use crate::{IngestError, Result};
use plan_lite_model::{
    GraphBuilder, GraphDocument, LayerInfo, Level, Metadata, ParsedGeometry, Point2,
    Relationship, SourceFormat, Space, AREA_M2,
};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct FloorplanDocument {
    #[serde(default)]
    layers: Option<Vec<DeclaredLayer>>,
    #[serde(default)]
    floors: Option<Vec<DeclaredFloor>>,
}

#[derive(Debug, Deserialize)]
struct DeclaredLayer {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type", alias = "kind")]
    kind: Option<String>,
    #[serde(default)]
    color: Option<Value>,
    #[serde(default)]
    linetype: Option<String>,
    #[serde(default)]
    elevation: Option<f64>,
    #[serde(default)]
    units: Vec<DeclaredUnit>,
    #[serde(default)]
    metadata: Metadata,
}

#[derive(Debug, Deserialize)]
struct DeclaredFloor {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    elevation: Option<f64>,
    #[serde(default)]
    units: Vec<DeclaredUnit>,
    #[serde(default)]
    metadata: Metadata,
}

#[derive(Debug, Deserialize)]
struct DeclaredUnit {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    area: Option<f64>,
    /// Everything else is passed through to the space metadata
    #[serde(flatten)]
    attributes: Metadata,
}

/// Role of a declared layer, from its type tag
#[derive(Clone, Copy, PartialEq, Eq)]
enum LayerRole {
    /// Contributes metadata shared by every level
    Shared,
    /// Declares a level
    Level,
    Other,
}

fn layer_role(kind: Option<&str>) -> LayerRole {
    match kind.map(str::to_ascii_lowercase).as_deref() {
        Some("site" | "reference") => LayerRole::Shared,
        Some("floor" | "level" | "storey" | "story") => LayerRole::Level,
        _ => LayerRole::Other,
    }
}

/// A level to create, with the units declared under it
struct PendingLevel<'a> {
    level: Level,
    units: &'a [DeclaredUnit],
}

/// Extractor for declarative JSON floorplans
pub struct JsonFloorplanExtractor {
    placeholder: PlaceholderConfig,
    labels: LabelConfig,
}

impl JsonFloorplanExtractor {
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            placeholder: config.placeholder.clone(),
            labels: config.labels.clone(),
        }
    }

    /// Side of the square placeholder for a unit
    fn side_for(&self, area: Option<f64>) -> f64 {
        match area {
            Some(area) if area > 0.0 => area.sqrt().max(self.placeholder.min_side),
            _ => self.placeholder.default_side,
        }
    }

    fn default_level(&self) -> Level {
        Level::new("json-default-storey", self.labels.default_storey.clone())
            .with_meta("synthetic", true)
    }

    fn extract_declared(&self, doc: FloorplanDocument) -> Result<ParsedGeometry> {
        let layers = doc.layers.unwrap_or_default();
        let floors = doc.floors.unwrap_or_default();

        // Shared metadata from site / reference layers; the first value of a key wins
        let mut shared = Metadata::new();
        let mut reference_layers = Vec::new();
        for (n, layer) in layers.iter().enumerate() {
            if layer_role(layer.kind.as_deref()) != LayerRole::Shared {
                continue;
            }
            let name = layer_name(layer, n);
            for (key, value) in &layer.metadata {
                shared.entry(key.clone()).or_insert_with(|| value.clone());
            }
            reference_layers.push(Value::from(name));
        }
        if !reference_layers.is_empty() {
            shared.insert("reference_layers".into(), Value::Array(reference_layers));
        }

        let mut pending: Vec<PendingLevel<'_>> = Vec::new();
        for (n, layer) in layers.iter().enumerate() {
            if layer_role(layer.kind.as_deref()) != LayerRole::Level {
                continue;
            }
            let id = layer
                .id
                .clone()
                .unwrap_or_else(|| format!("json-level-{}", pending.len() + 1));
            let mut level = Level::new(id, layer_name(layer, n))
                .with_elevation(layer.elevation.unwrap_or(0.0))
                .with_meta("source", "layer");
            if let Some(kind) = &layer.kind {
                level = level.with_meta("layer_type", kind.clone());
            }
            level.metadata.extend(layer.metadata.clone());
            pending.push(PendingLevel {
                level,
                units: &layer.units,
            });
        }
        for floor in &floors {
            let id = floor
                .id
                .clone()
                .unwrap_or_else(|| format!("json-level-{}", pending.len() + 1));
            let name = floor
                .name
                .clone()
                .unwrap_or_else(|| format!("Level {}", pending.len() + 1));
            let mut level = Level::new(id, name)
                .with_elevation(floor.elevation.unwrap_or(0.0))
                .with_meta("source", "floors");
            level.metadata.extend(floor.metadata.clone());
            pending.push(PendingLevel {
                level,
                units: &floor.units,
            });
        }

        let mut builder = GraphBuilder::new();
        let mut unit_counter = 0usize;
        let mut declared_area = 0.0;
        let mut row_offset = 0.0;
        for PendingLevel { level, units } in pending {
            let level = level.merge_metadata(&shared);
            let level_id = level.id.clone();
            let level_name = level.name.clone();
            builder.add_level(level)?;

            // Left to right, one row per floor
            let mut cursor = 0.0;
            let mut tallest: f64 = 0.0;
            for unit in units {
                unit_counter += 1;
                let id = unit
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("json-unit-{}", unit_counter));
                let name = unit.name.clone().unwrap_or_else(|| id.clone());
                let side = self.side_for(unit.area);
                let boundary = square(cursor, row_offset, side);
                cursor += side + self.placeholder.padding;
                tallest = tallest.max(side);

                let mut space = Space::new(&id, name, &level_id).with_boundary(boundary);
                space.metadata.extend(unit.attributes.clone());
                space = space
                    .with_meta("placeholder", true)
                    .with_meta("floor", level_name.clone());
                if let Some(area) = unit.area.filter(|a| *a > 0.0) {
                    declared_area += area;
                    space = space.with_meta(AREA_M2, area);
                }
                builder.add_space(space)?;
                builder.add_relationship(Relationship::contains(&level_id, id));
            }
            row_offset += tallest + self.placeholder.padding;
        }

        if builder.level_count() == 0 {
            log::warn!(
                "Floorplan declares no floors; emitting {:?}",
                self.labels.default_storey
            );
            builder.add_level(self.default_level().merge_metadata(&shared))?;
        }

        log::debug!("Validating floorplan graph ({} units)", unit_counter);
        let graph = builder.build()?;

        let layer_records = layers
            .iter()
            .enumerate()
            .map(|(n, layer)| LayerInfo {
                name: layer_name(layer, n),
                color: layer.color.as_ref().map(color_text),
                linetype: layer.linetype.clone(),
                item_count: (layer_role(layer.kind.as_deref()) == LayerRole::Level)
                    .then_some(layer.units.len()),
            })
            .collect();

        let mut metadata = Metadata::new();
        metadata.insert("document_shape".into(), Value::from("declarative"));
        metadata.insert("declared_layer_count".into(), Value::from(layers.len()));
        metadata.insert("declared_floor_count".into(), Value::from(floors.len()));
        metadata.insert("placeholder_count".into(), Value::from(unit_counter));
        metadata.insert("declared_area_m2".into(), Value::from(declared_area));

        let floors = summarize_floors(&graph);
        let units = unit_ids(&graph);
        Ok(ParsedGeometry::assemble(
            SourceFormat::Json,
            graph,
            floors,
            units,
            layer_records,
            metadata,
        ))
    }

    /// Read the exported graph shape, or emit one default storey
    fn extract_graph(&self, root: Value) -> Result<ParsedGeometry> {
        let has_graph = ["levels", "spaces", "relationships"]
            .iter()
            .any(|key| root.get(key).is_some());

        let mut metadata = Metadata::new();
        let mut builder = if has_graph {
            metadata.insert("document_shape".into(), Value::from("graph"));
            GraphDocument::deserialize(root)
                .map_err(IngestError::from)?
                .into_builder()?
        } else {
            log::warn!(
                "Floorplan document declares nothing; emitting {:?}",
                self.labels.default_storey
            );
            metadata.insert("document_shape".into(), Value::from("empty"));
            GraphBuilder::new()
        };
        if builder.level_count() == 0 {
            builder.add_level(self.default_level())?;
        }

        let graph = builder.build()?;
        let floors = summarize_floors(&graph);
        let units = unit_ids(&graph);
        Ok(ParsedGeometry::assemble(
            SourceFormat::Json,
            graph,
            floors,
            units,
            Vec::new(),
            metadata,
        ))
    }
}

fn layer_name(layer: &DeclaredLayer, index: usize) -> String {
    layer
        .name
        .clone()
        .unwrap_or_else(|| format!("Layer {}", index + 1))
}

fn color_text(color: &Value) -> String {
    match color {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Axis-aligned square with its lower-left corner at `(x, y)`
fn square(x: f64, y: f64, side: f64) -> Vec<Point2> {
    vec![
        Point2::new(x, y),
        Point2::new(x + side, y),
        Point2::new(x + side, y + side),
        Point2::new(x, y + side),
    ]
}

impl GeometryExtractor for JsonFloorplanExtractor {
    fn format(&self) -> SourceFormat {
        SourceFormat::Json
    }

    fn extract(&self, payload: &[u8]) -> Result<ParsedGeometry> {
        let text = std::str::from_utf8(payload)
            .map_err(|e| IngestError::malformed(format!("floorplan is not UTF-8: {}", e)))?;
        let root: Value = serde_json::from_str(text)?;
        if !root.is_object() {
            return Err(IngestError::malformed("floorplan document must be a JSON object"));
        }

        let doc = FloorplanDocument::deserialize(&root)?;
        let declares_floors = doc.layers.as_ref().is_some_and(|l| !l.is_empty())
            || doc.floors.as_ref().is_some_and(|f| !f.is_empty());
        if declares_floors {
            self.extract_declared(doc)
        } else {
            self.extract_graph(root)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn extract(json: &str) -> Result<ParsedGeometry> {
        JsonFloorplanExtractor::new(&IngestConfig::default()).extract(json.as_bytes())
    }

    #[test]
    fn test_placeholder_sides() {
        let extractor = JsonFloorplanExtractor::new(&IngestConfig::default());
        assert_relative_eq!(extractor.side_for(Some(16.0)), 4.0);
        assert_relative_eq!(extractor.side_for(Some(4.0)), 3.0);
        assert_relative_eq!(extractor.side_for(None), 3.0);
        assert_relative_eq!(extractor.side_for(Some(-2.0)), 3.0);
    }

    #[test]
    fn test_layers_and_floors() {
        let parsed = extract(
            r#"{
                "layers": [
                    {"name": "Plot", "type": "site", "color": 3, "metadata": {"zone": "R3"}},
                    {"name": "Ground", "type": "floor", "units": [
                        {"name": "A1", "area": 16.0},
                        {"name": "A2", "tenure": "rent"}
                    ]}
                ],
                "floors": [{"name": "First", "elevation": 3.2, "units": [{"id": "B1"}]}]
            }"#,
        )
        .unwrap();

        assert_eq!(parsed.graph.level_count(), 2);
        assert_eq!(parsed.units.len(), 3);
        assert_eq!(parsed.floors[0].name, "Ground");
        assert_eq!(parsed.floors[1].unit_ids, vec!["B1".to_string()]);
        assert!(parsed.floors_partition_units());

        let ground = &parsed.graph.levels()[0];
        assert_eq!(ground.metadata["zone"], "R3");
        assert_relative_eq!(parsed.graph.levels()[1].elevation, 3.2);

        let a1 = &parsed.graph.spaces()[0];
        assert_relative_eq!(a1.area_m2().unwrap(), 16.0);
        assert_relative_eq!(a1.boundary[1].x, 4.0);

        let a2 = &parsed.graph.spaces()[1];
        assert_eq!(a2.metadata["tenure"], "rent");
        assert_relative_eq!(a2.boundary[0].x, 5.5);

        assert_eq!(parsed.layers[0].color.as_deref(), Some("3"));
        assert_eq!(parsed.layers[1].item_count, Some(2));
    }

    #[test]
    fn test_floors_stack_without_overlap() {
        let parsed = extract(
            r#"{"floors": [
                {"name": "G", "units": [{"area": 25.0}, {"area": 9.0}]},
                {"name": "1", "units": [{"area": 9.0}]}
            ]}"#,
        )
        .unwrap();
        let upper = &parsed.graph.spaces()[2];
        // tallest ground unit is 5.0, plus 1.5 padding
        assert_relative_eq!(upper.boundary[0].y, 6.5);
    }

    #[test]
    fn test_graph_shape_fallback() {
        let parsed = extract(
            r#"{
                "levels": [{"id": "L1", "name": "Ground"}],
                "spaces": [{"id": "S1", "name": "Hall", "level_id": "L1"}],
                "relationships": [{"type": "contains", "source_id": "L1", "target_id": "S1"}]
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.units, vec!["S1".to_string()]);
        assert_eq!(parsed.metadata["document_shape"], "graph");
    }

    #[test]
    fn test_empty_document_gets_default_storey() {
        let parsed = extract("{}").unwrap();
        assert_eq!(parsed.floors.len(), 1);
        assert_eq!(parsed.floors[0].name, "Default Storey");
        assert!(parsed.units.is_empty());
    }

    #[test]
    fn test_site_layers_only() {
        let parsed = extract(r#"{"layers": [{"name": "Plot", "type": "reference"}]}"#).unwrap();
        assert_eq!(parsed.graph.level_count(), 1);
        let level = &parsed.graph.levels()[0];
        assert_eq!(level.name, "Default Storey");
        assert_eq!(level.metadata["reference_layers"][0], "Plot");
    }

    #[test]
    fn test_malformed_documents() {
        for bad in ["[1, 2]", "{\"floors\": 3}", "{\"floors\": [{\"units\": [1]}]}", "{", "\"x\""] {
            assert!(
                matches!(extract(bad), Err(IngestError::MalformedPayload(_))),
                "{} should be malformed",
                bad
            );
        }
    }

    #[test]
    fn test_dangling_graph_shape_fails() {
        let err = extract(r#"{"spaces": [{"id": "S1", "name": "x", "level_id": "nowhere"}]}"#)
            .unwrap_err();
        assert!(matches!(err, IngestError::Graph(_)));
    }
}
