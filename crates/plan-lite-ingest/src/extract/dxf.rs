// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vector drawing extraction
//!
//! Every closed model-space outline becomes one space. Outlines are grouped
//! into floors by layer name, and the drawing scale is taken from
//! `$INSUNITS` or guessed from the drawing extent.

use super::{summarize_floors, unit_ids, GeometryExtractor};
use crate::config::{DxfConfig, IngestConfig, LabelConfig};
use crate::heuristics::{classify_layer, resolve_scale, LayerClass, ScaleSource};
use crate::Result;
use plan_lite_model::{
    polygon_area, Bounds2, DrawingDocument, DrawingPolyline, DrawingReader, GraphBuilder,
    LayerInfo, Level, Metadata, ParsedGeometry, Point2, Relationship, SourceFormat, Space,
    AREA_M2,
};
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::Arc;

/// A closed outline, already scaled to meters
struct Candidate<'a> {
    polyline: &'a DrawingPolyline,
    ring: Vec<Point2>,
    class: LayerClass,
    area: f64,
}

/// Extractor for DXF drawings
pub struct DxfExtractor {
    reader: Arc<dyn DrawingReader>,
    config: DxfConfig,
    labels: LabelConfig,
}

impl DxfExtractor {
    pub fn new(reader: Arc<dyn DrawingReader>, config: &IngestConfig) -> Self {
        Self {
            reader,
            config: config.dxf.clone(),
            labels: config.labels.clone(),
        }
    }

    fn classify(&self, layer: &str) -> LayerClass {
        classify_layer(layer, &self.config.floor_tokens, &self.config.site_tokens)
    }

    fn candidates<'a>(&self, outlines: &[&'a DrawingPolyline], scale: f64) -> Vec<Candidate<'a>> {
        let tolerance = self.config.closure_tolerance;
        outlines
            .iter()
            .map(|&polyline| {
                let ring: Vec<Point2> = polyline
                    .ring(tolerance)
                    .iter()
                    .map(|v| v.scaled(scale))
                    .collect();
                Candidate {
                    polyline,
                    area: polygon_area(&ring),
                    class: self.classify(&polyline.layer),
                    ring,
                }
            })
            .collect()
    }

    fn assemble(&self, doc: &DrawingDocument) -> Result<ParsedGeometry> {
        let tolerance = self.config.closure_tolerance;
        let outlines: Vec<&DrawingPolyline> = doc
            .model_space_polylines()
            .filter(|p| p.is_closed_outline(tolerance))
            .collect();
        let extent = outlines
            .iter()
            .filter_map(|p| Bounds2::of(&p.vertices))
            .reduce(|a, b| a.union(&b));
        let (scale, scale_source) = resolve_scale(doc.header.insunits, extent, &self.config);
        if scale_source == ScaleSource::Extent {
            log::warn!(
                "Drawing declares no usable $INSUNITS; assuming {} m per unit from its extent",
                scale
            );
        }

        let candidates = self.candidates(&outlines, scale);
        let site = site_indices(&candidates);
        let site_area: f64 = site.iter().map(|&i| candidates[i].area).sum();
        let gross_area: f64 = candidates
            .iter()
            .enumerate()
            .filter(|(i, _)| !site.contains(i))
            .map(|(_, c)| c.area)
            .sum();
        let net_area = gross_area * self.config.area_efficiency;

        let mut builder = GraphBuilder::new();
        let buckets = self.bucket(&candidates);
        let mut assignment = vec![0; candidates.len()];
        for (n, bucket) in buckets.iter().enumerate() {
            for &member in &bucket.members {
                assignment[member] = n;
            }
            let mut level = Level::new(level_id(n), bucket.name.clone())
                .with_meta("synthetic", bucket.layer.is_none());
            if let Some(layer) = &bucket.layer {
                level = level.with_meta("source_layer", layer.clone());
            }
            builder.add_level(level)?;
        }

        for (i, candidate) in candidates.iter().enumerate() {
            let id = format!("dxf-space-{}", i + 1);
            let level = level_id(assignment[i]);
            let role = if site.contains(&i) { "site" } else { "floor_area" };

            let mut space = Space::new(&id, format!("Outline {}", i + 1), &level)
                .with_boundary(candidate.ring.clone())
                .with_meta(AREA_M2, candidate.area)
                .with_meta("source_layer", candidate.polyline.layer.clone())
                .with_meta("layer_class", candidate.class.as_str())
                .with_meta("area_role", role);
            if let Some(handle) = &candidate.polyline.handle {
                space = space.with_meta("source_handle", handle.clone());
            }
            builder.add_space(space)?;
            builder.add_relationship(Relationship::contains(level, id));
        }

        log::debug!("Validating drawing graph ({} outlines)", candidates.len());
        let graph = builder.build()?;

        let mut metadata = Metadata::new();
        metadata.insert("unit_scale".into(), Value::from(scale));
        metadata.insert("unit_scale_source".into(), Value::from(scale_source.as_str()));
        if let Some(code) = doc.header.insunits {
            metadata.insert("insunits".into(), Value::from(code));
        }
        if let Some(version) = &doc.header.acad_version {
            metadata.insert("acad_version".into(), Value::from(version.clone()));
        }
        metadata.insert("site_area_m2".into(), Value::from(site_area));
        metadata.insert("gross_floor_area_m2".into(), Value::from(gross_area));
        metadata.insert("net_floor_area_m2".into(), Value::from(net_area));
        metadata.insert(
            "area_efficiency".into(),
            Value::from(self.config.area_efficiency),
        );
        metadata.insert("closed_outline_count".into(), Value::from(candidates.len()));
        metadata.insert("entity_count".into(), Value::from(doc.entity_count));

        let floors = summarize_floors(&graph);
        let units = unit_ids(&graph);
        Ok(ParsedGeometry::assemble(
            SourceFormat::Dxf,
            graph,
            floors,
            units,
            layer_records(doc),
            metadata,
        ))
    }

    /// Group candidates into floor buckets
    ///
    /// Floor layers come first in discovery order; the synthetic bucket
    /// (`Unassigned`, or `Model Space` when no layer is a floor layer) last.
    fn bucket(&self, candidates: &[Candidate<'_>]) -> Vec<Bucket> {
        let any_floor = candidates.iter().any(|c| c.class == LayerClass::Floor);
        let mut buckets: Vec<Bucket> = Vec::new();
        let mut by_layer: FxHashMap<&str, usize> = FxHashMap::default();
        let mut synthetic = Vec::new();

        for (i, candidate) in candidates.iter().enumerate() {
            if candidate.class == LayerClass::Floor {
                let layer = candidate.polyline.layer.as_str();
                let slot = *by_layer.entry(layer).or_insert_with(|| {
                    buckets.push(Bucket {
                        name: layer.to_string(),
                        layer: Some(layer.to_string()),
                        members: Vec::new(),
                    });
                    buckets.len() - 1
                });
                buckets[slot].members.push(i);
            } else {
                synthetic.push(i);
            }
        }

        if !synthetic.is_empty() || buckets.is_empty() {
            let name = if any_floor {
                &self.labels.unassigned
            } else {
                &self.labels.model_space
            };
            if candidates.is_empty() {
                log::warn!("Drawing has no closed outlines; emitting an empty {:?} floor", name);
            } else {
                log::warn!("{} outline(s) placed on synthetic floor {:?}", synthetic.len(), name);
            }
            buckets.push(Bucket {
                name: name.clone(),
                layer: None,
                members: synthetic,
            });
        }
        buckets
    }
}

struct Bucket {
    name: String,
    layer: Option<String>,
    members: Vec<usize>,
}

fn level_id(index: usize) -> String {
    format!("dxf-level-{}", index + 1)
}

/// Site candidates: those on site layers, otherwise the largest outline not
/// on a floor layer
fn site_indices(candidates: &[Candidate<'_>]) -> Vec<usize> {
    let on_site_layers: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.class == LayerClass::Site)
        .map(|(i, _)| i)
        .collect();
    if !on_site_layers.is_empty() {
        return on_site_layers;
    }
    candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| c.class != LayerClass::Floor)
        .max_by(|(_, a), (_, b)| a.area.total_cmp(&b.area))
        .map(|(i, _)| vec![i])
        .unwrap_or_default()
}

/// Layer table entries, then layers only referenced by entities
fn layer_records(doc: &DrawingDocument) -> Vec<LayerInfo> {
    let mut layers: Vec<LayerInfo> = doc
        .layers
        .iter()
        .map(|layer| LayerInfo {
            name: layer.name.clone(),
            color: layer.color.map(|c| c.to_string()),
            linetype: layer.linetype.clone(),
            item_count: Some(doc.entity_counts.get(&layer.name).copied().unwrap_or(0)),
        })
        .collect();

    for (name, count) in &doc.entity_counts {
        if doc.layer(name).is_none() {
            let mut info = LayerInfo::new(name.clone());
            info.item_count = Some(*count);
            layers.push(info);
        }
    }
    layers
}

impl GeometryExtractor for DxfExtractor {
    fn format(&self) -> SourceFormat {
        SourceFormat::Dxf
    }

    fn extract(&self, payload: &[u8]) -> Result<ParsedGeometry> {
        log::debug!("Reading drawing with {} reader", self.reader.name());
        let doc = self.reader.read(payload)?;
        self.assemble(&doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_lite_model::{DrawingLayer, ParseError};

    /// Hands out a prepared document
    struct Prepared(DrawingDocument);

    impl DrawingReader for Prepared {
        fn read(&self, _: &[u8]) -> std::result::Result<DrawingDocument, ParseError> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &'static str {
            "prepared"
        }
    }

    fn outline(layer: &str, w: f64, h: f64) -> DrawingPolyline {
        DrawingPolyline {
            handle: None,
            layer: layer.to_string(),
            vertices: vec![
                Point2::new(0.0, 0.0),
                Point2::new(w, 0.0),
                Point2::new(w, h),
                Point2::new(0.0, h),
            ],
            closed: true,
            paper_space: false,
        }
    }

    fn extract(doc: DrawingDocument) -> ParsedGeometry {
        DxfExtractor::new(Arc::new(Prepared(doc)), &IngestConfig::default())
            .extract(b"")
            .unwrap()
    }

    #[test]
    fn test_site_layer_excluded_from_gross_area() {
        let mut doc = DrawingDocument::default();
        doc.header.insunits = Some(6);
        doc.polylines = vec![
            outline("Plot", 30.0, 20.0),
            outline("Floor 1", 10.0, 10.0),
            outline("Floor 2", 10.0, 5.0),
        ];

        let parsed = extract(doc);
        assert_eq!(parsed.metadata["site_area_m2"], 600.0);
        assert_eq!(parsed.metadata["gross_floor_area_m2"], 150.0);
        assert_eq!(parsed.floors.len(), 3);
        assert_eq!(parsed.floors[2].name, "Unassigned");
    }

    #[test]
    fn test_same_layer_shares_a_floor() {
        let mut doc = DrawingDocument::default();
        doc.polylines = vec![
            outline("LEVEL 1", 4.0, 4.0),
            outline("LEVEL 1", 3.0, 3.0),
            outline("LEVEL 2", 4.0, 4.0),
        ];

        let parsed = extract(doc);
        assert_eq!(parsed.floors.len(), 2);
        assert_eq!(parsed.floors[0].unit_ids, vec!["dxf-space-1", "dxf-space-2"]);
        assert_eq!(parsed.graph.relationship_count(), 3);
    }

    #[test]
    fn test_layers_without_table_entry() {
        let mut doc = DrawingDocument::default();
        doc.layers = vec![DrawingLayer::new("0")];
        doc.entity_counts.insert("LOOSE".into(), 3);

        let parsed = extract(doc);
        assert_eq!(parsed.layers.len(), 2);
        assert_eq!(parsed.layers[1].name, "LOOSE");
        assert_eq!(parsed.layers[1].item_count, Some(3));
    }
}
