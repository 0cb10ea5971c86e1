// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Building model extraction
//!
//! Storeys become levels. Spaces are found in two passes: a walk down the
//! containment edges of every storey, then a sweep over all spaces so that
//! spaces missing a containment edge are not dropped. Spaces that no storey
//! claims land on a synthetic default storey.

use super::{summarize_floors, unit_ids, GeometryExtractor};
use crate::config::{IngestConfig, LabelConfig};
use crate::Result;
use plan_lite_model::{
    polygon_area, BimDocument, BimReader, BimSpace, EntityId, GraphBuilder, LayerInfo, Level,
    Metadata, ParsedGeometry, Relationship, SourceFormat, Space, AREA_M2,
};
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;

const DEFAULT_STOREY_ID: &str = "ifc-default-storey";

/// How a space was reached
#[derive(Clone, Copy, PartialEq, Eq)]
enum Discovery {
    Containment,
    Sweep,
}

impl Discovery {
    fn as_str(self) -> &'static str {
        match self {
            Discovery::Containment => "containment",
            Discovery::Sweep => "sweep",
        }
    }
}

/// Extractor for IFC building models
pub struct IfcExtractor {
    reader: Arc<dyn BimReader>,
    labels: LabelConfig,
}

impl IfcExtractor {
    pub fn new(reader: Arc<dyn BimReader>, config: &IngestConfig) -> Self {
        Self {
            reader,
            labels: config.labels.clone(),
        }
    }

    fn default_storey(&self, doc: &BimDocument) -> Level {
        let mut level = Level::new(DEFAULT_STOREY_ID, self.labels.default_storey.clone())
            .with_meta("synthetic", true);
        if let Some(project) = &doc.project_name {
            level = level.with_meta("project_name", project.clone());
        }
        level
    }

    fn assemble(&self, doc: &BimDocument) -> Result<ParsedGeometry> {
        let mut builder = GraphBuilder::new();

        // Storeys, first GlobalId wins
        let mut storey_levels: FxHashMap<EntityId, String> = FxHashMap::default();
        for storey in &doc.storeys {
            let id = storey
                .global_id
                .clone()
                .unwrap_or_else(|| format!("ifc-storey-{}", storey.step_id.0));
            if builder.has_level(&id) {
                log::warn!("Storey {} repeats GlobalId {}; merging", storey.step_id, id);
                storey_levels.insert(storey.step_id, id);
                continue;
            }

            let name = storey.name.clone().unwrap_or_else(|| id.clone());
            let mut level = Level::new(&id, name)
                .with_elevation(storey.elevation.unwrap_or(0.0))
                .with_meta("entity_type", storey.entity_type.clone())
                .with_meta("step_id", storey.step_id.0);
            if let Some(project) = &doc.project_name {
                level = level.with_meta("project_name", project.clone());
            }
            builder.add_level(level)?;
            storey_levels.insert(storey.step_id, id);
        }

        let spaces_by_id: FxHashMap<EntityId, &BimSpace> =
            doc.spaces.iter().map(|s| (s.step_id, s)).collect();

        // Pass 1: containment walk per storey
        let children = doc.child_index();
        let children_of = |id: EntityId| children.get(&id).into_iter().flatten().copied();
        let mut placed: FxHashMap<EntityId, String> = FxHashMap::default();
        let mut order: Vec<(EntityId, Discovery)> = Vec::new();
        for storey in &doc.storeys {
            let Some(level_id) = storey_levels.get(&storey.step_id) else {
                continue;
            };
            let mut visited: FxHashSet<EntityId> = FxHashSet::default();
            let mut queue: VecDeque<EntityId> = children_of(storey.step_id).collect();
            while let Some(id) = queue.pop_front() {
                if !visited.insert(id) || storey_levels.contains_key(&id) {
                    continue;
                }
                if spaces_by_id.contains_key(&id) && !placed.contains_key(&id) {
                    placed.insert(id, level_id.clone());
                    order.push((id, Discovery::Containment));
                }
                queue.extend(children_of(id));
            }
        }

        // Pass 2: sweep for spaces without a containment edge
        let contained = order.len();
        for space in &doc.spaces {
            if !placed.contains_key(&space.step_id) {
                order.push((space.step_id, Discovery::Sweep));
            }
        }
        if order.len() > contained {
            log::warn!(
                "{} space(s) have no storey containment; attaching to {:?}",
                order.len() - contained,
                self.labels.default_storey
            );
        }

        let mut total_area = 0.0;
        let mut skipped = 0usize;
        let mut swept = 0usize;
        for (step_id, discovery) in order {
            let Some(space) = spaces_by_id.get(&step_id) else {
                continue;
            };
            let id = space
                .global_id
                .clone()
                .unwrap_or_else(|| format!("ifc-space-{}", step_id.0));
            if builder.has_space(&id) {
                log::warn!("Space {} repeats GlobalId {}; keeping the first", step_id, id);
                skipped += 1;
                continue;
            }

            let level_id = match placed.get(&step_id) {
                Some(level_id) => level_id.clone(),
                None => {
                    if !builder.has_level(DEFAULT_STOREY_ID) {
                        builder.add_level(self.default_storey(doc))?;
                    }
                    DEFAULT_STOREY_ID.to_string()
                }
            };

            let name = space
                .name
                .clone()
                .or_else(|| space.long_name.clone())
                .unwrap_or_else(|| id.clone());
            let mut record = Space::new(&id, name, &level_id)
                .with_boundary(space.footprint.clone())
                .with_meta("entity_type", space.entity_type.clone())
                .with_meta("step_id", step_id.0)
                .with_meta("discovered_by", discovery.as_str());
            if let Some(long_name) = &space.long_name {
                record = record.with_meta("long_name", long_name.clone());
            }

            let area = match space.area {
                Some(area) => Some((area, "quantity")),
                None if space.footprint.len() >= 3 => {
                    Some((polygon_area(&space.footprint), "footprint"))
                }
                None => None,
            };
            if let Some((area, source)) = area {
                total_area += area;
                record = record
                    .with_meta(AREA_M2, area)
                    .with_meta("area_source", source);
            }

            if discovery == Discovery::Sweep {
                swept += 1;
            }
            builder.add_space(record)?;
            builder.add_relationship(
                Relationship::contains(level_id, id)
                    .with_attribute("discovered_by", discovery.as_str()),
            );
        }

        if builder.level_count() == 0 {
            log::warn!("Model has no storeys; emitting {:?}", self.labels.default_storey);
            builder.add_level(self.default_storey(doc))?;
        }

        log::debug!(
            "Validating building graph ({} levels, {} spaces)",
            builder.level_count(),
            builder.space_count()
        );
        let graph = builder.build()?;

        let mut metadata = Metadata::new();
        if !doc.header.schema.is_empty() {
            metadata.insert("ifc_schema".into(), Value::from(doc.header.schema.clone()));
        }
        if let Some(project) = &doc.project_name {
            metadata.insert("project_name".into(), Value::from(project.clone()));
        }
        if let Some(system) = &doc.header.originating_system {
            metadata.insert("originating_system".into(), Value::from(system.clone()));
        }
        if let Some(file_name) = &doc.header.file_name {
            metadata.insert("file_name".into(), Value::from(file_name.clone()));
        }
        metadata.insert("unit_scale".into(), Value::from(doc.unit_scale));
        metadata.insert("entity_count".into(), Value::from(doc.entity_count));
        metadata.insert("storey_count".into(), Value::from(doc.storeys.len()));
        metadata.insert("space_count".into(), Value::from(graph.space_count()));
        metadata.insert("uncontained_space_count".into(), Value::from(swept));
        metadata.insert("duplicate_space_count".into(), Value::from(skipped));
        metadata.insert("total_area_m2".into(), Value::from(total_area));

        let layers = doc
            .layers
            .iter()
            .map(|layer| {
                let mut info = LayerInfo::new(layer.name.clone());
                info.item_count = Some(layer.item_count);
                info
            })
            .collect();

        let floors = summarize_floors(&graph);
        let units = unit_ids(&graph);
        Ok(ParsedGeometry::assemble(
            SourceFormat::Ifc,
            graph,
            floors,
            units,
            layers,
            metadata,
        ))
    }
}

impl GeometryExtractor for IfcExtractor {
    fn format(&self) -> SourceFormat {
        SourceFormat::Ifc
    }

    fn extract(&self, payload: &[u8]) -> Result<ParsedGeometry> {
        log::debug!("Reading building model with {} reader", self.reader.name());
        let doc = self.reader.read(payload)?;
        self.assemble(&doc)
    }
}
