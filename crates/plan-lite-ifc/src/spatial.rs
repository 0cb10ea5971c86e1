// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial structure: storeys, spaces and containment edges

use crate::resolver::EntityStore;
use crate::types::{StepEntity, StepType};
use crate::units::UnitScales;
use plan_lite_model::{BimSpace, BimStorey, ContainmentEdge, ContainmentKind};

/// Name of the first IFCPROJECT, when present
pub fn project_name(store: &EntityStore<'_>) -> Option<String> {
    store
        .entities_of(&StepType::Project)
        .first()
        .and_then(|p| p.get_string(2))
        .map(str::to_string)
}

/// Every building storey, in file order
pub fn read_storeys(store: &EntityStore<'_>, scales: &UnitScales) -> Vec<BimStorey> {
    store
        .entities_of(&StepType::BuildingStorey)
        .iter()
        .map(|storey| BimStorey {
            step_id: storey.id,
            global_id: storey.get_string(0).map(str::to_string),
            name: storey.get_string(2).map(str::to_string),
            // Elevation at index 9
            elevation: storey.get_float(9).map(|e| e * scales.length),
            entity_type: storey.step_type.name().to_string(),
        })
        .collect()
}

/// Every space, in file order, without area or footprint
pub fn read_spaces(store: &EntityStore<'_>) -> Vec<BimSpace> {
    store
        .entities_of(&StepType::Space)
        .iter()
        .map(|space| BimSpace {
            step_id: space.id,
            global_id: space.get_string(0).map(str::to_string),
            name: space.get_string(2).map(str::to_string),
            // LongName at index 7
            long_name: space.get_string(7).map(str::to_string),
            entity_type: space.step_type.name().to_string(),
            area: None,
            footprint: Vec::new(),
        })
        .collect()
}

/// Decomposition and containment edges, in file order
pub fn read_containment(store: &EntityStore<'_>) -> Vec<ContainmentEdge> {
    let mut edges = Vec::new();

    // IFCRELAGGREGATES: RelatingObject at 4, RelatedObjects at 5
    for rel in store.entities_of(&StepType::RelAggregates) {
        if let Some(edge) = edge_of(&rel, 4, 5, ContainmentKind::Aggregates) {
            edges.push(edge);
        }
    }

    // IFCRELCONTAINEDINSPATIALSTRUCTURE: RelatedElements at 4, RelatingStructure at 5
    for rel in store.entities_of(&StepType::RelContainedInSpatialStructure) {
        if let Some(edge) = edge_of(&rel, 5, 4, ContainmentKind::ContainedIn) {
            edges.push(edge);
        }
    }

    edges
}

fn edge_of(
    rel: &StepEntity,
    parent_at: usize,
    children_at: usize,
    relation: ContainmentKind,
) -> Option<ContainmentEdge> {
    let parent = rel.get_ref(parent_at)?;
    let children = rel.get_refs(children_at);
    if children.is_empty() {
        return None;
    }
    Some(ContainmentEdge {
        parent,
        children,
        relation,
    })
}
