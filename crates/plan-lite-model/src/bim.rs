// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoded building model, as returned by a [`crate::BimReader`]
//!
//! Only the parts of a building model that plan ingestion consumes are
//! kept: the storey hierarchy, spaces with their areas and footprints,
//! containment edges and presentation layers.

use crate::Point2;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// STEP instance id (`#123`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// HEADER section summary
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BimHeader {
    /// Schema identifier (IFC2X3, IFC4, IFC4X3)
    pub schema: String,
    pub file_name: Option<String>,
    pub originating_system: Option<String>,
}

/// Building storey
#[derive(Clone, Debug, PartialEq)]
pub struct BimStorey {
    pub step_id: EntityId,
    pub global_id: Option<String>,
    pub name: Option<String>,
    /// Elevation in meters, when declared
    pub elevation: Option<f64>,
    pub entity_type: String,
}

/// Space (room) with optional quantities and footprint
#[derive(Clone, Debug, PartialEq)]
pub struct BimSpace {
    pub step_id: EntityId,
    pub global_id: Option<String>,
    pub name: Option<String>,
    pub long_name: Option<String>,
    pub entity_type: String,
    /// Floor area in m² from the space's quantity sets
    pub area: Option<f64>,
    /// Footprint polygon in meters, from its extruded body
    pub footprint: Vec<Point2>,
}

/// Source relation of a containment edge
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainmentKind {
    /// IfcRelAggregates (decomposition)
    Aggregates,
    /// IfcRelContainedInSpatialStructure
    ContainedIn,
}

/// Parent / children edge of the spatial tree
#[derive(Clone, Debug, PartialEq)]
pub struct ContainmentEdge {
    pub parent: EntityId,
    pub children: Vec<EntityId>,
    pub relation: ContainmentKind,
}

/// Presentation layer and the number of items assigned to it
#[derive(Clone, Debug, PartialEq)]
pub struct BimLayerAssignment {
    pub name: String,
    pub identifier: Option<String>,
    pub item_count: usize,
}

/// Everything a building-model reader recovers from one payload
#[derive(Clone, Debug, Default)]
pub struct BimDocument {
    pub header: BimHeader,
    pub project_name: Option<String>,
    /// Factor converting model length units to meters
    pub unit_scale: f64,
    /// Storeys in file order
    pub storeys: Vec<BimStorey>,
    /// Spaces in file order
    pub spaces: Vec<BimSpace>,
    pub containment: Vec<ContainmentEdge>,
    pub layers: Vec<BimLayerAssignment>,
    /// Number of instances in the DATA section
    pub entity_count: usize,
}

impl BimDocument {
    /// Direct children per parent across all containment edges, in edge order
    pub fn child_index(&self) -> FxHashMap<EntityId, Vec<EntityId>> {
        let mut index: FxHashMap<EntityId, Vec<EntityId>> = FxHashMap::default();
        for edge in &self.containment {
            index
                .entry(edge.parent)
                .or_default()
                .extend(edge.children.iter().copied());
        }
        index
    }

    pub fn space(&self, id: EntityId) -> Option<&BimSpace> {
        self.spaces.iter().find(|s| s.step_id == id)
    }

    pub fn storey(&self, id: EntityId) -> Option<&BimStorey> {
        self.storeys.iter().find(|s| s.step_id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_span_edges() {
        let doc = BimDocument {
            containment: vec![
                ContainmentEdge {
                    parent: EntityId(1),
                    children: vec![EntityId(2), EntityId(3)],
                    relation: ContainmentKind::Aggregates,
                },
                ContainmentEdge {
                    parent: EntityId(9),
                    children: vec![EntityId(4)],
                    relation: ContainmentKind::Aggregates,
                },
                ContainmentEdge {
                    parent: EntityId(1),
                    children: vec![EntityId(5)],
                    relation: ContainmentKind::ContainedIn,
                },
            ],
            ..Default::default()
        };
        let index = doc.child_index();
        assert_eq!(index[&EntityId(1)], vec![EntityId(2), EntityId(3), EntityId(5)]);
        assert_eq!(index[&EntityId(9)], vec![EntityId(4)]);
        assert!(!index.contains_key(&EntityId(2)));
    }

    #[test]
    fn test_entity_id_display() {
        assert_eq!(EntityId(42).to_string(), "#42");
    }
}
