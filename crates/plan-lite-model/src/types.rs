// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types of the geometry graph
//!
//! Levels, spaces and relationships are plain serde records. They are
//! created by extractors through [`crate::GraphBuilder`] and never mutated
//! once the graph has been validated.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Open key-value bag attached to levels, spaces and relationships
pub type Metadata = BTreeMap<String, Value>;

/// Relationship type linking a level to a space it contains
pub const CONTAINS: &str = "contains";

/// Metadata key holding a space area in square meters
pub const AREA_M2: &str = "area_m2";

/// 2D point in plan coordinates
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Multiply both coordinates by `factor`
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Component-wise closeness within `tolerance`
    pub fn approx_eq(&self, other: &Point2, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

/// Axis-aligned bounding box of a point set
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds2 {
    pub min: Point2,
    pub max: Point2,
}

impl Bounds2 {
    /// Bounds of `points`, or `None` for an empty set
    pub fn of(points: &[Point2]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Bounds2 {
            min: *first,
            max: *first,
        };
        for p in &points[1..] {
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.y = bounds.min.y.min(p.y);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.y = bounds.max.y.max(p.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Largest of width and height
    pub fn max_extent(&self) -> f64 {
        self.width().max(self.height())
    }

    /// Grow to cover `other`
    pub fn union(&self, other: &Bounds2) -> Bounds2 {
        Bounds2 {
            min: Point2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }
}

/// Unsigned shoelace area of a closed polygon (closing edge implied)
pub fn polygon_area(points: &[Point2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice_area += p.x * q.y - q.x * p.y;
    }
    (twice_area / 2.0).abs()
}

/// One storey / floor of a building
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// Unique id within the graph
    pub id: String,
    pub name: String,
    /// Elevation in meters
    #[serde(default)]
    pub elevation: f64,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Level {
    /// Create a level at elevation 0
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            elevation: 0.0,
            metadata: Metadata::new(),
        }
    }

    /// Set elevation (meters)
    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = elevation;
        self
    }

    /// Add a metadata entry
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Merge entries into metadata, keeping existing keys
    pub fn merge_metadata(mut self, shared: &Metadata) -> Self {
        for (key, value) in shared {
            self.metadata
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        self
    }
}

/// One enclosed unit: a room, a closed drawing outline or a BIM space
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Space {
    /// Unique id within the graph
    pub id: String,
    pub name: String,
    /// Owning level; resolved at validation time
    pub level_id: String,
    /// Closed polygon, may be empty when the source carries no geometry
    #[serde(default)]
    pub boundary: Vec<Point2>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Space {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        level_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level_id: level_id.into(),
            boundary: Vec::new(),
            metadata: Metadata::new(),
        }
    }

    /// Set the boundary polygon
    pub fn with_boundary(mut self, boundary: Vec<Point2>) -> Self {
        self.boundary = boundary;
        self
    }

    /// Add a metadata entry
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Area in square meters, when recorded
    pub fn area_m2(&self) -> Option<f64> {
        self.metadata.get(AREA_M2).and_then(Value::as_f64)
    }
}

/// Typed edge between two graph members
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(rename = "type")]
    pub kind: String,
    pub source_id: String,
    pub target_id: String,
    #[serde(default)]
    pub attributes: Metadata,
}

impl Relationship {
    pub fn new(
        kind: impl Into<String>,
        source_id: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            source_id: source_id.into(),
            target_id: target_id.into(),
            attributes: Metadata::new(),
        }
    }

    /// `contains` edge from a level to one of its spaces
    pub fn contains(level_id: impl Into<String>, space_id: impl Into<String>) -> Self {
        Self::new(CONTAINS, level_id, space_id)
    }

    /// Add an attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Short label used in diagnostics (`type:source->target`)
    pub fn label(&self) -> String {
        format!("{}:{}->{}", self.kind, self.source_id, self.target_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rect(w: f64, h: f64) -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(w, 0.0),
            Point2::new(w, h),
            Point2::new(0.0, h),
        ]
    }

    #[test]
    fn test_polygon_area_rectangle() {
        assert_relative_eq!(polygon_area(&rect(4.0, 3.0)), 12.0);
    }

    #[test]
    fn test_polygon_area_orientation_independent() {
        let mut points = rect(2.0, 5.0);
        points.reverse();
        assert_relative_eq!(polygon_area(&points), 10.0);
    }

    #[test]
    fn test_polygon_area_degenerate() {
        assert_eq!(polygon_area(&[Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)]), 0.0);
    }

    #[test]
    fn test_bounds() {
        let bounds = Bounds2::of(&rect(4000.0, 3000.0)).unwrap();
        assert_relative_eq!(bounds.width(), 4000.0);
        assert_relative_eq!(bounds.max_extent(), 4000.0);
        assert!(Bounds2::of(&[]).is_none());
    }

    #[test]
    fn test_level_merge_metadata_keeps_own_keys() {
        let mut shared = Metadata::new();
        shared.insert("project".into(), "Harbour".into());
        shared.insert("source".into(), "site".into());
        let level = Level::new("L1", "Level 1")
            .with_meta("source", "floor")
            .merge_metadata(&shared);
        assert_eq!(level.metadata["project"], "Harbour");
        assert_eq!(level.metadata["source"], "floor");
    }

    #[test]
    fn test_relationship_serializes_type_key() {
        let rel = Relationship::contains("L1", "S1");
        let value = serde_json::to_value(&rel).unwrap();
        assert_eq!(value["type"], "contains");
        assert_eq!(rel.label(), "contains:L1->S1");
    }
}
