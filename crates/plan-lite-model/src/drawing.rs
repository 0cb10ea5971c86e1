// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoded 2D drawing, as returned by a [`crate::DrawingReader`]

use crate::Point2;
use std::collections::BTreeMap;

/// Drawing header variables relevant to ingestion
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DrawingHeader {
    /// `$INSUNITS` code, when declared
    pub insunits: Option<i32>,
    /// `$ACADVER` string, when declared
    pub acad_version: Option<String>,
}

/// Layer table entry
#[derive(Clone, Debug, PartialEq)]
pub struct DrawingLayer {
    pub name: String,
    /// ACI color index (negative when the layer is switched off)
    pub color: Option<i32>,
    pub linetype: Option<String>,
}

impl DrawingLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
            linetype: None,
        }
    }
}

/// Lightweight or classic polyline, flattened to its vertices
#[derive(Clone, Debug, PartialEq)]
pub struct DrawingPolyline {
    pub handle: Option<String>,
    pub layer: String,
    /// Vertices in drawing units
    pub vertices: Vec<Point2>,
    /// Closed flag (bit 1 of group 70)
    pub closed: bool,
    /// Entity lives in paper space (group 67 = 1)
    pub paper_space: bool,
}

impl DrawingPolyline {
    /// True for a closed flag, or for coincident first and last vertices
    pub fn is_closed_outline(&self, tolerance: f64) -> bool {
        if self.vertices.len() < 3 {
            return false;
        }
        if self.closed {
            return true;
        }
        match (self.vertices.first(), self.vertices.last()) {
            (Some(first), Some(last)) => {
                self.vertices.len() > 3 && first.approx_eq(last, tolerance)
            }
            _ => false,
        }
    }

    /// Vertices without a repeated closing point
    pub fn ring(&self, tolerance: f64) -> &[Point2] {
        let repeats_first = match (self.vertices.first(), self.vertices.last()) {
            (Some(first), Some(last)) => {
                self.vertices.len() > 1 && first.approx_eq(last, tolerance)
            }
            _ => false,
        };
        if repeats_first {
            &self.vertices[..self.vertices.len() - 1]
        } else {
            &self.vertices
        }
    }
}

/// Everything a drawing reader recovers from one payload
#[derive(Clone, Debug, Default)]
pub struct DrawingDocument {
    pub header: DrawingHeader,
    /// Layer table, in declaration order
    pub layers: Vec<DrawingLayer>,
    /// Model and paper space polylines, in file order
    pub polylines: Vec<DrawingPolyline>,
    /// Entity count per layer, all entity types included
    pub entity_counts: BTreeMap<String, usize>,
    /// Total number of entities in the ENTITIES section
    pub entity_count: usize,
}

impl DrawingDocument {
    /// Look up a layer table entry by name
    pub fn layer(&self, name: &str) -> Option<&DrawingLayer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Polylines in model space only
    pub fn model_space_polylines(&self) -> impl Iterator<Item = &DrawingPolyline> {
        self.polylines.iter().filter(|p| !p.paper_space)
    }
}
