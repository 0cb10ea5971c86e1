// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry graph aggregate and its builder
//!
//! Spaces and relationships may reference levels that have not been added
//! yet. References are checked once, in [`GraphBuilder::validate_integrity`],
//! which reports every violation instead of stopping at the first one.

use crate::{
    DanglingRef, EntityKind, GraphError, Level, ReferenceSite, Relationship, Result, Space,
};
use rustc_hash::FxHashMap;

/// Incremental, single-owner constructor for a [`GeometryGraph`]
#[derive(Debug, Default)]
pub struct GraphBuilder {
    levels: Vec<Level>,
    spaces: Vec<Space>,
    relationships: Vec<Relationship>,
    level_index: FxHashMap<String, usize>,
    space_index: FxHashMap<String, usize>,
}

impl GraphBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a level; fails if a level with the same id exists
    pub fn add_level(&mut self, level: Level) -> Result<()> {
        if self.level_index.contains_key(&level.id) {
            return Err(GraphError::duplicate(EntityKind::Level, level.id));
        }
        self.level_index.insert(level.id.clone(), self.levels.len());
        self.levels.push(level);
        Ok(())
    }

    /// Insert a space; its level does not need to exist yet
    pub fn add_space(&mut self, space: Space) -> Result<()> {
        if self.space_index.contains_key(&space.id) {
            return Err(GraphError::duplicate(EntityKind::Space, space.id));
        }
        self.space_index.insert(space.id.clone(), self.spaces.len());
        self.spaces.push(space);
        Ok(())
    }

    /// Record an edge; endpoints are resolved at validation time
    pub fn add_relationship(&mut self, relationship: Relationship) {
        self.relationships.push(relationship);
    }

    pub fn has_level(&self, id: &str) -> bool {
        self.level_index.contains_key(id)
    }

    pub fn has_space(&self, id: &str) -> bool {
        self.space_index.contains_key(id)
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn space_count(&self) -> usize {
        self.spaces.len()
    }

    fn resolves(&self, id: &str) -> bool {
        self.has_level(id) || self.has_space(id)
    }

    /// Check every deferred reference
    ///
    /// Returns [`GraphError::DanglingReference`] listing all unresolved
    /// space levels and relationship endpoints.
    pub fn validate_integrity(&self) -> Result<()> {
        let mut dangling = Vec::new();

        for space in &self.spaces {
            if !self.has_level(&space.level_id) {
                dangling.push(DanglingRef {
                    owner: space.id.clone(),
                    missing: space.level_id.clone(),
                    site: ReferenceSite::SpaceLevel,
                });
            }
        }

        for rel in &self.relationships {
            if !self.resolves(&rel.source_id) {
                dangling.push(DanglingRef {
                    owner: rel.label(),
                    missing: rel.source_id.clone(),
                    site: ReferenceSite::RelationshipSource,
                });
            }
            if !self.resolves(&rel.target_id) {
                dangling.push(DanglingRef {
                    owner: rel.label(),
                    missing: rel.target_id.clone(),
                    site: ReferenceSite::RelationshipTarget,
                });
            }
        }

        if dangling.is_empty() {
            Ok(())
        } else {
            Err(GraphError::DanglingReference(dangling))
        }
    }

    /// Validate and freeze into an immutable graph
    pub fn build(self) -> Result<GeometryGraph> {
        self.validate_integrity()?;
        Ok(GeometryGraph {
            levels: self.levels,
            spaces: self.spaces,
            relationships: self.relationships,
            level_index: self.level_index,
            space_index: self.space_index,
        })
    }
}

/// Validated, immutable aggregate of levels, spaces and relationships
///
/// Only obtainable from [`GraphBuilder::build`], so every instance
/// satisfies the referential invariants. Iteration follows insertion order.
#[derive(Debug, Clone)]
pub struct GeometryGraph {
    levels: Vec<Level>,
    spaces: Vec<Space>,
    relationships: Vec<Relationship>,
    level_index: FxHashMap<String, usize>,
    space_index: FxHashMap<String, usize>,
}

impl GeometryGraph {
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn spaces(&self) -> &[Space] {
        &self.spaces
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Look up a level by id
    pub fn level(&self, id: &str) -> Option<&Level> {
        self.level_index.get(id).map(|&i| &self.levels[i])
    }

    /// Look up a space by id
    pub fn space(&self, id: &str) -> Option<&Space> {
        self.space_index.get(id).map(|&i| &self.spaces[i])
    }

    /// Spaces owned by a level, in insertion order
    pub fn spaces_on_level<'a>(&'a self, level_id: &'a str) -> impl Iterator<Item = &'a Space> {
        self.spaces.iter().filter(move |s| s.level_id == level_id)
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn space_count(&self) -> usize {
        self.spaces.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty() && self.spaces.is_empty()
    }

    /// Sum of recorded space areas (m²)
    pub fn total_area_m2(&self) -> f64 {
        self.spaces.iter().filter_map(Space::area_m2).sum()
    }
}
