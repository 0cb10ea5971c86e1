// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lazy, cached instance lookup

use crate::scanner::EntityIndex;
use crate::tokenizer::parse_entity;
use crate::types::{AttributeValue, StepEntity, StepType};
use plan_lite_model::EntityId;
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};

/// Decodes instances on first access and caches them
pub struct EntityStore<'a> {
    content: &'a str,
    index: EntityIndex,
    cache: RwLock<FxHashMap<u32, Arc<StepEntity>>>,
}

impl<'a> EntityStore<'a> {
    pub fn new(content: &'a str, index: EntityIndex) -> Self {
        Self {
            content,
            index,
            cache: RwLock::new(FxHashMap::default()),
        }
    }

    /// Number of indexed instances
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Decode instance `id`, or `None` when missing or malformed
    pub fn get(&self, id: EntityId) -> Option<Arc<StepEntity>> {
        if let Ok(cache) = self.cache.read() {
            if let Some(cached) = cache.get(&id.0) {
                return Some(Arc::clone(cached));
            }
        }

        let &(start, end) = self.index.offsets.get(&id.0)?;
        let entity = match parse_entity(&self.content[start..end]) {
            Ok(entity) => Arc::new(entity),
            Err(message) => {
                log::debug!("Skipping undecodable instance #{}: {}", id.0, message);
                return None;
            }
        };

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(id.0, Arc::clone(&entity));
        }
        Some(entity)
    }

    /// Resolve a reference attribute
    pub fn resolve(&self, attr: &AttributeValue) -> Option<Arc<StepEntity>> {
        self.get(attr.as_entity_ref()?)
    }

    /// All decodable instances of a type, in file order
    pub fn entities_of(&self, step_type: &StepType) -> Vec<Arc<StepEntity>> {
        self.index
            .ids_of(step_type)
            .iter()
            .filter_map(|&id| self.get(id))
            .collect()
    }

    pub fn count_of(&self, step_type: &StepType) -> usize {
        self.index.ids_of(step_type).len()
    }
}
