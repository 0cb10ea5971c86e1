// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Presentation layer assignments

use crate::resolver::EntityStore;
use crate::types::StepType;
use plan_lite_model::BimLayerAssignment;

/// Layers in file order, with and without style
///
/// IFCPRESENTATIONLAYERASSIGNMENT(Name, Description, AssignedItems, Identifier)
pub fn read_layers(store: &EntityStore<'_>) -> Vec<BimLayerAssignment> {
    let mut layers: Vec<_> = [
        StepType::PresentationLayerAssignment,
        StepType::PresentationLayerWithStyle,
    ]
    .iter()
    .flat_map(|t| store.entities_of(t))
    .collect();
    layers.sort_by_key(|layer| layer.id);

    layers
        .iter()
        .filter_map(|layer| {
            Some(BimLayerAssignment {
                name: layer.get_string(0)?.to_string(),
                identifier: layer.get_string(3).map(str::to_string),
                item_count: layer.get_refs(2).len(),
            })
        })
        .collect()
}
