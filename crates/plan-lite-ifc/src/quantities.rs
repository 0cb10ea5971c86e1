// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floor areas from element quantity sets

use crate::resolver::EntityStore;
use crate::types::StepType;
use crate::units::UnitScales;
use plan_lite_model::EntityId;
use rustc_hash::FxHashMap;

/// Quantity names in order of preference
const AREA_NAMES: [&str; 2] = ["NetFloorArea", "GrossFloorArea"];

#[derive(Default)]
struct AreaCandidates {
    /// Index into `AREA_NAMES`, or `AREA_NAMES.len()` for any other area
    best_rank: usize,
    value: Option<f64>,
}

impl AreaCandidates {
    fn offer(&mut self, name: Option<&str>, value: f64) {
        let rank = name
            .and_then(|n| AREA_NAMES.iter().position(|a| a.eq_ignore_ascii_case(n)))
            .unwrap_or(AREA_NAMES.len());
        if self.value.is_none() || rank < self.best_rank {
            self.best_rank = rank;
            self.value = Some(value);
        }
    }
}

/// Floor area (m²) per object that has an IfcQuantityArea attached
///
/// Prefers `NetFloorArea`, then `GrossFloorArea`, then the first other
/// area quantity found.
pub fn floor_areas(store: &EntityStore<'_>, scales: &UnitScales) -> FxHashMap<EntityId, f64> {
    let mut candidates: FxHashMap<EntityId, AreaCandidates> = FxHashMap::default();

    // IFCRELDEFINESBYPROPERTIES: RelatedObjects at 4, RelatingPropertyDefinition at 5
    for rel in store.entities_of(&StepType::RelDefinesByProperties) {
        let Some(qset) = rel.get(5).and_then(|attr| store.resolve(attr)) else {
            continue;
        };
        if qset.step_type != StepType::ElementQuantity {
            continue;
        }
        let related = rel.get_refs(4);

        // IFCELEMENTQUANTITY: Quantities at 5
        for quantity in qset.get_refs(5).into_iter().filter_map(|id| store.get(id)) {
            if quantity.step_type != StepType::QuantityArea {
                continue;
            }
            // IFCQUANTITYAREA: Name at 0, AreaValue at 3
            let Some(value) = quantity.get_float(3) else {
                continue;
            };
            for &object in &related {
                candidates
                    .entry(object)
                    .or_default()
                    .offer(quantity.get_string(0), value * scales.area);
            }
        }
    }

    candidates
        .into_iter()
        .filter_map(|(id, c)| c.value.map(|v| (id, v)))
        .collect()
}
