// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unit scale extraction

use crate::resolver::EntityStore;
use crate::types::{StepEntity, StepType};

/// Scale factors converting model units to SI
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitScales {
    /// Length unit to meters
    pub length: f64,
    /// Area unit to square meters
    pub area: f64,
}

impl Default for UnitScales {
    fn default() -> Self {
        Self {
            length: 1.0,
            area: 1.0,
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Dimension {
    Length,
    Area,
}

impl Dimension {
    fn unit_type(self) -> &'static str {
        match self {
            Dimension::Length => "LENGTHUNIT",
            Dimension::Area => "AREAUNIT",
        }
    }
}

/// Read length and area scales from the project's unit assignment
///
/// Falls back to 1.0 for any unit that is missing or not understood.
pub fn extract_unit_scales(store: &EntityStore<'_>) -> UnitScales {
    let mut scales = UnitScales::default();

    let Some(project) = store.entities_of(&StepType::Project).into_iter().next() else {
        return scales;
    };
    // IFCPROJECT.UnitsInContext
    let Some(assignment) = project.get(8).and_then(|attr| store.resolve(attr)) else {
        return scales;
    };

    let units = assignment.get_refs(0);
    let mut length = None;
    let mut area = None;
    for unit in units.into_iter().filter_map(|id| store.get(id)) {
        if length.is_none() {
            length = unit_scale(&unit, Dimension::Length, store);
        }
        if area.is_none() {
            area = unit_scale(&unit, Dimension::Area, store);
        }
    }

    if let Some(length) = length {
        scales.length = length;
    }
    // Without a declared area unit, areas follow the length unit
    scales.area = area.unwrap_or(scales.length * scales.length);
    log::debug!("Unit scales: length {}, area {}", scales.length, scales.area);
    scales
}

fn unit_scale(unit: &StepEntity, dimension: Dimension, store: &EntityStore<'_>) -> Option<f64> {
    if unit.get_enum(1)? != dimension.unit_type() {
        return None;
    }
    match unit.step_type {
        StepType::SiUnit => si_unit_scale(unit, dimension),
        StepType::ConversionBasedUnit => conversion_unit_scale(unit, dimension, store),
        _ => None,
    }
}

/// IFCSIUNIT(*, UnitType, Prefix, Name)
fn si_unit_scale(unit: &StepEntity, dimension: Dimension) -> Option<f64> {
    let base = match (dimension, unit.get_enum(3)?) {
        (Dimension::Length, "METRE") | (Dimension::Area, "SQUARE_METRE") => 1.0,
        _ => return None,
    };
    let prefix = unit.get_enum(2).map(prefix_factor).unwrap_or(1.0);
    Some(match dimension {
        Dimension::Length => base * prefix,
        Dimension::Area => base * prefix * prefix,
    })
}

fn prefix_factor(prefix: &str) -> f64 {
    match prefix {
        "EXA" => 1e18,
        "PETA" => 1e15,
        "TERA" => 1e12,
        "GIGA" => 1e9,
        "MEGA" => 1e6,
        "KILO" => 1e3,
        "HECTO" => 1e2,
        "DECA" => 1e1,
        "DECI" => 1e-1,
        "CENTI" => 1e-2,
        "MILLI" => 1e-3,
        "MICRO" => 1e-6,
        "NANO" => 1e-9,
        "PICO" => 1e-12,
        "FEMTO" => 1e-15,
        "ATTO" => 1e-18,
        _ => 1.0,
    }
}

/// IFCCONVERSIONBASEDUNIT(Dimensions, UnitType, Name, ConversionFactor)
fn conversion_unit_scale(
    unit: &StepEntity,
    dimension: Dimension,
    store: &EntityStore<'_>,
) -> Option<f64> {
    // IFCMEASUREWITHUNIT(ValueComponent, UnitComponent)
    let factor = store.get(unit.get_ref(3)?)?;
    if factor.step_type != StepType::MeasureWithUnit {
        return None;
    }
    let value = factor.get_float(0)?;
    let base = factor
        .get_ref(1)
        .and_then(|id| store.get(id))
        .and_then(|base| unit_scale(&base, dimension, store))
        .unwrap_or(1.0);
    Some(value * base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::EntityScanner;
    use approx::assert_relative_eq;

    fn scales_of(data: &str) -> UnitScales {
        let content = format!("ISO-10303-21;\nHEADER;\nENDSEC;\nDATA;\n{}\nENDSEC;\n", data);
        let store = EntityStore::new(&content, EntityScanner::build_index(&content));
        extract_unit_scales(&store)
    }

    #[test]
    fn test_millimetre_project() {
        let scales = scales_of(
            "#1=IFCPROJECT('g',$,'P',$,$,$,$,$,#2);\n\
             #2=IFCUNITASSIGNMENT((#3));\n\
             #3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);",
        );
        assert_relative_eq!(scales.length, 0.001);
        assert_relative_eq!(scales.area, 1e-6);
    }

    #[test]
    fn test_explicit_area_unit() {
        let scales = scales_of(
            "#1=IFCPROJECT('g',$,'P',$,$,$,$,$,#2);\n\
             #2=IFCUNITASSIGNMENT((#3,#4));\n\
             #3=IFCSIUNIT(*,.LENGTHUNIT.,.MILLI.,.METRE.);\n\
             #4=IFCSIUNIT(*,.AREAUNIT.,$,.SQUARE_METRE.);",
        );
        assert_relative_eq!(scales.length, 0.001);
        assert_relative_eq!(scales.area, 1.0);
    }

    #[test]
    fn test_conversion_based_foot() {
        let scales = scales_of(
            "#1=IFCPROJECT('g',$,'P',$,$,$,$,$,#2);\n\
             #2=IFCUNITASSIGNMENT((#5));\n\
             #3=IFCSIUNIT(*,.LENGTHUNIT.,$,.METRE.);\n\
             #4=IFCMEASUREWITHUNIT(IFCLENGTHMEASURE(0.3048),#3);\n\
             #5=IFCCONVERSIONBASEDUNIT(#6,.LENGTHUNIT.,'FOOT',#4);",
        );
        assert_relative_eq!(scales.length, 0.3048);
    }

    #[test]
    fn test_missing_project_defaults_to_metres() {
        assert_eq!(scales_of("#1=IFCWALL('g');"), UnitScales::default());
    }
}
