// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Layer-name and unit-scale heuristics for vector drawings

use crate::config::DxfConfig;
use plan_lite_model::Bounds2;

/// Role of a drawing layer, guessed from its name
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerClass {
    /// Outlines of one floor / level
    Floor,
    /// Site or plot boundary
    Site,
    Other,
}

impl LayerClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerClass::Floor => "floor",
            LayerClass::Site => "site",
            LayerClass::Other => "other",
        }
    }
}

/// Classify a layer by case-insensitive substring match
///
/// Floor tokens are tried first, so `FLOOR BOUNDARY` is a floor layer.
pub fn classify_layer(name: &str, floor_tokens: &[String], site_tokens: &[String]) -> LayerClass {
    let lower = name.to_lowercase();
    let matches = |tokens: &[String]| {
        tokens
            .iter()
            .filter(|t| !t.is_empty())
            .any(|t| lower.contains(&t.to_lowercase()))
    };

    if matches(floor_tokens) {
        LayerClass::Floor
    } else if matches(site_tokens) {
        LayerClass::Site
    } else {
        LayerClass::Other
    }
}

/// Where a unit-to-meter scale came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleSource {
    /// `$INSUNITS` header variable
    Header,
    /// Bounding-box extent heuristic
    Extent,
    /// Nothing to measure; meters assumed
    Assumed,
}

impl ScaleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScaleSource::Header => "insunits",
            ScaleSource::Extent => "extent_heuristic",
            ScaleSource::Assumed => "assumed",
        }
    }
}

/// Meters per drawing unit for an `$INSUNITS` code
///
/// Returns `None` for unitless (0) and for codes without a fixed length.
pub fn insunits_scale(code: i32) -> Option<f64> {
    let scale = match code {
        1 => 0.0254, // inches
        2 => 0.3048, // feet
        3 => 1609.344, // miles
        4 => 0.001, // millimetres
        5 => 0.01, // centimetres
        6 => 1.0, // meters
        7 => 1000.0, // kilometres
        8 => 2.54e-8, // microinches
        9 => 2.54e-5, // mils
        10 => 0.9144, // yards
        11 => 1e-10, // angstroms
        12 => 1e-9, // nanometres
        13 => 1e-6, // microns
        14 => 0.1, // decimetres
        15 => 10.0, // decametres
        16 => 100.0, // hectometres
        17 => 1e9, // gigametres
        18 => 1.495_978_707e11, // astronomical units
        19 => 9.460_730_472_580_8e15, // light years
        20 => 3.085_677_581e16, // parsecs
        21 => 0.304_800_609_6, // US survey feet
        _ => return None,
    };
    Some(scale)
}

/// Resolve the drawing scale from the header, or guess it from the extent
pub fn resolve_scale(
    insunits: Option<i32>,
    extent: Option<Bounds2>,
    config: &DxfConfig,
) -> (f64, ScaleSource) {
    if let Some(scale) = insunits.and_then(insunits_scale) {
        return (scale, ScaleSource::Header);
    }
    match extent {
        Some(bounds) if bounds.max_extent() >= config.millimetre_threshold => {
            (config.default_scale, ScaleSource::Extent)
        }
        Some(_) => (1.0, ScaleSource::Extent),
        None => (1.0, ScaleSource::Assumed),
    }
}
