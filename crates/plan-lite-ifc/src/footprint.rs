// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plan footprints from extruded body representations
//!
//! Follows `Representation -> IfcShapeRepresentation -> IfcExtrudedAreaSolid
//! -> profile` and returns the profile polygon in meters. Only rectangle and
//! polyline-bounded profiles are understood; other shapes yield no footprint.

use crate::resolver::EntityStore;
use crate::types::{StepEntity, StepType};
use plan_lite_model::Point2;

/// Footprint of a product (space, slab, ...) in meters
///
/// `product` must carry its Representation at index 6.
pub fn footprint_of(
    product: &StepEntity,
    store: &EntityStore<'_>,
    length_scale: f64,
) -> Vec<Point2> {
    let Some(shape) = product.get(6).and_then(|attr| store.resolve(attr)) else {
        return Vec::new();
    };
    if shape.step_type != StepType::ProductDefinitionShape {
        return Vec::new();
    }

    // IFCPRODUCTDEFINITIONSHAPE: Representations at 2
    for rep in shape.get_refs(2).into_iter().filter_map(|id| store.get(id)) {
        if rep.step_type != StepType::ShapeRepresentation {
            continue;
        }
        // IFCSHAPEREPRESENTATION: Items at 3
        for item in rep.get_refs(3).into_iter().filter_map(|id| store.get(id)) {
            if item.step_type != StepType::ExtrudedAreaSolid {
                continue;
            }
            // IFCEXTRUDEDAREASOLID: SweptArea at 0
            let Some(profile) = item.get(0).and_then(|attr| store.resolve(attr)) else {
                continue;
            };
            let points = profile_points(&profile, store);
            if points.len() >= 3 {
                return points.into_iter().map(|p| p.scaled(length_scale)).collect();
            }
        }
    }

    Vec::new()
}

fn profile_points(profile: &StepEntity, store: &EntityStore<'_>) -> Vec<Point2> {
    match profile.step_type {
        StepType::RectangleProfileDef => rectangle(profile, store),
        StepType::ArbitraryClosedProfileDef => {
            // OuterCurve at 2
            match profile.get(2).and_then(|attr| store.resolve(attr)) {
                Some(curve) => polyline(&curve, store),
                None => Vec::new(),
            }
        }
        _ => Vec::new(),
    }
}

/// IFCRECTANGLEPROFILEDEF(ProfileType, ProfileName, Position, XDim, YDim)
///
/// Centered on the profile position's location.
fn rectangle(profile: &StepEntity, store: &EntityStore<'_>) -> Vec<Point2> {
    let (Some(x_dim), Some(y_dim)) = (profile.get_float(3), profile.get_float(4)) else {
        return Vec::new();
    };
    let origin = profile
        .get(2)
        .and_then(|attr| store.resolve(attr))
        .and_then(|placement| placement_location(&placement, store))
        .unwrap_or_default();

    let (hx, hy) = (x_dim / 2.0, y_dim / 2.0);
    vec![
        Point2::new(origin.x - hx, origin.y - hy),
        Point2::new(origin.x + hx, origin.y - hy),
        Point2::new(origin.x + hx, origin.y + hy),
        Point2::new(origin.x - hx, origin.y + hy),
    ]
}

/// IFCAXIS2PLACEMENT2D: Location at 0
fn placement_location(placement: &StepEntity, store: &EntityStore<'_>) -> Option<Point2> {
    if placement.step_type != StepType::Axis2Placement2D {
        return None;
    }
    let point = store.resolve(placement.get(0)?)?;
    cartesian_point(&point)
}

/// IFCPOLYLINE: Points at 0; a repeated closing point is dropped
fn polyline(curve: &StepEntity, store: &EntityStore<'_>) -> Vec<Point2> {
    if curve.step_type != StepType::Polyline {
        return Vec::new();
    }
    let mut points: Vec<Point2> = curve
        .get_refs(0)
        .into_iter()
        .filter_map(|id| store.get(id))
        .filter_map(|p| cartesian_point(&p))
        .collect();

    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

/// IFCCARTESIANPOINT: Coordinates at 0
fn cartesian_point(point: &StepEntity) -> Option<Point2> {
    if point.step_type != StepType::CartesianPoint {
        return None;
    }
    let coords = point.get_list(0)?;
    let x = coords.first()?.as_float()?;
    let y = coords.get(1)?.as_float()?;
    Some(Point2::new(x, y))
}
