// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoded STEP instances
//!
//! Only the entity types that plan extraction walks are named; everything
//! else is kept as [`StepType::Other`] with its original type name.

use plan_lite_model::EntityId;
use std::fmt;

/// STEP entity type
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum StepType {
    // Spatial structure
    Project,
    Site,
    Building,
    BuildingStorey,
    Space,

    // Relationships
    RelAggregates,
    RelContainedInSpatialStructure,
    RelDefinesByProperties,

    // Quantities
    ElementQuantity,
    QuantityArea,

    // Units
    UnitAssignment,
    SiUnit,
    ConversionBasedUnit,
    MeasureWithUnit,

    // Presentation
    PresentationLayerAssignment,
    PresentationLayerWithStyle,

    // Shape
    ProductDefinitionShape,
    ShapeRepresentation,
    ExtrudedAreaSolid,
    RectangleProfileDef,
    ArbitraryClosedProfileDef,
    Polyline,
    CartesianPoint,
    Axis2Placement2D,

    /// Any other type, upper-cased
    Other(String),
}

impl StepType {
    /// Map a type keyword (any case) to a [`StepType`]
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "IFCPROJECT" => StepType::Project,
            "IFCSITE" => StepType::Site,
            "IFCBUILDING" => StepType::Building,
            "IFCBUILDINGSTOREY" => StepType::BuildingStorey,
            "IFCSPACE" => StepType::Space,
            "IFCRELAGGREGATES" => StepType::RelAggregates,
            "IFCRELCONTAINEDINSPATIALSTRUCTURE" => StepType::RelContainedInSpatialStructure,
            "IFCRELDEFINESBYPROPERTIES" => StepType::RelDefinesByProperties,
            "IFCELEMENTQUANTITY" => StepType::ElementQuantity,
            "IFCQUANTITYAREA" => StepType::QuantityArea,
            "IFCUNITASSIGNMENT" => StepType::UnitAssignment,
            "IFCSIUNIT" => StepType::SiUnit,
            "IFCCONVERSIONBASEDUNIT" => StepType::ConversionBasedUnit,
            "IFCMEASUREWITHUNIT" => StepType::MeasureWithUnit,
            "IFCPRESENTATIONLAYERASSIGNMENT" => StepType::PresentationLayerAssignment,
            "IFCPRESENTATIONLAYERWITHSTYLE" => StepType::PresentationLayerWithStyle,
            "IFCPRODUCTDEFINITIONSHAPE" => StepType::ProductDefinitionShape,
            "IFCSHAPEREPRESENTATION" => StepType::ShapeRepresentation,
            "IFCEXTRUDEDAREASOLID" => StepType::ExtrudedAreaSolid,
            "IFCRECTANGLEPROFILEDEF" => StepType::RectangleProfileDef,
            "IFCARBITRARYCLOSEDPROFILEDEF" => StepType::ArbitraryClosedProfileDef,
            "IFCPOLYLINE" => StepType::Polyline,
            "IFCCARTESIANPOINT" => StepType::CartesianPoint,
            "IFCAXIS2PLACEMENT2D" => StepType::Axis2Placement2D,
            other => StepType::Other(other.to_string()),
        }
    }

    /// Upper-case STEP keyword
    pub fn name(&self) -> &str {
        match self {
            StepType::Project => "IFCPROJECT",
            StepType::Site => "IFCSITE",
            StepType::Building => "IFCBUILDING",
            StepType::BuildingStorey => "IFCBUILDINGSTOREY",
            StepType::Space => "IFCSPACE",
            StepType::RelAggregates => "IFCRELAGGREGATES",
            StepType::RelContainedInSpatialStructure => "IFCRELCONTAINEDINSPATIALSTRUCTURE",
            StepType::RelDefinesByProperties => "IFCRELDEFINESBYPROPERTIES",
            StepType::ElementQuantity => "IFCELEMENTQUANTITY",
            StepType::QuantityArea => "IFCQUANTITYAREA",
            StepType::UnitAssignment => "IFCUNITASSIGNMENT",
            StepType::SiUnit => "IFCSIUNIT",
            StepType::ConversionBasedUnit => "IFCCONVERSIONBASEDUNIT",
            StepType::MeasureWithUnit => "IFCMEASUREWITHUNIT",
            StepType::PresentationLayerAssignment => "IFCPRESENTATIONLAYERASSIGNMENT",
            StepType::PresentationLayerWithStyle => "IFCPRESENTATIONLAYERWITHSTYLE",
            StepType::ProductDefinitionShape => "IFCPRODUCTDEFINITIONSHAPE",
            StepType::ShapeRepresentation => "IFCSHAPEREPRESENTATION",
            StepType::ExtrudedAreaSolid => "IFCEXTRUDEDAREASOLID",
            StepType::RectangleProfileDef => "IFCRECTANGLEPROFILEDEF",
            StepType::ArbitraryClosedProfileDef => "IFCARBITRARYCLOSEDPROFILEDEF",
            StepType::Polyline => "IFCPOLYLINE",
            StepType::CartesianPoint => "IFCCARTESIANPOINT",
            StepType::Axis2Placement2D => "IFCAXIS2PLACEMENT2D",
            StepType::Other(name) => name,
        }
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decoded attribute value
#[derive(Clone, Debug, PartialEq, Default)]
pub enum AttributeValue {
    /// `$`
    #[default]
    Null,
    /// `*`
    Derived,
    /// `#123`
    EntityRef(EntityId),
    Integer(i64),
    Float(f64),
    /// Quoted string with `''` already unescaped
    String(String),
    /// `.VALUE.`
    Enum(String),
    List(Vec<AttributeValue>),
    /// Typed value like `IFCLABEL('text')`
    TypedValue(String, Vec<AttributeValue>),
}

impl AttributeValue {
    pub fn as_entity_ref(&self) -> Option<EntityId> {
        match self {
            AttributeValue::EntityRef(id) => Some(*id),
            _ => None,
        }
    }

    /// String content, looking through typed wrappers
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            AttributeValue::TypedValue(_, args) => args.first()?.as_string(),
            _ => None,
        }
    }

    /// Numeric content, looking through typed wrappers
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Integer(i) => Some(*i as f64),
            AttributeValue::TypedValue(_, args) => args.first()?.as_float(),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&str> {
        match self {
            AttributeValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

/// One decoded `#id=TYPE(...)` instance
#[derive(Clone, Debug)]
pub struct StepEntity {
    pub id: EntityId,
    pub step_type: StepType,
    pub attributes: Vec<AttributeValue>,
}

impl StepEntity {
    pub fn get(&self, index: usize) -> Option<&AttributeValue> {
        self.attributes.get(index)
    }

    pub fn get_ref(&self, index: usize) -> Option<EntityId> {
        self.get(index).and_then(AttributeValue::as_entity_ref)
    }

    /// Non-empty string at `index`
    pub fn get_string(&self, index: usize) -> Option<&str> {
        self.get(index)
            .and_then(AttributeValue::as_string)
            .filter(|s| !s.trim().is_empty())
    }

    pub fn get_float(&self, index: usize) -> Option<f64> {
        self.get(index).and_then(AttributeValue::as_float)
    }

    pub fn get_enum(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(AttributeValue::as_enum)
    }

    pub fn get_list(&self, index: usize) -> Option<&[AttributeValue]> {
        self.get(index).and_then(AttributeValue::as_list)
    }

    /// Entity references in the list at `index`, skipping anything else
    pub fn get_refs(&self, index: usize) -> Vec<EntityId> {
        self.get_list(index)
            .map(|list| list.iter().filter_map(AttributeValue::as_entity_ref).collect())
            .unwrap_or_default()
    }
}
