// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plan-Lite IFC - STEP Part 21 reader for building models
//!
//! Recovers what plan ingestion needs from an IFC file: the storey
//! hierarchy, spaces with their floor areas and footprints, containment
//! edges and presentation layers. Implements [`BimReader`].
//!
//! # Features
//!
//! - **Fast scanning** of instance boundaries using `memchr`
//! - **Lazy decoding** with `nom`, only for instances that are walked
//! - **Unit aware**: lengths and areas are returned in meters
//!
//! # Example
//!
//! ```ignore
//! use plan_lite_ifc::StepReader;
//! use plan_lite_model::BimReader;
//!
//! let model = StepReader::new().read(ifc_bytes)?;
//! for storey in &model.storeys {
//!     println!("{:?} at {:?} m", storey.name, storey.elevation);
//! }
//! ```

mod footprint;
mod layers;
mod quantities;
mod resolver;
mod scanner;
mod spatial;
mod tokenizer;
mod types;
mod units;

pub use resolver::EntityStore;
pub use scanner::{parse_header, EntityIndex, EntityScanner};
pub use tokenizer::{parse_entity, Token};
pub use types::{AttributeValue, StepEntity, StepType};
pub use units::UnitScales;

use plan_lite_model::{BimDocument, BimReader, ParseError};

/// Magic line opening every STEP Part 21 exchange file
pub const STEP_MAGIC: &str = "ISO-10303-21";

/// STEP / IFC reader implementing [`BimReader`]
#[derive(Clone, Debug)]
pub struct StepReader {
    /// Whether to follow space representations down to profile footprints
    pub read_footprints: bool,
}

impl Default for StepReader {
    fn default() -> Self {
        Self::new()
    }
}

impl StepReader {
    pub fn new() -> Self {
        Self {
            read_footprints: true,
        }
    }

    /// Skip footprint extraction; spaces then rely on quantities alone
    pub fn without_footprints(mut self) -> Self {
        self.read_footprints = false;
        self
    }

    /// Decode a STEP payload that is already valid UTF-8
    pub fn read_str(&self, content: &str) -> Result<BimDocument, ParseError> {
        let body = content.trim_start_matches('\u{feff}').trim_start();
        if !body.starts_with(STEP_MAGIC) {
            return Err(ParseError::format(format!(
                "missing {} preamble",
                STEP_MAGIC
            )));
        }
        if !body.contains("DATA;") {
            return Err(ParseError::InvalidHeader("missing DATA section".into()));
        }

        let header = parse_header(body);
        let index = EntityScanner::build_index(body);
        log::debug!(
            "Indexed {} STEP instances (schema {})",
            index.len(),
            if header.schema.is_empty() { "unknown" } else { header.schema.as_str() }
        );

        let store = EntityStore::new(body, index);
        let scales = units::extract_unit_scales(&store);

        let storeys = spatial::read_storeys(&store, &scales);
        let mut spaces = spatial::read_spaces(&store);
        let areas = quantities::floor_areas(&store, &scales);
        for space in &mut spaces {
            space.area = areas.get(&space.step_id).copied();
            if self.read_footprints {
                if let Some(entity) = store.get(space.step_id) {
                    space.footprint =
                        footprint::footprint_of(&entity, &store, scales.length);
                }
            }
        }

        let document = BimDocument {
            header,
            project_name: spatial::project_name(&store),
            unit_scale: scales.length,
            storeys,
            spaces,
            containment: spatial::read_containment(&store),
            layers: layers::read_layers(&store),
            entity_count: store.len(),
        };
        log::debug!(
            "Read {} storeys, {} spaces, {} layers",
            document.storeys.len(),
            document.spaces.len(),
            document.layers.len()
        );
        Ok(document)
    }
}

impl BimReader for StepReader {
    fn read(&self, payload: &[u8]) -> Result<BimDocument, ParseError> {
        let content = std::str::from_utf8(payload)?;
        self.read_str(content)
    }

    fn name(&self) -> &'static str {
        "step"
    }
}
