// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plan-Lite Model - Canonical geometry graph and reader ports
//!
//! This crate provides the format-agnostic data model that every plan
//! source (vector drawings, building models, declarative floorplans) is
//! normalized into, together with the traits that concrete file readers
//! implement.
//!
//! # Architecture
//!
//! - [`GraphBuilder`] - Incremental, deferred-reference construction API
//! - [`GeometryGraph`] - Immutable aggregate of levels, spaces and relationships
//! - [`ParsedGeometry`] - Uniform pipeline output (graph + floors + units + layers)
//! - [`GeometrySerializer`] - Plain JSON export and re-hydration of a graph
//! - [`DrawingReader`] / [`BimReader`] - Ports implemented by format readers
//!
//! # Example
//!
//! ```ignore
//! use plan_lite_model::{GraphBuilder, Level, Relationship, Space};
//!
//! let mut builder = GraphBuilder::new();
//! builder.add_space(Space::new("room-1", "Kitchen", "L1"))?;
//! builder.add_level(Level::new("L1", "Ground Floor"))?;
//! builder.add_relationship(Relationship::contains("L1", "room-1"));
//! let graph = builder.build()?;
//! assert_eq!(graph.space_count(), 1);
//! ```

pub mod bim;
pub mod drawing;
pub mod error;
pub mod graph;
pub mod parsed;
pub mod serializer;
pub mod traits;
pub mod types;

pub use bim::*;
pub use drawing::*;
pub use error::*;
pub use graph::*;
pub use parsed::*;
pub use serializer::*;
pub use traits::*;
pub use types::*;
