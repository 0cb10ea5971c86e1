// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reader ports
//!
//! Format readers live in their own crates and are plugged into the
//! ingestion pipeline through these traits, so the pipeline can be built
//! without any particular reader compiled in.

use crate::{BimDocument, DrawingDocument, ParseError};

/// Decodes a 2D vector drawing payload
///
/// # Example
///
/// ```ignore
/// use plan_lite_model::DrawingReader;
///
/// let reader: Box<dyn DrawingReader> = get_reader();
/// let drawing = reader.read(bytes)?;
/// println!("{} layers", drawing.layers.len());
/// ```
pub trait DrawingReader: Send + Sync {
    /// Decode `payload` into layers, polylines and header variables
    ///
    /// # Returns
    /// A [`DrawingDocument`] on success, or a [`ParseError`] when the
    /// payload is not a readable drawing
    fn read(&self, payload: &[u8]) -> Result<DrawingDocument, ParseError>;

    /// Short reader name used in logs
    fn name(&self) -> &'static str;
}

/// Decodes a building-information-model payload
pub trait BimReader: Send + Sync {
    /// Decode `payload` into storeys, spaces, containment and layers
    ///
    /// # Returns
    /// A [`BimDocument`] on success, or a [`ParseError`] when the payload is
    /// not a readable model
    fn read(&self, payload: &[u8]) -> Result<BimDocument, ParseError>;

    /// Short reader name used in logs
    fn name(&self) -> &'static str;
}
