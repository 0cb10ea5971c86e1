// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plan-Lite Ingest - CAD/BIM plan ingestion pipeline
//!
//! Turns an uploaded DXF drawing, IFC model or JSON floorplan into one
//! validated [`GeometryGraph`](plan_lite_model::GeometryGraph) with floor,
//! unit and layer summaries.
//!
//! # Pipeline
//!
//! ```text
//! detect_format -> SourceExtractor -> GraphBuilder -> validate_integrity
//!               -> ParsedGeometry -> ImportRecord
//! ```
//!
//! # Example
//!
//! ```ignore
//! use plan_lite_ingest::Ingestor;
//!
//! let ingestor = Ingestor::discover()?;
//! let parsed = ingestor.parse(&bytes, "site.dxf", None)?;
//! for floor in &parsed.floors {
//!     println!("{}: {} units", floor.name, floor.unit_ids.len());
//! }
//! ```
//!
//! # Features
//!
//! - `dxf` (default): bundled ASCII DXF reader
//! - `ifc` (default): bundled STEP / IFC reader

pub mod config;
pub mod detect;
pub mod error;
pub mod extract;
pub mod heuristics;
pub mod job;
pub mod record;

pub use config::{ConfigError, DxfConfig, IngestConfig, LabelConfig, PlaceholderConfig};
pub use detect::detect_format;
pub use error::{IngestError, Result};
pub use extract::{
    DxfExtractor, GeometryExtractor, IfcExtractor, JsonFloorplanExtractor, SourceExtractor,
};
pub use heuristics::{classify_layer, LayerClass};
pub use job::{
    ImportJob, ImportRequest, ImportStatus, ImportStatusSink, OverlayIngestor, OverlayReceipt,
};
pub use record::ImportRecord;

use plan_lite_model::{BimReader, DrawingReader, ParsedGeometry, SourceFormat};
use std::sync::Arc;

/// Entry point: detection, extraction and record assembly
pub struct Ingestor {
    config: IngestConfig,
    drawing_reader: Option<Arc<dyn DrawingReader>>,
    bim_reader: Option<Arc<dyn BimReader>>,
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new(IngestConfig::default())
    }
}

impl Ingestor {
    /// Ingestor using the readers compiled in through cargo features
    pub fn new(config: IngestConfig) -> Self {
        Self {
            config,
            drawing_reader: default_drawing_reader(),
            bim_reader: default_bim_reader(),
        }
    }

    /// Ingestor configured from `PLAN_LITE_CONFIG`, or defaults
    pub fn discover() -> Result<Self> {
        Ok(Self::new(IngestConfig::discover()?))
    }

    /// Replace the drawing reader
    pub fn with_drawing_reader(mut self, reader: Arc<dyn DrawingReader>) -> Self {
        self.drawing_reader = Some(reader);
        self
    }

    /// Replace the building-model reader
    pub fn with_bim_reader(mut self, reader: Arc<dyn BimReader>) -> Self {
        self.bim_reader = Some(reader);
        self
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Extractor for `format`
    pub fn extractor_for(&self, format: SourceFormat) -> Result<SourceExtractor> {
        match format {
            SourceFormat::Dxf => {
                let reader = self
                    .drawing_reader
                    .clone()
                    .ok_or(IngestError::ReaderUnavailable(format))?;
                Ok(SourceExtractor::Vector(DxfExtractor::new(reader, &self.config)))
            }
            SourceFormat::Ifc => {
                let reader = self
                    .bim_reader
                    .clone()
                    .ok_or(IngestError::ReaderUnavailable(format))?;
                Ok(SourceExtractor::Bim(IfcExtractor::new(reader, &self.config)))
            }
            SourceFormat::Json => Ok(SourceExtractor::Declarative(JsonFloorplanExtractor::new(
                &self.config,
            ))),
        }
    }

    /// Detect the format of an upload and extract its geometry
    pub fn parse(
        &self,
        payload: &[u8],
        filename: &str,
        content_type: Option<&str>,
    ) -> Result<ParsedGeometry> {
        let format = detect_format(filename, content_type)?;
        log::debug!("Extracting {:?} as {}", filename, format);
        let parsed = self.extractor_for(format)?.extract(payload)?;
        log::debug!(
            "Extracted {} floors, {} units, {} layers from {:?}",
            parsed.floors.len(),
            parsed.units.len(),
            parsed.layers.len(),
            filename
        );
        Ok(parsed)
    }

    /// [`parse`](Self::parse), then build the persistence record
    pub fn import(
        &self,
        payload: &[u8],
        filename: &str,
        content_type: Option<&str>,
    ) -> Result<ImportRecord> {
        ImportRecord::from_parsed(&self.parse(payload, filename, content_type)?)
    }
}

#[cfg(feature = "dxf")]
fn default_drawing_reader() -> Option<Arc<dyn DrawingReader>> {
    Some(Arc::new(plan_lite_dxf::DxfDrawingReader::new()))
}

#[cfg(not(feature = "dxf"))]
fn default_drawing_reader() -> Option<Arc<dyn DrawingReader>> {
    None
}

#[cfg(feature = "ifc")]
fn default_bim_reader() -> Option<Arc<dyn BimReader>> {
    Some(Arc::new(plan_lite_ifc::StepReader::new()))
}

#[cfg(not(feature = "ifc"))]
fn default_bim_reader() -> Option<Arc<dyn BimReader>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_pipeline_types_are_send_sync() {
        assert_send_sync::<Ingestor>();
        assert_send_sync::<SourceExtractor>();
        assert_send_sync::<ImportRecord>();
        assert_send_sync::<ParsedGeometry>();
    }

    #[test]
    fn test_json_needs_no_reader() {
        let parsed = Ingestor::default()
            .parse(b"{}", "plan.json", None)
            .unwrap();
        assert_eq!(parsed.source_format(), Some("json"));
    }

    #[cfg(not(feature = "dxf"))]
    #[test]
    fn test_missing_drawing_reader() {
        assert!(matches!(
            Ingestor::default().parse(b"0\nEOF\n", "plan.dxf", None),
            Err(IngestError::ReaderUnavailable(SourceFormat::Dxf))
        ));
    }

    #[cfg(not(feature = "ifc"))]
    #[test]
    fn test_missing_bim_reader() {
        assert!(matches!(
            Ingestor::default().parse(b"ISO-10303-21;", "model.ifc", None),
            Err(IngestError::ReaderUnavailable(SourceFormat::Ifc))
        ));
    }
}
