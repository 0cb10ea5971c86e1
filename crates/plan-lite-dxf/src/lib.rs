// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plan-Lite DXF - ASCII DXF reader for 2D plan drawings
//!
//! Reads the parts of a drawing that plan ingestion consumes: the
//! `$INSUNITS` / `$ACADVER` header variables, the layer table and every
//! `LWPOLYLINE` / `POLYLINE` entity. Other entities are only counted per
//! layer. Implements [`DrawingReader`].
//!
//! ```ignore
//! use plan_lite_dxf::DxfDrawingReader;
//! use plan_lite_model::DrawingReader;
//!
//! let drawing = DxfDrawingReader::new().read(bytes)?;
//! let outlines = drawing.polylines.iter().filter(|p| p.closed).count();
//! ```

mod reader;

use plan_lite_model::{
    DrawingDocument, DrawingHeader, DrawingLayer, DrawingPolyline, DrawingReader, ParseError,
    Point2,
};
use reader::{parse_f64, parse_i32, Pair, PairReader};
use thiserror::Error;

/// Sentinel opening every binary DXF file
const BINARY_SENTINEL: &[u8] = b"AutoCAD Binary DXF";

/// POLYLINE flags marking 3D meshes and polyface meshes
const MESH_FLAGS: i32 = 16 | 64;

#[derive(Debug, Error)]
enum DxfError {
    #[error("unsupported DXF feature: {feature}")]
    Unsupported { feature: String },
    #[error("line {line}: {message}")]
    Invalid { line: usize, message: String },
}

impl DxfError {
    fn unsupported(feature: impl Into<String>) -> Self {
        Self::Unsupported {
            feature: feature.into(),
        }
    }

    fn invalid(line: usize, message: impl Into<String>) -> Self {
        Self::Invalid {
            line,
            message: message.into(),
        }
    }
}

impl From<DxfError> for ParseError {
    fn from(err: DxfError) -> Self {
        match err {
            err @ DxfError::Unsupported { .. } => ParseError::format(err.to_string()),
            DxfError::Invalid { line, message } => ParseError::record(line, message),
        }
    }
}

/// ASCII DXF reader implementing [`DrawingReader`]
#[derive(Clone, Copy, Debug, Default)]
pub struct DxfDrawingReader;

impl DxfDrawingReader {
    pub fn new() -> Self {
        Self
    }

    /// Decode DXF text
    pub fn read_str(&self, source: &str) -> Result<DrawingDocument, ParseError> {
        let source = source.trim_start_matches('\u{feff}');
        let document = DxfParser::new(source).parse()?;
        log::debug!(
            "DXF: {} layers, {} polylines, {} entities",
            document.layers.len(),
            document.polylines.len(),
            document.entity_count
        );
        Ok(document)
    }
}

impl DrawingReader for DxfDrawingReader {
    fn read(&self, payload: &[u8]) -> Result<DrawingDocument, ParseError> {
        if payload.starts_with(BINARY_SENTINEL) {
            return Err(DxfError::unsupported("binary DXF").into());
        }
        let source = std::str::from_utf8(payload)?;
        self.read_str(source)
    }

    fn name(&self) -> &'static str {
        "dxf"
    }
}

/// Attributes shared by every entity
#[derive(Default)]
struct Common {
    handle: Option<String>,
    layer: Option<String>,
    paper_space: bool,
}

impl Common {
    /// Absorb a common group code; returns false for anything else
    fn absorb(&mut self, code: i32, value: &str) -> bool {
        match code {
            5 => self.handle = Some(value.trim().to_string()),
            8 => self.layer = Some(value.trim().to_string()),
            67 => self.paper_space = value.trim() == "1",
            _ => return false,
        }
        true
    }

    fn layer_name(&self) -> String {
        self.layer.clone().unwrap_or_else(|| "0".to_string())
    }
}

struct DxfParser<'a> {
    reader: PairReader<'a>,
    document: DrawingDocument,
    saw_section: bool,
}

impl<'a> DxfParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            reader: PairReader::new(source),
            document: DrawingDocument::default(),
            saw_section: false,
        }
    }

    fn parse(mut self) -> Result<DrawingDocument, DxfError> {
        while let Some((code, value)) = self.reader.next_pair()? {
            if code != 0 {
                return Err(DxfError::invalid(
                    self.reader.line(),
                    format!("unexpected group code {} (expected 0 for SECTION or EOF)", code),
                ));
            }
            match value.trim() {
                "SECTION" => {
                    self.saw_section = true;
                    let name = match self.reader.next_pair()? {
                        Some((2, name)) => name,
                        _ => {
                            return Err(DxfError::invalid(
                                self.reader.line(),
                                "SECTION without a name (group code 2)",
                            ))
                        }
                    };
                    match name.trim() {
                        "HEADER" => self.parse_header()?,
                        "TABLES" => self.parse_tables()?,
                        "ENTITIES" => self.parse_entities()?,
                        _ => self.skip_section()?,
                    }
                }
                "EOF" => break,
                other => {
                    return Err(DxfError::invalid(
                        self.reader.line(),
                        format!("unexpected marker {} (expected SECTION or EOF)", other),
                    ))
                }
            }
        }

        if !self.saw_section {
            return Err(DxfError::invalid(self.reader.line(), "no SECTION found"));
        }
        Ok(self.document)
    }

    fn next_required(&mut self, context: &str) -> Result<Pair, DxfError> {
        self.reader.next_pair()?.ok_or_else(|| {
            DxfError::invalid(self.reader.line(), format!("{} ends without ENDSEC", context))
        })
    }

    fn skip_section(&mut self) -> Result<(), DxfError> {
        loop {
            let (code, value) = self.next_required("SECTION")?;
            if code == 0 && value.trim() == "ENDSEC" {
                return Ok(());
            }
        }
    }

    /// `9 $NAME` followed by the variable's value pairs
    fn parse_header(&mut self) -> Result<(), DxfError> {
        let mut header = DrawingHeader::default();
        let mut variable = String::new();

        loop {
            let (code, value) = self.next_required("HEADER")?;
            match code {
                0 if value.trim() == "ENDSEC" => break,
                9 => variable = value.trim().to_string(),
                70 if variable == "$INSUNITS" => {
                    header.insunits = Some(parse_i32(&value, self.reader.line(), "$INSUNITS")?);
                }
                1 if variable == "$ACADVER" => header.acad_version = Some(value.trim().to_string()),
                _ => {}
            }
        }

        self.document.header = header;
        Ok(())
    }

    /// Collects LAYER records; every other table is skipped
    fn parse_tables(&mut self) -> Result<(), DxfError> {
        let mut current: Option<DrawingLayer> = None;

        loop {
            let (code, value) = self.next_required("TABLES")?;
            if code == 0 {
                if let Some(layer) = current.take() {
                    if !layer.name.is_empty() {
                        self.document.layers.push(layer);
                    }
                }
                match value.trim() {
                    "ENDSEC" => break,
                    "LAYER" => current = Some(DrawingLayer::new("")),
                    _ => {}
                }
                continue;
            }

            if let Some(layer) = current.as_mut() {
                match code {
                    2 => layer.name = value.trim().to_string(),
                    62 => layer.color = Some(parse_i32(&value, self.reader.line(), "layer color")?),
                    6 => layer.linetype = Some(value.trim().to_string()),
                    _ => {}
                }
            }
        }

        Ok(())
    }

    fn parse_entities(&mut self) -> Result<(), DxfError> {
        loop {
            let (code, value) = self.next_required("ENTITIES")?;
            if code != 0 {
                return Err(DxfError::invalid(
                    self.reader.line(),
                    format!("group code {} where an entity was expected", code),
                ));
            }

            let common = match value.trim() {
                "ENDSEC" => break,
                "LWPOLYLINE" => self.parse_lwpolyline()?,
                "POLYLINE" => self.parse_polyline()?,
                _ => self.skip_entity()?,
            };
            self.document.entity_count += 1;
            *self
                .document
                .entity_counts
                .entry(common.layer_name())
                .or_insert(0) += 1;
        }
        Ok(())
    }

    /// Read an entity body up to the next group code 0, keeping only common codes
    fn skip_entity(&mut self) -> Result<Common, DxfError> {
        let mut common = Common::default();
        while let Some((code, value)) = self.reader.next_pair()? {
            if code == 0 {
                self.reader.put_back((code, value));
                break;
            }
            common.absorb(code, &value);
        }
        Ok(common)
    }

    fn parse_lwpolyline(&mut self) -> Result<Common, DxfError> {
        let mut common = Common::default();
        let mut closed = false;
        let mut vertices = Vec::new();
        let mut pending_x: Option<f64> = None;

        while let Some((code, value)) = self.reader.next_pair()? {
            let line = self.reader.line();
            match code {
                0 => {
                    self.reader.put_back((code, value));
                    break;
                }
                70 => closed = parse_i32(&value, line, "LWPOLYLINE flags")? & 1 == 1,
                10 => {
                    if pending_x.is_some() {
                        return Err(DxfError::invalid(
                            line,
                            "LWPOLYLINE vertex without Y (group code 20)",
                        ));
                    }
                    pending_x = Some(parse_f64(&value, line, "LWPOLYLINE vertex X")?);
                }
                20 => {
                    let x = pending_x.take().ok_or_else(|| {
                        DxfError::invalid(line, "LWPOLYLINE vertex without X (group code 10)")
                    })?;
                    vertices.push(Point2::new(x, parse_f64(&value, line, "LWPOLYLINE vertex Y")?));
                }
                _ => {
                    common.absorb(code, &value);
                }
            }
        }

        if pending_x.is_some() {
            return Err(DxfError::invalid(
                self.reader.line(),
                "LWPOLYLINE ends with an incomplete vertex",
            ));
        }
        self.push_polyline(&common, vertices, closed);
        Ok(common)
    }

    /// Classic POLYLINE followed by VERTEX entities and SEQEND
    fn parse_polyline(&mut self) -> Result<Common, DxfError> {
        let mut common = Common::default();
        let mut flags = 0;

        while let Some((code, value)) = self.reader.next_pair()? {
            match code {
                0 => {
                    self.reader.put_back((code, value));
                    break;
                }
                70 => flags = parse_i32(&value, self.reader.line(), "POLYLINE flags")?,
                _ => {
                    common.absorb(code, &value);
                }
            }
        }

        let mut vertices = Vec::new();
        loop {
            let (code, value) = self.next_required("POLYLINE")?;
            if code != 0 {
                continue;
            }
            let marker = value.trim();
            if marker == "VERTEX" {
                if let Some(point) = self.parse_vertex()? {
                    vertices.push(point);
                }
            } else if marker == "SEQEND" {
                self.skip_entity()?;
                break;
            } else {
                // Missing SEQEND; the next entity starts here
                self.reader.put_back((code, value));
                break;
            }
        }

        if flags & MESH_FLAGS != 0 {
            log::debug!("Skipping mesh POLYLINE on layer {}", common.layer_name());
        } else {
            self.push_polyline(&common, vertices, flags & 1 == 1);
        }
        Ok(common)
    }

    fn parse_vertex(&mut self) -> Result<Option<Point2>, DxfError> {
        let mut x = None;
        let mut y = None;
        while let Some((code, value)) = self.reader.next_pair()? {
            let line = self.reader.line();
            match code {
                0 => {
                    self.reader.put_back((code, value));
                    break;
                }
                10 => x = Some(parse_f64(&value, line, "VERTEX X")?),
                20 => y = Some(parse_f64(&value, line, "VERTEX Y")?),
                _ => {}
            }
        }
        Ok(x.zip(y).map(|(x, y)| Point2::new(x, y)))
    }

    fn push_polyline(&mut self, common: &Common, vertices: Vec<Point2>, closed: bool) {
        if vertices.is_empty() {
            log::debug!("Dropping polyline without vertices on layer {}", common.layer_name());
            return;
        }
        self.document.polylines.push(DrawingPolyline {
            handle: common.handle.clone(),
            layer: common.layer_name(),
            vertices,
            closed,
            paper_space: common.paper_space,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_and_layers() {
        let source = concat!(
            "0\nSECTION\n2\nHEADER\n",
            "9\n$ACADVER\n1\nAC1027\n",
            "9\n$INSUNITS\n70\n4\n",
            "0\nENDSEC\n",
            "0\nSECTION\n2\nTABLES\n",
            "0\nTABLE\n2\nLAYER\n70\n2\n",
            "0\nLAYER\n2\nSITE\n70\n0\n62\n3\n6\nCONTINUOUS\n",
            "0\nLAYER\n2\nLEVEL 1\n62\n-7\n",
            "0\nENDTAB\n",
            "0\nENDSEC\n",
            "0\nEOF\n",
        );
        let doc = DxfDrawingReader::new().read_str(source).unwrap();
        assert_eq!(doc.header.insunits, Some(4));
        assert_eq!(doc.header.acad_version.as_deref(), Some("AC1027"));
        assert_eq!(doc.layers.len(), 2);
        assert_eq!(doc.layers[0].color, Some(3));
        assert_eq!(doc.layers[0].linetype.as_deref(), Some("CONTINUOUS"));
        assert_eq!(doc.layers[1].name, "LEVEL 1");
    }

    #[test]
    fn test_lwpolyline_and_counts() {
        let source = concat!(
            "0\nSECTION\n2\nENTITIES\n",
            "0\nLWPOLYLINE\n5\n2A\n8\nROOMS\n90\n3\n70\n1\n",
            "10\n0\n20\n0\n10\n5\n20\n0\n10\n5\n20\n4\n",
            "0\nLINE\n8\nROOMS\n10\n0\n20\n0\n11\n1\n21\n1\n",
            "0\nCIRCLE\n10\n0\n20\n0\n40\n1\n",
            "0\nENDSEC\n",
            "0\nEOF\n",
        );
        let doc = DxfDrawingReader::new().read_str(source).unwrap();
        assert_eq!(doc.entity_count, 3);
        assert_eq!(doc.entity_counts["ROOMS"], 2);
        assert_eq!(doc.entity_counts["0"], 1);

        let outline = &doc.polylines[0];
        assert!(outline.closed);
        assert_eq!(outline.handle.as_deref(), Some("2A"));
        assert_eq!(outline.vertices.len(), 3);
        assert_eq!(outline.vertices[2], Point2::new(5.0, 4.0));
    }

    #[test]
    fn test_classic_polyline_and_paper_space() {
        let source = concat!(
            "0\nSECTION\n2\nENTITIES\n",
            "0\nPOLYLINE\n8\nA-AREA\n67\n1\n66\n1\n70\n1\n",
            "0\nVERTEX\n8\nA-AREA\n10\n0\n20\n0\n",
            "0\nVERTEX\n8\nA-AREA\n10\n2\n20\n0\n",
            "0\nVERTEX\n8\nA-AREA\n10\n2\n20\n2\n",
            "0\nSEQEND\n8\nA-AREA\n",
            "0\nENDSEC\n",
            "0\nEOF\n",
        );
        let doc = DxfDrawingReader::new().read_str(source).unwrap();
        assert_eq!(doc.entity_count, 1);
        let polyline = &doc.polylines[0];
        assert!(polyline.closed);
        assert!(polyline.paper_space);
        assert_eq!(polyline.vertices.len(), 3);
    }

    #[test]
    fn test_incomplete_vertex_is_a_record_error() {
        let source = concat!(
            "0\nSECTION\n2\nENTITIES\n",
            "0\nLWPOLYLINE\n8\n0\n10\n1\n10\n2\n",
            "0\nENDSEC\n",
        );
        assert!(matches!(
            DxfDrawingReader::new().read_str(source),
            Err(ParseError::Record { .. })
        ));
    }

    #[test]
    fn test_rejects_non_dxf() {
        let reader = DxfDrawingReader::new();
        assert!(reader.read(b"AutoCAD Binary DXF\r\n\x1a\x00").is_err());
        assert!(reader.read(b"ISO-10303-21;\nHEADER;\n").is_err());
        assert!(reader.read(b"").is_err());
        assert!(matches!(
            reader.read(&[0x30, 0x0a, 0xff, 0xfe]),
            Err(ParseError::Encoding(_))
        ));
    }

    #[test]
    fn test_unterminated_section() {
        let source = "0\nSECTION\n2\nTABLES\n0\nTABLE\n";
        assert!(DxfDrawingReader::new().read_str(source).is_err());
    }
}
