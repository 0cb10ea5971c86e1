// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Source format detection from filename and content type

use crate::{IngestError, Result};
use plan_lite_model::SourceFormat;
use std::path::Path;

/// Pick the extractor family for an upload
///
/// The file extension wins over the content type; the content type is
/// only consulted when the extension is missing or unknown.
pub fn detect_format(filename: &str, content_type: Option<&str>) -> Result<SourceFormat> {
    if let Some(format) = format_from_extension(filename) {
        return Ok(format);
    }
    if let Some(format) = content_type.and_then(format_from_content_type) {
        log::debug!(
            "No known extension on {:?}, using content type {:?}",
            filename,
            content_type
        );
        return Ok(format);
    }
    Err(IngestError::unsupported(filename))
}

/// Format named by the file extension, ignoring case
pub fn format_from_extension(filename: &str) -> Option<SourceFormat> {
    let ext = Path::new(filename).extension()?.to_str()?;
    match ext.to_ascii_lowercase().as_str() {
        "json" => Some(SourceFormat::Json),
        "dxf" => Some(SourceFormat::Dxf),
        "ifc" => Some(SourceFormat::Ifc),
        _ => None,
    }
}

/// Format named by a MIME type; parameters such as `charset` are ignored
pub fn format_from_content_type(content_type: &str) -> Option<SourceFormat> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "application/json" | "text/json" => Some(SourceFormat::Json),
        s if s.ends_with("+json") => Some(SourceFormat::Json),
        "application/dxf" | "application/x-dxf" | "image/vnd.dxf" | "image/x-dxf" => {
            Some(SourceFormat::Dxf)
        }
        "application/ifc" | "application/x-ifc" | "model/ifc" | "application/x-step"
        | "model/step" => Some(SourceFormat::Ifc),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_detection() {
        assert_eq!(detect_format("plan.dxf", None).unwrap(), SourceFormat::Dxf);
        assert_eq!(detect_format("TOWER.IFC", None).unwrap(), SourceFormat::Ifc);
        assert_eq!(detect_format("units.json", None).unwrap(), SourceFormat::Json);
    }

    #[test]
    fn test_extension_wins_over_content_type() {
        assert_eq!(
            detect_format("plan.dxf", Some("application/json")).unwrap(),
            SourceFormat::Dxf
        );
    }

    #[test]
    fn test_content_type_fallback() {
        assert_eq!(
            detect_format("upload", Some("application/json; charset=utf-8")).unwrap(),
            SourceFormat::Json
        );
        assert_eq!(
            detect_format("blob.bin", Some("image/vnd.dxf")).unwrap(),
            SourceFormat::Dxf
        );
        assert_eq!(
            detect_format("model", Some("application/x-step")).unwrap(),
            SourceFormat::Ifc
        );
    }

    #[test]
    fn test_unknown_names_the_file() {
        match detect_format("plan.dwg", None) {
            Err(IngestError::UnsupportedFormat { filename }) => assert_eq!(filename, "plan.dwg"),
            other => panic!("expected unsupported format, got {:?}", other),
        }
        assert!(detect_format("plan.dwg", Some("application/octet-stream")).is_err());
    }
}
