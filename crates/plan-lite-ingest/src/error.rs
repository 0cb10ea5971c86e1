// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the ingestion pipeline

use crate::config::ConfigError;
use plan_lite_model::{GraphError, ParseError, SerializeError, SourceFormat};
use thiserror::Error;

/// Result type for ingestion
pub type Result<T> = std::result::Result<T, IngestError>;

/// Fatal ingestion errors
///
/// Missing or ambiguous geometry is never reported here; extractors absorb
/// it into synthetic buckets instead.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Neither the extension nor the content type names a known format
    #[error("Unsupported file format: {filename}")]
    UnsupportedFormat { filename: String },

    /// Unreadable binary, corrupt drawing or invalid declarative document
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Graph invariant violated while building
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The reader for this format was not compiled in
    #[error("No reader available for {0} payloads")]
    ReaderUnavailable(SourceFormat),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The overlay-ingestion collaborator rejected the record
    #[error("Overlay ingestion failed: {0}")]
    Overlay(String),
}

impl IngestError {
    /// Create a malformed-payload error
    pub fn malformed(msg: impl Into<String>) -> Self {
        IngestError::MalformedPayload(msg.into())
    }

    /// Create an unsupported-format error for `filename`
    pub fn unsupported(filename: impl Into<String>) -> Self {
        IngestError::UnsupportedFormat {
            filename: filename.into(),
        }
    }

    /// Create an overlay error
    pub fn overlay(msg: impl Into<String>) -> Self {
        IngestError::Overlay(msg.into())
    }
}

impl From<ParseError> for IngestError {
    fn from(err: ParseError) -> Self {
        IngestError::MalformedPayload(err.to_string())
    }
}

impl From<SerializeError> for IngestError {
    fn from(err: SerializeError) -> Self {
        match err {
            SerializeError::Decode(e) => IngestError::MalformedPayload(e.to_string()),
            SerializeError::Graph(e) => IngestError::Graph(e),
        }
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        IngestError::MalformedPayload(err.to_string())
    }
}
