// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Import job runner and its collaborator ports
//!
//! The job system owns queueing and persistence; this module only runs one
//! import, reports its status transitions and folds the overlay receipt
//! into the record. Any failure aborts the whole import.

use crate::record::ImportRecord;
use crate::{Ingestor, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Import state reported to the job system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImportStatus {
    Running,
    Completed { floors: usize, units: usize },
    Failed { error: String },
}

impl ImportStatus {
    pub fn state_name(&self) -> &'static str {
        match self {
            ImportStatus::Running => "running",
            ImportStatus::Completed { .. } => "completed",
            ImportStatus::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ImportStatus::Running)
    }
}

/// Receives status transitions for an import record
pub trait ImportStatusSink: Send + Sync {
    fn report(&self, import_id: &str, status: ImportStatus);
}

/// Identifier and checksum returned by overlay ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayReceipt {
    pub overlay_id: String,
    pub checksum: String,
}

/// Downstream overlay / zoning ingestion
pub trait OverlayIngestor: Send + Sync {
    /// Ingest `record` for `project_id`; failures should use [`crate::IngestError::Overlay`]
    fn ingest(&self, project_id: &str, record: &ImportRecord) -> Result<OverlayReceipt>;
}

/// One uploaded file waiting to be imported
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub import_id: String,
    pub project_id: Option<String>,
    pub filename: String,
    pub content_type: Option<String>,
    pub payload: Vec<u8>,
}

impl ImportRequest {
    pub fn new(
        import_id: impl Into<String>,
        filename: impl Into<String>,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            import_id: import_id.into(),
            project_id: None,
            filename: filename.into(),
            content_type: None,
            payload: payload.into(),
        }
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Runs imports against an [`Ingestor`], reporting to a status sink
pub struct ImportJob<'a> {
    ingestor: &'a Ingestor,
    sink: &'a dyn ImportStatusSink,
    overlay: Option<&'a dyn OverlayIngestor>,
}

impl<'a> ImportJob<'a> {
    pub fn new(ingestor: &'a Ingestor, sink: &'a dyn ImportStatusSink) -> Self {
        Self {
            ingestor,
            sink,
            overlay: None,
        }
    }

    /// Hand finished records with a project id to overlay ingestion
    pub fn with_overlay(mut self, overlay: &'a dyn OverlayIngestor) -> Self {
        self.overlay = Some(overlay);
        self
    }

    /// Run one import from its original payload
    pub fn run(&self, request: &ImportRequest) -> Result<ImportRecord> {
        let id = request.import_id.as_str();
        log::info!("Import {} started for {:?}", id, request.filename);
        self.sink.report(id, ImportStatus::Running);

        match self.execute(request) {
            Ok(record) => {
                log::info!(
                    "Import {} completed: {} floors, {} units",
                    id,
                    record.floors,
                    record.units
                );
                self.sink.report(
                    id,
                    ImportStatus::Completed {
                        floors: record.floors,
                        units: record.units,
                    },
                );
                Ok(record)
            }
            Err(err) => {
                log::error!("Import {} failed: {}", id, err);
                self.sink.report(
                    id,
                    ImportStatus::Failed {
                        error: err.to_string(),
                    },
                );
                Err(err)
            }
        }
    }

    fn execute(&self, request: &ImportRequest) -> Result<ImportRecord> {
        let mut record = self.ingestor.import(
            &request.payload,
            &request.filename,
            request.content_type.as_deref(),
        )?;

        if let (Some(overlay), Some(project_id)) = (self.overlay, request.project_id.as_deref()) {
            let receipt = overlay.ingest(project_id, &record)?;
            log::debug!("Overlay {} accepted import {}", receipt.overlay_id, request.import_id);
            record
                .metadata
                .insert("overlay_id".into(), Value::from(receipt.overlay_id));
            record
                .metadata
                .insert("overlay_checksum".into(), Value::from(receipt.checksum));
        }
        Ok(record)
    }
}
