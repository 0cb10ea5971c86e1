// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod common;

use plan_lite_ingest::{
    ImportJob, ImportRecord, ImportRequest, ImportStatus, ImportStatusSink, IngestError,
    Ingestor, OverlayIngestor, OverlayReceipt,
};
use plan_lite_model::GeometrySerializer;
use rustc_hash::FxHasher;
use std::hash::Hasher;
use std::sync::Mutex;

const FLOORPLAN: &str = r#"{
    "layers": [
        {"name": "Plot", "type": "site", "metadata": {"zone": "MU-2"}},
        {"name": "Ground", "type": "floor", "units": [
            {"id": "G-01", "name": "Shop", "area": 60.0},
            {"id": "G-02", "name": "Lobby"}
        ]}
    ],
    "floors": [
        {"name": "First", "elevation": 4.0, "units": [
            {"id": "1-01", "area": 45.0, "bedrooms": 2},
            {"id": "1-02", "area": 38.0, "bedrooms": 1}
        ]}
    ]
}"#;

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<(String, ImportStatus)>>,
}

impl RecordingSink {
    fn states(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(_, status)| status.state_name())
            .collect()
    }

    fn last(&self) -> ImportStatus {
        self.events.lock().unwrap().last().unwrap().1.clone()
    }
}

impl ImportStatusSink for RecordingSink {
    fn report(&self, import_id: &str, status: ImportStatus) {
        self.events
            .lock()
            .unwrap()
            .push((import_id.to_string(), status));
    }
}

/// Checksums the exported graph
struct HashingOverlay;

impl OverlayIngestor for HashingOverlay {
    fn ingest(
        &self,
        project_id: &str,
        record: &ImportRecord,
    ) -> plan_lite_ingest::Result<OverlayReceipt> {
        let mut hasher = FxHasher::default();
        hasher.write(record.graph.to_string().as_bytes());
        Ok(OverlayReceipt {
            overlay_id: format!("{}-overlay", project_id),
            checksum: format!("{:016x}", hasher.finish()),
        })
    }
}

struct RejectingOverlay;

impl OverlayIngestor for RejectingOverlay {
    fn ingest(&self, _: &str, _: &ImportRecord) -> plan_lite_ingest::Result<OverlayReceipt> {
        Err(IngestError::overlay("zoning service unavailable"))
    }
}

#[test]
fn unknown_format_names_the_file() {
    let err = Ingestor::default()
        .parse(b"AC1027 binary", "plan.dwg", None)
        .unwrap_err();
    match err {
        IngestError::UnsupportedFormat { filename } => assert_eq!(filename, "plan.dwg"),
        other => panic!("expected unsupported format, got {:?}", other),
    }
}

#[test]
fn content_type_selects_extractor_without_extension() {
    let parsed = Ingestor::default()
        .parse(FLOORPLAN.as_bytes(), "upload", Some("application/json"))
        .unwrap();
    assert_eq!(parsed.source_format(), Some("json"));
    assert_eq!(parsed.units.len(), 4);
}

#[test]
fn serialized_graph_rehydrates_with_same_counts() {
    let parsed = Ingestor::default()
        .parse(FLOORPLAN.as_bytes(), "plan.json", None)
        .unwrap();
    let value = GeometrySerializer::to_value(&parsed.graph).unwrap();
    let graph = GeometrySerializer::from_value(value).unwrap();

    assert_eq!(graph.level_count(), parsed.graph.level_count());
    assert_eq!(graph.space_count(), parsed.graph.space_count());
    assert_eq!(graph.relationship_count(), parsed.graph.relationship_count());
}

#[cfg(feature = "dxf")]
#[test]
fn drawing_graph_rehydrates_with_same_counts() {
    let parsed = Ingestor::default()
        .parse(&common::site_and_levels().bytes(), "site.dxf", None)
        .unwrap();
    let graph = GeometrySerializer::from_json_str(
        &GeometrySerializer::to_json_string(&parsed.graph).unwrap(),
    )
    .unwrap();
    assert_eq!(graph.space_count(), 4);
    assert_eq!(graph.level_count(), parsed.graph.level_count());
    assert_eq!(graph.relationship_count(), 4);
}

#[test]
fn import_record_shape() {
    let record = Ingestor::default()
        .import(FLOORPLAN.as_bytes(), "plan.json", None)
        .unwrap();
    assert_eq!(record.floors, 2);
    assert_eq!(record.units, 4);
    assert_eq!(record.detected_units, vec!["G-01", "G-02", "1-01", "1-02"]);
    assert_eq!(record.layer_metadata.len(), 2);
    assert_eq!(record.source_format(), Some("json"));
    assert_eq!(record.metadata["floor_count"], 2);

    let json = serde_json::to_value(&record).unwrap();
    for key in [
        "floors",
        "units",
        "detected_floors",
        "detected_units",
        "layer_metadata",
        "graph",
        "metadata",
    ] {
        assert!(json.get(key).is_some(), "missing {}", key);
    }
    assert_eq!(json["graph"]["spaces"][2]["metadata"]["bedrooms"], 2);
    assert_eq!(json["graph"]["levels"][0]["metadata"]["zone"], "MU-2");
}

#[test]
fn job_reports_running_then_completed() {
    let ingestor = Ingestor::default();
    let sink = RecordingSink::default();
    let request = ImportRequest::new("imp-1", "plan.json", FLOORPLAN.as_bytes());

    let record = ImportJob::new(&ingestor, &sink).run(&request).unwrap();
    assert_eq!(record.units, 4);
    assert_eq!(sink.states(), vec!["running", "completed"]);
    assert_eq!(sink.last(), ImportStatus::Completed { floors: 2, units: 4 });
    assert!(sink.last().is_terminal());
}

#[test]
fn job_reports_failure_message() {
    let ingestor = Ingestor::default();
    let sink = RecordingSink::default();
    let request = ImportRequest::new("imp-2", "plan.dwg", b"binary".to_vec());

    let err = ImportJob::new(&ingestor, &sink).run(&request).unwrap_err();
    assert!(matches!(err, IngestError::UnsupportedFormat { .. }));
    assert_eq!(sink.states(), vec!["running", "failed"]);
    assert_eq!(
        sink.last(),
        ImportStatus::Failed {
            error: "Unsupported file format: plan.dwg".to_string()
        }
    );
}

#[test]
fn overlay_receipt_is_folded_into_metadata() {
    let ingestor = Ingestor::default();
    let sink = RecordingSink::default();
    let request = ImportRequest::new("imp-3", "plan.json", FLOORPLAN.as_bytes())
        .with_project("proj-7");

    let record = ImportJob::new(&ingestor, &sink)
        .with_overlay(&HashingOverlay)
        .run(&request)
        .unwrap();
    assert_eq!(record.metadata["overlay_id"], "proj-7-overlay");
    assert_eq!(record.metadata["overlay_checksum"].as_str().unwrap().len(), 16);
}

#[test]
fn overlay_failure_fails_the_job() {
    let ingestor = Ingestor::default();
    let sink = RecordingSink::default();
    let request = ImportRequest::new("imp-4", "plan.json", FLOORPLAN.as_bytes())
        .with_project("proj-7");

    let err = ImportJob::new(&ingestor, &sink)
        .with_overlay(&RejectingOverlay)
        .run(&request)
        .unwrap_err();
    assert!(matches!(err, IngestError::Overlay(_)));
    assert_eq!(sink.states(), vec!["running", "failed"]);
}

#[test]
fn parse_runs_on_worker_threads() {
    let ingestor = Ingestor::default();
    let counts: Vec<usize> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    ingestor
                        .parse(FLOORPLAN.as_bytes(), "plan.json", None)
                        .unwrap()
                        .units
                        .len()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(counts, vec![4; 4]);
}
