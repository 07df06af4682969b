//! Manifest write → read roundtrip and discovery tests.
//!
//! Each `#[case]` writes into its own `TempDir`.

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use rstest::rstest;
use tempfile::TempDir;
use versioner_core::{
    manifest::MANIFEST_INPUT_NAME, Dataset, DatasetId, DatasetVersion, DatumId, ExecutionId,
    Manifest, ManifestError, VersionId, VersionRef, VersionTarget, MANIFEST_FILENAME,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn dataset(name: &str) -> Dataset {
    Dataset {
        id: DatasetId::from("ds-1"),
        name: name.to_string(),
        latest_version: Some(VersionRef {
            id: VersionId::from("v-1"),
        }),
    }
}

fn previous() -> DatasetVersion {
    DatasetVersion {
        id: VersionId::from("v-1"),
        name: "20240101-000000".to_string(),
        files: vec![],
    }
}

fn target(name: &str, with_previous: bool) -> VersionTarget {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let old = previous();
    VersionTarget::plan(&dataset(name), with_previous.then_some(&old), now)
}

fn fresh_dataset_manifest() -> Manifest {
    Manifest::new(
        target("weather", false),
        Some(ExecutionId::from("exec-1")),
        BTreeMap::new(),
        ["x.csv", "y.csv"].map(String::from),
        Vec::new(),
    )
}

fn mixed_manifest() -> Manifest {
    let mut keep = BTreeMap::new();
    keep.insert("a.csv".to_string(), DatumId::from("datum-1"));
    Manifest::new(
        target("weather", true),
        Some(ExecutionId::from("exec-2")),
        keep,
        ["c.csv".to_string()],
        ["b.csv".to_string()],
    )
}

fn no_execution_manifest() -> Manifest {
    Manifest::new(
        target("weather", true),
        None,
        BTreeMap::new(),
        Vec::new(),
        ["gone.csv".to_string()],
    )
}

fn unicode_manifest() -> Manifest {
    let mut keep = BTreeMap::new();
    keep.insert("données-été.csv".to_string(), DatumId::from("d-é"));
    Manifest::new(
        target("データ", true),
        Some(ExecutionId::from("exec-🚀")),
        keep,
        ["新しい.csv".to_string()],
        ["старый.csv".to_string()],
    )
}

fn deliver(manifest_path: &std::path::Path, inputs: &TempDir, as_name: &str) {
    let slot = inputs.path().join(MANIFEST_INPUT_NAME);
    std::fs::create_dir_all(&slot).unwrap();
    std::fs::copy(manifest_path, slot.join(as_name)).unwrap();
}

// ---------------------------------------------------------------------------
// Parameterised roundtrip test
// ---------------------------------------------------------------------------

#[rstest]
#[case("fresh_dataset", fresh_dataset_manifest())]
#[case("keep_new_exclude", mixed_manifest())]
#[case("no_execution_id", no_execution_manifest())]
#[case("unicode_names", unicode_manifest())]
fn manifest_roundtrip(#[case] label: &str, #[case] manifest: Manifest) {
    let outputs = TempDir::new().unwrap();
    let inputs = TempDir::new().unwrap();

    let written = manifest
        .write_to_dir(outputs.path())
        .unwrap_or_else(|e| panic!("[{label}] write failed: {e}"));
    deliver(&written, &inputs, MANIFEST_FILENAME);

    let back = Manifest::read_from_inputs(inputs.path())
        .unwrap_or_else(|e| panic!("[{label}] read failed: {e}"));
    assert_eq!(back, manifest, "[{label}] manifest differs after roundtrip");
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[test]
fn wire_format_uses_flat_snake_case_fields() {
    let json = serde_json::to_value(mixed_manifest()).unwrap();
    assert_eq!(json["dataset_id"], "ds-1");
    assert_eq!(json["execution_id"], "exec-2");
    assert_eq!(json["keep"]["a.csv"], "datum-1");
    assert_eq!(json["new"], serde_json::json!(["c.csv"]));
    assert_eq!(json["exclude"], serde_json::json!(["b.csv"]));
    assert_eq!(json["new_version_name"], "20240601-120000");
    assert_eq!(json["new_version_uri"], "dataset://weather/20240601-120000");
    assert_eq!(json["old_version_id"], "v-1");
    assert_eq!(json["old_version_uri"], "dataset://weather/20240101-000000");
}

#[test]
fn reads_manifest_with_null_old_version() {
    let inputs = TempDir::new().unwrap();
    let slot = inputs.path().join(MANIFEST_INPUT_NAME);
    std::fs::create_dir_all(&slot).unwrap();
    std::fs::write(
        slot.join("renamed-by-orchestrator.json"),
        r#"{
            "dataset_id": "ds-1",
            "exclude": [],
            "execution_id": "exec-1",
            "keep": {},
            "new": ["x.csv"],
            "new_version_name": "20240601-120000",
            "new_version_uri": "dataset://weather/20240601-120000",
            "old_version_id": null,
            "old_version_uri": null
        }"#,
    )
    .unwrap();

    let manifest = Manifest::read_from_inputs(inputs.path()).unwrap();
    assert!(manifest.old_version_id.is_none());
    assert_eq!(manifest.new, vec!["x.csv"]);
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

#[test]
fn empty_slot_is_not_found() {
    let inputs = TempDir::new().unwrap();
    std::fs::create_dir_all(inputs.path().join(MANIFEST_INPUT_NAME)).unwrap();
    let err = Manifest::read_from_inputs(inputs.path()).unwrap_err();
    assert!(matches!(err, ManifestError::NotFound { .. }), "got {err:?}");
}

#[test]
fn non_json_files_are_not_candidates() {
    let inputs = TempDir::new().unwrap();
    let slot = inputs.path().join(MANIFEST_INPUT_NAME);
    std::fs::create_dir_all(&slot).unwrap();
    std::fs::write(slot.join("notes.txt"), "hello").unwrap();
    let err = Manifest::read_from_inputs(inputs.path()).unwrap_err();
    assert!(matches!(err, ManifestError::NotFound { .. }), "got {err:?}");
}

#[test]
fn two_candidates_are_rejected() {
    let outputs = TempDir::new().unwrap();
    let inputs = TempDir::new().unwrap();
    let written = mixed_manifest().write_to_dir(outputs.path()).unwrap();
    deliver(&written, &inputs, "first.json");
    deliver(&written, &inputs, "second.json");

    match Manifest::read_from_inputs(inputs.path()) {
        Err(ManifestError::Ambiguous { candidates, .. }) => assert_eq!(candidates.len(), 2),
        other => panic!("expected ambiguous manifest error, got {other:?}"),
    }
}

#[test]
fn malformed_manifest_reports_path() {
    let inputs = TempDir::new().unwrap();
    let slot = inputs.path().join(MANIFEST_INPUT_NAME);
    std::fs::create_dir_all(&slot).unwrap();
    std::fs::write(slot.join("m.json"), r#"{"dataset_id": 5}"#).unwrap();

    match Manifest::read_from_inputs(inputs.path()) {
        Err(ManifestError::Json { path, .. }) => assert!(path.ends_with("m.json")),
        other => panic!("expected JSON error, got {other:?}"),
    }
}
