//! End-to-end tests of the four-file export

use chrono::{TimeZone, Utc};
use odm_i2b2::adapters::files::FileExportSink;
use odm_i2b2::adapters::sink::DryRunSink;
use odm_i2b2::config::OdmI2b2Config;
use odm_i2b2::core::export::{ExportCoordinator, ExportErrorType, ExportSummary};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FILES: [&str; 4] = ["concept_map", "columns", "word_map", "clinical_data"];

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/demo_study.xml")
}

async fn export_into(dir: &Path) -> ExportSummary {
    let mut coordinator = ExportCoordinator::new(
        OdmI2b2Config::default(),
        Box::new(FileExportSink::new(dir)),
    )
    .with_start_time(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());

    coordinator.export_file(&fixture()).await.unwrap()
}

fn read(dir: &Path, suffix: &str) -> String {
    std::fs::read_to_string(dir.join(format!("Demo_Study_{suffix}.txt"))).unwrap()
}

#[tokio::test]
async fn test_clinical_data_file() {
    let dir = TempDir::new().unwrap();
    export_into(dir.path()).await;

    // SUBJ3 has no events and every value of SUBJ4 is dropped
    assert_eq!(
        read(dir.path(), "clinical_data"),
        "Demo_Study_SUBJ_ID\tDemo_Study_Age\tDemo_Study_Sex\n\
         SUBJ1\t34\t1\n\
         SUBJ2\t29\t2\n\
         SUBJ5\t\t2\n"
    );
}

#[tokio::test]
async fn test_columns_file() {
    let dir = TempDir::new().unwrap();
    export_into(dir.path()).await;

    assert_eq!(
        read(dir.path(), "columns"),
        "Filename\tCategory Code\tColumn Number\tData Label\tData Label Source\tControl Vocab Cd\n\
         Demo_Study_clinical_data.txt\t\t1\tSUBJ_ID\t\t\n\
         Demo_Study_clinical_data.txt\tBaseline+Demographics\t2\tAge\t\t\n\
         Demo_Study_clinical_data.txt\tBaseline+Demographics\t3\tSex\t\t\n"
    );
}

#[tokio::test]
async fn test_word_map_file() {
    let dir = TempDir::new().unwrap();
    export_into(dir.path()).await;

    assert_eq!(
        read(dir.path(), "word_map"),
        "Filename\tColumn Number\tOriginal Data Value\tNew Data Values\n\
         Demo_Study_clinical_data.txt\t3\t1\tM\n\
         Demo_Study_clinical_data.txt\t3\t2\tF\n"
    );
}

#[tokio::test]
async fn test_concept_map_file() {
    let dir = TempDir::new().unwrap();
    export_into(dir.path()).await;

    assert_eq!(
        read(dir.path(), "concept_map"),
        "tranSMART_path\tEDC_path\tControl Vocab Cd\n\
         Baseline+Demographics+Age\tBaseline+Demographics+Age\t\n\
         Baseline+Demographics+Sex\tBaseline+Demographics+Sex\t\n"
    );
}

#[tokio::test]
async fn test_summary_counts() {
    let dir = TempDir::new().unwrap();
    let summary = export_into(dir.path()).await;

    assert_eq!(summary.sink, "files");
    assert_eq!(summary.studies.len(), 1);
    assert_eq!(summary.studies[0].study_oid, "S_DEMO");

    let totals = summary.totals();
    assert_eq!(totals.concepts, 7);
    assert_eq!(totals.facts, 5);
    assert_eq!(totals.subjects, 4);
    assert_eq!(totals.dropped_facts, 2);
    assert_eq!(totals.skipped_references, 3);

    // The S_OTHER block has no study definition
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].error_type, ExportErrorType::ClinicalData);
    assert!(!summary.is_successful());
    assert_eq!(summary.write_failures, 0);
}

#[tokio::test]
async fn test_repeated_exports_are_identical() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    export_into(first.path()).await;
    export_into(second.path()).await;

    for suffix in FILES {
        assert_eq!(
            read(first.path(), suffix),
            read(second.path(), suffix),
            "{suffix} differs between runs"
        );
    }
}

#[tokio::test]
async fn test_export_overwrites_previous_files() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("Demo_Study_word_map.txt"), "stale\n").unwrap();

    export_into(dir.path()).await;

    assert!(!read(dir.path(), "word_map").contains("stale"));
}

#[tokio::test]
async fn test_dry_run_walks_the_same_stream() {
    let dir = TempDir::new().unwrap();
    let files = export_into(dir.path()).await;

    let mut coordinator =
        ExportCoordinator::new(OdmI2b2Config::default(), Box::new(DryRunSink::new()));
    let dry_run = coordinator.export_file(&fixture()).await.unwrap();

    assert_eq!(dry_run.sink, "dry-run");
    assert_eq!(dry_run.totals(), files.totals());
}
