use docx_tools::config::Config;
use docx_tools::error::ToolError;
use docx_tools::utils::document_processor::DocumentProcessor;
use std::collections::HashSet;
use std::fs;

const HEADER: &str = "question,instruction,answer,metadata,context";

fn sorted_processor() -> DocumentProcessor {
    DocumentProcessor::new(Config {
        sort_entries: true,
        ..Config::default()
    })
}

#[test]
fn merges_records_from_every_json_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.json"), r#"[{"question":"Q1","answer":"A1"}]"#).unwrap();
    fs::write(dir.path().join("b.json"), r#"[{"question":"Q2"}]"#).unwrap();

    let report = sorted_processor().merge_folder(dir.path()).unwrap();

    assert_eq!(report.output_path, dir.path().join("combined_data.csv"));
    assert_eq!(report.files, 2);
    assert_eq!(report.records, 2);
    let csv = fs::read_to_string(&report.output_path).unwrap();
    assert_eq!(csv, format!("{HEADER}\r\nQ1,,A1,,\r\nQ2,,,,\r\n"));
}

#[test]
fn listing_order_run_contains_every_row() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("first.json"), r#"[{"question":"Q1"},{"question":"Q1b"}]"#).unwrap();
    fs::write(dir.path().join("second.json"), r#"[{"question":"Q2","context":"C"}]"#).unwrap();

    let report = DocumentProcessor::default().merge_folder(dir.path()).unwrap();

    let csv = fs::read_to_string(&report.output_path).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some(HEADER));
    let rows: HashSet<&str> = lines.collect();
    assert_eq!(rows, HashSet::from(["Q1,,,,", "Q1b,,,,", "Q2,,,,C"]));
}

#[test]
fn folder_without_json_files_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "[]").unwrap();

    let err = sorted_processor().merge_folder(dir.path()).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ToolError>(),
        Some(ToolError::NoJsonFiles(_))
    ));
    assert_eq!(err.to_string(), "No JSON files found in the provided folder.");
    assert!(!dir.path().join("combined_data.csv").exists());
}

#[test]
fn path_that_is_not_a_folder_is_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("data.json");
    fs::write(&file, "[]").unwrap();

    let err = sorted_processor().merge_folder(&file).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ToolError>(),
        Some(ToolError::InvalidFolder(_))
    ));
}

#[test]
fn malformed_file_aborts_without_output() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.json"), r#"[{"question":"Q1"}]"#).unwrap();
    fs::write(dir.path().join("b.json"), r#"[{"question": "#).unwrap();

    let err = sorted_processor().merge_folder(dir.path()).unwrap_err();

    assert!(err.downcast_ref::<ToolError>().is_none());
    assert!(format!("{err:#}").contains("b.json"));
    assert!(!dir.path().join("combined_data.csv").exists());
}

#[test]
fn rerun_overwrites_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("combined_data.csv"), "stale").unwrap();
    fs::write(
        dir.path().join("qa.json"),
        r#"[{"question":"Q","instruction":"I","answer":"A","metadata":{"page":4},"context":"C, D"}]"#,
    )
    .unwrap();

    let processor = sorted_processor();
    processor.merge_folder(dir.path()).unwrap();
    let report = processor.merge_folder(dir.path()).unwrap();

    let csv = fs::read_to_string(&report.output_path).unwrap();
    assert_eq!(
        csv,
        format!("{HEADER}\r\nQ,I,A,\"{{\"\"page\"\":4}}\",\"C, D\"\r\n")
    );
}

#[test]
fn csv_name_comes_from_config() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("qa.json"), "[]").unwrap();
    let processor = DocumentProcessor::new(Config {
        csv_name: "merged.csv".to_string(),
        ..Config::default()
    });

    let report = processor.merge_folder(dir.path()).unwrap();

    assert_eq!(report.records, 0);
    assert_eq!(
        fs::read_to_string(dir.path().join("merged.csv")).unwrap(),
        format!("{HEADER}\r\n")
    );
}
