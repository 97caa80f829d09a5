use std::io::Write;
use std::path::Path;
use std::process::{Command, ExitStatus};

/// Run the codec-harness binary with the given args.
/// Returns (exit_status, stdout, stderr).
fn run_cli(corpus: &Path, args: &[&str]) -> (ExitStatus, String, String) {
    let bin = env!("CARGO_BIN_EXE_codec-harness");
    let output = Command::new(bin)
        .env_remove("CODEC_HARNESS_CORPUS")
        .arg("--corpus")
        .arg(corpus)
        .args(args)
        .output()
        .expect("failed to execute codec-harness binary");
    (
        output.status,
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    )
}

fn write_corpus() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("create corpus");
    for i in 0..200 {
        writeln!(file, "{i:04} redistribution and use in source and binary forms").expect("write corpus");
    }
    file
}

#[test]
fn run_prints_summary() {
    let corpus = write_corpus();
    let (status, stdout, stderr) = run_cli(corpus.path(), &["--level", "1", "--level", "9", "run"]);
    assert!(status.success(), "stderr: {stderr}");
    assert!(stdout.contains("CODEC MATRIX"), "stdout: {stdout}");
    assert!(stdout.contains("gzip-multi"));
    assert!(stdout.contains("cells: 16 ok, 0 failed"), "stdout: {stdout}");
}

#[test]
fn run_json_is_parseable() {
    let corpus = write_corpus();
    let (status, stdout, stderr) = run_cli(
        corpus.path(),
        &["--codec", "bzip2", "--level", "3", "run", "--json", "--compress-only"],
    );
    assert!(status.success(), "stderr: {stderr}");
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");
    let cells = json["cells"].as_array().unwrap();
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0]["codec"], "bzip2");
    assert_eq!(cells[0]["direction"], "compress");
    assert_eq!(json["verifications"].as_array().unwrap().len(), 1);
}

#[test]
fn tiny_write_and_read_chunks_stay_clean() {
    let corpus = write_corpus();
    let (status, stdout, stderr) = run_cli(
        corpus.path(),
        &["--level", "6", "--write-chunk", "1", "--read-chunk", "1", "run"],
    );
    assert!(status.success(), "stderr: {stderr}");
    assert!(stdout.contains("cells: 8 ok, 0 failed"), "stdout: {stdout}");
}

#[test]
fn failing_cells_exit_non_zero() {
    let corpus = write_corpus();
    let (status, stdout, _) = run_cli(corpus.path(), &["--codec", "bzip2", "--level", "0", "run"]);
    assert!(!status.success());
    assert!(stdout.contains("FAILED"), "stdout: {stdout}");
}

#[test]
fn sizes_lists_every_level() {
    let corpus = write_corpus();
    let (status, stdout, stderr) = run_cli(corpus.path(), &["--codec", "deflate", "sizes"]);
    assert!(status.success(), "stderr: {stderr}");
    assert!(stdout.starts_with("Corpus: "), "stdout: {stdout}");
    let rows = stdout.lines().filter(|l| l.starts_with("deflate")).count();
    assert_eq!(rows, 9);
}

#[test]
fn verify_succeeds_on_text_corpus() {
    let corpus = write_corpus();
    let (status, stdout, stderr) = run_cli(corpus.path(), &["--parallel", "verify"]);
    assert!(status.success(), "stderr: {stderr}");
    assert!(!stdout.contains("false"), "stdout: {stdout}");
}

#[test]
fn missing_corpus_fails_before_running() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("absent.txt");
    let (status, stdout, stderr) = run_cli(&missing, &["run"]);
    assert!(!status.success());
    assert!(stderr.contains("cannot read corpus"), "stderr: {stderr}");
    assert!(!stdout.contains("CODEC MATRIX"));
}
