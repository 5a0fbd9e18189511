use assert_cmd::prelude::*;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

fn repo_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

fn fixture() -> PathBuf {
    let path = repo_root().join("fixtures").join("parallel_edges.json");
    assert!(path.exists(), "fixture missing: {}", path.display());
    path
}

fn trunk_x(edge: &Value) -> f64 {
    let points = edge["bendPoints"].as_array().expect("bendPoints array");
    assert_eq!(points.len(), 2, "{edge}");
    let x = points[0]["x"].as_f64().expect("x");
    assert_eq!(points[1]["x"].as_f64(), Some(x));
    x
}

#[test]
fn cli_routes_fixture_with_bundled_trunks() {
    let exe = assert_cmd::cargo_bin!("lamantin");
    let output = Command::new(exe)
        .arg(fixture())
        .output()
        .expect("run lamantin");
    assert!(output.status.success(), "{output:?}");

    let out: Value = serde_json::from_slice(&output.stdout).expect("json output");
    let edges = out["edges"].as_array().expect("edges array");
    let ids: Vec<&str> = edges.iter().filter_map(|e| e["id"].as_str()).collect();
    assert_eq!(ids, vec!["e0", "e1", "e2"]);

    let xs: Vec<f64> = edges.iter().map(trunk_x).collect();
    assert_eq!(xs[1] - xs[0], 5.0);
    assert_eq!(xs[2] - xs[1], 5.0);
    assert_eq!(out["slotsPerBoundary"][1].as_u64(), Some(1));
    assert!(out["issues"].as_array().expect("issues").is_empty());
}

#[test]
fn cli_flag_overrides_document_options() {
    let exe = assert_cmd::cargo_bin!("lamantin");
    let output = Command::new(exe)
        .args(["route", "--bundling", "none"])
        .arg(fixture())
        .output()
        .expect("run lamantin");
    assert!(output.status.success(), "{output:?}");

    let out: Value = serde_json::from_slice(&output.stdout).expect("json output");
    let xs: Vec<f64> = out["edges"]
        .as_array()
        .expect("edges array")
        .iter()
        .map(trunk_x)
        .collect();
    // Unbundled, every edge gets a slot of its own, edge spacing apart.
    assert_eq!(out["slotsPerBoundary"][1].as_u64(), Some(3));
    let mut sorted = xs.clone();
    sorted.sort_by(f64::total_cmp);
    assert_eq!(sorted[1] - sorted[0], 10.0);
    assert_eq!(sorted[2] - sorted[1], 10.0);
}

#[test]
fn cli_reads_stdin_and_writes_out_file() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out_path = tmp.path().join("routes.json");
    let doc = fs::read_to_string(fixture()).expect("read fixture");

    let exe = assert_cmd::cargo_bin!("lamantin");
    let mut child = Command::new(exe)
        .args(["--pretty", "--seed", "3", "--out"])
        .arg(&out_path)
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn lamantin");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(doc.as_bytes())
        .expect("write stdin");
    let output = child.wait_with_output().expect("wait");
    assert!(output.status.success(), "{output:?}");
    assert!(output.stdout.is_empty());

    let text = fs::read_to_string(&out_path).expect("read output");
    assert!(text.contains('\n'), "expected pretty output");
    let out: Value = serde_json::from_str(&text).expect("json output");
    assert_eq!(out["edges"].as_array().map(Vec::len), Some(3));
}

#[test]
fn cli_same_seed_same_output() {
    let run = || {
        let exe = assert_cmd::cargo_bin!("lamantin");
        let output = Command::new(exe)
            .args(["--seed", "42"])
            .arg(fixture())
            .output()
            .expect("run lamantin");
        assert!(output.status.success(), "{output:?}");
        output.stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn cli_rejects_bad_usage_with_exit_code_2() {
    let exe = assert_cmd::cargo_bin!("lamantin");
    Command::new(exe)
        .args(["--direction", "sideways"])
        .arg(fixture())
        .assert()
        .code(2);
}

#[test]
fn cli_reports_unknown_ports_with_exit_code_1() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let input = tmp.path().join("broken.json");
    fs::write(
        &input,
        r#"{"layers": [{"nodes": [{"id": "a"}]}], "edges": [{"id": "e", "source": "x", "target": "y"}]}"#,
    )
    .expect("write input");

    let exe = assert_cmd::cargo_bin!("lamantin");
    let output = Command::new(exe).arg(&input).output().expect("run lamantin");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid graph"), "{stderr}");
}
