//! End-to-end tests for the cytovs binary
//!
//! These tests validate:
//! - Offline classification output and threshold flags
//! - Input and configuration errors with a non-zero exit
//! - Liveness checks against a mock CyREST server
//! - A full run against mocked STRING, reference and Cytoscape services

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::{
    matchers::{method, path, path_regex},
    Mock, MockServer, ResponseTemplate,
};

const COMPARTMENTS: &str = "compartment::cytosol,compartment::nucleus,compartment::mitochondrion,\
compartment::endoplasmic reticulum,compartment::golgi apparatus,compartment::plasma membrane,\
compartment::extracellular";

/// Command with an empty config file and no inherited service overrides
fn cytovs(dir: &TempDir) -> Command {
    let config = dir.path().join("config.toml");
    fs::write(&config, "").expect("Failed to write config");

    let mut cmd = Command::cargo_bin("cytovs").expect("binary exists");
    cmd.arg("--config")
        .arg(&config)
        .env_remove("CYTOVS_STRING_URL")
        .env_remove("CYTOVS_REFERENCE_URL")
        .env_remove("CYTOVS_CYTOSCAPE_URL")
        .env_remove("CYTOVS_MAPPING_TIMEOUT_SECS")
        .env_remove("LOG_LEVEL")
        .env_remove("LOG_DIR");
    cmd
}

/// Export that already carries compartment scores
fn write_scored_export(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("scored.csv");
    let content = format!(
        "identifier,HexNAc,PSM,{}\n\
         P1,0,10,9,0,0,0,0,0,0\n\
         P2,2,3,0,0,0,0,0,0,5\n\
         P3,2,3,4.5,0,0,0,0,0,0\n\
         P4,2,12,4.5,0,0,0,0,0,0\n\
         P5,2,12,4.0,0,0,0,0,0,4.4\n",
        COMPARTMENTS
    );
    fs::write(&path, content).expect("Failed to write export");
    path
}

fn labels(csv: &str) -> Vec<String> {
    let mut reader = csv::Reader::from_reader(csv.as_bytes());
    let headers = reader.headers().expect("header").clone();
    let idx = headers
        .iter()
        .position(|h| h == "O-GlcNAc probability")
        .expect("label column");
    reader
        .records()
        .map(|r| r.expect("record")[idx].to_string())
        .collect()
}

#[test]
fn test_classify_writes_labels_to_stdout() {
    let dir = TempDir::new().unwrap();
    let input = write_scored_export(&dir);

    let output = cytovs(&dir)
        .args(["classify", "--input"])
        .arg(&input)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("identifier,HexNAc,PSM,compartment::cytosol"));
    assert_eq!(
        labels(&stdout),
        vec![
            "No HexNAc",
            "Extracellular HexNAc",
            "O-GlcNAcylated proteins",
            "Top O-GlcNAc Targets",
            "Unknown HexNAc",
        ]
    );
}

#[test]
fn test_classify_threshold_flags() {
    let dir = TempDir::new().unwrap();
    let input = write_scored_export(&dir);
    let output_path = dir.path().join("labelled.csv");

    cytovs(&dir)
        .args(["classify", "--cytosol", "5", "--psm-cutoff", "20", "--input"])
        .arg(&input)
        .arg("--output")
        .arg(&output_path)
        .assert()
        .success()
        .stderr(predicate::str::contains("Classified 5 proteins"));

    let written = fs::read_to_string(&output_path).unwrap();
    assert_eq!(
        labels(&written),
        vec![
            "No HexNAc",
            "Extracellular HexNAc",
            "Unknown HexNAc",
            "Unknown HexNAc",
            "Unknown HexNAc",
        ]
    );
}

#[test]
fn test_classify_missing_compartment_column() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("plain.csv");
    fs::write(&input, "identifier,HexNAc,PSM\nP1,1,2\n").unwrap();

    cytovs(&dir)
        .args(["classify", "--input"])
        .arg(&input)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("compartment::endoplasmic reticulum"));
}

#[test]
fn test_classify_missing_required_column() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bad.csv");
    fs::write(&input, "identifier,PSM\nP1,2\n").unwrap();

    cytovs(&dir)
        .args(["classify", "--input"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing required column 'HexNAc'"));
}

#[test]
fn test_classify_requires_input() {
    let dir = TempDir::new().unwrap();

    cytovs(&dir)
        .arg("classify")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no input file given"));
}

#[test]
fn test_no_subcommand() {
    let dir = TempDir::new().unwrap();

    cytovs(&dir)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("A subcommand is required"));
}

#[test]
fn test_markdown_help() {
    let dir = TempDir::new().unwrap();

    cytovs(&dir)
        .arg("--markdown-help")
        .assert()
        .success()
        .stdout(predicate::str::contains("cytovs classify"));
}

#[test]
fn test_committed_cli_reference_is_current() {
    let committed = include_str!("../../../docs/cli.md");
    let current = clap_markdown::help_markdown::<cytovs_cli::Cli>();
    assert!(
        committed.contains(&current),
        "docs/cli.md is stale; run `cargo run -p xtask -- generate-cli-docs`"
    );
}

#[tokio::test]
async fn test_ping_reachable() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/version"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"apiVersion": "v1", "cytoscapeVersion": "3.10.2"})),
        )
        .mount(&server)
        .await;

    cytovs(&dir)
        .args(["ping", "--cytoscape-url", &server.uri()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cytoscape 3.10.2 is reachable"));
}

#[test]
fn test_ping_unreachable() {
    let dir = TempDir::new().unwrap();

    cytovs(&dir)
        .env("CYTOVS_CYTOSCAPE_URL", "http://127.0.0.1:9")
        .arg("ping")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not reachable"));
}

fn node(name: &str, cytosol: f64) -> Value {
    json!({
        "SUID": 1,
        "name": name,
        "display name": name,
        "compartment::cytosol": cytosol,
        "compartment::nucleus": 0.0,
        "compartment::mitochondrion": 0.0,
        "compartment::endoplasmic reticulum": 0.0,
        "compartment::golgi apparatus": 0.0,
        "compartment::plasma membrane": 0.0,
        "compartment::extracellular": 0.0
    })
}

fn command_ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"data": data, "errors": []}))
}

/// STRING, reference list and CyREST on one mock server
async fn mock_everything() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/json/get_string_ids"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"queryItem": "P1", "stringId": "9606.A", "taxonName": "Homo sapiens", "preferredName": "A"},
            {"queryItem": "P2", "stringId": "9606.B", "taxonName": "Homo sapiens", "preferredName": "B"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reference.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string("UniProt ID\nP2\n"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/version"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"apiVersion": "v1", "cytoscapeVersion": "3.10.2"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/networks/currentNetwork"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"networkSUID": 7}})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/networks/7/tables/defaultedge/columns/name"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"name": "name", "values": ["9606.A (pp) 9606.B"]})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/networks/7/tables/defaultnode/rows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            node("9606.A", 6.0),
            node("9606.B", 0.0),
            node("9606.C", 0.0)
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/commands/vizmap/load%20file"))
        .respond_with(command_ok(json!(["Cytovs O-GlcNAc"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/v1/commands/"))
        .respond_with(command_ok(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/networks/7/tables/defaultnode"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path_regex(r"^/v1/networks/7/tables/defaultnode/columns/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/v1/apply/styles/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    server
}

#[tokio::test]
async fn test_run_against_mocked_services() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("proteins.csv");
    fs::write(&input, "identifier,HexNAc,PSM\nP1,3,12\nP2,1,2\nP3,1,40\n").unwrap();
    let server = mock_everything().await;

    let output = cytovs(&dir)
        .args(["run", "--json", "--input"])
        .arg(&input)
        .args(["--string-url", &server.uri()])
        .args(["--cytoscape-url", &server.uri()])
        .args(["--reference-url", &format!("{}/reference.csv", server.uri())])
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["input_records"], 3);
    assert_eq!(report["mapped"], 2);
    assert_eq!(report["excluded"], json!(["P3"]));
    assert_eq!(report["hidden_nodes"], json!(["9606.C"]));
    assert_eq!(report["published_rows"], 2);
    assert_eq!(report["reference_matches"], 1);
    assert_eq!(report["style_name"], "Cytovs O-GlcNAc");
    assert_eq!(report["label_counts"]["Top O-GlcNAc Targets"], 1);
    assert_eq!(report["label_counts"]["Unknown HexNAc"], 1);

    let requests = server.received_requests().await.unwrap();
    let upsert = requests
        .iter()
        .find(|r| r.method.as_str() == "PUT")
        .expect("node table upsert");
    let body: Value = serde_json::from_slice(&upsert.body).unwrap();
    assert_eq!(body["key"], "name");
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["9606.A", "9606.B"]);
}

#[tokio::test]
async fn test_run_with_no_mapped_identifiers() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("proteins.csv");
    fs::write(&input, "identifier,HexNAc,PSM\nP9,3,12\n").unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/json/get_string_ids"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    cytovs(&dir)
        .args(["run", "--input"])
        .arg(&input)
        .args(["--string-url", &server.uri()])
        .args(["--cytoscape-url", &server.uri()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("None of the 1 input identifiers"));

    // Nothing but the mapping call reached the server
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}
