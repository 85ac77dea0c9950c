//! Integration tests for STRING identifier mapping
//!
//! A responder echoes back one record per submitted identifier so that batch
//! boundaries and result merging can be checked against the requests the
//! mock server actually received.

use cytovs_cli::api::StringMapper;
use cytovs_cli::CliError;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use wiremock::{
    matchers::{body_string_contains, method, path},
    Mock, MockServer, Request, Respond, ResponseTemplate,
};

/// Value of one field of a form-encoded request body
fn form_field(request: &Request, key: &str) -> Option<String> {
    url::form_urlencoded::parse(&request.body)
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

fn submitted(request: &Request) -> Vec<String> {
    form_field(request, "identifiers")
        .unwrap_or_default()
        .split('\r')
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

fn record(identifier: &str) -> Value {
    json!({
        "queryIndex": 0,
        "queryItem": identifier,
        "stringId": format!("9606.ENSP{}", identifier),
        "ncbiTaxonId": 9606,
        "taxonName": "Homo sapiens",
        "preferredName": format!("GENE{}", identifier),
        "annotation": "annotation"
    })
}

/// Maps every submitted identifier except the `unknown` ones
struct EchoStringIds {
    unknown: HashSet<String>,
}

impl Respond for EchoStringIds {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let records: Vec<Value> = submitted(request)
            .iter()
            .filter(|id| !self.unknown.contains(*id))
            .map(|id| record(id))
            .collect();
        ResponseTemplate::new(200).set_body_json(records)
    }
}

/// Echoes identifiers but fails the n-th call
struct FailOnCall {
    fail_on: usize,
    calls: AtomicUsize,
}

impl Respond for FailOnCall {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            return ResponseTemplate::new(503).set_body_string("rate limited");
        }
        let records: Vec<Value> = submitted(request).iter().map(|id| record(id)).collect();
        ResponseTemplate::new(200).set_body_json(records)
    }
}

fn identifiers(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("P{:05}", i)).collect()
}

fn mapper(server: &MockServer) -> StringMapper {
    StringMapper::new(server.uri(), Duration::from_secs(10)).expect("mapper")
}

#[tokio::test]
async fn test_mapping_splits_into_batches() {
    let server = MockServer::start().await;
    let ids = identifiers(2500);
    let unknown: HashSet<String> = ids.iter().step_by(7).cloned().collect();

    Mock::given(method("POST"))
        .and(path("/json/get_string_ids"))
        .respond_with(EchoStringIds {
            unknown: unknown.clone(),
        })
        .expect(3)
        .mount(&server)
        .await;

    let mappings = mapper(&server)
        .map_identifiers(&ids, 1000)
        .await
        .expect("mapping succeeds");

    let requests = server.received_requests().await.expect("recording enabled");
    let sizes: Vec<usize> = requests.iter().map(|r| submitted(r).len()).collect();
    assert_eq!(sizes, vec![1000, 1000, 500]);

    // Batches are consecutive slices of the input
    let sent: Vec<String> = requests.iter().flat_map(submitted).collect();
    assert_eq!(sent, ids);

    assert_eq!(mappings.len(), ids.len() - unknown.len());
    let mapped: HashSet<&str> = mappings.iter().map(|m| m.identifier.as_str()).collect();
    for id in &ids {
        assert_eq!(mapped.contains(id.as_str()), !unknown.contains(id), "{}", id);
    }
    assert!(mapped.contains("P02498"));

    let last = mappings.last().expect("non-empty");
    assert_eq!(last.string_id, "9606.ENSPP02498");
    assert_eq!(last.species, "Homo sapiens");
    assert_eq!(last.display_name, "GENEP02498");
}

#[tokio::test]
async fn test_mapping_sends_fixed_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/json/get_string_ids"))
        .and(body_string_contains("species=9606"))
        .respond_with(EchoStringIds {
            unknown: HashSet::new(),
        })
        .expect(1)
        .mount(&server)
        .await;

    mapper(&server)
        .with_species(Some(9606))
        .map_identifiers(&identifiers(3), 1000)
        .await
        .expect("mapping succeeds");

    let requests = server.received_requests().await.expect("recording enabled");
    let request = &requests[0];
    assert_eq!(form_field(request, "limit").as_deref(), Some("1"));
    assert_eq!(form_field(request, "echo_query").as_deref(), Some("1"));
    assert_eq!(form_field(request, "caller_identity").as_deref(), Some("cytovs"));
}

#[tokio::test]
async fn test_failed_batch_aborts_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/json/get_string_ids"))
        .respond_with(FailOnCall {
            fail_on: 2,
            calls: AtomicUsize::new(0),
        })
        .mount(&server)
        .await;

    let err = mapper(&server)
        .map_identifiers(&identifiers(25), 10)
        .await
        .unwrap_err();

    match err {
        CliError::MappingBatch { batch, of, status } => {
            assert_eq!(batch, 2);
            assert_eq!(of, 3);
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        }
        other => panic!("unexpected error: {other}"),
    }

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_first_record_per_identifier_wins() {
    let server = MockServer::start().await;
    let mut second = record("P1");
    second["stringId"] = json!("9606.OTHER");

    Mock::given(method("POST"))
        .and(path("/json/get_string_ids"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            record("P1"),
            second,
            record("P2")
        ])))
        .mount(&server)
        .await;

    let ids = vec!["P1".to_string(), "P2".to_string(), "P3".to_string()];
    let mappings = mapper(&server).map_identifiers(&ids, 1000).await.unwrap();

    assert_eq!(mappings.len(), 2);
    assert_eq!(mappings[0].identifier, "P1");
    assert_eq!(mappings[0].string_id, "9606.ENSPP1");
    assert_eq!(mappings[1].identifier, "P2");
}

#[tokio::test]
async fn test_shared_string_id_is_preserved() {
    let server = MockServer::start().await;
    let mut isoform = record("P1-2");
    isoform["stringId"] = json!("9606.ENSPP1");

    Mock::given(method("POST"))
        .and(path("/json/get_string_ids"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([record("P1"), isoform])))
        .mount(&server)
        .await;

    let ids = vec!["P1".to_string(), "P1-2".to_string()];
    let mappings = mapper(&server).map_identifiers(&ids, 1000).await.unwrap();

    assert_eq!(mappings.len(), 2);
    assert!(mappings.iter().all(|m| m.string_id == "9606.ENSPP1"));
}
