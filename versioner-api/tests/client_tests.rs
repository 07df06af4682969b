use httpmock::Method::{GET, POST};
use httpmock::MockServer;
use serde_json::json;
use std::net::TcpListener;
use versioner_api::{
    ApiClient, ApiConfig, ApiError, CreateVersionRequest, DatasetService, FileEntry, PageRequest,
};
use versioner_core::{DatasetId, DatumId, ExecutionId, VersionId};

const TOKEN: &str = "secret-token";

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(ApiConfig::new(server.base_url(), TOKEN)).expect("client")
}

#[test]
fn dataset_and_version_lookups_send_token_header() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let dataset_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v0/datasets/ds-1/")
            .header("authorization", format!("Token {TOKEN}"));
        then.status(200).json_body(json!({
            "id": "ds-1",
            "name": "weather",
            "latest_version": {"id": "v-7", "name": "20240101-000000"}
        }));
    });
    let version_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v0/dataset-versions/v-7/")
            .header("authorization", format!("Token {TOKEN}"));
        then.status(200).json_body(json!({
            "id": "v-7",
            "name": "20240101-000000",
            "files": [
                {"datum": {"id": "d-1", "name": "a.csv", "size": 6, "md5": "abc", "sha1": null}},
                {"datum": {"id": "d-2", "name": "b.csv", "size": 7}}
            ]
        }));
    });

    let client = client_for(&server);
    let dataset = client.dataset(&DatasetId::from("ds-1")).expect("dataset");
    assert_eq!(dataset.name, "weather");
    let latest = dataset.latest_version.expect("latest version");
    assert_eq!(latest.id, VersionId::from("v-7"));

    let version = client.dataset_version(&latest.id).expect("version");
    let names: Vec<_> = version.datums().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["a.csv", "b.csv"]);

    dataset_mock.assert();
    version_mock.assert();
}

#[test]
fn execution_outputs_sends_paging_and_filter_params() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/v0/data/")
            .query_param("ordering", "id")
            .query_param("limit", "100")
            .query_param("offset", "200")
            .query_param("output_execution", "exec-1")
            .query_param("exclude", "output_execution,project")
            .query_param("purged", "false");
        then.status(200).json_body(json!({
            "count": 2,
            "results": [
                {"id": "datum-2", "name": "c.csv"},
                {"id": "datum-3", "name": "_dataset-manifest.json"}
            ]
        }));
    });

    let client = client_for(&server);
    let page = PageRequest::first(100).next().next();
    let items = client
        .execution_outputs(&ExecutionId::from("exec-1"), page)
        .expect("outputs");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, DatumId::from("datum-2"));
    mock.assert();
}

#[test]
fn create_version_posts_membership_and_returns_id() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/v0/dataset-versions/")
            .header("authorization", format!("Token {TOKEN}"))
            .json_body(json!({
                "previous_version": "v-7",
                "name": "20240601-120000",
                "dataset": "ds-1",
                "files": [{"datum": "datum-1"}, {"datum": "datum-2"}]
            }));
        then.status(201)
            .json_body(json!({"id": "v-8", "name": "20240601-120000"}));
    });

    let client = client_for(&server);
    let created = client
        .create_dataset_version(&CreateVersionRequest {
            previous_version: Some(VersionId::from("v-7")),
            name: "20240601-120000".to_string(),
            dataset: DatasetId::from("ds-1"),
            files: vec![
                FileEntry {
                    datum: DatumId::from("datum-1"),
                },
                FileEntry {
                    datum: DatumId::from("datum-2"),
                },
            ],
        })
        .expect("create");
    assert_eq!(created.id, VersionId::from("v-8"));
    mock.assert();
}

#[test]
fn error_status_carries_response_body() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/v0/dataset-versions/");
        then.status(422)
            .body(r#"{"name": ["Version with this name already exists."]}"#);
    });
    server.mock(|when, then| {
        when.method(GET).path("/api/v0/datasets/missing/");
        then.status(404).body("not found");
    });

    let client = client_for(&server);
    let err = client
        .create_dataset_version(&CreateVersionRequest {
            previous_version: None,
            name: "n".to_string(),
            dataset: DatasetId::from("ds-1"),
            files: vec![],
        })
        .expect_err("422 must fail");
    match err {
        ApiError::Status { status, body, .. } => {
            assert_eq!(status, 422);
            assert!(body.contains("already exists"), "body was {body}");
        }
        other => panic!("expected status error, got {other:?}"),
    }

    let err = client
        .dataset(&DatasetId::from("missing"))
        .expect_err("404 must fail");
    assert_eq!(err.status(), Some(404));
}

#[test]
fn transport_failure_is_not_a_status_error() {
    if !can_bind_localhost() {
        eprintln!("Skipping transport test: cannot bind to localhost");
        return;
    }

    // Reserve a port, then release it so nothing is listening there.
    let port = TcpListener::bind("127.0.0.1:0")
        .expect("bind")
        .local_addr()
        .expect("addr")
        .port();
    let client = ApiClient::new(ApiConfig::new(format!("http://127.0.0.1:{port}"), TOKEN))
        .expect("client");
    let err = client
        .dataset(&DatasetId::from("ds-1"))
        .expect_err("connection must fail");
    assert!(
        matches!(err, ApiError::Transport { .. }),
        "expected transport error, got {err:?}"
    );
}
