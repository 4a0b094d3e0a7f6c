//! Build lifecycle test against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every client call
//! over real HTTP through the default `UreqTransport`.

use std::net::SocketAddr;

use cloudbuild_core::options::{with_access_token, with_endpoint};
use cloudbuild_core::{ApiError, BuildConfig, BuildStatus, BuildStep, Client};

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn client(addr: SocketAddr, project: &str) -> Client {
    Client::new(project)
        .option(with_endpoint(format!("http://{addr}/")))
        .option(with_access_token("integration-token"))
}

fn one_step() -> BuildConfig {
    BuildConfig::from_yaml_str(
        "steps:\n  - name: gcr.io/example/build\n    args: [build, .]\ntags: [integration]\n",
    )
    .unwrap()
}

#[test]
fn build_lifecycle() {
    let addr = start_server();
    let client = client(addr, "demo");

    // Step 1: list, empty project.
    let page = client.list(0, "", "").unwrap();
    assert!(page.builds.is_empty());
    assert!(page.next_page_token.is_none());

    // Step 2: create.
    let op = client.create(one_step()).unwrap();
    assert!(!op.done);
    op.check().unwrap();
    let build_id = op.build_id().unwrap().to_string();
    assert_eq!(op.name, format!("operations/build/demo/{build_id}"));

    // Step 3: get via the operation.
    let build = client.execute(op.get_progress().unwrap()).unwrap();
    assert_eq!(build.id.as_deref(), Some(build_id.as_str()));
    assert_eq!(build.project_id.as_deref(), Some("demo"));
    assert_eq!(build.status, Some(BuildStatus::Queued));
    assert_eq!(build.steps, vec![BuildStep::new("gcr.io/example/build", ["build", "."])]);
    assert_eq!(build.tags, vec!["integration"]);
    assert!(build.create_time.is_some());

    // Step 4: cancel.
    let cancelled = client.cancel(&build_id).unwrap();
    assert_eq!(cancelled.status, Some(BuildStatus::Cancelled));
    assert!(cancelled.finish_time.is_some());

    // Step 5: retry starts a new build from the same steps.
    let retried = client.retry(&build_id).unwrap();
    let retried_id = retried.build_id().unwrap().to_string();
    assert_ne!(retried_id, build_id);
    assert_eq!(retried.build().unwrap().steps, build.steps);

    // Step 6: list pages newest first.
    let page = client.list(1, "", "").unwrap();
    assert_eq!(page.builds.len(), 1);
    assert_eq!(page.builds[0].id.as_deref(), Some(retried_id.as_str()));
    let token = page.next_page_token.unwrap();

    let page = client.list(1, &token, "").unwrap();
    assert_eq!(page.builds[0].id.as_deref(), Some(build_id.as_str()));
    assert!(page.next_page_token.is_none());

    // Step 7: filter by status.
    let page = client.list(0, "", r#"status="CANCELLED""#).unwrap();
    assert_eq!(page.builds.len(), 1);
    assert_eq!(page.builds[0].status, Some(BuildStatus::Cancelled));
}

#[test]
fn unknown_build_is_not_found() {
    let addr = start_server();
    let err = client(addr, "demo").get("does-not-exist").unwrap_err();
    assert!(err.is_not_found());
    match err {
        ApiError::Status { error: Some(status), .. } => {
            assert_eq!(status.status, "NOT_FOUND");
            assert_eq!(status.code, 404);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_token_is_rejected() {
    let addr = start_server();
    let client = Client::new("demo").option(with_endpoint(format!("http://{addr}")));
    let err = client.list(0, "", "").unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 401, .. }));
}

#[test]
fn invalid_build_reports_service_error() {
    let addr = start_server();
    let err = client(addr, "demo").create(BuildConfig::new()).unwrap_err();
    match err {
        ApiError::Status { status: 400, error: Some(status) } => {
            assert_eq!(status.status, "INVALID_ARGUMENT")
        }
        other => panic!("unexpected error: {other}"),
    }
}
