//! Integration tests for the Artifact Audit Agent

use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use artifact_audit::client::{ArtifactClient, ClientConfig};
use artifact_audit::contracts::{
    AuditLimits, BlockSpec, BlockStatus, ReasonCode, Severity,
};
use artifact_audit::engine::{AuditEngine, LiveAuditor, LocalAuditor};
use artifact_audit::registry::load_registry;

fn test_client() -> ArtifactClient {
    ArtifactClient::new(ClientConfig {
        timeout_ms: 1_000,
        max_attempts: 3,
        backoff_ms: 10,
        retry_after_cap_ms: 50,
    })
}

fn live_auditor(base_url: &str, limits: AuditLimits) -> LiveAuditor {
    LiveAuditor::new(AuditEngine::new(limits), test_client(), base_url)
}

#[test]
fn test_local_end_to_end_field_shape() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("market.json"),
        r#"{"schemaVersion": "1.2", "data": {"a": {"b": 1}, "c": []}}"#,
    )
    .unwrap();

    let auditor = LocalAuditor::new(AuditEngine::new(AuditLimits::default()), dir.path());
    let report = auditor.run(vec![BlockSpec::bare("market", "market.json")], vec![]);

    let block = &report.blocks[0];
    assert_eq!(block.status, BlockStatus::Ok);
    assert_eq!(block.schema_version, "1.2");
    assert!(block.block_errors.is_empty());

    let paths: Vec<&str> = block.fields.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["/a", "/a/b", "/c"]);

    assert!(block.fields[0].valid);
    assert!(block.fields[1].valid);
    let c = &block.fields[2];
    assert_eq!(c.severity, Severity::Warn);
    assert_eq!(c.reasons[0].code(), ReasonCode::DataEmpty);

    // field-level WARN rolls into the summary without failing the block
    assert_eq!(report.summary.severity_count(Severity::Warn), 1);
    assert!(!report.summary.has_critical());
}

#[test]
fn test_local_registry_required_fields_and_overrides() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("registry.json"),
        r#"{"features": [{
            "blockId": "snapshot",
            "mirrorPath": "snapshot.json",
            "requiredFields": ["summary.updatedAt", "summary.missing"],
            "overrides": [{"path": "/summary/missing", "required": false}]
        }]}"#,
    )
    .unwrap();

    let stale = (Utc::now() - ChronoDuration::hours(25)).to_rfc3339();
    std::fs::write(
        dir.path().join("snapshot.json"),
        serde_json::to_string(&json!({
            "data": { "summary": { "updatedAt": stale } }
        }))
        .unwrap(),
    )
    .unwrap();

    let discovery = load_registry(&dir.path().join("registry.json")).unwrap();
    let auditor = LocalAuditor::new(AuditEngine::new(AuditLimits::default()), dir.path());
    let report = auditor.run(discovery.specs, discovery.trace);

    let block = &report.blocks[0];
    assert_eq!(block.status, BlockStatus::Ok);

    let updated = block
        .fields
        .iter()
        .find(|f| f.path == "/summary/updatedAt")
        .unwrap();
    assert_eq!(updated.reasons[0].code(), ReasonCode::StaleData);
    assert_eq!(updated.reasons[0].severity(), Severity::Warn);

    // the required path never resolved, but the override relaxes it
    let missing = block
        .fields
        .iter()
        .find(|f| f.path == "/summary/missing")
        .unwrap();
    assert!(!missing.present);
    assert_eq!(missing.reasons[0].code(), ReasonCode::FieldMissing);
    assert_eq!(missing.severity, Severity::Warn);

    assert!(report.trace.iter().any(|t| t.step == "registry-load"));
}

#[tokio::test]
async fn test_live_happy_path_matches_local_shape() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/market.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"a": {"b": 1}, "c": []}})),
        )
        .mount(&server)
        .await;

    let auditor = live_auditor(&server.uri(), AuditLimits::default());
    let report = auditor
        .run(vec![BlockSpec::bare("market", "market.json")], vec![])
        .await;

    let block = &report.blocks[0];
    assert_eq!(block.status, BlockStatus::Ok);
    let paths: Vec<&str> = block.fields.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["/a", "/a/b", "/c"]);
}

#[tokio::test]
async fn test_live_results_sorted_by_block_id() {
    let server = MockServer::start().await;
    for name in ["alpha", "bravo", "charlie", "delta", "echo"] {
        Mock::given(method("GET"))
            .and(path(format!("/{}.json", name)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"v": 1}})))
            .mount(&server)
            .await;
    }

    let specs = vec![
        BlockSpec::bare("echo", "echo.json"),
        BlockSpec::bare("alpha", "alpha.json"),
        BlockSpec::bare("delta", "delta.json"),
        BlockSpec::bare("bravo", "bravo.json"),
        BlockSpec::bare("charlie", "charlie.json"),
    ];

    let auditor = live_auditor(&server.uri(), AuditLimits::default());
    let report = auditor.run(specs, vec![]).await;

    let ids: Vec<&str> = report.blocks.iter().map(|b| b.block_id.as_str()).collect();
    assert_eq!(ids, vec!["alpha", "bravo", "charlie", "delta", "echo"]);
}

#[tokio::test]
async fn test_live_transient_500_recovers_after_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky.json"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"ok": true}})))
        .mount(&server)
        .await;

    let auditor = live_auditor(&server.uri(), AuditLimits::default());
    let report = auditor
        .run(vec![BlockSpec::bare("flaky", "flaky.json")], vec![])
        .await;

    assert_eq!(report.blocks[0].status, BlockStatus::Ok);
}

#[tokio::test]
async fn test_live_404_fails_immediately_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let auditor = live_auditor(&server.uri(), AuditLimits::default());
    let report = auditor
        .run(vec![BlockSpec::bare("gone", "gone.json")], vec![])
        .await;

    let block = &report.blocks[0];
    assert_eq!(block.status, BlockStatus::Error);
    assert_eq!(block.block_errors[0].code(), ReasonCode::UpstreamError);
    server.verify().await;
}

#[tokio::test]
async fn test_live_persistent_500_exhausts_three_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down.json"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let auditor = live_auditor(&server.uri(), AuditLimits::default());
    let report = auditor
        .run(vec![BlockSpec::bare("down", "down.json")], vec![])
        .await;

    let block = &report.blocks[0];
    assert_eq!(block.status, BlockStatus::Error);
    assert_eq!(block.block_errors[0].code(), ReasonCode::UpstreamError);
    server.verify().await;
}

#[tokio::test]
async fn test_live_timeout_classifies_as_network_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {}}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let auditor = LiveAuditor::new(
        AuditEngine::new(AuditLimits::default()),
        ArtifactClient::new(ClientConfig {
            timeout_ms: 100,
            max_attempts: 2,
            backoff_ms: 10,
            retry_after_cap_ms: 50,
        }),
        server.uri(),
    );
    let report = auditor
        .run(vec![BlockSpec::bare("slow", "slow.json")], vec![])
        .await;

    let block = &report.blocks[0];
    assert_eq!(block.status, BlockStatus::Error);
    assert_eq!(block.block_errors[0].code(), ReasonCode::NetworkTimeout);
}

#[tokio::test]
async fn test_live_circuit_breaker_suppresses_tail_of_queue() {
    let server = MockServer::start().await;
    for name in ["a1", "a2", "a3", "a4", "a5"] {
        Mock::given(method("GET"))
            .and(path(format!("/{}.json", name)))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
    }
    // the block sorted last must never be fetched
    Mock::given(method("GET"))
        .and(path("/z9.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .expect(0)
        .mount(&server)
        .await;

    let specs = vec![
        BlockSpec::bare("a1", "a1.json"),
        BlockSpec::bare("a2", "a2.json"),
        BlockSpec::bare("a3", "a3.json"),
        BlockSpec::bare("a4", "a4.json"),
        BlockSpec::bare("a5", "a5.json"),
        BlockSpec::bare("z9", "z9.json"),
    ];

    let auditor = live_auditor(&server.uri(), AuditLimits::default());
    let report = auditor.run(specs, vec![]).await;

    let last = report.blocks.iter().find(|b| b.block_id == "z9").unwrap();
    assert_eq!(last.status, BlockStatus::NotAudited);
    assert_eq!(last.block_errors[0].code(), ReasonCode::CircuitOpen);
    server.verify().await;

    // every block that was fetched failed upstream; none succeeded
    assert!(report
        .blocks
        .iter()
        .all(|b| b.status != BlockStatus::Ok));
}

#[tokio::test]
async fn test_live_zero_budget_beats_circuit_breaker() {
    let server = MockServer::start().await;

    let mut limits = AuditLimits::default();
    limits.max_audit_time_ms = 0;
    let auditor = live_auditor(&server.uri(), limits);

    let report = auditor
        .run(
            vec![
                BlockSpec::bare("a", "a.json"),
                BlockSpec::bare("b", "b.json"),
            ],
            vec![],
        )
        .await;

    for block in &report.blocks {
        assert_eq!(block.status, BlockStatus::NotAudited);
        assert_eq!(block.block_errors[0].code(), ReasonCode::LimitExceeded);
    }
}

#[tokio::test]
async fn test_handler_health_and_audit_round_trip() {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/m.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"x": 1}})))
        .mount(&server)
        .await;

    let state = Arc::new(artifact_audit::handler::AppState::new().unwrap());
    let router = artifact_audit::handler::create_router(state);

    let health = router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let payload = json!({
        "baseUrl": server.uri(),
        "features": [{"blockId": "m", "mirrorPath": "m.json"}],
        "options": {"timeoutMs": 1000}
    });
    let response = router
        .oneshot(
            Request::post("/api/v1/audit")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["blocks"][0]["status"], "OK");
}

#[test]
fn test_report_is_deterministic_for_same_tree() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("a.json"),
        r#"{"data": {"z": 1, "m": {"k": [1, 2]}, "a": true}}"#,
    )
    .unwrap();

    let run = || {
        let auditor = LocalAuditor::new(AuditEngine::new(AuditLimits::default()), dir.path());
        let report = auditor.run(vec![BlockSpec::bare("a", "a.json")], vec![]);
        report.blocks[0]
            .fields
            .iter()
            .map(|f| f.path.clone())
            .collect::<Vec<_>>()
    };

    assert_eq!(run(), run());
    assert_eq!(
        run(),
        vec!["/a", "/m", "/m/k", "/m/k/0", "/m/k/1", "/z"]
    );
}
