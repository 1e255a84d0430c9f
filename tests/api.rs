//! HTTP surface tests against an in-memory SQLite database with the default
//! catalog installed.

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{Duration, Local, NaiveDate};
use serde_json::{json, Value};

use proctrack::api::{build_router, AppState};
use proctrack::db::{create_test_pool, migrations::run_migrations};

async fn test_server() -> TestServer {
    let pool = create_test_pool().await.expect("Failed to create pool");
    run_migrations(&pool).await.expect("Failed to run migrations");

    let state = AppState::new(pool);
    state
        .catalog_service
        .seed_defaults()
        .await
        .expect("Failed to seed catalog");

    TestServer::new(build_router(state, "*")).expect("Failed to start test server")
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn create(server: &TestServer, protocol: &str, created_date: &str) -> Value {
    let response = server
        .post("/api/v1/processes")
        .json(&json!({
            "protocol_number": protocol,
            "type_code": "PROM_CAP",
            "applicant_name": "Ana Souza",
            "created_date": created_date,
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json()
}

#[tokio::test]
async fn health_check_returns_ok() {
    let server = test_server().await;

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn catalog_endpoints_list_seeded_entries() {
    let server = test_server().await;

    let types: Value = server.get("/api/v1/process-types").await.json();
    let codes: Vec<&str> = types["process_types"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["PROG_MER", "PROM_CAP"]);

    let statuses: Value = server.get("/api/v1/statuses").await.json();
    assert_eq!(statuses["statuses"].as_array().unwrap().len(), 7);

    let documents: Value = server.get("/api/v1/documents").await.json();
    assert_eq!(documents["documents"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn create_and_get_process() {
    let server = test_server().await;

    let created = create(&server, "PGR-2025-001", "2025-12-01").await;
    assert_eq!(created["protocol_number"], "PGR-2025-001");
    assert_eq!(created["type_code"], "PROM_CAP");
    assert_eq!(created["status_code"], "RECEIVED");
    assert_eq!(created["created_date"], "2025-12-01");

    let response = server.get("/api/v1/processes/PGR-2025-001").await;
    response.assert_status_ok();
    let detail: Value = response.json();

    assert_eq!(detail["type"]["code"], "PROM_CAP");
    assert_eq!(detail["status"]["code"], "RECEIVED");

    let documents: Vec<&str> = detail["documents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["code"].as_str().unwrap())
        .collect();
    assert_eq!(documents, vec!["RG", "CPF", "CERT_COURSE", "SUPERVISOR_DECL"]);

    let deadlines: Vec<(&str, &str)> = detail["deadlines"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| (d["name"].as_str().unwrap(), d["due_date"].as_str().unwrap()))
        .collect();
    assert_eq!(deadlines.len(), 3);
    assert!(deadlines.contains(&("Document complement", "2025-12-22")));
    assert!(deadlines.contains(&("Initial instruction", "2025-12-31")));
    assert!(deadlines.contains(&("Training analysis", "2025-12-31")));
}

#[tokio::test]
async fn duplicate_protocol_is_conflict() {
    let server = test_server().await;
    create(&server, "PGR-2025-001", "2025-12-01").await;

    let response = server
        .post("/api/v1/processes")
        .json(&json!({
            "protocol_number": "PGR-2025-001",
            "type_code": "PROG_MER",
            "applicant_name": "Someone Else",
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "CONFLICT");

    let detail: Value = server.get("/api/v1/processes/PGR-2025-001").await.json();
    assert_eq!(detail["applicant_name"], "Ana Souza");
    assert_eq!(detail["type"]["code"], "PROM_CAP");
}

#[tokio::test]
async fn invalid_input_is_validation_error() {
    let server = test_server().await;

    let response = server
        .post("/api/v1/processes")
        .json(&json!({
            "protocol_number": "PGR-1",
            "type_code": "UNKNOWN",
            "applicant_name": "Ana",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let response = server
        .post("/api/v1/processes")
        .json(&json!({
            "protocol_number": "PGR-1",
            "type_code": "PROM_CAP",
            "applicant_name": "Ana",
            "created_date": "12/01/2025",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/v1/processes")
        .json(&json!({ "type_code": "PROM_CAP" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["details"]["reason"].is_string());
}

#[tokio::test]
async fn unknown_process_is_not_found() {
    let server = test_server().await;

    let response = server.get("/api/v1/processes/NOPE").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert!(body["error"].get("details").is_none());
}

#[tokio::test]
async fn list_processes_with_filters() {
    let server = test_server().await;
    create(&server, "PGR-1", "2025-12-01").await;
    create(&server, "PGR-2", "2025-12-02").await;
    server
        .post("/api/v1/processes")
        .json(&json!({
            "protocol_number": "PGR-3",
            "type_code": "PROG_MER",
            "applicant_name": "Bruno",
            "created_date": "2025-12-03",
        }))
        .await
        .assert_status(StatusCode::CREATED);

    let all: Value = server.get("/api/v1/processes").await.json();
    assert_eq!(all["total"], 3);
    assert_eq!(all["processes"][0]["protocol_number"], "PGR-3");

    let filtered: Value = server
        .get("/api/v1/processes")
        .add_query_param("type_code", "PROM_CAP")
        .await
        .json();
    assert_eq!(filtered["total"], 2);

    let blank: Value = server
        .get("/api/v1/processes?type_code=&status_code=")
        .await
        .json();
    assert_eq!(blank["total"], 3);
}

#[tokio::test]
async fn patch_updates_status_and_keeps_deadlines() {
    let server = test_server().await;
    create(&server, "PGR-1", "2025-12-01").await;

    let response = server
        .patch("/api/v1/processes/PGR-1")
        .json(&json!({
            "status_code": "IN_REVIEW",
            "financial_effective_date": "2026-01-01",
        }))
        .await;

    response.assert_status_ok();
    let detail: Value = response.json();
    assert_eq!(detail["status"]["code"], "IN_REVIEW");
    assert_eq!(detail["financial_effective_date"], "2026-01-01");
    assert_eq!(detail["applicant_name"], "Ana Souza");
    assert_eq!(detail["deadlines"].as_array().unwrap().len(), 3);

    let response = server
        .patch("/api/v1/processes/PGR-1")
        .json(&json!({ "status_code": "ARCHIVED" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn providing_last_document_creates_completion_deadline() {
    let server = test_server().await;
    create(&server, "PGR-1", "2025-12-01").await;

    for code in ["RG", "CPF", "CERT_COURSE"] {
        let outcome: Value = server
            .post(&format!("/api/v1/processes/PGR-1/documents/{}/provide", code))
            .json(&json!({ "provided_date": "2025-12-05" }))
            .await
            .json();
        assert_eq!(outcome["all_provided"], false);
        assert_eq!(outcome["deadlines_created"], 0);
    }

    let response = server
        .post("/api/v1/processes/PGR-1/documents/SUPERVISOR_DECL/provide")
        .json(&json!({ "provided_date": "2025-12-10", "observations": "signed" }))
        .await;
    response.assert_status_ok();
    let outcome: Value = response.json();
    assert_eq!(outcome["all_provided"], true);
    assert_eq!(outcome["deadlines_created"], 1);

    let detail: Value = server.get("/api/v1/processes/PGR-1").await.json();
    let final_decision = detail["deadlines"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["name"] == "Final decision")
        .expect("completion deadline missing");
    assert_eq!(final_decision["due_date"], "2026-01-09");

    let supervisor = detail["documents"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["code"] == "SUPERVISOR_DECL")
        .unwrap();
    assert_eq!(supervisor["provided"], true);
    assert_eq!(supervisor["observations"], "signed");

    // Providing again never duplicates the completion deadline
    let outcome: Value = server
        .post("/api/v1/processes/PGR-1/documents/RG/provide")
        .await
        .json();
    assert_eq!(outcome["all_provided"], true);
    assert_eq!(outcome["deadlines_created"], 0);
}

#[tokio::test]
async fn provide_unknown_document_is_not_found() {
    let server = test_server().await;
    create(&server, "PGR-1", "2025-12-01").await;

    server
        .post("/api/v1/processes/PGR-1/documents/PERF_REVIEW/provide")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .post("/api/v1/processes/PGR-1/documents/NOPE/provide")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .post("/api/v1/processes/PGR-404/documents/RG/provide")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn overdue_report_notify_and_close() {
    let server = test_server().await;
    create(&server, "PGR-OLD", "2025-01-02").await;

    let overdue: Value = server.get("/api/v1/deadlines/overdue").await.json();
    assert_eq!(overdue["total"], 3);
    let first = &overdue["deadlines"][0];
    assert_eq!(first["protocol_number"], "PGR-OLD");
    assert!(first["days_overdue"].as_i64().unwrap() > 0);
    assert_eq!(first["notified"], false);

    let notified: Value = server.post("/api/v1/deadlines/overdue/notify").await.json();
    assert_eq!(notified["marked"], 3);
    let notified: Value = server.post("/api/v1/deadlines/overdue/notify").await.json();
    assert_eq!(notified["marked"], 0);

    let id = first["id"].as_i64().unwrap();
    let response = server
        .post(&format!("/api/v1/deadlines/{}/close", id))
        .json(&json!({ "notes": "answered by letter" }))
        .await;
    response.assert_status_ok();
    let closed: Value = response.json();
    assert_eq!(closed["closed"], true);
    assert_eq!(closed["notified"], true);
    assert_eq!(closed["notes"], "answered by letter");

    let overdue: Value = server.get("/api/v1/deadlines/overdue").await.json();
    assert_eq!(overdue["total"], 2);
}

#[tokio::test]
async fn unknown_deadline_is_not_found() {
    let server = test_server().await;

    let response = server.post("/api/v1/deadlines/9999/close").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Deadline not found: 9999");

    server
        .post("/api/v1/deadlines/9999/notify")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_deadline_id_is_validation_error() {
    let server = test_server().await;

    for path in ["/api/v1/deadlines/abc/close", "/api/v1/deadlines/abc/notify"] {
        let response = server.post(path).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR", "path {}", path);
        assert!(body["error"]["details"]["reason"].is_string());
    }
}

#[tokio::test]
async fn mark_single_deadline_notified() {
    let server = test_server().await;
    create(&server, "PGR-1", "2025-12-01").await;
    let detail: Value = server.get("/api/v1/processes/PGR-1").await.json();
    let id = detail["deadlines"][0]["id"].as_i64().unwrap();

    let response = server.post(&format!("/api/v1/deadlines/{}/notify", id)).await;

    response.assert_status_ok();
    let deadline: Value = response.json();
    assert_eq!(deadline["notified"], true);
    assert_eq!(deadline["closed"], false);
}

#[tokio::test]
async fn upcoming_report_window() {
    let server = test_server().await;
    create(&server, "PGR-NEW", &today().to_string()).await;

    let week: Value = server.get("/api/v1/deadlines/upcoming").await.json();
    assert_eq!(week["days"], 7);
    assert_eq!(week["total"], 0);

    let month: Value = server
        .get("/api/v1/deadlines/upcoming")
        .add_query_param("days", 30)
        .await
        .json();
    assert_eq!(month["total"], 3);
    let last = &month["deadlines"][2];
    assert_eq!(last["due_date"], (today() + Duration::days(30)).to_string());
    assert_eq!(last["days_remaining"], 30);
}

#[tokio::test]
async fn upcoming_rejects_bad_window() {
    let server = test_server().await;

    for query in ["days=0", "days=91", "days=abc", "days=-1"] {
        let response = server
            .get(&format!("/api/v1/deadlines/upcoming?{}", query))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR", "query {}", query);
    }
}

#[tokio::test]
async fn statistics_summary() {
    let server = test_server().await;
    create(&server, "PGR-OLD", "2025-01-02").await;
    create(&server, "PGR-NEW", &today().to_string()).await;

    let response = server.get("/api/v1/statistics/summary").await;

    response.assert_status_ok();
    let summary: Value = response.json();
    assert_eq!(summary["total_processes"], 2);
    assert_eq!(summary["by_status"]["RECEIVED"], 2);
    assert_eq!(summary["by_status"]["GRANTED"], 0);
    assert_eq!(summary["overdue_deadlines"], 3);
    assert_eq!(summary["generated_at"], today().to_string());
}
