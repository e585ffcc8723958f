//! End-to-end route tests against the in-memory store.
//!
//! Each test builds a fresh application router and drives it in-process
//! with `tower::ServiceExt::oneshot`.

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use crm_api::{
    create_api_router, telemetry::TelemetryConfig, ApiConfig, AppState, ORPHANED_COMMENT_HEADER,
};
use crm_core::{STATUS_CLOSED, STATUS_NEW};
use crm_test_utils::assertions::assert_error_code;
use serde_json::{json, Value};
use tower::ServiceExt;

type TestResult = Result<(), String>;

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

fn test_app() -> Router {
    let telemetry = TelemetryConfig {
        metrics_enabled: false,
        ..TelemetryConfig::from_lookup(|_| None)
    };
    create_api_router(AppState::in_memory(), &ApiConfig::default(), &telemetry)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Result<Reply, String> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .map_err(|e| e.to_string())?;

    let response = app.clone().oneshot(request).await.map_err(|e| e.to_string())?;
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .map_err(|e| e.to_string())?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).map_err(|e| e.to_string())?
    };
    Ok(Reply {
        status,
        headers,
        body,
    })
}

fn id_of(body: &Value) -> Result<String, String> {
    body.get("_id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| format!("no _id in {}", body))
}

async fn create_lead(app: &Router, payload: Value) -> Result<String, String> {
    let reply = send(app, Method::POST, "/leads", Some(payload)).await?;
    assert_eq!(reply.status, StatusCode::CREATED);
    id_of(&reply.body)
}

// ============================================================================
// LEADS
// ============================================================================

#[tokio::test]
async fn test_create_then_get_lead() -> TestResult {
    let app = test_app();
    let created = send(
        &app,
        Method::POST,
        "/leads",
        Some(json!({
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "source": "web",
            "priority": "high",
            "status": "New"
        })),
    )
    .await?;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = id_of(&created.body)?;
    assert!(created.body.get("createdAt").is_some());
    assert!(created.body.get("updatedAt").is_some());

    let fetched = send(&app, Method::GET, &format!("/leads/{}", id), None).await?;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["name"], "Ada Lovelace");
    assert_eq!(fetched.body["email"], "ada@example.com");
    assert_eq!(fetched.body["status"], "New");
    assert_eq!(fetched.body["assignedAgent"], Value::Null);
    assert_eq!(fetched.body["comments"], json!([]));
    Ok(())
}

#[tokio::test]
async fn test_get_lead_resolves_agent() -> TestResult {
    let app = test_app();
    let agent = send(
        &app,
        Method::POST,
        "/agents",
        Some(json!({ "name": "Grace", "email": "grace@agency.com" })),
    )
    .await?;
    assert_eq!(agent.status, StatusCode::CREATED);
    let agent_id = id_of(&agent.body)?;

    let lead_id = create_lead(&app, json!({ "name": "Lead", "assignedAgent": agent_id })).await?;
    let fetched = send(&app, Method::GET, &format!("/leads/{}", lead_id), None).await?;
    assert_eq!(fetched.body["assignedAgent"]["_id"], agent_id.as_str());
    assert_eq!(fetched.body["assignedAgent"]["name"], "Grace");
    Ok(())
}

#[tokio::test]
async fn test_dangling_agent_resolves_to_null() -> TestResult {
    let app = test_app();
    let ghost = uuid::Uuid::now_v7().to_string();
    let lead_id = create_lead(&app, json!({ "assignedAgent": ghost })).await?;

    let fetched = send(&app, Method::GET, &format!("/leads/{}", lead_id), None).await?;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["assignedAgent"], Value::Null);
    Ok(())
}

#[tokio::test]
async fn test_get_missing_lead_is_not_found() -> TestResult {
    let app = test_app();
    let uri = format!("/leads/{}", uuid::Uuid::now_v7());
    let reply = send(&app, Method::GET, &uri, None).await?;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_error_code(&reply.body, "LEAD_NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn test_malformed_id_is_bad_request() -> TestResult {
    let app = test_app();
    let reply = send(&app, Method::GET, "/leads/not-a-uuid", None).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_error_code(&reply.body, "INVALID_FORMAT");
    Ok(())
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() -> TestResult {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/leads")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .map_err(|e| e.to_string())?;
    let response = app.oneshot(request).await.map_err(|e| e.to_string())?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_delete_never_created_lead_is_not_found() -> TestResult {
    let app = test_app();
    let uri = format!("/leads/{}", uuid::Uuid::now_v7());
    let reply = send(&app, Method::DELETE, &uri, None).await?;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_error_code(&reply.body, "LEAD_NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn test_delete_lead() -> TestResult {
    let app = test_app();
    let id = create_lead(&app, json!({ "name": "Temp" })).await?;
    let uri = format!("/leads/{}", id);

    let deleted = send(&app, Method::DELETE, &uri, None).await?;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body, json!({ "message": "Deleted" }));

    let again = send(&app, Method::DELETE, &uri, None).await?;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_update_merges_and_clears_agent() -> TestResult {
    let app = test_app();
    let agent_id = uuid::Uuid::now_v7().to_string();
    let id = create_lead(
        &app,
        json!({ "name": "Ada", "status": "New", "assignedAgent": agent_id }),
    )
    .await?;
    let uri = format!("/leads/{}", id);

    let patched = send(&app, Method::PATCH, &uri, Some(json!({ "status": "Contacted" }))).await?;
    assert_eq!(patched.status, StatusCode::OK);
    assert_eq!(patched.body["status"], "Contacted");
    assert_eq!(patched.body["name"], "Ada");
    assert_eq!(patched.body["assignedAgent"], agent_id.as_str());

    let cleared = send(&app, Method::PATCH, &uri, Some(json!({ "assignedAgent": null }))).await?;
    assert_eq!(cleared.body["assignedAgent"], Value::Null);
    assert_eq!(cleared.body["status"], "Contacted");
    Ok(())
}

#[tokio::test]
async fn test_update_missing_lead_is_not_found() -> TestResult {
    let app = test_app();
    let uri = format!("/leads/{}", uuid::Uuid::now_v7());
    let reply = send(&app, Method::PATCH, &uri, Some(json!({ "status": "Closed" }))).await?;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_filter_by_status() -> TestResult {
    let app = test_app();
    create_lead(&app, json!({ "name": "a", "status": STATUS_NEW })).await?;
    create_lead(&app, json!({ "name": "b", "status": STATUS_CLOSED })).await?;
    create_lead(&app, json!({ "name": "c", "status": STATUS_NEW })).await?;

    let new = send(&app, Method::GET, "/leads?status=New", None).await?;
    assert_eq!(new.status, StatusCode::OK);
    let names: Vec<&str> = new
        .body
        .as_array()
        .ok_or("expected array")?
        .iter()
        .filter_map(|l| l["name"].as_str())
        .collect();
    assert_eq!(names, vec!["a", "c"]);

    let qualified = send(&app, Method::GET, "/leads?status=Qualified", None).await?;
    assert_eq!(qualified.body, json!([]));

    let unfiltered = send(&app, Method::GET, "/leads?status=", None).await?;
    assert_eq!(unfiltered.body.as_array().map(Vec::len), Some(3));
    Ok(())
}

#[tokio::test]
async fn test_filter_bad_agent_id() -> TestResult {
    let app = test_app();
    let reply = send(&app, Method::GET, "/leads?assignedAgent=bogus", None).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_error_code(&reply.body, "INVALID_FORMAT");
    Ok(())
}

#[tokio::test]
async fn test_repeated_filter_key_is_json_error() -> TestResult {
    let app = test_app();
    let reply = send(&app, Method::GET, "/leads?status=New&status=Closed", None).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_error_code(&reply.body, "INVALID_INPUT");
    Ok(())
}

// ============================================================================
// COMMENTS
// ============================================================================

#[tokio::test]
async fn test_comments_resolve_in_order() -> TestResult {
    let app = test_app();
    let id = create_lead(&app, json!({ "name": "Ada" })).await?;
    let uri = format!("/leads/{}/comments", id);

    let mut expected = Vec::new();
    for text in ["first", "second", "third"] {
        let reply = send(
            &app,
            Method::POST,
            &uri,
            Some(json!({ "commentText": text, "author": "grace" })),
        )
        .await?;
        assert_eq!(reply.status, StatusCode::CREATED);
        assert!(reply.headers.get(ORPHANED_COMMENT_HEADER).is_none());
        assert_eq!(reply.body["lead"], id.as_str());
        expected.push(id_of(&reply.body)?);
    }

    let listed = send(&app, Method::GET, &uri, None).await?;
    let got: Vec<String> = listed
        .body
        .as_array()
        .ok_or("expected array")?
        .iter()
        .filter_map(|c| c["_id"].as_str().map(str::to_string))
        .collect();
    assert_eq!(got, expected);

    let lead = send(&app, Method::GET, &format!("/leads/{}", id), None).await?;
    assert_eq!(lead.body["comments"][1]["commentText"], "second");
    Ok(())
}

#[tokio::test]
async fn test_comment_on_missing_lead_is_kept_and_flagged() -> TestResult {
    let app = test_app();
    let ghost = uuid::Uuid::now_v7().to_string();

    let reply = send(
        &app,
        Method::POST,
        &format!("/leads/{}/comments", ghost),
        Some(json!({ "commentText": "hello" })),
    )
    .await?;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.body["lead"], ghost.as_str());
    assert_eq!(
        reply
            .headers
            .get(ORPHANED_COMMENT_HEADER)
            .and_then(|v| v.to_str().ok()),
        Some("true")
    );

    let report = send(&app, Method::GET, "/integrity/comments", None).await?;
    assert_eq!(report.body["consistent"], false);
    assert_eq!(report.body["detachedComments"][0]["lead"], ghost.as_str());

    // No lead to re-link to.
    let repair = send(&app, Method::POST, "/integrity/comments/repair", None).await?;
    assert_eq!(repair.body, json!({ "repaired": 0 }));
    Ok(())
}

#[tokio::test]
async fn test_list_comments_missing_lead() -> TestResult {
    let app = test_app();
    let uri = format!("/leads/{}/comments", uuid::Uuid::now_v7());
    let reply = send(&app, Method::GET, &uri, None).await?;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_integrity_clean_store() -> TestResult {
    let app = test_app();
    let id = create_lead(&app, json!({})).await?;
    send(
        &app,
        Method::POST,
        &format!("/leads/{}/comments", id),
        Some(json!({ "commentText": "ok" })),
    )
    .await?;

    let report = send(&app, Method::GET, "/integrity/comments", None).await?;
    assert_eq!(report.status, StatusCode::OK);
    assert_eq!(report.body["consistent"], true);
    Ok(())
}

// ============================================================================
// TAGS
// ============================================================================

#[tokio::test]
async fn test_add_tags_is_set_union() -> TestResult {
    let app = test_app();
    let id = create_lead(&app, json!({ "name": "Ada" })).await?;
    let uri = format!("/leads/{}/tags", id);

    let first = send(&app, Method::PATCH, &uri, Some(json!({ "tags": ["A", "B"] }))).await?;
    assert_eq!(first.status, StatusCode::OK);
    let second = send(&app, Method::PATCH, &uri, Some(json!({ "tags": ["B", "C"] }))).await?;
    assert_eq!(second.body["tags"], json!(["A", "B", "C"]));
    Ok(())
}

#[tokio::test]
async fn test_add_tags_missing_lead() -> TestResult {
    let app = test_app();
    let uri = format!("/leads/{}/tags", uuid::Uuid::now_v7());
    let reply = send(&app, Method::PATCH, &uri, Some(json!({ "tags": ["A"] }))).await?;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_tag_conflicts() -> TestResult {
    let app = test_app();
    let first = send(&app, Method::POST, "/tags", Some(json!({ "name": "X" }))).await?;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = send(&app, Method::POST, "/tags", Some(json!({ "name": "X" }))).await?;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_error_code(&second.body, "ENTITY_ALREADY_EXISTS");

    let listed = send(&app, Method::GET, "/tags", None).await?;
    let names: Vec<&str> = listed
        .body
        .as_array()
        .ok_or("expected array")?
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert_eq!(names, vec!["X"]);
    Ok(())
}

#[tokio::test]
async fn test_tag_requires_name() -> TestResult {
    let app = test_app();
    let reply = send(&app, Method::POST, "/tags", Some(json!({}))).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_error_code(&reply.body, "MISSING_FIELD");
    Ok(())
}

// ============================================================================
// AGENTS
// ============================================================================

#[tokio::test]
async fn test_agents_create_and_list() -> TestResult {
    let app = test_app();
    for name in ["Grace", "Linus"] {
        let reply = send(&app, Method::POST, "/agents", Some(json!({ "name": name }))).await?;
        assert_eq!(reply.status, StatusCode::CREATED);
    }
    let listed = send(&app, Method::GET, "/agents", None).await?;
    assert_eq!(listed.body.as_array().map(Vec::len), Some(2));
    assert_eq!(listed.body[0]["name"], "Grace");
    Ok(())
}

// ============================================================================
// REPORTING
// ============================================================================

#[tokio::test]
async fn test_pipeline_groups_statuses() -> TestResult {
    let app = test_app();
    for status in [STATUS_NEW, STATUS_NEW, STATUS_CLOSED] {
        create_lead(&app, json!({ "status": status })).await?;
    }

    let reply = send(&app, Method::GET, "/reporting/pipeline", None).await?;
    assert_eq!(reply.status, StatusCode::OK);
    let groups = reply.body.as_array().ok_or("expected array")?;
    assert_eq!(groups.len(), 2);
    let count_of = |status: &str| {
        groups
            .iter()
            .find(|g| g["_id"] == status)
            .and_then(|g| g["count"].as_u64())
    };
    assert_eq!(count_of(STATUS_NEW), Some(2));
    assert_eq!(count_of(STATUS_CLOSED), Some(1));
    Ok(())
}

#[tokio::test]
async fn test_conversion_rate_empty_store() -> TestResult {
    let app = test_app();
    let reply = send(&app, Method::GET, "/reporting/conversions", None).await?;
    assert_eq!(reply.body["conversionRate"].as_f64(), Some(0.0));
    Ok(())
}

#[tokio::test]
async fn test_conversion_rate_no_closed() -> TestResult {
    let app = test_app();
    for _ in 0..5 {
        create_lead(&app, json!({ "status": STATUS_NEW })).await?;
    }
    let reply = send(&app, Method::GET, "/reporting/conversions", None).await?;
    assert_eq!(reply.body["conversionRate"].as_f64(), Some(0.0));
    Ok(())
}

#[tokio::test]
async fn test_conversion_rate_and_summary() -> TestResult {
    let app = test_app();
    for _ in 0..10 {
        create_lead(&app, json!({ "status": STATUS_NEW })).await?;
    }
    for _ in 0..5 {
        create_lead(&app, json!({ "status": STATUS_CLOSED })).await?;
    }

    let conversions = send(&app, Method::GET, "/reporting/conversions", None).await?;
    assert_eq!(conversions.body["conversionRate"].as_f64(), Some(50.0));

    let summary = send(&app, Method::GET, "/reporting/summary", None).await?;
    assert_eq!(summary.body, json!({ "totalLeads": 15, "totalClosed": 5 }));
    Ok(())
}

// ============================================================================
// HEALTH
// ============================================================================

#[tokio::test]
async fn test_readiness_reports_store() -> TestResult {
    let app = test_app();
    let reply = send(&app, Method::GET, "/health/ready", None).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["status"], "healthy");
    assert_eq!(reply.body["details"]["store"]["status"], "healthy");
    Ok(())
}
