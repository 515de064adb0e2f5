//! HTTP-level tests for the form API, sending requests straight to the
//! router via `tower::ServiceExt`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value as JsonValue};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

use formgate_endpoint::Forwarder;
use formgate_server::store::{FormStore, ResultStore};
use formgate_server::{build_router, AppState};

const FORM: &str = r#"
name: signup
sections:
  - title: Main
    order: 1
    fields:
      - name: email
        label: Email Address
        fieldType: EMAIL
        order: 1
        validations:
          - type: REQUIRED
      - name: age
        fieldType: NUMBER
        order: 2
        validations:
          - type: MIN_VALUE
            value: "18"
"#;

struct TestApp {
    router: Router,
    form_id: String,
    // Keeps the backing directory alive for the test's duration.
    _dir: TempDir,
}

async fn build_app() -> TestApp {
    let dir = tempdir().unwrap();
    let forms = FormStore::new(dir.path().join("forms")).await.unwrap();
    let results = ResultStore::new(dir.path().to_path_buf()).await.unwrap();
    let created = forms
        .create(formgate::parse_form_file(FORM).unwrap())
        .await
        .unwrap();
    let state = AppState {
        forms: Arc::new(forms),
        results: Arc::new(results),
        forwarder: Arc::new(Forwarder::new()),
    };
    TestApp {
        router: build_router(state),
        form_id: created.id.unwrap(),
        _dir: dir,
    }
}

async fn request(router: Router, method: Method, uri: &str, body: Option<JsonValue>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    router.oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> JsonValue {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn list_and_render() {
    let app = build_app().await;

    let response = request(app.router.clone(), Method::GET, "/api/forms", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    assert_eq!(listed["forms"][0]["name"], "signup");

    let response = request(app.router.clone(), Method::GET, "/api/forms/signup/render", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let model = body_json(response).await;
    let field = &model["sections"][0]["fields"][0];
    assert_eq!(field["name"], "email");
    assert_eq!(field["required"], true);

    let response = request(app.router, Method::GET, "/api/forms/nope/render", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submit_rejects_invalid_data_with_error_map() {
    let app = build_app().await;
    let uri = format!("/api/forms/{}/submit", app.form_id);

    let response = request(
        app.router.clone(),
        Method::POST,
        &uri,
        Some(json!({ "responseData": { "email": "not-an-email", "age": 12 } })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["errors"]["email"], "Invalid email format");
    assert_eq!(body["errors"]["age"], "Value must be at least 18");
}

#[tokio::test]
async fn submit_requires_response_data() {
    let app = build_app().await;
    let uri = format!("/api/forms/{}/submit", app.form_id);

    let response = request(app.router, Method::POST, &uri, Some(json!({}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("responseData"));
}

#[tokio::test]
async fn submit_without_target_service_persists_a_result() {
    let app = build_app().await;
    let uri = format!("/api/forms/{}/submit", app.form_id);

    let response = request(
        app.router.clone(),
        Method::POST,
        &uri,
        Some(json!({
            "responseData": { "email": "a@b.com", "age": 30 },
            "userId": "user-7"
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert!(body["data"]["questionnaireResponseId"].is_string());
    assert_eq!(body["data"]["submittedData"]["email"], "a@b.com");

    let uri = format!("/api/forms/{}/results", app.form_id);
    let response = request(app.router, Method::GET, &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["userId"], "user-7");
}

#[tokio::test]
async fn submit_to_unknown_form_is_not_found() {
    let app = build_app().await;
    let response = request(
        app.router,
        Method::POST,
        "/api/forms/no-such-id/submit",
        Some(json!({ "responseData": {} })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_create_runs_preflight() {
    let app = build_app().await;

    let broken = json!({
        "name": "broken",
        "sections": [{
            "fields": [
                { "name": "a", "fieldType": "TEXT" },
                { "name": "a", "fieldType": "TEXT" }
            ]
        }]
    });
    let response = request(app.router.clone(), Method::POST, "/api/admin/forms", Some(broken)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    let details = body["details"].as_array().unwrap();
    assert!(details.iter().any(|d| d["code"] == "DuplicateFieldName"));

    let valid = json!({
        "name": "second-form",
        "sections": [{
            "fields": [{ "name": "x", "fieldType": "TEXT" }]
        }]
    });
    let response = request(app.router, Method::POST, "/api/admin/forms", Some(valid)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert!(body["id"].is_string(), "created form gets an id");
}

#[tokio::test]
async fn admin_update_and_delete() {
    let app = build_app().await;
    let uri = format!("/api/admin/forms/{}", app.form_id);

    let response = request(
        app.router.clone(),
        Method::PUT,
        &uri,
        Some(json!({ "status": "PUBLISHED" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "PUBLISHED");

    let response = request(app.router.clone(), Method::DELETE, &uri, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = request(app.router, Method::GET, "/api/forms/signup/render", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// Placeholder substitution is resolved before any request is made, so a bad
// template surfaces without network access.
#[test]
fn target_resolution_uses_query_params() {
    let form = formgate::FormDefinition {
        name: "f".into(),
        submission_logic: Some(json!({ "targetService": "https://svc.example/{tenant}/in" })),
        ..Default::default()
    };
    let mut params = HashMap::new();
    params.insert("tenant".to_string(), "acme".to_string());
    let url = Forwarder::resolve_target(&form, &params).unwrap();
    assert_eq!(url.as_str(), "https://svc.example/acme/in");
}
