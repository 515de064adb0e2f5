use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value as JsonValue};
use tracing::{info, warn};

use formgate::reconcile::UpdateFormDefinition;
use formgate::{render_model, validate_form, validate_form_definition, FormDefinition, FormType};
use formgate_endpoint::Forwarder;

use crate::store::{FormStore, ResultStore};

#[derive(Clone)]
pub struct AppState {
    pub forms: Arc<FormStore>,
    pub results: Arc<ResultStore>,
    pub forwarder: Arc<Forwarder>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/forms", get(list_forms))
        .route("/api/forms/:name/render", get(render_form))
        .route("/api/forms/:id/submit", post(submit_form))
        .route("/api/forms/:id/results", get(list_results))
        .route("/api/admin/forms", post(create_form))
        .route("/api/admin/forms/:id", put(update_form))
        .route("/api/admin/forms/:id", delete(delete_form))
        .with_state(state)
}

async fn list_forms(state: State<AppState>) -> Json<JsonValue> {
    let forms = state.forms.list().await;
    Json(json!({ "forms": forms }))
}

async fn render_form(
    state: State<AppState>,
    AxumPath(name): AxumPath<String>,
) -> Result<Json<JsonValue>, ApiError> {
    let form = state
        .forms
        .get_by_name(&name)
        .await
        .ok_or_else(|| ApiError::not_found("form not found"))?;
    Ok(Json(serde_json::to_value(render_model(&form)).map_err(ApiError::internal)?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest {
    #[serde(default)]
    response_data: Option<Map<String, JsonValue>>,
    #[serde(default)]
    user_id: Option<String>,
}

async fn submit_form(
    state: State<AppState>,
    AxumPath(id): AxumPath<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(payload): Json<SubmitRequest>,
) -> Result<axum::response::Response, ApiError> {
    let form = state
        .forms
        .get(&id)
        .await
        .ok_or_else(|| ApiError::not_found("form not found"))?;

    let Some(response_data) = payload.response_data else {
        return Err(ApiError::bad_request(
            "submission data is missing 'responseData' field",
        ));
    };

    let errors = validate_form(&form, &response_data);
    if !errors.is_empty() {
        warn!(form = form.name, count = errors.len(), "submission failed validation");
        let body = Json(json!({ "success": false, "errors": errors }));
        return Ok((StatusCode::BAD_REQUEST, body).into_response());
    }

    let user_id = payload.user_id.as_deref();
    let auth_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok());

    // Questionnaires and forms without a target service persist locally;
    // everything else is forwarded.
    if form.form_type == FormType::Questionnaire || form.target_service().is_none() {
        return persist_submission(&state, &form, user_id, response_data).await;
    }

    let outcome = state
        .forwarder
        .forward(&form, &response_data, &params, user_id, auth_header)
        .await
        .map_err(ApiError::internal)?;

    if outcome.is_success() {
        info!(form = form.name, "target service processed submission");
        let body = Json(json!({
            "success": true,
            "message": "Form data processed successfully",
            "formId": form.id,
            "data": outcome.body,
        }));
        Ok(body.into_response())
    } else {
        warn!(form = form.name, status = outcome.status, "target service rejected submission");
        let status =
            StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::BAD_GATEWAY);
        Ok((status, Json(outcome.body)).into_response())
    }
}

async fn persist_submission(
    state: &AppState,
    form: &FormDefinition,
    user_id: Option<&str>,
    response_data: Map<String, JsonValue>,
) -> Result<axum::response::Response, ApiError> {
    let form_id = form.id.as_deref().unwrap_or_default();
    let submitted = JsonValue::Object(response_data);
    let result = state
        .results
        .save(form_id, user_id, submitted.clone())
        .await
        .map_err(ApiError::internal)?;
    info!(form = form.name, result_id = result.id, "questionnaire response saved");
    let body = Json(json!({
        "success": true,
        "message": "Questionnaire submitted and saved successfully.",
        "formId": form.id,
        "data": {
            "questionnaireResponseId": result.id,
            "submittedData": submitted,
        },
    }));
    Ok((StatusCode::CREATED, body).into_response())
}

async fn list_results(
    state: State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<JsonValue>, ApiError> {
    let results = state
        .results
        .list_for_form(&id)
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(json!({ "results": results })))
}

async fn create_form(
    state: State<AppState>,
    Json(form): Json<FormDefinition>,
) -> Result<axum::response::Response, ApiError> {
    if let Err(errors) = validate_form_definition(&form) {
        let details: Vec<JsonValue> = errors
            .iter()
            .map(|e| json!({ "code": e.code.as_str(), "path": e.path, "message": e.message }))
            .collect();
        let body = Json(json!({ "error": "form definition failed preflight", "details": details }));
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, body).into_response());
    }
    let created = state
        .forms
        .create(form)
        .await
        .map_err(ApiError::bad_request)?;
    info!(form = created.name, id = ?created.id, "form definition created");
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn update_form(
    state: State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(request): Json<UpdateFormDefinition>,
) -> Result<Json<FormDefinition>, ApiError> {
    let updated = state
        .forms
        .update(&id, request)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::not_found("form not found"))?;
    info!(id, "form definition updated");
    Ok(Json(updated))
}

async fn delete_form(
    state: State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<StatusCode, ApiError> {
    let removed = state
        .forms
        .delete(&id)
        .await
        .map_err(ApiError::internal)?;
    if removed {
        info!(id, "form definition deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("form not found"))
    }
}

pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(err: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn bad_request(message: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}
