//! Forwarding of validated submissions to an external target service.
//!
//! A form whose `submissionLogic` carries a `targetService` URL template has
//! its responses POSTed there instead of being persisted locally. The
//! template may contain `{paramName}` placeholders filled from the submit
//! request's query parameters, and an incoming `Authorization` header is
//! passed through unchanged.

use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::info;
use url::Url;
use uuid::Uuid;

use formgate::{label_projection, FormDefinition};

/// JSON body sent to the target service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionEnvelope {
    pub submission_id: String,
    pub questionnaire_id: Option<String>,
    pub questionnaire_name: String,
    pub user_id: Option<String>,
    pub submitted_at: DateTime<Utc>,
    /// Label-keyed projection of the submitted responses.
    pub responses: Map<String, JsonValue>,
}

impl SubmissionEnvelope {
    pub fn new(
        form: &FormDefinition,
        responses: &Map<String, JsonValue>,
        user_id: Option<&str>,
    ) -> Self {
        Self {
            submission_id: Uuid::new_v4().to_string(),
            questionnaire_id: form.id.clone(),
            questionnaire_name: form.name.clone(),
            user_id: user_id.map(str::to_string),
            submitted_at: Utc::now(),
            responses: label_projection(form, responses),
        }
    }
}

/// Replaces every `{name}` placeholder that has a matching query parameter.
/// Placeholders without a parameter are left intact, mirroring how authors
/// debug them: the unresolved name shows up in the outbound URL.
pub fn substitute_params(template: &str, params: &HashMap<String, String>) -> String {
    let mut resolved = template.to_string();
    if !(resolved.contains('{') && resolved.contains('}')) {
        return resolved;
    }
    for (name, value) in params {
        let placeholder = format!("{{{}}}", name);
        if resolved.contains(&placeholder) {
            resolved = resolved.replace(&placeholder, value);
        }
    }
    resolved
}

#[derive(Debug, Clone)]
pub struct ForwardOutcome {
    pub status: u16,
    pub body: JsonValue,
}

impl ForwardOutcome {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the target URL for a form, substituting `{param}`
    /// placeholders. Errors when no target service is configured or the
    /// resolved URL does not parse.
    pub fn resolve_target(
        form: &FormDefinition,
        params: &HashMap<String, String>,
    ) -> Result<Url> {
        let template = form
            .target_service()
            .with_context(|| format!("form '{}' has no targetService configured", form.name))?;
        let resolved = substitute_params(template, params);
        Url::parse(&resolved)
            .with_context(|| format!("invalid targetService URL '{}'", resolved))
    }

    /// POSTs the submission envelope to the form's target service.
    pub async fn forward(
        &self,
        form: &FormDefinition,
        responses: &Map<String, JsonValue>,
        params: &HashMap<String, String>,
        user_id: Option<&str>,
        auth_header: Option<&str>,
    ) -> Result<ForwardOutcome> {
        let target = Self::resolve_target(form, params)?;
        let envelope = SubmissionEnvelope::new(form, responses, user_id);

        info!(form = form.name, target = %target, "forwarding form submission");

        let mut request = self.client.post(target.clone()).json(&envelope);
        if let Some(auth) = auth_header.filter(|a| !a.is_empty()) {
            request = request.header("Authorization", auth);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("failed to reach target service {}", target))?;

        let status = response.status().as_u16();
        let body = response
            .json::<JsonValue>()
            .await
            .unwrap_or(JsonValue::Null);
        Ok(ForwardOutcome { status, body })
    }
}
