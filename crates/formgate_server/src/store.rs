//! File-backed stores for form definitions and questionnaire results.
//!
//! Form definitions live as YAML/JSON files in the forms directory and are
//! indexed in memory by id and name. Questionnaire results are written one
//! JSON file per submission under `results/` in the data directory; they
//! reference their form by id only, so results survive form deletion with a
//! dangling reference.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio::sync::RwLock;
use tracing::warn;
use uuid::Uuid;
use walkdir::WalkDir;

use formgate::reconcile::UpdateFormDefinition;
use formgate::{apply_update, parse_form_file, FormDefinition, FormStatus, FormType, QuestionnaireResult};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSummary {
    pub id: Option<String>,
    pub name: String,
    pub version: String,
    pub status: FormStatus,
    pub form_type: FormType,
}

#[derive(Debug, Clone)]
struct StoredForm {
    form: FormDefinition,
    path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct FormStore {
    forms_dir: PathBuf,
    // Keyed by form id; every stored form has one after ensure_ids.
    index: Arc<RwLock<HashMap<String, StoredForm>>>,
}

impl FormStore {
    pub async fn new(forms_dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&forms_dir)
            .await
            .with_context(|| format!("failed to create forms dir {}", forms_dir.display()))?;
        let store = Self {
            forms_dir,
            index: Arc::new(RwLock::new(HashMap::new())),
        };
        store.load_all().await?;
        Ok(store)
    }

    async fn load_all(&self) -> Result<()> {
        let mut loaded: HashMap<String, StoredForm> = HashMap::new();
        for entry in WalkDir::new(&self.forms_dir).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path().to_path_buf();
            if !matches!(
                path.extension().and_then(|s| s.to_str()),
                Some("yaml" | "yml" | "json")
            ) {
                continue;
            }
            let source = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read form file {}", path.display()))?;
            let mut form = match parse_form_file(&source) {
                Ok(form) => form,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "skipping unparseable form file");
                    continue;
                }
            };
            ensure_ids(&mut form);
            if loaded.values().any(|s| s.form.name == form.name) {
                warn!(path = %path.display(), name = form.name, "skipping duplicate form name");
                continue;
            }
            let id = form.id.clone().unwrap_or_default();
            loaded.insert(id, StoredForm { form, path });
        }
        *self.index.write().await = loaded;
        Ok(())
    }

    pub async fn list(&self) -> Vec<FormSummary> {
        let mut summaries: Vec<FormSummary> = self
            .index
            .read()
            .await
            .values()
            .map(|s| FormSummary {
                id: s.form.id.clone(),
                name: s.form.name.clone(),
                version: s.form.version.clone(),
                status: s.form.status,
                form_type: s.form.form_type,
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }

    pub async fn get(&self, id: &str) -> Option<FormDefinition> {
        self.index.read().await.get(id).map(|s| s.form.clone())
    }

    pub async fn get_by_name(&self, name: &str) -> Option<FormDefinition> {
        self.index
            .read()
            .await
            .values()
            .find(|s| s.form.name == name)
            .map(|s| s.form.clone())
    }

    /// Creates a new form definition. The name must be unique across the
    /// store; ids are assigned to every node lacking one.
    pub async fn create(&self, mut form: FormDefinition) -> Result<FormDefinition> {
        let mut index = self.index.write().await;
        if index.values().any(|s| s.form.name == form.name) {
            bail!("form definition name must be unique: {}", form.name);
        }
        ensure_ids(&mut form);
        let id = form.id.clone().unwrap_or_default();
        let path = self.forms_dir.join(format!("{}.yaml", file_stem(&form.name)));
        persist(&path, &form).await?;
        index.insert(id, StoredForm { form: form.clone(), path });
        Ok(form)
    }

    /// Reconciles an update request into an existing form and persists the
    /// result. Returns `None` when the id is unknown.
    pub async fn update(
        &self,
        id: &str,
        request: UpdateFormDefinition,
    ) -> Result<Option<FormDefinition>> {
        let mut index = self.index.write().await;
        let Some(stored) = index.get_mut(id) else {
            return Ok(None);
        };
        apply_update(&mut stored.form, request);
        ensure_ids(&mut stored.form);
        persist(&stored.path, &stored.form).await?;
        Ok(Some(stored.form.clone()))
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut index = self.index.write().await;
        let Some(stored) = index.remove(id) else {
            return Ok(false);
        };
        tokio::fs::remove_file(&stored.path)
            .await
            .with_context(|| format!("failed to remove form file {}", stored.path.display()))?;
        Ok(true)
    }
}

async fn persist(path: &Path, form: &FormDefinition) -> Result<()> {
    let yaml = serde_yaml::to_string(form).context("failed to serialize form definition")?;
    tokio::fs::write(path, yaml)
        .await
        .with_context(|| format!("failed to write form file {}", path.display()))?;
    Ok(())
}

fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect()
}

/// Assigns a fresh uuid to every node that has none. New nodes produced by
/// reconciliation arrive without ids.
pub fn ensure_ids(form: &mut FormDefinition) {
    if form.id.is_none() {
        form.id = Some(Uuid::new_v4().to_string());
    }
    for section in &mut form.sections {
        if section.id.is_none() {
            section.id = Some(Uuid::new_v4().to_string());
        }
        for field in &mut section.fields {
            if field.id.is_none() {
                field.id = Some(Uuid::new_v4().to_string());
            }
            for rule in &mut field.validations {
                if rule.id.is_none() {
                    rule.id = Some(Uuid::new_v4().to_string());
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResultStore {
    results_dir: PathBuf,
}

impl ResultStore {
    pub async fn new(data_dir: PathBuf) -> Result<Self> {
        let results_dir = data_dir.join("results");
        tokio::fs::create_dir_all(&results_dir)
            .await
            .with_context(|| format!("failed to create results dir {}", results_dir.display()))?;
        Ok(Self { results_dir })
    }

    /// Persists one submission as an immutable JSON file.
    pub async fn save(
        &self,
        form_definition_id: &str,
        user_id: Option<&str>,
        response_data: JsonValue,
    ) -> Result<QuestionnaireResult> {
        let result = QuestionnaireResult {
            id: Uuid::new_v4().to_string(),
            form_definition_id: form_definition_id.to_string(),
            user_id: user_id.map(str::to_string),
            response_data,
            submitted_at: Utc::now(),
        };
        let path = self.results_dir.join(format!("{}.json", result.id));
        let json = serde_json::to_string_pretty(&result)
            .context("failed to serialize questionnaire result")?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("failed to write result file {}", path.display()))?;
        Ok(result)
    }

    pub async fn get(&self, id: &str) -> Result<Option<QuestionnaireResult>> {
        let path = self.results_dir.join(format!("{}.json", id));
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => {
                let result = serde_json::from_str(&raw)
                    .with_context(|| format!("invalid result json {}", path.display()))?;
                Ok(Some(result))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    pub async fn list_for_form(&self, form_definition_id: &str) -> Result<Vec<QuestionnaireResult>> {
        let mut results = Vec::new();
        for entry in WalkDir::new(&self.results_dir).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let raw = tokio::fs::read_to_string(entry.path())
                .await
                .with_context(|| format!("failed to read {}", entry.path().display()))?;
            let result: QuestionnaireResult = match serde_json::from_str(&raw) {
                Ok(result) => result,
                Err(err) => {
                    warn!(path = %entry.path().display(), error = %err, "skipping unreadable result file");
                    continue;
                }
            };
            if result.form_definition_id == form_definition_id {
                results.push(result);
            }
        }
        results.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        Ok(results)
    }
}
