//! Update reconciliation.
//!
//! A form is updated by submitting the full desired tree of sections,
//! fields and rules. Reconciliation is an explicit upsert-and-prune:
//! incoming nodes whose id matches an existing owned child mutate that
//! child in place, nodes without a matching id become new children (with no
//! id; storage assigns one), and existing children absent from the incoming
//! list are dropped, cascading to everything they own.

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::model::{
    FieldDefinition, FieldType, FormDefinition, FormStatus, OptionsSourceType, SectionDefinition,
    StaticOption, ValidationRule, ValidationRuleType,
};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFormDefinition {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<FormStatus>,
    #[serde(default)]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub initial_logic: Option<JsonValue>,
    #[serde(default)]
    pub submission_logic: Option<JsonValue>,
    /// When present, replaces the section list via reconciliation; when
    /// absent, sections are left untouched.
    #[serde(default)]
    pub sections: Option<Vec<UpdateSection>>,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSection {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<UpdateField>>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateField {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    pub field_type: FieldType,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub options_source_type: Option<OptionsSourceType>,
    #[serde(default)]
    pub static_options: Vec<StaticOption>,
    #[serde(default)]
    pub api_endpoint: Option<String>,
    #[serde(default)]
    pub ui_properties: Option<JsonValue>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub validations: Option<Vec<UpdateRule>>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRule {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub rule_type: ValidationRuleType,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub custom_function: Option<String>,
}

/// Applies an update request to an existing form definition in place.
pub fn apply_update(form: &mut FormDefinition, request: UpdateFormDefinition) {
    form.description = request.description;
    if let Some(status) = request.status {
        form.status = status;
    }
    form.target_audience = request.target_audience;
    if request.initial_logic.is_some() {
        form.initial_logic = request.initial_logic;
    }
    if request.submission_logic.is_some() {
        form.submission_logic = request.submission_logic;
    }

    if let Some(incoming) = request.sections {
        let existing = std::mem::take(&mut form.sections);
        form.sections = reconcile_sections(existing, incoming);
    }
}

fn reconcile_sections(
    existing: Vec<SectionDefinition>,
    incoming: Vec<UpdateSection>,
) -> Vec<SectionDefinition> {
    let mut by_id: Vec<Option<SectionDefinition>> = existing.into_iter().map(Some).collect();
    let take_by_id = |pool: &mut Vec<Option<SectionDefinition>>, id: &Option<String>| {
        let id = id.as_deref()?;
        let slot = pool
            .iter_mut()
            .find(|s| s.as_ref().is_some_and(|sec| sec.id.as_deref() == Some(id)))?;
        slot.take()
    };

    incoming
        .into_iter()
        .map(|update| {
            let mut section = take_by_id(&mut by_id, &update.id).unwrap_or_default();
            section.title = update.title;
            section.order = update.order;
            section.condition = update.condition;
            if let Some(fields) = update.fields {
                let existing_fields = std::mem::take(&mut section.fields);
                section.fields = reconcile_fields(existing_fields, fields);
            }
            section
        })
        .collect()
}

fn reconcile_fields(
    existing: Vec<FieldDefinition>,
    incoming: Vec<UpdateField>,
) -> Vec<FieldDefinition> {
    let mut by_id: Vec<Option<FieldDefinition>> = existing.into_iter().map(Some).collect();
    let take_by_id = |pool: &mut Vec<Option<FieldDefinition>>, id: &Option<String>| {
        let id = id.as_deref()?;
        let slot = pool
            .iter_mut()
            .find(|f| f.as_ref().is_some_and(|fd| fd.id.as_deref() == Some(id)))?;
        slot.take()
    };

    incoming
        .into_iter()
        .map(|update| {
            let mut field = take_by_id(&mut by_id, &update.id).unwrap_or_default();
            field.name = update.name;
            field.label = update.label;
            field.field_type = update.field_type;
            field.placeholder = update.placeholder;
            field.default_value = update.default_value;
            field.options_source_type = update.options_source_type;
            field.static_options = update.static_options;
            field.api_endpoint = update.api_endpoint;
            field.ui_properties = update.ui_properties;
            field.condition = update.condition;
            field.dependencies = update.dependencies;
            field.order = update.order;
            if let Some(rules) = update.validations {
                let existing_rules = std::mem::take(&mut field.validations);
                field.validations = reconcile_rules(existing_rules, rules);
            }
            field
        })
        .collect()
}

fn reconcile_rules(existing: Vec<ValidationRule>, incoming: Vec<UpdateRule>) -> Vec<ValidationRule> {
    let mut by_id: Vec<Option<ValidationRule>> = existing.into_iter().map(Some).collect();
    let take_by_id = |pool: &mut Vec<Option<ValidationRule>>, id: &Option<String>| {
        let id = id.as_deref()?;
        let slot = pool
            .iter_mut()
            .find(|r| r.as_ref().is_some_and(|rule| rule.id.as_deref() == Some(id)))?;
        slot.take()
    };

    incoming
        .into_iter()
        .map(|update| {
            let mut rule = take_by_id(&mut by_id, &update.id)
                .unwrap_or_else(|| ValidationRule::new(update.rule_type));
            rule.rule_type = update.rule_type;
            rule.value = update.value;
            rule.error_message = update.error_message;
            rule.custom_function = update.custom_function;
            rule
        })
        .collect()
}
