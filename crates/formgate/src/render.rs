//! Render-model projection.
//!
//! Turns a form definition into the shape a client renders: sections and
//! fields in display order, `required` precomputed from the rule list, and
//! the prefill block lifted out of `initialLogic`. Also hosts the
//! label-keyed projection of a submission used when forwarding to a target
//! service.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::model::{
    FieldType, FormDefinition, FormStatus, FormType, PrefillSpec, StaticOption, ValidationRule,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormRenderModel {
    pub id: Option<String>,
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub status: FormStatus,
    pub form_type: FormType,
    pub prefill: Option<PrefillSpec>,
    pub sections: Vec<SectionRenderModel>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRenderModel {
    pub title: Option<String>,
    pub condition: Option<String>,
    pub fields: Vec<FieldRenderModel>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRenderModel {
    pub name: String,
    pub label: Option<String>,
    pub field_type: FieldType,
    pub placeholder: Option<String>,
    pub default_value: Option<String>,
    pub required: bool,
    pub options: Vec<StaticOption>,
    pub api_endpoint: Option<String>,
    pub ui_properties: Option<JsonValue>,
    pub condition: Option<String>,
    pub dependencies: Vec<String>,
    pub validations: Vec<ValidationRule>,
}

pub fn render_model(form: &FormDefinition) -> FormRenderModel {
    FormRenderModel {
        id: form.id.clone(),
        name: form.name.clone(),
        version: form.version.clone(),
        description: form.description.clone(),
        status: form.status,
        form_type: form.form_type,
        prefill: form.prefill(),
        sections: form
            .sections_ordered()
            .into_iter()
            .map(|section| SectionRenderModel {
                title: section.title.clone(),
                condition: section.condition.clone(),
                fields: section
                    .fields_ordered()
                    .into_iter()
                    .map(|field| FieldRenderModel {
                        name: field.name.clone(),
                        label: field.label.clone(),
                        field_type: field.field_type,
                        placeholder: field.placeholder.clone(),
                        default_value: field.default_value.clone(),
                        required: field.is_required(),
                        options: field.static_options.clone(),
                        api_endpoint: field.api_endpoint.clone(),
                        ui_properties: field.ui_properties.clone(),
                        condition: field.condition.clone(),
                        dependencies: field.dependencies.clone(),
                        validations: field.validations.clone(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Projects submitted values onto field labels for human-readable
/// forwarding. A field without a label keeps its submission key; values for
/// keys that match no field pass through under their own key.
pub fn label_projection(
    form: &FormDefinition,
    responses: &Map<String, JsonValue>,
) -> Map<String, JsonValue> {
    let mut projected = Map::new();
    for (key, value) in responses {
        let label = form
            .field(key)
            .and_then(|f| f.label.as_deref())
            .filter(|l| !l.is_empty())
            .unwrap_or(key);
        projected.insert(label.to_string(), value.clone());
    }
    projected
}
