use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Input control type of a field. Drives type-specific validation: an
/// `Email` field is checked for email format even without an explicit rule.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    Text,
    Number,
    Email,
    Password,
    Date,
    Select,
    MultiSelect,
    Radio,
    Checkbox,
    FileUpload,
    RichTextEditor,
    AddressPicker,
    Textarea,
    Boolean,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationRuleType {
    Required,
    MinLength,
    MaxLength,
    Regex,
    EmailFormat,
    NumberRange,
    CustomFunction,
    MinValue,
    MaxValue,
    UrlFormat,
    FileType,
    MaxFileSize,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptionsSourceType {
    Static,
    DynamicApi,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormType {
    Questionnaire,
    #[default]
    GenericForm,
}

/// One entry of a STATIC options source.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StaticOption {
    pub value: JsonValue,
    pub label: String,
}

/// A single validation rule attached to a field. `value` is always stored
/// as text; its meaning depends on `rule_type` (integer for lengths,
/// "min-max" for NUMBER_RANGE, regex source for REGEX, builtin identifier
/// for CUSTOM_FUNCTION).
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
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

impl ValidationRule {
    pub fn new(rule_type: ValidationRuleType) -> Self {
        Self {
            id: None,
            rule_type,
            value: None,
            error_message: None,
            custom_function: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    #[serde(default)]
    pub id: Option<String>,
    /// Submission key, unique within the whole form.
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
    /// Free-form rendering hints, opaque to the validator.
    #[serde(default)]
    pub ui_properties: Option<JsonValue>,
    /// Visibility expression; blank or absent means always visible.
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub validations: Vec<ValidationRule>,
}

impl Default for FieldDefinition {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            label: None,
            field_type: FieldType::Text,
            placeholder: None,
            default_value: None,
            options_source_type: None,
            static_options: Vec::new(),
            api_endpoint: None,
            ui_properties: None,
            condition: None,
            dependencies: Vec::new(),
            order: 0,
            validations: Vec::new(),
        }
    }
}

impl FieldDefinition {
    pub fn has_rule(&self, rule_type: ValidationRuleType) -> bool {
        self.validations.iter().any(|r| r.rule_type == rule_type)
    }

    /// First rule of the given type, in declaration order.
    pub fn rule(&self, rule_type: ValidationRuleType) -> Option<&ValidationRule> {
        self.validations.iter().find(|r| r.rule_type == rule_type)
    }

    pub fn rule_value(&self, rule_type: ValidationRuleType) -> Option<&str> {
        self.rule(rule_type).and_then(|r| r.value.as_deref())
    }

    pub fn is_required(&self) -> bool {
        self.has_rule(ValidationRuleType::Required)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SectionDefinition {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl SectionDefinition {
    /// Fields in display/validation order: ascending `order`, ties kept in
    /// insertion order.
    pub fn fields_ordered(&self) -> Vec<&FieldDefinition> {
        let mut fields: Vec<&FieldDefinition> = self.fields.iter().collect();
        fields.sort_by_key(|f| f.order);
        fields
    }
}

fn default_version() -> String {
    "1.0.0".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormDefinition {
    #[serde(default)]
    pub id: Option<String>,
    /// Globally unique form name.
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub status: FormStatus,
    #[serde(default)]
    pub form_type: FormType,
    /// Structured prefill blob; recognized keys `prefillFields`,
    /// `prefillSource`.
    #[serde(default)]
    pub initial_logic: Option<JsonValue>,
    /// Structured submission blob; recognized key `targetService`.
    #[serde(default)]
    pub submission_logic: Option<JsonValue>,
    #[serde(default)]
    pub sections: Vec<SectionDefinition>,
}

impl Default for FormDefinition {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            version: default_version(),
            description: None,
            target_audience: None,
            status: FormStatus::default(),
            form_type: FormType::default(),
            initial_logic: None,
            submission_logic: None,
            sections: Vec::new(),
        }
    }
}

/// Prefill behavior extracted from `initialLogic`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefillSpec {
    pub fields: Vec<String>,
    pub source: Option<String>,
}

impl FormDefinition {
    /// Sections in display/validation order: ascending `order`, ties kept
    /// in insertion order.
    pub fn sections_ordered(&self) -> Vec<&SectionDefinition> {
        let mut sections: Vec<&SectionDefinition> = self.sections.iter().collect();
        sections.sort_by_key(|s| s.order);
        sections
    }

    /// Field lookup by submission key across all sections.
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.sections
            .iter()
            .flat_map(|s| s.fields.iter())
            .find(|f| f.name == name)
    }

    /// `submissionLogic.targetService` when present and textual.
    pub fn target_service(&self) -> Option<&str> {
        self.submission_logic
            .as_ref()
            .and_then(|logic| logic.get("targetService"))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Prefill block from `initialLogic`, if any field list is declared.
    pub fn prefill(&self) -> Option<PrefillSpec> {
        let logic = self.initial_logic.as_ref()?;
        let fields: Vec<String> = logic
            .get("prefillFields")?
            .as_array()?
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        let source = logic
            .get("prefillSource")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        Some(PrefillSpec { fields, source })
    }
}

/// One persisted submission. Immutable after creation; references its form
/// definition by id only, so the reference may dangle if the form is later
/// deleted.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireResult {
    pub id: String,
    pub form_definition_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub response_data: JsonValue,
    pub submitted_at: DateTime<Utc>,
}
