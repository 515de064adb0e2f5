mod cache;
pub mod condition;
pub mod custom;
mod error;
mod model;
pub mod reconcile;
pub mod render;
mod validate;
mod validator;

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use condition::{is_visible, parse_condition, CompareOp, Condition};
pub use custom::{is_known_builtin, run_custom_rule, BUILTIN_NAMES};
pub use error::{DefinitionError, DefinitionResult, ErrorCode, ErrorMap};
pub use model::{
    FieldDefinition, FieldType, FormDefinition, FormStatus, FormType, OptionsSourceType,
    PrefillSpec, QuestionnaireResult, SectionDefinition, StaticOption, ValidationRule,
    ValidationRuleType,
};
pub use reconcile::{apply_update, UpdateField, UpdateFormDefinition, UpdateRule, UpdateSection};
pub use render::{label_projection, render_model, FieldRenderModel, FormRenderModel, SectionRenderModel};
pub use validate::{is_empty_value, validate_field, validate_field_with_data, validate_form, EMAIL_PATTERN};
pub use validator::validate_form_definition;

use std::sync::{Mutex, OnceLock};

use cache::LruCache;

const FORM_CACHE_CAPACITY: usize = 128;

fn form_cache() -> &'static Mutex<LruCache<String, FormDefinition>> {
    static FORM_CACHE: OnceLock<Mutex<LruCache<String, FormDefinition>>> = OnceLock::new();
    FORM_CACHE.get_or_init(|| Mutex::new(LruCache::new(FORM_CACHE_CAPACITY)))
}

/// Parses a form definition from YAML or JSON source (JSON being a YAML
/// subset, one parse path covers both). Parsed definitions are cached by
/// source text.
pub fn parse_form_file(source: &str) -> Result<FormDefinition, serde_yaml::Error> {
    let key = source.to_string();
    if let Some(form) = {
        let mut cache = form_cache().lock().unwrap_or_else(|err| err.into_inner());
        cache.get_cloned(&key)
    } {
        return Ok(form);
    }

    let form: FormDefinition = serde_yaml::from_str(source)?;
    {
        let mut cache = form_cache().lock().unwrap_or_else(|err| err.into_inner());
        cache.insert(key, form.clone());
    }
    Ok(form)
}
