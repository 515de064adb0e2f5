use formgate::{parse_form_file, validate_form};
use serde_json::{json, Map, Value};

fn submission(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

const SIGNUP_FORM: &str = r#"
name: signup
sections:
  - order: 1
    fields:
      - name: password
        fieldType: PASSWORD
        order: 1
        validations:
          - type: REQUIRED
      - name: confirm
        fieldType: PASSWORD
        order: 2
        validations:
          - type: CUSTOM_FUNCTION
            customFunction: "matches_field:password"
            errorMessage: ""
"#;

#[test]
fn custom_rule_sees_the_full_submission() {
    let form = parse_form_file(SIGNUP_FORM).unwrap();

    let ok = validate_form(
        &form,
        &submission(json!({ "password": "s3cret", "confirm": "s3cret" })),
    );
    assert!(ok.is_empty(), "unexpected errors: {ok:?}");

    let bad = validate_form(
        &form,
        &submission(json!({ "password": "s3cret", "confirm": "other" })),
    );
    assert_eq!(
        bad.get("confirm").map(String::as_str),
        Some("Value must match field 'password'")
    );
}

#[test]
fn unknown_custom_validator_surfaces_as_internal_error() {
    let yaml = r#"
name: broken
sections:
  - order: 1
    fields:
      - name: field
        fieldType: TEXT
        validations:
          - type: CUSTOM_FUNCTION
            customFunction: "launch_missiles"
"#;
    let form = parse_form_file(yaml).unwrap();
    let errors = validate_form(&form, &submission(json!({ "field": "x" })));
    let message = errors.get("field").expect("expected an error entry");
    assert!(message.starts_with("Internal validation error:"), "{message}");
}

#[test]
fn custom_rules_are_skipped_for_empty_optional_values() {
    let yaml = r#"
name: optional
sections:
  - order: 1
    fields:
      - name: field
        fieldType: TEXT
        validations:
          - type: CUSTOM_FUNCTION
            customFunction: "numeric"
"#;
    let form = parse_form_file(yaml).unwrap();
    assert!(validate_form(&form, &submission(json!({}))).is_empty());
    assert!(validate_form(&form, &submission(json!({ "field": "" }))).is_empty());
    assert!(!validate_form(&form, &submission(json!({ "field": "abc" }))).is_empty());
}

#[test]
fn first_failing_custom_rule_short_circuits() {
    let yaml = r#"
name: multi
sections:
  - order: 1
    fields:
      - name: field
        fieldType: TEXT
        validations:
          - type: CUSTOM_FUNCTION
            customFunction: "numeric"
          - type: CUSTOM_FUNCTION
            customFunction: "one_of:1|2"
"#;
    let form = parse_form_file(yaml).unwrap();
    let errors = validate_form(&form, &submission(json!({ "field": "abc" })));
    assert_eq!(errors.get("field").map(String::as_str), Some("Value must be numeric"));
}
