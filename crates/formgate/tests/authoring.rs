use formgate::{parse_form_file, validate_form_definition, ErrorCode};

fn codes(yaml: &str) -> Vec<(String, Option<String>)> {
    let form = parse_form_file(yaml).expect("failed to parse form definition");
    match validate_form_definition(&form) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .into_iter()
            .map(|e| (e.code.as_str().to_string(), e.path))
            .collect(),
    }
}

#[test]
fn well_formed_definition_passes_preflight() {
    let yaml = r#"
name: profile
sections:
  - title: Basics
    order: 1
    fields:
      - name: email
        fieldType: EMAIL
        order: 1
        validations:
          - type: REQUIRED
          - type: MAX_LENGTH
            value: "120"
      - name: country
        fieldType: SELECT
        order: 2
        optionsSourceType: STATIC
        staticOptions:
          - { value: de, label: Germany }
          - { value: fr, label: France }
      - name: confirm
        fieldType: TEXT
        order: 3
        validations:
          - type: CUSTOM_FUNCTION
            customFunction: "matches_field:email"
"#;
    assert!(codes(yaml).is_empty());
}

#[test]
fn duplicate_field_names_are_reported_with_paths() {
    let yaml = r#"
name: dupes
sections:
  - order: 1
    fields:
      - name: email
        fieldType: EMAIL
  - order: 2
    fields:
      - name: email
        fieldType: TEXT
"#;
    let found = codes(yaml);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].0, "DuplicateFieldName");
    assert_eq!(found[0].1.as_deref(), Some("sections[1].fields[0].name"));
}

#[test]
fn malformed_rules_are_caught_at_authoring_time() {
    let yaml = r#"
name: broken
sections:
  - order: 1
    fields:
      - name: a
        fieldType: TEXT
        validations:
          - type: MIN_LENGTH
            value: "abc"
      - name: b
        fieldType: TEXT
        validations:
          - type: REGEX
            value: "([unclosed"
      - name: c
        fieldType: TEXT
        validations:
          - type: CUSTOM_FUNCTION
            customFunction: "frobnicate"
      - name: d
        fieldType: NUMBER
        validations:
          - type: NUMBER_RANGE
            value: "5to10"
"#;
    let mut found: Vec<String> = codes(yaml).into_iter().map(|(code, _)| code).collect();
    found.sort();
    assert_eq!(
        found,
        vec![
            "InvalidNumberRange",
            "InvalidRegexPattern",
            "InvalidRuleValue",
            "UnknownCustomFunction",
        ]
    );
}

#[test]
fn options_sources_require_their_configuration() {
    let yaml = r#"
name: options
sections:
  - order: 1
    fields:
      - name: static_without_options
        fieldType: SELECT
        optionsSourceType: STATIC
      - name: dynamic_without_endpoint
        fieldType: SELECT
        optionsSourceType: DYNAMIC_API
"#;
    let mut found: Vec<String> = codes(yaml).into_iter().map(|(code, _)| code).collect();
    found.sort();
    assert_eq!(found, vec!["MissingApiEndpoint", "MissingStaticOptions"]);
}

#[test]
fn blank_names_are_rejected() {
    let yaml = r#"
name: ""
sections:
  - order: 1
    fields:
      - name: "  "
        fieldType: TEXT
"#;
    let found: Vec<String> = codes(yaml).into_iter().map(|(code, _)| code).collect();
    assert!(found.contains(&ErrorCode::BlankFormName.as_str().to_string()));
    assert!(found.contains(&ErrorCode::BlankFieldName.as_str().to_string()));
}
