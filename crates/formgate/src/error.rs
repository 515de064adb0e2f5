use std::collections::BTreeMap;

/// Authoring-time error codes reported by the definition preflight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    BlankFormName,
    BlankFieldName,
    DuplicateFieldName,
    MissingStaticOptions,
    MissingApiEndpoint,
    MissingRuleValue,
    InvalidRuleValue,
    InvalidNumberRange,
    InvalidRegexPattern,
    UnknownCustomFunction,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BlankFormName => "BlankFormName",
            ErrorCode::BlankFieldName => "BlankFieldName",
            ErrorCode::DuplicateFieldName => "DuplicateFieldName",
            ErrorCode::MissingStaticOptions => "MissingStaticOptions",
            ErrorCode::MissingApiEndpoint => "MissingApiEndpoint",
            ErrorCode::MissingRuleValue => "MissingRuleValue",
            ErrorCode::InvalidRuleValue => "InvalidRuleValue",
            ErrorCode::InvalidNumberRange => "InvalidNumberRange",
            ErrorCode::InvalidRegexPattern => "InvalidRegexPattern",
            ErrorCode::UnknownCustomFunction => "UnknownCustomFunction",
        }
    }
}

/// One authoring-time defect, with a path into the definition tree such as
/// `sections[0].fields[2].validations[1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionError {
    pub code: ErrorCode,
    pub message: String,
    pub path: Option<String>,
}

impl DefinitionError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl std::fmt::Display for DefinitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{} {}: {}", self.code.as_str(), path, self.message),
            None => write!(f, "{}: {}", self.code.as_str(), self.message),
        }
    }
}

pub type DefinitionResult = Result<(), Vec<DefinitionError>>;

/// Submission validation outcome: field name to error message. Empty means
/// the submission is fully valid. A BTreeMap keeps reporting deterministic
/// across identical calls.
pub type ErrorMap = BTreeMap<String, String>;
