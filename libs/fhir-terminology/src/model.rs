//! Request and result types shared by every terminology provider.

use serde::Serialize;
use serde_json::Value;

use crate::parameters::Parameters;

/// Canonical URL of the LOINC code system.
pub const LOINC_SYSTEM: &str = "http://loinc.org";

/// Namespace prefix of value sets published by HL7 itself.
pub const HL7_NAMESPACE_PREFIX: &str = "http://hl7.org/";

/// A request to validate one code, optionally bound to a value set.
///
/// When both `value_set_url` and `inline_value_set` are present the inline
/// resource is authoritative and the URL is never sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationRequest {
    pub code_system: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_set_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_value_set: Option<Value>,
}

impl ValidationRequest {
    pub fn new(code_system: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            code_system: code_system.into(),
            code: code.into(),
            ..Self::default()
        }
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    pub fn with_value_set_url(mut self, url: impl Into<String>) -> Self {
        self.value_set_url = Some(url.into());
        self
    }

    pub fn with_inline_value_set(mut self, value_set: Value) -> Self {
        self.inline_value_set = Some(value_set);
        self
    }

    pub fn has_blank_code(&self) -> bool {
        self.code.trim().is_empty()
    }

    pub fn is_loinc(&self) -> bool {
        self.code_system == LOINC_SYSTEM
    }
}

/// Options recognised by the validate-code entry points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConceptValidationOptions {
    /// The caller infers the code system itself; this adapter answers nothing.
    pub infer_system: bool,
}

/// Options recognised by `expand_value_set`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionOptions {
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Fatal,
    Error,
    Warning,
    Information,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    UnknownCodeInCodeSystem,
    UnknownCodeInValueSet,
    Invalid,
    NotFound,
    CodeInvalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCoding {
    InvalidCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub message: String,
    pub severity: IssueSeverity,
    pub code: IssueCode,
    pub coding: IssueCoding,
}

impl ValidationIssue {
    pub fn error(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: IssueSeverity::Error,
            code,
            coding: IssueCoding::InvalidCode,
        }
    }
}

/// Normalized outcome of a validate-code call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CodeValidationResult {
    pub ok: bool,
    /// The requested code, echoed back only when `ok`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_system_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_system_version: Option<String>,
    /// `None` on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<IssueSeverity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub issues: Vec<ValidationIssue>,
}

impl CodeValidationResult {
    pub fn valid(code: impl Into<String>) -> Self {
        Self {
            ok: true,
            code: Some(code.into()),
            ..Self::default()
        }
    }

    /// A failed result carrying a single issue built from `message`.
    pub fn error(issue_code: IssueCode, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            ok: false,
            severity: Some(IssueSeverity::Error),
            issues: vec![ValidationIssue::error(issue_code, message.clone())],
            message: Some(message),
            ..Self::default()
        }
    }
}

/// A named attribute attached to a concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConceptProperty {
    String {
        name: String,
        value: String,
    },
    Coding {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        system: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        display: Option<String>,
    },
}

impl ConceptProperty {
    pub fn name(&self) -> &str {
        match self {
            ConceptProperty::String { name, .. } | ConceptProperty::Coding { name, .. } => name,
        }
    }
}

/// Normalized outcome of a lookup call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LookupResult {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_system_display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_system_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub searched_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub searched_system: Option<String>,
    pub properties: Vec<ConceptProperty>,
    /// The raw remote output, kept for downstream inspection.
    #[serde(skip)]
    pub original_parameters: Option<Parameters>,
}

impl LookupResult {
    pub fn not_found(code: &str, system: &str) -> Self {
        Self {
            found: false,
            searched_code: Some(code.to_string()),
            searched_system: (!system.trim().is_empty()).then(|| system.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpansionOutcome {
    pub expanded_value_set: Value,
}
