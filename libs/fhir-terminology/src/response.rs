//! Normalizes remote operation outputs into [`CodeValidationResult`],
//! [`LookupResult`] and [`ExpansionOutcome`].

use phf::phf_map;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::{
    CodeValidationResult, ConceptProperty, ExpansionOutcome, IssueCode, IssueSeverity,
    LookupResult, ValidationIssue,
};
use crate::parameters::{Parameter, ParameterValue, Parameters, TypedValue};

/// Parse a `$validate-code` output.
///
/// A missing `result` parameter is a protocol violation by the server and is
/// returned as [`Error::MalformedResponse`].
pub fn parse_validate_code(
    output: &Value,
    code: &str,
    build_message: &dyn Fn(&str) -> String,
) -> Result<CodeValidationResult> {
    let params = Parameters::from_output(output)
        .map_err(|e| {
            Error::MalformedResponse(format!(
                "$validate-code response is not a valid Parameters resource: {e}"
            ))
        })?
        .unwrap_or_default();

    let result_value = params.get_value_as_string("result").ok_or_else(|| {
        Error::MalformedResponse(
            "Parameter `result` is missing from the $validate-code response.".to_string(),
        )
    })?;
    let success = result_value.eq_ignore_ascii_case("true");

    let mut result = CodeValidationResult {
        ok: success,
        code: success.then(|| code.to_string()),
        code_system_name: params.get_value_as_string("system"),
        code_system_version: params.get_value_as_string("version"),
        display: params.get_value_as_string("display"),
        ..CodeValidationResult::default()
    };

    if success {
        return Ok(result);
    }

    result.severity = Some(IssueSeverity::Error);
    result.message = params
        .get_value_as_string("message")
        .map(|message| build_message(&message));

    match params.get_resource("issues") {
        Some(outcome) => result.issues = issues_from_operation_outcome(outcome),
        None => {
            // Some servers only report a message; downstream consumers read issues.
            let message = result.message.clone().unwrap_or_default();
            result
                .issues
                .push(ValidationIssue::error(IssueCode::Invalid, message));
        }
    }

    Ok(result)
}

/// One [`IssueCode::Invalid`] issue per `OperationOutcome.issue`, using its detail text.
pub fn issues_from_operation_outcome(outcome: &Value) -> Vec<ValidationIssue> {
    outcome
        .get("issue")
        .and_then(|v| v.as_array())
        .map(|issues| {
            issues
                .iter()
                .map(|issue| {
                    let text = issue
                        .get("details")
                        .and_then(|d| d.get("text"))
                        .or_else(|| issue.get("diagnostics"))
                        .and_then(|t| t.as_str())
                        .unwrap_or_default();
                    ValidationIssue::error(IssueCode::Invalid, text)
                })
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy)]
enum LookupField {
    Code,
    Display,
    Name,
    Version,
    System,
}

static LOOKUP_FIELDS: phf::Map<&'static str, LookupField> = phf_map! {
    "code" => LookupField::Code,
    "display" => LookupField::Display,
    "name" => LookupField::Name,
    "version" => LookupField::Version,
    "system" => LookupField::System,
};

/// Parse a `$lookup` output. Anything that is not a Parameters resource is "not found".
pub fn parse_lookup(output: &Value) -> Result<LookupResult> {
    let Some(params) = Parameters::from_output(output)? else {
        return Ok(LookupResult::default());
    };

    let mut result = LookupResult::default();
    for param in params.all_parameters() {
        let value = param.value.typed();
        match LOOKUP_FIELDS.get(param.name.as_str()) {
            Some(LookupField::Code) => {
                result.found = true;
                result.searched_code = value.and_then(|v| v.as_string());
            }
            Some(LookupField::Display) => result.display = value.and_then(|v| v.as_string()),
            Some(LookupField::Name) => {
                result.code_system_display_name = value.and_then(|v| v.as_string())
            }
            Some(LookupField::Version) => {
                result.code_system_version = value.and_then(|v| v.as_string())
            }
            Some(LookupField::System) => {
                result.searched_system = value.and_then(|v| v.as_string())
            }
            None => {
                if let Some(property) = default_property(param) {
                    result.properties.push(property);
                }
            }
        }
    }
    result.original_parameters = Some(params);

    Ok(result)
}

/// Promote an unrecognized parameter to a generic property.
fn default_property(param: &Parameter) -> Option<ConceptProperty> {
    if let ParameterValue::Parts { part } = &param.value {
        return if param.name == "property" {
            property_from_parts(part)
        } else {
            None
        };
    }
    match param.value.typed()? {
        TypedValue::String(value) => Some(ConceptProperty::String {
            name: param.name.clone(),
            value: value.to_string(),
        }),
        value => coding_property(&param.name, value),
    }
}

fn coding_property(name: &str, value: TypedValue<'_>) -> Option<ConceptProperty> {
    let field = |coding: &Value, key: &str| {
        coding
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    };
    match value {
        TypedValue::Code(code) => Some(ConceptProperty::Coding {
            name: name.to_string(),
            system: None,
            code: Some(code.to_string()),
            display: None,
        }),
        TypedValue::Coding(coding) => Some(ConceptProperty::Coding {
            name: name.to_string(),
            system: field(coding, "system"),
            code: field(coding, "code"),
            display: field(coding, "display"),
        }),
        _ => None,
    }
}

/// `property` parameters carry `code` and `value[x]` parts.
fn property_from_parts(parts: &[Parameter]) -> Option<ConceptProperty> {
    let name = parts
        .iter()
        .find(|p| p.name == "code")
        .and_then(|p| p.value.typed())
        .and_then(|v| v.as_string())?;
    let value = parts
        .iter()
        .find(|p| p.name == "value")
        .and_then(|p| p.value.typed())?;

    match value {
        TypedValue::Code(_) | TypedValue::Coding(_) => coding_property(&name, value),
        other => other
            .as_string()
            .map(|value| ConceptProperty::String { name, value }),
    }
}

/// Parse a `$expand` output: either the expanded ValueSet itself or a
/// Parameters whose first parameter carries it.
pub fn parse_expand(output: &Value) -> Result<Option<ExpansionOutcome>> {
    let is_value_set = |v: &Value| v.get("resourceType").and_then(|t| t.as_str()) == Some("ValueSet");

    if is_value_set(output) {
        return Ok(Some(ExpansionOutcome {
            expanded_value_set: output.clone(),
        }));
    }

    let Some(params) = Parameters::from_output(output)? else {
        return Ok(None);
    };
    let expanded = params.all_parameters().next().and_then(|p| match &p.value {
        ParameterValue::Resource { resource } if is_value_set(resource) => Some(resource.clone()),
        _ => None,
    });

    Ok(expanded.map(|expanded_value_set| ExpansionOutcome { expanded_value_set }))
}
