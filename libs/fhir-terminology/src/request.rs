//! Builds the `Parameters` payload for each remote terminology operation.

use serde_json::Value;

use crate::model::ExpansionOptions;
use crate::parameters::{OperationRequest, Parameters};

pub const VALIDATE_CODE: &str = "validate-code";
pub const LOOKUP: &str = "lookup";
pub const EXPAND: &str = "expand";

fn is_not_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// `$validate-code` against a CodeSystem, or against a ValueSet when either a
/// value-set URL or an inline value set is given.
///
/// `url` and `valueSet` are never both sent: an inline value set supersedes
/// the URL reference.
pub fn build_validate_code(
    code_system: &str,
    code: &str,
    display: Option<&str>,
    value_set_url: Option<&str>,
    value_set: Option<&Value>,
) -> OperationRequest {
    let mut params = Parameters::new();

    if value_set.is_none() && value_set_url.is_none() {
        params.add_value_uri("url".to_string(), code_system.to_string());
        params.add_value_string("code".to_string(), code.to_string());
        if let Some(display) = is_not_blank(display) {
            params.add_value_string("display".to_string(), display.to_string());
        }
        return OperationRequest::new("CodeSystem", VALIDATE_CODE, params);
    }

    if value_set.is_none() {
        if let Some(url) = is_not_blank(value_set_url) {
            params.add_value_uri("url".to_string(), url.to_string());
        }
    }
    params.add_value_string("code".to_string(), code.to_string());
    if let Some(system) = is_not_blank(Some(code_system)) {
        params.add_value_uri("system".to_string(), system.to_string());
    }
    if let Some(display) = is_not_blank(display) {
        params.add_value_string("display".to_string(), display.to_string());
    }
    if let Some(value_set) = value_set {
        params.add_resource("valueSet".to_string(), value_set.clone());
    }

    OperationRequest::new("ValueSet", VALIDATE_CODE, params)
}

/// `CodeSystem/$lookup`, always asking for every property.
pub fn build_lookup(system: &str, code: &str, display_language: Option<&str>) -> OperationRequest {
    let mut params = Parameters::new();
    params.add_value_string("code".to_string(), code.to_string());
    if let Some(system) = is_not_blank(Some(system)) {
        params.add_value_uri("system".to_string(), system.to_string());
    }
    if let Some(language) = is_not_blank(display_language) {
        params.add_value_string("displayLanguage".to_string(), language.to_string());
    }
    params.add_value_code("property".to_string(), "*".to_string());

    OperationRequest::new("CodeSystem", LOOKUP, params)
}

/// `ValueSet/$expand` of the given value set.
///
/// The filter's companion `url` parameter is intentionally not sent.
pub fn build_expand(value_set: &Value, options: &ExpansionOptions) -> OperationRequest {
    let mut params = Parameters::new();

    let is_value_set =
        value_set.get("resourceType").and_then(|v| v.as_str()) == Some("ValueSet");
    if let Some(filter) = options.filter.as_deref().filter(|f| !f.is_empty()) {
        if is_value_set {
            params.add_value_string("filter".to_string(), filter.to_string());
        }
    }
    params.add_resource("valueSet".to_string(), value_set.clone());

    OperationRequest::new("ValueSet", EXPAND, params)
}
