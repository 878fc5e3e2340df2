//! FHIR `Parameters` resource and operation invocation request

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// A named operation invoked on a resource-type endpoint, e.g. `ValueSet/$validate-code`.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRequest {
    pub resource_type: String,
    pub operation_name: String,
    pub parameters: Parameters,
}

impl OperationRequest {
    pub fn new(
        resource_type: impl Into<String>,
        operation_name: impl Into<String>,
        parameters: Parameters,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            operation_name: operation_name.into(),
            parameters,
        }
    }
}

/// FHIR Parameters resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    #[serde(rename = "resourceType")]
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<Vec<Parameter>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(flatten)]
    pub value: ParameterValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Resource {
        resource: JsonValue,
    },
    Parts {
        part: Vec<Parameter>,
    },
    /// FHIR JSON "value[x]" parameter content, e.g. `{ "valueString": "..." }`
    Value(HashMap<String, JsonValue>),
}

/// A parameter's `value[x]`, tagged by its FHIR datatype.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypedValue<'a> {
    String(&'a str),
    Code(&'a str),
    Uri(&'a str),
    Boolean(bool),
    /// `valueCoding`: an embedded system/code/display triple.
    Coding(&'a JsonValue),
    /// Any other datatype, keyed by its JSON property name (e.g. `valueInteger`).
    Other(&'a str, &'a JsonValue),
}

impl<'a> TypedValue<'a> {
    /// Render primitive values as a string. Complex values yield `None`.
    pub fn as_string(&self) -> Option<String> {
        match *self {
            TypedValue::String(s) | TypedValue::Code(s) | TypedValue::Uri(s) => Some(s.to_string()),
            TypedValue::Boolean(b) => Some(b.to_string()),
            TypedValue::Other(_, JsonValue::String(s)) => Some(s.clone()),
            TypedValue::Other(_, JsonValue::Number(n)) => Some(n.to_string()),
            TypedValue::Other(_, JsonValue::Bool(b)) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl ParameterValue {
    /// The tagged `value[x]` of a value parameter, ignoring sibling keys such as `extension`.
    pub fn typed(&self) -> Option<TypedValue<'_>> {
        let ParameterValue::Value(map) = self else {
            return None;
        };
        let (key, value) = map.iter().find(|(k, _)| k.starts_with("value"))?;
        let typed = match (key.as_str(), value) {
            ("valueString" | "valueMarkdown", JsonValue::String(s)) => TypedValue::String(s),
            ("valueCode", JsonValue::String(s)) => TypedValue::Code(s),
            ("valueUri" | "valueUrl" | "valueCanonical", JsonValue::String(s)) => {
                TypedValue::Uri(s)
            }
            ("valueBoolean", JsonValue::Bool(b)) => TypedValue::Boolean(*b),
            ("valueCoding", coding) => TypedValue::Coding(coding),
            (other, value) => TypedValue::Other(other, value),
        };
        Some(typed)
    }
}

impl Parameters {
    pub fn new() -> Self {
        Self {
            resource_type: "Parameters".to_string(),
            parameter: None,
        }
    }

    /// Interpret a remote output as a Parameters resource.
    ///
    /// Returns `None` when the output is some other resource type.
    pub fn from_output(output: &JsonValue) -> crate::Result<Option<Self>> {
        if output.get("resourceType").and_then(|v| v.as_str()) != Some("Parameters") {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(output.clone())?))
    }

    fn push(&mut self, name: String, key: &str, value: JsonValue) {
        let param = Parameter {
            name,
            value: ParameterValue::Value(HashMap::from([(key.to_string(), value)])),
        };
        self.parameter.get_or_insert_with(Vec::new).push(param);
    }

    pub fn add_value_string(&mut self, name: String, value: String) {
        self.push(name, "valueString", JsonValue::String(value));
    }

    pub fn add_value_code(&mut self, name: String, value: String) {
        self.push(name, "valueCode", JsonValue::String(value));
    }

    pub fn add_value_uri(&mut self, name: String, value: String) {
        self.push(name, "valueUri", JsonValue::String(value));
    }

    pub fn add_resource(&mut self, name: String, resource: JsonValue) {
        let param = Parameter {
            name,
            value: ParameterValue::Resource { resource },
        };
        self.parameter.get_or_insert_with(Vec::new).push(param);
    }

    pub fn get_parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameter.as_ref()?.iter().find(|p| p.name == name)
    }

    pub fn get_value(&self, name: &str) -> Option<TypedValue<'_>> {
        self.get_parameter(name)?.value.typed()
    }

    /// First value of the named parameter rendered as a string.
    pub fn get_value_as_string(&self, name: &str) -> Option<String> {
        self.get_value(name)?.as_string()
    }

    pub fn get_resource(&self, name: &str) -> Option<&JsonValue> {
        match &self.get_parameter(name)?.value {
            ParameterValue::Resource { resource } => Some(resource),
            _ => None,
        }
    }

    pub fn count_parameters(&self, name: &str) -> usize {
        self.parameter
            .as_ref()
            .map(|ps| ps.iter().filter(|p| p.name == name).count())
            .unwrap_or(0)
    }

    pub fn names(&self) -> Vec<&str> {
        self.all_parameters().map(|p| p.name.as_str()).collect()
    }

    pub fn all_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameter.as_deref().unwrap_or(&[]).iter()
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::new()
    }
}
