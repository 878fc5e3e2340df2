//! Decides whether a validation request goes to the alternate provider or to
//! the primary terminology server.

use serde_json::Value;

use crate::model::{ValidationRequest, HL7_NAMESPACE_PREFIX};

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// Hand the request to the alternate provider and return its answer verbatim.
    Alternate(ValidationRequest),
    /// Run `$validate-code` on the primary server.
    Remote(ValidationRequest),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RoutingPolicy {
    has_alternate: bool,
}

impl RoutingPolicy {
    pub fn new(has_alternate: bool) -> Self {
        Self { has_alternate }
    }

    /// Route one request. Evaluated in order:
    ///
    /// 1. LOINC codes go to the alternate provider when one is configured.
    /// 2. LOINC codes bound to an inline value set published under
    ///    `http://hl7.org/` go to the alternate provider as well.
    /// 3. Everything else is validated remotely.
    pub fn route(&self, request: ValidationRequest) -> Route {
        if self.delegates_code_system(&request) || self.delegates_hl7_value_set(&request) {
            return Route::Alternate(request);
        }
        Route::Remote(request)
    }

    fn delegates_code_system(&self, request: &ValidationRequest) -> bool {
        self.has_alternate && request.is_loinc() && !request.has_blank_code()
    }

    fn delegates_hl7_value_set(&self, request: &ValidationRequest) -> bool {
        let hl7_value_set = request
            .inline_value_set
            .as_ref()
            .and_then(value_set_url)
            .is_some_and(|url| url.starts_with(HL7_NAMESPACE_PREFIX));

        hl7_value_set && self.has_alternate && !request.has_blank_code() && request.is_loinc()
    }
}

/// The canonical `url` declared by a ValueSet resource.
pub fn value_set_url(value_set: &Value) -> Option<&str> {
    if value_set.get("resourceType").and_then(|v| v.as_str()) != Some("ValueSet") {
        return None;
    }
    value_set.get("url").and_then(|v| v.as_str())
}

/// The URL a remote call still needs resolved: present, non-blank, and not
/// already superseded by an inline value set.
pub fn unresolved_value_set_url(request: &ValidationRequest) -> Option<&str> {
    if request.inline_value_set.is_some() {
        return None;
    }
    request
        .value_set_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
}

/// Apply the outcome of resolving the value-set URL. The URL is never sent
/// by reference: a resolved resource goes inline, and an unresolved URL falls
/// back to validation against the code system.
pub fn supersede_url(mut request: ValidationRequest, resolved: Option<Value>) -> ValidationRequest {
    if let Some(value_set) = resolved {
        request.inline_value_set = Some(value_set);
    }
    request.value_set_url = None;
    request
}
