//! Validation support backed by a remote FHIR terminology server.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::TerminologyConfig;
use crate::error::{Error, Result};
use crate::messages::error_message_builder;
use crate::model::{
    CodeValidationResult, ConceptValidationOptions, ExpansionOptions, ExpansionOutcome, IssueCode,
    LookupResult, ValidationRequest,
};
use crate::provider::{CodeValidator, ResourceResolver, ValidationSupportContext};
use crate::request::{build_expand, build_lookup, build_validate_code};
use crate::response::{parse_expand, parse_lookup, parse_validate_code};
use crate::routing::{self, Route, RoutingPolicy};
use crate::transport::{HttpTransport, TerminologyTransport};

/// Answers validation, lookup and expansion requests by invoking FHIR
/// terminology operations on a remote server.
///
/// LOINC codes can be routed to an alternate [`CodeValidator`], typically a
/// second `RemoteTerminologyService` pointed at a dedicated LOINC server.
/// Holds no per-call state and is safe to share across tasks.
#[derive(Clone)]
pub struct RemoteTerminologyService {
    transport: Arc<dyn TerminologyTransport>,
    alternate: Option<Arc<dyn CodeValidator>>,
    routing: RoutingPolicy,
}

impl RemoteTerminologyService {
    pub fn new(transport: Arc<dyn TerminologyTransport>) -> Self {
        Self {
            transport,
            alternate: None,
            routing: RoutingPolicy::new(false),
        }
    }

    pub fn with_alternate(mut self, alternate: Arc<dyn CodeValidator>) -> Self {
        self.alternate = Some(alternate);
        self.routing = RoutingPolicy::new(true);
        self
    }

    /// Build the service and, when a `loinc` section is present, its LOINC alternate.
    pub fn from_config(config: &TerminologyConfig) -> Result<Self> {
        config.validate()?;

        let mut service = Self::new(Arc::new(HttpTransport::from_config(&config.server)?));
        if let Some(loinc) = &config.loinc {
            let alternate = Self::new(Arc::new(HttpTransport::from_config(loinc)?));
            service = service.with_alternate(Arc::new(alternate));
        }

        tracing::info!(
            base_url = %service.base_url(),
            loinc_base_url = config.loinc.as_ref().map(|l| l.base_url.as_str()),
            "Remote terminology service configured"
        );
        Ok(service)
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// Validate a code against its code system, or against a value set when the
    /// request names one.
    ///
    /// A value-set URL is first resolved through `ctx`'s root resolver; a
    /// resolved resource is sent inline. An unresolved or blank URL is dropped
    /// and the code is validated against its code system.
    pub async fn validate_code(
        &self,
        ctx: &ValidationSupportContext,
        options: &ConceptValidationOptions,
        request: &ValidationRequest,
    ) -> Result<Option<CodeValidationResult>> {
        let has_value_set_url = request
            .value_set_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty());
        if options.infer_system && request.inline_value_set.is_none() && has_value_set_url {
            return Ok(None);
        }

        match self.routing.route(request.clone()) {
            Route::Alternate(request) => self.delegate(ctx, options, &request).await,
            Route::Remote(request) => {
                let resolved = match routing::unresolved_value_set_url(&request) {
                    Some(url) => self.resolve_value_set(ctx, url).await,
                    None => None,
                };
                let request = routing::supersede_url(request, resolved);
                self.invoke_remote_validate_code(&request).await
            }
        }
    }

    /// Validate a code against an explicit value-set resource.
    pub async fn validate_code_in_value_set(
        &self,
        ctx: &ValidationSupportContext,
        options: &ConceptValidationOptions,
        code_system: &str,
        code: &str,
        display: Option<&str>,
        value_set: &Value,
    ) -> Result<Option<CodeValidationResult>> {
        if options.infer_system {
            return Ok(None);
        }

        let mut request =
            ValidationRequest::new(code_system, code).with_inline_value_set(value_set.clone());
        request.display = display.map(str::to_string);

        match self.routing.route(request) {
            Route::Alternate(mut request) => {
                // The alternate validates against the code system only.
                request.inline_value_set = None;
                request.value_set_url = None;
                self.delegate(ctx, options, &request).await
            }
            Route::Remote(request) => self.invoke_remote_validate_code(&request).await,
        }
    }

    async fn delegate(
        &self,
        ctx: &ValidationSupportContext,
        options: &ConceptValidationOptions,
        request: &ValidationRequest,
    ) -> Result<Option<CodeValidationResult>> {
        match &self.alternate {
            Some(alternate) => {
                tracing::debug!(
                    system = %request.code_system,
                    code = %request.code,
                    "Delegating code validation to alternate provider"
                );
                alternate.validate_code(ctx, options, request).await
            }
            None => self.invoke_remote_validate_code(request).await,
        }
    }

    async fn resolve_value_set(&self, ctx: &ValidationSupportContext, url: &str) -> Option<Value> {
        match ctx.root().fetch_value_set(url).await {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!(
                    url = %url,
                    error = %e,
                    "Could not resolve value set, validating against code system"
                );
                None
            }
        }
    }

    /// Run `$validate-code` on the primary server.
    ///
    /// Returns `Ok(None)` for a blank code. Not-found and invalid-request
    /// failures are reported as an error result; a response without `result`
    /// is an error.
    pub async fn invoke_remote_validate_code(
        &self,
        request: &ValidationRequest,
    ) -> Result<Option<CodeValidationResult>> {
        if request.has_blank_code() {
            return Ok(None);
        }

        let value_set_label = match (&request.value_set_url, &request.inline_value_set) {
            (Some(url), _) => Some(url.as_str()),
            (None, Some(value_set)) => Some(routing::value_set_url(value_set).unwrap_or_default()),
            (None, None) => None,
        };
        let build_message = error_message_builder(
            &request.code_system,
            &request.code,
            value_set_label,
            self.base_url(),
        );

        let operation = build_validate_code(
            &request.code_system,
            &request.code,
            request.display.as_deref(),
            request.value_set_url.as_deref(),
            request.inline_value_set.as_ref(),
        );

        match self.transport.invoke(&operation).await {
            Ok(output) => parse_validate_code(&output, &request.code, &*build_message).map(Some),
            Err(e) if e.is_transport_failure() => {
                tracing::error!(
                    system = %request.code_system,
                    code = %request.code,
                    error = %e,
                    "Remote $validate-code failed"
                );
                let issue_code = match &e {
                    Error::InvalidRequest(_) => IssueCode::CodeInvalid,
                    _ => IssueCode::NotFound,
                };
                let message = build_message(&e.to_string());
                Ok(Some(CodeValidationResult::error(issue_code, message)))
            }
            Err(e) => Err(e),
        }
    }

    /// Look up a concept. Returns `Ok(None)` for a blank code.
    ///
    /// A not-found response yields a result with `found == false`; other
    /// failures propagate.
    pub async fn lookup_code(
        &self,
        system: &str,
        code: &str,
        display_language: Option<&str>,
    ) -> Result<Option<LookupResult>> {
        if code.trim().is_empty() {
            return Ok(None);
        }

        let operation = build_lookup(system, code, display_language);
        match self.transport.invoke(&operation).await {
            Ok(output) => parse_lookup(&output).map(Some),
            Err(Error::ResourceNotFound(message)) => {
                tracing::debug!(system = %system, code = %code, %message, "Concept not found");
                Ok(Some(LookupResult::not_found(code, system)))
            }
            Err(e) => Err(e),
        }
    }

    /// Expand `value_set` on the server. `Ok(None)` when the server returns no
    /// expanded value set.
    pub async fn expand_value_set(
        &self,
        options: &ExpansionOptions,
        value_set: &Value,
    ) -> Result<Option<ExpansionOutcome>> {
        let operation = build_expand(value_set, options);
        let output = self.transport.invoke(&operation).await?;
        parse_expand(&output)
    }

    pub async fn fetch_code_system(&self, url: &str) -> Result<Option<Value>> {
        self.first_match("CodeSystem", url).await
    }

    pub async fn fetch_value_set(&self, url: &str) -> Result<Option<Value>> {
        self.first_match("ValueSet", url).await
    }

    pub async fn is_code_system_supported(&self, url: &str) -> Result<bool> {
        Ok(self.fetch_code_system(url).await?.is_some())
    }

    pub async fn is_value_set_supported(&self, url: &str) -> Result<bool> {
        Ok(self.fetch_value_set(url).await?.is_some())
    }

    /// Generic resource fetch is not supported by this adapter.
    pub async fn fetch_resource(&self, resource_type: &str, uri: &str) -> Result<Option<Value>> {
        tracing::debug!(resource_type, uri, "fetch_resource is not supported remotely");
        Ok(None)
    }

    async fn first_match(&self, resource_type: &str, url: &str) -> Result<Option<Value>> {
        let mut matches = self.transport.search(resource_type, url).await?;
        if matches.len() > 1 {
            tracing::debug!(
                resource_type,
                url,
                count = matches.len(),
                "Multiple matches, using the first"
            );
        }
        Ok((!matches.is_empty()).then(|| matches.swap_remove(0)))
    }
}

#[async_trait]
impl CodeValidator for RemoteTerminologyService {
    async fn validate_code(
        &self,
        ctx: &ValidationSupportContext,
        options: &ConceptValidationOptions,
        request: &ValidationRequest,
    ) -> Result<Option<CodeValidationResult>> {
        RemoteTerminologyService::validate_code(self, ctx, options, request).await
    }
}

#[async_trait]
impl ResourceResolver for RemoteTerminologyService {
    async fn fetch_code_system(&self, url: &str) -> Result<Option<Value>> {
        RemoteTerminologyService::fetch_code_system(self, url).await
    }

    async fn fetch_value_set(&self, url: &str) -> Result<Option<Value>> {
        RemoteTerminologyService::fetch_value_set(self, url).await
    }
}
