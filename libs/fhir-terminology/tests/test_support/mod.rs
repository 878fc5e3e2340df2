#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use zunder_terminology::{
    CodeValidationResult, CodeValidator, ConceptValidationOptions, Error, OperationRequest,
    RemoteTerminologyService, ResourceResolver, Result, TerminologyTransport, ValidationRequest,
    ValidationSupportContext,
};

pub const BASE_URL: &str = "https://ontology.example.org/fhir";
pub const SNOMED: &str = "http://snomed.info/sct";

// ---------------------------------------------------------------------------
// Scripted transport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum StubReply {
    Ok(Value),
    NotFound(String),
    InvalidRequest(String),
    Unavailable(String),
}

impl StubReply {
    fn into_result(self) -> Result<Value> {
        match self {
            StubReply::Ok(value) => Ok(value),
            StubReply::NotFound(msg) => Err(Error::ResourceNotFound(msg)),
            StubReply::InvalidRequest(msg) => Err(Error::InvalidRequest(msg)),
            StubReply::Unavailable(msg) => Err(Error::Transport(msg)),
        }
    }
}

/// Answers operations and searches from a script and records every call.
#[derive(Default)]
pub struct StubTransport {
    operations: Mutex<HashMap<(String, String), StubReply>>,
    searches: Mutex<HashMap<(String, String), Vec<Value>>>,
    calls: Mutex<Vec<OperationRequest>>,
    search_calls: Mutex<Vec<(String, String)>>,
}

impl StubTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, resource_type: &str, operation: &str, reply: StubReply) {
        self.operations
            .lock()
            .unwrap()
            .insert((resource_type.to_string(), operation.to_string()), reply);
    }

    pub fn search_result(&self, resource_type: &str, url: &str, resources: Vec<Value>) {
        self.searches
            .lock()
            .unwrap()
            .insert((resource_type.to_string(), url.to_string()), resources);
    }

    pub fn calls(&self) -> Vec<OperationRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> OperationRequest {
        self.calls().pop().expect("no operation was invoked")
    }

    pub fn search_calls(&self) -> Vec<(String, String)> {
        self.search_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TerminologyTransport for StubTransport {
    fn base_url(&self) -> &str {
        BASE_URL
    }

    async fn invoke(&self, request: &OperationRequest) -> Result<Value> {
        self.calls.lock().unwrap().push(request.clone());
        let key = (
            request.resource_type.clone(),
            request.operation_name.clone(),
        );
        let reply = self.operations.lock().unwrap().get(&key).cloned();
        reply
            .unwrap_or_else(|| StubReply::Unavailable(format!("no reply scripted for {key:?}")))
            .into_result()
    }

    async fn search(&self, resource_type: &str, url: &str) -> Result<Vec<Value>> {
        let key = (resource_type.to_string(), url.to_string());
        self.search_calls.lock().unwrap().push(key.clone());
        Ok(self
            .searches
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Recording alternate provider
// ---------------------------------------------------------------------------

pub struct StubValidator {
    answer: CodeValidationResult,
    received: Mutex<Vec<ValidationRequest>>,
}

impl StubValidator {
    pub fn new(answer: CodeValidationResult) -> Arc<Self> {
        Arc::new(Self {
            answer,
            received: Mutex::new(Vec::new()),
        })
    }

    pub fn received(&self) -> Vec<ValidationRequest> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl CodeValidator for StubValidator {
    async fn validate_code(
        &self,
        _ctx: &ValidationSupportContext,
        _options: &ConceptValidationOptions,
        request: &ValidationRequest,
    ) -> Result<Option<CodeValidationResult>> {
        self.received.lock().unwrap().push(request.clone());
        Ok(Some(self.answer.clone()))
    }
}

// ---------------------------------------------------------------------------
// Root resolver
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct StubResolver {
    value_sets: HashMap<String, Value>,
}

impl StubResolver {
    pub fn with_value_set(mut self, value_set: Value) -> Self {
        let url = value_set["url"].as_str().unwrap().to_string();
        self.value_sets.insert(url, value_set);
        self
    }
}

#[async_trait]
impl ResourceResolver for StubResolver {
    async fn fetch_code_system(&self, _url: &str) -> Result<Option<Value>> {
        Ok(None)
    }

    async fn fetch_value_set(&self, url: &str) -> Result<Option<Value>> {
        Ok(self.value_sets.get(url).cloned())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn service(transport: &Arc<StubTransport>) -> RemoteTerminologyService {
    RemoteTerminologyService::new(transport.clone())
}

pub fn context() -> ValidationSupportContext {
    ValidationSupportContext::default()
}

pub fn context_with(resolver: StubResolver) -> ValidationSupportContext {
    ValidationSupportContext::new(Arc::new(resolver))
}

pub fn value_set(url: &str) -> Value {
    json!({
        "resourceType": "ValueSet",
        "url": url,
        "status": "active",
        "compose": {"include": [{"system": SNOMED}]}
    })
}

pub fn validate_code_output(result: bool) -> Value {
    json!({
        "resourceType": "Parameters",
        "parameter": [
            {"name": "result", "valueBoolean": result},
            {"name": "display", "valueString": "Myocardial infarction"},
            {"name": "system", "valueUri": SNOMED},
            {"name": "version", "valueString": "http://snomed.info/sct/83821000000107/version/20240925"}
        ]
    })
}

pub fn failed_validate_code_output(message: &str) -> Value {
    json!({
        "resourceType": "Parameters",
        "parameter": [
            {"name": "result", "valueBoolean": false},
            {"name": "message", "valueString": message}
        ]
    })
}

/// Value of the named parameter in a recorded request, rendered as a string.
pub fn param(request: &OperationRequest, name: &str) -> Option<String> {
    request.parameters.get_value_as_string(name)
}
