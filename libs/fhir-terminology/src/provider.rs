//! Validator and resolver seams shared by terminology providers.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::model::{CodeValidationResult, ConceptValidationOptions, ValidationRequest};

/// Validates a code, optionally against a value set.
///
/// Implementations range from the remote adapter in this crate to a second
/// adapter dedicated to one code system. The remote adapter delegates to an
/// alternate implementation through this trait.
#[async_trait]
pub trait CodeValidator: Send + Sync {
    /// Returns `Ok(None)` when the implementation has no answer for this request
    /// (blank code, system inference requested).
    /// Returns `Ok(Some(result))` with the validation outcome otherwise.
    async fn validate_code(
        &self,
        ctx: &ValidationSupportContext,
        options: &ConceptValidationOptions,
        request: &ValidationRequest,
    ) -> Result<Option<CodeValidationResult>>;
}

/// Resolves canonical URLs to conformance resources.
#[async_trait]
pub trait ResourceResolver: Send + Sync {
    async fn fetch_code_system(&self, url: &str) -> Result<Option<Value>>;

    async fn fetch_value_set(&self, url: &str) -> Result<Option<Value>>;
}

/// Per-call context handed to every validator.
///
/// `root` is the top of the caller's resolver chain, used to resolve a
/// value-set URL before the remote call.
#[derive(Clone)]
pub struct ValidationSupportContext {
    root: Arc<dyn ResourceResolver>,
}

impl ValidationSupportContext {
    pub fn new(root: Arc<dyn ResourceResolver>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &dyn ResourceResolver {
        self.root.as_ref()
    }
}

/// A resolver that knows no resources.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyResolver;

#[async_trait]
impl ResourceResolver for EmptyResolver {
    async fn fetch_code_system(&self, _url: &str) -> Result<Option<Value>> {
        Ok(None)
    }

    async fn fetch_value_set(&self, _url: &str) -> Result<Option<Value>> {
        Ok(None)
    }
}

impl Default for ValidationSupportContext {
    fn default() -> Self {
        Self::new(Arc::new(EmptyResolver))
    }
}
