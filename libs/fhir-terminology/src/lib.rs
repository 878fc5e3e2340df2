//! Remote FHIR terminology adapter
//!
//! Answers code validation, concept lookup and value-set expansion by invoking
//! the standard terminology operations (`$validate-code`, `$lookup`, `$expand`)
//! on a remote FHIR server and normalizing the replies.
//!
//! # Architecture
//!
//! ```text
//! ValidationRequest → RoutingPolicy → request builder → TerminologyTransport
//!                                                            ↓
//!                         CodeValidationResult ← response parser
//! ```
//!
//! - **Routing**: LOINC codes go to an optional alternate [`CodeValidator`];
//!   everything else is validated by the primary server.
//! - **Transport**: [`HttpTransport`] posts FHIR `Parameters` and attaches the
//!   configured [`ClientInterceptor`]s (Basic, bearer, OAuth2 client credentials).
//! - **Failures**: not-found and invalid-request replies become a failed
//!   [`CodeValidationResult`] with one issue; a reply without `result` is an
//!   [`Error::MalformedResponse`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use zunder_terminology::{
//!     ConceptValidationOptions, RemoteTerminologyService, ServerConfig, TerminologyConfig,
//!     ValidationRequest, ValidationSupportContext,
//! };
//!
//! # async fn run() -> zunder_terminology::Result<()> {
//! let config = TerminologyConfig::new(ServerConfig::new("https://ontology.example.org/fhir"));
//! let service = Arc::new(RemoteTerminologyService::from_config(&config)?);
//! let ctx = ValidationSupportContext::new(service.clone());
//!
//! let request = ValidationRequest::new("http://snomed.info/sct", "22298006");
//! if let Some(result) = service
//!     .validate_code(&ctx, &ConceptValidationOptions::default(), &request)
//!     .await?
//! {
//!     println!("valid: {}", result.ok);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
mod error;
pub mod messages;
mod model;
pub mod parameters;
mod provider;
mod remote;
pub mod request;
pub mod response;
pub mod routing;
pub mod transport;

pub use config::{AuthorizationConfig, ServerConfig, TerminologyConfig};
pub use error::{Error, Result};
pub use model::{
    CodeValidationResult, ConceptProperty, ConceptValidationOptions, ExpansionOptions,
    ExpansionOutcome, IssueCode, IssueCoding, IssueSeverity, LookupResult, ValidationIssue,
    ValidationRequest, HL7_NAMESPACE_PREFIX, LOINC_SYSTEM,
};
pub use parameters::{OperationRequest, Parameters};
pub use provider::{CodeValidator, EmptyResolver, ResourceResolver, ValidationSupportContext};
pub use remote::RemoteTerminologyService;
pub use transport::{ClientInterceptor, HttpTransport, TerminologyTransport};
