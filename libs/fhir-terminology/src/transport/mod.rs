//! Outbound seam: how the adapter reaches a terminology server.

mod http;
mod interceptor;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::parameters::OperationRequest;

pub use http::{HttpTransport, DEFAULT_CONNECT_TIMEOUT};
pub use interceptor::{
    from_authorization, BasicAuthInterceptor, BearerTokenInterceptor,
    ClientCredentialsInterceptor, ClientInterceptor,
};

/// Executes FHIR operations and searches against one terminology server.
///
/// Implementations make a single attempt per call. Failures are reported as
/// [`crate::Error::ResourceNotFound`] (404/410), [`crate::Error::InvalidRequest`]
/// (400/422) or a transport error when the call could not complete.
#[async_trait]
pub trait TerminologyTransport: Send + Sync {
    /// Base URL of the server, used in user-facing messages.
    fn base_url(&self) -> &str;

    /// Invoke `{resource_type}/${operation_name}` and return the output resource.
    async fn invoke(&self, request: &OperationRequest) -> Result<Value>;

    /// Search `resource_type` for resources whose canonical `url` equals `url`,
    /// in server order.
    async fn search(&self, resource_type: &str, url: &str) -> Result<Vec<Value>>;
}
