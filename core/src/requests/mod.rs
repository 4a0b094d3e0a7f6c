//! Request encoders, one per Cloud Build call.
//!
//! # Design
//! Every call is a small struct implementing [`ApiRequest`]: it knows how to
//! turn its inputs into an [`HttpRequest`] and how to decode a response body
//! into its typed result. The encoders never perform I/O; [`crate::Client`]
//! runs them through a transport.
//!
//! A failed decode leaves the stored result at its default value.

mod cancel;
mod create;
mod get;
mod list;
mod retry;

pub use cancel::CancelBuild;
pub use create::CreateBuild;
pub use get::GetBuild;
pub use list::ListBuilds;
pub use retry::RetryBuild;

use serde::de::DeserializeOwned;

use crate::error::{ApiError, Result};
use crate::http::HttpRequest;

/// Production Cloud Build endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://cloudbuild.googleapis.com";

/// A single API call: request construction plus response decoding.
pub trait ApiRequest {
    /// The typed result this call produces.
    type Output;

    /// Short name used in log events.
    fn name(&self) -> &'static str;

    /// Build the HTTP request for `project_id` against `endpoint`, which has
    /// no trailing slash.
    fn build_request(&self, endpoint: &str, project_id: &str) -> Result<HttpRequest>;

    /// Decode a successful response body into the stored result.
    fn parse_response(&mut self, body: &[u8]) -> Result<()>;

    fn response(&self) -> &Self::Output;

    fn into_response(self) -> Self::Output
    where
        Self: Sized;
}

/// `{endpoint}/v1/projects/{project}/builds`
pub(crate) fn builds_url(endpoint: &str, project_id: &str) -> String {
    format!("{endpoint}/v1/projects/{project_id}/builds")
}

/// `{endpoint}/v1/projects/{project}/builds/{id}`
pub(crate) fn build_url(endpoint: &str, project_id: &str, build_id: &str) -> String {
    format!("{}/{build_id}", builds_url(endpoint, project_id))
}

pub(crate) fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(ApiError::Decoding)
}
