//! Retry: start a new build from an existing one.

use crate::error::Result;
use crate::http::{HttpMethod, HttpRequest};
use crate::operation::Operation;
use crate::requests::{build_url, decode, ApiRequest};

/// `POST /v1/projects/{project}/builds/{id}:retry`
///
/// The service starts a new build and answers with its operation.
#[derive(Debug, Clone)]
pub struct RetryBuild {
    build_id: String,
    operation: Operation,
}

impl RetryBuild {
    pub fn new(build_id: impl Into<String>) -> Self {
        Self {
            build_id: build_id.into(),
            operation: Operation::default(),
        }
    }

    pub fn build_id(&self) -> &str {
        &self.build_id
    }
}

impl ApiRequest for RetryBuild {
    type Output = Operation;

    fn name(&self) -> &'static str {
        "retry"
    }

    fn build_request(&self, endpoint: &str, project_id: &str) -> Result<HttpRequest> {
        let url = format!("{}:retry", build_url(endpoint, project_id, &self.build_id));
        Ok(HttpRequest::new(HttpMethod::Post, url))
    }

    fn parse_response(&mut self, body: &[u8]) -> Result<()> {
        self.operation = decode(body)?;
        Ok(())
    }

    fn response(&self) -> &Operation {
        &self.operation
    }

    fn into_response(self) -> Operation {
        self.operation
    }
}
