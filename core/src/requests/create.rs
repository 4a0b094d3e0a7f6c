//! Create: submit a build configuration.

use crate::config::BuildConfig;
use crate::error::Result;
use crate::http::{HttpMethod, HttpRequest};
use crate::operation::Operation;
use crate::requests::{builds_url, decode, ApiRequest};

/// `POST /v1/projects/{project}/builds` with the configuration as body.
#[derive(Debug, Clone)]
pub struct CreateBuild {
    config: BuildConfig,
    operation: Operation,
}

impl CreateBuild {
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            operation: Operation::default(),
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }
}

impl ApiRequest for CreateBuild {
    type Output = Operation;

    fn name(&self) -> &'static str {
        "create"
    }

    fn build_request(&self, endpoint: &str, project_id: &str) -> Result<HttpRequest> {
        let body = self.config.to_json()?;
        let mut req = HttpRequest::new(HttpMethod::Post, builds_url(endpoint, project_id));
        req.set_header("content-type", "application/json");
        req.body = Some(body);
        Ok(req)
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
