//! Get: fetch one build by id.

use crate::config::BuildConfig;
use crate::error::Result;
use crate::http::{HttpMethod, HttpRequest};
use crate::requests::{build_url, decode, ApiRequest};

/// `GET /v1/projects/{project}/builds/{id}`
#[derive(Debug, Clone)]
pub struct GetBuild {
    build_id: String,
    build: BuildConfig,
}

impl GetBuild {
    pub fn new(build_id: impl Into<String>) -> Self {
        Self {
            build_id: build_id.into(),
            build: BuildConfig::default(),
        }
    }

    pub fn build_id(&self) -> &str {
        &self.build_id
    }
}

impl ApiRequest for GetBuild {
    type Output = BuildConfig;

    fn name(&self) -> &'static str {
        "get"
    }

    fn build_request(&self, endpoint: &str, project_id: &str) -> Result<HttpRequest> {
        Ok(HttpRequest::new(
            HttpMethod::Get,
            build_url(endpoint, project_id, &self.build_id),
        ))
    }

    fn parse_response(&mut self, body: &[u8]) -> Result<()> {
        self.build = decode(body)?;
        Ok(())
    }

    fn response(&self) -> &BuildConfig {
        &self.build
    }

    fn into_response(self) -> BuildConfig {
        self.build
    }
}
