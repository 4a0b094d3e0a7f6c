//! Cancel: stop a running build.

use crate::config::BuildConfig;
use crate::error::Result;
use crate::http::{HttpMethod, HttpRequest};
use crate::requests::{build_url, decode, ApiRequest};

/// `POST /v1/projects/{project}/builds/{id}:cancel`
///
/// The service answers with the cancelled build.
#[derive(Debug, Clone)]
pub struct CancelBuild {
    build_id: String,
    build: BuildConfig,
}

impl CancelBuild {
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

impl ApiRequest for CancelBuild {
    type Output = BuildConfig;

    fn name(&self) -> &'static str {
        "cancel"
    }

    fn build_request(&self, endpoint: &str, project_id: &str) -> Result<HttpRequest> {
        let url = format!("{}:cancel", build_url(endpoint, project_id, &self.build_id));
        Ok(HttpRequest::new(HttpMethod::Post, url))
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
