//! The swappable HTTP execution layer.
//!
//! # Design
//! [`Transport`] takes an [`HttpRequest`] and returns the response with its
//! body fully read, so nothing stays open once `execute` returns. 4xx and
//! 5xx answers are data, not errors; the dispatcher decides what a status
//! means. Closures implement the trait, which keeps test doubles short.

use std::time::Duration;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP round-trip.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync,
{
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self(request)
    }
}

/// Blocking transport on a shared [`ureq::Agent`].
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::from_agent(
            ureq::Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent(),
        )
    }
}

impl UreqTransport {
    /// A transport that gives up on any call taking longer than `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::from_agent(
            ureq::Agent::config_builder()
                .http_status_as_error(false)
                .timeout_global(Some(timeout))
                .build()
                .new_agent(),
        )
    }

    /// Wrap a caller-configured agent. The agent must be built with
    /// `http_status_as_error(false)` for service errors to be decoded.
    pub fn from_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let result = match request.method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name, value);
                }
                builder.call()
            }
            HttpMethod::Post => {
                let mut builder = self.agent.post(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name, value);
                }
                match &request.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };
        let mut response = result.map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_transports() {
        let transport = |req: &HttpRequest| -> Result<HttpResponse, TransportError> {
            Ok(HttpResponse::new(200, req.url.clone()))
        };
        let req = HttpRequest::new(HttpMethod::Get, "http://localhost/echo");
        let res = transport.execute(&req).unwrap();
        assert_eq!(res.body, b"http://localhost/echo");
    }

    #[test]
    fn unreachable_host_is_request_error() {
        let transport = UreqTransport::with_timeout(Duration::from_secs(2));
        // Port 9 (discard) on localhost is closed in test environments.
        let req = HttpRequest::new(HttpMethod::Get, "http://127.0.0.1:9/v1/projects/p/builds");
        let err = transport.execute(&req).unwrap_err();
        assert!(matches!(err, TransportError::Request(_)));
    }
}
