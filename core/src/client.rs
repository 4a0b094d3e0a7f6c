//! The dispatcher: one method per Cloud Build call over a shared send cycle.
//!
//! # Design
//! `Client` owns the project id, endpoint, transport and bearer token. Every
//! public call builds the matching encoder from [`crate::requests`] and runs
//! it through [`Client::execute`]:
//!
//! 1. the encoder builds the request,
//! 2. the token is attached as `Authorization: Bearer <token>`,
//! 3. the transport executes it and reads the whole body,
//! 4. a non-2xx status becomes [`ApiError::Status`],
//! 5. the encoder decodes the body into its result.
//!
//! Each failure surfaces as the [`ApiError`] variant for its stage. There is
//! no retry and no timeout beyond what the transport enforces.

use std::fmt;

use tracing::{debug, instrument, warn};

use crate::config::BuildConfig;
use crate::error::{ApiError, Result};
use crate::operation::{BuildList, ErrorEnvelope, Operation};
use crate::options::ClientOption;
use crate::requests::{
    ApiRequest, CancelBuild, CreateBuild, GetBuild, ListBuilds, RetryBuild, DEFAULT_ENDPOINT,
};
use crate::transport::{Transport, UreqTransport};

/// Blocking Cloud Build v1 client for one project.
///
/// Configure it with [`Client::option`] / [`Client::options`] right after
/// [`Client::new`]; the settings are fixed once calls start.
pub struct Client {
    project_id: String,
    pub(crate) endpoint: String,
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) access_token: Option<String>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("project_id", &self.project_id)
            .field("endpoint", &self.endpoint)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl Client {
    /// A client for `project_id` on the production endpoint, using
    /// [`UreqTransport`] and no token.
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            transport: Box::new(UreqTransport::default()),
            access_token: None,
        }
    }

    /// Apply one option.
    pub fn option<O: ClientOption + 'static>(self, option: O) -> Self {
        self.options([Box::new(option) as Box<dyn ClientOption>])
    }

    /// Apply options in order.
    pub fn options<I>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn ClientOption>>,
    {
        for option in options {
            option.apply(&mut self);
        }
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Submit `config` as a new build.
    #[instrument(skip_all, fields(project = %self.project_id))]
    pub fn create(&self, config: BuildConfig) -> Result<Operation> {
        self.execute(CreateBuild::new(config))
    }

    /// Fetch the current state of a build.
    #[instrument(skip(self), fields(project = %self.project_id))]
    pub fn get(&self, build_id: &str) -> Result<BuildConfig> {
        self.execute(GetBuild::new(build_id))
    }

    /// Cancel a running build and return it.
    #[instrument(skip(self), fields(project = %self.project_id))]
    pub fn cancel(&self, build_id: &str) -> Result<BuildConfig> {
        self.execute(CancelBuild::new(build_id))
    }

    /// Start a new build from an existing one.
    #[instrument(skip(self), fields(project = %self.project_id))]
    pub fn retry(&self, build_id: &str) -> Result<Operation> {
        self.execute(RetryBuild::new(build_id))
    }

    /// Fetch one page of the project's builds. `page_size == 0` and empty
    /// strings leave the corresponding parameter to the service default.
    #[instrument(skip(self), fields(project = %self.project_id))]
    pub fn list(&self, page_size: u32, page_token: &str, filter: &str) -> Result<BuildList> {
        self.execute(ListBuilds::new(page_size, page_token, filter))
    }

    /// Run any encoder through the send cycle and return its result.
    ///
    /// Used by the methods above, and for requests derived from an
    /// [`Operation`] such as `client.execute(op.cancel()?)`.
    pub fn execute<R: ApiRequest>(&self, mut request: R) -> Result<R::Output> {
        self.send(&mut request)?;
        Ok(request.into_response())
    }

    fn send<R: ApiRequest>(&self, request: &mut R) -> Result<()> {
        let mut http = request.build_request(&self.endpoint, &self.project_id)?;
        if let Some(token) = &self.access_token {
            http.set_header("authorization", format!("Bearer {token}"));
        }
        debug!(call = request.name(), method = %http.method, url = %http.url, "sending request");

        let response = self.transport.execute(&http)?;
        debug!(call = request.name(), status = response.status, bytes = response.body.len(), "received response");

        if !response.is_success() {
            let error = serde_json::from_slice::<ErrorEnvelope>(&response.body)
                .ok()
                .map(|envelope| envelope.error);
            warn!(call = request.name(), status = response.status, "request rejected");
            return Err(ApiError::Status {
                status: response.status,
                error,
            });
        }

        request.parse_response(&response.body)
    }
}
