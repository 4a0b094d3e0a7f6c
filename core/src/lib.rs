//! Blocking client for the Cloud Build v1 REST API.
//!
//! # Overview
//! Builds bearer-authenticated requests for the build lifecycle (create,
//! get, cancel, retry, list), encodes a [`BuildConfig`] to the JSON the
//! service expects, and decodes responses into typed results.
//!
//! # Design
//! - Each call is an encoder implementing [`ApiRequest`]: it builds an
//!   [`HttpRequest`] and parses the response body, without doing I/O.
//! - [`Client`] runs encoders through one send cycle over a [`Transport`].
//!   The default transport is [`UreqTransport`]; tests swap in closures.
//! - [`Client`] is configured at construction with [`ClientOption`]s.
//! - Follow-ups derived from an [`Operation`] (`get_progress`, `cancel`,
//!   `retry`) refuse to run when the operation carries an error.
//!
//! ```no_run
//! use cloudbuild_core::{options, BuildConfig, Client};
//!
//! # fn main() -> cloudbuild_core::Result<()> {
//! let mut config = BuildConfig::new();
//! config.load_yaml(std::fs::File::open("cloudbuild.yaml")?)?;
//!
//! let client = Client::new("my-project").option(options::with_access_token("ya29..."));
//! let op = client.create(config)?;
//! let build = client.execute(op.get_progress()?)?;
//! println!("{:?}", build.status);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod operation;
pub mod options;
pub mod requests;
pub mod transport;

pub use client::Client;
pub use config::{BuildConfig, BuildStatus, BuildStep, RepoSource, Source, StorageSource};
pub use error::{ApiError, Result, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use operation::{BuildList, Operation, OperationMetadata, Status};
pub use options::ClientOption;
pub use requests::{ApiRequest, CancelBuild, CreateBuild, GetBuild, ListBuilds, RetryBuild, DEFAULT_ENDPOINT};
pub use transport::{Transport, UreqTransport};
