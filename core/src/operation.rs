//! Long-running operation handles and list pages.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::BuildConfig;
use crate::error::{ApiError, Result};
use crate::requests::{CancelBuild, GetBuild, RetryBuild};

/// Handle returned by Create and Retry.
///
/// An operation that carries an [`Status`] error is terminal: deriving a
/// Get, Cancel or Retry from it fails with [`ApiError::Guard`] before any
/// request is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Operation {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<OperationMetadata>,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Status>,
    /// Opaque success payload; for builds this is the finished `Build`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
}

/// `BuildOperationMetadata`: the build this operation tracks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationMetadata {
    #[serde(rename = "@type", skip_serializing_if = "String::is_empty")]
    pub type_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildConfig>,
}

/// Structured error payload (`google.rpc.Status`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Status {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub status: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<serde_json::Value>,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.status.is_empty() {
            write!(f, "code {}: {}", self.code, self.message)
        } else {
            write!(f, "{} ({}): {}", self.status, self.code, self.message)
        }
    }
}

/// Error envelope the service wraps around a [`Status`] on non-2xx replies.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: Status,
}

impl Operation {
    /// The operation's error, if the service reported one.
    pub fn has_error(&self) -> Option<&Status> {
        self.error.as_ref()
    }

    /// Turn an operation-level error into [`ApiError::Operation`].
    pub fn check(&self) -> Result<()> {
        match &self.error {
            Some(status) => Err(ApiError::Operation {
                name: self.name.clone(),
                status: status.clone(),
            }),
            None => Ok(()),
        }
    }

    /// The tracked build, as embedded in the metadata.
    pub fn build(&self) -> Option<&BuildConfig> {
        self.metadata.as_ref().and_then(|m| m.build.as_ref())
    }

    pub fn build_id(&self) -> Option<&str> {
        self.build().and_then(|b| b.id.as_deref())
    }

    /// A Get for the tracked build.
    pub fn get_progress(&self) -> Result<GetBuild> {
        self.follow_up_id().map(GetBuild::new)
    }

    /// A Cancel for the tracked build.
    pub fn cancel(&self) -> Result<CancelBuild> {
        self.follow_up_id().map(CancelBuild::new)
    }

    /// A Retry of the tracked build.
    pub fn retry(&self) -> Result<RetryBuild> {
        self.follow_up_id().map(RetryBuild::new)
    }

    fn follow_up_id(&self) -> Result<&str> {
        if let Some(status) = &self.error {
            return Err(ApiError::Guard {
                name: self.name.clone(),
                status: status.clone(),
            });
        }
        self.build_id()
            .ok_or_else(|| ApiError::MissingBuildId(self.name.clone()))
    }
}

/// One page of builds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildList {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub builds: Vec<BuildConfig>,
    /// Pass to the next List call; absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;
    use crate::ApiRequest;

    const ENDPOINT: &str = "https://cloudbuild.googleapis.com";

    fn running() -> Operation {
        serde_json::from_str(
            r#"{
                "name": "operations/build/p/b-42",
                "metadata": {
                    "@type": "type.googleapis.com/google.devtools.cloudbuild.v1.BuildOperationMetadata",
                    "build": {"id": "b-42", "status": "QUEUED"}
                },
                "done": false
            }"#,
        )
        .unwrap()
    }

    fn failed() -> Operation {
        let mut op = running();
        op.done = true;
        op.error = Some(Status {
            code: 13,
            message: "internal".to_string(),
            status: "INTERNAL".to_string(),
            details: Vec::new(),
        });
        op
    }

    #[test]
    fn decodes_operation_metadata() {
        let op = running();
        assert_eq!(op.build_id(), Some("b-42"));
        assert!(op.metadata.as_ref().unwrap().type_url.ends_with("BuildOperationMetadata"));
        assert!(op.has_error().is_none());
    }

    #[test]
    fn derivations_use_metadata_build_id() {
        let op = running();

        let get = op.get_progress().unwrap().build_request(ENDPOINT, "p").unwrap();
        assert_eq!(get.method, HttpMethod::Get);
        assert_eq!(get.url, "https://cloudbuild.googleapis.com/v1/projects/p/builds/b-42");

        let cancel = op.cancel().unwrap().build_request(ENDPOINT, "p").unwrap();
        assert_eq!(cancel.url, "https://cloudbuild.googleapis.com/v1/projects/p/builds/b-42:cancel");

        let retry = op.retry().unwrap().build_request(ENDPOINT, "p").unwrap();
        assert_eq!(retry.url, "https://cloudbuild.googleapis.com/v1/projects/p/builds/b-42:retry");
    }

    #[test]
    fn derivations_refuse_failed_operation() {
        let op = failed();
        assert!(op.get_progress().unwrap_err().is_guard());
        assert!(op.cancel().unwrap_err().is_guard());
        assert!(op.retry().unwrap_err().is_guard());
    }

    #[test]
    fn derivation_without_build_id_fails() {
        let op = Operation {
            name: "operations/x".to_string(),
            ..Operation::default()
        };
        let err = op.cancel().unwrap_err();
        assert!(matches!(err, ApiError::MissingBuildId(name) if name == "operations/x"));
    }

    #[test]
    fn check_reports_operation_error() {
        assert!(running().check().is_ok());
        let err = failed().check().unwrap_err();
        assert!(matches!(err, ApiError::Operation { ref status, .. } if status.code == 13));
        assert_eq!(
            err.to_string(),
            "operation operations/build/p/b-42 failed: INTERNAL (13): internal"
        );
    }

    #[test]
    fn build_list_token_is_optional() {
        let list: BuildList = serde_json::from_str(r#"{"builds":[{"id":"a"},{"id":"b"}]}"#).unwrap();
        assert_eq!(list.builds.len(), 2);
        assert!(list.next_page_token.is_none());

        let empty: BuildList = serde_json::from_str("{}").unwrap();
        assert!(empty.builds.is_empty());
    }
}
