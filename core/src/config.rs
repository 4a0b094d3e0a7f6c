//! Build configuration model.
//!
//! # Design
//! These types mirror the Cloud Build v1 `Build` resource. Field names are the
//! API's camelCase names in both JSON and YAML, so a `cloudbuild.yaml` file
//! and a request body share one schema. Every field is optional on the wire:
//! `None`, empty vectors and empty maps are skipped when serializing and
//! default when absent.
//!
//! Fields documented as *output only* are populated by the service. A fresh
//! [`BuildConfig`] leaves them empty; after Create or Get they are
//! authoritative.
//!
//! No semantic validation happens here. A [`Source`] naming both a storage
//! and a repository source, or a [`RepoSource`] naming both a branch and a
//! tag, is passed to the service as written.

use std::collections::BTreeMap;
use std::io::Read;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};

/// A build: what to run and, once submitted, how it went.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<BuildStep>,
    /// Duration string such as `"600s"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs_bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<BuildOptions>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub substitutions: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<Secret>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Artifacts>,

    /// Output only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Output only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Output only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BuildStatus>,
    /// Output only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_detail: Option<String>,
    /// Output only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Results>,
    /// Output only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    /// Output only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// Output only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_time: Option<DateTime<Utc>>,
    /// Output only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_provenance: Option<SourceProvenance>,
    /// Output only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_trigger_id: Option<String>,
    /// Output only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_url: Option<String>,
    /// Output only. Keyed by phase, e.g. `BUILD` or `FETCHSOURCE`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub timing: BTreeMap<String, TimeSpan>,
}

impl BuildConfig {
    /// An empty configuration with no output-only fields set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace this configuration with the YAML document read from `reader`.
    ///
    /// On error `self` is left untouched.
    pub fn load_yaml<R: Read>(&mut self, mut reader: R) -> Result<()> {
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;
        *self = Self::from_yaml_str(&raw)?;
        Ok(())
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// The JSON wire encoding sent by Create.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(ApiError::Encoding)
    }

    /// True once any output-only field has been populated by the service.
    pub fn is_submitted(&self) -> bool {
        self.id.is_some()
            || self.project_id.is_some()
            || self.status.is_some()
            || self.status_detail.is_some()
            || self.results.is_some()
            || self.create_time.is_some()
            || self.start_time.is_some()
            || self.finish_time.is_some()
            || self.source_provenance.is_some()
            || self.build_trigger_id.is_some()
            || self.log_url.is_some()
            || !self.timing.is_empty()
    }
}

/// Build state reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildStatus {
    Pending,
    Queued,
    Working,
    Success,
    Failure,
    InternalError,
    Timeout,
    Cancelled,
    Expired,
    #[serde(other)]
    StatusUnknown,
}

impl BuildStatus {
    /// Whether the build has stopped and its status will not change again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BuildStatus::Success
                | BuildStatus::Failure
                | BuildStatus::InternalError
                | BuildStatus::Timeout
                | BuildStatus::Cancelled
                | BuildStatus::Expired
        )
    }
}

/// Where the build's source comes from. Exactly one member is expected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Source {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_source: Option<StorageSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_source: Option<RepoSource>,
}

/// An archive object in Cloud Storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<String>,
}

/// A Cloud Source Repositories location. One of `branch_name`, `tag_name`
/// or `commit_sha` selects the revision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepoSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
}

/// One container invocation within a build.
///
/// `wait_for` lists step ids that must finish first. The service runs the
/// resulting graph; the client never inspects it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildStep {
    /// Container image, e.g. `gcr.io/cloud-builders/docker`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// `KEY=VALUE` pairs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub wait_for: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub secret_env: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Output only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimeSpan>,
    /// Output only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_timing: Option<TimeSpan>,
    /// Output only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BuildStatus>,
}

impl BuildStep {
    /// A step running `image` with `args`.
    pub fn new<I, S>(image: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: Some(image.into()),
            args: args.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// A volume mounted into step containers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Volume {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Output only. Artifacts produced by a finished build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Results {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<BuiltImage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub build_step_images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_manifest: Option<String>,
    /// int64 on the wire, which the service encodes as a string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_artifacts: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub build_step_outputs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_timing: Option<TimeSpan>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuiltImage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_timing: Option<TimeSpan>,
}

/// Output only. The exact source the service resolved and built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceProvenance {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_storage_source: Option<StorageSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_repo_source: Option<RepoSource>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub file_hashes: BTreeMap<String, FileHashes>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileHashes {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub file_hash: Vec<Hash>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hash {
    /// `SHA256` or `MD5`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Build-wide execution options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildOptions {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub source_provenance_hash: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_verify_option: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_size_gb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substitution_option: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_streaming_option: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_pool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub secret_env: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
}

/// KMS-encrypted values exposed to steps through `secretEnv`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Secret {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kms_key_name: Option<String>,
    /// Env var name to base64 ciphertext.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub secret_env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Artifacts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objects: Option<ArtifactObjects>,
}

/// Non-image artifacts uploaded to `location` when the build succeeds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactObjects {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
    /// Output only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimeSpan>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeSpan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLOUDBUILD_YAML: &str = r#"
steps:
  - name: gcr.io/cloud-builders/docker
    id: build
    args: ["build", "-t", "gcr.io/$PROJECT_ID/app:$SHORT_SHA", "."]
  - name: gcr.io/cloud-builders/docker
    id: push
    waitFor: ["build"]
    args: ["push", "gcr.io/$PROJECT_ID/app:$SHORT_SHA"]
    secretEnv: ["TOKEN"]
timeout: 1200s
logsBucket: gs://logs
substitutions:
  _REGION: us-central1
tags: [ci, app]
images:
  - gcr.io/$PROJECT_ID/app:$SHORT_SHA
options:
  machineType: E2_HIGHCPU_8
  env: ["GOFLAGS=-mod=vendor"]
secrets:
  - kmsKeyName: projects/p/locations/global/keyRings/k/cryptoKeys/c
    secretEnv:
      TOKEN: c2VjcmV0
artifacts:
  objects:
    location: gs://artifacts/
    paths: ["bin/*"]
"#;

    #[test]
    fn new_config_serializes_empty() {
        let conf = BuildConfig::new();
        assert!(!conf.is_submitted());
        assert_eq!(conf.to_json().unwrap(), "{}");
    }

    #[test]
    fn load_yaml_populates_fields() {
        let mut conf = BuildConfig::new();
        conf.load_yaml(CLOUDBUILD_YAML.as_bytes()).unwrap();

        assert_eq!(conf.steps.len(), 2);
        assert_eq!(conf.steps[0].name.as_deref(), Some("gcr.io/cloud-builders/docker"));
        assert_eq!(conf.steps[1].wait_for, vec!["build"]);
        assert_eq!(conf.steps[1].secret_env, vec!["TOKEN"]);
        assert_eq!(conf.timeout.as_deref(), Some("1200s"));
        assert_eq!(conf.substitutions["_REGION"], "us-central1");
        assert_eq!(conf.tags, vec!["ci", "app"]);
        assert_eq!(
            conf.options.as_ref().and_then(|o| o.machine_type.as_deref()),
            Some("E2_HIGHCPU_8")
        );
        assert_eq!(conf.secrets[0].secret_env["TOKEN"], "c2VjcmV0");
        assert_eq!(
            conf.artifacts.as_ref().and_then(|a| a.objects.as_ref()).map(|o| o.paths.clone()),
            Some(vec!["bin/*".to_string()])
        );
        assert!(!conf.is_submitted());
    }

    #[test]
    fn yaml_to_json_preserves_populated_fields() {
        let conf = BuildConfig::from_yaml_str(CLOUDBUILD_YAML).unwrap();
        let json: serde_json::Value = serde_json::from_str(&conf.to_json().unwrap()).unwrap();

        assert_eq!(json["steps"][1]["waitFor"][0], "build");
        assert_eq!(json["logsBucket"], "gs://logs");
        assert_eq!(json["options"]["machineType"], "E2_HIGHCPU_8");
        assert_eq!(json["secrets"][0]["kmsKeyName"], "projects/p/locations/global/keyRings/k/cryptoKeys/c");
        assert_eq!(json["artifacts"]["objects"]["location"], "gs://artifacts/");

        let back: BuildConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, conf);
    }

    #[test]
    fn load_yaml_rejects_malformed_input_and_keeps_state() {
        let mut conf = BuildConfig::from_yaml_str("tags: [keep]").unwrap();
        let err = conf.load_yaml("steps: [unclosed".as_bytes()).unwrap_err();
        assert!(matches!(err, ApiError::ConfigDecode(_)));
        assert_eq!(conf.tags, vec!["keep"]);
    }

    #[test]
    fn load_yaml_reports_unreadable_stream() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk gone"))
            }
        }

        let err = BuildConfig::new().load_yaml(Broken).unwrap_err();
        assert!(matches!(err, ApiError::ConfigRead(_)));
    }

    #[test]
    fn conflicting_source_is_passed_through() {
        let conf = BuildConfig::from_yaml_str(
            "source:\n  storageSource: {bucket: b, object: o.tgz}\n  repoSource: {repoName: r, branchName: main, tagName: v1}\n",
        )
        .unwrap();
        let source = conf.source.unwrap();
        assert!(source.storage_source.is_some());
        let repo = source.repo_source.unwrap();
        assert_eq!(repo.branch_name.as_deref(), Some("main"));
        assert_eq!(repo.tag_name.as_deref(), Some("v1"));
    }

    #[test]
    fn output_fields_decode_from_service_json() {
        let conf: BuildConfig = serde_json::from_str(
            r#"{
                "id": "b-1",
                "projectId": "p",
                "status": "WORKING",
                "createTime": "2024-05-01T10:00:00Z",
                "timing": {"BUILD": {"startTime": "2024-05-01T10:00:05Z"}},
                "results": {"images": [{"name": "gcr.io/p/app", "digest": "sha256:abc"}], "numArtifacts": "2"},
                "sourceProvenance": {"fileHashes": {"gs://b/o.tgz": {"fileHash": [{"type": "SHA256", "value": "q83v"}]}}}
            }"#,
        )
        .unwrap();

        assert!(conf.is_submitted());
        assert_eq!(conf.status, Some(BuildStatus::Working));
        assert_eq!(conf.create_time.unwrap().to_rfc3339(), "2024-05-01T10:00:00+00:00");
        assert!(conf.timing["BUILD"].start_time.is_some());
        assert_eq!(conf.results.unwrap().images[0].digest.as_deref(), Some("sha256:abc"));
        let hashes = &conf.source_provenance.unwrap().file_hashes["gs://b/o.tgz"];
        assert_eq!(hashes.file_hash[0].kind.as_deref(), Some("SHA256"));
    }

    #[test]
    fn unknown_status_maps_to_status_unknown() {
        let status: BuildStatus = serde_json::from_str(r#""SOMETHING_NEW""#).unwrap();
        assert_eq!(status, BuildStatus::StatusUnknown);
        assert!(!status.is_terminal());
        assert!(BuildStatus::Cancelled.is_terminal());
        assert_eq!(serde_json::to_string(&BuildStatus::InternalError).unwrap(), r#""INTERNAL_ERROR""#);
    }

    #[test]
    fn status_unknown_keeps_its_wire_name() {
        let status: BuildStatus = serde_json::from_str(r#""STATUS_UNKNOWN""#).unwrap();
        assert_eq!(status, BuildStatus::StatusUnknown);
        assert_eq!(serde_json::to_string(&status).unwrap(), r#""STATUS_UNKNOWN""#);
        let expired: BuildStatus = serde_json::from_str(r#""EXPIRED""#).unwrap();
        assert_eq!(expired, BuildStatus::Expired);
    }

    #[test]
    fn step_constructor_sets_image_and_args() {
        let step = BuildStep::new("gcr.io/example/build", ["build", "."]);
        assert_eq!(
            serde_json::to_value(&step).unwrap(),
            serde_json::json!({"name": "gcr.io/example/build", "args": ["build", "."]})
        );
    }
}
