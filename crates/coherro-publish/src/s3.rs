// SPDX-FileCopyrightText: 2026 Coherro Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! S3-compatible object store: `PUT` requests over reqwest, signed with `aws-sigv4`.

use std::time::SystemTime;

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sigv4::http_request::{
    PayloadChecksumKind, PercentEncodingMode, SignableBody, SignableRequest, SigningSettings,
    UriPathNormalizationMode, sign,
};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use coherro_config::model::ObjectStoreConfig;
use coherro_core::types::{AdapterType, HealthStatus};
use coherro_core::{CoherroError, ObjectStore, PluginAdapter};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

const DEFAULT_REGION: &str = "us-east-1";

/// Resolved connection settings for an S3 bucket.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    /// Custom endpoint (MinIO, LocalStack); switches to path-style addressing.
    pub endpoint: Option<String>,
}

impl S3Settings {
    /// Resolve settings from configuration, falling back to the `AWS_*` variables.
    ///
    /// Returns `None` when bucket or credentials are missing, which means
    /// artifacts are kept locally.
    pub fn resolve(config: &ObjectStoreConfig) -> Option<Self> {
        Self::resolve_with(config, |name| std::env::var(name).ok())
    }

    fn resolve_with(
        config: &ObjectStoreConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Option<Self> {
        let pick = |value: &Option<String>, var: &str| {
            value
                .clone()
                .or_else(|| env(var))
                .filter(|v| !v.trim().is_empty())
        };

        Some(Self {
            bucket: pick(&config.bucket, "AWS_S3_BUCKET")?,
            region: pick(&config.region, "AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.into()),
            access_key_id: pick(&config.access_key_id, "AWS_ACCESS_KEY_ID")?,
            secret_access_key: SecretString::from(pick(
                &config.secret_access_key,
                "AWS_SECRET_ACCESS_KEY",
            )?),
            endpoint: config
                .endpoint
                .as_ref()
                .map(|e| e.trim_end_matches('/').to_string()),
        })
    }
}

/// Percent-encode an object key for use in a request path, keeping `/`.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

fn signing_error(e: impl std::error::Error + Send + Sync + 'static) -> CoherroError {
    CoherroError::Publish {
        message: format!("failed to sign upload request: {e}"),
        source: Some(Box::new(e)),
    }
}

/// Settings for S3: payload hash sent as `x-amz-content-sha256`, keys
/// encoded once and never normalized.
fn s3_signing_settings() -> SigningSettings {
    let mut settings = SigningSettings::default();
    settings.payload_checksum_kind = PayloadChecksumKind::XAmzSha256;
    settings.percent_encoding_mode = PercentEncodingMode::Single;
    settings.uri_path_normalization_mode = UriPathNormalizationMode::Disabled;
    settings
}

/// Uploads objects with `PUT` requests signed by SigV4.
pub struct S3ObjectStore {
    client: reqwest::Client,
    settings: S3Settings,
    identity: Identity,
}

impl S3ObjectStore {
    pub fn new(settings: S3Settings) -> Result<Self, CoherroError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| CoherroError::Publish {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        let identity = Credentials::new(
            settings.access_key_id.clone(),
            settings.secret_access_key.expose_secret().to_string(),
            None,
            None,
            "coherro-config",
        )
        .into();
        Ok(Self {
            client,
            settings,
            identity,
        })
    }

    /// Base URL (without key) for the bucket: path-style with a custom endpoint.
    fn base(&self) -> String {
        let s = &self.settings;
        match &s.endpoint {
            Some(endpoint) => format!("{endpoint}/{}", s.bucket),
            None => format!("https://{}.s3.{}.amazonaws.com", s.bucket, s.region),
        }
    }

    /// Signing headers to add to a `PUT` of `body` to `url`.
    fn sign_put(
        &self,
        url: &str,
        content_type: &str,
        body: &[u8],
    ) -> Result<Vec<(String, String)>, CoherroError> {
        let params: aws_sigv4::http_request::SigningParams<'_> = v4::SigningParams::builder()
            .identity(&self.identity)
            .region(&self.settings.region)
            .name("s3")
            .time(SystemTime::now())
            .settings(s3_signing_settings())
            .build()
            .map_err(signing_error)?
            .into();
        let request = SignableRequest::new(
            "PUT",
            url,
            [("content-type", content_type)].into_iter(),
            SignableBody::Bytes(body),
        )
        .map_err(signing_error)?;
        let (instructions, _signature) = sign(request, &params)
            .map_err(signing_error)?
            .into_parts();
        Ok(instructions
            .headers()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect())
    }
}

#[async_trait]
impl PluginAdapter for S3ObjectStore {
    fn name(&self) -> &str {
        "s3"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ObjectStore
    }

    async fn health_check(&self) -> Result<HealthStatus, CoherroError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CoherroError> {
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), CoherroError> {
        let url = self.object_url(key);
        let signing_headers = self.sign_put(&url, content_type, &bytes)?;

        debug!(key, size_bytes = bytes.len(), "uploading object");
        let mut request = self
            .client
            .put(&url)
            .header("content-type", content_type);
        for (name, value) in signing_headers {
            request = request.header(name, value);
        }
        let response = request
            .body(bytes)
            .send()
            .await
            .map_err(|e| CoherroError::Publish {
                message: format!("upload request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoherroError::Publish {
                message: format!("object store returned {status}: {body}"),
                source: None,
            });
        }
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base(), encode_key(key))
    }
}
