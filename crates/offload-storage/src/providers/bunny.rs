//! Bunny.net storage-zone provider.
//!
//! Each upload is one `PUT <storage_endpoint>/<zone>/<key>` carrying the
//! file bytes, authenticated with the zone's `AccessKey` header. Only 200
//! and 201 count as success. The client never retries.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use offload_core::config::offload::OffloadSettings;
use offload_core::error::{AppError, ErrorKind};
use offload_core::result::AppResult;
use offload_core::traits::storage::{RemoteStore, UploadReceipt};
use offload_core::types::remote_key::encode_key;

use crate::key::remote_key_for;
use crate::mime::content_type_for;

/// Maximum number of response body bytes echoed into an error message.
const ERROR_BODY_LIMIT: usize = 256;

/// Bunny.net storage-zone client.
#[derive(Debug, Clone)]
pub struct BunnyStore {
    client: reqwest::Client,
}

impl BunnyStore {
    /// Create a new client.
    pub fn new() -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("cdn-offload/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Internal, "Failed to build HTTP client", e)
            })?;
        Ok(Self { client })
    }

    /// The storage API URL an object is PUT to.
    pub fn object_url(settings: &OffloadSettings, remote_key: &str) -> String {
        format!(
            "{}/{}/{}",
            settings.storage_endpoint.trim_end_matches('/'),
            settings.storage_zone.trim_matches('/'),
            encode_key(remote_key.trim_start_matches('/'))
        )
    }
}

#[async_trait]
impl RemoteStore for BunnyStore {
    fn provider_type(&self) -> &str {
        "bunny"
    }

    fn remote_key(&self, settings: &OffloadSettings, file_path: &Path) -> AppResult<String> {
        remote_key_for(&settings.uploads_root, file_path)
    }

    async fn upload(
        &self,
        settings: &OffloadSettings,
        file_path: &Path,
        remote_key: &str,
    ) -> AppResult<UploadReceipt> {
        settings.require_complete()?;

        let file = fs::File::open(file_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::with_source(
                    ErrorKind::FileMissing,
                    format!("Local file missing: {}", file_path.display()),
                    e,
                )
            } else {
                AppError::with_source(
                    ErrorKind::TransferFailure,
                    format!("Failed to open {}", file_path.display()),
                    e,
                )
            }
        })?;
        let bytes = file
            .metadata()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::TransferFailure,
                    format!("Failed to stat {}", file_path.display()),
                    e,
                )
            })?
            .len();

        let url = Self::object_url(settings, remote_key);
        let content_type = content_type_for(file_path);
        debug!(
            url = %url,
            bytes = bytes,
            content_type = content_type,
            "Uploading file to Bunny storage"
        );

        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let response = self
            .client
            .put(&url)
            .timeout(Duration::from_secs(settings.transfer_timeout_seconds))
            .header("AccessKey", &settings.api_key)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, bytes)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    "timed out"
                } else {
                    "transport error"
                };
                AppError::with_source(
                    ErrorKind::TransferFailure,
                    format!("Upload of {remote_key} failed: {reason}"),
                    e,
                )
            })?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            warn!(status = %status, remote_key = %remote_key, "Bunny storage rejected upload");
            return Err(AppError::transfer(format!(
                "Upload of {remote_key} failed: HTTP {status}: {excerpt}"
            )));
        }

        let public_url = settings.public_url(remote_key);
        info!(remote_key = %remote_key, bytes = bytes, "Uploaded file to Bunny storage");
        Ok(UploadReceipt {
            remote_key: remote_key.to_string(),
            public_url,
            bytes,
        })
    }
}
