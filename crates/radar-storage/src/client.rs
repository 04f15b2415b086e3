//! Client for a Supabase-style object store.
//!
//! Uploads go to `{base}/storage/v1/object/{bucket}/{prefix}/{uuid}.{ext}` and
//! are served back from the matching `/object/public/` path. Each upload gets
//! a fresh random object name, so re-uploading the same file never collides.

use std::path::Path;
use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::StorageError;
use crate::retry::retry_with_backoff;

/// Connection settings for [`StorageClient`].
#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub base_url: String,
    pub service_key: String,
    pub bucket: String,
    /// Folder inside the bucket; empty for the bucket root.
    pub prefix: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Reads a file from disk, keeping only its final path component as the name.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be read.
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self { file_name, bytes })
    }

    /// Lowercased extension of the file name, or `None` if it has none.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .filter(|e| !e.is_empty())
    }
}

/// MIME type sent with an upload, derived from the file extension.
#[must_use]
pub fn content_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

pub struct StorageClient {
    client: Client,
    base_url: Url,
    service_key: String,
    bucket: String,
    prefix: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl StorageClient {
    /// Builds a client from settings.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`StorageError::InvalidUrl`] if `base_url` does not parse.
    pub fn new(settings: StorageSettings) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("radar/0.1 (partner-directory)")
            .build()?;

        // One trailing slash so `join` appends instead of replacing the last segment.
        let normalised = format!("{}/", settings.base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| StorageError::InvalidUrl {
            url: settings.base_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            service_key: settings.service_key,
            bucket: settings.bucket,
            prefix: settings.prefix.trim_matches('/').to_owned(),
            max_retries: settings.max_retries,
            backoff_base_ms: settings.backoff_base_ms,
        })
    }

    /// A fresh object path for `file`: `{prefix}/{uuid}.{ext}`.
    #[must_use]
    pub fn object_path(&self, file: &ImageFile) -> String {
        let ext = file.extension().unwrap_or_else(|| "bin".to_owned());
        let name = format!("{}.{ext}", uuid::Uuid::new_v4());
        if self.prefix.is_empty() {
            name
        } else {
            format!("{}/{name}", self.prefix)
        }
    }

    /// Public URL under which `object_path` is served.
    #[must_use]
    pub fn public_url(&self, object_path: &str) -> String {
        format!(
            "{}storage/v1/object/public/{}/{object_path}",
            self.base_url, self.bucket
        )
    }

    fn upload_url(&self, object_path: &str) -> Result<Url, StorageError> {
        let relative = format!("storage/v1/object/{}/{object_path}", self.bucket);
        self.base_url
            .join(&relative)
            .map_err(|e| StorageError::InvalidUrl {
                url: relative,
                reason: e.to_string(),
            })
    }

    /// Uploads `file` and returns its public URL.
    ///
    /// Transient failures are retried with back-off; the same object path is
    /// reused across attempts.
    ///
    /// # Errors
    ///
    /// - [`StorageError::EmptyFile`] if `file` has no bytes.
    /// - [`StorageError::Rejected`] if the store answers with a non-2xx status.
    /// - [`StorageError::Http`] on network failure.
    pub async fn upload(&self, file: &ImageFile) -> Result<String, StorageError> {
        if file.bytes.is_empty() {
            return Err(StorageError::EmptyFile(file.file_name.clone()));
        }

        let object_path = self.object_path(file);
        let url = self.upload_url(&object_path)?;
        let content_type = content_type_for(&file.extension().unwrap_or_default());

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.put_object(url.clone(), content_type, file.bytes.clone())
        })
        .await?;

        tracing::info!(
            object_path = %object_path,
            bytes = file.bytes.len(),
            content_type,
            "image uploaded"
        );
        Ok(self.public_url(&object_path))
    }

    async fn put_object(
        &self,
        url: Url,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<(), StorageError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().await.unwrap_or_default();
        Err(StorageError::Rejected {
            status: status.as_u16(),
            message: rejection_message(&text),
        })
    }
}

/// Pulls `message` (or `error`) out of a JSON error body, falling back to
/// the raw text.
fn rejection_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
        })
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}
