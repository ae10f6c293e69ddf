//! Attachment resolution.
//!
//! Callers declare attachments as a remote URL, a local path, or raw bytes.
//! PDFs hosted on the configured asset host are streamed into a scoped
//! temporary file; images on the asset host are passed through by URL for
//! inline (content-id) embedding; everything else goes through unchanged.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use reqwest::Url;
use tempfile::{NamedTempFile, TempPath};
use tokio::io::AsyncWriteExt;

use crate::error::AppError;
use crate::models::AttachmentInput;

/// Where the attachment bytes live by the time the transport sees them.
#[derive(Debug)]
pub enum AttachmentPayload {
    /// Read from disk at send time. Used for local passthrough and for
    /// downloaded PDFs (whose temp file is owned by the caller).
    File { path: PathBuf },
    /// An asset-host image embedded by content-id; fetched by the transport
    /// while composing, never written to disk.
    Remote { url: String },
    /// In-memory content supplied directly by the caller.
    Bytes { content: Vec<u8> },
}

/// A resolved attachment ready for the transport.
///
/// `temp` is present only for downloaded files. Dropping it removes the
/// file, and the orchestrator takes it out of the struct before handing the
/// payload to the transport so the release action stays under its control
/// and runs exactly once per download.
#[derive(Debug)]
pub struct ResolvedAttachment {
    pub filename: String,
    pub content_type: String,
    pub payload: AttachmentPayload,
    pub temp: Option<TempPath>,
}

/// Resolves declared attachments against the asset host and temp storage.
#[derive(Clone)]
pub struct AttachmentFetcher {
    client: reqwest::Client,
    temp_dir: PathBuf,
    asset_host: String,
}

impl AttachmentFetcher {
    /// Creates a fetcher writing downloads under `temp_dir`.
    /// The directory is created up front.
    pub fn new(
        client: reqwest::Client,
        temp_dir: PathBuf,
        asset_host: impl Into<String>,
    ) -> Result<Self, AppError> {
        std::fs::create_dir_all(&temp_dir).map_err(|e| {
            AppError::InternalServerError(format!(
                "Failed to create temp directory {}: {}",
                temp_dir.display(),
                e
            ))
        })?;
        Ok(Self {
            client,
            temp_dir,
            asset_host: asset_host.into(),
        })
    }

    /// Resolves one declared attachment into a transport-ready payload.
    pub async fn resolve(&self, input: &AttachmentInput) -> Result<ResolvedAttachment, AppError> {
        if let Some(path) = input.path.as_deref() {
            if let Some(url) = self.asset_url(path) {
                if url.path().to_lowercase().ends_with(".pdf") {
                    return self.download(&url, input).await;
                }
                // Asset-host image: the URL goes through unchanged, tagged
                // for inline embedding. No local download.
                return Ok(ResolvedAttachment {
                    filename: input.filename.clone().unwrap_or_else(|| "image".into()),
                    content_type: input
                        .content_type
                        .clone()
                        .unwrap_or_else(|| "image/jpeg".into()),
                    payload: AttachmentPayload::Remote {
                        url: path.to_string(),
                    },
                    temp: None,
                });
            }

            // Local file passthrough.
            return Ok(ResolvedAttachment {
                filename: input
                    .filename
                    .clone()
                    .or_else(|| basename(Path::new(path)))
                    .unwrap_or_else(|| "attachment".into()),
                content_type: input
                    .content_type
                    .clone()
                    .unwrap_or_else(|| "application/octet-stream".into()),
                payload: AttachmentPayload::File {
                    path: PathBuf::from(path),
                },
                temp: None,
            });
        }

        if let Some(content) = &input.content {
            return Ok(ResolvedAttachment {
                filename: input.filename.clone().unwrap_or_else(|| "attachment".into()),
                content_type: input
                    .content_type
                    .clone()
                    .unwrap_or_else(|| "application/octet-stream".into()),
                payload: AttachmentPayload::Bytes {
                    content: content.clone(),
                },
                temp: None,
            });
        }

        Err(AppError::DownloadError(
            "Attachment has neither a path nor content".into(),
        ))
    }

    /// Parses `path` as an HTTP(S) URL on the configured asset host.
    fn asset_url(&self, path: &str) -> Option<Url> {
        let url = Url::parse(path).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        if url.host_str() != Some(self.asset_host.as_str()) {
            return None;
        }
        Some(url)
    }

    /// Streams a remote file into a fresh temp file.
    ///
    /// On any failure the partially written file is removed (the `TempPath`
    /// has not been handed out yet, so dropping it cleans up).
    async fn download(
        &self,
        url: &Url,
        input: &AttachmentInput,
    ) -> Result<ResolvedAttachment, AppError> {
        log::debug!("Downloading attachment from {}", url);

        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(AppError::DownloadError(format!(
                "Failed to download file: {}",
                response.status()
            )));
        }

        let (file, temp_path) = NamedTempFile::new_in(&self.temp_dir)
            .map_err(|e| AppError::DownloadError(format!("Failed to create temp file: {}", e)))?
            .into_parts();
        let mut file = tokio::fs::File::from_std(file);

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|e| AppError::DownloadError(format!("Failed to write temp file: {}", e)))?;
        }
        file.flush()
            .await
            .map_err(|e| AppError::DownloadError(format!("Failed to flush temp file: {}", e)))?;
        drop(file);

        let filename = input
            .filename
            .clone()
            .or_else(|| url_basename(url))
            .unwrap_or_else(|| "document.pdf".into());

        Ok(ResolvedAttachment {
            filename,
            content_type: input
                .content_type
                .clone()
                .unwrap_or_else(|| "application/pdf".into()),
            payload: AttachmentPayload::File {
                path: temp_path.to_path_buf(),
            },
            temp: Some(temp_path),
        })
    }
}

fn basename(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

/// Last path segment of a URL, with any query already excluded by the parse.
fn url_basename(url: &Url) -> Option<String> {
    url.path_segments()?
        .last()
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_string())
}
