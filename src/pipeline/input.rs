//! Input resolution: turn a user-supplied path or URL into an in-memory
//! [`UploadedDocument`].
//!
//! Resumes are small (rarely more than a few hundred KB), so the whole file
//! is held in memory and handed to PDFium as a byte buffer; nothing is
//! written to disk. The `%PDF` magic bytes are checked before returning.

use crate::error::AnalyzerError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Raw bytes of an uploaded resume. Lives only as long as one request.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedDocument")
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl UploadedDocument {
    /// Wrap an uploaded byte buffer. No validation happens here.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `true` if the buffer starts with the `%PDF` signature.
    pub fn has_pdf_magic(&self) -> bool {
        self.bytes.starts_with(b"%PDF")
    }

    /// Reject empty buffers and anything that is obviously not a PDF.
    pub fn validate(&self) -> Result<(), AnalyzerError> {
        if self.is_empty() {
            return Err(AnalyzerError::MissingDocument);
        }
        if !self.has_pdf_magic() {
            let magic = self.bytes.iter().take(4).copied().collect();
            return Err(AnalyzerError::NotAPdf { magic });
        }
        Ok(())
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load a resume from a local path or an HTTP(S) URL.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<UploadedDocument, AnalyzerError> {
    let doc = if is_url(input) {
        download_url(input, timeout_secs).await?
    } else {
        read_local(Path::new(input)).await?
    };
    doc.validate()?;
    Ok(doc)
}

async fn read_local(path: &Path) -> Result<UploadedDocument, AnalyzerError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            debug!("Read {} bytes from {}", bytes.len(), path.display());
            Ok(UploadedDocument::from_bytes(bytes))
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(AnalyzerError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(AnalyzerError::FileNotFound {
            path: PathBuf::from(path),
        }),
    }
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<UploadedDocument, AnalyzerError> {
    info!("Downloading resume from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AnalyzerError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        let reason = if e.is_timeout() {
            format!("timed out after {timeout_secs}s")
        } else {
            e.to_string()
        };
        AnalyzerError::DownloadFailed {
            url: url.to_string(),
            reason,
        }
    })?;

    if !response.status().is_success() {
        return Err(AnalyzerError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AnalyzerError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(UploadedDocument::from_bytes(bytes.to_vec()))
}
