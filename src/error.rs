//! Error types for the ats-analyzer library.
//!
//! Every failure of an analysis request surfaces as an [`AnalyzerError`].
//! Callers rarely care about the exact variant; they care about what to do
//! next, which is what [`ErrorKind`] captures:
//!
//! * [`ErrorKind::Configuration`]: **fatal**: a missing API key, a rejected
//!   credential, or an unresolvable PDFium library. Nothing will work until
//!   the environment is fixed.
//! * [`ErrorKind::Input`]: the request itself was incomplete or the upload
//!   is not a usable PDF. Fix the input and try again.
//! * [`ErrorKind::Timeout`]: rendering or generation ran past its budget.
//! * [`ErrorKind::Service`]: the hosted model failed or returned nothing usable.
//!
//! A missing match score is *not* an error: it shows up as
//! `AnalysisResult::score == None`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the ats-analyzer library.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// No API key for the hosted generation service was configured.
    #[error("No API key configured for '{provider}'.\nSet GOOGLE_API_KEY (or GEMINI_API_KEY) before running an analysis.")]
    MissingApiKey { provider: String },

    /// The hosted service rejected the credential (401/403 or invalid key).
    #[error("Authentication error from provider '{provider}': {detail}")]
    AuthError { provider: String, detail: String },

    /// The configured provider could not be constructed.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// No PDFium library could be located or bound.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium renders the resume page and must be installed on this host.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (file or directory), or\n\
  • pass --pdfium-lib <PATH>, or\n\
  • place the platform library next to the binary.\n"
    )]
    PdfiumBindingFailed(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// No resume document was supplied (or it was empty).
    #[error("No resume uploaded. Please provide a PDF resume.")]
    MissingDocument,

    /// The job description was empty or whitespace.
    #[error("The job description is empty. Paste the complete job description.")]
    EmptyJobDescription,

    /// Resume file was not found at the given path.
    #[error("Resume file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// The bytes were read but are not a PDF.
    #[error("Upload is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF is corrupt and cannot be opened: {detail}")]
    CorruptPdf { detail: String },

    /// PDF requires a password; resumes are expected to be unprotected.
    #[error("PDF is encrypted and requires a password. Export an unprotected copy of the resume.")]
    PasswordProtected,

    /// The PDF opened but contains no pages.
    #[error("PDF has no pages to analyse")]
    EmptyDocument,

    /// pdfium-render failed on the first page.
    #[error("Rasterisation of page 1 failed: {detail}")]
    RasterisationFailed { detail: String },

    // ── Timeouts ──────────────────────────────────────────────────────────
    /// Rendering exceeded the configured budget.
    #[error("PDF rendering timed out after {secs}s. The PDF might be too complex or large.")]
    RenderTimeout { secs: u64 },

    /// The generation call exceeded the configured budget.
    #[error("Analysis request timed out after {secs}s")]
    ApiTimeout { secs: u64 },

    // ── Service errors ────────────────────────────────────────────────────
    /// The hosted service returned a non-success response or the transport failed.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The hosted service refused to answer (safety block etc.).
    #[error("The model declined to respond: {reason}")]
    ResponseBlocked { reason: String },

    /// The response contained no usable text.
    #[error("The model returned an empty response")]
    EmptyResponse,

    // ── I/O ───────────────────────────────────────────────────────────────
    /// Could not write the exported result file.
    #[error("Failed to write export file '{path}': {source}")]
    ExportWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of an [`AnalyzerError`], used by the shell to pick
/// context-appropriate guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Input,
    Timeout,
    Service,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Configuration => "configuration error",
            ErrorKind::Input => "input error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Service => "service error",
        };
        f.write_str(s)
    }
}

impl AnalyzerError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        use AnalyzerError::*;
        match self {
            MissingApiKey { .. }
            | AuthError { .. }
            | ProviderNotConfigured { .. }
            | PdfiumBindingFailed(_)
            | InvalidConfig(_) => ErrorKind::Configuration,

            MissingDocument
            | EmptyJobDescription
            | FileNotFound { .. }
            | PermissionDenied { .. }
            | DownloadFailed { .. }
            | NotAPdf { .. }
            | CorruptPdf { .. }
            | PasswordProtected
            | EmptyDocument
            | RasterisationFailed { .. } => ErrorKind::Input,

            RenderTimeout { .. } | ApiTimeout { .. } => ErrorKind::Timeout,

            LlmApiError { .. }
            | ResponseBlocked { .. }
            | EmptyResponse
            | ExportWriteFailed { .. }
            | Internal(_) => ErrorKind::Service,
        }
    }

    /// `true` when no further analysis can succeed until the environment changes.
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }

    /// One-line advice for the person at the keyboard.
    pub fn guidance(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Configuration => {
                "Fix the configuration (API key, PDFium library) and restart."
            }
            ErrorKind::Input => {
                "Please ensure your PDF is valid and the job description is provided."
            }
            ErrorKind::Timeout => "Try again, or raise the timeout for large or complex PDFs.",
            ErrorKind::Service => {
                "Could not get a response from the AI. Check your API key and network."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_fatal() {
        let e = AnalyzerError::MissingApiKey {
            provider: "gemini".into(),
        };
        assert_eq!(e.kind(), ErrorKind::Configuration);
        assert!(e.is_fatal());
        assert!(AnalyzerError::PdfiumBindingFailed("nope".into()).is_fatal());
    }

    #[test]
    fn input_errors_are_not_fatal() {
        for e in [
            AnalyzerError::MissingDocument,
            AnalyzerError::EmptyJobDescription,
            AnalyzerError::EmptyDocument,
            AnalyzerError::NotAPdf {
                magic: b"GIF8".to_vec(),
            },
        ] {
            assert_eq!(e.kind(), ErrorKind::Input, "{e}");
            assert!(!e.is_fatal());
        }
    }

    #[test]
    fn timeout_display() {
        let e = AnalyzerError::ApiTimeout { secs: 120 };
        assert_eq!(e.kind(), ErrorKind::Timeout);
        assert!(e.to_string().contains("120s"));

        let e = AnalyzerError::RenderTimeout { secs: 30 };
        assert_eq!(e.kind(), ErrorKind::Timeout);
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn auth_error_display() {
        let e = AnalyzerError::AuthError {
            provider: "gemini".into(),
            detail: "API key not valid".into(),
        };
        assert!(e.to_string().contains("gemini"));
        assert!(e.to_string().contains("API key not valid"));
        assert_eq!(e.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn service_errors_have_guidance() {
        let e = AnalyzerError::EmptyResponse;
        assert_eq!(e.kind(), ErrorKind::Service);
        assert!(e.guidance().contains("AI"));
    }

    #[test]
    fn kind_serialises_snake_case() {
        let json = serde_json::to_string(&ErrorKind::Configuration).unwrap();
        assert_eq!(json, "\"configuration\"");
    }
}
