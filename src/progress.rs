//! Progress-callback trait for analysis pipeline events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalyzerConfigBuilder::progress_callback`] to be told when
//! each stage starts and finishes. Events are driven by the real render and
//! request durations, so a spinner or status line reflects what is actually
//! happening.
//!
//! # Example
//!
//! ```rust
//! use ats_analyzer::{AnalysisMode, AnalysisProgressCallback, AnalyzerConfig};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl AnalysisProgressCallback for Printer {
//!     fn on_request_start(&self, mode: AnalysisMode) {
//!         eprintln!("asking the model for: {}", mode.title());
//!     }
//! }
//!
//! let config = AnalyzerConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use crate::prompts::AnalysisMode;
use std::sync::Arc;

/// Called by the analyzer as a request moves through the pipeline.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Exactly one of `on_analysis_complete` or
/// `on_analysis_error` fires per request.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called before page 1 is rendered.
    fn on_render_start(&self) {}

    /// Called after page 1 has been rendered and encoded.
    ///
    /// # Arguments
    /// * `encoded_len`: length of the base64 payload
    /// * `elapsed_ms` : time spent rendering and encoding
    fn on_render_complete(&self, encoded_len: usize, elapsed_ms: u64) {
        let _ = (encoded_len, elapsed_ms);
    }

    /// Called just before the generation request is sent.
    fn on_request_start(&self, mode: AnalysisMode) {
        let _ = mode;
    }

    /// Called when the model's response has been received and interpreted.
    ///
    /// # Arguments
    /// * `text_len`: byte length of the response text
    /// * `score`   : extracted match score, if any
    fn on_analysis_complete(&self, mode: AnalysisMode, text_len: usize, score: Option<u8>) {
        let _ = (mode, text_len, score);
    }

    /// Called when the request fails at any stage.
    fn on_analysis_error(&self, mode: AnalysisMode, error: &str) {
        let _ = (mode, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalyzerConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;
