//! Analysis entry points.
//!
//! An [`Analyzer`] is built once at startup. Construction is where fatal
//! configuration problems surface: a missing API key or an unresolvable
//! PDFium library fails [`Analyzer::new`] before any resume is looked at.
//! After that, each [`Analyzer::analyze`] call runs one request through the
//! pipeline, strictly in sequence:
//!
//! ```text
//! validate inputs ──▶ render page 1 ──▶ model call ──▶ extract score
//!                     (render timeout)   (api timeout)   (match mode only)
//! ```
//!
//! Inputs are checked before anything else, so the client is never called
//! with a missing document or an empty job description.

use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;
use crate::output::{AnalysisResult, AnalysisStats};
use crate::pipeline::input::{self, UploadedDocument};
use crate::pipeline::interpret::{extract_score, MatchBand};
use crate::pipeline::llm::{AnalysisClient, AnalysisRequest, GeminiClient, ProviderClient};
use crate::pipeline::render::{DocumentRenderer, PdfiumRenderer};
use crate::prompts::AnalysisMode;
use edgequake_llm::ProviderFactory;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Runs resume analyses against one configuration.
pub struct Analyzer {
    config: AnalyzerConfig,
    renderer: Arc<dyn DocumentRenderer>,
    client: Arc<dyn AnalysisClient>,
}

impl Analyzer {
    /// Resolve the analysis client and bind PDFium.
    ///
    /// # Errors
    /// Only configuration errors: missing API key, provider that cannot be
    /// constructed, PDFium not found.
    pub fn new(config: AnalyzerConfig) -> Result<Self, AnalyzerError> {
        let client = resolve_client(&config)?;
        let renderer: Arc<dyn DocumentRenderer> = Arc::new(PdfiumRenderer::new(&config)?);
        info!(
            "Analyzer ready: provider={}, model={}",
            client.name(),
            config.effective_model()
        );
        Ok(Self {
            config,
            renderer,
            client,
        })
    }

    /// Assemble an analyzer from explicit parts.
    pub fn from_parts(
        config: AnalyzerConfig,
        renderer: Arc<dyn DocumentRenderer>,
        client: Arc<dyn AnalysisClient>,
    ) -> Self {
        Self {
            config,
            renderer,
            client,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Name of the backend that will answer requests.
    pub fn client_name(&self) -> &str {
        self.client.name()
    }

    /// Run one analysis.
    ///
    /// # Errors
    /// - [`AnalyzerError::MissingDocument`] / [`AnalyzerError::EmptyJobDescription`]
    ///   before any work is done
    /// - PDF problems (not a PDF, corrupt, no pages) as input errors
    /// - [`AnalyzerError::RenderTimeout`] / [`AnalyzerError::ApiTimeout`]
    /// - service errors from the model call
    ///
    /// A match-percentage response without a recognisable percentage is
    /// still `Ok`, with `score == None`.
    pub async fn analyze(
        &self,
        mode: AnalysisMode,
        document: Option<&UploadedDocument>,
        job_description: &str,
    ) -> Result<AnalysisResult, AnalyzerError> {
        let result = self.run(mode, document, job_description).await;
        self.notify(mode, &result);
        result
    }

    /// Load a resume from a local path or URL, then [`analyze`](Self::analyze) it.
    ///
    /// Loading failures are reported through the progress callback like any
    /// other failure of the request.
    pub async fn analyze_input(
        &self,
        mode: AnalysisMode,
        input_str: &str,
        job_description: &str,
    ) -> Result<AnalysisResult, AnalyzerError> {
        let result = self.load_and_run(mode, input_str, job_description).await;
        self.notify(mode, &result);
        result
    }

    async fn load_and_run(
        &self,
        mode: AnalysisMode,
        input_str: &str,
        job_description: &str,
    ) -> Result<AnalysisResult, AnalyzerError> {
        if job_description.trim().is_empty() {
            return Err(AnalyzerError::EmptyJobDescription);
        }
        let document = input::resolve_input(input_str, self.config.download_timeout_secs).await?;
        self.run(mode, Some(&document), job_description).await
    }

    fn notify(&self, mode: AnalysisMode, result: &Result<AnalysisResult, AnalyzerError>) {
        if let Some(ref cb) = self.config.progress_callback {
            match result {
                Ok(r) => cb.on_analysis_complete(mode, r.text.len(), r.score),
                Err(e) => cb.on_analysis_error(mode, &e.to_string()),
            }
        }
    }

    async fn run(
        &self,
        mode: AnalysisMode,
        document: Option<&UploadedDocument>,
        job_description: &str,
    ) -> Result<AnalysisResult, AnalyzerError> {
        let total_start = Instant::now();
        info!("Starting {} analysis", mode);

        // ── Step 1: Validate inputs ──────────────────────────────────────
        let document = document
            .filter(|d| !d.is_empty())
            .ok_or(AnalyzerError::MissingDocument)?;
        if job_description.trim().is_empty() {
            return Err(AnalyzerError::EmptyJobDescription);
        }

        // ── Step 2: Render page 1 ────────────────────────────────────────
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_render_start();
        }
        let render_start = Instant::now();
        let render_budget = self.config.render_timeout_secs;
        let image = tokio::time::timeout(
            Duration::from_secs(render_budget),
            self.renderer.render_first_page(document),
        )
        .await
        .map_err(|_| AnalyzerError::RenderTimeout {
            secs: render_budget,
        })??;
        let render_duration_ms = render_start.elapsed().as_millis() as u64;
        debug!(
            "Rendered page 1 in {}ms ({} bytes base64)",
            render_duration_ms,
            image.data.len()
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_render_complete(image.data.len(), render_duration_ms);
        }

        // ── Step 3: Ask the model ────────────────────────────────────────
        let request = AnalysisRequest::new(mode, image, job_description)?;
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_request_start(mode);
        }
        let llm_start = Instant::now();
        let api_budget = self.config.api_timeout_secs;
        let text = tokio::time::timeout(Duration::from_secs(api_budget), self.client.analyze(&request))
            .await
            .map_err(|_| AnalyzerError::ApiTimeout { secs: api_budget })??;
        let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

        // ── Step 4: Interpret ────────────────────────────────────────────
        let score = if mode.extracts_score() {
            let score = extract_score(&text);
            if score.is_none() {
                warn!("No match percentage found in {} response", self.client.name());
            }
            score
        } else {
            None
        };

        let stats = AnalysisStats {
            provider: self.client.name().to_string(),
            render_duration_ms,
            llm_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };
        info!(
            "{} analysis complete: {} chars, {}ms total",
            mode,
            text.len(),
            stats.total_duration_ms
        );

        Ok(AnalysisResult {
            mode,
            text,
            score,
            band: score.map(MatchBand::classify),
            stats,
        })
    }
}

/// One-shot helper: build an [`Analyzer`] from `config` and analyse the
/// resume at `input_str` (local path or URL).
///
/// Prefer keeping an [`Analyzer`] around when running more than one request;
/// construction binds PDFium and builds an HTTP client each time.
///
/// # Example
/// ```rust,no_run
/// use ats_analyzer::{analyze_resume, AnalysisMode, AnalyzerConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AnalyzerConfig::from_env();
/// let result = analyze_resume(
///     "resume.pdf",
///     "Senior Rust engineer, async networking, PostgreSQL",
///     AnalysisMode::MatchPercentage,
///     &config,
/// )
/// .await?;
/// println!("{:?} {}", result.score, result.text);
/// # Ok(())
/// # }
/// ```
pub async fn analyze_resume(
    input_str: impl AsRef<str>,
    job_description: &str,
    mode: AnalysisMode,
    config: &AnalyzerConfig,
) -> Result<AnalysisResult, AnalyzerError> {
    let analyzer = Analyzer::new(config.clone())?;
    analyzer
        .analyze_input(mode, input_str.as_ref(), job_description)
        .await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the analysis client, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`): wrapped as-is.
/// 2. **Gemini** (`provider_name == "gemini"`, the default): the built-in
///    REST client, which requires `config.api_key`.
/// 3. **Any other named provider**: created through
///    [`ProviderFactory::create_llm_provider`], which reads that provider's
///    own API key variable (`OPENAI_API_KEY`, …).
fn resolve_client(config: &AnalyzerConfig) -> Result<Arc<dyn AnalysisClient>, AnalyzerError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::new(ProviderClient::new(
            Arc::clone(provider),
            config.provider_name.clone(),
            config,
        )));
    }

    if config.uses_gemini() {
        return Ok(Arc::new(GeminiClient::new(config)?));
    }

    let name = config.provider_name.as_str();
    let model = config.effective_model();
    let provider = ProviderFactory::create_llm_provider(name, model).map_err(|e| {
        AnalyzerError::ProviderNotConfigured {
            provider: name.to_string(),
            hint: format!("{e}"),
        }
    })?;
    Ok(Arc::new(ProviderClient::new(provider, name, config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_without_key_is_fatal() {
        let config = AnalyzerConfig::default();
        let err = resolve_client(&config).err().unwrap();
        assert!(matches!(err, AnalyzerError::MissingApiKey { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn gemini_with_key_resolves() {
        let config = AnalyzerConfig::builder().api_key("k").build().unwrap();
        let client = resolve_client(&config).unwrap();
        assert_eq!(client.name(), "gemini");
    }

    #[test]
    fn analyzer_new_checks_key_before_pdfium() {
        let config = AnalyzerConfig::builder()
            .pdfium_lib_path("/definitely/not/libpdfium.so")
            .build()
            .unwrap();
        let err = Analyzer::new(config).err().unwrap();
        assert!(matches!(err, AnalyzerError::MissingApiKey { .. }));
    }

    #[test]
    fn analyzer_new_reports_missing_pdfium() {
        let config = AnalyzerConfig::builder()
            .api_key("k")
            .pdfium_lib_path("/definitely/not/libpdfium.so")
            .build()
            .unwrap();
        let err = Analyzer::new(config).err().unwrap();
        assert!(matches!(err, AnalyzerError::PdfiumBindingFailed(_)));
    }
}
