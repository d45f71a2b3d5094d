//! Configuration for resume analysis.
//!
//! All process-wide settings live in one [`AnalyzerConfig`], built once at
//! startup and handed by reference to the renderer and the analysis client.
//! Nothing reads the environment after that point: the API key, the PDFium
//! location, and the timeouts are fixed for the lifetime of the
//! [`crate::Analyzer`].

use crate::error::AnalyzerError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Provider name that selects the built-in Gemini REST client.
pub const GEMINI_PROVIDER: &str = "gemini";

/// Default Gemini model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Default model for non-Gemini providers created through edgequake-llm.
pub const DEFAULT_PROVIDER_MODEL: &str = "gpt-4.1-mini";

/// Base URL of the Google Generative Language API.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for an [`crate::Analyzer`].
///
/// Built via [`AnalyzerConfig::builder()`], [`AnalyzerConfig::from_env()`],
/// or [`AnalyzerConfig::default()`].
///
/// # Example
/// ```rust
/// use ats_analyzer::AnalyzerConfig;
///
/// let config = AnalyzerConfig::builder()
///     .api_key("my-key")
///     .model("gemini-2.0-flash")
///     .api_timeout_secs(90)
///     .build()
///     .unwrap();
/// assert_eq!(config.api_timeout_secs, 90);
/// ```
#[derive(Clone)]
pub struct AnalyzerConfig {
    /// API key for the hosted generation service. Required by the Gemini backend.
    pub api_key: Option<String>,

    /// Provider name. `"gemini"` (default) uses the built-in REST client;
    /// anything else is created through `edgequake_llm::ProviderFactory`.
    pub provider_name: String,

    /// Model identifier. If None, uses the provider default.
    pub model: Option<String>,

    /// Pre-constructed edgequake-llm provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Base URL for the Gemini REST API. Default: [`DEFAULT_GEMINI_BASE_URL`].
    pub api_base_url: String,

    /// Location of the PDFium library: the library file itself or a
    /// directory containing it. If None, the current directory and the
    /// system library path are searched.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Rendering DPI for page 1. Range: 72–400. Default: 200.
    pub dpi: u32,

    /// Cap on the longest rendered edge in pixels. Default: 2000.
    pub max_rendered_pixels: u32,

    /// Sampling temperature. Default: 0.2.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 4096.
    pub max_tokens: usize,

    /// Time budget for rendering page 1, in seconds. Default: 30.
    pub render_timeout_secs: u64,

    /// Time budget for the generation call, in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Timeout for downloading a resume given as a URL, in seconds. Default: 60.
    pub download_timeout_secs: u64,

    /// Optional receiver for pipeline progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider_name: GEMINI_PROVIDER.to_string(),
            model: None,
            provider: None,
            api_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            pdfium_lib_path: None,
            dpi: 200,
            max_rendered_pixels: 2000,
            temperature: 0.2,
            max_tokens: 4096,
            render_timeout_secs: 30,
            api_timeout_secs: 120,
            download_timeout_secs: 60,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("api_base_url", &self.api_base_url)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("render_timeout_secs", &self.render_timeout_secs)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .finish()
    }
}

impl AnalyzerConfig {
    /// Create a new builder for `AnalyzerConfig`.
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Defaults overlaid with the process environment.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `GOOGLE_API_KEY`, then `GEMINI_API_KEY` | `api_key` |
    /// | `ATS_ANALYZER_PROVIDER` | `provider_name` |
    /// | `ATS_ANALYZER_MODEL` | `model` |
    /// | `PDFIUM_LIB_PATH` | `pdfium_lib_path` |
    ///
    /// Empty values are ignored. Call this once at startup.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.api_key = non_empty_var("GOOGLE_API_KEY").or_else(|| non_empty_var("GEMINI_API_KEY"));
        if let Some(provider) = non_empty_var("ATS_ANALYZER_PROVIDER") {
            config.provider_name = provider;
        }
        config.model = non_empty_var("ATS_ANALYZER_MODEL");
        config.pdfium_lib_path = non_empty_var("PDFIUM_LIB_PATH").map(PathBuf::from);
        config
    }

    /// `true` when the built-in Gemini backend will be used.
    pub fn uses_gemini(&self) -> bool {
        self.provider.is_none() && self.provider_name.eq_ignore_ascii_case(GEMINI_PROVIDER)
    }

    /// The model that will actually be requested.
    pub fn effective_model(&self) -> &str {
        match self.model.as_deref() {
            Some(m) => m,
            None if self.uses_gemini() => DEFAULT_GEMINI_MODEL,
            None => DEFAULT_PROVIDER_MODEL,
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Builder for [`AnalyzerConfig`].
#[derive(Debug)]
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    /// Start from an existing configuration (e.g. one from [`AnalyzerConfig::from_env`]).
    pub fn from_config(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn render_timeout_secs(mut self, secs: u64) -> Self {
        self.config.render_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// A missing API key is *not* rejected here; it is reported when the
    /// analyzer is constructed, because non-Gemini providers read their own
    /// credentials.
    pub fn build(self) -> Result<AnalyzerConfig, AnalyzerError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(AnalyzerError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.render_timeout_secs == 0 || c.api_timeout_secs == 0 {
            return Err(AnalyzerError::InvalidConfig(
                "Timeouts must be ≥ 1 second".into(),
            ));
        }
        if c.provider_name.trim().is_empty() {
            return Err(AnalyzerError::InvalidConfig(
                "Provider name must not be empty".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(AnalyzerError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = AnalyzerConfig::default();
        assert_eq!(c.dpi, 200);
        assert_eq!(c.provider_name, "gemini");
        assert!(c.uses_gemini());
        assert_eq!(c.effective_model(), DEFAULT_GEMINI_MODEL);
        assert_eq!(c.render_timeout_secs, 30);
        assert_eq!(c.api_timeout_secs, 120);
    }

    #[test]
    fn builder_clamps_dpi_and_temperature() {
        let c = AnalyzerConfig::builder()
            .dpi(1000)
            .temperature(5.0)
            .build()
            .unwrap();
        assert_eq!(c.dpi, 400);
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = AnalyzerConfig::builder()
            .api_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidConfig(_)));
    }

    #[test]
    fn non_gemini_provider_uses_provider_default_model() {
        let c = AnalyzerConfig::builder()
            .provider_name("openai")
            .build()
            .unwrap();
        assert!(!c.uses_gemini());
        assert_eq!(c.effective_model(), DEFAULT_PROVIDER_MODEL);
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = AnalyzerConfig::builder()
            .api_key("super-secret")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
