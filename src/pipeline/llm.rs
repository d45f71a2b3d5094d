//! Model interaction: send one (instruction, image, job description) triple
//! to a hosted multimodal model and get plain text back.
//!
//! The [`AnalysisClient`] trait is the seam between the pipeline and the
//! network. Two implementations ship with the crate:
//!
//! * [`GeminiClient`]: the default; talks to Google's `generateContent`
//!   REST endpoint directly with the API key from [`AnalyzerConfig`].
//! * [`ProviderClient`]: adapts any `edgequake_llm::LLMProvider`
//!   (OpenAI, Anthropic, Ollama, …).
//!
//! Every call is a single attempt. There is no retry and no caching: a
//! failure is reported to the caller as-is, and repeating a request
//! re-invokes the service.

use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;
use crate::pipeline::encode::EncodedImagePart;
use crate::prompts::AnalysisMode;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, LlmError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Everything the model needs for one analysis. All fields are mandatory.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub mode: AnalysisMode,
    pub instruction: &'static str,
    pub image: EncodedImagePart,
    pub job_description: String,
}

impl AnalysisRequest {
    /// Assemble a request, rejecting an empty job description.
    pub fn new(
        mode: AnalysisMode,
        image: EncodedImagePart,
        job_description: impl Into<String>,
    ) -> Result<Self, AnalyzerError> {
        let job_description = job_description.into();
        if job_description.trim().is_empty() {
            return Err(AnalyzerError::EmptyJobDescription);
        }
        Ok(Self {
            mode,
            instruction: mode.instruction(),
            image,
            job_description,
        })
    }
}

/// A hosted text-generation capability that can look at one image.
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Send the request and return the generated text verbatim.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String, AnalyzerError>;
}

// ── Gemini REST backend ──────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Client for the Google Generative Language `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    timeout_secs: u64,
}

impl GeminiClient {
    /// Build a client from the configuration. Fails if no API key is set.
    pub fn new(config: &AnalyzerConfig) -> Result<Self, AnalyzerError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AnalyzerError::MissingApiKey {
                provider: crate::config::GEMINI_PROVIDER.to_string(),
            })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .user_agent(concat!("ats-analyzer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AnalyzerError::Internal(format!("HTTP client: {e}")))?;

        let model = config.effective_model().to_string();
        let endpoint = format!(
            "{}/models/{}:generateContent",
            config.api_base_url.trim_end_matches('/'),
            model
        );

        Ok(Self {
            http,
            api_key,
            endpoint,
            model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_secs: config.api_timeout_secs,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnalysisClient for GeminiClient {
    fn name(&self) -> &str {
        crate::config::GEMINI_PROVIDER
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<String, AnalyzerError> {
        let body = gemini_request_body(request, self.temperature, self.max_tokens);

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalyzerError::ApiTimeout {
                        secs: self.timeout_secs,
                    }
                } else {
                    AnalyzerError::LlmApiError {
                        message: format!("request to {} failed: {e}", self.model),
                    }
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                AnalyzerError::ApiTimeout {
                    secs: self.timeout_secs,
                }
            } else {
                AnalyzerError::LlmApiError {
                    message: format!("failed to read response body: {e}"),
                }
            }
        })?;

        if !status.is_success() {
            let err = classify_gemini_error(status.as_u16(), &text);
            warn!("Gemini call failed: {}", err);
            return Err(err);
        }

        parse_gemini_response(&text)
    }
}

fn gemini_request_body<'a>(
    request: &'a AnalysisRequest,
    temperature: f32,
    max_tokens: usize,
) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![
                Part::Text {
                    text: request.instruction,
                },
                Part::Inline {
                    inline_data: InlineData {
                        mime_type: &request.image.mime_type,
                        data: &request.image.data,
                    },
                },
                Part::Text {
                    text: &request.job_description,
                },
            ],
        }],
        generation_config: GenerationConfig {
            temperature,
            max_output_tokens: max_tokens,
        },
    }
}

/// Map a non-success HTTP response to an error.
///
/// Gemini reports a bad key as `400 INVALID_ARGUMENT` with "API key not
/// valid" in the message; only that exact shape is treated like 401/403.
fn classify_gemini_error(status: u16, body: &str) -> AnalyzerError {
    let (message, api_status) = match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(env) => (env.error.message, env.error.status),
        Err(_) => (body.chars().take(300).collect(), String::new()),
    };

    let bad_key = (status == 400 && api_status == "INVALID_ARGUMENT" && message.contains("API key"))
        || api_status == "UNAUTHENTICATED";
    if status == 401 || status == 403 || bad_key {
        return AnalyzerError::AuthError {
            provider: crate::config::GEMINI_PROVIDER.to_string(),
            detail: message,
        };
    }

    AnalyzerError::LlmApiError {
        message: if api_status.is_empty() {
            format!("HTTP {status}: {message}")
        } else {
            format!("HTTP {status} {api_status}: {message}")
        },
    }
}

/// Concatenate the text parts of the first candidate.
fn parse_gemini_response(body: &str) -> Result<String, AnalyzerError> {
    let parsed: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| AnalyzerError::LlmApiError {
            message: format!("malformed response: {e}"),
        })?;

    if let Some(usage) = &parsed.usage_metadata {
        debug!(
            "Gemini usage: {} input tokens, {} output tokens",
            usage.prompt_token_count, usage.candidates_token_count
        );
    }

    let Some(candidate) = parsed.candidates.into_iter().next() else {
        if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(AnalyzerError::ResponseBlocked { reason });
        }
        return Err(AnalyzerError::EmptyResponse);
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_default();
        if matches!(
            reason.as_str(),
            "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT"
        ) {
            return Err(AnalyzerError::ResponseBlocked { reason });
        }
        return Err(AnalyzerError::EmptyResponse);
    }

    Ok(text)
}

// ── edgequake-llm backend ────────────────────────────────────────────────

/// Adapts an `edgequake_llm` provider to [`AnalysisClient`].
///
/// The instruction becomes the system message; the job description and the
/// page image form the user message.
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    name: String,
    temperature: f32,
    max_tokens: usize,
    timeout_secs: u64,
}

impl ProviderClient {
    pub fn new(provider: Arc<dyn LLMProvider>, name: impl Into<String>, config: &AnalyzerConfig) -> Self {
        Self {
            provider,
            name: name.into(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_secs: config.api_timeout_secs,
        }
    }

    fn build_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

#[async_trait]
impl AnalysisClient for ProviderClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn analyze(&self, request: &AnalysisRequest) -> Result<String, AnalyzerError> {
        let messages = vec![
            ChatMessage::system(request.instruction),
            ChatMessage::user_with_images(
                request.job_description.as_str(),
                vec![request.image.to_image_data()],
            ),
        ];
        let options = self.build_options();

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| classify_provider_error(&self.name, &e, self.timeout_secs))?;

        debug!(
            "{}: {} input tokens, {} output tokens",
            self.name, response.prompt_tokens, response.completion_tokens
        );

        if response.content.trim().is_empty() {
            return Err(AnalyzerError::EmptyResponse);
        }
        Ok(response.content)
    }
}

fn classify_provider_error(provider: &str, err: &LlmError, timeout_secs: u64) -> AnalyzerError {
    match err {
        LlmError::AuthError(detail) | LlmError::ConfigError(detail) => AnalyzerError::AuthError {
            provider: provider.to_string(),
            detail: detail.clone(),
        },
        LlmError::Timeout => AnalyzerError::ApiTimeout { secs: timeout_secs },
        other => AnalyzerError::LlmApiError {
            message: format!("{provider}: {other}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn request(mode: AnalysisMode) -> AnalysisRequest {
        AnalysisRequest::new(mode, EncodedImagePart::png("aGVsbG8="), "Senior Rust engineer").unwrap()
    }

    #[test]
    fn empty_job_description_is_rejected() {
        let err = AnalysisRequest::new(
            AnalysisMode::Comprehensive,
            EncodedImagePart::png("aGVsbG8="),
            "   \n",
        )
        .unwrap_err();
        assert!(matches!(err, AnalyzerError::EmptyJobDescription));
    }

    #[test]
    fn request_carries_mode_instruction() {
        let req = request(AnalysisMode::Improvement);
        assert_eq!(req.instruction, AnalysisMode::Improvement.instruction());
    }

    #[test]
    fn gemini_body_orders_instruction_image_job() {
        let req = request(AnalysisMode::MatchPercentage);
        let body = serde_json::to_value(gemini_request_body(&req, 0.2, 4096)).unwrap();

        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0]["text"], AnalysisMode::MatchPercentage.instruction());
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], "aGVsbG8=");
        assert_eq!(parts[2]["text"], "Senior Rust engineer");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 4096);
        assert_eq!(body["contents"][0]["role"], "user");
    }

    #[test]
    fn parse_concatenates_text_parts() {
        let body = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "Overall Match: 85%\n"}, {"text": "Strong Rust skills."}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 1200, "candidatesTokenCount": 300}
        }"#;
        assert_eq!(
            parse_gemini_response(body).unwrap(),
            "Overall Match: 85%\nStrong Rust skills."
        );
    }

    #[test]
    fn parse_blocked_prompt() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        match parse_gemini_response(body) {
            Err(AnalyzerError::ResponseBlocked { reason }) => assert_eq!(reason, "SAFETY"),
            other => panic!("expected ResponseBlocked, got {other:?}"),
        }
    }

    #[test]
    fn parse_empty_candidate_is_service_error() {
        let body = r#"{"candidates": [{"content": {"parts": []}, "finishReason": "STOP"}]}"#;
        let err = parse_gemini_response(body).unwrap_err();
        assert!(matches!(err, AnalyzerError::EmptyResponse));
        assert_eq!(err.kind(), ErrorKind::Service);
    }

    #[test]
    fn parse_malformed_body_is_service_error() {
        let err = parse_gemini_response("<html>bad gateway</html>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Service);
    }

    #[test]
    fn invalid_key_is_configuration_error() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}}"#;
        let err = classify_gemini_error(400, body);
        assert!(matches!(err, AnalyzerError::AuthError { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn server_error_is_service_error() {
        let body = r#"{"error": {"code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE"}}"#;
        let err = classify_gemini_error(503, body);
        assert_eq!(err.kind(), ErrorKind::Service);
        assert!(err.to_string().contains("UNAVAILABLE"));
    }

    #[test]
    fn gemini_client_requires_api_key() {
        let config = AnalyzerConfig::default();
        let err = GeminiClient::new(&config).err().unwrap();
        assert!(matches!(err, AnalyzerError::MissingApiKey { .. }));
    }

    #[test]
    fn gemini_client_endpoint_uses_model() {
        let config = AnalyzerConfig::builder()
            .api_key("k")
            .model("gemini-test")
            .api_base_url("http://localhost:9/v1beta/")
            .build()
            .unwrap();
        let client = GeminiClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint(),
            "http://localhost:9/v1beta/models/gemini-test:generateContent"
        );
        assert_eq!(client.model(), "gemini-test");
    }

    #[test]
    fn provider_auth_and_config_errors_are_fatal() {
        let err = classify_provider_error(
            "anthropic",
            &LlmError::AuthError("invalid x-api-key".into()),
            120,
        );
        assert!(matches!(err, AnalyzerError::AuthError { .. }));
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = classify_provider_error(
            "openai",
            &LlmError::ConfigError("OPENAI_API_KEY not set".into()),
            120,
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn provider_timeout_is_timeout() {
        let err = classify_provider_error("openai", &LlmError::Timeout, 90);
        assert!(matches!(err, AnalyzerError::ApiTimeout { secs: 90 }));
        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[test]
    fn other_provider_errors_are_service_errors() {
        for e in [
            LlmError::TokenLimitExceeded { max: 4030, got: 5000 },
            LlmError::RateLimited("slow down".into()),
            LlmError::NetworkError("HTTP 403 from proxy".into()),
            LlmError::ApiError("unauthorized model access".into()),
        ] {
            let err = classify_provider_error("openai", &e, 120);
            assert_eq!(err.kind(), ErrorKind::Service, "{e}");
            assert!(err.to_string().contains("openai"));
        }
    }

    #[test]
    fn api_key_mentions_on_other_statuses_are_not_fatal() {
        let quota = r#"{"error": {"code": 429, "message": "Quota exceeded for API key project.", "status": "RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(classify_gemini_error(429, quota).kind(), ErrorKind::Service);

        let outage = r#"{"error": {"code": 500, "message": "Internal error validating API key.", "status": "INTERNAL"}}"#;
        assert_eq!(classify_gemini_error(500, outage).kind(), ErrorKind::Service);
    }

    #[test]
    fn forbidden_and_unauthenticated_are_fatal() {
        assert!(classify_gemini_error(403, "forbidden").is_fatal());
        let body = r#"{"error": {"code": 401, "message": "Request had invalid credentials.", "status": "UNAUTHENTICATED"}}"#;
        assert!(classify_gemini_error(401, body).is_fatal());
    }
}
