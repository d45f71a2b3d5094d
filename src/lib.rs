//! # ats-analyzer
//!
//! Score a PDF resume against a job description with a multimodal model.
//!
//! The resume is never text-extracted. Page 1 is rasterised to a PNG and sent
//! to the model as an image, together with a fixed instruction for the chosen
//! analysis and the job description. Layout, columns and emphasis therefore
//! reach the model the way a recruiter would see them.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      local file or URL, `%PDF` magic check
//!  ├─ 2. Render     page 1 via pdfium (spawn_blocking, render timeout)
//!  ├─ 3. Encode     PNG → base64 inline image part
//!  ├─ 4. Model      Gemini (default) or any edgequake-llm provider (api timeout)
//!  └─ 5. Interpret  first "N%" → score → band (match-percentage mode only)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ats_analyzer::{AnalysisMode, Analyzer, AnalyzerConfig, UploadedDocument};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // GOOGLE_API_KEY (or GEMINI_API_KEY) must be set
//!     let analyzer = Analyzer::new(AnalyzerConfig::from_env())?;
//!     let resume = UploadedDocument::from_bytes(std::fs::read("resume.pdf")?);
//!     let result = analyzer
//!         .analyze(
//!             AnalysisMode::MatchPercentage,
//!             Some(&resume),
//!             "Backend engineer: Rust, Kubernetes, PostgreSQL",
//!         )
//!         .await?;
//!     if let (Some(score), Some(band)) = (result.score, result.band) {
//!         println!("{score}% ({band})");
//!     }
//!     println!("{}", result.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ats-analyzer` binary (clap + anyhow + tracing-subscriber) |
//!
//! ## Analysis Modes
//!
//! | Mode | Selector | Score |
//! |------|----------|-------|
//! | Comprehensive Analysis    | `comprehensive`    | no  |
//! | Missing Keywords Analysis | `missing_keywords` | no  |
//! | Match Percentage          | `match_percentage` | yes |
//! | Improvement Suggestions   | `improvement`      | no  |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod export;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze_resume, Analyzer};
pub use config::{AnalyzerConfig, AnalyzerConfigBuilder};
pub use error::{AnalyzerError, ErrorKind};
pub use export::{export_file_name, export_result};
pub use output::{AnalysisResult, AnalysisStats};
pub use pipeline::encode::EncodedImagePart;
pub use pipeline::input::UploadedDocument;
pub use pipeline::interpret::{extract_score, MatchBand};
pub use pipeline::llm::{AnalysisClient, AnalysisRequest, GeminiClient, ProviderClient};
pub use pipeline::render::{DocumentRenderer, PdfiumRenderer};
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use prompts::AnalysisMode;
