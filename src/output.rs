//! Result types returned by the analyzer.

use crate::pipeline::interpret::MatchBand;
use crate::prompts::AnalysisMode;
use serde::{Deserialize, Serialize};

/// Outcome of one analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// The analysis that was run.
    pub mode: AnalysisMode,

    /// Model output, verbatim.
    pub text: String,

    /// Match score in 0–100. Only ever set for
    /// [`AnalysisMode::MatchPercentage`], and only when the text contains a
    /// recognisable percentage.
    pub score: Option<u8>,

    /// Band derived from `score`.
    pub band: Option<MatchBand>,

    pub stats: AnalysisStats,
}

impl AnalysisResult {
    /// `true` when match-percentage mode ran but no score could be found.
    pub fn score_missing(&self) -> bool {
        self.mode.extracts_score() && self.score.is_none()
    }
}

/// Timing for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Name of the backend that produced the text (e.g. `gemini`).
    pub provider: String,
    /// Time spent rendering and encoding page 1.
    pub render_duration_ms: u64,
    /// Time spent waiting for the model.
    pub llm_duration_ms: u64,
    /// Wall-clock time for the whole request.
    pub total_duration_ms: u64,
}
