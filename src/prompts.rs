//! Instruction templates for the four analysis modes.
//!
//! Each mode maps to exactly one fixed instruction. The match-percentage
//! instruction asks the model to open with "Overall Match: N%", which
//! [`crate::pipeline::interpret::extract_score`] relies on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Instruction for [`AnalysisMode::Comprehensive`].
pub const COMPREHENSIVE_PROMPT: &str = r#"You are an experienced Technical Human Resource Manager with expertise in resume screening.
Please analyze the provided resume against the job description and provide a comprehensive evaluation.

Structure your response as follows:
1. Summary of the candidate's profile (2-3 sentences)
2. Key strengths that align with the job description (bullet points)
3. Notable gaps or weaknesses compared to requirements (bullet points)
4. Overall alignment assessment
5. Recommendations for the hiring manager

Use professional HR terminology and be objective in your assessment."#;

/// Instruction for [`AnalysisMode::MissingKeywords`].
pub const MISSING_KEYWORDS_PROMPT: &str = r#"You are an ATS expert specializing in keyword optimization.
Analyze the resume against the job description and identify:

1. Important keywords from the job description that are missing in the resume
2. Technical skills mentioned in the job that aren't reflected in the resume
3. Recommended phrases to add to improve ATS ranking

Format your response as a structured list of missing keywords by category (technical skills, soft skills, experience, etc.)"#;

/// Instruction for [`AnalysisMode::MatchPercentage`].
///
/// Must keep asking for a leading "Overall Match: N%" line:
/// [`crate::pipeline::interpret::extract_score`] takes the first percentage
/// it finds.
pub const MATCH_PERCENTAGE_PROMPT: &str = r#"You are an advanced ATS (Applicant Tracking System) with deep understanding of hiring algorithms.
Evaluate the resume against the job description and provide:

1. An overall match percentage (from 0-100%)
2. Category-specific scores for: Skills Match, Experience Match, Education Match
3. The most critical missing keywords
4. A brief explanation of the score

Start your response with the overall percentage match prominently displayed, before any other number. Example: "Overall Match: 85%""#;

/// Instruction for [`AnalysisMode::Improvement`].
pub const IMPROVEMENT_PROMPT: &str = r#"You are a resume optimization consultant with expertise in ATS systems.
Analyze the resume against the job description and provide actionable suggestions on:

1. Specific content improvements (what to add, remove, or emphasize)
2. Section organization recommendations
3. How to better align achievements with job requirements
4. Language optimization for ATS scanning

Focus on practical, specific advice the candidate can implement immediately."#;

/// One of the four fixed analyses a user can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    Comprehensive,
    MissingKeywords,
    MatchPercentage,
    Improvement,
}

impl AnalysisMode {
    /// Every mode, in menu order.
    pub const ALL: [AnalysisMode; 4] = [
        AnalysisMode::Comprehensive,
        AnalysisMode::MissingKeywords,
        AnalysisMode::MatchPercentage,
        AnalysisMode::Improvement,
    ];

    /// The instruction sent to the model for this mode.
    pub fn instruction(self) -> &'static str {
        match self {
            AnalysisMode::Comprehensive => COMPREHENSIVE_PROMPT,
            AnalysisMode::MissingKeywords => MISSING_KEYWORDS_PROMPT,
            AnalysisMode::MatchPercentage => MATCH_PERCENTAGE_PROMPT,
            AnalysisMode::Improvement => IMPROVEMENT_PROMPT,
        }
    }

    /// Selector string, e.g. `match_percentage`.
    pub fn selector(self) -> &'static str {
        match self {
            AnalysisMode::Comprehensive => "comprehensive",
            AnalysisMode::MissingKeywords => "missing_keywords",
            AnalysisMode::MatchPercentage => "match_percentage",
            AnalysisMode::Improvement => "improvement",
        }
    }

    /// Human-readable heading for results.
    pub fn title(self) -> &'static str {
        match self {
            AnalysisMode::Comprehensive => "Comprehensive Analysis",
            AnalysisMode::MissingKeywords => "Missing Keywords Analysis",
            AnalysisMode::MatchPercentage => "Match Percentage",
            AnalysisMode::Improvement => "Improvement Suggestions",
        }
    }

    /// Whether the response should be scanned for a match score.
    pub fn extracts_score(self) -> bool {
        self == AnalysisMode::MatchPercentage
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}

impl FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_lowercase().replace('-', "_");
        AnalysisMode::ALL
            .into_iter()
            .find(|m| m.selector() == normalised)
            .ok_or_else(|| {
                format!(
                    "unknown analysis mode '{s}' (expected one of: comprehensive, missing_keywords, match_percentage, improvement)"
                )
            })
    }
}
