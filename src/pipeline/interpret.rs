//! Result interpretation: pull a match score out of free-form model text and
//! classify it.
//!
//! The model is asked to open with "Overall Match: N%", but nothing forces it
//! to. Extraction is therefore a plain pattern search: the **first**
//! substring of one to three ASCII digits followed by `%` is taken as the score.
//! An unrelated percentage that appears earlier in the text wins over the
//! real score; that tie-break is kept deliberately simple and predictable.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static RE_PERCENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]{1,3})%").unwrap());

/// Extract the first percentage in `text` as a 0–100 score.
///
/// Returns `None` when no percentage is present, or when the first one found
/// exceeds 100 (it is not a valid score, and later matches are not
/// consulted).
///
/// ```rust
/// use ats_analyzer::pipeline::interpret::extract_score;
///
/// assert_eq!(extract_score("Overall Match: 85%"), Some(85));
/// assert_eq!(extract_score("Skills: 3, Match: 72%"), Some(72));
/// assert_eq!(extract_score("no numbers here"), None);
/// ```
pub fn extract_score(text: &str) -> Option<u8> {
    let caps = RE_PERCENT.captures(text)?;
    let value: u16 = caps[1].parse().ok()?;
    u8::try_from(value).ok().filter(|v| *v <= 100)
}

/// Qualitative band for a match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchBand {
    /// 80 and above.
    Strong,
    /// 60 to 79.
    Good,
    /// Below 60.
    SignificantGaps,
}

impl MatchBand {
    /// Classify a score. Boundaries are inclusive at 80 and 60.
    pub fn classify(score: u8) -> Self {
        match score {
            80.. => MatchBand::Strong,
            60..=79 => MatchBand::Good,
            _ => MatchBand::SignificantGaps,
        }
    }

    /// Short label, e.g. for a metric widget.
    pub fn label(self) -> &'static str {
        match self {
            MatchBand::Strong => "strong match",
            MatchBand::Good => "good match, room for improvement",
            MatchBand::SignificantGaps => "significant gaps",
        }
    }

    /// Sentence shown next to the score.
    pub fn message(self) -> &'static str {
        match self {
            MatchBand::Strong => "Strong match! Your resume is well-aligned.",
            MatchBand::Good => "Good match. There's room for improvement.",
            MatchBand::SignificantGaps => "Significant gaps found. Review suggestions carefully.",
        }
    }
}

impl fmt::Display for MatchBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
