//! Risk score extraction
//!
//! Deliberately crude single-pattern scan: the agent is instructed to state
//! the score as `<n>/100` or `Score: <n>`, and nothing else in the text is
//! trusted as a score. No match means "uncertain", reported as the midpoint.

use std::sync::OnceLock;

use regex::Regex;

/// Score reported when the answer contains no recognizable pattern.
pub const DEFAULT_SCORE: u32 = 50;

static SCORE_RE: OnceLock<Regex> = OnceLock::new();

fn score_regex() -> &'static Regex {
    SCORE_RE.get_or_init(|| {
        Regex::new(r"(?i)(\d+)/100|score:\s*(\d+)").expect("score pattern is valid")
    })
}

/// Find the first score pattern in the answer text. Values the model
/// overshoots past 100 are returned as-is and rejected at assembly.
pub fn extract_risk_score(text: &str) -> u32 {
    let Some(caps) = score_regex().captures(text) else {
        return DEFAULT_SCORE;
    };
    let digits = caps
        .get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str())
        .unwrap_or_default();
    // Absurd digit runs overflow u32; keep them fatal downstream.
    digits.parse::<u32>().unwrap_or(u32::MAX)
}
