//! Assessment post-processing
//!
//! Turns the reasoning agent's free-text answer back into a structured
//! `RiskAssessment`: score extraction from the text, then fully
//! deterministic assembly from the score and the original request.

pub mod assemble;
pub mod extract;

pub use assemble::assemble;
pub use extract::extract_risk_score;

use crate::{ChangeRequest, RiskAssessment, ValidationError};

/// Full post-processing step: extract the score from the answer text and
/// assemble the assessment. The model's phrasing is never consulted beyond
/// the score pattern.
pub fn build_assessment(
    change: &ChangeRequest,
    answer: &str,
) -> Result<RiskAssessment, ValidationError> {
    let score = extract_risk_score(answer);
    assemble(score, change)
}
