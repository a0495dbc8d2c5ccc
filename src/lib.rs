//! Changeguard Library
//!
//! Core components for LLM-assisted change risk assessment.

pub mod assessment;
pub mod backend;
pub mod config;
pub mod orchestrator;
pub mod tools;
pub mod web;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A planned IT infrastructure change submitted for risk evaluation.
///
/// Immutable once received; every field is echoed into the query the
/// reasoning agent sees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRequest {
    /// Opaque identifier, echoed back verbatim in the assessment
    pub change_id: String,
    /// Free-text description of the change
    pub description: String,
    /// System names touched by the change; may be empty
    pub affected_systems: Vec<String>,
    /// Planned date, display-only (not validated beyond presence)
    pub implementation_date: String,
    /// Number of teams involved
    pub teams_involved: u32,
    pub has_rollback_plan: bool,
    pub testing_completed: bool,
    pub service_outage_required: bool,
    /// Only meaningful when an outage is required
    #[serde(default)]
    pub outage_duration_minutes: u32,
}

/// Risk banding derived from the numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Moderate => write!(f, "MODERATE"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Structured result of assessing one change request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub change_id: String,
    pub risk_level: RiskLevel,
    /// Integer score in [0, 100], enforced at construction
    pub risk_score: u8,
    /// Qualitative labels keyed by factor name (complexity,
    /// testing_coverage, historical_pattern, service_impact)
    pub risk_factors: BTreeMap<String, String>,
    /// Ordered by rule evaluation, not severity
    pub recommendations: Vec<String>,
    pub approval_required: bool,
}

impl RiskAssessment {
    /// Build an assessment, rejecting scores outside [0, 100].
    pub fn new(
        change_id: String,
        risk_level: RiskLevel,
        risk_score: u8,
        risk_factors: BTreeMap<String, String>,
        recommendations: Vec<String>,
        approval_required: bool,
    ) -> Result<Self, ValidationError> {
        if risk_score > 100 {
            return Err(ValidationError::ScoreOutOfRange(risk_score.into()));
        }
        Ok(Self {
            change_id,
            risk_level,
            risk_score,
            risk_factors,
            recommendations,
            approval_required,
        })
    }
}

/// Schema-level validation failures.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("risk score {0} outside valid range 0-100")]
    ScoreOutOfRange(u32),
}
