//! Deterministic assessment assembly
//!
//! Everything except the score comes from fixed rules over the original
//! request, so the result is stable however the model phrases its analysis.

use std::collections::BTreeMap;

use crate::{ChangeRequest, RiskAssessment, RiskLevel, ValidationError};

/// Threshold at which a change needs explicit approval.
const APPROVAL_THRESHOLD: u8 = 50;

/// Band the score into a risk level. Half-open bands: 25 is already
/// MODERATE, 50 already HIGH, 75 already CRITICAL.
pub fn risk_level_for(score: u8) -> RiskLevel {
    if score < 25 {
        RiskLevel::Low
    } else if score < 50 {
        RiskLevel::Moderate
    } else if score < 75 {
        RiskLevel::High
    } else {
        RiskLevel::Critical
    }
}

fn risk_factors(change: &ChangeRequest) -> BTreeMap<String, String> {
    let mut factors = BTreeMap::new();
    factors.insert(
        "complexity".to_string(),
        if change.teams_involved > 2 { "moderate" } else { "low" }.to_string(),
    );
    factors.insert(
        "testing_coverage".to_string(),
        if change.testing_completed { "adequate" } else { "insufficient" }.to_string(),
    );
    factors.insert("historical_pattern".to_string(), "favorable".to_string());
    factors.insert(
        "service_impact".to_string(),
        if change.service_outage_required { "high" } else { "low" }.to_string(),
    );
    factors
}

/// Rule order is part of the contract: conditional items first, the
/// monitoring item always last.
fn recommendations(change: &ChangeRequest) -> Vec<String> {
    let mut recommendations = Vec::new();
    if !change.testing_completed {
        recommendations.push("Complete comprehensive testing before implementation".to_string());
    }
    if !change.has_rollback_plan {
        recommendations.push("Develop and validate rollback procedure".to_string());
    }
    if change.service_outage_required {
        recommendations.push("Schedule during off-peak hours (2-6 AM IST)".to_string());
    }
    if change.teams_involved > 3 {
        recommendations.push("Conduct pre-implementation coordination meeting".to_string());
    }
    recommendations.push("Monitor key metrics for 24 hours post-deployment".to_string());
    recommendations
}

/// Build the complete assessment for an extracted score.
pub fn assemble(score: u32, change: &ChangeRequest) -> Result<RiskAssessment, ValidationError> {
    if score > 100 {
        return Err(ValidationError::ScoreOutOfRange(score));
    }
    let score = score as u8;

    RiskAssessment::new(
        change.change_id.clone(),
        risk_level_for(score),
        score,
        risk_factors(change),
        recommendations(change),
        score > APPROVAL_THRESHOLD,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change() -> ChangeRequest {
        ChangeRequest {
            change_id: "CHG-007".to_string(),
            description: "Swap load balancer".to_string(),
            affected_systems: vec!["lb".to_string()],
            implementation_date: "2026-08-15".to_string(),
            teams_involved: 1,
            has_rollback_plan: true,
            testing_completed: true,
            service_outage_required: false,
            outage_duration_minutes: 0,
        }
    }

    #[test]
    fn test_band_boundaries_are_half_open() {
        assert_eq!(risk_level_for(0), RiskLevel::Low);
        assert_eq!(risk_level_for(24), RiskLevel::Low);
        assert_eq!(risk_level_for(25), RiskLevel::Moderate);
        assert_eq!(risk_level_for(49), RiskLevel::Moderate);
        assert_eq!(risk_level_for(50), RiskLevel::High);
        assert_eq!(risk_level_for(74), RiskLevel::High);
        assert_eq!(risk_level_for(75), RiskLevel::Critical);
        assert_eq!(risk_level_for(100), RiskLevel::Critical);
    }

    #[test]
    fn test_approval_exactly_above_fifty() {
        assert!(!assemble(50, &change()).unwrap().approval_required);
        assert!(assemble(51, &change()).unwrap().approval_required);
        assert!(!assemble(0, &change()).unwrap().approval_required);
        assert!(assemble(100, &change()).unwrap().approval_required);
    }

    #[test]
    fn test_score_out_of_range_rejected() {
        assert!(assemble(101, &change()).is_err());
        assert!(assemble(u32::MAX, &change()).is_err());
    }

    #[test]
    fn test_factor_rules() {
        let mut risky = change();
        risky.teams_involved = 3;
        risky.testing_completed = false;
        risky.service_outage_required = true;

        let factors = risk_factors(&risky);
        assert_eq!(factors["complexity"], "moderate");
        assert_eq!(factors["testing_coverage"], "insufficient");
        assert_eq!(factors["historical_pattern"], "favorable");
        assert_eq!(factors["service_impact"], "high");

        let calm = risk_factors(&change());
        assert_eq!(calm["complexity"], "low");
        assert_eq!(calm["testing_coverage"], "adequate");
        assert_eq!(calm["service_impact"], "low");
    }

    #[test]
    fn test_two_teams_is_still_low_complexity() {
        let mut c = change();
        c.teams_involved = 2;
        assert_eq!(risk_factors(&c)["complexity"], "low");
    }

    #[test]
    fn test_all_recommendation_rules_fire_in_order() {
        let mut c = change();
        c.testing_completed = false;
        c.has_rollback_plan = false;
        c.service_outage_required = true;
        c.teams_involved = 5;

        let recs = recommendations(&c);
        assert_eq!(recs.len(), 5);
        assert!(recs[0].contains("testing"));
        assert!(recs[1].contains("rollback"));
        assert!(recs[2].contains("off-peak"));
        assert!(recs[3].contains("coordination meeting"));
        assert!(recs[4].contains("Monitor"));
    }

    #[test]
    fn test_quiet_change_gets_only_monitoring() {
        let recs = recommendations(&change());
        assert_eq!(
            recs,
            vec!["Monitor key metrics for 24 hours post-deployment".to_string()]
        );
    }

    #[test]
    fn test_four_teams_triggers_coordination() {
        let mut c = change();
        c.teams_involved = 4;
        let recs = recommendations(&c);
        assert_eq!(recs.len(), 2);
        assert!(recs[0].contains("coordination meeting"));
    }

    #[test]
    fn test_assemble_is_idempotent() {
        let c = change();
        let a = assemble(63, &c).unwrap();
        let b = assemble(63, &c).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
