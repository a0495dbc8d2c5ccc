//! The four built-in lookup tools
//!
//! These stand in for a change-history database, a CMDB, a scheduling
//! calendar and a weighted scoring service. The report text is canned but
//! the interface contract (name, description, single string argument) is
//! what the reasoning agent depends on.

use anyhow::Result;

use super::{LookupTool, ToolRegistry};

fn query_historical_changes(_query: &str) -> Result<String> {
    Ok("Found 8 similar changes in the last 6 months:\n\
        - 6 successful (75% success rate)\n\
        - 2 failed due to insufficient testing\n\
        - Average complexity score: 3.2/5\n\
        - Most common risk: database schema changes"
        .to_string())
}

fn check_configuration_items(systems: &str) -> Result<String> {
    Ok(format!(
        "Systems: {systems}\n\
         Dependencies found:\n\
         - 4 downstream services will be affected\n\
         - 2 are production-critical systems\n\
         - Estimated blast radius: 250 users\n\
         - Recovery Time Objective (RTO): 2 hours"
    ))
}

fn detect_conflicts(implementation_date: &str) -> Result<String> {
    Ok(format!(
        "Date analysis for {implementation_date}:\n\
         - No conflicting changes scheduled\n\
         - Outside of monthly blackout period\n\
         - Maintenance window available: 2 AM - 6 AM IST\n\
         - Business impact window: LOW"
    ))
}

fn calculate_risk_score(_change_data: &str) -> Result<String> {
    Ok("Risk Score Calculation:\n\
        - Complexity: 15/25 (moderate)\n\
        - Testing: 20/25 (adequate)\n\
        - Historical: 15/20 (good track record)\n\
        - Impact: 18/25 (significant but manageable)\n\
        - Rollback: 8/10 (plan exists)\n\
        Total Score: 76/100 (HIGH RISK)"
        .to_string())
}

/// Registry with the four standard lookup tools.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(LookupTool::new(
        "query_historical_changes",
        "Query historical change records to find similar past changes and their \
         success rates. Returns data about similar changes, their outcomes, and patterns.",
        "query",
        query_historical_changes,
    ));
    registry.register(LookupTool::new(
        "check_configuration_items",
        "Check the Configuration Management Database for affected systems and their \
         dependencies. Returns dependent services, criticality, and downstream impacts.",
        "systems",
        check_configuration_items,
    ));
    registry.register(LookupTool::new(
        "detect_conflicts",
        "Detect scheduling conflicts with other planned changes or maintenance \
         windows. Returns overlapping changes and blackout periods for the date.",
        "implementation_date",
        detect_conflicts,
    ));
    registry.register(LookupTool::new(
        "calculate_risk_score",
        "Calculate a numerical risk score based on multiple weighted factors. \
         Returns a detailed scoring breakdown and justification.",
        "change_data",
        calculate_risk_score,
    ));
    registry
}
