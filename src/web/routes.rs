//! REST API routes

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use super::AppState;
use crate::assessment::build_assessment;
use crate::orchestrator::OrchestratorError;
use crate::{ChangeRequest, RiskAssessment};

/// Structured error body for fatal per-request failures.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub timestamp: chrono::DateTime<Utc>,
}

fn fatal(code: &str, message: String) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: message,
            code: code.to_string(),
            timestamp: Utc::now(),
        }),
    )
}

/// Render every request field into the natural-language query the agent
/// sees. The wording is stable; only the information content matters.
pub fn render_change_query(change: &ChangeRequest) -> String {
    let outage = if change.service_outage_required {
        format!("Required ({} min)", change.outage_duration_minutes)
    } else {
        "Not Required".to_string()
    };

    format!(
        "Analyze this IT change request comprehensively:\n\
         \n\
         CHANGE DETAILS:\n\
         - Change ID: {}\n\
         - Description: {}\n\
         - Affected Systems: {}\n\
         - Implementation Date: {}\n\
         \n\
         CHANGE ATTRIBUTES:\n\
         - Teams Involved: {}\n\
         - Testing Status: {}\n\
         - Rollback Plan: {}\n\
         - Service Outage: {}\n\
         \n\
         Provide a thorough risk assessment.",
        change.change_id,
        change.description,
        change.affected_systems.join(", "),
        change.implementation_date,
        change.teams_involved,
        if change.testing_completed {
            "✓ Completed"
        } else {
            "✗ Not Completed"
        },
        if change.has_rollback_plan {
            "✓ Available"
        } else {
            "✗ Missing"
        },
        outage,
    )
}

/// Assess one change request end to end.
pub async fn analyze_change(
    State(state): State<Arc<AppState>>,
    Json(change): Json<ChangeRequest>,
) -> Result<Json<RiskAssessment>, (StatusCode, Json<ErrorResponse>)> {
    let request_id = Uuid::new_v4();
    info!(%request_id, change_id = %change.change_id, "Analyzing change request");

    let query = render_change_query(&change);
    let orchestrator = Arc::clone(&state.orchestrator);

    // Run the reasoning loop as its own task so its backend round-trips
    // never pin the request-accepting context.
    let mut run = tokio::spawn(async move { orchestrator.run(&query).await });

    let answer = match tokio::time::timeout(state.request_timeout, &mut run).await {
        Err(_) => {
            run.abort();
            error!(%request_id, change_id = %change.change_id, "Assessment timed out");
            return Err(fatal(
                "REQUEST_TIMEOUT",
                format!(
                    "assessment did not complete within {}s",
                    state.request_timeout.as_secs()
                ),
            ));
        }
        Ok(Err(join_err)) => {
            error!(%request_id, error = %join_err, "Assessment task died");
            return Err(fatal("INTERNAL_ERROR", join_err.to_string()));
        }
        Ok(Ok(Err(e))) => {
            error!(%request_id, change_id = %change.change_id, error = %e, "Reasoning failed");
            let code = match &e {
                OrchestratorError::RoundLimitExceeded(_) => "ROUND_LIMIT_EXCEEDED",
                OrchestratorError::Backend(_) => "BACKEND_ERROR",
            };
            return Err(fatal(code, e.to_string()));
        }
        Ok(Ok(Ok(text))) => text,
    };

    let assessment = build_assessment(&change, &answer).map_err(|e| {
        error!(%request_id, change_id = %change.change_id, error = %e, "Assembly failed");
        fatal("VALIDATION_ERROR", e.to_string())
    })?;

    info!(
        %request_id,
        change_id = %change.change_id,
        score = assessment.risk_score,
        level = %assessment.risk_level,
        "Assessment complete"
    );
    Ok(Json(assessment))
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model: String,
    pub framework: String,
    pub uptime_seconds: u64,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let uptime = Utc::now()
        .signed_duration_since(state.started_at)
        .num_seconds()
        .max(0) as u64;

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.orchestrator.model().to_string(),
        framework: "axum + reqwest".to_string(),
        uptime_seconds: uptime,
    })
}
