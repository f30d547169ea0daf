use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::response::AppError;
use crate::state::AppState;
use crate::workers::risk_compute;

#[derive(Debug, Deserialize)]
pub struct ComputeRiskRequest {
    org_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ComputeRiskResponse {
    ok: bool,
    updated: i64,
}

/// On-demand risk recomputation for one org.
pub async fn compute(
    State(state): State<AppState>,
    Json(body): Json<ComputeRiskRequest>,
) -> Result<Json<ComputeRiskResponse>, AppError> {
    let org_id = match body.org_id.as_deref() {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => return Err(AppError::missing_field("org_id")),
    };

    let Some(db) = state.db_proxy() else {
        return Err(AppError::service_unavailable("Database not available"));
    };

    let stats = risk_compute::compute_org_risk(db.pool(), &org_id)
        .await
        .map_err(|e| AppError::internal(e.to_string()))?;

    Ok(Json(ComputeRiskResponse {
        ok: true,
        updated: stats.students_processed,
    }))
}
