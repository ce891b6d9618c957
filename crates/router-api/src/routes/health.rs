//! Health check endpoint

use axum::{extract::State, Json};

use crate::dto::HealthResponse;
use crate::AppState;

/// GET /health - Engine strategy and the size of the loaded market
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let market = state.market().await;
    Json(HealthResponse::new(
        state.engine().strategy_name(),
        &market,
        state.config().quote_timeout_ms,
    ))
}
