//! Market snapshot updates

use axum::{extract::State, http::StatusCode, Json};

use crate::dto::{ApiError, MarketRequest, MarketResponse};
use crate::AppState;

/// PUT /market - Replace the market snapshot
pub async fn replace_market(
    State(state): State<AppState>,
    Json(request): Json<MarketRequest>,
) -> Result<Json<MarketResponse>, (StatusCode, Json<ApiError>)> {
    let tokens = request.tokens.len();
    let snapshot = request.into_snapshot().map_err(|e| {
        tracing::debug!(error = %e, "market rejected");
        (StatusCode::BAD_REQUEST, Json(ApiError::bad_request(e.to_string())))
    })?;

    let pools = snapshot.pool_count();
    state.set_market(snapshot).await;
    tracing::info!(pools, tokens, "market replaced");

    Ok(Json(MarketResponse { pools, tokens }))
}
