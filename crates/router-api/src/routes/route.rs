//! Route search endpoint

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, Json};
use finder::{RouteSummary, SearchBudget};
use router_core::FinderError;

use crate::dto::{ApiError, RouteRequest, RouteResponse};
use crate::AppState;

/// Slack between the search deadline and abandoning the worker
const TIMEOUT_GRACE: Duration = Duration::from_millis(250);

fn finder_error(err: FinderError) -> (StatusCode, Json<ApiError>) {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ApiError::new(err.error_code(), err.to_string())))
}

/// POST /route - Find the best route on the current market
pub async fn find_route(
    State(state): State<AppState>,
    Json(request): Json<RouteRequest>,
) -> Result<Json<RouteResponse>, (StatusCode, Json<ApiError>)> {
    let input = request
        .to_input()
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(ApiError::bad_request(e.to_string()))))?;

    let timeout = Duration::from_millis(state.config().quote_timeout_ms);
    let cancelled = Arc::new(AtomicBool::new(false));
    let input = input.with_budget(SearchBudget::with_timeout(timeout).with_cancel_flag(cancelled.clone()));
    let market = state.market().await;

    let worker = state.clone();
    let search = tokio::task::spawn_blocking(move || {
        worker
            .engine()
            .find_route(&input, market)
            .map(|route| RouteSummary::from(&route))
    });

    let summary = match tokio::time::timeout(timeout + TIMEOUT_GRACE, search).await {
        Ok(Ok(result)) => result.map_err(finder_error)?,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "route search panicked");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::internal("route search failed")),
            ));
        }
        Err(_) => {
            cancelled.store(true, Ordering::Relaxed);
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "route search timed out");
            return Err(finder_error(FinderError::Cancelled));
        }
    };

    Ok(Json(RouteResponse {
        strategy: state.engine().strategy_name().to_string(),
        route: summary,
    }))
}
