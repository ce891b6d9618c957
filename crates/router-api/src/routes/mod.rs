//! API route handlers

pub mod health;
pub mod market;
pub mod route;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/market", put(market::replace_market))
        .route("/route", post(route::find_route))
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
        Router,
    };
    use router_core::RouterConfig;
    use tower::ServiceExt;

    use crate::AppState;

    pub fn app() -> Router {
        super::create_router(AppState::new(RouterConfig::default()).unwrap())
    }

    pub async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(json) => request.body(Body::from(json.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, json)
    }

    pub fn two_pool_market() -> serde_json::Value {
        serde_json::json!({
            "tokens": [{"id": "a", "decimals": 0}, {"id": "b", "decimals": 0}, {"id": "c", "decimals": 0}],
            "prices": {"a": 1.0, "b": 1.0, "c": 1.0},
            "pools": [
                {"type": "constant_product", "address": "pool-ab-1", "token_x": "a",
                 "reserve_x": "10", "token_y": "b", "reserve_y": "10"},
                {"type": "constant_product", "address": "pool-ab-2", "token_x": "a",
                 "reserve_x": "20", "token_y": "b", "reserve_y": "20"}
            ]
        })
    }
}
