use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::Json;
use axum::Router;

use crate::auth::bearer_token;
use crate::error::AppError;
use crate::escrow::orchestrator::{
    self, CreateEscrowRequest, CreateEscrowResponse, ReleaseEscrowRequest, ReleaseEscrowResponse,
};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/payments/create-escrow", post(create_escrow))
        .route("/api/payments/release-escrow", post(release_escrow))
}

async fn create_escrow(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateEscrowRequest>,
) -> Result<Json<CreateEscrowResponse>, AppError> {
    let start = Instant::now();
    let result = orchestrator::create_escrow(&state, bearer_token(&headers), payload).await;
    record(&state, "create_escrow", start, result.is_ok());

    if result.is_ok() {
        state.metrics.escrow_held_current.inc();
    }

    result.map(Json)
}

async fn release_escrow(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ReleaseEscrowRequest>,
) -> Result<Json<ReleaseEscrowResponse>, AppError> {
    let start = Instant::now();
    let result = orchestrator::release_escrow(&state, bearer_token(&headers), payload).await;
    record(&state, "release_escrow", start, result.is_ok());

    if let Ok(response) = &result {
        state.metrics.escrow_held_current.dec();
        state
            .metrics
            .payouts_minor_total
            .with_label_values(&["traveler"])
            .inc_by(response.transfer_intent.traveler.amount.max(0) as u64);
        state
            .metrics
            .payouts_minor_total
            .with_label_values(&["platform"])
            .inc_by(response.transfer_intent.platform.amount.max(0) as u64);
    }

    result.map(Json)
}

fn record(state: &AppState, operation: &str, start: Instant, success: bool) {
    let outcome = if success { "success" } else { "error" };

    state
        .metrics
        .escrow_operation_latency_seconds
        .with_label_values(&[operation])
        .observe(start.elapsed().as_secs_f64());
    state
        .metrics
        .escrow_operations_total
        .with_label_values(&[operation, outcome])
        .inc();
}
