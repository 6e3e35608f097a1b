use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::Json;
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{bearer_token, require_caller};
use crate::error::AppError;
use crate::models::trip::{Trip, TripStatus};
use crate::state::AppState;
use crate::store::TripView;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/trips", post(create_trip).get(list_trips))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTripRequest {
    pub from_city: String,
    pub to_city: String,
    pub travel_date: NaiveDate,
}

async fn create_trip(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateTripRequest>,
) -> Result<Json<Trip>, AppError> {
    let caller = require_caller(&state, bearer_token(&headers)).await?;

    if payload.from_city.trim().is_empty() || payload.to_city.trim().is_empty() {
        return Err(AppError::Validation(
            "fromCity and toCity are required".to_string(),
        ));
    }

    let trip = Trip {
        id: Uuid::new_v4(),
        traveler_id: caller.id,
        from_city: payload.from_city.trim().to_string(),
        to_city: payload.to_city.trim().to_string(),
        travel_date: payload.travel_date,
        status: TripStatus::Active,
        created_at: Utc::now(),
    };

    state.store.insert_trip(trip.clone()).await?;

    tracing::info!(trip_id = %trip.id, traveler_id = %caller.id, "trip published");

    Ok(Json(trip))
}

async fn list_trips(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<TripView>>, AppError> {
    require_caller(&state, bearer_token(&headers)).await?;

    let trips = state.store.active_trips().await?;
    Ok(Json(trips))
}
