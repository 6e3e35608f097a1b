use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{bearer_token, require_caller};
use crate::error::AppError;
use crate::escrow::otp;
use crate::models::delivery::{Delivery, DeliveryStatus, EscrowStatus};
use crate::models::trip::TripStatus;
use crate::state::AppState;
use crate::store::StatusUpdate;

/// Fixed platform cut added on top of the delivery price, in rupees.
const PLATFORM_FEE_RUPEES: i64 = 20;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/deliveries", post(book_delivery))
        .route("/api/deliveries/:id", get(get_delivery))
        .route("/api/deliveries/:id/status", patch(advance_status))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDeliveryRequest {
    pub trip_id: Uuid,
    pub item_type: String,
    pub price: Decimal,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDeliveryResponse {
    pub delivery: Delivery,
    /// Returned once at booking; the record never serializes it again. The
    /// sender shares it with the receiver out of band.
    pub delivery_otp: String,
}

#[derive(Deserialize)]
pub struct AdvanceStatusRequest {
    pub status: DeliveryStatus,
}

async fn book_delivery(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<BookDeliveryRequest>,
) -> Result<Json<BookDeliveryResponse>, AppError> {
    let caller = require_caller(&state, bearer_token(&headers)).await?;

    if payload.item_type.trim().is_empty() {
        return Err(AppError::Validation("itemType cannot be empty".to_string()));
    }

    if payload.price <= Decimal::ZERO {
        return Err(AppError::Validation("price must be positive".to_string()));
    }

    let trip = state
        .store
        .trip(payload.trip_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

    if trip.status != TripStatus::Active {
        return Err(AppError::Conflict(
            "Trip is no longer accepting deliveries.".to_string(),
        ));
    }

    if trip.traveler_id == caller.id {
        return Err(AppError::Forbidden);
    }

    let now = Utc::now();
    let delivery = Delivery {
        id: Uuid::new_v4(),
        sender_id: caller.id,
        trip_id: trip.id,
        item_type: payload.item_type.trim().to_string(),
        price: payload.price,
        platform_fee: Decimal::new(PLATFORM_FEE_RUPEES, 0),
        status: DeliveryStatus::Pending,
        escrow_status: EscrowStatus::Unset,
        delivery_otp: otp::generate(),
        razorpay_order_id: None,
        razorpay_payment_id: None,
        otp_verified_at: None,
        created_at: now,
        updated_at: now,
    };

    state.store.insert_delivery(delivery.clone()).await?;

    tracing::info!(
        delivery_id = %delivery.id,
        trip_id = %trip.id,
        sender_id = %caller.id,
        "delivery booked"
    );

    let delivery_otp = delivery.delivery_otp.clone();
    Ok(Json(BookDeliveryResponse {
        delivery,
        delivery_otp,
    }))
}

async fn get_delivery(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Delivery>, AppError> {
    let caller = require_caller(&state, bearer_token(&headers)).await?;

    let view = state
        .store
        .delivery_for_release(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Delivery not found".to_string()))?;

    if view.delivery.sender_id != caller.id && view.traveler_id != caller.id {
        return Err(AppError::Forbidden);
    }

    Ok(Json(view.delivery))
}

async fn advance_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdvanceStatusRequest>,
) -> Result<Json<Delivery>, AppError> {
    let caller = require_caller(&state, bearer_token(&headers)).await?;

    let view = state
        .store
        .delivery_for_release(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Delivery not found".to_string()))?;

    if view.traveler_id != caller.id {
        return Err(AppError::Forbidden);
    }

    if payload.status == DeliveryStatus::Delivered {
        return Err(AppError::Validation(
            "delivered is set by escrow release, not by status updates".to_string(),
        ));
    }

    match state.store.advance_status(id, payload.status).await? {
        StatusUpdate::Applied(delivery) => {
            tracing::info!(delivery_id = %id, status = ?delivery.status, "delivery milestone advanced");
            Ok(Json(delivery))
        }
        StatusUpdate::InvalidTransition(_) => Err(AppError::Conflict(
            "delivery status can only move forward".to_string(),
        )),
        StatusUpdate::NotFound => Err(AppError::NotFound("Delivery not found".to_string())),
    }
}
