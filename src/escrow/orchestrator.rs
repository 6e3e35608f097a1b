use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::require_caller;
use crate::error::AppError;
use crate::escrow::{otp, payout};
use crate::gateway::{OrderNotes, OrderRequest};
use crate::models::delivery::EscrowStatus;
use crate::state::AppState;
use crate::store::EscrowUpdate;

const CURRENCY: &str = "INR";
const ESCROW_PURPOSE: &str = "p2p_delivery_escrow";
const TRAVELER_PAYOUT_PURPOSE: &str = "delivery_payout";
const PLATFORM_FEE_PURPOSE: &str = "platform_fee";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEscrowRequest {
    pub delivery_id: Option<String>,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEscrowResponse {
    pub success: bool,
    pub order_id: String,
    /// Minor currency units, as held by the gateway.
    pub amount: i64,
    pub currency: String,
    /// Public key id for the hosted payment UI. The secret stays inside the
    /// gateway client.
    pub key_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseEscrowRequest {
    pub delivery_id: Option<String>,
    pub otp: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    pub total: Decimal,
    pub traveler_share: Decimal,
    pub platform_share: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TransferNotes {
    pub purpose: String,
    pub delivery_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct TransferLeg {
    pub account: String,
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    pub notes: TransferNotes,
}

/// Computed, not-yet-executed payout split for a downstream settlement
/// worker. Release is not financially complete until these transfers run.
#[derive(Debug, Serialize)]
pub struct TransferIntent {
    pub traveler: TransferLeg,
    pub platform: TransferLeg,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseEscrowResponse {
    pub success: bool,
    pub message: String,
    pub breakdown: Breakdown,
    pub transfer_intent: TransferIntent,
}

/// Funds the escrow for a delivery: requests a holding order from the
/// gateway and transitions `escrow_status: unset -> held`. Only the sender
/// who owns the delivery may call this.
pub async fn create_escrow(
    state: &AppState,
    token: Option<&str>,
    request: CreateEscrowRequest,
) -> Result<CreateEscrowResponse, AppError> {
    let delivery_id = request
        .delivery_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("deliveryId and amount are required".to_string()))?;
    let amount = request
        .amount
        .ok_or_else(|| AppError::Validation("deliveryId and amount are required".to_string()))?;

    if amount <= Decimal::ZERO {
        return Err(AppError::Validation("amount must be positive".to_string()));
    }

    let caller = require_caller(state, token).await?;

    let delivery_id = parse_delivery_id(&delivery_id)?;
    let delivery = state
        .store
        .delivery(delivery_id)
        .await?
        .ok_or_else(delivery_not_found)?;

    if delivery.sender_id != caller.id {
        return Err(AppError::Forbidden);
    }

    if delivery.escrow_status != EscrowStatus::Unset {
        return Err(escrow_already_created());
    }

    let amount_minor = payout::to_minor_units(amount)
        .ok_or_else(|| AppError::Internal("amount out of range".to_string()))?;

    let order = state
        .gateway
        .create_order(&OrderRequest {
            amount: amount_minor,
            currency: CURRENCY.to_string(),
            receipt: format!("routedrop_{delivery_id}"),
            notes: OrderNotes {
                delivery_id,
                sender_id: caller.id,
                purpose: ESCROW_PURPOSE.to_string(),
            },
        })
        .await?;
    let key_id = state.gateway.key_id()?;

    match state.store.hold_escrow(delivery_id, &order.id).await? {
        EscrowUpdate::Applied(_) => {
            info!(
                delivery_id = %delivery_id,
                order_id = %order.id,
                amount = order.amount,
                "escrow held"
            );

            Ok(CreateEscrowResponse {
                success: true,
                order_id: order.id,
                amount: order.amount,
                currency: order.currency,
                key_id,
            })
        }
        EscrowUpdate::InvalidState(status) => {
            // lost a race after the precondition check; the gateway order
            // stays unpaid and expires on its own
            warn!(
                delivery_id = %delivery_id,
                order_id = %order.id,
                escrow_status = ?status,
                "concurrent escrow hold rejected"
            );
            Err(escrow_already_created())
        }
        EscrowUpdate::NotFound => Err(delivery_not_found()),
    }
}

/// Releases the escrow after OTP confirmation: computes the 80/20 payout
/// split, transitions `escrow_status: held -> released`, and marks the
/// delivery delivered. Only the trip's traveler may call this.
pub async fn release_escrow(
    state: &AppState,
    token: Option<&str>,
    request: ReleaseEscrowRequest,
) -> Result<ReleaseEscrowResponse, AppError> {
    let delivery_id = request
        .delivery_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::Validation("deliveryId and otp are required".to_string()))?;
    let otp = request
        .otp
        .filter(|otp| !otp.is_empty())
        .ok_or_else(|| AppError::Validation("deliveryId and otp are required".to_string()))?;

    if !otp::is_well_formed(&otp) {
        return Err(AppError::Validation(
            "OTP must be exactly 4 digits".to_string(),
        ));
    }

    let caller = require_caller(state, token).await?;

    let delivery_id = parse_delivery_id(&delivery_id)?;
    let view = state
        .store
        .delivery_for_release(delivery_id)
        .await?
        .ok_or_else(delivery_not_found)?;

    if view.traveler_id != caller.id {
        return Err(AppError::Forbidden);
    }

    if view.delivery.delivery_otp != otp {
        warn!(delivery_id = %delivery_id, "escrow release rejected: OTP mismatch");
        return Err(AppError::OtpMismatch);
    }

    let total = view.delivery.total_amount();
    let split = payout::split(total)
        .ok_or_else(|| AppError::Internal("payout amount out of range".to_string()))?;

    let transfer_intent = TransferIntent {
        traveler: TransferLeg {
            account: format!("traveler_{}", view.traveler_id),
            amount: split.traveler_minor,
            currency: CURRENCY.to_string(),
            notes: TransferNotes {
                purpose: TRAVELER_PAYOUT_PURPOSE.to_string(),
                delivery_id,
            },
        },
        platform: TransferLeg {
            account: state.platform_account_id.clone(),
            amount: split.platform_minor,
            currency: CURRENCY.to_string(),
            notes: TransferNotes {
                purpose: PLATFORM_FEE_PURPOSE.to_string(),
                delivery_id,
            },
        },
    };

    match state.store.release_escrow(delivery_id).await? {
        EscrowUpdate::Applied(_) => {
            info!(
                delivery_id = %delivery_id,
                traveler_id = %view.traveler_id,
                traveler = %view.traveler_name,
                traveler_minor = split.traveler_minor,
                platform_minor = split.platform_minor,
                "escrow released"
            );

            Ok(ReleaseEscrowResponse {
                success: true,
                message: "Escrow released. Payment split successfully.".to_string(),
                breakdown: Breakdown {
                    total,
                    traveler_share: Decimal::new(split.traveler_minor, 2),
                    platform_share: Decimal::new(split.platform_minor, 2),
                },
                transfer_intent,
            })
        }
        EscrowUpdate::InvalidState(EscrowStatus::Released) => Err(AppError::Conflict(
            "Payment has already been released for this delivery.".to_string(),
        )),
        EscrowUpdate::InvalidState(_) => Err(AppError::Conflict(
            "Escrow has not been funded for this delivery.".to_string(),
        )),
        EscrowUpdate::NotFound => Err(delivery_not_found()),
    }
}

fn parse_delivery_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| delivery_not_found())
}

fn delivery_not_found() -> AppError {
    AppError::NotFound("Delivery not found".to_string())
}

fn escrow_already_created() -> AppError {
    AppError::Conflict("Escrow has already been created for this delivery.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;

    use crate::auth::MemoryIdentity;
    use crate::gateway::SandboxGateway;
    use crate::models::delivery::{Delivery, DeliveryStatus};
    use crate::models::trip::{Trip, TripStatus};
    use crate::models::user::{KycStatus, User};
    use crate::store::MemoryStore;

    struct Fixture {
        state: AppState,
        delivery_id: Uuid,
        sender_token: String,
        traveler_token: String,
    }

    fn user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: format!("{name}@example.com"),
            full_name: name.to_string(),
            kyc_status: KycStatus::Verified,
            created_at: Utc::now(),
        }
    }

    async fn fixture() -> Fixture {
        let state = AppState::new(
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryIdentity::new()),
            Arc::new(SandboxGateway),
            "acc_platform_test",
        );

        let sender = user("Sender");
        let traveler = user("Traveler");
        let sender_token = state.identity.register(&sender).await.unwrap();
        let traveler_token = state.identity.register(&traveler).await.unwrap();

        let trip = Trip {
            id: Uuid::new_v4(),
            traveler_id: traveler.id,
            from_city: "Mumbai".to_string(),
            to_city: "Pune".to_string(),
            travel_date: Utc::now().date_naive(),
            status: TripStatus::Active,
            created_at: Utc::now(),
        };

        let now = Utc::now();
        let delivery = Delivery {
            id: Uuid::new_v4(),
            sender_id: sender.id,
            trip_id: trip.id,
            item_type: "document".to_string(),
            price: Decimal::new(230, 0),
            platform_fee: Decimal::new(20, 0),
            status: DeliveryStatus::Pending,
            escrow_status: EscrowStatus::Unset,
            delivery_otp: "1234".to_string(),
            razorpay_order_id: None,
            razorpay_payment_id: None,
            otp_verified_at: None,
            created_at: now,
            updated_at: now,
        };
        let delivery_id = delivery.id;

        state.store.insert_user(sender).await.unwrap();
        state.store.insert_user(traveler).await.unwrap();
        state.store.insert_trip(trip).await.unwrap();
        state.store.insert_delivery(delivery).await.unwrap();

        Fixture {
            state,
            delivery_id,
            sender_token,
            traveler_token,
        }
    }

    fn create_request(fx: &Fixture, amount: i64) -> CreateEscrowRequest {
        CreateEscrowRequest {
            delivery_id: Some(fx.delivery_id.to_string()),
            amount: Some(Decimal::new(amount, 0)),
        }
    }

    fn release_request(fx: &Fixture, otp: &str) -> ReleaseEscrowRequest {
        ReleaseEscrowRequest {
            delivery_id: Some(fx.delivery_id.to_string()),
            otp: Some(otp.to_string()),
        }
    }

    async fn hold(fx: &Fixture) {
        create_escrow(&fx.state, Some(&fx.sender_token), create_request(fx, 250))
            .await
            .unwrap();
    }

    async fn escrow_status(fx: &Fixture) -> EscrowStatus {
        fx.state
            .store
            .delivery(fx.delivery_id)
            .await
            .unwrap()
            .unwrap()
            .escrow_status
    }

    #[tokio::test]
    async fn create_escrow_holds_the_delivery() {
        let fx = fixture().await;

        let response = create_escrow(&fx.state, Some(&fx.sender_token), create_request(&fx, 250))
            .await
            .unwrap();

        assert!(response.success);
        assert!(response.order_id.starts_with("order_sbx_"));
        assert_eq!(response.amount, 25_000);
        assert_eq!(response.currency, "INR");
        assert_eq!(response.key_id, "rzp_test_sandbox");

        let stored = fx
            .state
            .store
            .delivery(fx.delivery_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.escrow_status, EscrowStatus::Held);
        assert_eq!(stored.razorpay_order_id, Some(response.order_id));
    }

    #[tokio::test]
    async fn create_escrow_requires_fields() {
        let fx = fixture().await;

        let err = create_escrow(
            &fx.state,
            Some(&fx.sender_token),
            CreateEscrowRequest {
                delivery_id: None,
                amount: Some(Decimal::new(250, 0)),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = create_escrow(
            &fx.state,
            Some(&fx.sender_token),
            CreateEscrowRequest {
                delivery_id: Some(fx.delivery_id.to_string()),
                amount: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn create_escrow_rejects_non_positive_amounts() {
        let fx = fixture().await;

        for amount in [0, -250] {
            let err = create_escrow(
                &fx.state,
                Some(&fx.sender_token),
                create_request(&fx, amount),
            )
            .await
            .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }

        assert_eq!(escrow_status(&fx).await, EscrowStatus::Unset);
    }

    #[tokio::test]
    async fn create_escrow_requires_authentication() {
        let fx = fixture().await;

        let err = create_escrow(&fx.state, None, create_request(&fx, 250))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));

        let err = create_escrow(&fx.state, Some("bogus"), create_request(&fx, 250))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }

    #[tokio::test]
    async fn create_escrow_unknown_delivery_is_not_found() {
        let fx = fixture().await;

        let err = create_escrow(
            &fx.state,
            Some(&fx.sender_token),
            CreateEscrowRequest {
                delivery_id: Some(Uuid::new_v4().to_string()),
                amount: Some(Decimal::new(250, 0)),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_escrow_rejects_non_sender() {
        let fx = fixture().await;

        let err = create_escrow(
            &fx.state,
            Some(&fx.traveler_token),
            create_request(&fx, 250),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
        assert_eq!(escrow_status(&fx).await, EscrowStatus::Unset);
    }

    #[tokio::test]
    async fn create_escrow_replay_conflicts() {
        let fx = fixture().await;
        hold(&fx).await;

        let err = create_escrow(&fx.state, Some(&fx.sender_token), create_request(&fx, 250))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn release_escrow_splits_and_delivers() {
        let fx = fixture().await;
        hold(&fx).await;

        let response = release_escrow(
            &fx.state,
            Some(&fx.traveler_token),
            release_request(&fx, "1234"),
        )
        .await
        .unwrap();

        assert!(response.success);
        assert_eq!(response.breakdown.total, Decimal::new(250, 0));
        assert_eq!(response.breakdown.traveler_share, Decimal::new(20_000, 2));
        assert_eq!(response.breakdown.platform_share, Decimal::new(5_000, 2));
        assert_eq!(response.transfer_intent.traveler.amount, 20_000);
        assert_eq!(response.transfer_intent.platform.amount, 5_000);
        assert_eq!(
            response.transfer_intent.platform.account,
            "acc_platform_test"
        );

        let stored = fx
            .state
            .store
            .delivery(fx.delivery_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.escrow_status, EscrowStatus::Released);
        assert_eq!(stored.status, DeliveryStatus::Delivered);
        assert!(stored.otp_verified_at.is_some());
    }

    #[tokio::test]
    async fn release_escrow_checks_otp_shape_before_authentication() {
        let fx = fixture().await;

        let err = release_escrow(&fx.state, None, release_request(&fx, "12a4"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        for otp in ["123", "12345"] {
            let err = release_escrow(
                &fx.state,
                Some(&fx.traveler_token),
                release_request(&fx, otp),
            )
            .await
            .unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn release_escrow_wrong_otp_leaves_escrow_held() {
        let fx = fixture().await;
        hold(&fx).await;

        let err = release_escrow(
            &fx.state,
            Some(&fx.traveler_token),
            release_request(&fx, "9999"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::OtpMismatch));
        assert_eq!(escrow_status(&fx).await, EscrowStatus::Held);
    }

    #[tokio::test]
    async fn release_escrow_rejects_sender_even_with_correct_otp() {
        let fx = fixture().await;
        hold(&fx).await;

        let err = release_escrow(
            &fx.state,
            Some(&fx.sender_token),
            release_request(&fx, "1234"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
        assert_eq!(escrow_status(&fx).await, EscrowStatus::Held);
    }

    #[tokio::test]
    async fn release_escrow_requires_funded_escrow() {
        let fx = fixture().await;

        let err = release_escrow(
            &fx.state,
            Some(&fx.traveler_token),
            release_request(&fx, "1234"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(escrow_status(&fx).await, EscrowStatus::Unset);
    }

    #[tokio::test]
    async fn release_escrow_replay_conflicts() {
        let fx = fixture().await;
        hold(&fx).await;

        release_escrow(
            &fx.state,
            Some(&fx.traveler_token),
            release_request(&fx, "1234"),
        )
        .await
        .unwrap();

        let err = release_escrow(
            &fx.state,
            Some(&fx.traveler_token),
            release_request(&fx, "1234"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(escrow_status(&fx).await, EscrowStatus::Released);
    }
}
