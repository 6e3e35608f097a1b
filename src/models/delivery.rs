use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Escrow lifecycle of a delivery. Transitions are monotonic:
/// `Unset -> Held -> Released`, and `Released` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    Unset,
    Held,
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    PickedUp,
    InTransit,
    Arrived,
    Delivered,
}

impl DeliveryStatus {
    /// Position in the milestone sequence; used to enforce forward-only
    /// progress updates.
    pub fn rank(self) -> u8 {
        match self {
            DeliveryStatus::Pending => 0,
            DeliveryStatus::PickedUp => 1,
            DeliveryStatus::InTransit => 2,
            DeliveryStatus::Arrived => 3,
            DeliveryStatus::Delivered => 4,
        }
    }
}

/// A parcel-shipment contract between a sender and a trip's traveler.
///
/// `delivery_otp` is never serialized on the record; the sender receives it
/// once in the booking response and shares it with the receiver out of band.
#[derive(Debug, Clone, Serialize)]
pub struct Delivery {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub trip_id: Uuid,
    pub item_type: String,
    pub price: Decimal,
    pub platform_fee: Decimal,
    pub status: DeliveryStatus,
    pub escrow_status: EscrowStatus,
    #[serde(skip_serializing)]
    pub delivery_otp: String,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub otp_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Delivery {
    pub fn total_amount(&self) -> Decimal {
        self.price + self.platform_fee
    }
}
