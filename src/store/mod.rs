pub mod memory;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryStore;

use crate::models::delivery::{Delivery, DeliveryStatus, EscrowStatus};
use crate::models::trip::Trip;
use crate::models::user::{KycStatus, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result of a conditional escrow update. The store applies the transition
/// only when the row is in the expected state, so two racing callers cannot
/// both succeed.
#[derive(Debug)]
pub enum EscrowUpdate {
    Applied(Delivery),
    InvalidState(EscrowStatus),
    NotFound,
}

/// Result of a conditional milestone update.
#[derive(Debug)]
pub enum StatusUpdate {
    Applied(Delivery),
    InvalidTransition(DeliveryStatus),
    NotFound,
}

/// Delivery joined with its trip's traveler, as needed by escrow release.
#[derive(Debug, Clone)]
pub struct ReleaseView {
    pub delivery: Delivery,
    pub traveler_id: Uuid,
    pub traveler_name: String,
}

/// Active trip joined with its traveler's public profile, for listing.
#[derive(Debug, Clone, Serialize)]
pub struct TripView {
    #[serde(flatten)]
    pub trip: Trip,
    pub traveler_name: String,
    pub traveler_kyc_status: KycStatus,
}

/// Relational store seam. The production analog is a managed relational
/// backend; implementations must make the escrow updates atomic per row.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_user(&self, user: User) -> Result<(), StoreError>;

    async fn insert_trip(&self, trip: Trip) -> Result<(), StoreError>;

    async fn trip(&self, id: Uuid) -> Result<Option<Trip>, StoreError>;

    async fn active_trips(&self) -> Result<Vec<TripView>, StoreError>;

    async fn insert_delivery(&self, delivery: Delivery) -> Result<(), StoreError>;

    async fn delivery(&self, id: Uuid) -> Result<Option<Delivery>, StoreError>;

    /// Fetches the delivery together with its trip's traveler (the join used
    /// by release authorization).
    async fn delivery_for_release(&self, id: Uuid) -> Result<Option<ReleaseView>, StoreError>;

    /// Compare-and-swap `escrow_status: unset -> held`, recording the gateway
    /// order id.
    async fn hold_escrow(&self, id: Uuid, order_id: &str) -> Result<EscrowUpdate, StoreError>;

    /// Compare-and-swap `escrow_status: held -> released`; also marks the
    /// delivery `delivered` and stamps `otp_verified_at`.
    async fn release_escrow(&self, id: Uuid) -> Result<EscrowUpdate, StoreError>;

    /// Advances the milestone status. Forward-only, and `delivered` is not a
    /// valid target here (it is set by `release_escrow` alone).
    async fn advance_status(
        &self,
        id: Uuid,
        to: DeliveryStatus,
    ) -> Result<StatusUpdate, StoreError>;
}
