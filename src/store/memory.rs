use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::delivery::{Delivery, DeliveryStatus, EscrowStatus};
use crate::models::trip::{Trip, TripStatus};
use crate::models::user::User;
use crate::store::{EscrowUpdate, ReleaseView, StatusUpdate, Store, StoreError, TripView};

/// In-process store over sharded maps. `get_mut` holds the row's shard lock
/// for the whole read-check-write, which gives the same per-row atomicity the
/// conditional updates rely on against the real backend.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    trips: DashMap<Uuid, Trip>,
    deliveries: DashMap<Uuid, Delivery>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: User) -> Result<(), StoreError> {
        self.users.insert(user.id, user);
        Ok(())
    }

    async fn insert_trip(&self, trip: Trip) -> Result<(), StoreError> {
        self.trips.insert(trip.id, trip);
        Ok(())
    }

    async fn trip(&self, id: Uuid) -> Result<Option<Trip>, StoreError> {
        Ok(self.trips.get(&id).map(|entry| entry.value().clone()))
    }

    async fn active_trips(&self) -> Result<Vec<TripView>, StoreError> {
        let views = self
            .trips
            .iter()
            .filter(|entry| entry.value().status == TripStatus::Active)
            .filter_map(|entry| {
                let trip = entry.value().clone();
                let traveler = self.users.get(&trip.traveler_id)?;
                Some(TripView {
                    traveler_name: traveler.full_name.clone(),
                    traveler_kyc_status: traveler.kyc_status,
                    trip,
                })
            })
            .collect();

        Ok(views)
    }

    async fn insert_delivery(&self, delivery: Delivery) -> Result<(), StoreError> {
        self.deliveries.insert(delivery.id, delivery);
        Ok(())
    }

    async fn delivery(&self, id: Uuid) -> Result<Option<Delivery>, StoreError> {
        Ok(self.deliveries.get(&id).map(|entry| entry.value().clone()))
    }

    async fn delivery_for_release(&self, id: Uuid) -> Result<Option<ReleaseView>, StoreError> {
        let delivery = match self.deliveries.get(&id) {
            Some(entry) => entry.value().clone(),
            None => return Ok(None),
        };

        let traveler_id = match self.trips.get(&delivery.trip_id) {
            Some(trip) => trip.traveler_id,
            None => return Ok(None),
        };

        let traveler_name = self
            .users
            .get(&traveler_id)
            .map(|user| user.full_name.clone())
            .unwrap_or_default();

        Ok(Some(ReleaseView {
            delivery,
            traveler_id,
            traveler_name,
        }))
    }

    async fn hold_escrow(&self, id: Uuid, order_id: &str) -> Result<EscrowUpdate, StoreError> {
        match self.deliveries.get_mut(&id) {
            Some(mut entry) => {
                let delivery = entry.value_mut();
                if delivery.escrow_status != EscrowStatus::Unset {
                    return Ok(EscrowUpdate::InvalidState(delivery.escrow_status));
                }

                delivery.escrow_status = EscrowStatus::Held;
                delivery.razorpay_order_id = Some(order_id.to_string());
                delivery.updated_at = Utc::now();
                Ok(EscrowUpdate::Applied(delivery.clone()))
            }
            None => Ok(EscrowUpdate::NotFound),
        }
    }

    async fn release_escrow(&self, id: Uuid) -> Result<EscrowUpdate, StoreError> {
        match self.deliveries.get_mut(&id) {
            Some(mut entry) => {
                let delivery = entry.value_mut();
                if delivery.escrow_status != EscrowStatus::Held {
                    return Ok(EscrowUpdate::InvalidState(delivery.escrow_status));
                }

                let now = Utc::now();
                delivery.escrow_status = EscrowStatus::Released;
                delivery.status = DeliveryStatus::Delivered;
                delivery.otp_verified_at = Some(now);
                delivery.updated_at = now;
                Ok(EscrowUpdate::Applied(delivery.clone()))
            }
            None => Ok(EscrowUpdate::NotFound),
        }
    }

    async fn advance_status(
        &self,
        id: Uuid,
        to: DeliveryStatus,
    ) -> Result<StatusUpdate, StoreError> {
        match self.deliveries.get_mut(&id) {
            Some(mut entry) => {
                let delivery = entry.value_mut();
                if to == DeliveryStatus::Delivered || to.rank() <= delivery.status.rank() {
                    return Ok(StatusUpdate::InvalidTransition(delivery.status));
                }

                delivery.status = to;
                delivery.updated_at = Utc::now();
                Ok(StatusUpdate::Applied(delivery.clone()))
            }
            None => Ok(StatusUpdate::NotFound),
        }
    }
}
