use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trip {
    pub id: Uuid,
    pub traveler_id: Uuid,
    pub from_city: String,
    pub to_city: String,
    pub travel_date: NaiveDate,
    pub status: TripStatus,
    pub created_at: DateTime<Utc>,
}
