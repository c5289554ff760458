use serde::{Deserialize, Serialize};
use uuid::Uuid;
use sqlx::FromRow;

/// One recurring open window of a parking. `weekday` runs from 1 (Monday)
/// to 7 (Sunday); times are kept as the `HH:MM[:SS]` text the owner submitted.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct AvailabilitySlot {
    pub id: String,
    pub parking_id: String,
    pub weekday: i32,
    pub start_time: String,
    pub end_time: String,
    pub enabled: bool,
}

impl AvailabilitySlot {
    pub fn new(parking_id: String, weekday: i32, start_time: String, end_time: String, enabled: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            parking_id,
            weekday,
            start_time,
            end_time,
            enabled,
        }
    }
}
