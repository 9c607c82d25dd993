use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_INTERVAL_HOURS: u32 = 2;

/// One generation reading for a solar unit. Append-only: never updated or deleted
/// by the live path.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnergyGenerationRecord {
    /// Identifier of the physical unit, e.g. "SU-0001"
    pub serial_number: String,
    pub timestamp: DateTime<Utc>,
    /// Energy produced during the interval (Wh)
    pub energy_generated: u32,
    /// Hours covered by this reading
    pub interval_hours: u32,
}

impl EnergyGenerationRecord {
    pub fn new(serial_number: &str, timestamp: DateTime<Utc>, energy_generated: u32) -> Self {
        Self {
            serial_number: serial_number.to_string(),
            timestamp,
            energy_generated,
            interval_hours: DEFAULT_INTERVAL_HOURS,
        }
    }

    pub fn with_interval(mut self, interval_hours: u32) -> Self {
        self.interval_hours = interval_hours;
        self
    }
}
