use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rand::Rng;
use tracing::info;

use crate::errors::StoreError;
use crate::models::energy::EnergyGenerationRecord;
use crate::services::energy_generator::HistoryGenerator;
use crate::services::record_store::RecordRepository;

pub fn default_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 1, 8, 0, 0).single().unwrap_or_default()
}

pub fn default_end() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 12, 13, 8, 0, 0).single().unwrap_or_default()
}

/// Builds a contiguous history from `start` to `end` inclusive, one reading per
/// `step`.
pub fn backfill_records<R: Rng + ?Sized>(
    serial_number: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: TimeDelta,
    rng: &mut R,
) -> Vec<EnergyGenerationRecord> {
    let mut records = Vec::new();
    if step <= TimeDelta::zero() {
        return records;
    }

    let interval_hours = u32::try_from(step.num_hours()).unwrap_or(0);
    let mut generator = HistoryGenerator::new();
    let mut current = start;

    while current <= end {
        let generation = generator.next_reading(current, rng);
        records.push(
            EnergyGenerationRecord::new(serial_number, current, generation.energy_generated)
                .with_interval(interval_hours),
        );
        current += step;
    }

    records
}

/// Replaces the stored history for `serial_number` with a freshly generated one.
pub fn run_backfill(
    repository: &dyn RecordRepository,
    serial_number: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: TimeDelta,
) -> Result<usize, StoreError> {
    let removed = repository.delete_by_serial(serial_number)?;
    if removed > 0 {
        info!("Removed {} existing records for {}", removed, serial_number);
    }

    let records = backfill_records(serial_number, start, end, step, &mut rand::thread_rng());
    let inserted = repository.insert_many(&records)?;

    info!(
        "Database seeded successfully. Generated {} energy generation records from {} to {}.",
        inserted,
        start.to_rfc2822(),
        end.to_rfc2822()
    );
    Ok(inserted)
}
