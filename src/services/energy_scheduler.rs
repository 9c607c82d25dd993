use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cron::Schedule;
use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::errors::{ScheduleError, StoreError};
use crate::models::energy::EnergyGenerationRecord;
use crate::services::energy_generator;
use crate::services::record_store::RecordRepository;

/// Parsed cron schedule. Accepts classic five-field expressions (minute
/// precision, 0 or 7 = Sunday) as well as the six/seven-field form with seconds,
/// which uses the `cron` crate's own numbering (1 = Sunday).
#[derive(Debug, Clone)]
pub struct EnergySchedule {
    expression: String,
    schedule: Schedule,
}

impl EnergySchedule {
    pub fn parse(expression: &str) -> Result<Self, ScheduleError> {
        let trimmed = expression.trim();
        let invalid = |reason: String| ScheduleError {
            expression: expression.to_string(),
            reason,
        };

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let normalized = if let [minute, hour, day, month, weekday] = fields[..] {
            let weekday = translate_weekdays(weekday).map_err(invalid)?;
            format!("0 {} {} {} {} {}", minute, hour, day, month, weekday)
        } else {
            trimmed.to_string()
        };

        let schedule = Schedule::from_str(&normalized).map_err(|e| invalid(e.to_string()))?;
        Ok(Self { expression: trimmed.to_string(), schedule })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First fire time strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }
}

// ─── Day-of-week translation ─────────────────────────────────────────────────
//
// Classic cron counts Sunday as 0 (or 7) and Monday as 1; the `cron` crate
// counts Sunday as 1 and Saturday as 7. Numeric items are expanded to explicit
// day lists so ranges ending on Sunday and stepped ranges stay correct. Names
// (MON, Tue-Fri) are the same in both dialects and pass through.

fn translate_weekdays(field: &str) -> Result<String, String> {
    if field == "*" || field == "?" {
        return Ok(field.to_string());
    }

    let mut items = Vec::new();
    for item in field.split(',') {
        match expand_weekday_item(item)? {
            Some(days) => items.extend(days.into_iter().map(|d| d.to_string())),
            None => items.push(item.to_string()),
        }
    }
    Ok(items.join(","))
}

/// Expands a numeric list item to crate-numbered days, or `None` when the item
/// is symbolic and needs no translation.
fn expand_weekday_item(item: &str) -> Result<Option<Vec<u32>>, String> {
    let (base, step) = match item.split_once('/') {
        Some((base, step)) => {
            let step: u32 = step.parse().map_err(|_| format!("invalid step '{}'", item))?;
            if step == 0 {
                return Err(format!("invalid step '{}'", item));
            }
            (base, step)
        }
        None => (item, 1),
    };

    let (first, last) = if base == "*" {
        (0, 6)
    } else if let Some((a, b)) = base.split_once('-') {
        match (parse_weekday(a)?, parse_weekday(b)?) {
            (Some(a), Some(b)) => (a, b),
            _ => return Ok(None),
        }
    } else {
        match parse_weekday(base)? {
            Some(d) if step > 1 => (d, 6),
            Some(d) => (d, d),
            None => return Ok(None),
        }
    };
    if first > last {
        return Err(format!("invalid day-of-week range '{}'", item));
    }

    let mut days: Vec<u32> = (first..=last)
        .step_by(step as usize)
        .map(|d| if d == 7 { 1 } else { d + 1 })
        .collect();
    days.sort_unstable();
    days.dedup();
    Ok(Some(days))
}

fn parse_weekday(token: &str) -> Result<Option<u32>, String> {
    if !token.chars().all(|c| c.is_ascii_digit()) || token.is_empty() {
        return Ok(None);
    }
    match token.parse::<u32>() {
        Ok(d) if d <= 7 => Ok(Some(d)),
        _ => Err(format!("day of week '{}' out of range 0-7", token)),
    }
}

/// One scheduler step: generate a reading for a timestamp and append it.
pub struct EnergyTicker {
    repository: Arc<dyn RecordRepository>,
    serial_number: String,
    interval_hours: u32,
}

impl EnergyTicker {
    pub fn new(repository: Arc<dyn RecordRepository>, serial_number: &str, interval_hours: u32) -> Self {
        Self {
            repository,
            serial_number: serial_number.to_string(),
            interval_hours,
        }
    }

    pub fn tick(&self, timestamp: DateTime<Utc>) -> Result<EnergyGenerationRecord, StoreError> {
        self.tick_with_rng(timestamp, &mut rand::thread_rng())
    }

    pub fn tick_with_rng<R: Rng + ?Sized>(
        &self,
        timestamp: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<EnergyGenerationRecord, StoreError> {
        let generation = energy_generator::generate(timestamp, rng);
        let record = EnergyGenerationRecord::new(&self.serial_number, timestamp, generation.energy_generated)
            .with_interval(self.interval_hours);

        self.repository.insert(&record)?;
        info!(
            "[{}] Generated energy record: {}Wh for {}",
            timestamp.to_rfc3339(),
            record.energy_generated,
            record.serial_number
        );
        Ok(record)
    }

    /// Runs a tick and swallows the failure after logging it. A failed tick is
    /// not retried.
    pub fn run_tick(&self, timestamp: DateTime<Utc>) {
        if let Err(e) = self.tick(timestamp) {
            error!("[{}] Failed to generate energy record: {}", Utc::now().to_rfc3339(), e);
        }
    }
}

pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stops the loop; a tick already running finishes first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!("Energy scheduler task ended abnormally: {}", e);
        }
    }
}

/// Starts the periodic generator. Each tick completes before the next fire time
/// is computed, so ticks never overlap; fire times missed while a tick was
/// running are skipped.
pub fn spawn_scheduler(schedule: EnergySchedule, ticker: EnergyTicker) -> SchedulerHandle {
    let (tx, mut rx) = watch::channel(false);

    info!(
        "[Energy Cron] Scheduler initialized - Energy generation records will be created at: {}",
        schedule.expression()
    );

    let task = tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let Some(next) = schedule.next_after(now) else {
                warn!("[Energy Cron] Schedule '{}' has no upcoming runs", schedule.expression());
                break;
            };
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = rx.changed() => break,
            }

            ticker.run_tick(Utc::now());
        }
        info!("[Energy Cron] Scheduler stopped");
    });

    SchedulerHandle { shutdown: tx, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::record_store::SqliteRecordRepository;
    use chrono::{Datelike, TimeZone, Timelike, Weekday};
    use std::sync::atomic::{AtomicBool, Ordering};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct FailingRepository;

    impl RecordRepository for FailingRepository {
        fn insert(&self, _record: &EnergyGenerationRecord) -> Result<(), StoreError> {
            Err(StoreError::Poisoned)
        }
        fn insert_many(&self, _records: &[EnergyGenerationRecord]) -> Result<usize, StoreError> {
            Err(StoreError::Poisoned)
        }
        fn delete_by_serial(&self, _serial_number: &str) -> Result<usize, StoreError> {
            Err(StoreError::Poisoned)
        }
        fn find_by_serial(&self, _s: &str, _l: Option<u32>) -> Result<Vec<EnergyGenerationRecord>, StoreError> {
            Err(StoreError::Poisoned)
        }
    }

    /// Fails the first insert, then delegates to an in-memory store.
    struct FlakyRepository {
        failed_once: AtomicBool,
        inner: SqliteRecordRepository,
    }

    impl RecordRepository for FlakyRepository {
        fn insert(&self, record: &EnergyGenerationRecord) -> Result<(), StoreError> {
            if !self.failed_once.swap(true, Ordering::SeqCst) {
                return Err(StoreError::Poisoned);
            }
            self.inner.insert(record)
        }
        fn insert_many(&self, records: &[EnergyGenerationRecord]) -> Result<usize, StoreError> {
            self.inner.insert_many(records)
        }
        fn delete_by_serial(&self, serial_number: &str) -> Result<usize, StoreError> {
            self.inner.delete_by_serial(serial_number)
        }
        fn find_by_serial(&self, s: &str, l: Option<u32>) -> Result<Vec<EnergyGenerationRecord>, StoreError> {
            self.inner.find_by_serial(s, l)
        }
    }

    // Saturday
    fn saturday_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 4, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_weekday_one_is_monday() {
        let schedule = EnergySchedule::parse("0 8 * * 1").unwrap();
        let next = schedule.next_after(saturday_noon()).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 10, 6, 8, 0, 0).unwrap());
        assert_eq!(next.weekday(), Weekday::Mon);
    }

    #[test]
    fn test_weekday_zero_and_seven_are_sunday() {
        for expr in ["* * * * 0", "* * * * 7"] {
            let schedule = EnergySchedule::parse(expr).unwrap();
            let next = schedule.next_after(saturday_noon()).unwrap();
            assert_eq!(next, Utc.with_ymd_and_hms(2025, 10, 5, 0, 0, 0).unwrap(), "{expr}");
        }
    }

    #[test]
    fn test_weekday_range_covers_working_week() {
        let schedule = EnergySchedule::parse("0 8 * * 1-5").unwrap();
        let fires: Vec<Weekday> = schedule
            .schedule
            .after(&saturday_noon())
            .take(5)
            .map(|t| t.weekday())
            .collect();
        assert_eq!(fires, vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]);
    }

    #[test]
    fn test_weekday_range_ending_on_sunday() {
        let schedule = EnergySchedule::parse("0 8 * * 5-7").unwrap();
        let fires: Vec<Weekday> = schedule
            .schedule
            .after(&saturday_noon())
            .take(3)
            .map(|t| t.weekday())
            .collect();
        assert_eq!(fires, vec![Weekday::Sun, Weekday::Fri, Weekday::Sat]);
    }

    #[test]
    fn test_weekday_translation() {
        assert_eq!(translate_weekdays("*").unwrap(), "*");
        assert_eq!(translate_weekdays("0,3").unwrap(), "1,4");
        assert_eq!(translate_weekdays("*/2").unwrap(), "1,3,5,7");
        assert_eq!(translate_weekdays("Mon-Fri").unwrap(), "Mon-Fri");
        assert!(translate_weekdays("8").is_err());
        assert!(EnergySchedule::parse("0 8 * * 9").is_err());
    }

    #[test]
    fn test_six_field_expression_is_not_translated() {
        // crate numbering: 2 = Monday
        let schedule = EnergySchedule::parse("0 0 8 * * 2").unwrap();
        let next = schedule.next_after(saturday_noon()).unwrap();
        assert_eq!(next.weekday(), Weekday::Mon);
    }

    #[test]
    fn test_five_field_expression_fires_each_minute() {
        let schedule = EnergySchedule::parse("* * * * *").unwrap();
        let t = Utc.with_ymd_and_hms(2025, 10, 1, 9, 15, 30).unwrap();
        let next = schedule.next_after(t).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 10, 1, 9, 16, 0).unwrap());
    }

    #[test]
    fn test_two_hourly_expression() {
        let schedule = EnergySchedule::parse("0 */2 * * *").unwrap();
        let t = Utc.with_ymd_and_hms(2025, 10, 1, 9, 15, 0).unwrap();
        let next = schedule.next_after(t).unwrap();
        assert_eq!((next.hour(), next.minute()), (10, 0));
    }

    #[test]
    fn test_invalid_expression_is_rejected() {
        let err = EnergySchedule::parse("every minute").unwrap_err();
        assert_eq!(err.expression, "every minute");
    }

    #[test]
    fn test_tick_persists_record() {
        let repo = Arc::new(SqliteRecordRepository::open_in_memory().unwrap());
        let ticker = EnergyTicker::new(repo.clone(), "SU-0007", 2);
        let ts = Utc.with_ymd_and_hms(2025, 7, 1, 3, 0, 0).unwrap();

        let record = ticker.tick_with_rng(ts, &mut StdRng::seed_from_u64(9)).unwrap();

        let stored = repo.find_by_serial("SU-0007", None).unwrap();
        assert_eq!(stored, vec![record.clone()]);
        assert_eq!(record.timestamp, ts);
        assert_eq!(record.interval_hours, 2);
    }

    #[test]
    fn test_failed_tick_is_swallowed() {
        let ticker = EnergyTicker::new(Arc::new(FailingRepository), "SU-0001", 2);
        assert!(ticker.tick(Utc::now()).is_err());
        // must not panic
        ticker.run_tick(Utc::now());
    }

    #[tokio::test]
    async fn test_shutdown_stops_loop() {
        let repo = Arc::new(SqliteRecordRepository::open_in_memory().unwrap());
        let schedule = EnergySchedule::parse("0 0 1 1 *").unwrap();
        let handle = spawn_scheduler(schedule, EnergyTicker::new(repo.clone(), "SU-0001", 2));

        handle.shutdown().await;
        assert!(repo.find_by_serial("SU-0001", None).unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_keeps_ticking_after_failure() {
        let repo = Arc::new(FlakyRepository {
            failed_once: AtomicBool::new(false),
            inner: SqliteRecordRepository::open_in_memory().unwrap(),
        });
        let schedule = EnergySchedule::parse("* * * * * *").unwrap();
        let handle = spawn_scheduler(schedule, EnergyTicker::new(repo.clone(), "SU-0001", 2));

        tokio::time::sleep(Duration::from_secs(5)).await;
        handle.shutdown().await;

        assert!(repo.failed_once.load(Ordering::SeqCst));
        let stored = repo.find_by_serial("SU-0001", None).unwrap();
        assert!(!stored.is_empty());
        assert!(stored.iter().all(|r| r.serial_number == "SU-0001" && r.interval_hours == 2));
    }
}
