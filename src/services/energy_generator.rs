//! ============================================================
//!  Synthetic Energy Generation with Anomaly Injection
//!
//!  Pipeline per reading:
//!   1. Seasonal base by UTC month
//!   2. Diurnal multiplier by UTC hour (0 at night, 1.5 at peak)
//!   3. Uniform jitter in [0.8, 1.2)
//!   4. Anomaly overrides driven by a single uniform draw
//!
//!  The history variant additionally carries inverter clipping over
//!  from one reading to the next.
//! ============================================================

use chrono::{DateTime, Datelike, Timelike, Utc};
use rand::Rng;
use tracing::info;

// ─── Constants ───────────────────────────────────────────────
pub const CLIPPING_CAPACITY_WH: u32 = 350;
const SUSTAINED_CLIPPING_SKIP: f64 = 0.3;

// ─── Public output ───────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anomaly {
    /// Sensor reports output while the sun is down
    NighttimeGeneration,
    /// Output collapses to zero during peak sun
    ZeroPeak,
    /// Output drops to a tenth of expected
    SuddenDrop,
    /// Inverter pinned at rated capacity
    InverterClipping,
    /// Clipping carried over from the previous reading
    SustainedClipping,
}

impl Anomaly {
    pub fn as_str(&self) -> &'static str {
        match self {
            Anomaly::NighttimeGeneration => "Nighttime Gen",
            Anomaly::ZeroPeak => "Zero Peak Gen",
            Anomaly::SuddenDrop => "Sudden Drop",
            Anomaly::InverterClipping => "Inverter Clipping",
            Anomaly::SustainedClipping => "Sustained Clipping",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation {
    /// Watt-hours for the interval, never negative
    pub energy_generated: u32,
    /// Last anomaly that overrode the value, if any
    pub anomaly: Option<Anomaly>,
}

// ─── Base curve ──────────────────────────────────────────────

/// Seasonal base value for a 1-based month number.
pub fn base_energy(month: u32) -> f64 {
    match month {
        6..=8 => 300.0,
        3..=5 => 250.0,
        9..=11 => 200.0,
        _ => 150.0,
    }
}

pub fn time_multiplier(hour: u32) -> f64 {
    if is_peak(hour) {
        1.5
    } else if is_daylight(hour) {
        1.2
    } else {
        0.0
    }
}

fn is_daylight(hour: u32) -> bool {
    (6..=18).contains(&hour)
}

fn is_peak(hour: u32) -> bool {
    (10..=14).contains(&hour)
}

/// round(base × time multiplier × jitter), before any anomaly is applied.
pub fn base_output(timestamp: DateTime<Utc>, jitter: f64) -> u32 {
    let value = base_energy(timestamp.month()) * time_multiplier(timestamp.hour()) * jitter;
    to_watt_hours(value)
}

fn to_watt_hours(value: f64) -> u32 {
    // `as` saturates: negatives and NaN become 0
    value.round() as u32
}

// ─── Anomaly injection ───────────────────────────────────────

/// Applies the four anomaly overrides in order.
///
/// Every check reads the same `draw`, so the bands [0, 0.05), [0.05, 0.07),
/// [0.07, 0.09) and (0.99, 1) partition one roll. `night_value` is the raw
/// uniform used to size a nighttime reading (5 + 15 × night_value).
pub fn apply_anomalies(hour: u32, value: u32, draw: f64, night_value: f64) -> Generation {
    let mut energy = value;
    let mut anomaly = None;

    if !is_daylight(hour) && draw < 0.05 {
        energy = to_watt_hours(5.0 + night_value * 15.0);
        anomaly = Some(Anomaly::NighttimeGeneration);
    }

    if is_peak(hour) && (0.05..0.07).contains(&draw) {
        energy = 0;
        anomaly = Some(Anomaly::ZeroPeak);
    }

    if (6..=16).contains(&hour) && (0.07..0.09).contains(&draw) {
        energy = to_watt_hours(f64::from(energy) * 0.1);
        anomaly = Some(Anomaly::SuddenDrop);
    }

    if hour == 12 && draw > 0.99 {
        energy = CLIPPING_CAPACITY_WH;
        anomaly = Some(Anomaly::InverterClipping);
    }

    Generation { energy_generated: energy, anomaly }
}

/// Produces one live reading for `timestamp`. Output is random by design; only
/// its distribution is stable.
pub fn generate<R: Rng + ?Sized>(timestamp: DateTime<Utc>, rng: &mut R) -> Generation {
    let jitter = rng.gen_range(0.8..1.2);
    let value = base_output(timestamp, jitter);

    let draw: f64 = rng.r#gen();
    let night_value: f64 = rng.r#gen();
    let generation = apply_anomalies(timestamp.hour(), value, draw, night_value);

    #[cfg(feature = "verbose_log")]
    tracing::debug!(
        "[GENERATOR] {} base={} jitter={:.3} draw={:.4} -> {}Wh",
        timestamp.to_rfc3339(), value, jitter, draw, generation.energy_generated
    );

    if let Some(anomaly) = generation.anomaly {
        info!(
            "[ANOMALY] {} at {}: {}Wh",
            anomaly.as_str(),
            timestamp.to_rfc3339(),
            generation.energy_generated
        );
    }
    generation
}

// ─── History variant ─────────────────────────────────────────

/// Generator for contiguous historical sequences.
///
/// When the previous reading was exactly at clipping capacity, the next one is
/// pinned there too with probability 0.7.
#[derive(Debug, Default)]
pub struct HistoryGenerator {
    previous: Option<u32>,
}

impl HistoryGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_reading<R: Rng + ?Sized>(&mut self, timestamp: DateTime<Utc>, rng: &mut R) -> Generation {
        let mut generation = generate(timestamp, rng);

        if self.previous == Some(CLIPPING_CAPACITY_WH) && rng.r#gen::<f64>() > SUSTAINED_CLIPPING_SKIP {
            generation = Generation {
                energy_generated: CLIPPING_CAPACITY_WH,
                anomaly: Some(Anomaly::SustainedClipping),
            };
        }

        self.previous = Some(generation.energy_generated);
        generation
    }
}
