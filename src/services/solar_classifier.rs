//! Weather → solar production classification.
//!
//! Rules are evaluated top to bottom and the first match wins:
//!   1. thunderstorm codes (95, 96, 99)
//!   2. rain / snow codes 51..=86, drizzle (51, 53, 55) excluded
//!   3. wind above 15 (provider units, no conversion)
//!   4. cloud cover tiers
//!
//! Inputs are not range-checked; out-of-range values fall through the
//! threshold comparisons as-is.

use crate::models::weather::{SolarAssessment, SolarCondition, WeatherObservation};

const THUNDERSTORM_CODES: [i32; 3] = [95, 96, 99];
const DRIZZLE_CODES: [i32; 3] = [51, 53, 55];
const HIGH_WIND_THRESHOLD: f64 = 15.0;

pub fn classify(cloud_cover: f64, wind_speed: f64, weather_code: i32) -> SolarAssessment {
    if THUNDERSTORM_CODES.contains(&weather_code) {
        return assessment(
            SolarCondition::Poor,
            "0-10%",
            "Thunderstorms - No solar production expected",
        );
    }

    if (51..=86).contains(&weather_code) && !DRIZZLE_CODES.contains(&weather_code) {
        return assessment(
            SolarCondition::Poor,
            "10-20%",
            "Precipitation reducing solar output",
        );
    }

    if wind_speed > HIGH_WIND_THRESHOLD {
        return assessment(
            SolarCondition::Fair,
            "40-60%",
            "High winds may affect installation - reduce output expected",
        );
    }

    if cloud_cover <= 20.0 {
        assessment(
            SolarCondition::Optimal,
            "90-100%",
            "Excellent conditions for solar energy generation",
        )
    } else if cloud_cover <= 50.0 {
        assessment(
            SolarCondition::Good,
            "70-90%",
            "Good conditions for solar energy generation",
        )
    } else if cloud_cover <= 80.0 {
        assessment(
            SolarCondition::Fair,
            "40-60%",
            "Moderate cloud cover reducing solar output",
        )
    } else {
        assessment(
            SolarCondition::Poor,
            "10-30%",
            "Heavy cloud cover significantly reducing solar output",
        )
    }
}

/// Convenience wrapper over [`classify`] for a full observation.
pub fn classify_observation(obs: &WeatherObservation) -> SolarAssessment {
    classify(obs.cloud_cover_percent, obs.wind_speed, obs.weather_code)
}

/// Human label for a WMO weather code. Unknown codes map to "Unknown".
pub fn describe(weather_code: i32) -> &'static str {
    match weather_code {
        0 => "Clear Sky",
        1 => "Mainly Clear",
        2 => "Partly Cloudy",
        3 => "Overcast",
        45 | 48 => "Foggy",
        51 => "Light Drizzle",
        53 => "Moderate Drizzle",
        55 => "Dense Drizzle",
        61 => "Slight Rain",
        63 => "Moderate Rain",
        65 => "Heavy Rain",
        71 => "Slight Snow",
        73 => "Moderate Snow",
        75 => "Heavy Snow",
        80 => "Slight Rain Showers",
        81 => "Moderate Rain Showers",
        82 => "Violent Rain Showers",
        85 => "Slight Snow Showers",
        86 => "Heavy Snow Showers",
        95 => "Thunderstorm",
        96 | 99 => "Thunderstorm with Hail",
        _ => "Unknown",
    }
}

fn assessment(condition: SolarCondition, output: &str, advice: &str) -> SolarAssessment {
    SolarAssessment {
        condition,
        solar_output: output.to_string(),
        advice: advice.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thunderstorm_overrides_everything() {
        for code in [95, 96, 99] {
            for (cloud, wind) in [(0.0, 0.0), (100.0, 40.0), (15.0, 5.0)] {
                let r = classify(cloud, wind, code);
                assert_eq!(r.condition, SolarCondition::Poor);
                assert_eq!(r.solar_output, "0-10%");
            }
        }
    }

    #[test]
    fn test_rain_beats_clear_sky() {
        let r = classify(5.0, 2.0, 63);
        assert_eq!(r.condition, SolarCondition::Poor);
        assert_eq!(r.solar_output, "10-20%");
        assert_eq!(r.advice, "Precipitation reducing solar output");
    }

    #[test]
    fn test_precipitation_band_edges() {
        for code in [56, 61, 65, 71, 80, 86] {
            assert_eq!(classify(5.0, 2.0, code).solar_output, "10-20%", "code {code}");
        }
        // drizzle and out-of-band codes fall through to cloud cover
        for code in [50, 51, 53, 55, 87] {
            assert_eq!(classify(5.0, 2.0, code).condition, SolarCondition::Optimal, "code {code}");
        }
    }

    #[test]
    fn test_wind_beats_optimal_cloud_cover() {
        let r = classify(10.0, 20.0, 0);
        assert_eq!(r.condition, SolarCondition::Fair);
        assert_eq!(r.solar_output, "40-60%");
    }

    #[test]
    fn test_wind_threshold_is_strict() {
        assert_eq!(classify(10.0, 15.0, 0).condition, SolarCondition::Optimal);
    }

    #[test]
    fn test_cloud_tiers() {
        assert_eq!(classify(15.0, 5.0, 1).solar_output, "90-100%");
        assert_eq!(classify(20.0, 5.0, 1).condition, SolarCondition::Optimal);
        assert_eq!(classify(50.0, 5.0, 2).condition, SolarCondition::Good);
        assert_eq!(classify(60.0, 5.0, 2).solar_output, "40-60%");
        assert_eq!(classify(80.0, 5.0, 3).condition, SolarCondition::Fair);
        let heavy = classify(95.0, 5.0, 3);
        assert_eq!(heavy.condition, SolarCondition::Poor);
        assert_eq!(heavy.solar_output, "10-30%");
    }

    #[test]
    fn test_negative_cloud_cover_is_not_rejected() {
        assert_eq!(classify(-10.0, 0.0, 0).condition, SolarCondition::Optimal);
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(0), "Clear Sky");
        assert_eq!(describe(48), "Foggy");
        assert_eq!(describe(82), "Violent Rain Showers");
        assert_eq!(describe(99), "Thunderstorm with Hail");
        assert_eq!(describe(999), "Unknown");
        assert_eq!(describe(-1), "Unknown");
    }
}
