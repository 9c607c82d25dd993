use serde::{Deserialize, Serialize};
use serde_json::Number;
use utoipa::ToSchema;

// ─── Open-Meteo wire types ────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub current: CurrentConditions,
    pub hourly: HourlySeries,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentConditions {
    pub temperature_2m: f64,
    pub relative_humidity_2m: Number,
    pub weather_code: i32,
    pub cloud_cover: Number,
    pub wind_speed_10m: f64,
}

/// Gaps in the provider's series arrive as `null` and are kept as `None`.
#[derive(Debug, Clone, Deserialize)]
pub struct HourlySeries {
    pub cloud_cover: Vec<Option<f64>>,
    pub direct_radiation: Vec<Option<f64>>,
}

// ─── Domain types ────────────────────────────────────────────────────────────

/// Snapshot of current conditions at a location. Built per request, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherObservation {
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub weather_code: i32,
    pub cloud_cover_percent: f64,
    /// Same unit the provider reports, no conversion applied.
    pub wind_speed: f64,
}

impl From<&CurrentConditions> for WeatherObservation {
    fn from(c: &CurrentConditions) -> Self {
        Self {
            temperature_c: c.temperature_2m,
            humidity_percent: c.relative_humidity_2m.as_f64().unwrap_or_default(),
            weather_code: c.weather_code,
            cloud_cover_percent: c.cloud_cover.as_f64().unwrap_or_default(),
            wind_speed: c.wind_speed_10m,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolarCondition {
    Optimal,
    Good,
    Fair,
    Poor,
}

impl SolarCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolarCondition::Optimal => "OPTIMAL",
            SolarCondition::Good => "GOOD",
            SolarCondition::Fair => "FAIR",
            SolarCondition::Poor => "POOR",
        }
    }
}

impl std::fmt::Display for SolarCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived solar production outlook for a set of weather conditions.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SolarAssessment {
    pub condition: SolarCondition,
    /// Estimated output as a percentage range, e.g. "70-90%"
    pub solar_output: String,
    pub advice: String,
}

// ─── REST API response types ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherPayload {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub current: CurrentWeather,
    pub solar: SolarAssessment,
    pub hourly: HourlyForecast,
    /// Capture time, ISO-8601 UTC with millisecond precision
    pub timestamp: String,
    /// Only present when the payload was served from the cache
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeather {
    pub temperature: f64,
    /// Echoed as the provider sent it
    #[schema(value_type = f64)]
    pub humidity: Number,
    #[schema(value_type = f64)]
    pub cloud_cover: Number,
    pub wind_speed: f64,
    pub weather_code: i32,
    pub weather_description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HourlyForecast {
    /// Next 24 hours of cloud cover (%), `null` where the provider has no value
    pub cloud_cover: Vec<Option<f64>>,
    /// Next 24 hours of direct radiation (W/m²)
    pub direct_radiation: Vec<Option<f64>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
