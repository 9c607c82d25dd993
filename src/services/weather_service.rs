use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info};

use crate::errors::ApiError;
use crate::models::weather::{
    CurrentWeather, ForecastResponse, HourlyForecast, WeatherObservation, WeatherPayload,
};
use crate::services::solar_classifier::{classify_observation, describe};
use crate::services::weather_cache::{cache_key, Clock, WeatherCache};
use crate::services::weather_provider::WeatherProvider;

const HOURLY_WINDOW: usize = 24;

/// Cache-fronted weather lookup with solar annotation.
#[derive(Clone)]
pub struct WeatherService {
    provider: Arc<dyn WeatherProvider>,
    cache: Arc<dyn WeatherCache>,
    clock: Arc<dyn Clock>,
}

impl WeatherService {
    pub fn new(
        provider: Arc<dyn WeatherProvider>,
        cache: Arc<dyn WeatherCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { provider, cache, clock }
    }

    /// Returns the decorated payload for a coordinate pair given as raw strings.
    ///
    /// Fresh cache entries are returned with `cached: true` and no network call.
    /// A live fetch always overwrites the entry for its key.
    pub async fn get_weather(
        &self,
        latitude: Option<&str>,
        longitude: Option<&str>,
    ) -> Result<WeatherPayload, ApiError> {
        let (latitude, longitude) = match (non_empty(latitude), non_empty(longitude)) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => {
                return Err(ApiError::Validation(
                    "Latitude and longitude are required".to_string(),
                ))
            }
        };

        let key = cache_key(latitude, longitude);
        if let Some(entry) = self.cache.get(&key) {
            debug!("Weather cache hit for {}", key);
            let mut payload = entry.payload;
            payload.cached = Some(true);
            return Ok(payload);
        }

        let forecast = self.provider.fetch_forecast(latitude, longitude).await?;
        let payload = build_payload(&forecast, self.clock.now());
        info!(
            "Fetched weather for {}: {} ({})",
            key, payload.current.weather_description, payload.solar.condition
        );

        self.cache.put(key, payload.clone());
        Ok(payload)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Formats a provider response into the outbound payload.
///
/// Hourly series are assumed to start at the current hour; only the first 24
/// values are kept.
pub fn build_payload(forecast: &ForecastResponse, captured_at: DateTime<Utc>) -> WeatherPayload {
    let obs = WeatherObservation::from(&forecast.current);

    WeatherPayload {
        latitude: forecast.latitude,
        longitude: forecast.longitude,
        timezone: forecast.timezone.clone(),
        current: CurrentWeather {
            temperature: round_one_decimal(obs.temperature_c),
            humidity: forecast.current.relative_humidity_2m.clone(),
            cloud_cover: forecast.current.cloud_cover.clone(),
            wind_speed: round_one_decimal(obs.wind_speed),
            weather_code: obs.weather_code,
            weather_description: describe(obs.weather_code).to_string(),
        },
        solar: classify_observation(&obs),
        hourly: HourlyForecast {
            cloud_cover: forecast.hourly.cloud_cover.iter().take(HOURLY_WINDOW).copied().collect(),
            direct_radiation: forecast
                .hourly
                .direct_radiation
                .iter()
                .take(HOURLY_WINDOW)
                .copied()
                .collect(),
        },
        timestamp: captured_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        cached: None,
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
