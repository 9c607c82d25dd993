use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::errors::ProviderError;
use crate::models::weather::ForecastResponse;

pub const CURRENT_FIELDS: [&str; 5] = [
    "temperature_2m",
    "relative_humidity_2m",
    "weather_code",
    "cloud_cover",
    "wind_speed_10m",
];
pub const HOURLY_FIELDS: [&str; 2] = ["cloud_cover", "direct_radiation"];

/// Source of current conditions plus an hourly forecast for a location.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch_forecast(
        &self,
        latitude: &str,
        longitude: &str,
    ) -> Result<ForecastResponse, ProviderError>;
}

/// Open-Meteo forecast endpoint client.
pub struct OpenMeteoProvider {
    client: Client,
    api_url: String,
}

impl OpenMeteoProvider {
    /// No request timeout is set; the transport default applies.
    pub fn new(api_url: &str) -> Self {
        Self { client: Client::new(), api_url: api_url.to_string() }
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn fetch_forecast(
        &self,
        latitude: &str,
        longitude: &str,
    ) -> Result<ForecastResponse, ProviderError> {
        let current = CURRENT_FIELDS.join(",");
        let hourly = HOURLY_FIELDS.join(",");

        debug!("Fetching forecast for {},{}", latitude, longitude);
        let resp = self
            .client
            .get(&self.api_url)
            .query(&[
                ("latitude", latitude),
                ("longitude", longitude),
                ("current", current.as_str()),
                ("hourly", hourly.as_str()),
                ("timezone", "auto"),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or(status.as_str());
            return Err(ProviderError::Status(reason.to_string()));
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
