use std::sync::Arc;

use crate::config::Config;
use crate::services::record_store::RecordRepository;
use crate::services::weather_cache::{InMemoryWeatherCache, SystemClock};
use crate::services::weather_provider::OpenMeteoProvider;
use crate::services::weather_service::WeatherService;

/// State shared by every handler. The weather path and the record path hold no
/// state in common.
#[derive(Clone)]
pub struct AppState {
    pub weather: WeatherService,
    pub records: Arc<dyn RecordRepository>,
}

impl AppState {
    pub fn new(weather: WeatherService, records: Arc<dyn RecordRepository>) -> Self {
        Self { weather, records }
    }

    /// Wires the production collaborators: Open-Meteo behind a process-local cache.
    pub fn from_config(config: &Config, records: Arc<dyn RecordRepository>) -> Self {
        let clock = Arc::new(SystemClock);
        let cache = Arc::new(InMemoryWeatherCache::new(config.weather.cache_ttl_secs, clock.clone()));
        let provider = Arc::new(OpenMeteoProvider::new(&config.weather.api_url));
        Self::new(WeatherService::new(provider, cache, clock), records)
    }
}
