use serde::Deserialize;

use crate::errors::ConfigError;

fn default_port() -> u16 { 8001 }
fn default_allowed_origin() -> String { "https://fed-4-front-end-chathum.netlify.app".to_string() }
fn default_serial_number() -> String { "SU-0001".to_string() }
fn default_schedule() -> String { "* * * * *".to_string() }
fn default_interval_hours() -> u32 { 2 }
fn default_api_url() -> String { "https://api.open-meteo.com/v1/forecast".to_string() }
fn default_cache_ttl_secs() -> u64 { 3600 }
fn default_database_path() -> String { "data/energy.db".to_string() }

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub energy: EnergyConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Single browser origin permitted by CORS
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: default_port(), allowed_origin: default_allowed_origin() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EnergyConfig {
    #[serde(default = "default_serial_number")]
    pub serial_number: String,
    /// Five-field cron expression
    #[serde(default = "default_schedule")]
    pub schedule: String,
    #[serde(default = "default_interval_hours")]
    pub interval_hours: u32,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            serial_number: default_serial_number(),
            schedule: default_schedule(),
            interval_hours: default_interval_hours(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self { api_url: default_api_url(), cache_ttl_secs: default_cache_ttl_secs() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_database_path() }
    }
}

impl Config {
    /// Reads the JSON file when present, then applies process environment overrides.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Read { path: path.to_string(), source }),
        };
        serde_json::from_str(&content)
            .map_err(|source| ConfigError::Parse { path: path.to_string(), source })
    }

    /// Overrides fields from environment-style variables supplied by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PORT") {
            self.server.port = parse_env("PORT", v)?;
        }
        if let Some(v) = lookup("CORS_ORIGIN") {
            self.server.allowed_origin = v;
        }
        if let Some(v) = lookup("SOLAR_UNIT_SERIAL") {
            self.energy.serial_number = v;
        }
        if let Some(v) = lookup("ENERGY_CRON_SCHEDULE") {
            self.energy.schedule = v;
        }
        if let Some(v) = lookup("ENERGY_INTERVAL_HOURS") {
            self.energy.interval_hours = parse_env("ENERGY_INTERVAL_HOURS", v)?;
        }
        if let Some(v) = lookup("WEATHER_API_URL") {
            self.weather.api_url = v;
        }
        if let Some(v) = lookup("WEATHER_CACHE_TTL_SECS") {
            self.weather.cache_ttl_secs = parse_env("WEATHER_CACHE_TTL_SECS", v)?;
        }
        if let Some(v) = lookup("DATABASE_PATH") {
            self.database.path = v;
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { key, value })
}
