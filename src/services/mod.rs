pub mod backfill;
pub mod energy_generator;
pub mod energy_scheduler;
pub mod record_store;
pub mod solar_classifier;
pub mod weather_cache;
pub mod weather_provider;
pub mod weather_service;
