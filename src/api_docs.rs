use utoipa::OpenApi;
use crate::controllers::{energy_controller, weather_controller};
use crate::models::{energy, weather};

#[derive(OpenApi)]
#[openapi(
    paths(
        weather_controller::get_weather,
        energy_controller::get_records_by_serial
    ),
    components(
        schemas(
            weather::WeatherPayload,
            weather::CurrentWeather,
            weather::HourlyForecast,
            weather::SolarAssessment,
            weather::SolarCondition,
            weather::ErrorBody,
            energy::EnergyGenerationRecord
        )
    ),
    tags(
        (name = "solar-energy-backend", description = "Weather proxy with solar outlook and synthetic generation records")
    )
)]
pub struct ApiDoc;
