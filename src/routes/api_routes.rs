use axum::{routing::get, Router};

use crate::controllers::energy_controller::get_records_by_serial;
use crate::controllers::weather_controller::get_weather;
use crate::shared_state::AppState;

/// Build the `/api/*` sub-router.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/weather", get(get_weather))
        .route(
            "/energy-generation-records/solar-unit/{serial_number}",
            get(get_records_by_serial),
        )
        .with_state(state)
}
