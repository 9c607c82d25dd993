mod routes;
mod controllers;
mod services;
mod models;
mod api_docs;
mod shared_state;
mod config;
mod errors;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get, response::Html};
use axum::http::{HeaderValue, Method};
use chrono::{DateTime, TimeDelta, Utc};
use clap::{Parser, Subcommand};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use utoipa::OpenApi;
use utoipa_scalar::Scalar;

use crate::api_docs::ApiDoc;
use crate::config::Config;
use crate::routes::api_routes::api_routes;
use crate::services::backfill;
use crate::services::energy_scheduler::{spawn_scheduler, EnergySchedule, EnergyTicker};
use crate::services::record_store::{RecordRepository, SqliteRecordRepository};
use crate::shared_state::AppState;

#[derive(Debug, Parser)]
#[command(name = "solar-energy-backend", version, about = "Weather proxy and synthetic solar generation feed")]
struct Cli {
    /// JSON config file; environment variables override its values
    #[arg(long, global = true, default_value = "config.json")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API and the periodic generator (default)
    Serve,
    /// Replace the stored history for a unit with generated readings
    Backfill {
        /// Serial number to backfill (defaults to the configured unit)
        #[arg(long)]
        serial: Option<String>,
        /// First reading, RFC 3339
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        /// Last reading (inclusive), RFC 3339
        #[arg(long)]
        to: Option<DateTime<Utc>>,
        /// Hours between readings
        #[arg(long, default_value_t = 2)]
        step_hours: u32,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // 1. Load configuration
    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // 2. Open the record store
    let records: Arc<dyn RecordRepository> = match SqliteRecordRepository::open(&config.database.path) {
        Ok(repo) => Arc::new(repo),
        Err(e) => {
            error!("Failed to open database {}: {}", config.database.path, e);
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, records).await,
        Command::Backfill { serial, from, to, step_hours } => {
            let serial = serial.unwrap_or_else(|| config.energy.serial_number.clone());
            let start = from.unwrap_or_else(backfill::default_start);
            let end = to.unwrap_or_else(backfill::default_end);
            let step = TimeDelta::hours(i64::from(step_hours));

            if let Err(e) = backfill::run_backfill(records.as_ref(), &serial, start, end, step) {
                error!("Seeding error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

async fn serve(config: Config, records: Arc<dyn RecordRepository>) {
    // 3. Start the periodic generator
    let schedule = match EnergySchedule::parse(&config.energy.schedule) {
        Ok(s) => s,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    let ticker = EnergyTicker::new(
        records.clone(),
        &config.energy.serial_number,
        config.energy.interval_hours,
    );
    let scheduler = spawn_scheduler(schedule, ticker);

    // 4. Start Axum HTTP server
    let state = AppState::from_config(&config, records);

    let app = Router::new()
        .nest("/api", api_routes(state))
        .route("/scalar", get(|| async {
            Html(Scalar::new(ApiDoc::openapi()).to_html())
        }))
        .layer(cors_layer(&config.server.allowed_origin))
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Server is running on port {}", config.server.port);
    info!("Scalar UI: http://{}/scalar", addr);

    if let Err(e) = axum_server::bind(addr).serve(app.into_make_service()).await {
        error!("HTTP server error: {}", e);
    }

    scheduler.shutdown().await;
}

/// Read-only API: only GET and preflight are allowed cross-origin.
fn cors_layer(allowed_origin: &str) -> CorsLayer {
    match allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::OPTIONS]),
        Err(_) => {
            error!("Invalid CORS origin '{}', cross-origin requests disabled", allowed_origin);
            CorsLayer::new()
        }
    }
}
