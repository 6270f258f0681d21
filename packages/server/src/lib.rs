#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for livability scoring.
//!
//! Loads the reference datasets and trains the price model once at
//! start-up, then serves `POST /api/predict`. Rendered development maps
//! are published into the configured directory and served under
//! [`STATIC_PREFIX`].

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use livability_score_models::progress::null_progress;
use livability_scoring::{Aggregator, ScoringConfig, build_aggregator};

/// URL prefix published maps are served under.
pub const STATIC_PREFIX: &str = "/static";

/// Shared application state.
pub struct AppState {
    /// Scoring pipeline.
    pub aggregator: Arc<Aggregator>,
}

/// Starts the livability API server.
///
/// Reads [`ScoringConfig`] from the environment, builds the scoring
/// pipeline and serves it on `BIND_ADDR:PORT`. The caller provides the
/// async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if start-up fails, the HTTP server
/// fails to bind, or it encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ScoringConfig::from_env().map_err(std::io::Error::other)?;
    let aggregator = build_aggregator(&config, &null_progress()).map_err(std::io::Error::other)?;
    let publish_dir = config.publish_dir.clone();

    let state = web::Data::new(AppState {
        aggregator: Arc::new(aggregator),
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(handlers::configure)
            .service(Files::new(STATIC_PREFIX, publish_dir.clone()))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
