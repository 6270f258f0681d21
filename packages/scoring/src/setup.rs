//! Wiring of the production pipeline: Google clients, Leaflet maps and
//! the configured datasets.

use std::path::PathBuf;
use std::sync::Arc;

use livability_geocoder::google::GoogleGeocoder;
use livability_places::google::GooglePlaces;
use livability_price::map::LeafletMapRenderer;
use livability_score_models::progress::ProgressCallback;
use thiserror::Error;

use crate::Aggregator;
use crate::config::{ConfigError, ScoringConfig, api_key_from_env};
use crate::context::{ContextError, ScoringContext};

/// Errors from assembling the production pipeline.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Configuration or credentials are missing.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Reference data could not be loaded.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    /// The publish directory could not be created.
    #[error("Failed to create {path}: {source}")]
    PublishDir {
        /// Directory path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

/// Builds an [`Aggregator`] backed by the Google Geocoding and Places APIs
/// and Leaflet maps, publishing maps into `config.publish_dir`.
///
/// # Errors
///
/// Returns [`SetupError`] if the API key is missing, a dataset cannot be
/// loaded, the HTTP client cannot be built, or the publish directory
/// cannot be created.
pub fn build_aggregator(
    config: &ScoringConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Aggregator, SetupError> {
    let api_key = api_key_from_env()?;

    log::info!("Loading reference data from {}...", config.data_dir.display());
    let context = ScoringContext::load(config, progress)?;

    let client = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()?;

    std::fs::create_dir_all(&config.publish_dir).map_err(|source| SetupError::PublishDir {
        path: config.publish_dir.clone(),
        source,
    })?;

    Ok(Aggregator::new(
        Arc::new(context),
        Arc::new(GoogleGeocoder::new(client.clone(), api_key.clone())),
        Arc::new(GooglePlaces::new(client, api_key)),
        Arc::new(LeafletMapRenderer::new(&config.map_output_dir)),
    )
    .with_publish_dir(&config.publish_dir))
}
