#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Price outlook from nearby development projects.
//!
//! A pincode is geocoded and every registered [`DevelopmentProject`]
//! within [`INFLUENCE_RADIUS_KM`] contributes its impact, decaying
//! linearly with distance. The nearby projects are drawn on a map.

pub mod map;
pub mod registry;

use std::sync::Arc;

use livability_geocoder::Geocoder;
use livability_score_models::{Coordinates, PriceScore, ScoreError, ScoreResult};
use livability_spatial::haversine_km;

use crate::map::{MapMarker, MapRenderer};
pub use crate::registry::{DevelopmentProject, all_projects};

/// Projects closer than this contribute to the score.
pub const INFLUENCE_RADIUS_KM: f64 = 25.0;

/// Bounds of the price score.
pub const SCORE_RANGE: (f64, f64) = (0.0, 100.0);

/// Sums distance-decayed project impacts around `center`.
///
/// Returns the clamped score and the projects that contributed, in
/// registry order.
#[must_use]
pub fn price_change_score<'a>(
    center: Coordinates,
    projects: &'a [DevelopmentProject],
) -> (f64, Vec<&'a DevelopmentProject>) {
    let mut score = 0.0;
    let mut nearby = Vec::new();

    for project in projects {
        let distance = haversine_km(center, project.coordinates());
        if distance < INFLUENCE_RADIUS_KM {
            score += f64::from(project.impact) * (INFLUENCE_RADIUS_KM - distance)
                / INFLUENCE_RADIUS_KM;
            nearby.push(project);
        }
    }

    (score.clamp(SCORE_RANGE.0, SCORE_RANGE.1), nearby)
}

/// Scores pincodes against the development project registry.
pub struct PriceProximityScorer {
    geocoder: Arc<dyn Geocoder>,
    renderer: Arc<dyn MapRenderer>,
    projects: Vec<DevelopmentProject>,
}

impl PriceProximityScorer {
    /// Creates a scorer over the embedded project registry.
    #[must_use]
    pub fn new(geocoder: Arc<dyn Geocoder>, renderer: Arc<dyn MapRenderer>) -> Self {
        Self::with_projects(geocoder, renderer, all_projects())
    }

    /// Creates a scorer over an explicit project list.
    #[must_use]
    pub fn with_projects(
        geocoder: Arc<dyn Geocoder>,
        renderer: Arc<dyn MapRenderer>,
        projects: Vec<DevelopmentProject>,
    ) -> Self {
        Self {
            geocoder,
            renderer,
            projects,
        }
    }

    /// Projects this scorer considers.
    #[must_use]
    pub fn projects(&self) -> &[DevelopmentProject] {
        &self.projects
    }

    /// Scores a pincode and renders the nearby projects.
    ///
    /// A map rendering failure is logged and leaves `map_file` empty.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::NotFound`] if the pincode cannot be geocoded,
    /// whether the lookup failed or matched nothing.
    pub async fn score(&self, pincode: &str) -> ScoreResult<PriceScore> {
        let center = match self.geocoder.resolve(pincode).await {
            Ok(Some(coords)) => coords,
            Ok(None) => {
                log::debug!("No geocoding match for pincode '{pincode}'");
                return Err(ScoreError::not_found("location not found"));
            }
            Err(e) => {
                log::warn!("Geocoding pincode '{pincode}' failed: {e}");
                return Err(ScoreError::not_found("location not found"));
            }
        };

        let (price_score, nearby) = price_change_score(center, &self.projects);

        let markers: Vec<MapMarker> = nearby
            .iter()
            .map(|p| MapMarker {
                coordinates: p.coordinates(),
                label: format!("{} (Impact: {})", p.name, p.impact),
            })
            .collect();

        let map_file = match self.renderer.render(center, &markers) {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("Map rendering for pincode '{pincode}' failed: {e}");
                None
            }
        };

        Ok(PriceScore {
            price_score,
            nearby: nearby.into_iter().map(|p| p.name.clone()).collect(),
            map_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use livability_geocoder::{GeocodeError, StaticGeocoder};

    use super::*;
    use crate::map::MapError;

    const CHENNAI: Coordinates = Coordinates::new(13.0827, 80.2707);

    struct NullRenderer;

    impl MapRenderer for NullRenderer {
        fn render(&self, _center: Coordinates, _markers: &[MapMarker]) -> Result<PathBuf, MapError> {
            Ok(PathBuf::from("map.html"))
        }
    }

    struct BrokenRenderer;

    impl MapRenderer for BrokenRenderer {
        fn render(&self, _center: Coordinates, _markers: &[MapMarker]) -> Result<PathBuf, MapError> {
            Err(MapError::Io {
                path: PathBuf::from("/nowhere"),
                source: std::io::Error::other("disk full"),
            })
        }
    }

    struct FailingGeocoder;

    #[async_trait::async_trait]
    impl Geocoder for FailingGeocoder {
        async fn resolve(&self, _query: &str) -> Result<Option<Coordinates>, GeocodeError> {
            Err(GeocodeError::Status {
                status: "OVER_QUERY_LIMIT".to_string(),
            })
        }
    }

    fn chennai_geocoder() -> Arc<dyn Geocoder> {
        Arc::new(StaticGeocoder::new([("600001".to_string(), CHENNAI)]))
    }

    fn project(name: &str, latitude: f64, longitude: f64, impact: u8) -> DevelopmentProject {
        DevelopmentProject {
            name: name.to_string(),
            latitude,
            longitude,
            impact,
        }
    }

    #[tokio::test]
    async fn chennai_pincode_scores_above_zero() {
        let scorer = PriceProximityScorer::new(chennai_geocoder(), Arc::new(NullRenderer));
        let score = scorer.score("600001").await.unwrap();
        assert!(score.price_score > 0.0);
        assert!(score.nearby.iter().any(|n| n == "Chennai Sea Bridge"));
        assert!(!score.nearby.iter().any(|n| n == "Hosur Airport"));
        assert_eq!(score.map_file, Some(PathBuf::from("map.html")));
    }

    #[tokio::test]
    async fn unknown_pincode_is_not_found() {
        let scorer = PriceProximityScorer::new(chennai_geocoder(), Arc::new(NullRenderer));
        let err = scorer.score("999999").await.unwrap_err();
        assert_eq!(err, ScoreError::not_found("location not found"));
    }

    #[tokio::test]
    async fn geocoder_failure_is_not_found() {
        let scorer = PriceProximityScorer::new(Arc::new(FailingGeocoder), Arc::new(NullRenderer));
        let err = scorer.score("600001").await.unwrap_err();
        assert_eq!(err, ScoreError::not_found("location not found"));
    }

    #[tokio::test]
    async fn render_failure_keeps_the_score() {
        let scorer = PriceProximityScorer::new(chennai_geocoder(), Arc::new(BrokenRenderer));
        let score = scorer.score("600001").await.unwrap();
        assert!(score.price_score > 0.0);
        assert!(score.map_file.is_none());
    }

    #[test]
    fn co_located_project_adds_full_impact() {
        let projects = [project("Here", CHENNAI.latitude, CHENNAI.longitude, 7)];
        let (score, nearby) = price_change_score(CHENNAI, &projects);
        assert!((score - 7.0).abs() < 1e-9);
        assert_eq!(nearby.len(), 1);
    }

    #[test]
    fn distant_projects_are_ignored() {
        // Roughly 33 km north.
        let projects = [project("Far", CHENNAI.latitude + 0.3, CHENNAI.longitude, 10)];
        let (score, nearby) = price_change_score(CHENNAI, &projects);
        assert!(score.abs() < f64::EPSILON);
        assert!(nearby.is_empty());
    }

    #[test]
    fn score_is_capped_at_one_hundred() {
        let projects: Vec<_> = (0..20)
            .map(|i| project(&format!("P{i}"), CHENNAI.latitude, CHENNAI.longitude, 10))
            .collect();
        let (score, nearby) = price_change_score(CHENNAI, &projects);
        assert!((score - 100.0).abs() < f64::EPSILON);
        assert_eq!(nearby.len(), 20);
    }
}
