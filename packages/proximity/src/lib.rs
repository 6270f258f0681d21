#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Amenity proximity scoring.
//!
//! Each [`FacilitySearch`] in [`FACILITIES`] asks a [`PlacesSearch`] for
//! facilities of one category around the location. The nearest result's
//! distance, relative to the search radius, gives a distance score; local
//! searches also reward up to [`COUNT_SATURATION`] results. Entry scores
//! are weighted, summed and normalized by the total weight.

use livability_places::PlacesSearch;
use livability_score_models::{Coordinates, ProximityScore, ScoreError, ScoreResult};
use livability_spatial::NearestIndex;

/// Result count at which the count bonus stops growing.
pub const COUNT_SATURATION: f64 = 5.0;

/// Share of an entry's score taken by distance when a count bonus applies.
pub const DISTANCE_SHARE: f64 = 0.8;

/// Share of an entry's score taken by the count bonus.
pub const COUNT_SHARE: f64 = 0.2;

const LOCAL_RADIUS_M: f64 = 500.0;

/// One facility search and how its result is weighted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FacilitySearch {
    /// Places category to search for.
    pub category: &'static str,
    /// Contribution to the final score.
    pub weight: f64,
    /// Search radius in metres; also the distance at which the distance
    /// score reaches zero.
    pub radius_m: f64,
    /// Whether the number of results adds to the score.
    pub count_bonus: bool,
}

impl FacilitySearch {
    const fn local(category: &'static str, weight: f64) -> Self {
        Self {
            category,
            weight,
            radius_m: LOCAL_RADIUS_M,
            count_bonus: true,
        }
    }

    const fn connectivity(category: &'static str, weight: f64, radius_m: f64) -> Self {
        Self {
            category,
            weight,
            radius_m,
            count_bonus: false,
        }
    }

    /// Weighted score for a search that found `count` facilities, the
    /// nearest `nearest_m` metres away.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn score(&self, nearest_m: f64, count: usize) -> f64 {
        let distance_score = (100.0 - nearest_m / self.radius_m * 100.0).max(0.0);
        if self.count_bonus {
            let count_score = (count as f64 / COUNT_SATURATION).min(1.0);
            distance_score.mul_add(DISTANCE_SHARE, count_score * COUNT_SHARE) * self.weight
        } else {
            distance_score * self.weight
        }
    }
}

/// Every search run for a location, in order.
pub const FACILITIES: &[FacilitySearch] = &[
    FacilitySearch::local("hospital", 0.2),
    FacilitySearch::local("school", 0.1),
    FacilitySearch::local("park", 0.05),
    FacilitySearch::local("shopping_mall", 0.1),
    FacilitySearch::local("restaurant", 0.05),
    FacilitySearch::local("train_station", 0.1),
    FacilitySearch::local("bus_station", 0.1),
    FacilitySearch::local("subway_station", 0.1),
    FacilitySearch::connectivity("airport", 0.2, 20_000.0),
    FacilitySearch::connectivity("train_station", 0.1, 10_000.0),
];

/// Sum of the weights of `facilities`.
#[must_use]
pub fn total_weight(facilities: &[FacilitySearch]) -> f64 {
    facilities.iter().map(|f| f.weight).sum()
}

/// Scores locations by the facilities around them.
pub struct ProximityScorer<'a> {
    places: &'a dyn PlacesSearch,
    facilities: &'a [FacilitySearch],
}

impl<'a> ProximityScorer<'a> {
    /// Creates a scorer running the standard [`FACILITIES`] searches.
    #[must_use]
    pub fn new(places: &'a dyn PlacesSearch) -> Self {
        Self::with_facilities(places, FACILITIES)
    }

    /// Creates a scorer running an explicit set of searches.
    #[must_use]
    pub const fn with_facilities(
        places: &'a dyn PlacesSearch,
        facilities: &'a [FacilitySearch],
    ) -> Self {
        Self { places, facilities }
    }

    /// Scores a location in `[0, 100]`.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::ExternalService`] if any search fails.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub async fn score(&self, location: Coordinates) -> ScoreResult<ProximityScore> {
        let mut total = 0.0;

        for facility in self.facilities {
            let found = self
                .places
                .search(location, facility.category, facility.radius_m)
                .await
                .map_err(|e| ScoreError::external("proximity calculation failed", e))?;

            let index = NearestIndex::new(location.latitude, &found);
            let Some(nearest) = index.nearest(location) else {
                log::debug!(
                    "No '{}' within {}m",
                    facility.category,
                    facility.radius_m
                );
                continue;
            };

            let entry = facility.score(nearest.distance_m, found.len());
            log::debug!(
                "{} '{}' within {}m, nearest {:.0}m: {entry:.2}",
                found.len(),
                facility.category,
                facility.radius_m,
                nearest.distance_m
            );
            total += entry;
        }

        let weight = total_weight(self.facilities);
        let normalized = if weight == 0.0 { 0.0 } else { total / weight };

        Ok(ProximityScore {
            proximity_score: normalized.trunc().clamp(0.0, 100.0) as u8,
        })
    }
}

#[cfg(test)]
mod tests {
    use livability_places::{PlacesError, StaticPlaces};

    use super::*;

    const CENTER: Coordinates = Coordinates::new(13.0827, 80.2707);

    struct FailingPlaces;

    #[async_trait::async_trait]
    impl PlacesSearch for FailingPlaces {
        async fn search(
            &self,
            _center: Coordinates,
            _category: &str,
            _radius_m: f64,
        ) -> Result<Vec<Coordinates>, PlacesError> {
            Err(PlacesError::Status {
                status: 403,
                body: "denied".to_string(),
            })
        }
    }

    #[test]
    fn facility_table_weights_sum_to_one_point_one() {
        assert!((total_weight(FACILITIES) - 1.1).abs() < 1e-9);
        assert_eq!(
            FACILITIES.iter().filter(|f| f.category == "train_station").count(),
            2
        );
    }

    #[test]
    fn entry_score_decays_with_distance() {
        let hospital = FACILITIES[0];
        assert!((hospital.score(0.0, 5) - 16.04).abs() < 1e-9);
        assert!((hospital.score(250.0, 10) - 8.04).abs() < 1e-9);
        assert!((hospital.score(900.0, 1) - 0.008).abs() < 1e-9);

        let airport = FACILITIES[8];
        assert!((airport.score(5_000.0, 1) - 15.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn no_facilities_scores_zero() {
        let places = StaticPlaces::default();
        let score = ProximityScorer::new(&places).score(CENTER).await.unwrap();
        assert_eq!(score.proximity_score, 0);
    }

    #[tokio::test]
    async fn single_hospital_at_location() {
        let places = StaticPlaces::new([("hospital".to_string(), vec![CENTER])]);
        let score = ProximityScorer::new(&places).score(CENTER).await.unwrap();
        // (100 * 0.8 + 0.2 * 0.2) * 0.2 / 1.1 = 14.55
        assert_eq!(score.proximity_score, 14);
    }

    #[tokio::test]
    async fn nearest_of_several_is_used() {
        let far = Coordinates::new(CENTER.latitude + 0.004, CENTER.longitude);
        let places = StaticPlaces::new([("airport".to_string(), vec![far, CENTER])]);
        let score = ProximityScorer::new(&places).score(CENTER).await.unwrap();
        // 100 * 0.2 / 1.1 = 18.18
        assert_eq!(score.proximity_score, 18);
    }

    #[tokio::test]
    async fn every_facility_at_location() {
        let places = StaticPlaces::new(
            FACILITIES
                .iter()
                .map(|f| (f.category.to_string(), vec![CENTER; 5])),
        );
        let score = ProximityScorer::new(&places).score(CENTER).await.unwrap();
        // Count shares cap local entries at 80.2: (80.2 * 0.8 + 100 * 0.3) / 1.1 = 85.6
        assert_eq!(score.proximity_score, 85);
    }

    #[tokio::test]
    async fn search_failure_is_external_service_error() {
        let err = ProximityScorer::new(&FailingPlaces)
            .score(CENTER)
            .await
            .unwrap_err();
        match err {
            ScoreError::ExternalService { message, detail } => {
                assert_eq!(message, "proximity calculation failed");
                assert!(detail.contains("403"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
