#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Livability score aggregation.
//!
//! An [`Aggregator`] runs every scoring component for a [`ScoreRequest`]
//! in turn and folds the outcomes into one [`AggregateScore`]. A failed
//! component contributes [`FALLBACK_SCORE`] and is logged; it never fails
//! the request. The final score is the mean of the crime, price, growth
//! and proximity components. The disaster safety rating is reported
//! alongside but not averaged.

pub mod config;
pub mod context;
pub mod setup;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use livability_geocoder::Geocoder;
use livability_places::PlacesSearch;
use livability_price::PriceProximityScorer;
use livability_price::map::MapRenderer;
use livability_proximity::ProximityScorer;
use livability_score_models::{
    AggregateScore, Coordinates, CrimeScore, DisasterOutlook, FALLBACK_SCORE, GrowthScore,
    PriceScore, ProximityScore, ScoreComponent, ScoreResult,
};

pub use crate::config::{ConfigError, ScoringConfig};
pub use crate::context::{ContextError, ScoringContext};
pub use crate::setup::{SetupError, build_aggregator};

/// Number of components averaged into the final score.
pub const AVERAGED_COMPONENTS: f64 = 4.0;

/// Location identifiers for one scoring request.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRequest {
    /// District key into the crime table.
    pub crime_district: String,
    /// District key into the disaster tables.
    pub disaster_district: String,
    /// Pincode for the development-proximity score.
    pub pincode: String,
    /// Area key into the sales data.
    pub city: String,
    /// Location for the amenity proximity score.
    pub location: Coordinates,
}

/// Every component's outcome for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentResults {
    /// Crime component.
    pub crime: ScoreResult<CrimeScore>,
    /// Disaster component.
    pub disaster: ScoreResult<DisasterOutlook>,
    /// Development-proximity component.
    pub price: ScoreResult<PriceScore>,
    /// House growth component.
    pub growth: ScoreResult<GrowthScore>,
    /// Amenity proximity component.
    pub proximity: ScoreResult<ProximityScore>,
}

/// Runs every scorer for a request and combines the results.
pub struct Aggregator {
    context: Arc<ScoringContext>,
    price: PriceProximityScorer,
    places: Arc<dyn PlacesSearch>,
    publish_dir: Option<PathBuf>,
}

impl Aggregator {
    /// Creates an aggregator over a built context and its external
    /// collaborators. Rendered maps are left where the renderer wrote them.
    #[must_use]
    pub fn new(
        context: Arc<ScoringContext>,
        geocoder: Arc<dyn Geocoder>,
        places: Arc<dyn PlacesSearch>,
        renderer: Arc<dyn MapRenderer>,
    ) -> Self {
        Self {
            context,
            price: PriceProximityScorer::new(geocoder, renderer),
            places,
            publish_dir: None,
        }
    }

    /// Moves rendered maps into `dir` before reporting them.
    #[must_use]
    pub fn with_publish_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.publish_dir = Some(dir.into());
        self
    }

    /// Shared reference data.
    #[must_use]
    pub fn context(&self) -> &ScoringContext {
        &self.context
    }

    /// Runs every component and aggregates the outcome.
    pub async fn score(&self, request: &ScoreRequest) -> AggregateScore {
        let results = self.evaluate(request).await;
        self.aggregate(results)
    }

    /// Runs every component in turn, without combining them.
    pub async fn evaluate(&self, request: &ScoreRequest) -> ComponentResults {
        log::debug!("Scoring request {request:?}");

        let crime = self.context.crime().score(&request.crime_district);
        let disaster = self.context.disaster().score(&request.disaster_district);
        let price = self.price.score(&request.pincode).await;
        let growth = self.context.growth().score(&request.city);
        let proximity = ProximityScorer::new(self.places.as_ref())
            .score(request.location)
            .await;

        ComponentResults {
            crime,
            disaster,
            price,
            growth,
            proximity,
        }
    }

    /// Combines component outcomes, substituting [`FALLBACK_SCORE`] for
    /// every failed component.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn aggregate(&self, results: ComponentResults) -> AggregateScore {
        let crime_score = component(ScoreComponent::Crime, results.crime)
            .map_or(FALLBACK_SCORE, |c| c.crime_score);
        let safety_rating = component(ScoreComponent::Disaster, results.disaster)
            .map_or(FALLBACK_SCORE, |d| d.safety_rating);
        let (price_score, map_file) = component(ScoreComponent::PriceProximity, results.price)
            .map_or((FALLBACK_SCORE, None), |p| (p.price_score, p.map_file));
        let (growth_score, original_price_per_sqft, future_price_per_sqft) =
            component(ScoreComponent::HouseGrowth, results.growth).map_or(
                (FALLBACK_SCORE, FALLBACK_SCORE, FALLBACK_SCORE),
                |g| {
                    (
                        g.growth_score as f64,
                        g.original_price_per_sqft,
                        g.future_price_per_sqft,
                    )
                },
            );
        let proximity_score = component(ScoreComponent::Proximity, results.proximity)
            .map_or(FALLBACK_SCORE, |p| f64::from(p.proximity_score));

        let final_score =
            (crime_score + price_score + growth_score + proximity_score) / AVERAGED_COMPONENTS;

        AggregateScore {
            crime_score,
            safety_rating,
            price_score,
            growth_score,
            proximity_score,
            original_price_per_sqft,
            future_price_per_sqft,
            final_score,
            map_file: map_file.and_then(|path| self.publish(&path)),
        }
    }

    fn publish(&self, map_file: &Path) -> Option<PathBuf> {
        let Some(dir) = &self.publish_dir else {
            return Some(map_file.to_path_buf());
        };
        match publish_map(map_file, dir) {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!(
                    "Failed to publish map {} to {}: {e}",
                    map_file.display(),
                    dir.display()
                );
                None
            }
        }
    }
}

/// Logs a failed component and converts it to `None`.
fn component<T>(which: ScoreComponent, result: ScoreResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("{which} component failed, using {FALLBACK_SCORE}: {e}");
            None
        }
    }
}

/// Moves `file` into `dir`, keeping its name. Falls back to copy and
/// remove when a rename is not possible (e.g. across filesystems).
///
/// # Errors
///
/// Returns the I/O error if the file cannot be placed in `dir`.
pub fn publish_map(file: &Path, dir: &Path) -> std::io::Result<PathBuf> {
    let name = file.file_name().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} has no file name", file.display()),
        )
    })?;

    std::fs::create_dir_all(dir)?;
    let target = dir.join(name);

    if std::fs::rename(file, &target).is_err() {
        std::fs::copy(file, &target)?;
        std::fs::remove_file(file)?;
    }

    Ok(target)
}

#[cfg(test)]
mod tests {
    use livability_dataset::Table;
    use livability_disaster::DisasterTables;
    use livability_geocoder::StaticGeocoder;
    use livability_house::forest::ForestParams;
    use livability_places::StaticPlaces;
    use livability_price::map::LeafletMapRenderer;
    use livability_score_models::ScoreError;
    use livability_score_models::progress::null_progress;

    use super::*;

    const CHENNAI: Coordinates = Coordinates::new(13.0827, 80.2707);

    const CRIME_CSV: &str = "District,Death due to negligence relating to road accidents - I,Hit and Run - I,Other Accidents - I\n\
                             Chennai,120,45,300\n\
                             Ooty,0,0,0\n";

    const SALES_CSV: &str = "AREA,INT_SQFT,DATE_SALE,DIST_MAINROAD,N_BEDROOM,N_BATHROOM,N_ROOM,SALE_COND,PARK_FACIL,DATE_BUILD,SALES_PRICE\n\
                             Adyar,1000,04-05-2010,100,2,1,4,Normal Sale,Yes,15-05-1990,8000000\n\
                             Adyar,1100,04-05-2012,100,2,1,4,Normal Sale,Yes,15-05-1992,9000000\n\
                             Adyar,1200,04-05-2014,100,3,2,5,Normal Sale,Yes,15-05-1994,10000000\n\
                             Velachery,900,04-05-2010,50,1,1,3,AbNormal,No,20-08-1995,6000000\n\
                             Velachery,950,04-05-2013,50,1,1,3,AbNormal,No,20-08-1995,6500000\n";

    fn table(csv: &str) -> Table {
        Table::from_reader(csv.as_bytes()).unwrap()
    }

    fn context() -> Arc<ScoringContext> {
        let disasters = DisasterTables {
            all: table("Year,Chennai,Salem\n2000,40,10\n2001,42,12\n2002,45,9\n2003,47,11\n"),
            earthquakes: table("Year,Chennai,Salem\n2000,,\n"),
            floods: table("Year,Chennai,Salem\n2000,3,\n"),
            cyclones: table("Year,Chennai,Salem\n2000,,\n"),
        };
        let forest = ForestParams {
            n_trees: 5,
            ..ForestParams::default()
        };
        Arc::new(
            ScoringContext::from_tables(
                table(CRIME_CSV),
                &disasters,
                &table(SALES_CSV),
                2024,
                &forest,
                &null_progress(),
            )
            .unwrap(),
        )
    }

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("livability_{name}_{}", uuid::Uuid::new_v4()))
    }

    fn aggregator(maps: &Path) -> Aggregator {
        Aggregator::new(
            context(),
            Arc::new(StaticGeocoder::new([("600001".to_string(), CHENNAI)])),
            Arc::new(StaticPlaces::new([(
                "hospital".to_string(),
                vec![CHENNAI],
            )])),
            Arc::new(LeafletMapRenderer::new(maps)),
        )
    }

    fn request() -> ScoreRequest {
        ScoreRequest {
            crime_district: "Chennai".to_string(),
            disaster_district: "Salem".to_string(),
            pincode: "600001".to_string(),
            city: "Adyar".to_string(),
            location: CHENNAI,
        }
    }

    fn all_failed() -> ComponentResults {
        ComponentResults {
            crime: Err(ScoreError::not_found("district not found")),
            disaster: Err(ScoreError::not_found("district not found")),
            price: Err(ScoreError::not_found("location not found")),
            growth: Err(ScoreError::not_found("city not found")),
            proximity: Err(ScoreError::external("proximity calculation failed", "timeout")),
        }
    }

    #[test]
    fn all_components_failing_scores_zero() {
        let maps = temp_dir("maps_none");
        let score = aggregator(&maps).aggregate(all_failed());
        assert!(score.final_score.abs() < f64::EPSILON);
        assert!(score.safety_rating.abs() < f64::EPSILON);
        assert!(score.original_price_per_sqft.abs() < f64::EPSILON);
        assert!(score.map_file.is_none());
    }

    #[test]
    fn failed_components_contribute_zero() {
        let maps = temp_dir("maps_partial");
        let results = ComponentResults {
            crime: Ok(CrimeScore {
                district: "Chennai".to_string(),
                crime_score: 20.0,
            }),
            proximity: Ok(ProximityScore {
                proximity_score: 40,
            }),
            ..all_failed()
        };
        let score = aggregator(&maps).aggregate(results);
        assert!((score.final_score - 15.0).abs() < 1e-12);
        assert!((score.crime_score - 20.0).abs() < 1e-12);
        assert!(score.price_score.abs() < f64::EPSILON);
    }

    #[test]
    fn safety_rating_is_reported_but_not_averaged() {
        let maps = temp_dir("maps_rating");
        let results = ComponentResults {
            disaster: Ok(DisasterOutlook {
                district: "Salem".to_string(),
                safety_rating: 80.0,
                predictions: std::collections::BTreeMap::new(),
            }),
            ..all_failed()
        };
        let score = aggregator(&maps).aggregate(results);
        assert!((score.safety_rating - 80.0).abs() < 1e-12);
        assert!(score.final_score.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn full_request_averages_components_and_publishes_map() {
        let maps = temp_dir("maps_full");
        let publish = temp_dir("publish_full");
        let aggregator = aggregator(&maps).with_publish_dir(&publish);

        let results = aggregator.evaluate(&request()).await;
        assert!(results.crime.is_ok());
        assert!(results.disaster.is_ok());
        assert!(results.price.is_ok());
        assert!(results.growth.is_ok());
        assert_eq!(results.proximity, Ok(ProximityScore { proximity_score: 14 }));

        let score = aggregator.aggregate(results);
        assert!((score.crime_score - 13.35).abs() < 1e-9);
        assert!(score.price_score > 0.0);
        assert!((score.proximity_score - 14.0).abs() < f64::EPSILON);
        let expected = (score.crime_score
            + score.price_score
            + score.growth_score
            + score.proximity_score)
            / 4.0;
        assert!((score.final_score - expected).abs() < 1e-12);

        let map = score.map_file.unwrap();
        assert_eq!(map.parent(), Some(publish.as_path()));
        assert!(map.exists());
        assert_eq!(std::fs::read_dir(&maps).unwrap().count(), 0);

        std::fs::remove_dir_all(&maps).unwrap();
        std::fs::remove_dir_all(&publish).unwrap();
    }

    #[tokio::test]
    async fn unknown_keys_fall_back_without_failing() {
        let maps = temp_dir("maps_unknown");
        let request = ScoreRequest {
            crime_district: "Atlantis".to_string(),
            disaster_district: "Atlantis".to_string(),
            pincode: "000000".to_string(),
            city: "Atlantis".to_string(),
            location: Coordinates::new(0.0, 0.0),
        };
        let aggregator = Aggregator::new(
            context(),
            Arc::new(StaticGeocoder::default()),
            Arc::new(StaticPlaces::default()),
            Arc::new(LeafletMapRenderer::new(&maps)),
        );
        let score = aggregator.score(&request).await;
        assert!(score.final_score.abs() < f64::EPSILON);
        assert!(score.map_file.is_none());
    }

    #[test]
    fn publish_map_moves_the_file() {
        let src_dir = temp_dir("publish_src");
        let dst_dir = temp_dir("publish_dst");
        std::fs::create_dir_all(&src_dir).unwrap();
        let src = src_dir.join("map.html");
        std::fs::write(&src, "<html></html>").unwrap();

        let published = publish_map(&src, &dst_dir).unwrap();
        assert_eq!(published, dst_dir.join("map.html"));
        assert!(!src.exists());
        assert_eq!(std::fs::read_to_string(&published).unwrap(), "<html></html>");

        std::fs::remove_dir_all(&src_dir).unwrap();
        std::fs::remove_dir_all(&dst_dir).unwrap();
    }

    #[test]
    fn publishing_a_missing_map_reports_none() {
        let maps = temp_dir("maps_missing");
        let publish = temp_dir("publish_missing");
        let aggregator = aggregator(&maps).with_publish_dir(&publish);
        let results = ComponentResults {
            price: Ok(PriceScore {
                price_score: 10.0,
                nearby: Vec::new(),
                map_file: Some(maps.join("gone.html")),
            }),
            ..all_failed()
        };
        let score = aggregator.aggregate(results);
        assert!((score.price_score - 10.0).abs() < 1e-12);
        assert!(score.map_file.is_none());
        let _ = std::fs::remove_dir_all(&publish);
    }
}
