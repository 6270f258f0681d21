#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Great-circle distances and nearest-neighbor lookups.
//!
//! Distances use the haversine formula on a sphere of radius
//! [`EARTH_RADIUS_KM`]. Nearest-neighbor queries build an R-tree over
//! points projected onto a local equirectangular plane around the query,
//! so Euclidean ordering in the tree matches great-circle ordering at the
//! city scale the scorers work at.

use geo::{Distance, HaversineMeasure, Point};
use livability_score_models::Coordinates;
use rstar::RTree;
use rstar::primitives::GeomWithData;

/// Earth radius used for every distance in the pipeline.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

fn sphere() -> HaversineMeasure {
    HaversineMeasure::new(EARTH_RADIUS_KM * 1000.0)
}

fn to_point(c: Coordinates) -> Point<f64> {
    Point::new(c.longitude, c.latitude)
}

/// Great-circle distance in metres.
#[must_use]
pub fn haversine_m(a: Coordinates, b: Coordinates) -> f64 {
    sphere().distance(to_point(a), to_point(b))
}

/// Great-circle distance in kilometres.
#[must_use]
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    haversine_m(a, b) / 1000.0
}

type IndexedPoint = GeomWithData<[f64; 2], Coordinates>;

/// The closest indexed point to a query and its distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest {
    /// Coordinates of the closest point.
    pub coordinates: Coordinates,
    /// Great-circle distance from the query, in metres.
    pub distance_m: f64,
}

/// R-tree over a set of points, projected around a reference latitude.
pub struct NearestIndex {
    tree: RTree<IndexedPoint>,
    lat_scale: f64,
}

impl NearestIndex {
    /// Builds an index over `points`, scaling longitudes by the cosine of
    /// `reference_latitude`.
    #[must_use]
    pub fn new(reference_latitude: f64, points: &[Coordinates]) -> Self {
        let lat_scale = reference_latitude.to_radians().cos();
        let entries = points
            .iter()
            .map(|&c| GeomWithData::new(project(c, lat_scale), c))
            .collect();

        Self {
            tree: RTree::bulk_load(entries),
            lat_scale,
        }
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Finds the single nearest point to `query`.
    #[must_use]
    pub fn nearest(&self, query: Coordinates) -> Option<Nearest> {
        let projected = project(query, self.lat_scale);
        self.tree.nearest_neighbor(&projected).map(|entry| Nearest {
            coordinates: entry.data,
            distance_m: haversine_m(query, entry.data),
        })
    }
}

fn project(c: Coordinates, lat_scale: f64) -> [f64; 2] {
    [c.longitude * lat_scale, c.latitude]
}
