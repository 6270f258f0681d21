//! Development map rendering.
//!
//! [`LeafletMapRenderer`] writes a standalone HTML page that loads Leaflet
//! and the marker-cluster plugin from a CDN, with the searched location as
//! a blue marker and nearby projects clustered in red.

use std::path::{Path, PathBuf};

use livability_score_models::Coordinates;
use serde::Serialize;
use thiserror::Error;

/// Zoom level the map opens at.
pub const INITIAL_ZOOM: u8 = 12;

/// Errors from rendering a map.
#[derive(Debug, Error)]
pub enum MapError {
    /// Writing the map file failed.
    #[error("Failed to write map {path}: {source}")]
    Io {
        /// Target file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Marker data could not be serialized.
    #[error("Failed to serialize map markers: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One labelled point on a map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    /// Marker position.
    #[serde(flatten)]
    pub coordinates: Coordinates,
    /// Popup text.
    pub label: String,
}

/// Renders a center point and markers to a file.
pub trait MapRenderer: Send + Sync {
    /// Renders the map and returns the path of the written file.
    ///
    /// # Errors
    ///
    /// Returns [`MapError`] if the file cannot be produced.
    fn render(&self, center: Coordinates, markers: &[MapMarker]) -> Result<PathBuf, MapError>;
}

/// Writes Leaflet HTML maps into a directory, one uniquely named file per
/// render.
#[derive(Debug, Clone)]
pub struct LeafletMapRenderer {
    output_dir: PathBuf,
}

impl LeafletMapRenderer {
    /// Creates a renderer writing into `output_dir`.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Directory maps are written to.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl MapRenderer for LeafletMapRenderer {
    fn render(&self, center: Coordinates, markers: &[MapMarker]) -> Result<PathBuf, MapError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| MapError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let path = self
            .output_dir
            .join(format!("development_map_{}.html", uuid::Uuid::new_v4()));
        let html = render_html(center, markers)?;

        std::fs::write(&path, html).map_err(|source| MapError::Io {
            path: path.clone(),
            source,
        })?;

        log::debug!("Wrote map with {} markers to {}", markers.len(), path.display());
        Ok(path)
    }
}

/// Serializes for embedding inside a `<script>` element.
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

fn render_html(center: Coordinates, markers: &[MapMarker]) -> Result<String, MapError> {
    let center_json = script_json(&center)?;
    let markers_json = script_json(markers)?;

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=1.0" />
<title>Development projects</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
<link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.5.3/dist/MarkerCluster.css" />
<link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.5.3/dist/MarkerCluster.Default.css" />
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<script src="https://unpkg.com/leaflet.markercluster@1.5.3/dist/leaflet.markercluster.js"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
const center = {center_json};
const projects = {markers_json};
const map = L.map("map").setView([center.latitude, center.longitude], {INITIAL_ZOOM});
L.tileLayer("https://{{s}}.tile.openstreetmap.org/{{z}}/{{x}}/{{y}}.png", {{
  attribution: "&copy; OpenStreetMap contributors"
}}).addTo(map);
L.circleMarker([center.latitude, center.longitude], {{ color: "blue", radius: 10 }})
  .bindPopup("PIN Code Location")
  .addTo(map);
const cluster = L.markerClusterGroup();
for (const p of projects) {{
  L.circleMarker([p.latitude, p.longitude], {{ color: "red", radius: 8 }})
    .bindPopup(p.label)
    .addTo(cluster);
}}
map.addLayer(cluster);
</script>
</body>
</html>
"#
    ))
}
