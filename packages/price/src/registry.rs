//! Compile-time registry of development projects.
//!
//! The project list lives in `developments.toml` at the crate root and is
//! embedded via `include_str!`. Adding a project means adding a
//! `[[projects]]` entry there and bumping the expected count below.

use livability_score_models::Coordinates;
use serde::Deserialize;

/// Number of registered projects. Enforced by a test.
#[cfg(test)]
const EXPECTED_PROJECT_COUNT: usize = 25;

const DEVELOPMENTS_TOML: &str = include_str!("../developments.toml");

/// An announced infrastructure or real-estate project.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DevelopmentProject {
    /// Display name.
    pub name: String,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Expected price impact, 1 to 10.
    pub impact: u8,
}

impl DevelopmentProject {
    /// Project location.
    #[must_use]
    pub const fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

#[derive(Deserialize)]
struct DevelopmentsFile {
    projects: Vec<DevelopmentProject>,
}

/// Returns every registered development project.
///
/// # Panics
///
/// Panics if the embedded TOML fails to parse. It is a compile-time
/// constant, so a failure is a development error caught by the tests.
#[must_use]
pub fn all_projects() -> Vec<DevelopmentProject> {
    let file: DevelopmentsFile = toml::de::from_str(DEVELOPMENTS_TOML)
        .unwrap_or_else(|e| panic!("Failed to parse developments.toml: {e}"));
    file.projects
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_projects() {
        let projects = all_projects();
        assert_eq!(
            projects.len(),
            EXPECTED_PROJECT_COUNT,
            "Expected {EXPECTED_PROJECT_COUNT} development projects, found {}. \
             Update EXPECTED_PROJECT_COUNT after adding/removing projects.",
            projects.len()
        );
    }

    #[test]
    fn project_names_are_unique() {
        let mut seen = BTreeSet::new();
        for project in &all_projects() {
            assert!(
                seen.insert(project.name.clone()),
                "Duplicate development project: {}",
                project.name
            );
        }
    }

    #[test]
    fn all_projects_have_valid_fields() {
        for project in &all_projects() {
            assert!(!project.name.is_empty(), "Project has empty name");
            assert!(
                (1..=10).contains(&project.impact),
                "Project {} has impact {} outside 1-10",
                project.name,
                project.impact
            );
            assert!(
                (-90.0..=90.0).contains(&project.latitude)
                    && (-180.0..=180.0).contains(&project.longitude),
                "Project {} has invalid coordinates",
                project.name
            );
        }
    }
}
