//! Reference data and trained models, built once at start-up.

use std::sync::Arc;

use livability_crime::CrimeScorer;
use livability_dataset::{DatasetError, Table};
use livability_disaster::arima::Arima111;
use livability_disaster::{DisasterIndex, DisasterScorer, DisasterTables};
use livability_house::forest::ForestParams;
use livability_house::sales::SalesData;
use livability_house::{GrowthScorer, HouseError, PriceModel};
use livability_score_models::progress::ProgressCallback;
use thiserror::Error;

use crate::config::ScoringConfig;

/// Errors from building a [`ScoringContext`].
#[derive(Debug, Error)]
pub enum ContextError {
    /// A reference dataset failed to load or lacks a required column.
    #[error("Failed to load {dataset} data: {source}")]
    Dataset {
        /// Which dataset failed.
        dataset: &'static str,
        /// Underlying error.
        source: DatasetError,
    },

    /// The price model could not be trained.
    #[error("Failed to build price model: {0}")]
    House(#[from] HouseError),
}

/// Immutable reference data shared by every request.
pub struct ScoringContext {
    crime: Table,
    disasters: DisasterIndex,
    price_model: PriceModel,
}

impl ScoringContext {
    /// Loads every dataset named in `config`, fits the disaster forecasts
    /// and trains the price model.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] if any dataset cannot be loaded or the
    /// price model cannot be trained.
    pub fn load(
        config: &ScoringConfig,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<Self, ContextError> {
        let read = |dataset: &'static str, file: &str| {
            Table::from_csv_path(&config.dataset_path(file))
                .map_err(|source| ContextError::Dataset { dataset, source })
        };

        let files = &config.datasets;
        let crime = read("crime", &files.crime)?;
        let disasters = DisasterTables {
            all: read("all disasters", &files.all_disasters)?,
            earthquakes: read("earthquake", &files.earthquakes)?,
            floods: read("flood", &files.floods)?,
            cyclones: read("cyclone", &files.cyclones)?,
        };
        let sales = read("sales", &files.sales)?;

        Self::from_tables(
            crime,
            &disasters,
            &sales,
            config.reference_year(),
            &config.forest,
            progress,
        )
    }

    /// Builds a context from already loaded tables.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] if a table lacks required columns or no
    /// sales survive preparation.
    pub fn from_tables(
        crime: Table,
        disasters: &DisasterTables,
        sales: &Table,
        reference_year: i32,
        forest: &ForestParams,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<Self, ContextError> {
        let disasters = DisasterIndex::build(disasters, &Arima111::default()).map_err(|source| {
            ContextError::Dataset {
                dataset: "all disasters",
                source,
            }
        })?;

        let data = SalesData::from_table(sales, reference_year)?;
        let price_model = PriceModel::train(data, forest, progress);

        Ok(Self {
            crime,
            disasters,
            price_model,
        })
    }

    /// Crime scorer over the loaded crime table.
    #[must_use]
    pub const fn crime(&self) -> CrimeScorer<'_> {
        CrimeScorer::new(&self.crime)
    }

    /// Disaster scorer over the prebuilt index.
    #[must_use]
    pub const fn disaster(&self) -> DisasterScorer<'_> {
        DisasterScorer::new(&self.disasters)
    }

    /// Growth scorer over the trained price model.
    #[must_use]
    pub const fn growth(&self) -> GrowthScorer<'_> {
        GrowthScorer::new(&self.price_model)
    }

    /// District names in the crime table.
    #[must_use]
    pub fn crime_districts(&self) -> Vec<String> {
        self.crime().districts()
    }

    /// District names in the disaster tables.
    #[must_use]
    pub fn disaster_districts(&self) -> &[String] {
        self.disasters.districts()
    }

    /// Area names in the sales data.
    #[must_use]
    pub fn cities(&self) -> &[String] {
        self.price_model.data().areas().classes()
    }

    /// The trained price model.
    #[must_use]
    pub const fn price_model(&self) -> &PriceModel {
        &self.price_model
    }
}
