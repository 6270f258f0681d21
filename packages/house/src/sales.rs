//! Sales transaction preparation.
//!
//! Turns the raw sales table into fully-populated numeric records: dates
//! become year offsets from a reference year, missing numerics take the
//! column median, missing categoricals take fixed defaults, and categorical
//! columns are encoded through per-column [`Vocabulary`] instances.

use chrono::{Datelike as _, NaiveDate};
use livability_dataset::{Row, Table};

use crate::HouseError;
use crate::vocabulary::Vocabulary;

/// Date format used by `DATE_SALE` and `DATE_BUILD`.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Default for a missing `SALE_COND`.
pub const DEFAULT_SALE_CONDITION: &str = "Unknown";

/// Default for a missing `PARK_FACIL`.
pub const DEFAULT_PARKING: &str = "No";

/// Model input features, in the column order the forest sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    /// Encoded area name.
    Area,
    /// Interior square footage.
    IntSqft,
    /// Distance to the main road.
    DistMainroad,
    /// Bedroom count.
    Bedrooms,
    /// Bathroom count.
    Bathrooms,
    /// Room count.
    Rooms,
    /// Encoded parking facility flag.
    Parking,
    /// Years between the sale and the reference year.
    YearsSinceSale,
    /// Years between construction and the reference year.
    YearsSinceBuild,
}

/// Number of model input features.
pub const FEATURE_COUNT: usize = 9;

impl Feature {
    /// Returns all variants in model column order.
    #[must_use]
    pub const fn all() -> &'static [Self; FEATURE_COUNT] {
        &[
            Self::Area,
            Self::IntSqft,
            Self::DistMainroad,
            Self::Bedrooms,
            Self::Bathrooms,
            Self::Rooms,
            Self::Parking,
            Self::YearsSinceSale,
            Self::YearsSinceBuild,
        ]
    }

    /// Features extrapolated along their historical trend.
    #[must_use]
    pub const fn trended() -> &'static [Self] {
        &[
            Self::IntSqft,
            Self::DistMainroad,
            Self::Bedrooms,
            Self::Bathrooms,
            Self::Rooms,
        ]
    }

    /// Position in the feature vector.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Numeric source column, for features read directly from the table.
    const fn numeric_column(self) -> Option<&'static str> {
        match self {
            Self::IntSqft => Some("INT_SQFT"),
            Self::DistMainroad => Some("DIST_MAINROAD"),
            Self::Bedrooms => Some("N_BEDROOM"),
            Self::Bathrooms => Some("N_BATHROOM"),
            Self::Rooms => Some("N_ROOM"),
            Self::Area | Self::Parking | Self::YearsSinceSale | Self::YearsSinceBuild => None,
        }
    }
}

/// One prepared sale.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRecord {
    /// Area name as written in the data.
    pub area: String,
    /// Encoded sale condition.
    pub sale_condition: usize,
    /// Model inputs, indexed by [`Feature::index`].
    pub features: [f64; FEATURE_COUNT],
    /// Sale price.
    pub price: f64,
}

impl SaleRecord {
    /// Reads one feature.
    #[must_use]
    pub const fn get(&self, feature: Feature) -> f64 {
        self.features[feature.index()]
    }
}

/// Prepared sales with the vocabularies used to encode them.
#[derive(Debug, Clone, Default)]
pub struct SalesData {
    records: Vec<SaleRecord>,
    areas: Vocabulary,
    sale_conditions: Vocabulary,
    parking: Vocabulary,
}

struct RawSale {
    area: String,
    sale_condition: String,
    parking: String,
    numerics: [Option<f64>; FEATURE_COUNT],
    price: f64,
}

impl SalesData {
    /// Prepares every row of the sales table.
    ///
    /// Rows without a parseable `SALES_PRICE` or `AREA` are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`HouseError`] if a required column is missing or no rows
    /// survive preparation.
    pub fn from_table(table: &Table, reference_year: i32) -> Result<Self, HouseError> {
        for column in ["AREA", "SALES_PRICE", "INT_SQFT", "DATE_SALE", "DATE_BUILD"] {
            table.require_column(column)?;
        }

        let raw: Vec<RawSale> = table
            .rows()
            .filter_map(|row| RawSale::read(&row, reference_year))
            .collect();

        let dropped = table.len() - raw.len();
        if dropped > 0 {
            log::warn!("Dropped {dropped} sales rows without a price or area");
        }
        if raw.is_empty() {
            return Err(HouseError::NoTrainingData);
        }

        let mut medians = [0.0; FEATURE_COUNT];
        for (i, slot) in medians.iter_mut().enumerate() {
            let present: Vec<f64> = raw.iter().filter_map(|r| r.numerics[i]).collect();
            *slot = median(&present).unwrap_or(0.0);
        }

        let areas = Vocabulary::fit(raw.iter().map(|r| r.area.clone()));
        let sale_conditions = Vocabulary::fit(raw.iter().map(|r| r.sale_condition.clone()));
        let parking = Vocabulary::fit(raw.iter().map(|r| r.parking.clone()));

        let records = raw
            .into_iter()
            .map(|r| {
                let mut features = [0.0; FEATURE_COUNT];
                for (i, value) in features.iter_mut().enumerate() {
                    *value = r.numerics[i].unwrap_or(medians[i]);
                }
                features[Feature::Area.index()] = code(&areas, &r.area);
                features[Feature::Parking.index()] = code(&parking, &r.parking);

                SaleRecord {
                    sale_condition: sale_conditions.encode(&r.sale_condition).unwrap_or(0),
                    area: r.area,
                    features,
                    price: r.price,
                }
            })
            .collect::<Vec<_>>();

        log::info!(
            "Prepared {} sales across {} areas",
            records.len(),
            areas.len()
        );

        Ok(Self {
            records,
            areas,
            sale_conditions,
            parking,
        })
    }

    /// Every prepared sale in table order.
    #[must_use]
    pub fn records(&self) -> &[SaleRecord] {
        &self.records
    }

    /// Area vocabulary.
    #[must_use]
    pub const fn areas(&self) -> &Vocabulary {
        &self.areas
    }

    /// Sale condition vocabulary.
    #[must_use]
    pub const fn sale_conditions(&self) -> &Vocabulary {
        &self.sale_conditions
    }

    /// Parking facility vocabulary.
    #[must_use]
    pub const fn parking(&self) -> &Vocabulary {
        &self.parking
    }
}

impl RawSale {
    fn read(row: &Row<'_>, reference_year: i32) -> Option<Self> {
        let area = row.get_non_empty("AREA")?.to_owned();
        let price = row.numeric("SALES_PRICE")?;

        let mut numerics = [None; FEATURE_COUNT];
        for feature in Feature::all() {
            if let Some(column) = feature.numeric_column() {
                numerics[feature.index()] = row.numeric(column);
            }
        }
        numerics[Feature::YearsSinceSale.index()] =
            years_since(row.get("DATE_SALE"), reference_year);
        numerics[Feature::YearsSinceBuild.index()] =
            years_since(row.get("DATE_BUILD"), reference_year);

        Some(Self {
            area,
            sale_condition: row
                .get_non_empty("SALE_COND")
                .unwrap_or(DEFAULT_SALE_CONDITION)
                .to_owned(),
            parking: row
                .get_non_empty("PARK_FACIL")
                .unwrap_or(DEFAULT_PARKING)
                .to_owned(),
            numerics,
            price,
        })
    }
}

fn years_since(raw: Option<&str>, reference_year: i32) -> Option<f64> {
    let date = NaiveDate::parse_from_str(raw?.trim(), DATE_FORMAT).ok()?;
    Some(f64::from(reference_year - date.year()))
}

#[allow(clippy::cast_precision_loss)]
fn code(vocab: &Vocabulary, label: &str) -> f64 {
    vocab.encode(label).map_or(0.0, |c| c as f64)
}

/// Median of the values, averaging the middle pair for even counts.
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 {
        f64::midpoint(sorted[mid - 1], sorted[mid])
    } else {
        sorted[mid]
    })
}
