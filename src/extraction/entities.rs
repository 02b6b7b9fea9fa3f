use serde::{Deserialize, Deserializer};

use crate::db::models::{FuelType, Transmission};

/// The backend is told to "use null if not present", so a null list must
/// read as empty rather than failing the whole bag.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Requested result ordering, as named by the extraction backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Price,
    Mileage,
    Year,
    Model,
    Color,
    CompanyName,
    Random,
    Featured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Constraint bag produced by entity extraction. Request-scoped, never
/// persisted. All fields optional; `Default` is the all-empty bag the
/// pipeline falls back to on extraction failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractedEntities {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub year_min: Option<i32>,
    #[serde(default)]
    pub year_max: Option<i32>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub price_min: Option<f64>,
    #[serde(default)]
    pub price_max: Option<f64>,
    #[serde(default)]
    pub mileage: Option<f64>,
    #[serde(default)]
    pub mileage_min: Option<f64>,
    #[serde(default)]
    pub mileage_max: Option<f64>,
    #[serde(default)]
    pub transmission: Option<Transmission>,
    #[serde(default)]
    pub fuel_type: Option<FuelType>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub features: Vec<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub sort_by: Option<SortKey>,
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
    #[serde(default)]
    pub limit: Option<u64>,
}
