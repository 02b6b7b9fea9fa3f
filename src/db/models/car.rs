//! Car entity (catalog item)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Transmission {
    #[sea_orm(string_value = "automatic")]
    Automatic,
    #[sea_orm(string_value = "manual")]
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    #[sea_orm(string_value = "petrol")]
    Petrol,
    #[sea_orm(string_value = "diesel")]
    Diesel,
    #[sea_orm(string_value = "electric")]
    Electric,
    #[sea_orm(string_value = "hybrid")]
    Hybrid,
    #[sea_orm(string_value = "other")]
    Other,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cars")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub company_name: String,

    pub model: String,

    pub year: i32,

    pub price: f64,

    pub mileage: i32,

    pub color: String,

    pub transmission: Transmission,

    pub fuel_type: FuelType,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Ordered list of image URLs
    pub images: Json,

    #[sea_orm(nullable)]
    pub video: Option<String>,

    /// Feature tags, order-irrelevant for matching
    pub features: Json,

    // The vector(384) `embedding` column lives on this table but not on this
    // entity; all vector work goes through raw Statements in the repository.
    pub available_for_test_drive: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
