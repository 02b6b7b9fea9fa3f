//! Booking entity (test-drive slot reservation)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A reservation of the half-open interval [slot_start, slot_end) for a car.
///
/// Per car, no two rows with status = "booked" may overlap. The repository
/// enforces this with a check-then-insert transaction, backstopped by the
/// `bookings_no_overlap` exclusion constraint in the schema.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub car_id: i32,

    pub slot_start: DateTime,

    pub slot_end: DateTime,

    pub status: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::car::Entity",
        from = "Column::CarId",
        to = "super::car::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Car,
}

impl Related<super::car::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Car.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub const STATUS_BOOKED: &str = "booked";
