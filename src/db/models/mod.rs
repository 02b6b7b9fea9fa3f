//! Database entities for CarHub-rs
//!
//! SeaORM entities for the car catalog and test-drive bookings.
//! The pgvector `embedding` column on `cars` is deliberately left out of
//! the entity: it is written via raw SQL at ingestion and only ever read
//! inside vector-distance ORDER BY expressions, never materialized.

pub mod booking;
pub mod car;

pub use booking::Entity as BookingEntity;
pub use booking::Model as Booking;

pub use car::Entity as CarEntity;
pub use car::Model as Car;
pub use car::{FuelType, Transmission};
