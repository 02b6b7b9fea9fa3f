pub mod models;
pub mod repository;

pub use repository::{CarFilters, CarOrder, NewCar, Repository, SortColumn, SortDirection};
