//! Repository over SeaORM
//!
//! Plain CRUD goes through entity queries; everything touching the pgvector
//! `embedding` column or jsonb `features` containment is built as a raw
//! Statement, since SeaORM has no native pgvector support.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, Statement, TransactionTrait, Value,
};
use serde::Deserialize;
use serde_json::json;

use super::models::{booking, car, Booking, BookingEntity, Car, CarEntity, FuelType, Transmission};
use crate::config::DatabaseConfig;
use crate::errors::AppError;

/// Column list matching the `car::Model` fields, in table order.
/// `embedding` is intentionally absent: it is write-only from Rust.
const CAR_COLUMNS: &str = "id, company_name, model, year, price, mileage, color, transmission, \
     fuel_type, description, images, video, features, available_for_test_drive";

/// Name of the gist exclusion constraint guarding booking overlap.
const BOOKING_OVERLAP_CONSTRAINT: &str = "bookings_no_overlap";

#[derive(Clone)]
pub struct Repository {
    db: DatabaseConnection,
}

/// Insert payload for a catalog item. The embedding is computed by the
/// catalog service and passed alongside, never supplied by clients.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCar {
    pub company_name: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    pub mileage: i32,
    pub color: String,
    pub transmission: Transmission,
    pub fuel_type: FuelType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub video: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default = "default_true")]
    pub available_for_test_drive: bool,
}

fn default_true() -> bool {
    true
}

/// AND-combined predicates over the catalog. Every field is optional;
/// an all-`None` value (and empty features) means "no filtering".
#[derive(Debug, Clone, Default)]
pub struct CarFilters {
    pub price: Option<f64>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub mileage: Option<f64>,
    pub mileage_min: Option<f64>,
    pub mileage_max: Option<f64>,
    pub year: Option<i32>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    /// Substring match (ILIKE)
    pub color: Option<String>,
    pub transmission: Option<Transmission>,
    pub fuel_type: Option<FuelType>,
    /// Substring match (ILIKE)
    pub company_name: Option<String>,
    /// Substring match (ILIKE)
    pub model: Option<String>,
    /// Canonical feature tags; each one becomes a jsonb containment predicate
    pub features: Vec<String>,
}

impl CarFilters {
    pub fn is_empty(&self) -> bool {
        self.price.is_none()
            && self.price_min.is_none()
            && self.price_max.is_none()
            && self.mileage.is_none()
            && self.mileage_min.is_none()
            && self.mileage_max.is_none()
            && self.year.is_none()
            && self.year_min.is_none()
            && self.year_max.is_none()
            && self.color.is_none()
            && self.transmission.is_none()
            && self.fuel_type.is_none()
            && self.company_name.is_none()
            && self.model.is_none()
            && self.features.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Price,
    Mileage,
    Year,
    Model,
    Color,
    CompanyName,
}

impl SortColumn {
    fn as_sql(&self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Mileage => "mileage",
            Self::Year => "year",
            Self::Model => "model",
            Self::Color => "color",
            Self::CompanyName => "company_name",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Ordering strategy for a catalog query.
#[derive(Debug, Clone)]
pub enum CarOrder {
    Scalar(SortColumn, SortDirection),
    /// year DESC, id DESC - the recency fallback ordering
    Recency,
    /// newest ids first
    Featured,
    Random,
    /// Ascending L2 distance to the query embedding; rows with a null
    /// embedding sort last rather than being dropped.
    Distance(Vec<f32>),
    /// No caller-requested ordering; id ASC keeps responses deterministic.
    Unordered,
}

fn vector_literal(embedding: &[f32]) -> String {
    format!(
        "[{}]",
        embedding
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(",")
    )
}

fn push_cond(conds: &mut Vec<String>, values: &mut Vec<Value>, template: &str, value: Value) {
    values.push(value);
    conds.push(template.replace("$?", &format!("${}", values.len())));
}

/// Build the filtered catalog query. Returned SQL selects the full
/// `car::Model` column set; parameters are positional.
fn build_search_sql(filters: &CarFilters, order: &CarOrder, limit: u64) -> (String, Vec<Value>) {
    let mut conds: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(v) = filters.price_min {
        push_cond(&mut conds, &mut values, "price >= $?", v.into());
    }
    if let Some(v) = filters.price_max {
        push_cond(&mut conds, &mut values, "price <= $?", v.into());
    }
    if let Some(v) = filters.mileage_min {
        push_cond(&mut conds, &mut values, "mileage >= $?", v.into());
    }
    if let Some(v) = filters.mileage_max {
        push_cond(&mut conds, &mut values, "mileage <= $?", v.into());
    }
    if let Some(v) = filters.year_min {
        push_cond(&mut conds, &mut values, "year >= $?", v.into());
    }
    if let Some(v) = filters.year_max {
        push_cond(&mut conds, &mut values, "year <= $?", v.into());
    }
    if let Some(v) = filters.price {
        push_cond(&mut conds, &mut values, "price = $?", v.into());
    }
    if let Some(v) = filters.mileage {
        push_cond(&mut conds, &mut values, "mileage = $?", v.into());
    }
    if let Some(v) = filters.year {
        push_cond(&mut conds, &mut values, "year = $?", v.into());
    }
    if let Some(v) = &filters.color {
        push_cond(
            &mut conds,
            &mut values,
            "color ILIKE $?",
            format!("%{}%", v).into(),
        );
    }
    if let Some(v) = &filters.transmission {
        push_cond(
            &mut conds,
            &mut values,
            "transmission = $?",
            v.to_value().into(),
        );
    }
    if let Some(v) = &filters.fuel_type {
        push_cond(
            &mut conds,
            &mut values,
            "fuel_type = $?",
            v.to_value().into(),
        );
    }
    if let Some(v) = &filters.company_name {
        push_cond(
            &mut conds,
            &mut values,
            "company_name ILIKE $?",
            format!("%{}%", v).into(),
        );
    }
    if let Some(v) = &filters.model {
        push_cond(
            &mut conds,
            &mut values,
            "model ILIKE $?",
            format!("%{}%", v).into(),
        );
    }
    for feature in &filters.features {
        push_cond(
            &mut conds,
            &mut values,
            "features @> $?::jsonb",
            json!([feature]).to_string().into(),
        );
    }

    let mut sql = format!("SELECT {} FROM cars", CAR_COLUMNS);
    if !conds.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conds.join(" AND "));
    }

    let order_sql = match order {
        CarOrder::Scalar(col, dir) => format!("{} {}", col.as_sql(), dir.as_sql()),
        CarOrder::Recency => "year DESC, id DESC".to_string(),
        CarOrder::Featured => "id DESC".to_string(),
        CarOrder::Random => "random()".to_string(),
        CarOrder::Distance(embedding) => format!(
            "embedding <-> '{}'::vector NULLS LAST",
            vector_literal(embedding)
        ),
        CarOrder::Unordered => "id ASC".to_string(),
    };

    sql.push_str(&format!(" ORDER BY {} LIMIT {}", order_sql, limit));
    (sql, values)
}

#[derive(Debug, FromQueryResult)]
struct FeatureRow {
    feature: String,
}

impl Repository {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, DbErr> {
        let mut opt = sea_orm::ConnectOptions::new(&config.url);
        opt.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(std::time::Duration::from_secs(config.connect_timeout))
            .sqlx_logging(true);

        let db = sea_orm::Database::connect(opt).await?;
        Ok(Self { db })
    }

    /// Liveness check for the readiness probe
    pub async fn ping(&self) -> Result<(), DbErr> {
        self.db.ping().await
    }

    // =====================================================================
    // Catalog
    // =====================================================================

    pub async fn count_cars(&self) -> Result<u64, DbErr> {
        CarEntity::find().count(&self.db).await
    }

    pub async fn get_car(&self, id: i32) -> Result<Option<Car>, DbErr> {
        CarEntity::find_by_id(id).one(&self.db).await
    }

    pub async fn list_cars(&self) -> Result<Vec<Car>, DbErr> {
        CarEntity::find()
            .order_by_asc(car::Column::Id)
            .all(&self.db)
            .await
    }

    /// Insert a car with its embedding. Raw SQL because of the vector cast.
    pub async fn create_car(
        &self,
        new_car: &NewCar,
        embedding: Option<&[f32]>,
    ) -> Result<Car, DbErr> {
        let embedding_value: Value = embedding.map(vector_literal).into();

        let sql = format!(
            r#"
            INSERT INTO cars
                (company_name, model, year, price, mileage, color, transmission,
                 fuel_type, description, images, video, features, embedding,
                 available_for_test_drive)
            VALUES
                ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10::jsonb, $11, $12::jsonb,
                 $13::vector, $14)
            RETURNING {}
            "#,
            CAR_COLUMNS
        );

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            &sql,
            vec![
                new_car.company_name.clone().into(),
                new_car.model.clone().into(),
                new_car.year.into(),
                new_car.price.into(),
                new_car.mileage.into(),
                new_car.color.clone().into(),
                new_car.transmission.to_value().into(),
                new_car.fuel_type.to_value().into(),
                new_car.description.clone().into(),
                json!(new_car.images).to_string().into(),
                new_car.video.clone().into(),
                json!(new_car.features).to_string().into(),
                embedding_value,
                new_car.available_for_test_drive.into(),
            ],
        );

        // RETURNING gives us exactly one row
        Car::find_by_statement(stmt)
            .one(&self.db)
            .await?
            .ok_or_else(|| DbErr::RecordNotInserted)
    }

    /// Filtered, ordered, bounded catalog query
    pub async fn search_cars(
        &self,
        filters: &CarFilters,
        order: &CarOrder,
        limit: u64,
    ) -> Result<Vec<Car>, DbErr> {
        let (sql, values) = build_search_sql(filters, order, limit);
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, &sql, values);
        Car::find_by_statement(stmt).all(&self.db).await
    }

    /// All distinct feature tags currently in use, recomputed per call.
    pub async fn feature_vocabulary(&self) -> Result<HashSet<String>, DbErr> {
        let stmt = Statement::from_string(
            DbBackend::Postgres,
            "SELECT DISTINCT jsonb_array_elements_text(features) AS feature FROM cars",
        );
        let rows = FeatureRow::find_by_statement(stmt).all(&self.db).await?;
        Ok(rows.into_iter().map(|r| r.feature).collect())
    }

    // =====================================================================
    // Bookings
    // =====================================================================

    /// Booked slots for a car intersecting [from, to)
    pub async fn bookings_for_car_between(
        &self,
        car_id: i32,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Booking>, DbErr> {
        BookingEntity::find()
            .filter(booking::Column::CarId.eq(car_id))
            .filter(booking::Column::Status.eq(booking::STATUS_BOOKED))
            .filter(booking::Column::SlotStart.lt(to))
            .filter(booking::Column::SlotEnd.gt(from))
            .all(&self.db)
            .await
    }

    /// Atomic check-then-insert of a booking.
    ///
    /// The overlap check and the insert share one transaction; the
    /// `bookings_no_overlap` exclusion constraint backstops concurrent
    /// attempts that both pass the in-transaction check.
    pub async fn create_booking(
        &self,
        car_id: i32,
        slot_start: NaiveDateTime,
        slot_end: NaiveDateTime,
    ) -> Result<Booking, AppError> {
        let txn = self.db.begin().await?;

        let overlap = BookingEntity::find()
            .filter(booking::Column::CarId.eq(car_id))
            .filter(booking::Column::Status.eq(booking::STATUS_BOOKED))
            .filter(booking::Column::SlotStart.lt(slot_end))
            .filter(booking::Column::SlotEnd.gt(slot_start))
            .one(&txn)
            .await?;

        if overlap.is_some() {
            txn.rollback().await?;
            return Err(AppError::SlotConflict);
        }

        let inserted = booking::ActiveModel {
            car_id: Set(car_id),
            slot_start: Set(slot_start),
            slot_end: Set(slot_end),
            status: Set(booking::STATUS_BOOKED.to_string()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if e.to_string().contains(BOOKING_OVERLAP_CONSTRAINT) {
                AppError::SlotConflict
            } else {
                AppError::DatabaseQueryError(e)
            }
        })?;

        txn.commit().await?;
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sql_of(filters: &CarFilters, order: &CarOrder, limit: u64) -> String {
        build_search_sql(filters, order, limit).0
    }

    #[test]
    fn unfiltered_query_has_no_where_clause() {
        let (sql, values) = build_search_sql(&CarFilters::default(), &CarOrder::Recency, 10);
        assert!(!sql.contains("WHERE"));
        assert!(sql.ends_with("ORDER BY year DESC, id DESC LIMIT 10"));
        assert!(values.is_empty());
    }

    #[test]
    fn range_and_exact_filters_are_and_combined() {
        let filters = CarFilters {
            price_min: Some(5000.0),
            price_max: Some(20000.0),
            year: Some(2021),
            color: Some("red".to_string()),
            ..Default::default()
        };
        let (sql, values) = build_search_sql(&filters, &CarOrder::Recency, 10);
        assert!(sql.contains("price >= $1 AND price <= $2 AND year = $3 AND color ILIKE $4"));
        assert_eq!(values.len(), 4);
    }

    #[test]
    fn feature_filters_become_jsonb_containment() {
        let filters = CarFilters {
            features: vec!["sunroof".to_string(), "heated seats".to_string()],
            ..Default::default()
        };
        let (sql, values) = build_search_sql(&filters, &CarOrder::Recency, 5);
        assert!(sql.contains("features @> $1::jsonb AND features @> $2::jsonb"));
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn scalar_sort_maps_to_column_and_direction() {
        let order = CarOrder::Scalar(SortColumn::Price, SortDirection::Asc);
        let sql = sql_of(&CarFilters::default(), &order, 5);
        assert!(sql.contains("ORDER BY price ASC LIMIT 5"));

        let order = CarOrder::Scalar(SortColumn::CompanyName, SortDirection::Desc);
        let sql = sql_of(&CarFilters::default(), &order, 5);
        assert!(sql.contains("ORDER BY company_name DESC"));
    }

    #[test]
    fn distance_ordering_uses_l2_operator_with_nulls_last() {
        let order = CarOrder::Distance(vec![0.25, -1.0, 0.5]);
        let sql = sql_of(&CarFilters::default(), &order, 10);
        assert!(sql.contains("ORDER BY embedding <-> '[0.25,-1,0.5]'::vector NULLS LAST"));
    }

    #[test]
    fn random_and_featured_orderings() {
        assert!(sql_of(&CarFilters::default(), &CarOrder::Random, 3).contains("ORDER BY random()"));
        assert!(sql_of(&CarFilters::default(), &CarOrder::Featured, 3).contains("ORDER BY id DESC"));
        assert!(sql_of(&CarFilters::default(), &CarOrder::Unordered, 3).contains("ORDER BY id ASC"));
    }

    #[test]
    fn embedding_column_never_selected() {
        let sql = sql_of(&CarFilters::default(), &CarOrder::Recency, 10);
        let select_list = sql.split("FROM").next().unwrap();
        assert!(!select_list.contains("embedding"));
    }

    #[test]
    fn empty_filters_reported_empty() {
        assert!(CarFilters::default().is_empty());
        let filters = CarFilters {
            fuel_type: Some(FuelType::Electric),
            ..Default::default()
        };
        assert!(!filters.is_empty());
    }

    #[test]
    fn vector_literal_format() {
        assert_eq!(vector_literal(&[1.0, 2.5, -0.5]), "[1,2.5,-0.5]");
    }
}
