//! Catalog ingestion and reads
//!
//! Cars are embedded once at creation from their concatenated descriptive
//! text; there is no update path.

use std::sync::Arc;

use crate::db::models::Car;
use crate::db::{NewCar, Repository};
use crate::embeddings::Embedder;
use crate::errors::AppError;
use crate::not_found;

pub struct CatalogService {
    repo: Repository,
    embedder: Arc<dyn Embedder>,
}

/// Text fed to the embedding backend for a new car.
fn embedding_text(car: &NewCar) -> String {
    format!(
        "{} {} {} {} {}",
        car.company_name,
        car.model,
        car.year,
        car.description.as_deref().unwrap_or(""),
        car.features.join(" ")
    )
}

impl CatalogService {
    pub fn new(repo: Repository, embedder: Arc<dyn Embedder>) -> Self {
        Self { repo, embedder }
    }

    /// Create a catalog item. Embedding failure is tolerated: the row is
    /// stored with a null embedding and simply ranks last under
    /// similarity ordering.
    pub async fn create_car(&self, new_car: NewCar) -> Result<Car, AppError> {
        let text = embedding_text(&new_car);
        let embedding = match self.embedder.embed_query(&text).await {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(error = %e, "Embedding failed; storing car without embedding");
                None
            }
        };

        let car = self.repo.create_car(&new_car, embedding.as_deref()).await?;

        metrics::counter!("carhub_cars_created_total").increment(1);
        tracing::info!(car_id = car.id, company = %car.company_name, model = %car.model, "Car created");
        Ok(car)
    }

    pub async fn list_cars(&self) -> Result<Vec<Car>, AppError> {
        Ok(self.repo.list_cars().await?)
    }

    pub async fn get_car(&self, id: i32) -> Result<Car, AppError> {
        self.repo
            .get_car(id)
            .await?
            .ok_or_else(|| not_found!("car", id))
    }
}
