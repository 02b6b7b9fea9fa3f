use std::sync::Arc;

use crate::config::StorageConfig;
use crate::db::Repository;
use crate::embeddings::Embedder;
use crate::extraction::EntityExtractor;
use crate::services::booking::BookingService;
use crate::services::catalog::CatalogService;
use crate::services::chat::ChatService;
use crate::services::upload::UploadService;
use crate::storage::ObjectStore;

pub mod booking;
pub mod catalog;
pub mod chat;
pub mod intent;
pub mod upload;

// A container for all services to be injected into routes
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ChatService>,
    pub catalog_service: Arc<CatalogService>,
    pub booking_service: Arc<BookingService>,
    pub upload_service: Arc<UploadService>,
}

impl AppState {
    pub fn new(
        repo: Repository,
        embedder: Arc<dyn Embedder>,
        extractor: Arc<dyn EntityExtractor>,
        store: Arc<dyn ObjectStore>,
        storage_config: &StorageConfig,
    ) -> Self {
        // Repository is cheap to clone (connection pool inside)
        Self {
            chat_service: Arc::new(ChatService::new(
                repo.clone(),
                embedder.clone(),
                extractor,
            )),
            catalog_service: Arc::new(CatalogService::new(repo.clone(), embedder)),
            booking_service: Arc::new(BookingService::new(repo)),
            upload_service: Arc::new(UploadService::new(
                store,
                storage_config.key_prefix.clone(),
            )),
        }
    }
}
