//! Image upload pipeline: validate -> re-encode -> store

use std::sync::Arc;

use uuid::Uuid;

use crate::errors::AppError;
use crate::storage::{reencode, validate_extension, ObjectStore};

pub struct UploadService {
    store: Arc<dyn ObjectStore>,
    key_prefix: String,
}

impl UploadService {
    pub fn new(store: Arc<dyn ObjectStore>, key_prefix: String) -> Self {
        Self { store, key_prefix }
    }

    pub async fn upload_image(&self, filename: &str, bytes: Vec<u8>) -> Result<String, AppError> {
        // Extension check comes first; nothing is written for bad uploads
        let kind = validate_extension(filename)?;
        let encoded = reencode(&bytes, kind)?;

        let key = format!("{}/{}.{}", self.key_prefix, Uuid::new_v4(), kind.extension());
        let url = self.store.put(&key, encoded, kind.content_type()).await?;

        metrics::counter!("carhub_uploads_total").increment(1);
        tracing::info!(%key, "Image uploaded");
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io::Cursor;
    use std::sync::Mutex;

    /// Records puts; URL is just the key
    struct MemoryStore {
        puts: Mutex<Vec<(String, String)>>,
    }

    impl MemoryStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                puts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn put(
            &self,
            key: &str,
            _bytes: Vec<u8>,
            content_type: &str,
        ) -> Result<String, AppError> {
            self.puts
                .lock()
                .unwrap()
                .push((key.to_string(), content_type.to_string()));
            Ok(format!("memory://{}", key))
        }
    }

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(2, 2, image::Rgb([0, 0, 255]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn uploads_under_prefixed_uuid_key() {
        let store = MemoryStore::new();
        let service = UploadService::new(store.clone(), "images".to_string());

        let url = service.upload_image("car.png", png_bytes()).await.unwrap();
        assert!(url.starts_with("memory://images/"));
        assert!(url.ends_with(".png"));

        let puts = store.puts.lock().unwrap();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].1, "image/png");
    }

    #[tokio::test]
    async fn rejects_bad_extension_before_any_write() {
        let store = MemoryStore::new();
        let service = UploadService::new(store.clone(), "images".to_string());

        let err = service
            .upload_image("car.gif", png_bytes())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedImageType(_)));
        assert!(store.puts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_undecodable_payload_before_any_write() {
        let store = MemoryStore::new();
        let service = UploadService::new(store.clone(), "images".to_string());

        let err = service
            .upload_image("car.jpg", b"junk".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidFormat(_)));
        assert!(store.puts.lock().unwrap().is_empty());
    }
}
