//! Port implementations backed by Postgres, the object store and the geocoder.

use radar_core::{Business, Coordinates, LandingConfig};
use radar_geocode::Geocoder;
use radar_storage::{ImageFile, StorageClient};
use sqlx::PgPool;

use crate::ports::{ImageUploader, LocationResolver, PartnerStore, StoreError, UploadError};

/// [`PartnerStore`] over the `businesses` and `settings` tables.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl PartnerStore for PgStore {
    async fn list_partners(&self) -> Result<Vec<Business>, StoreError> {
        Ok(radar_db::list_partners(&self.pool).await?)
    }

    async fn get_landing(&self, key: &str) -> Result<Option<LandingConfig>, StoreError> {
        Ok(radar_db::get_landing_config(&self.pool, key).await?)
    }

    async fn insert_partner(&self, partner: &Business) -> Result<(), StoreError> {
        Ok(radar_db::insert_partner(&self.pool, partner).await?)
    }

    async fn update_partner(&self, id: &str, partner: &Business) -> Result<(), StoreError> {
        Ok(radar_db::update_partner(&self.pool, id, partner).await?)
    }

    async fn delete_partner(&self, id: &str) -> Result<(), StoreError> {
        Ok(radar_db::delete_partner(&self.pool, id).await?)
    }

    async fn upsert_landing(&self, key: &str, config: &LandingConfig) -> Result<(), StoreError> {
        Ok(radar_db::upsert_landing_config(&self.pool, key, config).await?)
    }
}

impl ImageUploader for StorageClient {
    async fn upload_image(&self, file: ImageFile) -> Result<String, UploadError> {
        Ok(self.upload(&file).await?)
    }
}

impl LocationResolver for Geocoder {
    async fn resolve_location(&self, query: &str) -> Coordinates {
        self.resolve(query).await
    }
}

/// Stand-in uploader when no object store is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUploader;

impl ImageUploader for NoUploader {
    async fn upload_image(&self, file: ImageFile) -> Result<String, UploadError> {
        Err(UploadError(format!(
            "image storage is not configured; cannot upload '{}'",
            file.file_name
        )))
    }
}
