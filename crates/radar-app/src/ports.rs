//! Seams between the controller and the outside world.
//!
//! The runtime only talks to the record store, the image uploader and the
//! location resolver through these traits, so tests can swap in fakes.

use std::future::Future;

use radar_core::{Business, Coordinates, LandingConfig};
use radar_storage::ImageFile;
use thiserror::Error;

/// A store failure, reduced to the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

impl From<radar_db::DbError> for StoreError {
    fn from(e: radar_db::DbError) -> Self {
        Self(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct UploadError(pub String);

impl From<radar_storage::StorageError> for UploadError {
    fn from(e: radar_storage::StorageError) -> Self {
        Self(e.to_string())
    }
}

/// Partner records and the landing configuration.
pub trait PartnerStore: Send + Sync + 'static {
    /// Every partner, premium first, otherwise stable.
    fn list_partners(&self) -> impl Future<Output = Result<Vec<Business>, StoreError>> + Send;

    fn get_landing(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<LandingConfig>, StoreError>> + Send;

    fn insert_partner(
        &self,
        partner: &Business,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Full replace of the record with this id.
    fn update_partner(
        &self,
        id: &str,
        partner: &Business,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn delete_partner(&self, id: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn upsert_landing(
        &self,
        key: &str,
        config: &LandingConfig,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

pub trait ImageUploader: Send + Sync + 'static {
    /// Uploads the file and returns its public URL.
    fn upload_image(&self, file: ImageFile)
        -> impl Future<Output = Result<String, UploadError>> + Send;
}

pub trait LocationResolver: Send + Sync + 'static {
    /// Always yields a coordinate, possibly an inexact fallback.
    fn resolve_location(&self, query: &str) -> impl Future<Output = Coordinates> + Send;
}
