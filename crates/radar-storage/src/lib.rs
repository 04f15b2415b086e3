pub mod client;
pub mod error;
mod retry;

pub use client::{content_type_for, ImageFile, StorageClient, StorageSettings};
pub use error::StorageError;
