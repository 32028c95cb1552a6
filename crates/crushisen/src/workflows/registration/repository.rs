use async_trait::async_trait;

use super::domain::{LookupField, PhotoReference, UserId, UserRecord};

/// Record store holding user rows keyed by [`UserId`].
///
/// Implementations must reject an `insert` whose email or pseudo is already stored with
/// [`RepositoryError::Duplicate`], so uniqueness holds even when two registrations race
/// past their lookups.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Case-sensitive exact match on `field`.
    async fn exists_by(&self, field: LookupField, value: &str) -> Result<bool, RepositoryError>;
    async fn find_by(
        &self,
        field: LookupField,
        value: &str,
    ) -> Result<Option<UserRecord>, RepositoryError>;
    async fn generate_id(&self) -> Result<UserId, RepositoryError>;
    async fn insert(&self, record: UserRecord) -> Result<(), RepositoryError>;
    async fn set_photo_url(&self, id: &UserId, photo_url: &str) -> Result<(), RepositoryError>;
    async fn fetch(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{field} already stored")]
    Duplicate { field: LookupField },
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Blob store receiving profile photos.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload the photo behind `photo` under `key`, returning its retrievable URL.
    async fn upload(&self, key: &str, photo: &PhotoReference) -> Result<String, StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("photo reference cannot be resolved: {0}")]
    UnresolvablePhoto(String),
    #[error("upload rejected: {0}")]
    Upload(String),
}
