use async_trait::async_trait;
use crushisen::workflows::registration::{
    BlobStore, LookupField, PhotoReference, RepositoryError, StorageError, UserId, UserRecord,
    UserRepository,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local user table with unique email and pseudo indexes.
#[derive(Default, Clone)]
pub(crate) struct InMemoryUserRepository {
    records: Arc<Mutex<HashMap<UserId, UserRecord>>>,
}

impl InMemoryUserRepository {
    fn records(&self) -> Result<MutexGuard<'_, HashMap<UserId, UserRecord>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("user table lock poisoned".to_string()))
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn exists_by(&self, field: LookupField, value: &str) -> Result<bool, RepositoryError> {
        let guard = self.records()?;
        Ok(guard.values().any(|record| record.value_of(field) == value))
    }

    async fn find_by(
        &self,
        field: LookupField,
        value: &str,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        let guard = self.records()?;
        Ok(guard
            .values()
            .find(|record| record.value_of(field) == value)
            .cloned())
    }

    async fn generate_id(&self) -> Result<UserId, RepositoryError> {
        Ok(UserId(Uuid::new_v4().to_string()))
    }

    async fn insert(&self, record: UserRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records()?;
        for field in [LookupField::Email, LookupField::Pseudo] {
            let value = record.value_of(field);
            if guard
                .values()
                .any(|existing| existing.value_of(field) == value)
            {
                return Err(RepositoryError::Duplicate { field });
            }
        }
        guard.insert(record.user_id.clone(), record);
        Ok(())
    }

    async fn set_photo_url(&self, id: &UserId, photo_url: &str) -> Result<(), RepositoryError> {
        let mut guard = self.records()?;
        let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        record.photo_url = Some(photo_url.to_string());
        Ok(())
    }

    async fn fetch(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError> {
        let guard = self.records()?;
        Ok(guard.get(id).cloned())
    }
}

/// Keeps uploaded photo references by key and serves them under a public base URL.
#[derive(Clone)]
pub(crate) struct InMemoryBlobStore {
    public_base_url: String,
    objects: Arc<Mutex<HashMap<String, PhotoReference>>>,
}

impl InMemoryBlobStore {
    pub(crate) fn new(public_base_url: &str) -> Self {
        Self {
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            objects: Arc::default(),
        }
    }

    pub(crate) fn object_count(&self) -> usize {
        self.objects.lock().map(|guard| guard.len()).unwrap_or(0)
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(&self, key: &str, photo: &PhotoReference) -> Result<String, StorageError> {
        if photo.0.trim().is_empty() {
            return Err(StorageError::UnresolvablePhoto(
                "empty photo reference".to_string(),
            ));
        }
        self.objects
            .lock()
            .map_err(|_| StorageError::Upload("blob table lock poisoned".to_string()))?
            .insert(key.to_string(), photo.clone());
        Ok(format!("{}/{}", self.public_base_url, key))
    }
}
