use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::workflows::registration::domain::{
    LookupField, PhotoReference, ProfileSubmission, UserId, UserRecord,
};
use crate::workflows::registration::repository::{
    BlobStore, RepositoryError, StorageError, UserRepository,
};
use crate::workflows::registration::{
    registration_router, LookupFailurePolicy, RegistrationService, RegistrationSettings,
};

/// Every call the fake stores receive, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum StoreCall {
    Exists(LookupField),
    Find(LookupField),
    GenerateId,
    Insert(UserId),
    Upload(String),
    SetPhotoUrl(UserId),
    Fetch(UserId),
}

pub(super) type Journal = Arc<Mutex<Vec<StoreCall>>>;

pub(super) fn calls(journal: &Journal) -> Vec<StoreCall> {
    journal.lock().expect("journal mutex poisoned").clone()
}

fn record_call(journal: &Journal, call: StoreCall) {
    journal.lock().expect("journal mutex poisoned").push(call);
}

pub(super) fn submission() -> ProfileSubmission {
    ProfileSubmission {
        last_name: "Mullot".to_string(),
        first_name: "Camille".to_string(),
        pseudo: "camille_m".to_string(),
        email: "camille.mullot@isen.fr".to_string(),
        address: "41 boulevard Vauban, Lille".to_string(),
        date_of_birth: "14/03/2003".to_string(),
        phone_number: "0612345678".to_string(),
        school_year: "M1".to_string(),
        description: "Climbing, jazz and late-night robotics.".to_string(),
        password: "Abcdefghi1@".to_string(),
        password_confirmation: "Abcdefghi1@".to_string(),
        photo: Some(PhotoReference(
            "content://media/external/images/media/42".to_string(),
        )),
    }
}

pub(super) fn settings(lookup_policy: LookupFailurePolicy) -> RegistrationSettings {
    RegistrationSettings {
        lookup_policy,
        image_prefix: "images/".to_string(),
    }
}

pub(super) fn existing_user(id: &str, email: &str, pseudo: &str) -> UserRecord {
    UserRecord {
        user_id: UserId(id.to_string()),
        last_name: "Durand".to_string(),
        first_name: "Alex".to_string(),
        pseudo: pseudo.to_string(),
        email: email.to_string(),
        address: "2 rue Norbert Segard, Lille".to_string(),
        date_of_birth: "01/09/2002".to_string(),
        phone_number: "0700000000".to_string(),
        school_year: "CIR3".to_string(),
        description: "Already here.".to_string(),
        password_hash: crate::workflows::registration::hash_password("Zyxwvutsr9!")
            .expect("hash succeeds"),
        photo_url: None,
        created_at: Utc
            .with_ymd_and_hms(2025, 9, 1, 8, 0, 0)
            .single()
            .expect("valid timestamp"),
    }
}

#[derive(Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<UserId, UserRecord>>>,
    journal: Journal,
    failing_lookups: bool,
    next_id: Arc<Mutex<u32>>,
}

impl MemoryRepository {
    pub(super) fn new(journal: Journal) -> Self {
        Self {
            records: Arc::default(),
            journal,
            failing_lookups: false,
            next_id: Arc::new(Mutex::new(1)),
        }
    }

    pub(super) fn with_failing_lookups(mut self) -> Self {
        self.failing_lookups = true;
        self
    }

    pub(super) fn seed(&self, record: UserRecord) {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .insert(record.user_id.clone(), record);
    }

    pub(super) fn record(&self, id: &UserId) -> Option<UserRecord> {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned()
    }

    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

#[async_trait]
impl UserRepository for MemoryRepository {
    async fn exists_by(&self, field: LookupField, value: &str) -> Result<bool, RepositoryError> {
        record_call(&self.journal, StoreCall::Exists(field));
        if self.failing_lookups {
            return Err(RepositoryError::Unavailable("lookup timed out".to_string()));
        }
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().any(|record| record.value_of(field) == value))
    }

    async fn find_by(
        &self,
        field: LookupField,
        value: &str,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        record_call(&self.journal, StoreCall::Find(field));
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .find(|record| record.value_of(field) == value)
            .cloned())
    }

    async fn generate_id(&self) -> Result<UserId, RepositoryError> {
        record_call(&self.journal, StoreCall::GenerateId);
        let mut next = self.next_id.lock().expect("id mutex poisoned");
        let id = UserId(format!("user-{:04}", *next));
        *next += 1;
        Ok(id)
    }

    async fn insert(&self, record: UserRecord) -> Result<(), RepositoryError> {
        record_call(&self.journal, StoreCall::Insert(record.user_id.clone()));
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        for field in [LookupField::Email, LookupField::Pseudo] {
            if guard
                .values()
                .any(|existing| existing.value_of(field) == record.value_of(field))
            {
                return Err(RepositoryError::Duplicate { field });
            }
        }
        guard.insert(record.user_id.clone(), record);
        Ok(())
    }

    async fn set_photo_url(&self, id: &UserId, photo_url: &str) -> Result<(), RepositoryError> {
        record_call(&self.journal, StoreCall::SetPhotoUrl(id.clone()));
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let record = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        record.photo_url = Some(photo_url.to_string());
        Ok(())
    }

    async fn fetch(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError> {
        record_call(&self.journal, StoreCall::Fetch(id.clone()));
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

/// Lookups pass but every insert collides, as if another registration won the race.
pub(super) struct RacingRepository {
    pub(super) inner: MemoryRepository,
    pub(super) colliding_field: LookupField,
}

#[async_trait]
impl UserRepository for RacingRepository {
    async fn exists_by(&self, field: LookupField, value: &str) -> Result<bool, RepositoryError> {
        self.inner.exists_by(field, value).await
    }

    async fn find_by(
        &self,
        field: LookupField,
        value: &str,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        self.inner.find_by(field, value).await
    }

    async fn generate_id(&self) -> Result<UserId, RepositoryError> {
        self.inner.generate_id().await
    }

    async fn insert(&self, _record: UserRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Duplicate {
            field: self.colliding_field,
        })
    }

    async fn set_photo_url(&self, id: &UserId, photo_url: &str) -> Result<(), RepositoryError> {
        self.inner.set_photo_url(id, photo_url).await
    }

    async fn fetch(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError> {
        self.inner.fetch(id).await
    }
}

pub(super) struct UnavailableRepository;

#[async_trait]
impl UserRepository for UnavailableRepository {
    async fn exists_by(&self, _field: LookupField, _value: &str) -> Result<bool, RepositoryError> {
        Ok(false)
    }

    async fn find_by(
        &self,
        _field: LookupField,
        _value: &str,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn generate_id(&self) -> Result<UserId, RepositoryError> {
        Ok(UserId("user-offline".to_string()))
    }

    async fn insert(&self, _record: UserRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn set_photo_url(&self, _id: &UserId, _photo_url: &str) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    async fn fetch(&self, _id: &UserId) -> Result<Option<UserRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Clone)]
pub(super) struct MemoryBlobs {
    journal: Journal,
    uploads: Arc<Mutex<Vec<(String, PhotoReference)>>>,
    reject_uploads: bool,
}

impl MemoryBlobs {
    pub(super) fn new(journal: Journal) -> Self {
        Self {
            journal,
            uploads: Arc::default(),
            reject_uploads: false,
        }
    }

    pub(super) fn rejecting(mut self) -> Self {
        self.reject_uploads = true;
        self
    }

    pub(super) fn uploads(&self) -> Vec<(String, PhotoReference)> {
        self.uploads.lock().expect("blob mutex poisoned").clone()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobs {
    async fn upload(&self, key: &str, photo: &PhotoReference) -> Result<String, StorageError> {
        record_call(&self.journal, StoreCall::Upload(key.to_string()));
        if self.reject_uploads {
            return Err(StorageError::Upload("quota exceeded".to_string()));
        }
        self.uploads
            .lock()
            .expect("blob mutex poisoned")
            .push((key.to_string(), photo.clone()));
        Ok(format!("https://storage.crushisen.test/{key}"))
    }
}

pub(super) type MemoryService = RegistrationService<MemoryRepository, MemoryBlobs>;

pub(super) fn build_service(
    lookup_policy: LookupFailurePolicy,
) -> (MemoryService, MemoryRepository, MemoryBlobs, Journal) {
    let journal = Journal::default();
    let repository = MemoryRepository::new(journal.clone());
    let blobs = MemoryBlobs::new(journal.clone());
    let service = RegistrationService::new(
        Arc::new(repository.clone()),
        Arc::new(blobs.clone()),
        settings(lookup_policy),
    );
    (service, repository, blobs, journal)
}

pub(super) fn service_with<R: UserRepository + 'static>(
    repository: R,
    blobs: MemoryBlobs,
    lookup_policy: LookupFailurePolicy,
) -> RegistrationService<R, MemoryBlobs> {
    RegistrationService::new(
        Arc::new(repository),
        Arc::new(blobs),
        settings(lookup_policy),
    )
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    registration_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
