use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::credentials::{self, CredentialError};
use super::domain::{
    LookupField, PhotoReference, ProfileSubmission, RegistrationReceipt, UserId, UserRecord,
    UserView,
};
use super::repository::{BlobStore, RepositoryError, StorageError, UserRepository};
use super::settings::{LookupFailurePolicy, RegistrationSettings};
use super::validation::{self, ValidationFailure};

/// Stateless orchestrator running the sign-up gates against the record and blob stores.
pub struct RegistrationService<R, B> {
    repository: Arc<R>,
    blobs: Arc<B>,
    settings: RegistrationSettings,
}

/// Outcome of a successful registration.
///
/// The user row is already written. `photo_upload` finishes the photo upload and the
/// `photo_url` patch in the background; dropping the handle detaches it.
#[derive(Debug)]
pub struct Registration {
    pub receipt: RegistrationReceipt,
    pub photo_upload: JoinHandle<Result<String, PersistenceFailure>>,
}

impl<R, B> RegistrationService<R, B>
where
    R: UserRepository + 'static,
    B: BlobStore + 'static,
{
    pub fn new(repository: Arc<R>, blobs: Arc<B>, settings: RegistrationSettings) -> Self {
        Self {
            repository,
            blobs,
            settings,
        }
    }

    pub fn settings(&self) -> &RegistrationSettings {
        &self.settings
    }

    /// Run every gate in order and, when all pass, write the user and start the photo upload.
    pub async fn register(
        &self,
        submission: ProfileSubmission,
    ) -> Result<Registration, RegistrationError> {
        let outcome = match self.run_gates(&submission).await {
            Ok(()) => self.commit(submission).await,
            Err(err) => Err(err),
        };

        match &outcome {
            Err(RegistrationError::Validation(failure)) => {
                warn!(code = failure.code(), "registration rejected");
            }
            Err(other) => warn!(error = %other, "registration aborted"),
            Ok(_) => {}
        }

        outcome
    }

    /// Sign in with an email or pseudo.
    pub async fn authenticate(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<UserView, AuthenticationError> {
        if !validation::is_non_blank(identifier) || !validation::is_non_blank(password) {
            return Err(AuthenticationError::InvalidCredentials);
        }

        let order = if identifier.contains('@') {
            [LookupField::Email, LookupField::Pseudo]
        } else {
            [LookupField::Pseudo, LookupField::Email]
        };

        let mut found = None;
        for field in order {
            if let Some(record) = self.repository.find_by(field, identifier).await? {
                found = Some(record);
                break;
            }
        }
        let Some(record) = found else {
            return Err(AuthenticationError::InvalidCredentials);
        };

        let password = password.to_string();
        let stored_hash = record.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || {
            credentials::verify_password(&password, &stored_hash)
        })
        .await
        .map_err(|err| CredentialError::Hash(err.to_string()))??;

        if verified {
            info!(user_id = %record.user_id, "user signed in");
            Ok(record.view())
        } else {
            Err(AuthenticationError::InvalidCredentials)
        }
    }

    pub async fn get(&self, user_id: &UserId) -> Result<UserRecord, RepositoryError> {
        self.repository
            .fetch(user_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn run_gates(&self, submission: &ProfileSubmission) -> Result<(), RegistrationError> {
        validation::check_form(submission)?;
        self.ensure_available(LookupField::Email, &submission.email)
            .await?;
        self.ensure_available(LookupField::Pseudo, &submission.pseudo)
            .await?;
        validation::check_credentials(submission)?;
        Ok(())
    }

    async fn ensure_available(
        &self,
        field: LookupField,
        value: &str,
    ) -> Result<(), RegistrationError> {
        match self.repository.exists_by(field, value).await {
            Ok(false) => Ok(()),
            Ok(true) => Err(taken(field).into()),
            Err(source) => match self.settings.lookup_policy {
                LookupFailurePolicy::FailClosed => {
                    Err(RegistrationError::LookupUnavailable { field, source })
                }
                LookupFailurePolicy::FailOpen => {
                    warn!(
                        %field,
                        error = %source,
                        "uniqueness lookup failed, treating value as free"
                    );
                    Ok(())
                }
            },
        }
    }

    async fn commit(
        &self,
        submission: ProfileSubmission,
    ) -> Result<Registration, RegistrationError> {
        let photo = submission
            .photo
            .clone()
            .ok_or(ValidationFailure::NoImageSelected)?;

        let user_id = self.repository.generate_id().await?;

        let password = submission.password.clone();
        let password_hash =
            tokio::task::spawn_blocking(move || credentials::hash_password(&password))
                .await
                .map_err(|err| CredentialError::Hash(err.to_string()))??;

        let record =
            UserRecord::from_submission(user_id.clone(), submission, password_hash, Utc::now());
        let receipt = RegistrationReceipt {
            user_id: user_id.clone(),
            pseudo: record.pseudo.clone(),
            email: record.email.clone(),
        };

        self.repository
            .insert(record)
            .await
            .map_err(|err| match err {
                RepositoryError::Duplicate { field } => {
                    RegistrationError::Validation(taken(field))
                }
                other => RegistrationError::Persistence(other),
            })?;

        info!(user_id = %receipt.user_id, pseudo = %receipt.pseudo, "account created");

        let key = format!("{}{}.jpg", self.settings.image_prefix, Uuid::new_v4());
        let photo_upload = tokio::spawn(attach_photo(
            Arc::clone(&self.repository),
            Arc::clone(&self.blobs),
            user_id,
            photo,
            key,
        ));

        Ok(Registration {
            receipt,
            photo_upload,
        })
    }
}

fn taken(field: LookupField) -> ValidationFailure {
    match field {
        LookupField::Email => ValidationFailure::EmailTaken,
        LookupField::Pseudo => ValidationFailure::PseudoTaken,
    }
}

/// Upload the photo, then patch its URL onto the user row. Failures are logged, never retried.
async fn attach_photo<R, B>(
    repository: Arc<R>,
    blobs: Arc<B>,
    user_id: UserId,
    photo: PhotoReference,
    key: String,
) -> Result<String, PersistenceFailure>
where
    R: UserRepository,
    B: BlobStore,
{
    let photo_url = match blobs.upload(&key, &photo).await {
        Ok(url) => url,
        Err(source) => {
            error!(%user_id, %key, error = %source, "profile photo upload failed");
            return Err(PersistenceFailure::Upload(source));
        }
    };

    if let Err(source) = repository.set_photo_url(&user_id, &photo_url).await {
        error!(%user_id, error = %source, "failed to record photo url");
        return Err(PersistenceFailure::PhotoUrlPatch(source));
    }

    info!(%user_id, %photo_url, "profile photo attached");
    Ok(photo_url)
}

/// Error raised by a registration attempt.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error(transparent)]
    Validation(#[from] ValidationFailure),
    #[error("{field} lookup unavailable: {source}")]
    LookupUnavailable {
        field: LookupField,
        source: RepositoryError,
    },
    #[error(transparent)]
    Credentials(#[from] CredentialError),
    #[error(transparent)]
    Persistence(#[from] RepositoryError),
}

impl RegistrationError {
    /// Stable snake_case tag sent to clients next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            RegistrationError::Validation(failure) => failure.code(),
            RegistrationError::LookupUnavailable { .. } => "lookup_unavailable",
            RegistrationError::Credentials(_) => "credential_failure",
            RegistrationError::Persistence(_) => "persistence_failure",
        }
    }
}

/// Background photo step failures. Logged only; the caller already got its receipt.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceFailure {
    #[error("photo upload failed: {0}")]
    Upload(StorageError),
    #[error("photo url patch failed: {0}")]
    PhotoUrlPatch(RepositoryError),
}

/// Error raised when signing in.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Credentials(#[from] CredentialError),
}
