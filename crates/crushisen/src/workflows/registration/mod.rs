//! Account creation and sign-in for the CrushIsen community.
//!
//! A registration runs an ordered battery of gates (photo, required fields, date of birth,
//! phone, email shape, email and pseudo uniqueness, password policy, confirmation) and stops
//! at the first failure. When every gate passes the user row is written with a hashed
//! password, and the profile photo is uploaded and linked in the background.

pub mod credentials;
pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod settings;
pub mod validation;

#[cfg(test)]
mod tests;

pub use credentials::{hash_password, verify_password, CredentialError};
pub use domain::{
    LookupField, PhotoReference, ProfileSubmission, RegistrationReceipt, UserId, UserRecord,
    UserView,
};
pub use repository::{BlobStore, RepositoryError, StorageError, UserRepository};
pub use router::{registration_router, SignInRequest};
pub use service::{
    AuthenticationError, PersistenceFailure, Registration, RegistrationError,
    RegistrationService,
};
pub use settings::{LookupFailurePolicy, RegistrationSettings};
pub use validation::ValidationFailure;
