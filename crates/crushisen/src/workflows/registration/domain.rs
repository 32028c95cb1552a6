use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for persisted users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque handle to a photo picked on the device. Resolving it to bytes is the blob store's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoReference(pub String);

/// Everything the sign-up form collects for one registration attempt.
///
/// Missing JSON fields deserialize as empty strings so they reach the non-blank gate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSubmission {
    pub last_name: String,
    pub first_name: String,
    pub pseudo: String,
    pub email: String,
    pub address: String,
    /// `DD/MM/YYYY`
    pub date_of_birth: String,
    pub phone_number: String,
    pub school_year: String,
    pub description: String,
    pub password: String,
    pub password_confirmation: String,
    pub photo: Option<PhotoReference>,
}

impl ProfileSubmission {
    /// Fields gated by the combined non-blank check, in form order.
    pub(crate) fn required_fields(&self) -> [(&'static str, &str); 9] {
        [
            ("last_name", self.last_name.as_str()),
            ("first_name", self.first_name.as_str()),
            ("address", self.address.as_str()),
            ("school_year", self.school_year.as_str()),
            ("description", self.description.as_str()),
            ("pseudo", self.pseudo.as_str()),
            ("email", self.email.as_str()),
            ("password", self.password.as_str()),
            ("password_confirmation", self.password_confirmation.as_str()),
        ]
    }
}

/// Unique profile attributes the store indexes and can be queried by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupField {
    Email,
    Pseudo,
}

impl LookupField {
    pub const fn label(self) -> &'static str {
        match self {
            LookupField::Email => "email",
            LookupField::Pseudo => "pseudo",
        }
    }
}

impl fmt::Display for LookupField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Stored user row. The password only ever lands here as an Argon2 PHC string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    pub last_name: String,
    pub first_name: String,
    pub pseudo: String,
    pub email: String,
    pub address: String,
    pub date_of_birth: String,
    pub phone_number: String,
    pub school_year: String,
    pub description: String,
    pub password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub(crate) fn from_submission(
        user_id: UserId,
        submission: ProfileSubmission,
        password_hash: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        let ProfileSubmission {
            last_name,
            first_name,
            pseudo,
            email,
            address,
            date_of_birth,
            phone_number,
            school_year,
            description,
            ..
        } = submission;

        Self {
            user_id,
            last_name,
            first_name,
            pseudo,
            email,
            address,
            date_of_birth,
            phone_number,
            school_year,
            description,
            password_hash,
            photo_url: None,
            created_at,
        }
    }

    pub fn value_of(&self, field: LookupField) -> &str {
        match field {
            LookupField::Email => &self.email,
            LookupField::Pseudo => &self.pseudo,
        }
    }

    pub fn view(&self) -> UserView {
        UserView {
            user_id: self.user_id.clone(),
            last_name: self.last_name.clone(),
            first_name: self.first_name.clone(),
            pseudo: self.pseudo.clone(),
            email: self.email.clone(),
            address: self.address.clone(),
            date_of_birth: self.date_of_birth.clone(),
            phone_number: self.phone_number.clone(),
            school_year: self.school_year.clone(),
            description: self.description.clone(),
            photo_url: self.photo_url.clone(),
            created_at: self.created_at,
        }
    }
}

/// Sanitized representation of a user exposed over the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub user_id: UserId,
    pub last_name: String,
    pub first_name: String,
    pub pseudo: String,
    pub email: String,
    pub address: String,
    pub date_of_birth: String,
    pub phone_number: String,
    pub school_year: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Confirmation handed back once the user row is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationReceipt {
    pub user_id: UserId,
    pub pseudo: String,
    pub email: String,
}
