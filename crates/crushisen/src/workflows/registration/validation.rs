use std::sync::LazyLock;

use regex::Regex;

use super::domain::{PhotoReference, ProfileSubmission};

static DATE_OF_BIRTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{2}/[0-9]{2}/[0-9]{4}$").expect("date of birth pattern compiles")
});

const PASSWORD_MIN_CHARS: usize = 10;
const PASSWORD_SYMBOLS: &str = "@#$%^&+!?=";

/// First rule a submission broke. Each variant is terminal for the attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailure {
    #[error("no image selected")]
    NoImageSelected,
    #[error("missing field: {field}")]
    EmptyField { field: &'static str },
    #[error("invalid date format, expected DD/MM/YYYY")]
    InvalidDate,
    #[error("invalid phone number, digits only")]
    InvalidPhone,
    #[error("invalid email")]
    InvalidEmailShape,
    #[error("email already used")]
    EmailTaken,
    #[error("pseudo already used")]
    PseudoTaken,
    #[error(
        "password too weak: at least 10 characters with an uppercase letter, a lowercase letter, a digit and one of @#$%^&+!?="
    )]
    WeakPassword,
    #[error("passwords do not match")]
    PasswordMismatch,
}

impl ValidationFailure {
    /// Stable machine-readable identifier for API clients.
    pub const fn code(&self) -> &'static str {
        match self {
            ValidationFailure::NoImageSelected => "no_image_selected",
            ValidationFailure::EmptyField { .. } => "empty_field",
            ValidationFailure::InvalidDate => "invalid_date",
            ValidationFailure::InvalidPhone => "invalid_phone",
            ValidationFailure::InvalidEmailShape => "invalid_email_shape",
            ValidationFailure::EmailTaken => "email_taken",
            ValidationFailure::PseudoTaken => "pseudo_taken",
            ValidationFailure::WeakPassword => "weak_password",
            ValidationFailure::PasswordMismatch => "password_mismatch",
        }
    }

    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            ValidationFailure::EmailTaken | ValidationFailure::PseudoTaken
        )
    }
}

pub fn is_non_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Digits only. An empty number passes; it is not part of the required set.
pub fn is_valid_phone_number(phone_number: &str) -> bool {
    phone_number.chars().all(|c| c.is_ascii_digit())
}

/// Shape check only, so `31/02/2099` is accepted.
pub fn is_valid_date_of_birth(date: &str) -> bool {
    DATE_OF_BIRTH.is_match(date)
}

/// `@` somewhere and `.com` or `.fr` anywhere in the string.
pub fn is_valid_email(email: &str) -> bool {
    email.contains('@') && (email.contains(".com") || email.contains(".fr"))
}

pub fn is_strong_password(password: &str) -> bool {
    let mut length = 0;
    let mut digit = false;
    let mut lower = false;
    let mut upper = false;
    let mut symbol = false;

    for c in password.chars() {
        if c.is_whitespace() {
            return false;
        }
        length += 1;
        digit |= c.is_ascii_digit();
        lower |= c.is_ascii_lowercase();
        upper |= c.is_ascii_uppercase();
        symbol |= PASSWORD_SYMBOLS.contains(c);
    }

    length >= PASSWORD_MIN_CHARS && digit && lower && upper && symbol
}

/// A blank reference cannot be resolved to bytes, so it counts as no selection.
pub fn is_image_selected(photo: Option<&PhotoReference>) -> bool {
    photo.is_some_and(|photo| is_non_blank(&photo.0))
}

/// Local gates that run before any remote lookup: photo, required fields, date, phone, email shape.
pub(crate) fn check_form(submission: &ProfileSubmission) -> Result<(), ValidationFailure> {
    if !is_image_selected(submission.photo.as_ref()) {
        return Err(ValidationFailure::NoImageSelected);
    }

    if let Some((field, _)) = submission
        .required_fields()
        .into_iter()
        .find(|(_, value)| !is_non_blank(value))
    {
        return Err(ValidationFailure::EmptyField { field });
    }

    if !is_valid_date_of_birth(&submission.date_of_birth) {
        return Err(ValidationFailure::InvalidDate);
    }

    if !is_valid_phone_number(&submission.phone_number) {
        return Err(ValidationFailure::InvalidPhone);
    }

    if !is_valid_email(&submission.email) {
        return Err(ValidationFailure::InvalidEmailShape);
    }

    Ok(())
}

/// Credential gates that run once both uniqueness lookups came back clear.
pub(crate) fn check_credentials(submission: &ProfileSubmission) -> Result<(), ValidationFailure> {
    if !is_strong_password(&submission.password) {
        return Err(ValidationFailure::WeakPassword);
    }

    if submission.password != submission.password_confirmation {
        return Err(ValidationFailure::PasswordMismatch);
    }

    Ok(())
}
