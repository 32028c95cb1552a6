use serde::{Deserialize, Serialize};

/// What a uniqueness lookup that failed in transport counts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupFailurePolicy {
    /// Abort the attempt with `RegistrationError::LookupUnavailable`.
    #[default]
    FailClosed,
    /// Treat the value as free and continue; the store's unique index still guards the write.
    FailOpen,
}

impl LookupFailurePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fail_closed" | "closed" => Some(Self::FailClosed),
            "fail_open" | "open" => Some(Self::FailOpen),
            _ => None,
        }
    }
}

/// Tunables for the registration workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationSettings {
    pub lookup_policy: LookupFailurePolicy,
    /// Prefix prepended to generated photo keys in the blob store.
    pub image_prefix: String,
}

impl RegistrationSettings {
    pub const DEFAULT_IMAGE_PREFIX: &'static str = "images/";
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            lookup_policy: LookupFailurePolicy::default(),
            image_prefix: Self::DEFAULT_IMAGE_PREFIX.to_string(),
        }
    }
}
