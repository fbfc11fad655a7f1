//! Contact domain model.
//!
//! # Responsibility
//! - Define the canonical contact record persisted by core.
//! - Provide validation and input normalization shared by all write paths.
//!
//! # Invariants
//! - `id` is `None` only for contacts that were never persisted.
//! - `name` and `phone_mobile` are never blank once validated.
//! - `phone_home` is never `Some("")` after `normalize()`.

use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned contact identifier.
pub type ContactId = i64;

/// Validation failure for a contact payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactValidationError {
    /// `name` is empty or whitespace-only.
    EmptyName,
    /// `phone_mobile` is empty or whitespace-only.
    EmptyPhoneMobile,
}

impl Display for ContactValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::EmptyPhoneMobile => write!(f, "phone_mobile must not be empty"),
        }
    }
}

impl Error for ContactValidationError {}

/// Canonical contact record.
///
/// Missing or `null` JSON fields fall back to `Default` so that validation,
/// not the decoder, reports absent required values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    /// `None` until the first insert.
    pub id: Option<ContactId>,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub phone_home: Option<String>,
    /// Unique across all stored contacts, active or not.
    #[serde(deserialize_with = "null_as_default")]
    pub phone_mobile: String,
    pub email: Option<String>,
    pub is_favorite: bool,
    pub is_active: bool,
}

impl Contact {
    /// Creates an unsaved, non-favorite, active contact.
    pub fn new(name: impl Into<String>, phone_mobile: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            phone_home: None,
            phone_mobile: phone_mobile.into(),
            email: None,
            is_favorite: false,
            is_active: true,
        }
    }

    /// Returns whether this contact was never persisted.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Checks required fields.
    ///
    /// `phone_mobile` is checked first so a payload missing both reports the
    /// phone, which is the field callers most often omit.
    pub fn validate(&self) -> Result<(), ContactValidationError> {
        if self.phone_mobile.trim().is_empty() {
            return Err(ContactValidationError::EmptyPhoneMobile);
        }
        if self.name.trim().is_empty() {
            return Err(ContactValidationError::EmptyName);
        }
        Ok(())
    }

    /// Collapses a blank `phone_home` to `None`.
    pub fn normalize(&mut self) {
        if self
            .phone_home
            .as_deref()
            .is_some_and(|value| value.trim().is_empty())
        {
            self.phone_home = None;
        }
    }

    /// Overwrites every mutable field from `source`, keeping `self.id`.
    pub fn replace_fields(&mut self, source: Contact) {
        self.name = source.name;
        self.phone_home = source.phone_home;
        self.phone_mobile = source.phone_mobile;
        self.email = source.email;
        self.is_favorite = source.is_favorite;
        self.is_active = source.is_active;
    }
}

fn null_as_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
