//! Contact use-case service.
//!
//! # Responsibility
//! - Apply contact business rules before any write reaches storage.
//! - Translate repository failures into the three caller-facing error kinds.
//!
//! # Invariants
//! - Every create/update goes through `upsert`, the only place that
//!   validates, checks phone uniqueness, normalizes and defaults fields.
//! - Only new contacts are forced active; updates keep the supplied flag.
//! - A storage-level unique violation is reported exactly like the
//!   application-level duplicate-phone check.
//! - Log events carry ids only, never contact field values.

use crate::model::contact::{Contact, ContactId};
use crate::repo::contact_repo::{ContactRepository, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DUPLICATE_PHONE_MESSAGE: &str = "phone already registered";

pub type ServiceResult<T> = Result<T, ContactServiceError>;

/// Caller-facing error for contact use-cases.
#[derive(Debug)]
pub enum ContactServiceError {
    /// Bad or conflicting caller data; the message is safe to show.
    InvalidInput(String),
    /// Referenced contact does not exist.
    NotFound(ContactId),
    /// Any other storage failure.
    ConflictOrUnexpected(RepoError),
}

impl Display for ContactServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(reason) => write!(f, "{reason}"),
            Self::NotFound(id) => write!(f, "contact not found for id {id}"),
            Self::ConflictOrUnexpected(err) => write!(f, "unexpected storage failure: {err}"),
        }
    }
}

impl Error for ContactServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ConflictOrUnexpected(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ContactServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::InvalidInput(err.to_string()),
            RepoError::UniqueViolation(_) => Self::InvalidInput(DUPLICATE_PHONE_MESSAGE.to_string()),
            other => Self::ConflictOrUnexpected(other),
        }
    }
}

/// Contact service facade over repository implementations.
pub struct ContactService<R: ContactRepository> {
    repo: R,
}

impl<R: ContactRepository> ContactService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Persists a new contact and returns it with its assigned id.
    ///
    /// Any id present in the payload is discarded.
    pub fn create(&self, contact: Contact) -> ServiceResult<Contact> {
        let mut contact = contact;
        contact.id = None;
        self.upsert(contact)
    }

    /// Replaces every field of contact `id` with the payload values.
    pub fn update(&self, id: ContactId, contact: Contact) -> ServiceResult<Contact> {
        let mut existing = self.require(id)?;
        existing.replace_fields(contact);
        self.upsert(existing)
    }

    /// Lists active contacts.
    pub fn list(&self) -> ServiceResult<Vec<Contact>> {
        Ok(self.repo.list_where_active(true)?)
    }

    /// Lists contacts that are both active and favorite.
    pub fn list_favorites(&self) -> ServiceResult<Vec<Contact>> {
        Ok(self.repo.list_where_active_and_favorite(true, true)?)
    }

    /// Lists inactive contacts.
    pub fn list_inactive(&self) -> ServiceResult<Vec<Contact>> {
        Ok(self.repo.list_where_active(false)?)
    }

    /// Gets one contact regardless of its active flag.
    pub fn get_by_id(&self, id: ContactId) -> ServiceResult<Contact> {
        self.require(id)
    }

    pub fn deactivate(&self, id: ContactId) -> ServiceResult<()> {
        self.set_active(id, false).map(|_| ())
    }

    pub fn activate(&self, id: ContactId) -> ServiceResult<()> {
        self.set_active(id, true).map(|_| ())
    }

    pub fn favorite(&self, id: ContactId) -> ServiceResult<Contact> {
        self.set_favorite(id, |_| true)
    }

    pub fn unfavorite(&self, id: ContactId) -> ServiceResult<Contact> {
        self.set_favorite(id, |_| false)
    }

    /// Flips the favorite flag.
    pub fn toggle_favorite(&self, id: ContactId) -> ServiceResult<Contact> {
        self.set_favorite(id, |current| !current)
    }

    /// Removes a contact permanently.
    pub fn delete(&self, id: ContactId) -> ServiceResult<()> {
        let contact = self.require(id)?;
        self.repo.delete(&contact)?;
        info!("event=contact_delete module=service status=ok id={id}");
        Ok(())
    }

    pub fn count_all(&self) -> ServiceResult<u64> {
        Ok(self.repo.count()?)
    }

    pub fn count_active(&self) -> ServiceResult<u64> {
        Ok(self.repo.count_where_active(true)?)
    }

    pub fn count_inactive(&self) -> ServiceResult<u64> {
        Ok(self.repo.count_where_active(false)?)
    }

    pub fn count_favorites_active(&self) -> ServiceResult<u64> {
        Ok(self.repo.count_where_favorite_and_active()?)
    }

    /// Single save path for create and update.
    ///
    /// A contact without an id is new: it is forced active before anything
    /// else runs.
    fn upsert(&self, mut contact: Contact) -> ServiceResult<Contact> {
        let is_new = contact.is_new();
        if is_new {
            contact.is_active = true;
        }

        contact
            .validate()
            .map_err(|err| ContactServiceError::InvalidInput(err.to_string()))?;
        self.ensure_phone_available(&contact.phone_mobile, contact.id)?;
        contact.normalize();

        let saved = self.repo.save(&contact).map_err(|err| {
            if matches!(err, RepoError::UniqueViolation(_)) {
                warn!(
                    "event=contact_save module=service status=rejected reason=unique_violation is_new={is_new}"
                );
            }
            ContactServiceError::from(err)
        })?;

        let event = if is_new {
            "contact_create"
        } else {
            "contact_update"
        };
        info!(
            "event={event} module=service status=ok id={}",
            saved.id.unwrap_or_default()
        );
        Ok(saved)
    }

    /// Rejects `phone_mobile` when another contact already holds it.
    fn ensure_phone_available(
        &self,
        phone_mobile: &str,
        own_id: Option<ContactId>,
    ) -> ServiceResult<()> {
        match self.repo.find_by_phone_mobile(phone_mobile)? {
            Some(holder) if own_id.is_none() || holder.id != own_id => {
                warn!(
                    "event=contact_save module=service status=rejected reason=duplicate_phone holder_id={}",
                    holder.id.unwrap_or_default()
                );
                Err(ContactServiceError::InvalidInput(
                    DUPLICATE_PHONE_MESSAGE.to_string(),
                ))
            }
            _ => Ok(()),
        }
    }

    fn set_active(&self, id: ContactId, active: bool) -> ServiceResult<Contact> {
        let mut contact = self.require(id)?;
        contact.is_active = active;
        let saved = self.repo.save(&contact)?;
        info!("event=contact_set_active module=service status=ok id={id} active={active}");
        Ok(saved)
    }

    fn set_favorite(
        &self,
        id: ContactId,
        next: impl FnOnce(bool) -> bool,
    ) -> ServiceResult<Contact> {
        let mut contact = self.require(id)?;
        contact.is_favorite = next(contact.is_favorite);
        let saved = self.repo.save(&contact)?;
        info!(
            "event=contact_set_favorite module=service status=ok id={id} favorite={}",
            saved.is_favorite
        );
        Ok(saved)
    }

    fn require(&self, id: ContactId) -> ServiceResult<Contact> {
        self.repo
            .find_by_id(id)?
            .ok_or(ContactServiceError::NotFound(id))
    }
}
