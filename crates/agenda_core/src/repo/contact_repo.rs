//! Contact repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide keyed lookup, fixed-predicate listing, counting, upsert and
//!   hard delete over the `contacts` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `Contact::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - A physical `UNIQUE` violation surfaces as `RepoError::UniqueViolation`,
//!   never as a raw SQLite error.
//! - Listings are ordered by `id ASC`.

use crate::db::schema::{current_user_version, schema_version};
use crate::db::DbError;
use crate::model::contact::{Contact, ContactId, ContactValidationError};
use rusqlite::{params, Connection, ErrorCode, Params, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const CONTACT_SELECT_SQL: &str = "SELECT
    id,
    name,
    phone_home,
    phone_mobile,
    email,
    is_favorite,
    is_active
FROM contacts";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for contact persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ContactValidationError),
    Db(DbError),
    NotFound(ContactId),
    /// A storage-level uniqueness constraint rejected the write.
    UniqueViolation(String),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "contact not found: {id}"),
            Self::UniqueViolation(message) => write!(f, "unique constraint violated: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted contact data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ContactValidationError> for RepoError {
    fn from(value: ContactValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if is_unique_violation(&value) {
            return Self::UniqueViolation(value.to_string());
        }
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage collaborator consumed by the contact service.
pub trait ContactRepository {
    fn find_by_id(&self, id: ContactId) -> RepoResult<Option<Contact>>;
    fn find_by_phone_mobile(&self, phone_mobile: &str) -> RepoResult<Option<Contact>>;
    fn list_where_active(&self, active: bool) -> RepoResult<Vec<Contact>>;
    fn list_where_active_and_favorite(
        &self,
        active: bool,
        favorite: bool,
    ) -> RepoResult<Vec<Contact>>;
    fn count(&self) -> RepoResult<u64>;
    fn count_where_active(&self, active: bool) -> RepoResult<u64>;
    fn count_where_favorite_and_active(&self) -> RepoResult<u64>;
    /// Inserts when `contact.id` is `None`, otherwise replaces the stored row.
    fn save(&self, contact: &Contact) -> RepoResult<Contact>;
    fn delete(&self, contact: &Contact) -> RepoResult<()>;
}

/// SQLite-backed contact repository.
pub struct SqliteContactRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContactRepository<'conn> {
    /// Wraps a connection already prepared by `open_db`/`open_db_in_memory`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Wraps a connection after checking it carries the contact schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = schema_version();
        let actual_version = current_user_version(conn)?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let has_contacts: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'contacts'
            );",
            [],
            |row| row.get(0),
        )?;
        if !has_contacts {
            return Err(RepoError::MissingRequiredTable("contacts"));
        }

        Ok(Self { conn })
    }

    fn query_one(&self, filter: &str, params: impl Params) -> RepoResult<Option<Contact>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONTACT_SELECT_SQL} WHERE {filter};"))?;
        let mut rows = stmt.query(params)?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_contact_row(row)?));
        }
        Ok(None)
    }

    fn query_many(&self, filter: &str, params: impl Params) -> RepoResult<Vec<Contact>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CONTACT_SELECT_SQL} WHERE {filter} ORDER BY id ASC;"))?;
        let mut rows = stmt.query(params)?;
        let mut contacts = Vec::new();
        while let Some(row) = rows.next()? {
            contacts.push(parse_contact_row(row)?);
        }
        Ok(contacts)
    }

    fn query_count(&self, filter: &str, params: impl Params) -> RepoResult<u64> {
        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM contacts WHERE {filter};"),
            params,
            |row| row.get(0),
        )?;
        u64::try_from(total)
            .map_err(|_| RepoError::InvalidData(format!("negative contact count `{total}`")))
    }

    fn insert(&self, contact: &Contact) -> RepoResult<Contact> {
        self.conn.execute(
            "INSERT INTO contacts (
                name,
                phone_home,
                phone_mobile,
                email,
                is_favorite,
                is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                contact.name.as_str(),
                contact.phone_home.as_deref(),
                contact.phone_mobile.as_str(),
                contact.email.as_deref(),
                bool_to_int(contact.is_favorite),
                bool_to_int(contact.is_active),
            ],
        )?;

        let mut saved = contact.clone();
        saved.id = Some(self.conn.last_insert_rowid());
        Ok(saved)
    }

    fn replace(&self, id: ContactId, contact: &Contact) -> RepoResult<Contact> {
        let changed = self.conn.execute(
            "UPDATE contacts
             SET
                name = ?1,
                phone_home = ?2,
                phone_mobile = ?3,
                email = ?4,
                is_favorite = ?5,
                is_active = ?6
             WHERE id = ?7;",
            params![
                contact.name.as_str(),
                contact.phone_home.as_deref(),
                contact.phone_mobile.as_str(),
                contact.email.as_deref(),
                bool_to_int(contact.is_favorite),
                bool_to_int(contact.is_active),
                id,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(contact.clone())
    }
}

impl ContactRepository for SqliteContactRepository<'_> {
    fn find_by_id(&self, id: ContactId) -> RepoResult<Option<Contact>> {
        self.query_one("id = ?1", [id])
    }

    fn find_by_phone_mobile(&self, phone_mobile: &str) -> RepoResult<Option<Contact>> {
        self.query_one("phone_mobile = ?1", [phone_mobile])
    }

    fn list_where_active(&self, active: bool) -> RepoResult<Vec<Contact>> {
        self.query_many("is_active = ?1", [bool_to_int(active)])
    }

    fn list_where_active_and_favorite(
        &self,
        active: bool,
        favorite: bool,
    ) -> RepoResult<Vec<Contact>> {
        self.query_many(
            "is_active = ?1 AND is_favorite = ?2",
            [bool_to_int(active), bool_to_int(favorite)],
        )
    }

    fn count(&self) -> RepoResult<u64> {
        self.query_count("1 = 1", [])
    }

    fn count_where_active(&self, active: bool) -> RepoResult<u64> {
        self.query_count("is_active = ?1", [bool_to_int(active)])
    }

    fn count_where_favorite_and_active(&self) -> RepoResult<u64> {
        self.query_count("is_favorite = 1 AND is_active = 1", [])
    }

    fn save(&self, contact: &Contact) -> RepoResult<Contact> {
        contact.validate()?;

        match contact.id {
            None => self.insert(contact),
            Some(id) => self.replace(id, contact),
        }
    }

    fn delete(&self, contact: &Contact) -> RepoResult<()> {
        let id = contact
            .id
            .ok_or_else(|| RepoError::InvalidData("cannot delete an unsaved contact".to_string()))?;

        let changed = self
            .conn
            .execute("DELETE FROM contacts WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn parse_contact_row(row: &Row<'_>) -> RepoResult<Contact> {
    let contact = Contact {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        phone_home: row.get("phone_home")?,
        phone_mobile: row.get("phone_mobile")?,
        email: row.get("email")?,
        is_favorite: parse_flag(row, "is_favorite")?,
        is_active: parse_flag(row, "is_active")?,
    };
    contact.validate().map_err(|err| {
        RepoError::InvalidData(format!(
            "stored contact {} is invalid: {err}",
            contact.id.unwrap_or_default()
        ))
    })?;
    Ok(contact)
}

fn parse_flag(row: &Row<'_>, column: &str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid {column} value `{other}` in contacts.{column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::{is_unique_violation, RepoError};
    use rusqlite::Connection;

    #[test]
    fn unique_constraint_failures_map_to_unique_violation() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (v TEXT NOT NULL UNIQUE);
             INSERT INTO t (v) VALUES ('x');",
        )
        .unwrap();

        let err = conn
            .execute("INSERT INTO t (v) VALUES ('x');", [])
            .unwrap_err();
        assert!(is_unique_violation(&err));
        assert!(matches!(RepoError::from(err), RepoError::UniqueViolation(_)));
    }

    #[test]
    fn other_constraint_failures_stay_db_errors() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v TEXT NOT NULL);")
            .unwrap();

        let err = conn
            .execute("INSERT INTO t (v) VALUES (NULL);", [])
            .unwrap_err();
        assert!(!is_unique_violation(&err));
        assert!(matches!(RepoError::from(err), RepoError::Db(_)));
    }
}
