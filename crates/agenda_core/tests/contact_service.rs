use agenda_core::db::open_db_in_memory;
use agenda_core::{
    Contact, ContactId, ContactRepository, ContactService, ContactServiceError, RepoResult,
    SqliteContactRepository,
};
use rusqlite::Connection;

fn service(conn: &Connection) -> ContactService<SqliteContactRepository<'_>> {
    ContactService::new(SqliteContactRepository::try_new(conn).unwrap())
}

fn contact(name: &str, phone_mobile: &str) -> Contact {
    Contact::new(name, phone_mobile)
}

fn ids(contacts: &[Contact]) -> Vec<Option<ContactId>> {
    contacts.iter().map(|c| c.id).collect()
}

fn assert_invalid_input(err: ContactServiceError, expected: &str) {
    match err {
        ContactServiceError::InvalidInput(message) => assert_eq!(message, expected),
        other => panic!("expected InvalidInput, got {other:?}"),
    }
}

#[test]
fn create_rejects_blank_phone_mobile_without_persisting() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    for blank in ["", "   ", "\t\n"] {
        let err = service.create(contact("Ana", blank)).unwrap_err();
        assert_invalid_input(err, "phone_mobile must not be empty");
    }
    assert_eq!(service.count_all().unwrap(), 0);
}

#[test]
fn create_rejects_blank_name() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service.create(contact(" ", "81999999999")).unwrap_err();
    assert_invalid_input(err, "name must not be empty");
    assert_eq!(service.count_all().unwrap(), 0);
}

#[test]
fn create_forces_active_and_normalizes_blank_phone_home() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut payload = contact("Ana", "81999999999");
    payload.is_active = false;
    payload.phone_home = Some("   ".to_string());
    let created = service.create(payload).unwrap();

    assert!(created.id.is_some());
    assert!(created.is_active);
    assert_eq!(created.phone_home, None);

    let stored = service.get_by_id(created.id.unwrap()).unwrap();
    assert!(stored.is_active);
    assert_eq!(stored.phone_home, None);
}

#[test]
fn create_ignores_payload_id() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let first = service.create(contact("First", "81900000001")).unwrap();

    let mut payload = contact("Second", "81900000002");
    payload.id = first.id;
    let second = service.create(payload).unwrap();

    assert_ne!(second.id, first.id);
    assert_eq!(service.get_by_id(first.id.unwrap()).unwrap().name, "First");
    assert_eq!(service.count_all().unwrap(), 2);
}

#[test]
fn create_rejects_duplicate_phone_even_when_holder_is_inactive() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let first = service.create(contact("First", "81999999999")).unwrap();
    service.deactivate(first.id.unwrap()).unwrap();

    let err = service
        .create(contact("Second", "81999999999"))
        .unwrap_err();
    assert_invalid_input(err, "phone already registered");
    assert_eq!(service.count_all().unwrap(), 1);
}

#[test]
fn update_allows_own_phone_and_rejects_foreign_phone() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let a = service.create(contact("A", "81900000001")).unwrap();
    let b = service.create(contact("B", "81900000002")).unwrap();

    let renamed = service
        .update(a.id.unwrap(), contact("A renamed", "81900000001"))
        .unwrap();
    assert_eq!(renamed.id, a.id);
    assert_eq!(renamed.name, "A renamed");

    let err = service
        .update(b.id.unwrap(), contact("B", "81900000001"))
        .unwrap_err();
    assert_invalid_input(err, "phone already registered");
    assert_eq!(
        service.get_by_id(b.id.unwrap()).unwrap().phone_mobile,
        "81900000002"
    );
}

#[test]
fn update_is_full_replace_and_keeps_supplied_active_flag() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut original = contact("Ana", "81900000001");
    original.phone_home = Some("8133333333".to_string());
    original.email = Some("ana@email.com".to_string());
    let created = service.create(original).unwrap();
    let id = created.id.unwrap();

    let mut payload = contact("Ana Maria", "81900000009");
    payload.id = Some(999);
    payload.is_active = false;
    payload.is_favorite = true;
    let updated = service.update(id, payload).unwrap();

    assert_eq!(updated.id, Some(id));
    assert_eq!(updated.name, "Ana Maria");
    assert_eq!(updated.phone_mobile, "81900000009");
    assert_eq!(updated.phone_home, None);
    assert_eq!(updated.email, None);
    assert!(!updated.is_active);
    assert!(updated.is_favorite);
    assert_eq!(service.get_by_id(id).unwrap(), updated);
}

#[test]
fn update_normalizes_blank_phone_home() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let created = service.create(contact("Ana", "81900000001")).unwrap();
    let mut payload = created.clone();
    payload.phone_home = Some(String::new());
    let updated = service.update(created.id.unwrap(), payload).unwrap();
    assert_eq!(updated.phone_home, None);
}

#[test]
fn update_missing_contact_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service.update(77, contact("X", "81900000001")).unwrap_err();
    assert!(matches!(err, ContactServiceError::NotFound(77)));
}

#[test]
fn flag_operations_on_missing_id_are_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    assert!(matches!(
        service.activate(5),
        Err(ContactServiceError::NotFound(5))
    ));
    assert!(matches!(
        service.deactivate(5),
        Err(ContactServiceError::NotFound(5))
    ));
    assert!(matches!(
        service.favorite(5),
        Err(ContactServiceError::NotFound(5))
    ));
    assert!(matches!(
        service.unfavorite(5),
        Err(ContactServiceError::NotFound(5))
    ));
    assert!(matches!(
        service.toggle_favorite(5),
        Err(ContactServiceError::NotFound(5))
    ));
    assert!(matches!(
        service.get_by_id(5),
        Err(ContactServiceError::NotFound(5))
    ));
    assert!(matches!(
        service.delete(5),
        Err(ContactServiceError::NotFound(5))
    ));
}

#[test]
fn flag_operations_flip_only_their_field() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let mut payload = contact("Ana", "81900000001");
    payload.phone_home = Some("8133333333".to_string());
    payload.email = Some("ana@email.com".to_string());
    let created = service.create(payload).unwrap();
    let id = created.id.unwrap();

    service.deactivate(id).unwrap();
    let expected = Contact {
        is_active: false,
        ..created.clone()
    };
    assert_eq!(service.get_by_id(id).unwrap(), expected);

    let favorited = service.favorite(id).unwrap();
    let expected = Contact {
        is_favorite: true,
        ..expected
    };
    assert_eq!(favorited, expected);

    service.activate(id).unwrap();
    let unfavorited = service.unfavorite(id).unwrap();
    assert_eq!(unfavorited, created);
}

#[test]
fn deactivate_and_favorite_are_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let id = service
        .create(contact("Ana", "81900000001"))
        .unwrap()
        .id
        .unwrap();

    service.deactivate(id).unwrap();
    service.deactivate(id).unwrap();
    assert!(!service.get_by_id(id).unwrap().is_active);

    assert!(service.favorite(id).unwrap().is_favorite);
    assert!(service.favorite(id).unwrap().is_favorite);
}

#[test]
fn toggle_favorite_flips_back_and_forth() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let id = service
        .create(contact("Ana", "81900000001"))
        .unwrap()
        .id
        .unwrap();

    assert!(service.toggle_favorite(id).unwrap().is_favorite);
    assert!(!service.toggle_favorite(id).unwrap().is_favorite);
}

#[test]
fn listings_and_counts_respect_active_and_favorite_predicates() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let plain = service.create(contact("Plain", "81900000001")).unwrap();
    let fav = service.create(contact("Fav", "81900000002")).unwrap();
    let gone = service.create(contact("Gone", "81900000003")).unwrap();
    let gone_fav = service.create(contact("Gone fav", "81900000004")).unwrap();

    service.favorite(fav.id.unwrap()).unwrap();
    service.deactivate(gone.id.unwrap()).unwrap();
    service.favorite(gone_fav.id.unwrap()).unwrap();
    service.deactivate(gone_fav.id.unwrap()).unwrap();

    let listed = service.list().unwrap();
    assert!(listed.iter().all(|c| c.is_active));
    assert_eq!(ids(&listed), vec![plain.id, fav.id]);

    let inactive = service.list_inactive().unwrap();
    assert!(inactive.iter().all(|c| !c.is_active));
    assert_eq!(ids(&inactive), vec![gone.id, gone_fav.id]);

    let favorites = service.list_favorites().unwrap();
    assert!(favorites.iter().all(|c| c.is_active && c.is_favorite));
    assert_eq!(ids(&favorites), vec![fav.id]);

    assert_eq!(service.count_all().unwrap(), 4);
    assert_eq!(service.count_active().unwrap(), 2);
    assert_eq!(service.count_inactive().unwrap(), 2);
    assert_eq!(service.count_favorites_active().unwrap(), 1);
}

#[test]
fn delete_is_permanent() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let id = service
        .create(contact("Ana", "81900000001"))
        .unwrap()
        .id
        .unwrap();
    service.delete(id).unwrap();

    assert!(matches!(
        service.get_by_id(id),
        Err(ContactServiceError::NotFound(found)) if found == id
    ));
    assert_eq!(service.count_all().unwrap(), 0);

    // The phone is free again once its holder is gone.
    service.create(contact("Ana again", "81900000001")).unwrap();
}

#[test]
fn agenda_lifecycle_scenario() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let a = service.create(contact("A", "81999999999")).unwrap();
    assert!(a.is_active);
    let id = a.id.unwrap();

    let err = service.create(contact("B", "81999999999")).unwrap_err();
    assert!(matches!(err, ContactServiceError::InvalidInput(_)));

    let renamed = service
        .update(
            id,
            Contact {
                name: "A renamed".to_string(),
                ..a.clone()
            },
        )
        .unwrap();
    assert_eq!(renamed.phone_mobile, "81999999999");

    service.deactivate(id).unwrap();
    assert!(!ids(&service.list().unwrap()).contains(&Some(id)));
    assert!(ids(&service.list_inactive().unwrap()).contains(&Some(id)));

    service.favorite(id).unwrap();
    assert!(!ids(&service.list_favorites().unwrap()).contains(&Some(id)));

    service.activate(id).unwrap();
    assert!(ids(&service.list_favorites().unwrap()).contains(&Some(id)));
}

/// Repository whose uniqueness lookup never sees the competing writer,
/// as happens when two creates race between check and insert.
struct StaleLookupRepository<'conn> {
    inner: SqliteContactRepository<'conn>,
}

impl ContactRepository for StaleLookupRepository<'_> {
    fn find_by_id(&self, id: ContactId) -> RepoResult<Option<Contact>> {
        self.inner.find_by_id(id)
    }

    fn find_by_phone_mobile(&self, _phone_mobile: &str) -> RepoResult<Option<Contact>> {
        Ok(None)
    }

    fn list_where_active(&self, active: bool) -> RepoResult<Vec<Contact>> {
        self.inner.list_where_active(active)
    }

    fn list_where_active_and_favorite(
        &self,
        active: bool,
        favorite: bool,
    ) -> RepoResult<Vec<Contact>> {
        self.inner.list_where_active_and_favorite(active, favorite)
    }

    fn count(&self) -> RepoResult<u64> {
        self.inner.count()
    }

    fn count_where_active(&self, active: bool) -> RepoResult<u64> {
        self.inner.count_where_active(active)
    }

    fn count_where_favorite_and_active(&self) -> RepoResult<u64> {
        self.inner.count_where_favorite_and_active()
    }

    fn save(&self, contact: &Contact) -> RepoResult<Contact> {
        self.inner.save(contact)
    }

    fn delete(&self, contact: &Contact) -> RepoResult<()> {
        self.inner.delete(contact)
    }
}

#[test]
fn storage_unique_violation_is_reported_as_duplicate_phone() {
    let conn = open_db_in_memory().unwrap();
    let service = ContactService::new(StaleLookupRepository {
        inner: SqliteContactRepository::try_new(&conn).unwrap(),
    });

    service.create(contact("Winner", "81999999999")).unwrap();
    let err = service
        .create(contact("Loser", "81999999999"))
        .unwrap_err();
    assert_invalid_input(err, "phone already registered");
    assert_eq!(service.count_all().unwrap(), 1);
}

#[test]
fn corrupt_stored_row_is_not_blamed_on_the_caller() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO contacts (name, phone_mobile) VALUES ('', '81977777777');",
        [],
    )
    .unwrap();
    let service = service(&conn);

    let err = service.list().unwrap_err();
    assert!(
        matches!(err, ContactServiceError::ConflictOrUnexpected(_)),
        "expected ConflictOrUnexpected, got {err:?}"
    );
}
