mod common;

use common::{date, insert, seed_user};
use postkeep_core::model::user::Role;
use postkeep_core::store::{DocumentStore, QueryArg, QueryError, StoreError};
use postkeep_core::{BackendKind, ContentStore};

#[test]
fn insert_round_trip() {
    common::insert_round_trip(&mut DocumentStore::new().session());
}

#[test]
fn tag_filter_restricts_listing() {
    common::tag_filter_restricts_listing(&mut DocumentStore::new().session());
}

#[test]
fn listing_is_newest_first() {
    common::listing_is_newest_first(&mut DocumentStore::new().session());
}

#[test]
fn duplicate_slug_and_date_returns_highest_id() {
    common::duplicate_slug_and_date_returns_highest_id(&mut DocumentStore::new().session());
}

#[test]
fn user_lookups() {
    common::user_lookups(&mut DocumentStore::new().session());
}

#[test]
fn process_tags_appends_without_duplicates() {
    common::process_tags_appends_without_duplicates(&mut DocumentStore::new().session());
}

#[test]
fn stored_entries_carry_tags_natively() {
    let store = DocumentStore::new();
    let mut session = store.session();
    let owner = seed_user(&mut session, "bargio", Role::User);
    insert(&mut session, owner, "Native", "x y", date(2016, 7, 7));

    let fetched = session
        .entry_by_slug_and_date("native", date(2016, 7, 7))
        .unwrap()
        .unwrap();
    assert_eq!(fetched.tags, vec!["x".to_string(), "y".to_string()]);
}

#[test]
fn raw_query_reports_placeholder_mismatch_and_syntax_errors() {
    let session = DocumentStore::new().session();

    let err = session
        .raw_query("SELECT * FROM Entry WHERE slug = '?'", &[])
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Query(QueryError::PlaceholderMismatch {
            placeholders: 1,
            supplied: 0
        })
    ));

    let err = session
        .raw_query("SELECT title FROM Entry", &[])
        .unwrap_err();
    assert!(matches!(err, StoreError::Query(QueryError::Syntax { .. })));
}

#[test]
fn raw_query_orders_by_key() {
    let store = DocumentStore::new();
    let mut session = store.session();
    let owner = seed_user(&mut session, "bargio", Role::User);
    insert(&mut session, owner, "First", "", date(2016, 1, 1));
    insert(&mut session, owner, "Second", "", date(2016, 1, 1));

    let records = session
        .raw_query(
            "SELECT * FROM Entry WHERE creation_date = '?' ORDER BY __key__ DESC LIMIT ?",
            &[QueryArg::from(date(2016, 1, 1)), QueryArg::Int(1)],
        )
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["title"], "Second");
}

#[test]
fn backend_kind_and_close() {
    let session = DocumentStore::new().session();
    assert_eq!(session.backend_kind(), BackendKind::Document);
    session.close().unwrap();
}
