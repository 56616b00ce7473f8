#![allow(dead_code)]

use chrono::NaiveDate;
use postkeep_core::model::user::{password_digest, Role};
use postkeep_core::{ContentStore, Entry, EntryQuery, NewEntry, RecordId};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn seed_user<S: ContentStore>(store: &mut S, username: &str, role: Role) -> RecordId {
    store
        .provision_user(username, &password_digest("secret"), role)
        .unwrap()
        .id
}

pub fn insert<S: ContentStore>(
    store: &mut S,
    owner: RecordId,
    title: &str,
    tags: &str,
    created_on: NaiveDate,
) -> Entry {
    store
        .insert_entry(&NewEntry {
            title: title.to_string(),
            body: format!("Body of {title}"),
            owner,
            tags: tags.to_string(),
            created_on,
        })
        .unwrap()
}

fn listing(tag: Option<&str>, offset: u32, limit: u32) -> EntryQuery {
    EntryQuery {
        tag: tag.map(str::to_string),
        offset,
        limit,
    }
}

/// Insert then read back by slug and date; tags come back as a set.
pub fn insert_round_trip<S: ContentStore>(store: &mut S) {
    let owner = seed_user(store, "bargio", Role::Admin);
    let created = insert(store, owner, "Ciao Mondo!", "tag1 tag2 tag1", date(2010, 5, 17));
    assert_eq!(created.slug, "ciao-mondo");
    assert_eq!(created.last_date, created.creation_date);

    let fetched = store
        .entry_by_slug_and_date("ciao-mondo", date(2010, 5, 17))
        .unwrap()
        .unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.title, "Ciao Mondo!");
    assert_eq!(fetched.owner, owner);

    let mut tags = store.entry_tags(&fetched).unwrap();
    tags.sort();
    assert_eq!(tags, vec!["tag1".to_string(), "tag2".to_string()]);

    assert!(store
        .entry_by_slug_and_date("ciao-mondo", date(2010, 5, 18))
        .unwrap()
        .is_none());
}

/// Every entry in a tag listing carries the tag, and counts agree.
pub fn tag_filter_restricts_listing<S: ContentStore>(store: &mut S) {
    let owner = seed_user(store, "bargio", Role::User);
    insert(store, owner, "One", "rust", date(2011, 1, 1));
    insert(store, owner, "Two", "python", date(2011, 1, 2));
    insert(store, owner, "Three", "rust python", date(2011, 1, 3));
    insert(store, owner, "Four", "", date(2011, 1, 4));

    assert_eq!(store.entry_count(None).unwrap(), 4);
    assert_eq!(store.entry_count(Some("rust")).unwrap(), 2);
    assert_eq!(store.entry_count(Some("Rust")).unwrap(), 0);
    assert_eq!(store.entry_count(Some("missing")).unwrap(), 0);

    let rust = store.entries(&listing(Some("rust"), 0, 10)).unwrap();
    let titles: Vec<&str> = rust.iter().map(|entry| entry.title.as_str()).collect();
    assert_eq!(titles, vec!["Three", "One"]);
    for entry in &rust {
        assert!(store.entry_tags(entry).unwrap().contains(&"rust".to_string()));
    }
}

/// Newest first, id breaking ties, offset/limit applied after ordering.
pub fn listing_is_newest_first<S: ContentStore>(store: &mut S) {
    let owner = seed_user(store, "bargio", Role::User);
    let older = insert(store, owner, "Older", "", date(2012, 6, 1));
    let first_same_day = insert(store, owner, "Same day A", "", date(2012, 6, 2));
    let second_same_day = insert(store, owner, "Same day B", "", date(2012, 6, 2));

    let all = store.entries(&listing(None, 0, 10)).unwrap();
    let ids: Vec<RecordId> = all.iter().map(|entry| entry.id).collect();
    assert_eq!(ids, vec![second_same_day.id, first_same_day.id, older.id]);

    let page = store.entries(&listing(None, 1, 1)).unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, first_same_day.id);

    assert!(store.entries(&listing(None, 3, 10)).unwrap().is_empty());
}

/// Two entries with the same slug and date: the newest insert wins.
pub fn duplicate_slug_and_date_returns_highest_id<S: ContentStore>(store: &mut S) {
    let owner = seed_user(store, "bargio", Role::User);
    insert(store, owner, "Twice", "", date(2013, 3, 3));
    let second = insert(store, owner, "twice", "", date(2013, 3, 3));

    let found = store
        .entry_by_slug_and_date("twice", date(2013, 3, 3))
        .unwrap()
        .unwrap();
    assert_eq!(found.id, second.id);
}

/// Users resolve by name and id; unknown lookups are `None`.
pub fn user_lookups<S: ContentStore>(store: &mut S) {
    let admin = seed_user(store, "bargio", Role::Admin);
    let reader = seed_user(store, "reader", Role::User);

    let user = store.user_by_name("bargio").unwrap().unwrap();
    assert_eq!(user.id, admin);
    assert_eq!(user.role, Role::Admin);
    assert_eq!(user.password_digest, password_digest("secret"));

    assert_eq!(store.user_by_id(reader).unwrap().unwrap().username, "reader");
    assert!(store.user_profile(admin).unwrap().unwrap().is_admin());
    assert!(!store.user_profile(reader).unwrap().unwrap().is_admin());

    assert!(store.user_by_name("ghost").unwrap().is_none());
    assert!(store.user_by_id(9_999).unwrap().is_none());
    assert!(store.user_profile(9_999).unwrap().is_none());

    assert!(store
        .provision_user("bargio", "digest", Role::User)
        .is_err());
}

/// Tags added after insert are appended once.
pub fn process_tags_appends_without_duplicates<S: ContentStore>(store: &mut S) {
    let owner = seed_user(store, "bargio", Role::User);
    let entry = insert(store, owner, "Tagged later", "a", date(2014, 4, 4));

    store
        .process_tags(entry.id, &["b".to_string(), "a".to_string()])
        .unwrap();
    assert_eq!(
        store.entry_tags(&entry).unwrap(),
        vec!["a".to_string(), "b".to_string()]
    );
    assert_eq!(store.entry_count(Some("b")).unwrap(), 1);
}
