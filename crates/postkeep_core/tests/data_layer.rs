use chrono::NaiveDate;
use postkeep_core::{
    BlogError, DataLayer, DataLayerConfig, LoginOutcome, PageSlot, RecordId, Role,
};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn layers(page_size: u32) -> Vec<(tempfile::TempDir, DataLayer)> {
    let dir = tempfile::tempdir().unwrap();
    let sqlite = DataLayer::new(
        DataLayerConfig::sqlite(dir.path().join("blog.db")).with_max_page_entries(page_size),
    )
    .unwrap();
    let document =
        DataLayer::new(DataLayerConfig::document().with_max_page_entries(page_size)).unwrap();
    vec![(dir, sqlite), (tempfile::tempdir().unwrap(), document)]
}

fn seed_entries(layer: &DataLayer, owner: RecordId, count: u32) {
    let mut request = layer.begin_request(Some(owner)).unwrap();
    for day in 1..=count {
        let tags = if day % 2 == 0 { "even all" } else { "odd all" };
        request
            .add_entry_on(
                &format!("Post {day}"),
                &format!("Summary {day}\n\n---\n\nHidden {day}"),
                tags,
                date(2011, 3, day),
            )
            .unwrap();
    }
    request.finish().unwrap();
}

#[test]
fn page_past_the_end_is_not_found() {
    for (_dir, layer) in layers(5) {
        let admin = layer.provision_user("bargio", "secret", Role::Admin).unwrap();
        seed_entries(&layer, admin.id, 5);

        let request = layer.begin_request(None).unwrap();
        let first = request.list_entries(None, 1).unwrap().unwrap();
        assert_eq!(first.entries.len(), 5);
        assert_eq!(first.total_pages, 1);
        assert_eq!(first.pages, vec![PageSlot::Page(1)]);
        assert!(request.list_entries(None, 2).unwrap().is_none());
    }
}

#[test]
fn listing_pages_are_enriched_and_ordered() {
    for (_dir, layer) in layers(2) {
        let admin = layer.provision_user("bargio", "secret", Role::Admin).unwrap();
        seed_entries(&layer, admin.id, 5);

        let request = layer.begin_request(None).unwrap();
        let page = request.list_entries(None, 0).unwrap().unwrap();
        assert_eq!(page.current_page, 1);
        assert_eq!(page.total_entries, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(
            page.pages,
            vec![PageSlot::Page(1), PageSlot::Page(2), PageSlot::Page(3)]
        );

        let newest = &page.entries[0];
        assert_eq!(newest.entry.title, "Post 5");
        assert_eq!(newest.human_date, "05 MAR");
        assert_eq!(newest.author.as_deref(), Some("bargio"));
        assert_eq!(newest.tags, vec!["odd".to_string(), "all".to_string()]);
        assert!(newest.content.contains("Summary 5"));
        assert!(newest.content.contains(r#"href="/articles/2011/3/5/post-5""#));
        assert!(!newest.content.contains("Hidden 5"));

        let last = request.list_entries(None, 3).unwrap().unwrap();
        assert_eq!(last.entries.len(), 1);
        assert_eq!(last.entries[0].entry.title, "Post 1");
    }
}

#[test]
fn tag_listing_only_contains_tagged_entries() {
    for (_dir, layer) in layers(10) {
        let admin = layer.provision_user("bargio", "secret", Role::Admin).unwrap();
        seed_entries(&layer, admin.id, 5);

        let request = layer.begin_request(None).unwrap();
        let page = request.list_entries(Some("even"), 1).unwrap().unwrap();
        assert_eq!(page.total_entries, 2);
        assert_eq!(page.tag.as_deref(), Some("even"));
        assert!(page
            .entries
            .iter()
            .all(|item| item.tags.contains(&"even".to_string())));

        let empty = request.list_entries(Some("nothing"), 1).unwrap().unwrap();
        assert!(empty.entries.is_empty());
        assert!(request.list_entries(Some("nothing"), 2).unwrap().is_none());
    }
}

#[test]
fn view_entry_renders_full_body() {
    for (_dir, layer) in layers(10) {
        let admin = layer.provision_user("bargio", "secret", Role::Admin).unwrap();
        seed_entries(&layer, admin.id, 3);

        let request = layer.begin_request(None).unwrap();
        let entry = request.view_entry(2011, 3, 2, "post-2").unwrap().unwrap();
        assert!(entry.content.contains("Summary 2"));
        assert!(entry.content.contains("<br />"));
        assert!(entry.content.contains("Hidden 2"));
        assert!(entry.content.ends_with("<hr />"));

        assert!(request.view_entry(2011, 3, 4, "post-2").unwrap().is_none());
        assert!(matches!(
            request.view_entry(2011, 13, 1, "post-2"),
            Err(BlogError::Validation(_))
        ));
    }
}

#[test]
fn add_entry_round_trips_tags() {
    for (_dir, layer) in layers(10) {
        let user = layer.provision_user("writer", "secret", Role::User).unwrap();
        let mut request = layer.begin_request(Some(user.id)).unwrap();
        let entry = request
            .add_entry("Ciao Mondo!", "Hello", "tag1 tag2")
            .unwrap();
        assert_eq!(entry.slug, "ciao-mondo");

        let created = entry.creation_date;
        let viewed = request
            .view_entry(
                chrono::Datelike::year(&created),
                chrono::Datelike::month(&created),
                chrono::Datelike::day(&created),
                "ciao-mondo",
            )
            .unwrap()
            .unwrap();
        let mut tags = viewed.tags.clone();
        tags.sort();
        assert_eq!(tags, vec!["tag1".to_string(), "tag2".to_string()]);
    }
}

#[test]
fn admin_list_requires_admin_role() {
    for (_dir, layer) in layers(10) {
        let admin = layer.provision_user("bargio", "secret", Role::Admin).unwrap();
        let reader = layer.provision_user("reader", "secret", Role::User).unwrap();
        seed_entries(&layer, admin.id, 3);

        let anonymous = layer.begin_request(None).unwrap();
        assert!(matches!(
            anonymous.admin_entry_list(),
            Err(BlogError::Unauthorized)
        ));

        let request = layer.begin_request(Some(reader.id)).unwrap();
        assert!(matches!(
            request.admin_entry_list(),
            Err(BlogError::Forbidden)
        ));

        let request = layer.begin_request(Some(admin.id)).unwrap();
        let rows = request.admin_entry_list().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].title, "Post 3");
        assert_eq!(rows[0].author.as_deref(), Some("bargio"));
        assert_eq!(rows[0].permalink, "/articles/2011/3/3/post-3");
        assert_eq!(rows[0].tags, vec!["odd".to_string(), "all".to_string()]);
    }
}

#[test]
fn login_and_user_lookups() {
    for (_dir, layer) in layers(10) {
        let admin = layer.provision_user("bargio", "secret", Role::Admin).unwrap();
        assert!(matches!(
            layer.provision_user("bargio", "other", Role::User),
            Err(BlogError::Store(_))
        ));
        assert!(matches!(
            layer.provision_user("", "", Role::User),
            Err(BlogError::Validation(issues)) if issues.len() == 2
        ));

        let request = layer.begin_request(None).unwrap();
        assert!(matches!(
            request.login("bargio", "secret").unwrap(),
            LoginOutcome::Authenticated(user) if user.id == admin.id
        ));
        assert_eq!(request.login("bargio", "wrong").unwrap(), LoginOutcome::WrongPassword);
        assert_eq!(request.login("nobody", "secret").unwrap(), LoginOutcome::UnknownUser);

        assert_eq!(request.get_user("bargio").unwrap().unwrap().id, admin.id);
        assert!(request.load_user_profile(admin.id).unwrap().unwrap().is_admin());
        assert!(request.load_user_profile(admin.id + 100).unwrap().is_none());
        request.finish().unwrap();
    }
}

#[test]
fn unknown_backend_in_json_is_rejected() {
    assert!(DataLayerConfig::from_json_str(r#"{"backend": "mongo"}"#).is_err());
    let config = DataLayerConfig::from_json_str(r#"{"backend": "gae", "max_page_entries": 4}"#)
        .unwrap();
    let layer = DataLayer::new(config).unwrap();
    assert_eq!(layer.backend_kind(), postkeep_core::BackendKind::Document);
}

#[test]
fn one_entry_listing_page_shows_full_body() {
    for (_dir, layer) in layers(2) {
        let admin = layer.provision_user("bargio", "secret", Role::Admin).unwrap();
        seed_entries(&layer, admin.id, 3);

        let request = layer.begin_request(None).unwrap();
        let last = request.list_entries(None, 2).unwrap().unwrap();
        assert_eq!(last.entries.len(), 1);
        let content = &last.entries[0].content;
        assert!(content.contains("<p>Summary 1</p>\n<br />"));
        assert!(content.contains("Hidden 1"));
        assert!(!content.contains("readmore"));

        let tagged = request.list_entries(Some("even"), 1).unwrap().unwrap();
        assert_eq!(tagged.entries.len(), 1);
        assert!(tagged.entries[0].content.contains("Hidden 2"));

        let full = request.list_entries(None, 1).unwrap().unwrap();
        assert!(full.entries.iter().all(|item| item.content.contains("readmore")));
    }
}
