//! Schema-less document backend.
//!
//! # Responsibility
//! - Serve the `ContentStore` contract over `Entry` and `User` documents.
//! - Express every read as a query template in the document dialect, bound
//!   through `translate::translate`.
//!
//! # Invariants
//! - Tags live on the entry document as a list property; tag filtering is the
//!   dialect's list-membership equality.
//! - Every user-originated string is passed through `escape_literal` before
//!   substitution.
//! - Entry documents store dates as `YYYY-MM-DD` strings.

pub mod documents;
pub mod gql;
pub mod translate;

pub use translate::{escape_literal, translate, QueryError};

use crate::config::BackendKind;
use crate::content::slug::slugify;
use crate::model::entry::{Entry, EntryQuery, NewEntry, RecordId};
use crate::model::tag::parse_tag_string;
use crate::model::user::{Role, User, UserProfile};
use crate::store::{ContentStore, QueryArg, RawRecord, StoreError, StoreResult, DATE_FORMAT};
use chrono::NaiveDate;
use documents::{Document, DocumentDb};
use log::{debug, info};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard};

const ENTRY_KIND: &str = "Entry";
const USER_KIND: &str = "User";

const ENTRY_LIST_GQL: &str =
    "SELECT * FROM Entry ORDER BY creation_date DESC, __key__ DESC LIMIT ? OFFSET ?";
const ENTRY_LIST_BY_TAG_GQL: &str = "SELECT * FROM Entry WHERE tags = '?' \
     ORDER BY creation_date DESC, __key__ DESC LIMIT ? OFFSET ?";
const ENTRY_COUNT_GQL: &str = "SELECT * FROM Entry";
const ENTRY_COUNT_BY_TAG_GQL: &str = "SELECT * FROM Entry WHERE tags = '?'";
const ENTRY_BY_SLUG_AND_DATE_GQL: &str = "SELECT * FROM Entry \
     WHERE slug = '?' AND creation_date = '?' ORDER BY __key__ DESC LIMIT 1";
const USER_BY_NAME_GQL: &str = "SELECT * FROM User WHERE username = '?' LIMIT 1";

/// Process-wide in-memory document store.
///
/// Cloning shares the same underlying documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    db: Arc<Mutex<DocumentDb>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out a request session over the shared documents.
    pub fn session(&self) -> DocumentSession {
        DocumentSession {
            db: Arc::clone(&self.db),
        }
    }
}

/// One request's view of a `DocumentStore`.
#[derive(Debug)]
pub struct DocumentSession {
    db: Arc<Mutex<DocumentDb>>,
}

impl DocumentSession {
    fn lock(&self) -> StoreResult<MutexGuard<'_, DocumentDb>> {
        self.db
            .lock()
            .map_err(|_| StoreError::Unavailable("document store lock poisoned".to_string()))
    }

    fn query(&self, template: &str, args: &[QueryArg]) -> StoreResult<Vec<Document>> {
        let parsed = gql::parse(&translate(template, args)?)?;
        let db = self.lock()?;
        Ok(db.run(&parsed).into_iter().cloned().collect())
    }

    fn count(&self, template: &str, args: &[QueryArg]) -> StoreResult<u64> {
        let parsed = gql::parse(&translate(template, args)?)?;
        let db = self.lock()?;
        Ok(db.count(&parsed) as u64)
    }
}

impl ContentStore for DocumentSession {
    fn backend_kind(&self) -> BackendKind {
        BackendKind::Document
    }

    fn raw_query(&self, template: &str, args: &[QueryArg]) -> StoreResult<Vec<RawRecord>> {
        Ok(self
            .query(template, args)?
            .iter()
            .map(Document::to_record)
            .collect())
    }

    fn entry_count(&self, tag: Option<&str>) -> StoreResult<u64> {
        match tag {
            None => self.count(ENTRY_COUNT_GQL, &[]),
            Some(tag) => self.count(ENTRY_COUNT_BY_TAG_GQL, &[literal(tag)]),
        }
    }

    fn entries(&self, query: &EntryQuery) -> StoreResult<Vec<Entry>> {
        let paging = [QueryArg::from(query.limit), QueryArg::from(query.offset)];
        let documents = match query.tag.as_deref() {
            None => self.query(ENTRY_LIST_GQL, &paging)?,
            Some(tag) => {
                let [limit, offset] = paging;
                self.query(ENTRY_LIST_BY_TAG_GQL, &[literal(tag), limit, offset])?
            }
        };

        let entries = documents
            .iter()
            .map(entry_from_document)
            .collect::<StoreResult<Vec<_>>>()?;
        debug!(
            "event=entries_query module=store status=ok backend=document tag_filter={} rows={}",
            query.tag.is_some(),
            entries.len()
        );
        Ok(entries)
    }

    fn entry_by_slug_and_date(&self, slug: &str, date: NaiveDate) -> StoreResult<Option<Entry>> {
        self.query(
            ENTRY_BY_SLUG_AND_DATE_GQL,
            &[literal(slug), QueryArg::from(date)],
        )?
        .first()
        .map(entry_from_document)
        .transpose()
    }

    fn insert_entry(&mut self, new_entry: &NewEntry) -> StoreResult<Entry> {
        let slug = slugify(&new_entry.title);
        let date = new_entry.created_on.format(DATE_FORMAT).to_string();
        let properties = json!({
            "slug": slug,
            "title": new_entry.title,
            "body": new_entry.body,
            "creation_date": date,
            "last_date": date,
            "owner": new_entry.owner,
            "tags": [],
        });
        let Value::Object(properties) = properties else {
            return Err(StoreError::InvalidData("entry document is not an object".to_string()));
        };

        let id = self.lock()?.put(ENTRY_KIND, properties);
        let tag_names = parse_tag_string(&new_entry.tags);
        if !tag_names.is_empty() {
            self.process_tags(id, &tag_names)?;
        }

        info!(
            "event=entry_insert module=store status=ok backend=document entry_id={} tag_count={}",
            id,
            tag_names.len()
        );
        Ok(Entry {
            id,
            slug,
            title: new_entry.title.clone(),
            body: new_entry.body.clone(),
            creation_date: new_entry.created_on,
            last_date: new_entry.created_on,
            owner: new_entry.owner,
            tags: tag_names,
        })
    }

    fn process_tags(&mut self, entry_id: RecordId, tags: &[String]) -> StoreResult<()> {
        let mut db = self.lock()?;
        let document = db.get_mut(ENTRY_KIND, entry_id).ok_or_else(|| {
            StoreError::InvalidData(format!("entry document {entry_id} does not exist"))
        })?;
        let list = document
            .properties
            .entry("tags")
            .or_insert_with(|| Value::Array(Vec::new()));
        let Value::Array(items) = list else {
            return Err(StoreError::InvalidData(format!(
                "entry document {entry_id} has a non-list tags property"
            )));
        };
        for tag in tags {
            let value = Value::String(tag.clone());
            if !items.contains(&value) {
                items.push(value);
            }
        }
        Ok(())
    }

    fn entry_tags(&self, entry: &Entry) -> StoreResult<Vec<String>> {
        let db = self.lock()?;
        match db.get(ENTRY_KIND, entry.id) {
            Some(document) => string_list(document, "tags"),
            None => Ok(Vec::new()),
        }
    }

    fn user_by_name(&self, username: &str) -> StoreResult<Option<User>> {
        self.query(USER_BY_NAME_GQL, &[literal(username)])?
            .first()
            .map(user_from_document)
            .transpose()
    }

    fn user_by_id(&self, id: RecordId) -> StoreResult<Option<User>> {
        let db = self.lock()?;
        db.get(USER_KIND, id).map(user_from_document).transpose()
    }

    fn user_profile(&self, id: RecordId) -> StoreResult<Option<UserProfile>> {
        Ok(self.user_by_id(id)?.map(|user| user.profile()))
    }

    fn provision_user(
        &mut self,
        username: &str,
        password_digest: &str,
        role: Role,
    ) -> StoreResult<User> {
        let existing = gql::parse(&translate(USER_BY_NAME_GQL, &[literal(username)])?)?;
        let mut properties = serde_json::Map::new();
        properties.insert("username".to_string(), Value::from(username));
        properties.insert("password".to_string(), Value::from(password_digest));
        properties.insert("rank".to_string(), Value::from(role.document_name()));

        // Check and write under one guard so concurrent sessions cannot both pass.
        let mut db = self.lock()?;
        if db.count(&existing) > 0 {
            return Err(StoreError::Duplicate(format!("username `{username}`")));
        }
        let id = db.put(USER_KIND, properties);

        Ok(User {
            id,
            username: username.to_string(),
            password_digest: password_digest.to_string(),
            role,
        })
    }

    fn close(self) -> StoreResult<()> {
        Ok(())
    }
}

fn literal(text: &str) -> QueryArg {
    QueryArg::Text(escape_literal(text))
}

fn entry_from_document(document: &Document) -> StoreResult<Entry> {
    Ok(Entry {
        id: document.key,
        slug: string_property(document, "slug")?,
        title: string_property(document, "title")?,
        body: string_property(document, "body")?,
        creation_date: date_property(document, "creation_date")?,
        last_date: date_property(document, "last_date")?,
        owner: integer_property(document, "owner")?,
        tags: string_list(document, "tags")?,
    })
}

fn user_from_document(document: &Document) -> StoreResult<User> {
    let rank = string_property(document, "rank")?;
    let role = Role::from_db(&rank).ok_or_else(|| {
        invalid(document, "rank", &format!("unknown role `{rank}`"))
    })?;
    Ok(User {
        id: document.key,
        username: string_property(document, "username")?,
        password_digest: string_property(document, "password")?,
        role,
    })
}

fn string_property(document: &Document, name: &str) -> StoreResult<String> {
    match document.properties.get(name) {
        Some(Value::String(value)) => Ok(value.clone()),
        _ => Err(invalid(document, name, "expected a string")),
    }
}

fn integer_property(document: &Document, name: &str) -> StoreResult<i64> {
    document
        .properties
        .get(name)
        .and_then(Value::as_i64)
        .ok_or_else(|| invalid(document, name, "expected an integer"))
}

fn date_property(document: &Document, name: &str) -> StoreResult<NaiveDate> {
    let text = string_property(document, name)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT)
        .map_err(|err| invalid(document, name, &format!("invalid date `{text}`: {err}")))
}

fn string_list(document: &Document, name: &str) -> StoreResult<Vec<String>> {
    match document.properties.get(name) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid(document, name, "expected a list of strings"))
            })
            .collect(),
        Some(_) => Err(invalid(document, name, "expected a list of strings")),
    }
}

fn invalid(document: &Document, property: &str, message: &str) -> StoreError {
    StoreError::InvalidData(format!(
        "document {} property `{property}`: {message}",
        document.key
    ))
}
