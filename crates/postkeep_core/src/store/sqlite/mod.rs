//! Relational backend over SQLite.
//!
//! # Responsibility
//! - Serve the `ContentStore` contract with SQL over `entries`, `tags`,
//!   `entry_tags`, `users` and `ranks`.
//! - Emulate the entry/tag many-to-many relation through `tags`.
//!
//! # Invariants
//! - One `SqliteStore` owns one connection for one request.
//! - An entry row and its tag associations are written in one transaction.

pub mod tags;

use crate::config::BackendKind;
use crate::content::slug::slugify;
use crate::db::open_db;
use crate::model::entry::{Entry, EntryQuery, NewEntry, RecordId};
use crate::model::tag::parse_tag_string;
use crate::model::user::{Role, User, UserProfile};
use crate::store::{ContentStore, QueryArg, RawRecord, StoreError, StoreResult};
use chrono::NaiveDate;
use log::{debug, info};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;

const ENTRY_SELECT_SQL: &str = "SELECT
    e.id,
    e.slug,
    e.title,
    e.body,
    e.creation_date,
    e.last_date,
    e.user_id
FROM entries e";

const ENTRY_TAG_JOIN_SQL: &str = " INNER JOIN entry_tags et ON et.entry_id = e.id
    INNER JOIN tags t ON t.id = et.tag_id
    WHERE t.name = ?";

const USER_SELECT_SQL: &str = "SELECT
    u.id,
    u.username,
    u.password,
    r.role_name
FROM users u
INNER JOIN ranks r ON r.id = u.rank_id";

/// SQLite-backed content store session.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (and migrates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self {
            conn: open_db(path)?,
        })
    }
}

impl ContentStore for SqliteStore {
    fn backend_kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    fn raw_query(&self, template: &str, args: &[QueryArg]) -> StoreResult<Vec<RawRecord>> {
        let mut stmt = self.conn.prepare(template)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query(params_from_iter(args.iter()))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = RawRecord::new();
            for (index, column) in columns.iter().enumerate() {
                record.insert(column.clone(), sql_to_json(row.get_ref(index)?));
            }
            records.push(record);
        }
        Ok(records)
    }

    fn entry_count(&self, tag: Option<&str>) -> StoreResult<u64> {
        let count: i64 = match tag {
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM entries;", [], |row| row.get(0))?,
            Some(tag) => self.conn.query_row(
                &format!("SELECT COUNT(*) FROM entries e{ENTRY_TAG_JOIN_SQL};"),
                [tag],
                |row| row.get(0),
            )?,
        };
        u64::try_from(count)
            .map_err(|_| StoreError::InvalidData(format!("negative entry count `{count}`")))
    }

    fn entries(&self, query: &EntryQuery) -> StoreResult<Vec<Entry>> {
        let mut sql = String::from(ENTRY_SELECT_SQL);
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(tag) = query.tag.as_ref() {
            sql.push_str(ENTRY_TAG_JOIN_SQL);
            bind_values.push(Value::Text(tag.clone()));
        }

        sql.push_str(" ORDER BY e.creation_date DESC, e.id DESC LIMIT ? OFFSET ?;");
        bind_values.push(Value::Integer(i64::from(query.limit)));
        bind_values.push(Value::Integer(i64::from(query.offset)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }

        debug!(
            "event=entries_query module=store status=ok backend=sqlite tag_filter={} rows={}",
            query.tag.is_some(),
            entries.len()
        );
        Ok(entries)
    }

    fn entry_by_slug_and_date(&self, slug: &str, date: NaiveDate) -> StoreResult<Option<Entry>> {
        let entry = self
            .conn
            .query_row(
                &format!(
                    "{ENTRY_SELECT_SQL}
                     WHERE e.slug = ?1
                       AND e.creation_date = ?2
                     ORDER BY e.id DESC
                     LIMIT 1;"
                ),
                params![slug, date],
                parse_entry_row,
            )
            .optional()?;
        Ok(entry)
    }

    fn insert_entry(&mut self, new_entry: &NewEntry) -> StoreResult<Entry> {
        let slug = slugify(&new_entry.title);
        let tag_names = parse_tag_string(&new_entry.tags);

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO entries (slug, title, body, creation_date, last_date, user_id)
             VALUES (?1, ?2, ?3, ?4, ?4, ?5);",
            params![
                slug,
                new_entry.title,
                new_entry.body,
                new_entry.created_on,
                new_entry.owner,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tags::attach_all(&tx, id, &tag_names)?;
        tx.commit()?;

        info!(
            "event=entry_insert module=store status=ok backend=sqlite entry_id={} tag_count={}",
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

    fn process_tags(&mut self, entry_id: RecordId, tag_names: &[String]) -> StoreResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tags::attach_all(&tx, entry_id, tag_names)?;
        tx.commit()?;
        Ok(())
    }

    fn entry_tags(&self, entry: &Entry) -> StoreResult<Vec<String>> {
        tags::tags_for(&self.conn, entry.id)
    }

    fn user_by_name(&self, username: &str) -> StoreResult<Option<User>> {
        let row = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE u.username = ?1;"),
                [username],
                read_user_columns,
            )
            .optional()?;
        row.map(user_from_columns).transpose()
    }

    fn user_by_id(&self, id: RecordId) -> StoreResult<Option<User>> {
        let row = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE u.id = ?1;"),
                [id],
                read_user_columns,
            )
            .optional()?;
        row.map(user_from_columns).transpose()
    }

    fn user_profile(&self, id: RecordId) -> StoreResult<Option<UserProfile>> {
        let row: Option<(RecordId, String)> = self
            .conn
            .query_row(
                "SELECT u.id, r.role_name
                 FROM users u
                 INNER JOIN ranks r ON r.id = u.rank_id
                 WHERE u.id = ?1;",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        row.map(|(id, role_name)| {
            Ok(UserProfile {
                id,
                role: parse_role(&role_name)?,
            })
        })
        .transpose()
    }

    fn provision_user(
        &mut self,
        username: &str,
        password_digest: &str,
        role: Role,
    ) -> StoreResult<User> {
        if self.user_by_name(username)?.is_some() {
            return Err(StoreError::Duplicate(format!("username `{username}`")));
        }

        let changed = self.conn.execute(
            "INSERT INTO users (username, password, rank_id)
             SELECT ?1, ?2, id FROM ranks WHERE role_name = ?3;",
            params![username, password_digest, role.rank_name()],
        )?;
        if changed == 0 {
            return Err(StoreError::InvalidData(format!(
                "rank `{}` missing from ranks table",
                role.rank_name()
            )));
        }

        Ok(User {
            id: self.conn.last_insert_rowid(),
            username: username.to_string(),
            password_digest: password_digest.to_string(),
            role,
        })
    }

    fn close(self) -> StoreResult<()> {
        self.conn.close().map_err(|(_, err)| err.into())
    }
}

fn parse_entry_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
    Ok(Entry {
        id: row.get(0)?,
        slug: row.get(1)?,
        title: row.get(2)?,
        body: row.get(3)?,
        creation_date: row.get(4)?,
        last_date: row.get(5)?,
        owner: row.get(6)?,
        tags: Vec::new(),
    })
}

type UserColumns = (RecordId, String, String, String);

fn read_user_columns(row: &Row<'_>) -> rusqlite::Result<UserColumns> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn user_from_columns((id, username, password_digest, role_name): UserColumns) -> StoreResult<User> {
    Ok(User {
        id,
        username,
        password_digest,
        role: parse_role(&role_name)?,
    })
}

fn parse_role(value: &str) -> StoreResult<Role> {
    Role::from_db(value)
        .ok_or_else(|| StoreError::InvalidData(format!("invalid role `{value}` in ranks.role_name")))
}

fn sql_to_json(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(number) => serde_json::Value::from(number),
        ValueRef::Real(number) => serde_json::Value::from(number),
        ValueRef::Text(bytes) => serde_json::Value::from(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => serde_json::Value::from(bytes.to_vec()),
    }
}
