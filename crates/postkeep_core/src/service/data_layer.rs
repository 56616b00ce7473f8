//! Data layer facade consumed by the routing layer.
//!
//! # Responsibility
//! - Own the configured backend and hand out one request context per request.
//! - Compose backend queries, enrichment and pagination into listing, detail,
//!   login, insert and admin operations.
//!
//! # Invariants
//! - Every request works on exactly one store session, released on `finish`
//!   or when the context is dropped.
//! - Rejected inserts write nothing.
//! - A page beyond the last page is `None`, never an error.

use crate::config::{BackendKind, ConfigError, DataLayerConfig};
use crate::content::enrich::{enrich_entries, hydrate_authors, hydrate_tags, EnrichedEntry};
use crate::content::slug::slugify;
use crate::model::entry::{Entry, EntryQuery, NewEntry, RecordId};
use crate::model::user::{password_digest, verify_password, Role, User, UserProfile};
use crate::pagination::{page_window, total_pages, PageSlot, PaginationError};
use crate::store::{Backend, ContentStore, StoreError, StoreSession};
use chrono::{Local, NaiveDate};
use log::{info, warn};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Reason an input was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyTitle,
    EmptyBody,
    /// Title is non-empty but has no slug-able characters.
    EmptySlug,
    InvalidDate,
    EmptyUsername,
    EmptyPassword,
}

impl Display for ValidationIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::EmptyTitle => "title is required",
            Self::EmptyBody => "body is required",
            Self::EmptySlug => "title must contain at least one letter or digit",
            Self::InvalidDate => "date is not a valid calendar date",
            Self::EmptyUsername => "username is required",
            Self::EmptyPassword => "password is required",
        };
        f.write_str(message)
    }
}

/// Facade-level failure.
#[derive(Debug)]
pub enum BlogError {
    /// All reasons an input was rejected, in check order.
    Validation(Vec<ValidationIssue>),
    /// Operation requires an authenticated user.
    Unauthorized,
    /// Authenticated user lacks the admin role.
    Forbidden,
    Store(StoreError),
    Config(ConfigError),
    Pagination(PaginationError),
}

impl Display for BlogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(issues) => {
                let joined = issues
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "invalid input: {joined}")
            }
            Self::Unauthorized => write!(f, "authentication required"),
            Self::Forbidden => write!(f, "administrator role required"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            Self::Pagination(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BlogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::Pagination(err) => Some(err),
            Self::Validation(_) | Self::Unauthorized | Self::Forbidden => None,
        }
    }
}

impl From<StoreError> for BlogError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<ConfigError> for BlogError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<PaginationError> for BlogError {
    fn from(value: PaginationError) -> Self {
        Self::Pagination(value)
    }
}

pub type BlogResult<T> = Result<T, BlogError>;

/// One listing page with its pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryPage {
    pub entries: Vec<EnrichedEntry>,
    pub pages: Vec<PageSlot>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_entries: u64,
    pub tag: Option<String>,
}

/// Row of the admin entry list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminEntry {
    pub id: RecordId,
    pub slug: String,
    pub title: String,
    pub creation_date: NaiveDate,
    pub tags: Vec<String>,
    pub author: Option<String>,
    pub permalink: String,
}

/// Result of a credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated(User),
    UnknownUser,
    WrongPassword,
}

/// Configured content data layer.
#[derive(Debug, Clone)]
pub struct DataLayer {
    config: DataLayerConfig,
    backend: Backend,
}

impl DataLayer {
    /// Validates `config` and selects its backend.
    ///
    /// # Errors
    /// - `BlogError::Config` for any configuration problem.
    pub fn new(config: DataLayerConfig) -> BlogResult<Self> {
        config.validate()?;
        let backend = Backend::from_config(&config)?;
        info!(
            "event=data_layer_init module=service status=ok backend={} max_page_entries={}",
            backend.kind(),
            config.max_page_entries
        );
        Ok(Self { config, backend })
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Opens the session for one request and resolves the current user.
    ///
    /// An id that no longer resolves is treated as anonymous.
    pub fn begin_request(&self, user_id: Option<RecordId>) -> BlogResult<RequestContext> {
        let request_id = Uuid::new_v4();
        let session = self.backend.connect()?;
        let user = match user_id {
            Some(id) => {
                let profile = session.user_profile(id)?;
                if profile.is_none() {
                    warn!(
                        "event=request_begin module=service status=ok request_id={} user=stale",
                        request_id
                    );
                }
                profile
            }
            None => None,
        };
        Ok(RequestContext {
            session,
            user,
            request_id,
            max_page_entries: self.config.max_page_entries,
        })
    }

    /// Seeds an account, outside of any request.
    pub fn provision_user(&self, username: &str, password: &str, role: Role) -> BlogResult<User> {
        let mut issues = Vec::new();
        if username.trim().is_empty() {
            issues.push(ValidationIssue::EmptyUsername);
        }
        if password.is_empty() {
            issues.push(ValidationIssue::EmptyPassword);
        }
        if !issues.is_empty() {
            return Err(BlogError::Validation(issues));
        }

        let mut session = self.backend.connect()?;
        let user = session.provision_user(username.trim(), &password_digest(password), role)?;
        session.close()?;
        info!(
            "event=user_provision module=service status=ok user_id={} role={:?}",
            user.id, user.role
        );
        Ok(user)
    }
}

/// Per-request state: the store session and the authenticated user, if any.
#[derive(Debug)]
pub struct RequestContext {
    session: StoreSession,
    user: Option<UserProfile>,
    request_id: Uuid,
    max_page_entries: u32,
}

impl RequestContext {
    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    /// Lists one page of entries, newest first, optionally filtered by tag.
    ///
    /// Page 0 is treated as page 1. Returns `None` past the last page.
    pub fn list_entries(&self, tag: Option<&str>, page: u32) -> BlogResult<Option<EntryPage>> {
        let current_page = page.max(1);
        let total_entries = self.session.entry_count(tag)?;
        let total = total_pages(total_entries, self.max_page_entries)?;
        if current_page > total {
            info!(
                "event=list_entries module=service status=not_found request_id={} page={} total_pages={}",
                self.request_id, current_page, total
            );
            return Ok(None);
        }

        let query = EntryQuery {
            tag: tag.map(str::to_string),
            offset: (current_page - 1).saturating_mul(self.max_page_entries),
            limit: self.max_page_entries,
        };
        let entries = self.session.entries(&query)?;
        let entries = enrich_entries(&self.session, entries)?;

        info!(
            "event=list_entries module=service status=ok request_id={} page={} total_pages={} rows={}",
            self.request_id,
            current_page,
            total,
            entries.len()
        );
        Ok(Some(EntryPage {
            entries,
            pages: page_window(current_page, total)?,
            current_page,
            total_pages: total,
            total_entries,
            tag: query.tag,
        }))
    }

    /// Looks up one entry by its permalink components.
    ///
    /// # Errors
    /// - `Validation([InvalidDate])` when the components are not a calendar date.
    pub fn view_entry(
        &self,
        year: i32,
        month: u32,
        day: u32,
        slug: &str,
    ) -> BlogResult<Option<EnrichedEntry>> {
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| BlogError::Validation(vec![ValidationIssue::InvalidDate]))?;
        let Some(entry) = self.session.entry_by_slug_and_date(slug, date)? else {
            return Ok(None);
        };
        let mut enriched = enrich_entries(&self.session, vec![entry])?;
        Ok(enriched.pop())
    }

    /// Checks credentials; does not change the request's user.
    pub fn login(&self, username: &str, password: &str) -> BlogResult<LoginOutcome> {
        let outcome = match self.session.user_by_name(username)? {
            None => LoginOutcome::UnknownUser,
            Some(user) if verify_password(password, &user.password_digest) => {
                LoginOutcome::Authenticated(user)
            }
            Some(_) => LoginOutcome::WrongPassword,
        };
        let status = match &outcome {
            LoginOutcome::Authenticated(_) => "ok",
            LoginOutcome::UnknownUser => "unknown_user",
            LoginOutcome::WrongPassword => "wrong_password",
        };
        info!(
            "event=login module=service status={} request_id={}",
            status, self.request_id
        );
        Ok(outcome)
    }

    /// Creates an entry owned by the current user, dated today.
    pub fn add_entry(&mut self, title: &str, body: &str, tags: &str) -> BlogResult<Entry> {
        self.add_entry_on(title, body, tags, Local::now().date_naive())
    }

    /// Same as `add_entry` with an explicit creation date.
    ///
    /// # Errors
    /// - `Unauthorized` without an authenticated user.
    /// - `Validation` listing every failing field.
    pub fn add_entry_on(
        &mut self,
        title: &str,
        body: &str,
        tags: &str,
        created_on: NaiveDate,
    ) -> BlogResult<Entry> {
        let owner = self.user.ok_or(BlogError::Unauthorized)?;

        let mut issues = Vec::new();
        if title.trim().is_empty() {
            issues.push(ValidationIssue::EmptyTitle);
        } else if slugify(title).is_empty() {
            issues.push(ValidationIssue::EmptySlug);
        }
        if body.trim().is_empty() {
            issues.push(ValidationIssue::EmptyBody);
        }
        if !issues.is_empty() {
            warn!(
                "event=entry_add module=service status=error request_id={} error_code=validation issues={}",
                self.request_id,
                issues.len()
            );
            return Err(BlogError::Validation(issues));
        }

        let entry = self.session.insert_entry(&NewEntry {
            title: title.to_string(),
            body: body.to_string(),
            owner: owner.id,
            tags: tags.to_string(),
            created_on,
        })?;
        info!(
            "event=entry_add module=service status=ok request_id={} entry_id={}",
            self.request_id, entry.id
        );
        Ok(entry)
    }

    /// Every entry with tags and author, for the admin surface.
    pub fn admin_entry_list(&self) -> BlogResult<Vec<AdminEntry>> {
        let user = self.user.ok_or(BlogError::Unauthorized)?;
        if !user.is_admin() {
            warn!(
                "event=admin_entry_list module=service status=error request_id={} error_code=forbidden",
                self.request_id
            );
            return Err(BlogError::Forbidden);
        }

        let entries = self.session.entries(&EntryQuery {
            tag: None,
            offset: 0,
            limit: u32::MAX,
        })?;
        let mut enriched: Vec<EnrichedEntry> =
            entries.into_iter().map(EnrichedEntry::new).collect();
        hydrate_tags(&self.session, &mut enriched)?;
        hydrate_authors(&self.session, &mut enriched)?;

        Ok(enriched
            .into_iter()
            .map(|item| AdminEntry {
                permalink: item.permalink(),
                id: item.entry.id,
                slug: item.entry.slug,
                title: item.entry.title,
                creation_date: item.entry.creation_date,
                tags: item.tags,
                author: item.author,
            })
            .collect())
    }

    pub fn get_user(&self, username: &str) -> BlogResult<Option<User>> {
        Ok(self.session.user_by_name(username)?)
    }

    pub fn load_user_profile(&self, id: RecordId) -> BlogResult<Option<UserProfile>> {
        Ok(self.session.user_profile(id)?)
    }

    /// Releases the request's session explicitly, surfacing close errors.
    pub fn finish(self) -> BlogResult<()> {
        self.session.close()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{BlogError, DataLayer, LoginOutcome, ValidationIssue};
    use crate::config::DataLayerConfig;
    use crate::model::user::Role;
    use chrono::NaiveDate;

    fn layer() -> DataLayer {
        DataLayer::new(DataLayerConfig::document().with_max_page_entries(2)).unwrap()
    }

    #[test]
    fn zero_page_size_is_a_config_error() {
        let err = DataLayer::new(DataLayerConfig::document().with_max_page_entries(0)).unwrap_err();
        assert!(matches!(err, BlogError::Config(_)));
    }

    #[test]
    fn add_entry_reports_every_issue_and_writes_nothing() {
        let layer = layer();
        let admin = layer.provision_user("bargio", "secret", Role::Admin).unwrap();
        let mut request = layer.begin_request(Some(admin.id)).unwrap();

        let err = request.add_entry(" ", "", "tag").unwrap_err();
        match err {
            BlogError::Validation(issues) => assert_eq!(
                issues,
                vec![ValidationIssue::EmptyTitle, ValidationIssue::EmptyBody]
            ),
            other => panic!("unexpected error: {other}"),
        }

        let err = request.add_entry("?!", "body", "").unwrap_err();
        assert!(matches!(err, BlogError::Validation(issues) if issues == vec![ValidationIssue::EmptySlug]));
        assert_eq!(request.list_entries(None, 1).unwrap().unwrap().total_entries, 0);
    }

    #[test]
    fn anonymous_request_cannot_add_entries() {
        let layer = layer();
        let mut request = layer.begin_request(None).unwrap();
        assert!(matches!(
            request.add_entry("Title", "Body", ""),
            Err(BlogError::Unauthorized)
        ));
    }

    #[test]
    fn login_distinguishes_outcomes() {
        let layer = layer();
        layer.provision_user("bargio", "secret", Role::User).unwrap();
        let request = layer.begin_request(None).unwrap();

        assert!(matches!(
            request.login("bargio", "secret").unwrap(),
            LoginOutcome::Authenticated(user) if user.username == "bargio"
        ));
        assert_eq!(request.login("bargio", "nope").unwrap(), LoginOutcome::WrongPassword);
        assert_eq!(request.login("ghost", "secret").unwrap(), LoginOutcome::UnknownUser);
    }

    #[test]
    fn view_entry_rejects_impossible_dates() {
        let layer = layer();
        let request = layer.begin_request(None).unwrap();
        assert!(matches!(
            request.view_entry(2011, 2, 30, "slug"),
            Err(BlogError::Validation(issues)) if issues == vec![ValidationIssue::InvalidDate]
        ));
    }

    #[test]
    fn stale_user_id_is_anonymous() {
        let layer = layer();
        let request = layer.begin_request(Some(42)).unwrap();
        assert!(request.user().is_none());
    }

    #[test]
    fn add_entry_on_uses_given_date() {
        let layer = layer();
        let user = layer.provision_user("bargio", "secret", Role::User).unwrap();
        let mut request = layer.begin_request(Some(user.id)).unwrap();
        let date = NaiveDate::from_ymd_opt(2010, 12, 24).unwrap();

        let entry = request.add_entry_on("Xmas eve", "Body", "", date).unwrap();
        assert_eq!(entry.creation_date, date);
        assert_eq!(entry.permalink(), "/articles/2010/12/24/xmas-eve");
        request.finish().unwrap();
    }
}
