//! In-memory store and table definitions
//!
//! Everything lives in a redb database on the in-memory backend, so data is
//! gone when the process exits. Values are JSON-serialized records.
//!
//! redb admits a single write transaction at a time. Short code allocation
//! runs inside the same write transaction as the insert, which makes
//! check-then-reserve atomic under concurrent requests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use redb::backends::InMemoryBackend;
use redb::{Database, ReadableDatabase, ReadableTable, Table, TableDefinition};

use crate::allocator::{CodeAllocator, CodeSet, CodeStrategy};
use crate::error::{CodeError, Result};
use crate::model::{UrlRecord, UserRecord};

/// Main table for URL records
///
/// Key: short code, e.g. `"b2xvn2ab"`
/// Value: JSON-serialized [`UrlRecord`]
pub const TABLE_URLS: TableDefinition<&str, &str> = TableDefinition::new("urls_v1");

/// Index of URLs by owner
///
/// Key: composite `"{owner}:{created_micros}:{code}"`
/// Value: short code
///
/// Range scans over `"{owner}:"` return a user's links in creation order.
pub const TABLE_OWNER_INDEX: TableDefinition<&str, &str> = TableDefinition::new("owner_index_v1");

/// User accounts
///
/// Key: user id
/// Value: JSON-serialized [`UserRecord`]
pub const TABLE_USERS: TableDefinition<&str, &str> = TableDefinition::new("users_v1");

/// Unique email lookup
///
/// Key: email address
/// Value: user id
pub const TABLE_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("emails_v1");

impl CodeSet for Table<'_, &'static str, &'static str> {
    fn contains_code(&self, code: &str) -> std::result::Result<bool, CodeError> {
        self.get(code)
            .map(|value| value.is_some())
            .map_err(|e| CodeError::Storage(e.to_string()))
    }
}

/// Outcome of an owner-checked mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// The record exists and belongs to the caller
    Owned,
    /// Missing, or owned by somebody else
    Denied,
}

fn owner_key(owner: &str, created: DateTime<Utc>, code: &str) -> String {
    format!("{}:{}:{}", owner, created.timestamp_micros(), code)
}

/// Handle to the process-local database
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
}

impl Store {
    /// Creates an empty in-memory database with all tables present.
    pub fn in_memory() -> Result<Self> {
        let db = Database::builder().create_with_backend(InMemoryBackend::new())?;

        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(TABLE_URLS)?;
            write_txn.open_table(TABLE_OWNER_INDEX)?;
            write_txn.open_table(TABLE_USERS)?;
            write_txn.open_table(TABLE_EMAILS)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Registers a new account. Returns `None` when the email is taken.
    ///
    /// The user id is allocated from the user table, so ids are unique even
    /// in hash mode where they derive from the email.
    pub fn register_user(
        &self,
        email: &str,
        password_hash: String,
        codes: &CodeAllocator,
        strategy: CodeStrategy,
    ) -> Result<Option<UserRecord>> {
        let write_txn = self.db.begin_write()?;
        let user = {
            let mut emails = write_txn.open_table(TABLE_EMAILS)?;
            if emails.get(email)?.is_some() {
                return Ok(None);
            }

            let mut users = write_txn.open_table(TABLE_USERS)?;
            let id = codes.allocate_code(&users, strategy.source(email))?;
            let user = UserRecord {
                id,
                email: email.to_string(),
                password_hash,
            };

            users.insert(user.id.as_str(), serde_json::to_string(&user)?.as_str())?;
            emails.insert(email, user.id.as_str())?;
            user
        };
        write_txn.commit()?;

        Ok(Some(user))
    }

    pub fn find_user(&self, id: &str) -> Result<Option<UserRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLE_USERS)?;
        let user = match table.get(id)? {
            Some(value) => Some(serde_json::from_str(value.value())?),
            None => None,
        };
        Ok(user)
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let id = {
            let read_txn = self.db.begin_read()?;
            let table = read_txn.open_table(TABLE_EMAILS)?;
            table.get(email)?.map(|value| value.value().to_string())
        };
        match id {
            Some(id) => self.find_user(&id),
            None => Ok(None),
        }
    }

    /// Allocates a code and stores a new record for `owner` pointing at `url`.
    pub fn create_url(
        &self,
        owner: &str,
        url: String,
        codes: &CodeAllocator,
        strategy: CodeStrategy,
        now: DateTime<Utc>,
    ) -> Result<UrlRecord> {
        let write_txn = self.db.begin_write()?;
        let record = {
            let mut urls = write_txn.open_table(TABLE_URLS)?;
            let code = codes.allocate_code(&urls, strategy.source(&url))?;
            let record = UrlRecord::new(code, owner.to_string(), url, now);

            urls.insert(record.code.as_str(), serde_json::to_string(&record)?.as_str())?;

            let mut index = write_txn.open_table(TABLE_OWNER_INDEX)?;
            let key = owner_key(owner, record.created, &record.code);
            index.insert(key.as_str(), record.code.as_str())?;
            record
        };
        write_txn.commit()?;

        Ok(record)
    }

    pub fn get_url(&self, code: &str) -> Result<Option<UrlRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLE_URLS)?;
        let record = match table.get(code)? {
            Some(value) => Some(serde_json::from_str(value.value())?),
            None => None,
        };
        Ok(record)
    }

    /// Returns the URL record only when it belongs to `owner`.
    pub fn get_owned_url(&self, code: &str, owner: &str) -> Result<Option<UrlRecord>> {
        Ok(self.get_url(code)?.filter(|record| record.owner == owner))
    }

    /// All of `owner`'s links, oldest first.
    pub fn urls_owned_by(&self, owner: &str) -> Result<Vec<UrlRecord>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(TABLE_OWNER_INDEX)?;
        let urls = read_txn.open_table(TABLE_URLS)?;

        // ';' sorts right after ':', bounding the range to this owner
        let start_key = format!("{}:", owner);
        let end_key = format!("{};", owner);

        let mut records = Vec::new();
        for entry in index.range(start_key.as_str()..end_key.as_str())? {
            let (_, code) = entry?;
            if let Some(value) = urls.get(code.value())? {
                records.push(serde_json::from_str(value.value())?);
            }
        }
        Ok(records)
    }

    /// A page of every stored link, ordered by code.
    pub fn all_urls(&self, offset: usize, limit: usize) -> Result<Vec<UrlRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLE_URLS)?;

        let mut records = Vec::new();
        for entry in table.iter()?.skip(offset).take(limit) {
            let (_, value) = entry?;
            records.push(serde_json::from_str(value.value())?);
        }
        Ok(records)
    }

    /// Retargets `code` if `owner` owns it. A no-op update still counts as
    /// [`Ownership::Owned`].
    pub fn update_url(
        &self,
        code: &str,
        owner: &str,
        url: String,
        now: DateTime<Utc>,
    ) -> Result<Ownership> {
        let write_txn = self.db.begin_write()?;
        {
            let mut urls = write_txn.open_table(TABLE_URLS)?;
            let record: Option<UrlRecord> = match urls.get(code)? {
                Some(value) => Some(serde_json::from_str(value.value())?),
                None => None,
            };
            let Some(mut record) = record.filter(|r| r.owner == owner) else {
                return Ok(Ownership::Denied);
            };

            if record.retarget(url, now) {
                tracing::debug!(code, "short url retargeted");
                urls.insert(code, serde_json::to_string(&record)?.as_str())?;
            }
        }
        write_txn.commit()?;

        Ok(Ownership::Owned)
    }

    /// Counts a redirect and returns the target, or `None` for unknown codes.
    pub fn record_visit(&self, code: &str, now: DateTime<Utc>) -> Result<Option<String>> {
        let write_txn = self.db.begin_write()?;
        let target = {
            let mut urls = write_txn.open_table(TABLE_URLS)?;
            let record: Option<UrlRecord> = match urls.get(code)? {
                Some(value) => Some(serde_json::from_str(value.value())?),
                None => None,
            };
            match record {
                Some(mut record) => {
                    record.record_visit(now);
                    urls.insert(code, serde_json::to_string(&record)?.as_str())?;
                    Some(record.url)
                }
                None => None,
            }
        };
        write_txn.commit()?;

        Ok(target)
    }

    /// Deletes `code` if `owner` owns it.
    pub fn delete_url(&self, code: &str, owner: &str) -> Result<Ownership> {
        let write_txn = self.db.begin_write()?;
        {
            let mut urls = write_txn.open_table(TABLE_URLS)?;
            let record: Option<UrlRecord> = match urls.get(code)? {
                Some(value) => Some(serde_json::from_str(value.value())?),
                None => None,
            };
            let Some(record) = record.filter(|r| r.owner == owner) else {
                return Ok(Ownership::Denied);
            };

            urls.remove(code)?;

            let mut index = write_txn.open_table(TABLE_OWNER_INDEX)?;
            let key = owner_key(owner, record.created, code);
            index.remove(key.as_str())?;
        }
        write_txn.commit()?;

        Ok(Ownership::Owned)
    }
}
