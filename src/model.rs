//! Data models for the URL shortener application
//!
//! Stored records, form payloads, page views, and the small string helpers
//! used to display them.

use chrono::{DateTime, Datelike, Local, TimeDelta, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Strings at least this long are abbreviated for display.
const MAX_TOLERATED_LENGTH: usize = 60;

/// A shortened URL as stored in the database
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UrlRecord {
    /// Short code, also the key in the URL table
    pub code: String,

    /// Id of the user who created the link
    pub owner: String,

    /// Redirect target, always starting with a scheme
    pub url: String,

    /// Display form of `url`, see [`abbreviate`]
    pub abbreviated_url: String,

    #[serde(default)]
    pub used_count: UsedCount,

    pub created: DateTime<Utc>,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_used: Option<DateTime<Utc>>,
}

/// Redirect counters
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsedCount {
    pub since_created: u64,
    /// Reset whenever the target URL changes
    pub since_last_updated: u64,
}

impl UrlRecord {
    pub fn new(code: String, owner: String, url: String, now: DateTime<Utc>) -> Self {
        Self {
            code,
            owner,
            abbreviated_url: abbreviate(&url),
            url,
            used_count: UsedCount::default(),
            created: now,
            last_updated: None,
            last_used: None,
        }
    }

    /// Points the record at a new target. Returns false, leaving the record
    /// untouched, when `url` equals the current target.
    pub fn retarget(&mut self, url: String, now: DateTime<Utc>) -> bool {
        if self.url == url {
            return false;
        }
        self.abbreviated_url = abbreviate(&url);
        self.url = url;
        self.used_count.since_last_updated = 0;
        self.last_updated = Some(now);
        true
    }

    /// Counts one redirect through this record.
    pub fn record_visit(&mut self, now: DateTime<Utc>) {
        self.used_count.since_created += 1;
        self.used_count.since_last_updated += 1;
        self.last_used = Some(now);
    }
}

/// A registered account
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    /// Argon2 hash in PHC string format
    pub password_hash: String,
}

/// Form payload for `POST /register` and `POST /login`
#[derive(Deserialize, Debug, Default)]
pub struct CredentialsForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Form payload for creating or updating a short URL
#[derive(Deserialize, Debug, Default)]
pub struct UrlForm {
    #[serde(default, alias = "longURL")]
    pub long_url: String,
}

/// Query parameters for `GET /urls.json`
///
/// # Example
/// Query string: `?page=2&limit=20`
#[derive(Deserialize, Debug, Default)]
pub struct ListParams {
    /// Page number, starts from 1 (default 1)
    pub page: Option<usize>,

    /// Items per page (default 10, maximum 100)
    pub limit: Option<usize>,
}

/// Page shown on `/login` and `/register`
#[derive(Serialize, Debug)]
pub struct AuthPage {
    pub email: Option<String>,
    pub error_msg: Option<String>,
}

/// Page shown on `/urls`
#[derive(Serialize, Debug)]
pub struct IndexPage {
    pub email: String,
    pub error_msg: Option<String>,
    pub urls: Vec<UrlView>,
}

/// Page shown on `/urls/new`
#[derive(Serialize, Debug)]
pub struct NewUrlPage {
    pub email: String,
}

/// Page shown on `/urls/{id}`. Both URL fields are `None` when the code does
/// not exist or belongs to someone else.
#[derive(Serialize, Debug)]
pub struct ShowPage {
    pub short_url: Option<String>,
    pub long_url: Option<String>,
    pub email: String,
}

/// One row of the `/urls` listing
#[derive(Serialize, Debug)]
pub struct UrlView {
    pub code: String,
    pub url: String,
    pub abbreviated_url: String,
    pub used_count: UsedCount,
    pub created: String,
    pub last_updated: String,
    pub last_used: String,
}

impl UrlView {
    pub fn from_record(record: UrlRecord, now: DateTime<Utc>) -> Self {
        Self {
            created: describe_time(Some(record.created), now),
            last_updated: describe_time(record.last_updated, now),
            last_used: describe_time(record.last_used, now),
            code: record.code,
            url: record.url,
            abbreviated_url: record.abbreviated_url,
            used_count: record.used_count,
        }
    }
}

/// Prefixes `http://` unless the URL already names an http(s) scheme, so that
/// `example.com` does not redirect to a path on this server.
pub fn make_proper_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

/// Elides the middle of long strings: `"[first 30]...[last 30]"`.
pub fn abbreviate(s: &str) -> String {
    let len = s.chars().count();
    if len < MAX_TOLERATED_LENGTH {
        return s.to_string();
    }
    let half = MAX_TOLERATED_LENGTH / 2;
    let head: String = s.chars().take(half).collect();
    let tail: String = s.chars().skip(len - half).collect();
    format!("{head}...{tail}")
}

/// Human-friendly rendering of `then` relative to `now`, in local time.
pub fn describe_time(then: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(then) = then else {
        return String::new();
    };

    let elapsed = now - then;
    let then_local = then.with_timezone(&Local);
    let now_local = now.with_timezone(&Local);

    if elapsed < TimeDelta::seconds(10) {
        "a few seconds ago".to_string()
    } else if elapsed < TimeDelta::minutes(1) {
        "less than a minute ago".to_string()
    } else if elapsed < TimeDelta::days(1) && now_local.day() == then_local.day() {
        format!(
            "today at {}:{:02}",
            then_local.hour(),
            then_local.minute()
        )
    } else {
        format!(
            "{}-{}-{} at {}:{:02}",
            then_local.year(),
            then_local.month(),
            then_local.day(),
            then_local.hour(),
            then_local.minute()
        )
    }
}
