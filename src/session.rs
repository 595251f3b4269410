//! Cookie-backed sessions
//!
//! The whole session is a small JSON document in one signed cookie: the
//! logged-in user id and a one-shot flash message shown by the next page.

use axum_extra::extract::cookie::{Cookie, SignedCookieJar};
use serde::{Deserialize, Serialize};
use time::Duration;

pub const SESSION_COOKIE: &str = "session";

/// Sessions expire a day after the last response that wrote them.
pub const SESSION_MAX_AGE: Duration = Duration::hours(24);

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user_id: Option<String>,
    pub error_msg: Option<String>,
}

impl Session {
    /// Reads the session from `jar`. Missing, tampered or unreadable cookies
    /// yield an empty session.
    pub fn load(jar: &SignedCookieJar) -> Self {
        jar.get(SESSION_COOKIE)
            .and_then(|cookie| serde_json::from_str(cookie.value()).ok())
            .unwrap_or_default()
    }

    /// Writes the session back into `jar`.
    pub fn save(&self, jar: SignedCookieJar) -> Result<SignedCookieJar, serde_json::Error> {
        let value = serde_json::to_string(self)?;
        let cookie = Cookie::build((SESSION_COOKIE, value))
            .path("/")
            .http_only(true)
            .max_age(SESSION_MAX_AGE);
        Ok(jar.add(cookie))
    }

    /// Removes and returns the pending flash message.
    pub fn take_flash(&mut self) -> Option<String> {
        self.error_msg.take()
    }
}

/// Stores `message` as the flash for the next page, leaving the user as is.
pub fn flash(
    jar: SignedCookieJar,
    message: impl Into<String>,
) -> Result<SignedCookieJar, serde_json::Error> {
    let mut session = Session::load(&jar);
    session.error_msg = Some(message.into());
    session.save(jar)
}
