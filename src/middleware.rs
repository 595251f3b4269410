use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::SignedCookieJar;
use serde_json::json;

use crate::error::Result;
use crate::model::UserRecord;
use crate::session::{flash, Session};
use crate::state::AppState;

/// Logged-in user, inserted into request extensions by [`require_login`]
#[derive(Clone, Debug)]
pub struct CurrentUser(pub UserRecord);

/// Resolves the session user for routes that need an account.
///
/// Anonymous requests, and sessions naming a user that no longer exists, are
/// redirected to `/login` with a message suited to the page they asked for.
pub async fn require_login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let session = Session::load(&jar);
    let user = match session.user_id.as_deref() {
        Some(id) => state.store.find_user(id)?,
        None => None,
    };

    match user {
        Some(user) => {
            request.extensions_mut().insert(CurrentUser(user));
            Ok(next.run(request).await)
        }
        None => {
            let message = login_prompt(request.method(), request.uri().path());
            tracing::debug!(path = request.uri().path(), "anonymous request redirected to login");
            Ok((flash(jar, message)?, Redirect::to("/login")).into_response())
        }
    }
}

fn login_prompt(method: &Method, path: &str) -> &'static str {
    match (method, path) {
        (&Method::GET, "/urls") => {
            "You must be logged in to see your list of saved URLS. Please log in or register."
        }
        (&Method::GET, "/urls/new") => "Please log in or register to be able to shorten URLs.",
        _ => "Please log in or register.",
    }
}

/// Checks the `Authorization` header against the configured admin token.
///
/// When no token is configured the check is skipped.
pub async fn require_admin_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> std::result::Result<Response, Response> {
    if let Some(token) = state.admin_token.as_deref() {
        let authorized = headers
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value == token);

        if !authorized {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "Unauthorized",
                    "message": "Invalid or missing authorization header"
                })),
            )
                .into_response());
        }
    }

    Ok(next.run(request).await)
}
