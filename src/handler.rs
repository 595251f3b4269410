//! HTTP request handlers for the URL shortener
//!
//! Pages are returned as JSON view documents. Every mutating route answers
//! with a redirect, and user-facing problems travel to the next page as a
//! flash message in the session.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Extension, Form, Json,
};
use axum_extra::extract::cookie::SignedCookieJar;
use chrono::Utc;
use serde_json::json;

use crate::database::Ownership;
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::model::{
    make_proper_url, AuthPage, CredentialsForm, IndexPage, ListParams, NewUrlPage, ShowPage,
    UrlForm, UrlView, UserRecord,
};
use crate::password::{hash_password, verify_password};
use crate::session::{flash, Session};
use crate::state::AppState;

const BAD_FORM: &str = "Bad request. How did you get around the form? Maybe you're cheating with curl?";

/// `GET /`: send users to their links, everybody else to the login page.
pub async fn home(State(state): State<AppState>, jar: SignedCookieJar) -> Result<Response> {
    let target = if logged_in_user(&state, &jar)?.is_some() {
        "/urls"
    } else {
        "/login"
    };
    Ok(Redirect::to(target).into_response())
}

/// `GET /register` and `GET /login`
pub async fn auth_page(State(state): State<AppState>, jar: SignedCookieJar) -> Result<Response> {
    if logged_in_user(&state, &jar)?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let mut session = Session::load(&jar);
    let error_msg = session.take_flash();
    let jar = session.save(jar)?;

    Ok((jar, Json(AuthPage { email: None, error_msg })).into_response())
}

/// `POST /register`
///
/// Allocates the user id, stores the Argon2 hash and logs the new user in.
/// Taken emails bounce back to the form with a message.
pub async fn register(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<CredentialsForm>,
) -> Result<Response> {
    if form.email.is_empty() || form.password.is_empty() {
        return Ok((StatusCode::BAD_REQUEST, BAD_FORM).into_response());
    }

    if state.store.find_user_by_email(&form.email)?.is_some() {
        return email_taken(jar);
    }

    let password_hash = hash_password(&form.password)?;
    let Some(user) =
        state
            .store
            .register_user(&form.email, password_hash, &state.codes, state.strategy)?
    else {
        // Lost a race with a concurrent registration
        return email_taken(jar);
    };

    tracing::info!(user_id = %user.id, "user registered");

    let session = Session {
        user_id: Some(user.id),
        error_msg: None,
    };
    Ok((session.save(jar)?, Redirect::to("/urls")).into_response())
}

fn email_taken(jar: SignedCookieJar) -> Result<Response> {
    let jar = flash(
        jar,
        "Error: that e-mail address already exists. Please log in with the correct password or register for a new account.",
    )?;
    Ok((jar, Redirect::to("/register")).into_response())
}

/// `POST /login`
pub async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<CredentialsForm>,
) -> Result<Response> {
    let Some(user) = state.store.find_user_by_email(&form.email)? else {
        let jar = flash(
            jar,
            "No such user exists. Please try again or register for a new account.",
        )?;
        return Ok((jar, Redirect::to("/login")).into_response());
    };

    if !verify_password(&form.password, &user.password_hash) {
        tracing::info!(user_id = %user.id, "failed login");
        let jar = flash(
            jar,
            "Wrong password! Please try again or register for a new account.",
        )?;
        return Ok((jar, Redirect::to("/login")).into_response());
    }

    let session = Session {
        user_id: Some(user.id),
        error_msg: None,
    };
    Ok((session.save(jar)?, Redirect::to("/")).into_response())
}

/// `POST /logout`
pub async fn logout(jar: SignedCookieJar) -> Result<Response> {
    let session = Session {
        user_id: None,
        error_msg: Some("You have been logged out.".to_string()),
    };
    Ok((session.save(jar)?, Redirect::to("/login")).into_response())
}

/// `GET /urls`: the current user's links.
pub async fn list_own_urls(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    jar: SignedCookieJar,
) -> Result<Response> {
    let mut session = Session::load(&jar);
    let error_msg = session.take_flash();
    let jar = session.save(jar)?;

    let now = Utc::now();
    let urls = state
        .store
        .urls_owned_by(&user.id)?
        .into_iter()
        .map(|record| UrlView::from_record(record, now))
        .collect();

    let page = IndexPage {
        email: user.email,
        error_msg,
        urls,
    };
    Ok((jar, Json(page)).into_response())
}

/// `GET /urls/new`
pub async fn new_url_page(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<NewUrlPage> {
    Json(NewUrlPage { email: user.email })
}

/// `GET /urls/{id}`: edit page. Unknown codes and codes owned by somebody
/// else render with empty URL fields.
pub async fn show_url(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ShowPage>> {
    let page = match state.store.get_owned_url(&id, &user.id)? {
        Some(record) => ShowPage {
            short_url: Some(record.code),
            long_url: Some(record.url),
            email: user.email,
        },
        None => ShowPage {
            short_url: None,
            long_url: None,
            email: user.email,
        },
    };
    Ok(Json(page))
}

/// `POST /urls`
pub async fn create_short_url(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Form(form): Form<UrlForm>,
) -> Result<Response> {
    let Some(url) = redirect_target(&form.long_url) else {
        return Ok((StatusCode::BAD_REQUEST, BAD_FORM).into_response());
    };

    let record = state.store.create_url(
        &user.id,
        url,
        &state.codes,
        state.strategy,
        Utc::now(),
    )?;

    tracing::info!(code = %record.code, owner = %user.id, "short url created");

    Ok(Redirect::to(&format!("/urls/{}", record.code)).into_response())
}

/// `POST /urls/{id}`: retarget a link the user owns.
pub async fn update_short_url(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    jar: SignedCookieJar,
    Form(form): Form<UrlForm>,
) -> Result<Response> {
    let Some(url) = redirect_target(&form.long_url) else {
        return Ok((StatusCode::BAD_REQUEST, BAD_FORM).into_response());
    };

    match state.store.update_url(&id, &user.id, url, Utc::now())? {
        Ownership::Owned => Ok(Redirect::to(&format!("/urls/{id}")).into_response()),
        Ownership::Denied => {
            let jar = flash(jar, "Sorry, you cannot edit that URL.")?;
            Ok((jar, Redirect::to("/urls")).into_response())
        }
    }
}

/// `POST /urls/{id}/delete`
pub async fn delete_short_url(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
    jar: SignedCookieJar,
) -> Result<Response> {
    let message = match state.store.delete_url(&id, &user.id)? {
        Ownership::Owned => {
            tracing::info!(code = %id, "short url deleted");
            "URL deleted."
        }
        Ownership::Denied => "Sorry, you cannot delete that URL.",
    };
    Ok((flash(jar, message)?, Redirect::to("/urls")).into_response())
}

/// `GET /u/{id}`: the public redirect.
///
/// Uses 307 Temporary Redirect so every visit reaches the server and is
/// counted. Unknown codes send the visitor to their link list, or to the
/// login page when nobody is logged in.
pub async fn redirect_url(
    State(state): State<AppState>,
    Path(id): Path<String>,
    jar: SignedCookieJar,
) -> Result<Response> {
    if let Some(url) = state.store.record_visit(&id, Utc::now())? {
        return Ok(Redirect::temporary(&url).into_response());
    }

    let response = if logged_in_user(&state, &jar)?.is_some() {
        let jar = flash(
            jar,
            "Sorry, that shortcut does not exist. Here are your saved shortcuts.",
        )?;
        (jar, Redirect::to("/urls")).into_response()
    } else {
        let jar = flash(
            jar,
            "Sorry, that shortcut does not exist. Perhaps you would like to log in or register?",
        )?;
        (jar, Redirect::to("/login")).into_response()
    };
    Ok(response)
}

/// `GET /urls.json`: every stored link, paginated.
///
/// # Query Parameters
///
/// - `page` (optional) - Page number, starts from 1 (default: 1)
/// - `limit` (optional) - Items per page, max 100 (default: 10)
pub async fn list_all_urls(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Response> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(10).min(100);
    let offset = (page - 1).saturating_mul(limit);

    let results = state.store.all_urls(offset, limit)?;

    Ok(Json(json!({
        "page": page,
        "limit": limit,
        "total_fetched": results.len(),
        "data": results
    }))
    .into_response())
}

/// Anything unrouted goes home.
pub async fn fallback() -> Redirect {
    Redirect::to("/")
}

/// Normalizes a submitted long URL. `None` when it is empty or could never
/// be sent back in a `Location` header.
fn redirect_target(long_url: &str) -> Option<String> {
    let trimmed = long_url.trim();
    if trimmed.is_empty() {
        return None;
    }
    let url = make_proper_url(trimmed);
    HeaderValue::from_str(&url).ok().map(|_| url)
}

fn logged_in_user(state: &AppState, jar: &SignedCookieJar) -> Result<Option<UserRecord>> {
    match Session::load(jar).user_id {
        Some(id) => state.store.find_user(&id),
        None => Ok(None),
    }
}
