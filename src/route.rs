//! Route definitions for the URL shortener
//!
//! This module configures all HTTP routes and maps them to their respective handlers.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::handler::{
    auth_page, create_short_url, delete_short_url, fallback, home, list_all_urls, list_own_urls,
    login, logout, new_url_page, redirect_url, register, show_url, update_short_url,
};
use crate::middleware::{require_admin_token, require_login};
use crate::state::AppState;

/// Creates the application router
///
/// # Route Definitions
///
/// Public:
/// - `GET /` - Redirects to `/urls` or `/login`
/// - `GET|POST /register`, `GET|POST /login`, `POST /logout`
/// - `GET /u/{id}` - Redirects to the original URL
///
/// Login required:
/// - `GET /urls`, `POST /urls` - List or create links
/// - `GET /urls/new` - New link page
/// - `GET /urls/{id}`, `POST /urls/{id}` - Show or retarget a link
/// - `POST /urls/{id}/delete` - Delete a link
///
/// Admin token (when configured):
/// - `GET /urls.json` - Paginated dump of every link
///
/// Anything else redirects to `/`.
pub fn create_app(state: AppState) -> Router {
    let account_routes = Router::new()
        .route("/urls", get(list_own_urls).post(create_short_url))
        .route("/urls/new", get(new_url_page))
        .route("/urls/{id}", get(show_url).post(update_short_url))
        .route("/urls/{id}/delete", post(delete_short_url))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_login));

    let admin_routes = Router::new()
        .route("/urls.json", get(list_all_urls))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin_token,
        ));

    Router::new()
        .route("/", get(home))
        .route("/register", get(auth_page).post(register))
        .route("/login", get(auth_page).post(login))
        .route("/logout", post(logout))
        .route("/u/{id}", get(redirect_url))
        .merge(account_routes)
        .merge(admin_routes)
        .fallback(fallback)
        .with_state(state)
}
