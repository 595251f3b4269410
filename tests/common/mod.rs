//! Shared helpers for driving the router in tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use tinyapp::config::Config;
use tinyapp::route::create_app;
use tinyapp::state::AppState;

/// Builds a fresh application with an empty in-memory store
pub fn setup_test_app(config: &Config) -> (Router, AppState) {
    let state = AppState::new(config).expect("Failed to build app state");
    (create_app(state.clone()), state)
}

/// Helper function to parse response body as JSON
pub async fn response_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();

    serde_json::from_slice(&bytes).expect("Failed to parse JSON")
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("missing location header")
        .to_str()
        .unwrap()
}

/// A browser stand-in: remembers the session cookie between requests
pub struct Client {
    app: Router,
    cookie: Option<String>,
}

impl Client {
    pub fn new(app: &Router) -> Self {
        Self {
            app: app.clone(),
            cookie: None,
        }
    }

    /// Same cookie, pointed at another application instance
    pub fn with_app(&self, app: &Router) -> Self {
        Self {
            app: app.clone(),
            cookie: self.cookie.clone(),
        }
    }

    pub async fn get(&mut self, uri: &str) -> Response {
        let request = self.request("GET", uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, uri: &str, form: &str) -> Response {
        let request = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Registers and stays logged in
    pub async fn register(&mut self, email: &str, password: &str) {
        let response = self
            .post_form("/register", &format!("email={email}&password={password}"))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/urls");
    }

    /// Creates a link and returns its short code
    pub async fn shorten(&mut self, long_url: &str) -> String {
        let response = self
            .post_form("/urls", &format!("long_url={long_url}"))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        location(&response)
            .strip_prefix("/urls/")
            .expect("redirect to the new link")
            .to_string()
    }

    /// Reads the flash message by visiting a page that consumes it
    pub async fn flash_on(&mut self, page: &str) -> Value {
        let response = self.get(page).await;
        assert_eq!(response.status(), StatusCode::OK);
        response_json(response).await["error_msg"].clone()
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> Response {
        let response = self.app.clone().oneshot(request).await.unwrap();
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }
        response
    }
}
