mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;

use common::{location, response_json, setup_test_app, Client};
use tinyapp::config::Config;

#[tokio::test]
async fn test_register_logs_in() {
    let (app, state) = setup_test_app(&Config::default());
    let mut client = Client::new(&app);
    client.register("a@a.a", "secret").await;

    let response = client.get("/").await;
    assert_eq!(location(&response), "/urls");

    let body = response_json(client.get("/urls").await).await;
    assert_eq!(body["email"], "a@a.a");
    assert_eq!(body["error_msg"], Value::Null);

    let user = state.store.find_user_by_email("a@a.a").unwrap().unwrap();
    assert_eq!(user.id.len(), 8);
    assert_ne!(user.password_hash, "secret");
    assert!(user.password_hash.starts_with("$argon2"));
}

#[tokio::test]
async fn test_session_cookie_lasts_a_day() {
    let (app, _state) = setup_test_app(&Config::default());
    let mut client = Client::new(&app);

    let response = client
        .post_form("/register", "email=a@a.a&password=secret")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with("session="));
    assert!(set_cookie.contains("Max-Age=86400"), "{set_cookie}");
    assert!(set_cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_logged_in_users_skip_auth_pages() {
    let (app, _state) = setup_test_app(&Config::default());
    let mut client = Client::new(&app);
    client.register("a@a.a", "secret").await;

    for page in ["/login", "/register"] {
        let response = client.get(page).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }
}

#[tokio::test]
async fn test_register_requires_both_fields() {
    let (app, _state) = setup_test_app(&Config::default());
    let mut client = Client::new(&app);

    for form in ["email=a@a.a&password=", "email=&password=pw", ""] {
        let response = client.post_form("/register", form).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "form {form:?}");
    }
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let (app, _state) = setup_test_app(&Config::default());
    let mut first = Client::new(&app);
    first.register("a@a.a", "secret").await;

    let mut second = Client::new(&app);
    let response = second
        .post_form("/register", "email=a@a.a&password=other")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/register");

    let msg = second.flash_on("/register").await;
    assert!(msg.as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn test_login_flow() {
    let (app, _state) = setup_test_app(&Config::default());
    let mut client = Client::new(&app);
    client.register("a@a.a", "secret").await;

    let response = client.post_form("/logout", "").await;
    assert_eq!(location(&response), "/login");
    assert_eq!(client.flash_on("/login").await, "You have been logged out.");

    let response = client.get("/urls").await;
    assert_eq!(location(&response), "/login");
    client.flash_on("/login").await;

    let response = client
        .post_form("/login", "email=nobody@a.a&password=secret")
        .await;
    assert_eq!(location(&response), "/login");
    assert_eq!(
        client.flash_on("/login").await,
        "No such user exists. Please try again or register for a new account."
    );

    let response = client.post_form("/login", "email=a@a.a&password=wrong").await;
    assert_eq!(location(&response), "/login");
    assert_eq!(
        client.flash_on("/login").await,
        "Wrong password! Please try again or register for a new account."
    );

    let response = client.post_form("/login", "email=a@a.a&password=secret").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = client.get("/urls").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_forged_session_is_ignored() {
    let (app, _state) = setup_test_app(&Config::default());

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/urls")
                .header("cookie", r#"session={"user_id":"aaaaaaaa","error_msg":null}"#)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_session_from_other_key_is_ignored() {
    let (app_a, _) = setup_test_app(&Config::default());
    let (app_b, _) = setup_test_app(&Config::default());

    let mut client = Client::new(&app_a);
    client.register("a@a.a", "secret").await;

    // Same cookie, different process key
    let mut replay = client.with_app(&app_b);
    let response = replay.get("/urls").await;
    assert_eq!(location(&response), "/login");
}

fn admin_config() -> Config {
    Config {
        admin_token: Some("secret_token".to_string()),
        ..Config::default()
    }
}

async fn get_json_dump(app: &axum::Router, token: Option<&str>) -> axum::response::Response {
    let mut request = Request::builder().method("GET").uri("/urls.json");
    if let Some(token) = token {
        request = request.header("Authorization", token);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_admin_token_valid() {
    let (app, _state) = setup_test_app(&admin_config());
    let response = get_json_dump(&app, Some("secret_token")).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_token_invalid() {
    let (app, _state) = setup_test_app(&admin_config());
    let response = get_json_dump(&app, Some("wrong_token")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Unauthorized");
    assert_eq!(body["message"], "Invalid or missing authorization header");
}

#[tokio::test]
async fn test_admin_token_missing() {
    let (app, _state) = setup_test_app(&admin_config());
    let response = get_json_dump(&app, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_json_dump_open_without_token_and_paginated() {
    let (app, _state) = setup_test_app(&Config::default());
    let mut client = Client::new(&app);
    client.register("a@a.a", "secret").await;
    for i in 0..5 {
        client.shorten(&format!("example.com/{i}")).await;
    }

    let body = response_json(get_json_dump(&app, None).await).await;
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 10);
    assert_eq!(body["total_fetched"], 5);
    assert!(body["data"][0]["url"]
        .as_str()
        .unwrap()
        .starts_with("http://example.com/"));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/urls.json?page=2&limit=2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = response_json(response).await;
    assert_eq!(body["page"], 2);
    assert_eq!(body["total_fetched"], 2);
}
