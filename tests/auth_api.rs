mod common;

use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
async fn writes_without_a_token_are_unauthenticated() {
    let server = common::spawn().await;

    for (method, path) in [
        (reqwest::Method::POST, "/api/pages"),
        (reqwest::Method::PUT, "/api/pages/1"),
        (reqwest::Method::DELETE, "/api/media/1"),
        (reqwest::Method::POST, "/api/roles"),
        (reqwest::Method::POST, "/api/logout"),
        (reqwest::Method::GET, "/api/user"),
    ] {
        let response = server
            .client
            .request(method.clone(), server.url(path))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {path}");
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Unauthenticated. Please provide a valid token.");
    }
}

#[tokio::test]
async fn non_bearer_schemes_are_rejected() {
    let server = common::spawn().await;

    let response = server
        .client
        .post(server.url("/api/logout"))
        .header("Authorization", "Basic YWRtaW46c2VjcmV0")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_bearer_tokens_are_rejected() {
    let server = common::spawn().await;

    let response = server
        .client
        .post(server.url("/api/teams"))
        .bearer_auth("not-a-number|secret")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_reports_every_invalid_field() {
    let server = common::spawn().await;

    let response = server
        .client
        .post(server.url("/api/register"))
        .json(&json!({
            "name": "Jane",
            "email": "not-an-email",
            "password": "short",
            "role": "owner"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Invalid input data");
    assert_eq!(
        body["errors"]["email"][0],
        "The email field must be a valid email address."
    );
    assert_eq!(
        body["errors"]["password"][0],
        "The password field must be at least 8 characters."
    );
    assert_eq!(body["errors"]["role"][0], "The selected role is invalid.");
    assert!(body["errors"].get("name").is_none());
}

#[tokio::test]
async fn register_requires_all_fields() {
    let server = common::spawn().await;

    let response = server
        .client
        .post(server.url("/api/register"))
        .json(&json!({ "name": "" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    for field in ["name", "email", "password", "role"] {
        assert_eq!(
            body["errors"][field][0],
            format!("The {field} field is required."),
            "{field}"
        );
    }
}

#[tokio::test]
async fn login_requires_email_and_password() {
    let server = common::spawn().await;

    let response = server
        .client
        .post(server.url("/api/login"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["errors"]["email"][0], "The email field is required.");
    assert_eq!(body["errors"]["password"][0], "The password field is required.");
}

#[tokio::test]
async fn malformed_json_is_unprocessable() {
    let server = common::spawn().await;

    let response = server
        .client
        .post(server.url("/api/login"))
        .header("Content-Type", "application/json")
        .body("{\"email\":")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Invalid JSON body");
}
