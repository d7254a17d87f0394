mod common;

use axum::body::Bytes;
use content_api_server::storage::Storage;
use reqwest::StatusCode;
use serde_json::Value;

async fn get(server: &common::TestServer, path: &str) -> (StatusCode, Value) {
    let response = server.client.get(server.url(path)).send().await.unwrap();
    let status = response.status();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn slugs_with_uppercase_or_underscores_are_invalid() {
    let server = common::spawn().await;

    let (status, body) = get(&server, "/api/pages/Bad_Slug").await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Invalid input data");
    assert_eq!(body["errors"]["slug"][0], "Invalid slug format");
}

#[tokio::test]
async fn slugs_longer_than_255_bytes_are_rejected() {
    let server = common::spawn().await;
    let path = format!("/api/pages/{}", "a".repeat(256));

    let (status, body) = get(&server, &path).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["slug"][0], "The slug is too long");
}

#[tokio::test]
async fn non_numeric_ids_are_not_found() {
    let server = common::spawn().await;

    for (path, message) in [
        ("/api/media/abc", "Media not found"),
        ("/api/teams/1.5", "Team member not found"),
        ("/api/roles/0", "Role not found"),
    ] {
        let (status, body) = get(&server, path).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
        assert_eq!(body["message"], message, "{path}");
    }
}

#[tokio::test]
async fn an_invalid_token_on_a_public_read_is_rejected() {
    let server = common::spawn().await;

    let response = server
        .client
        .get(server.url("/api/pages"))
        .bearer_auth("x|secret")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_routes_use_the_error_envelope() {
    let server = common::spawn().await;

    let (status, body) = get(&server, "/api/nothing-here").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Resource not found");
}

#[tokio::test]
async fn memory_disk_objects_are_served_under_storage() {
    let server = common::spawn().await;
    server
        .disk
        .put("media/2025/01/photo.png", Bytes::from_static(b"png-bytes"), "image/png")
        .await
        .unwrap();

    let response = server
        .client
        .get(server.url("/storage/media/2025/01/photo.png"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    assert_eq!(&response.bytes().await.unwrap()[..], b"png-bytes");

    let (status, body) = get(&server, "/storage/media/2025/01/missing.png").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Resource not found");
}
