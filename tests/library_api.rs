mod common;

use common::{TestServer, jpeg_part, register, send_form, send_json, user_id};
use reqwest::{Method, StatusCode, multipart::Form};
use serde_json::{Value, json};
use sqlx::PgPool;

async fn create_media(server: &TestServer, token: &str) -> Value {
    let form = Form::new()
        .text("name", "Office photo")
        .part("file", jpeg_part("office.jpg"));
    let (status, body) = send_form(server, Method::POST, "/api/media", token, form).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}

/// Team member for a freshly registered account, using seeded role 1.
async fn create_team(server: &TestServer, admin: &str) -> Value {
    let member = register(server, "member@example.com", "user").await;
    let member_id = user_id(server, &member).await;

    let form = Form::new()
        .text("name", "Jane Doe")
        .text("role_id", "1")
        .text("bio", "Backend developer")
        .text("user_id", member_id.to_string())
        .part("profile_picture", jpeg_part("jane.jpg"));
    let (status, body) = send_form(server, Method::POST, "/api/teams", admin, form).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}

#[sqlx::test(migrations = "./migrations")]
async fn media_rename_requires_a_name(pool: PgPool) {
    let server = common::spawn_with_pool(pool).await;
    let admin = register(&server, "admin@example.com", "admin").await;
    let media = create_media(&server, &admin).await;
    let path = format!("/api/media/{}", media["id"]);

    for blank in ["", "   "] {
        let form = Form::new().text("name", blank);
        let (status, body) = send_form(&server, Method::PUT, &path, &admin, form).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"]["name"][0], "The name field is required");
    }

    let form = Form::new().text("name", "  Lobby photo ");
    let (status, body) = send_form(&server, Method::PUT, &path, &admin, form).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["name"], "Lobby photo");
}

#[sqlx::test(migrations = "./migrations")]
async fn non_admins_cannot_delete_media(pool: PgPool) {
    let server = common::spawn_with_pool(pool).await;
    let admin = register(&server, "admin@example.com", "admin").await;
    let reader = register(&server, "reader@example.com", "user").await;
    let media = create_media(&server, &admin).await;

    let response = server
        .client
        .delete(server.url(&format!("/api/media/{}", media["id"])))
        .bearer_auth(&reader)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "You are not authorized to delete this media");
    assert_eq!(server.disk.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn team_updates_validate_the_role(pool: PgPool) {
    let server = common::spawn_with_pool(pool).await;
    let admin = register(&server, "admin@example.com", "admin").await;
    let team = create_team(&server, &admin).await;
    let path = format!("/api/teams/{}", team["id"]);

    let form = Form::new().text("role_id", "abc");
    let (status, body) = send_form(&server, Method::PUT, &path, &admin, form).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["role_id"][0], "The role must be a valid ID");

    let form = Form::new().text("role_id", "9999");
    let (status, body) = send_form(&server, Method::PUT, &path, &admin, form).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["role_id"][0], "The selected role does not exist");
}

#[sqlx::test(migrations = "./migrations")]
async fn team_updates_need_a_known_field(pool: PgPool) {
    let server = common::spawn_with_pool(pool).await;
    let admin = register(&server, "admin@example.com", "admin").await;
    let team = create_team(&server, &admin).await;
    let path = format!("/api/teams/{}", team["id"]);

    let form = Form::new().text("nickname", "JD");
    let (status, body) = send_form(&server, Method::PUT, &path, &admin, form).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "No valid data provided for update");
}

#[sqlx::test(migrations = "./migrations")]
async fn roles_in_use_cannot_be_deleted(pool: PgPool) {
    let server = common::spawn_with_pool(pool).await;
    let admin = register(&server, "admin@example.com", "admin").await;
    create_team(&server, &admin).await;

    let response = server
        .client
        .delete(server.url("/api/roles/1"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["message"],
        "Cannot delete role as it is being used by team members"
    );

    let response = server
        .client
        .delete(server.url("/api/roles/2"))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
async fn null_description_clears_a_role_description(pool: PgPool) {
    let server = common::spawn_with_pool(pool).await;
    let admin = register(&server, "admin@example.com", "admin").await;

    let (status, body) = send_json(
        &server,
        Method::POST,
        "/api/roles",
        &admin,
        json!({ "name": "QA Engineer", "description": "Quality assurance" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let path = format!("/api/roles/{}", body["data"]["id"]);

    let (status, body) =
        send_json(&server, Method::PUT, &path, &admin, json!({ "name": "QA Lead" })).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["description"], "Quality assurance");

    let (status, body) =
        send_json(&server, Method::PUT, &path, &admin, json!({ "description": null })).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["data"]["description"].is_null());
    assert_eq!(body["data"]["name"], "QA Lead");
}

#[sqlx::test(migrations = "./migrations")]
async fn blank_role_names_are_required(pool: PgPool) {
    let server = common::spawn_with_pool(pool).await;
    let admin = register(&server, "admin@example.com", "admin").await;

    let (status, body) =
        send_json(&server, Method::POST, "/api/roles", &admin, json!({ "name": "  " })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["name"][0], "The name field is required.");

    let (status, body) =
        send_json(&server, Method::PUT, "/api/roles/1", &admin, json!({ "name": " " })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"]["name"][0], "The name field is required.");
}
