use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderValue, StatusCode};
use axum_test::{
    multipart::{MultipartForm, Part},
    TestServer,
};
use serde_json::{json, Value};

use postboard_api::{
    config::Config,
    db::MemoryStore,
    middleware::request_id::REQUEST_ID_HEADER,
    routes::{create_router, AppState},
};

fn create_test_server() -> TestServer {
    let upload_dir = std::env::temp_dir().join(format!("postboard-api-{}", uuid::Uuid::new_v4()));
    let config = Config::for_memory("integration-secret", upload_dir.to_string_lossy());
    let state = AppState::new(Arc::new(MemoryStore::new()), &config);
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

/// Registers `username` and returns an access token
async fn register_and_login(server: &TestServer, username: &str) -> String {
    server
        .post("/auth/register")
        .json(&json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "correct horse"
        }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .post("/auth/token")
        .form(&json!({
            "username": username,
            "password": "correct horse"
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    body["access_token"].as_str().unwrap().to_string()
}

async fn create_post(server: &TestServer, token: &str, title: &str) -> i64 {
    let form = MultipartForm::new()
        .add_text("title", title.to_string())
        .add_text("content", format!("Content of {}", title));

    let response = server
        .post("/posts")
        .add_header(AUTHORIZATION, bearer(token))
        .multipart(form)
        .await;
    response.assert_status(StatusCode::CREATED);

    let post: Value = response.json();
    post["id"].as_i64().unwrap()
}

async fn favorite(server: &TestServer, token: &str, post_id: i64) -> axum_test::TestResponse {
    server
        .post(&format!("/posts/{}/favorite", post_id))
        .add_header(AUTHORIZATION, bearer(token))
        .await
}

fn post_ids(response: &axum_test::TestResponse) -> Vec<i64> {
    let posts: Vec<Value> = response.json();
    posts.iter().map(|p| p["id"].as_i64().unwrap()).collect()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server();
    let id = uuid::Uuid::new_v4().to_string();

    let response = server
        .get("/health")
        .add_header(
            axum::http::HeaderName::from_static(REQUEST_ID_HEADER),
            HeaderValue::from_str(&id).unwrap(),
        )
        .await;

    assert_eq!(response.header(REQUEST_ID_HEADER), id.as_str());
}

#[tokio::test]
async fn test_register_login_and_me() {
    let server = create_test_server();
    let token = register_and_login(&server, "alice").await;

    let response = server
        .get("/auth/me")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_ok();

    let me: Value = response.json();
    assert_eq!(me["username"], "alice");
    assert_eq!(me["is_active"], true);
    assert!(me.get("hashed_password").is_none());
}

#[tokio::test]
async fn test_duplicate_registration_is_conflict() {
    let server = create_test_server();
    register_and_login(&server, "alice").await;

    let response = server
        .post("/auth/register")
        .json(&json!({
            "username": "alice",
            "email": "someone-else@example.com",
            "password": "pw"
        }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let server = create_test_server();
    register_and_login(&server, "alice").await;

    let response = server
        .post("/auth/token")
        .form(&json!({ "username": "alice", "password": "wrong" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let server = create_test_server();

    server
        .get("/auth/me")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    server
        .get("/recommendations/for-you")
        .add_header(AUTHORIZATION, bearer("garbage"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_returns_message() {
    let server = create_test_server();
    let response = server.post("/auth/logout").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert!(body["message"].as_str().unwrap().contains("logged out"));
}

#[tokio::test]
async fn test_create_and_get_post() {
    let server = create_test_server();
    let token = register_and_login(&server, "alice").await;
    let post_id = create_post(&server, &token, "First").await;

    let response = server.get(&format!("/posts/{}", post_id)).await;
    response.assert_status_ok();
    let post: Value = response.json();
    assert_eq!(post["title"], "First");
    assert!(post["file_path"].is_null());

    let response = server.get("/posts").await;
    response.assert_status_ok();
    assert_eq!(post_ids(&response), vec![post_id]);

    server
        .get("/posts/999")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_post_with_attachment_is_served() {
    let server = create_test_server();
    let token = register_and_login(&server, "alice").await;

    let form = MultipartForm::new()
        .add_text("title", "With file")
        .add_text("content", "See attached")
        .add_part(
            "file",
            Part::bytes(b"attachment body".to_vec())
                .file_name("notes.txt")
                .mime_type("text/plain"),
        );

    let response = server
        .post("/posts")
        .add_header(AUTHORIZATION, bearer(&token))
        .multipart(form)
        .await;
    response.assert_status(StatusCode::CREATED);

    let post: Value = response.json();
    let file_path = post["file_path"].as_str().unwrap();
    assert!(file_path.starts_with("static/uploads/"));
    assert!(file_path.ends_with(".txt"));

    let served = server.get(&format!("/{}", file_path)).await;
    served.assert_status_ok();
    assert_eq!(served.text(), "attachment body");
}

#[tokio::test]
async fn test_standalone_upload() {
    let server = create_test_server();
    let token = register_and_login(&server, "alice").await;

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"%PDF-1.4".to_vec()).file_name("paper.pdf"),
    );

    let response = server
        .post("/uploads")
        .add_header(AUTHORIZATION, bearer(&token))
        .multipart(form)
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["filename"], "paper.pdf");
    assert!(body["saved_path"].as_str().unwrap().ends_with(".pdf"));
}

#[tokio::test]
async fn test_favorite_lifecycle() {
    let server = create_test_server();
    let token = register_and_login(&server, "alice").await;
    let post_id = create_post(&server, &token, "Likeable").await;

    favorite(&server, &token, post_id)
        .await
        .assert_status(StatusCode::CREATED);
    favorite(&server, &token, post_id)
        .await
        .assert_status(StatusCode::CONFLICT);

    let response = server
        .get(&format!("/posts/{}/favorited", post_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    let body: Value = response.json();
    assert_eq!(body["favorited"], true);

    let response = server
        .get("/users/me/favorites")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    assert_eq!(post_ids(&response), vec![post_id]);

    // Still one favorite after the rejected duplicate
    let response = server.get("/recommendations/popular-posts?limit=1").await;
    assert_eq!(post_ids(&response), vec![post_id]);

    server
        .delete(&format!("/posts/{}/favorite", post_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status_ok();
    server
        .delete(&format!("/posts/{}/favorite", post_id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_favorite_missing_post_is_not_found() {
    let server = create_test_server();
    let token = register_and_login(&server, "alice").await;

    favorite(&server, &token, 12345)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recommendation_flow() {
    let server = create_test_server();
    let u1 = register_and_login(&server, "u1").await;
    let u2 = register_and_login(&server, "u2").await;

    let p1 = create_post(&server, &u1, "P1").await;
    let p2 = create_post(&server, &u1, "P2").await;
    let p3 = create_post(&server, &u1, "P3").await;

    favorite(&server, &u1, p1).await.assert_status(StatusCode::CREATED);
    favorite(&server, &u2, p1).await.assert_status(StatusCode::CREATED);
    favorite(&server, &u2, p2).await.assert_status(StatusCode::CREATED);

    let response = server.get("/recommendations/popular-posts?limit=2").await;
    response.assert_status_ok();
    assert_eq!(post_ids(&response), vec![p1, p2]);

    let response = server
        .get("/recommendations/for-you?limit=2")
        .add_header(AUTHORIZATION, bearer(&u1))
        .await;
    response.assert_status_ok();
    assert_eq!(post_ids(&response), vec![p2, p3]);
}

#[tokio::test]
async fn test_random_posts_capped_by_catalog() {
    let server = create_test_server();
    let token = register_and_login(&server, "alice").await;

    let response = server.get("/recommendations/random-posts").await;
    response.assert_status_ok();
    assert!(post_ids(&response).is_empty());

    let a = create_post(&server, &token, "A").await;
    let b = create_post(&server, &token, "B").await;

    let response = server.get("/recommendations/random-posts?limit=10").await;
    let mut ids = post_ids(&response);
    ids.sort_unstable();
    assert_eq!(ids, vec![a, b]);
}

#[tokio::test]
async fn test_recommendation_limit_is_bounded() {
    let server = create_test_server();

    server
        .get("/recommendations/popular-posts?limit=0")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/recommendations/popular-posts?limit=21")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/recommendations/popular-posts?limit=20")
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_malformed_query_renders_json_error() {
    let server = create_test_server();

    let response = server
        .get("/recommendations/popular-posts?limit=-1")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("query string"));
}

#[tokio::test]
async fn test_malformed_path_renders_json_error() {
    let server = create_test_server();

    let response = server.get("/posts/abc").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_malformed_registration_body_renders_json_error() {
    let server = create_test_server();

    let response = server
        .post("/auth/register")
        .json(&json!({ "username": "alice" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert!(body["error"].is_string());
}
