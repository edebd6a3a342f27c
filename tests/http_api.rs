//! HTTP API Tests
//!
//! Drives the full router through `tower::ServiceExt::oneshot` with
//! in-memory stores: accounts, multipart upload, info and download.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use filegate::access::InMemoryMetadataStore;
use filegate::auth::InMemoryUserRepository;
use filegate::clock::SystemClock;
use filegate::config::Config;
use filegate::file_storage::InMemoryBlobStore;
use filegate::http_server::{AppState, HttpServer, HttpServerConfig};

// -- Helpers --------------------------------------------------------------

const BOUNDARY: &str = "filegate-test-boundary";

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a [u8]),
}

fn build_app_with(config: Config) -> Router {
    let state = AppState::new(
        &config,
        Arc::new(SystemClock),
        Arc::new(InMemoryMetadataStore::new()),
        Arc::new(InMemoryBlobStore::new()),
        Arc::new(InMemoryUserRepository::new()),
    );
    HttpServer::build_router(&HttpServerConfig::default(), Arc::new(state))
}

fn build_app() -> Router {
    let mut config = Config::default();
    config.jwt.secret = "http-api-tests".to_string();
    build_app_with(config)
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(file_name, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
                         Content-Type: text/plain\r\n\r\n",
                        file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(parts: &[Part<'_>], credential: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/files/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(token) = credential {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(multipart_body(parts))).unwrap()
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn sign_in(app: &Router, name: &str) -> String {
    let (status, _) = send_json(
        app,
        json_request(
            "/api/auth/register",
            json!({
                "username": name,
                "email": format!("{}@example.com", name),
                "password": "correct horse battery",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_json(
        app,
        json_request(
            "/api/auth/login",
            json!({
                "email": format!("{}@example.com", name),
                "password": "correct horse battery",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokenType"], "Bearer");
    body["accessToken"].as_str().unwrap().to_string()
}

fn get(uri: &str) -> axum::http::request::Builder {
    Request::builder().method("GET").uri(uri)
}

// -- Tests ----------------------------------------------------------------

#[tokio::test]
async fn health_returns_200() {
    let app = build_app();
    let (status, body) = send_json(&app, get("/health").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = build_app();
    sign_in(&app, "dup").await;

    let (status, body) = send_json(
        &app,
        json_request(
            "/api/auth/register",
            json!({"username": "other", "email": "dup@example.com", "password": "long enough pw"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "EMAIL_EXISTS");
}

#[tokio::test]
async fn bad_login_is_401() {
    let app = build_app();
    sign_in(&app, "login").await;

    let (status, body) = send_json(
        &app,
        json_request(
            "/api/auth/login",
            json!({"email": "login@example.com", "password": "wrong password"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_LOGIN");
}

#[tokio::test]
async fn upload_without_file_part_is_400() {
    let app = build_app();
    let (status, body) = send_json(&app, upload_request(&[Part::Text("password", "123456")], None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_FILE");
}

#[tokio::test]
async fn upload_with_short_password_is_400() {
    let app = build_app();
    let parts = [Part::File("a.txt", b"hello"), Part::Text("password", "12345")];
    let (status, body) = send_json(&app, upload_request(&parts, None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "WEAK_PASSWORD");
}

#[tokio::test]
async fn upload_with_reversed_window_is_400() {
    let app = build_app();
    let parts = [
        Part::File("a.txt", b"hello"),
        Part::Text("availableFrom", "2031-01-02T00:00:00Z"),
        Part::Text("availableTo", "2031-01-01T00:00:00Z"),
    ];
    let (status, body) = send_json(&app, upload_request(&parts, None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_DATE_RANGE");
}

#[tokio::test]
async fn private_password_upload_without_credential_is_401() {
    let app = build_app();
    let parts = [
        Part::File("a.txt", b"hello"),
        Part::Text("password", "123456"),
        Part::Text("isPublic", "false"),
    ];
    let (status, body) = send_json(&app, upload_request(&parts, None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "MISSING_CREDENTIAL");
}

#[tokio::test]
async fn malformed_form_values_are_400() {
    let app = build_app();

    let parts = [Part::File("a.txt", b"hello"), Part::Text("isPublic", "maybe")];
    let (status, body) = send_json(&app, upload_request(&parts, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let parts = [Part::File("a.txt", b"hello"), Part::Text("availableTo", "next week")];
    let (status, _) = send_json(&app, upload_request(&parts, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn whitespace_password_is_kept_as_sent() {
    let app = build_app();

    let parts = [Part::File("s.txt", b"secret"), Part::Text("password", "   ")];
    let (status, body) = send_json(&app, upload_request(&parts, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "WEAK_PASSWORD");

    let parts = [Part::File("s.txt", b"secret"), Part::Text("password", "      ")];
    let (status, info) = send_json(&app, upload_request(&parts, None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(info["hasPassword"], true);
    let id = info["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        get(&format!("/api/files/{}/download", id))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        get(&format!(
            "/api/files/{}/download?password=%20%20%20%20%20%20",
            id
        ))
        .body(Body::empty())
        .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"secret");
}

#[tokio::test]
async fn padded_password_is_not_trimmed() {
    let app = build_app();
    let parts = [Part::File("p.txt", b"padded"), Part::Text("password", " 123456 ")];
    let (status, info) = send_json(&app, upload_request(&parts, None)).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = info["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        get(&format!("/api/files/{}/download?password=123456", id))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        get(&format!("/api/files/{}/download?password=%20123456%20", id))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn blank_optional_fields_are_absent() {
    let app = build_app();
    let parts = [
        Part::File("b.txt", b"blank fields"),
        Part::Text("password", ""),
        Part::Text("isPublic", ""),
        Part::Text("availableFrom", ""),
        Part::Text("availableTo", "  "),
    ];
    let (status, info) = send_json(&app, upload_request(&parts, None)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(info["isPublic"], true);
    assert_eq!(info["hasPassword"], false);
    assert!(info["availableFrom"].is_null());
    assert!(info["availableTo"].is_null());
}

#[tokio::test]
async fn owner_id_is_shown_only_to_the_owner() {
    let app = build_app();
    let token = sign_in(&app, "uploader").await;

    let parts = [Part::File("pub.txt", b"everyone")];
    let (status, info) = send_json(&app, upload_request(&parts, Some(&token))).await;
    assert_eq!(status, StatusCode::CREATED);
    let owner_id = info["ownerId"].as_str().unwrap().to_string();
    let id = info["id"].as_str().unwrap().to_string();

    let (status, anonymous) = send_json(
        &app,
        get(&format!("/api/files/{}", id)).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(anonymous.get("ownerId").is_none());

    let other = sign_in(&app, "onlooker").await;
    let (status, stranger) = send_json(
        &app,
        get(&format!("/api/files/{}", id))
            .header(header::AUTHORIZATION, format!("Bearer {}", other))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(stranger.get("ownerId").is_none());

    let (status, own) = send_json(
        &app,
        get(&format!("/api/files/{}", id))
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(own["ownerId"], owner_id.as_str());
}

#[tokio::test]
async fn garbage_credential_is_401() {
    let app = build_app();
    let parts = [Part::File("a.txt", b"hello")];
    let (status, body) = send_json(&app, upload_request(&parts, Some("not-a-jwt"))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIAL");
}

#[tokio::test]
async fn oversized_upload_is_413() {
    let mut config = Config::default();
    config.jwt.secret = "http-api-tests".to_string();
    config.upload.max_request_bytes = 1024;
    let app = build_app_with(config);

    let big = vec![b'x'; 8 * 1024];
    let (status, _) = send(&app, upload_request(&[Part::File("big.bin", &big)], None)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn public_upload_then_anonymous_download() {
    let app = build_app();
    let parts = [Part::File("notes.txt", b"public notes")];
    let (status, info) = send_json(&app, upload_request(&parts, None)).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(info["fileName"], "notes.txt");
    assert_eq!(info["isPublic"], true);
    assert_eq!(info["hasPassword"], false);
    assert_eq!(info["size"], 12);
    assert!(info.get("passwordHash").is_none());

    let id = info["id"].as_str().unwrap();
    let response = app
        .clone()
        .oneshot(
            get(&format!("/api/files/{}/download", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"public notes");
}

#[tokio::test]
async fn password_protected_download() {
    let app = build_app();
    let parts = [Part::File("s.txt", b"secret"), Part::Text("password", "123456")];
    let (status, info) = send_json(&app, upload_request(&parts, None)).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = info["id"].as_str().unwrap().to_string();

    let (status, body) = send_json(
        &app,
        get(&format!("/api/files/{}/download", id))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "INSUFFICIENT_PROOF");

    let (status, _) = send(
        &app,
        get(&format!("/api/files/{}/download", id))
            .header("X-File-Password", "wrong1")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        get(&format!("/api/files/{}/download?password=123456", id))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"secret");
}

#[tokio::test]
async fn unknown_and_malformed_ids_are_404() {
    let app = build_app();

    for uri in [
        "/api/files/7f1c1f3e-2b7d-4c53-9a55-0b0f3c8e5a10".to_string(),
        "/api/files/not-a-uuid/download".to_string(),
    ] {
        let (status, body) = send_json(&app, get(&uri).body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}

#[tokio::test]
async fn register_login_upload_private_and_retrieve() {
    let app = build_app();
    let token = sign_in(&app, "owner").await;

    let parts = [
        Part::File("private.txt", b"for my eyes"),
        Part::Text("password", "123456"),
        Part::Text("isPublic", "false"),
    ];
    let (status, info) = send_json(&app, upload_request(&parts, Some(&token))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(info["isPublic"], false);
    assert!(info["ownerId"].is_string());
    let id = info["id"].as_str().unwrap().to_string();

    // Owner reads info and payload with the credential alone
    let (status, fetched) = send_json(
        &app,
        get(&format!("/api/files/{}", id))
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], info["id"]);

    let (status, body) = send(
        &app,
        get(&format!("/api/files/{}/download", id))
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"for my eyes");

    // Anyone else needs the password, no credential required
    let (status, _) = send(
        &app,
        get(&format!("/api/files/{}/download", id))
            .header("X-File-Password", "123456")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // A different account is still a stranger
    let other = sign_in(&app, "someone").await;
    let (status, _) = send(
        &app,
        get(&format!("/api/files/{}", id))
            .header(header::AUTHORIZATION, format!("Bearer {}", other))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
