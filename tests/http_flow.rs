// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! End-to-end scenarios through the full router: signup, login, upload and
//! artifact download, with the session cookie carried between requests.

use std::io::Cursor;
use std::path::Path;

use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        Request, Response, StatusCode,
    },
    Router,
};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use tower::ServiceExt;

use imagecraft_server::{
    api::router, auth::SessionKey, config::AppConfig, state::AppState, storage::PasswordHasher,
};

const BOUNDARY: &str = "imagecraft-test-boundary";

struct TestApp {
    app: Router,
    state: AppState,
    _temp: tempfile::TempDir,
}

impl TestApp {
    fn new() -> Self {
        let temp = tempfile::tempdir().unwrap();
        let state = AppState::with_hasher(
            AppConfig::for_data_dir(temp.path()),
            SessionKey::from_secret(b"integration-test-secret").unwrap(),
            PasswordHasher::with_iterations(1_000),
        )
        .unwrap();
        Self {
            app: router(state.clone()),
            state,
            _temp: temp,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }

    async fn post_edit(
        &self,
        filename: &str,
        bytes: &[u8],
        operation: &str,
        cookie: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/edit")
            .header(
                CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let body = multipart_body(filename, bytes, operation);
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// Sign up and log in `alice`, returning her session cookie.
    async fn login_alice(&self) -> String {
        let response = self
            .post_form("/signup", "username=alice&email=a%40x.com&password=p1", None)
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = self
            .post_form("/login", "email=a%40x.com&password=p1", None)
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/");
        session_cookie(&response).expect("login sets a session cookie")
    }
}

fn multipart_body(filename: &str, bytes: &[u8], operation: &str) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"operation\"\r\n\r\n{operation}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 10, 10])));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

/// `name=value` part of the session `Set-Cookie` header, if any.
fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("imagecraft_session="))
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}

#[tokio::test]
async fn signup_login_and_resize_produces_artifact() {
    let app = TestApp::new();
    let cookie = app.login_alice().await;

    let response = app
        .post_edit("cat.png", &png_bytes(10, 20), "cresized", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/");
    let cookie = session_cookie(&response).expect("edit flashes a link");

    let artifact = app.state.config.paths.output_dir().join("cat_resized.png");
    let image = image::open(&artifact).unwrap();
    assert_eq!(image.dimensions(), (300, 300));

    let home = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(home.contains("Your image has been processed and is available"));
    assert!(home.contains("href=\"/static/cat_resized.png\""));

    let download = app.get("/static/cat_resized.png", None).await;
    assert_eq!(download.status(), StatusCode::OK);
    assert_eq!(download.headers()[CONTENT_TYPE], "image/png");
}

#[tokio::test]
async fn duplicate_signup_creates_no_second_account() {
    let app = TestApp::new();
    app.login_alice().await;

    let response = app
        .post_form("/signup", "username=alice2&email=A%40X.com&password=p2", None)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/login");
    let cookie = session_cookie(&response).unwrap();

    assert_eq!(app.state.accounts.count().unwrap(), 1);
    let page = body_text(app.get("/login", Some(&cookie)).await).await;
    assert!(page.contains("Email already exists. Please log in."));
}

#[tokio::test]
async fn wrong_password_rerenders_login_without_session() {
    let app = TestApp::new();
    app.login_alice().await;

    let response = app
        .post_form("/login", "email=a%40x.com&password=nope", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_cookie(&response).is_none());
    assert!(body_text(response)
        .await
        .contains("Invalid credentials. Please try again."));
}

#[tokio::test]
async fn tampered_cookie_is_anonymous() {
    let app = TestApp::new();
    let cookie = app.login_alice().await;
    let tampered = format!("{cookie}x");

    let response = app
        .post_edit("cat.png", &png_bytes(4, 4), "cgray", Some(&tampered))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/login");
}

#[tokio::test]
async fn edit_requires_login() {
    let app = TestApp::new();

    let response = app.post_edit("cat.png", &png_bytes(4, 4), "cgray", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/login");
    let cookie = session_cookie(&response).unwrap();

    let page = body_text(app.get("/login", Some(&cookie)).await).await;
    assert!(page.contains("You must sign up or log in first!"));
    assert_eq!(file_count(app.state.config.paths.uploads_dir()), 0);
    assert_eq!(file_count(app.state.config.paths.output_dir()), 0);

    let response = app.get("/edit", None).await;
    assert_eq!(response.headers()[LOCATION], "/login");
}

#[tokio::test]
async fn disallowed_extension_writes_nothing() {
    let app = TestApp::new();
    let cookie = app.login_alice().await;

    let response = app
        .post_edit("notes.txt", b"hello", "cgray", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[LOCATION], "/");
    let cookie = session_cookie(&response).unwrap();

    assert_eq!(file_count(app.state.config.paths.uploads_dir()), 0);
    assert_eq!(file_count(app.state.config.paths.output_dir()), 0);
    let home = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(home.contains("File type not allowed"));
}

#[tokio::test]
async fn invalid_operation_is_rejected_before_staging() {
    let app = TestApp::new();
    let cookie = app.login_alice().await;

    let response = app
        .post_edit("cat.png", &png_bytes(4, 4), "csvg", Some(&cookie))
        .await;
    let cookie = session_cookie(&response).unwrap();

    assert_eq!(file_count(app.state.config.paths.uploads_dir()), 0);
    assert_eq!(file_count(app.state.config.paths.output_dir()), 0);
    let home = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(home.contains("Invalid operation!"));
}

#[tokio::test]
async fn undecodable_upload_flashes_load_error() {
    let app = TestApp::new();
    let cookie = app.login_alice().await;

    let response = app
        .post_edit("broken.png", b"not an image", "cgray", Some(&cookie))
        .await;
    let cookie = session_cookie(&response).unwrap();

    assert_eq!(file_count(app.state.config.paths.output_dir()), 0);
    let home = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(home.contains("Error loading image!"));
}

#[tokio::test]
async fn logout_clears_session() {
    let app = TestApp::new();
    let cookie = app.login_alice().await;

    let response = app.get("/logout", Some(&cookie)).await;
    assert_eq!(response.headers()[LOCATION], "/");
    let cookie = session_cookie(&response).unwrap();

    let home = body_text(app.get("/", Some(&cookie)).await).await;
    assert!(home.contains("Logged out successfully."));
    assert!(!home.contains("Signed in as"));
}

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::new();

    let response = app.get("/health/ready", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["checks"]["accounts"], "ok");
}
