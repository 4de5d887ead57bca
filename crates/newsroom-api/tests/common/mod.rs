#![allow(dead_code)]

use std::sync::Arc;

use argon2::{Algorithm, Argon2, Params, Version};
use axum::Router;
use chrono::Duration;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use newsroom_api::auth::{AppState, AppStateInner, TokenSettings, create_token};
use newsroom_api::routes;
use newsroom_db::Database;
use newsroom_types::api::TokenKind;

pub const SECRET: &str = "test-secret";

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(|_| {})
    }

    pub fn with(configure: impl FnOnce(&mut AppStateInner)) -> Self {
        let db = Database::open_in_memory().expect("in-memory database");
        let mut inner = AppStateInner::new(db, TokenSettings::new(SECRET));
        // Keep password hashing fast under test
        inner.hasher = Argon2::new(
            Algorithm::Argon2id,
            Version::V0x13,
            Params::new(8, 1, 1, None).expect("argon2 params"),
        );
        configure(&mut inner);

        let state: AppState = Arc::new(inner);
        let router = routes::router(state.clone());
        Self { state, router }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };

        let resp = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request("GET", uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, token, Some(body)).await
    }

    /// Create an account directly in the database and mint an access token.
    pub fn user(&self, username: &str) -> (i64, String) {
        let user = self
            .state
            .db
            .create_user(username, &format!("{username}@example.com"), "unused-hash")
            .unwrap();
        let token =
            create_token(&self.state.tokens, TokenKind::Access, user.id, username).unwrap();
        (user.id, token)
    }

    /// An access token for `user_id` that expired ten minutes ago.
    pub fn expired_token(&self, user_id: i64, username: &str) -> String {
        let settings = TokenSettings {
            access_ttl: Duration::minutes(-10),
            ..TokenSettings::new(SECRET)
        };
        create_token(&settings, TokenKind::Access, user_id, username).unwrap()
    }

    pub async fn category(&self, name: &str, slug: &str) -> Value {
        let (status, body) = self
            .post("/categories/", None, json!({ "name": name, "slug": slug }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    pub async fn article(&self, token: &str, title: &str, category_id: Option<i64>) -> Value {
        let (status, body) = self
            .post(
                "/news/",
                Some(token),
                json!({
                    "title": title,
                    "category_id": category_id,
                    "image": "news_images/cover.jpg",
                    "body": format!("{title} body"),
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}
