// In-process router harness over the in-memory store

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::config::AppConfig;
use crate::database::Store;
use crate::state::AppState;

pub struct TestContext {
    router: Router,
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestContext {
    /// Fresh router with an empty in-memory store and the testing profile
    pub fn new() -> Self {
        let state = AppState::new(Store::memory(), AppConfig::testing());
        Self {
            router: crate::app(state),
        }
    }

    /// Send one request; an empty body decodes as `Value::Null`
    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid test request");

        let response = self.router.clone().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("readable body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("JSON response body")
        };

        TestResponse { status, headers, body }
    }

    /// Register `username`/`password` and return the created user
    pub async fn register(&self, username: &str, password: &str) -> Value {
        let res = self
            .request(
                Method::POST,
                "/api/users",
                None,
                Some(json!({"username": username, "password": password})),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "register {}: {:?}", username, res.body);
        res.body
    }

    /// Log in and return the bearer token
    pub async fn login(&self, username: &str, password: &str) -> String {
        let res = self
            .request(
                Method::POST,
                "/api/login",
                None,
                Some(json!({"username": username, "password": password})),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "login {}: {:?}", username, res.body);
        res.body["authToken"].as_str().expect("authToken").to_string()
    }

    /// Register and log in with a default password
    pub async fn signed_up(&self, username: &str) -> String {
        self.register(username, "password1").await;
        self.login(username, "password1").await
    }
}
