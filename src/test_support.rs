//! Router-level helpers shared by handler tests.

use axum::{
    body::{to_bytes, Body},
    extract::FromRef,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::{
    app::build_app,
    auth::{
        jwt::JwtKeys,
        password::hash_password,
        repo_types::{NewUser, Role, User},
    },
    state::AppState,
};

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_state(AppState::fake())
    }

    pub fn with_state(state: AppState) -> Self {
        Self {
            router: build_app(state.clone()),
            state,
        }
    }

    /// Sends one request; non-JSON bodies come back as a JSON string.
    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    /// Registers through the API and returns the issued token.
    pub async fn register(&self, full_name: &str, email: &str) -> String {
        let (status, body) = self
            .call(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({"fullName": full_name, "email": email, "password": "password123"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }

    /// Inserts an admin directly and signs a token for it.
    pub async fn seed_admin(&self, email: &str) -> (User, String) {
        let user = self
            .state
            .users
            .create(NewUser {
                email: email.into(),
                password_hash: hash_password("password123").unwrap(),
                full_name: "Root Admin".into(),
                role: Role::Admin,
            })
            .await
            .unwrap()
            .unwrap();
        let token = JwtKeys::from_ref(&self.state).sign(user.id, Role::Admin).unwrap();
        (user, token)
    }
}
