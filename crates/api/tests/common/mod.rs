//! Shared helpers for API integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use khata_api::{AppState, create_router};
use khata_db::MemoryDocumentStore;
use khata_shared::{JwtConfig, JwtService, OwnerKey};

pub const TEST_SECRET: &str = "test-secret-for-api-integration";

pub struct TestApp {
    pub router: Router,
    pub jwt: Arc<JwtService>,
}

impl TestApp {
    pub fn new() -> Self {
        let jwt = Arc::new(JwtService::new(JwtConfig {
            secret: TEST_SECRET.to_string(),
            access_token_expires_secs: 3600,
        }));
        let state = AppState {
            store: Arc::new(MemoryDocumentStore::new()),
            jwt_service: Arc::clone(&jwt),
        };
        Self {
            router: create_router(state),
            jwt,
        }
    }

    pub fn token_for(&self, email: &str) -> String {
        let owner = OwnerKey::parse(email).unwrap();
        self.jwt.generate_access_token(&owner).unwrap()
    }

    pub async fn send(
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
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}
