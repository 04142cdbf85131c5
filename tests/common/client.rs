//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all gallery-server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

fn text_form(fields: &[(&str, &str)]) -> Form {
    let mut form = Form::new();
    for (name, value) in fields {
        form = form.text(name.to_string(), value.to_string());
    }
    form
}

fn form_with_file(fields: &[(&str, &str)], filename: &str, data: Vec<u8>) -> Form {
    text_form(fields).part("image", Part::bytes(data).file_name(filename.to_string()))
}

impl TestClient {
    /// Creates a new unauthenticated client
    ///
    /// Use this for testing authentication flows.
    /// For admin operations, use `authenticated_admin()` instead.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true) // Automatically handle session cookies
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client pre-authenticated as the admin
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated_admin(base_url: String) -> Self {
        let client = Self::new(base_url);

        let response = client.login(ADMIN_USER, ADMIN_PASS).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::OK,
            "Admin authentication failed: {:?}",
            response.text().await
        );

        client
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    pub async fn login(&self, username: &str, password: &str) -> Response {
        self.client
            .post(format!("{}/api/auth/login", self.base_url))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("login request failed")
    }

    /// Login and return the issued bearer token.
    pub async fn login_token(&self, username: &str, password: &str) -> String {
        let response = self.login(username, password).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: Value = response.json().await.expect("login response not JSON");
        body["token"].as_str().expect("no token in response").to_string()
    }

    pub async fn verify(&self) -> Response {
        self.client
            .get(format!("{}/api/auth/verify", self.base_url))
            .send()
            .await
            .expect("verify request failed")
    }

    pub async fn verify_with_bearer(&self, token: &str) -> Response {
        self.client
            .get(format!("{}/api/auth/verify", self.base_url))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("verify request failed")
    }

    // ========================================================================
    // Public Catalog Endpoints
    // ========================================================================

    pub async fn list_paintings(&self) -> Response {
        self.client
            .get(format!("{}/api/paintings", self.base_url))
            .send()
            .await
            .expect("list request failed")
    }

    /// List and parse the catalog as JSON.
    pub async fn list_paintings_json(&self) -> Vec<Value> {
        let response = self.list_paintings().await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json().await.expect("list response not JSON")
    }

    pub async fn rate_painting(&self, id: i64, rater_id: &str, rating: f64) -> Response {
        self.client
            .post(format!("{}/api/paintings/{}/rate", self.base_url, id))
            .json(&json!({ "rater_id": rater_id, "rating": rating }))
            .send()
            .await
            .expect("rate request failed")
    }

    pub async fn get_image(&self, image_path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, image_path))
            .send()
            .await
            .expect("image request failed")
    }

    // ========================================================================
    // Admin Catalog Endpoints
    // ========================================================================

    pub async fn create_painting(&self, fields: &[(&str, &str)]) -> Response {
        self.client
            .post(format!("{}/api/admin/paintings", self.base_url))
            .multipart(text_form(fields))
            .send()
            .await
            .expect("create request failed")
    }

    pub async fn create_painting_with_file(
        &self,
        fields: &[(&str, &str)],
        filename: &str,
        data: Vec<u8>,
    ) -> Response {
        self.client
            .post(format!("{}/api/admin/paintings", self.base_url))
            .multipart(form_with_file(fields, filename, data))
            .send()
            .await
            .expect("create request failed")
    }

    pub async fn update_painting(&self, id: i64, fields: &[(&str, &str)]) -> Response {
        self.client
            .put(format!("{}/api/admin/paintings/{}", self.base_url, id))
            .multipart(text_form(fields))
            .send()
            .await
            .expect("update request failed")
    }

    pub async fn update_painting_with_file(
        &self,
        id: i64,
        fields: &[(&str, &str)],
        filename: &str,
        data: Vec<u8>,
    ) -> Response {
        self.client
            .put(format!("{}/api/admin/paintings/{}", self.base_url, id))
            .multipart(form_with_file(fields, filename, data))
            .send()
            .await
            .expect("update request failed")
    }

    pub async fn delete_painting(&self, id: i64) -> Response {
        self.client
            .delete(format!("{}/api/admin/paintings/{}", self.base_url, id))
            .send()
            .await
            .expect("delete request failed")
    }

    /// Delete with an explicit bearer token instead of the session cookie.
    pub async fn delete_painting_with_bearer(&self, id: i64, token: &str) -> Response {
        self.client
            .delete(format!("{}/api/admin/paintings/{}", self.base_url, id))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("delete request failed")
    }

    /// Create a painting and return its parsed JSON body.
    ///
    /// # Panics
    ///
    /// Panics unless the server answers 201 Created.
    pub async fn create_painting_json(&self, fields: &[(&str, &str)]) -> Value {
        let response = self.create_painting(fields).await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        response.json().await.expect("create response not JSON")
    }
}
