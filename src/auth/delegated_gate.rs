//! Delegated authentication gate.
//!
//! Login and token verification are forwarded to an external identity
//! provider over HTTP; this gate only relays the provider's session token
//! and user identity. The provider is expected to expose a password-grant
//! token endpoint and a bearer-authenticated user-info endpoint.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use super::{AdminGate, AdminIdentity, AuthError, IssuedToken};

#[derive(Debug, Deserialize)]
struct ProviderSession {
    access_token: String,
    #[serde(default)]
    user: Option<ProviderUser>,
}

#[derive(Debug, Deserialize)]
struct ProviderUser {
    #[serde(default)]
    email: Option<String>,
}

pub struct DelegatedGate {
    client: reqwest::Client,
    provider_url: String,
    api_key: Option<String>,
}

impl DelegatedGate {
    pub fn new(provider_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            provider_url: provider_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn with_api_key(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("apikey", key),
            None => request,
        }
    }
}

#[async_trait]
impl AdminGate for DelegatedGate {
    async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError> {
        let url = format!("{}/token?grant_type=password", self.provider_url);
        let response = self
            .with_api_key(self.client.post(&url))
            .json(&serde_json::json!({ "email": username, "password": password }))
            .send()
            .await
            .map_err(|err| AuthError::Provider(err.to_string()))?;

        if response.status().is_client_error() {
            debug!("Provider rejected login for {}", username);
            return Err(AuthError::InvalidCredentials);
        }
        if !response.status().is_success() {
            return Err(AuthError::Provider(format!(
                "Unexpected provider status {}",
                response.status()
            )));
        }

        let session: ProviderSession = response
            .json()
            .await
            .map_err(|err| AuthError::Provider(err.to_string()))?;

        let username = session
            .user
            .and_then(|u| u.email)
            .unwrap_or_else(|| username.to_string());

        Ok(IssuedToken {
            token: session.access_token,
            username,
        })
    }

    async fn verify(&self, token: &str) -> Result<AdminIdentity, AuthError> {
        let url = format!("{}/user", self.provider_url);
        let response = self
            .with_api_key(self.client.get(&url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|err| AuthError::Provider(err.to_string()))?;

        match response.status() {
            StatusCode::OK => {}
            status if status.is_client_error() => return Err(AuthError::InvalidToken),
            status => {
                return Err(AuthError::Provider(format!(
                    "Unexpected provider status {}",
                    status
                )))
            }
        }

        let user: ProviderUser = response
            .json()
            .await
            .map_err(|err| AuthError::Provider(err.to_string()))?;
        let username = user.email.ok_or(AuthError::InvalidToken)?;

        Ok(AdminIdentity { username })
    }
}
