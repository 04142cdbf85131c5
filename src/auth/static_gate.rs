//! Static-credential gate.
//!
//! One configured username/password pair; on match, a signed HS256 token
//! is issued carrying the username as its only claim. Verification is
//! signature + expiry only.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::{AdminGate, AdminIdentity, AuthError, IssuedToken};

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    username: String,
    exp: i64,
}

pub struct StaticCredentialGate {
    admin_username: String,
    admin_password: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_lifetime: Duration,
}

impl StaticCredentialGate {
    pub fn new(
        admin_username: impl Into<String>,
        admin_password: impl Into<String>,
        secret: &str,
        token_lifetime_days: i64,
    ) -> Self {
        Self {
            admin_username: admin_username.into(),
            admin_password: admin_password.into(),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_lifetime: Duration::days(token_lifetime_days),
        }
    }
}

#[async_trait]
impl AdminGate for StaticCredentialGate {
    async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError> {
        if username != self.admin_username || password != self.admin_password {
            return Err(AuthError::InvalidCredentials);
        }

        let claims = Claims {
            username: username.to_string(),
            exp: (Utc::now() + self.token_lifetime).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| AuthError::Provider(err.to_string()))?;

        Ok(IssuedToken {
            token,
            username: username.to_string(),
        })
    }

    async fn verify(&self, token: &str) -> Result<AdminIdentity, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|_| AuthError::InvalidToken)?;
        Ok(AdminIdentity {
            username: data.claims.username,
        })
    }
}
