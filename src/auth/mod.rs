//! Authentication and authorization.
//!
//! The gallery recognizes exactly one administrative identity. Two
//! interchangeable gate strategies exist: a static-credential gate issuing
//! signed bearer tokens locally, and a delegated gate that forwards the
//! whole exchange to an external identity provider.

mod delegated_gate;
mod static_gate;

pub use delegated_gate::DelegatedGate;
pub use static_gate::StaticCredentialGate;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username and password required")]
    MissingCredentials,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Auth provider error: {0}")]
    Provider(String),
}

/// The admin identity carried by a validated bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct AdminIdentity {
    pub username: String,
}

/// Issued bearer credential plus the identity it belongs to.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub username: String,
}

/// Gate in front of mutating catalog operations.
///
/// `login` checks credentials and issues a bearer token; `verify` validates
/// a presented token. There is no revocation: a token stays valid until it
/// expires.
#[async_trait]
pub trait AdminGate: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AuthError>;

    async fn verify(&self, token: &str) -> Result<AdminIdentity, AuthError>;
}
