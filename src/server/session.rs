use super::state::ServerState;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::json;
use tracing::debug;

/// An authenticated admin session attached to a request.
#[derive(Debug)]
pub struct Session {
    pub username: String,
    pub token: String,
}

pub const COOKIE_SESSION_TOKEN_KEY: &str = "session_token";
pub const HEADER_SESSION_TOKEN_KEY: &str = "Authorization";

pub enum SessionExtractionError {
    Unauthorized,
    InvalidToken,
}

impl IntoResponse for SessionExtractionError {
    fn into_response(self) -> axum::response::Response {
        let message = match self {
            SessionExtractionError::Unauthorized => "Unauthorized",
            SessionExtractionError::InvalidToken => "Invalid or expired token",
        };
        (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
    }
}

async fn extract_session_token_from_cookies(
    parts: &mut Parts,
    ctx: &ServerState,
) -> Option<String> {
    CookieJar::from_request_parts(parts, &ctx)
        .await
        .expect("Could not read cookies into CookieJar.")
        .get(COOKIE_SESSION_TOKEN_KEY)
        .map(Cookie::value)
        .map(|s| s.to_string())
}

fn extract_session_token_from_headers(parts: &mut Parts) -> Option<String> {
    parts
        .headers
        .get(HEADER_SESSION_TOKEN_KEY)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v).to_string())
}

impl FromRequestParts<ServerState> for Session {
    type Rejection = SessionExtractionError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let token = match extract_session_token_from_headers(parts) {
            Some(token) => token,
            None => match extract_session_token_from_cookies(parts, ctx).await {
                Some(token) => token,
                None => {
                    debug!("No token in headers nor cookies.");
                    return Err(SessionExtractionError::Unauthorized);
                }
            },
        };

        match ctx.admin_gate.verify(&token).await {
            Ok(identity) => Ok(Session {
                username: identity.username,
                token,
            }),
            Err(err) => {
                debug!("Token verification failed: {}", err);
                Err(SessionExtractionError::InvalidToken)
            }
        }
    }
}
