//! Shared-secret authentication.
//!
//! A single token gates every route. Callers present it as
//! `Authentication: <token>`, or as `Authorization: Bearer <token>`.
//! Tokens are compared as SHA-256 digests so the comparison time does not
//! depend on where the first mismatching byte is or on the token length.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use sha2::{Digest, Sha256};
use tessera_core::{ErrorBody, ErrorSlug, RequestError};
use tracing::warn;

/// Header carrying the shared secret.
pub const AUTHENTICATION_HEADER: &str = "authentication";

pub struct SharedSecret {
    digest: [u8; 32],
}

impl SharedSecret {
    pub fn new(token: &str) -> Self {
        Self {
            digest: Sha256::digest(token.as_bytes()).into(),
        }
    }

    pub fn verify(&self, presented: &str) -> bool {
        let presented: [u8; 32] = Sha256::digest(presented.as_bytes()).into();
        self.digest
            .iter()
            .zip(presented.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

/// The token the caller presented, if any.
fn presented_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(value) = headers.get(AUTHENTICATION_HEADER) {
        return value.to_str().ok();
    }
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("Bearer: "))?;
    Some(token.trim())
}

/// Middleware rejecting requests without the shared secret.
pub async fn require_secret(
    State(secret): State<Arc<SharedSecret>>,
    request: Request,
    next: Next,
) -> Response {
    let (authorized, credential_present) = match presented_token(request.headers()) {
        Some(token) => (secret.verify(token), true),
        None => (false, false),
    };
    if authorized {
        return next.run(request).await;
    }

    warn!(
        method = %request.method(),
        uri = %request.uri(),
        credential_present,
        "request rejected by shared-secret check"
    );
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorBody::single(RequestError::at_header(
            ErrorSlug::AccessDenied,
            "Authentication",
        ))),
    )
        .into_response()
}
