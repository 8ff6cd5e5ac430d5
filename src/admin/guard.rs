use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use tracing::{error, warn};

use crate::state::AppState;

/// Well-known key holding the admin session token. Kept under the name the
/// original site used for its admin flag.
pub const ADMIN_SESSION_KEY: &str = "isAdminLoggedIn";

/// Admits a request only while the presented bearer token matches the one on
/// record. A presence check, not a signed-token scheme.
#[derive(Debug)]
pub struct AdminSession;

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Missing Authorization header".to_string(),
            ))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or((StatusCode::UNAUTHORIZED, "Invalid auth scheme".to_string()))?;

        let stored = state.storage.read(ADMIN_SESSION_KEY).await.map_err(|e| {
            error!(error = %e, "read admin session failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Storage unavailable".to_string(),
            )
        })?;

        match stored {
            Some(current) if current == token => Ok(AdminSession),
            _ => {
                warn!("admin token rejected");
                Err((
                    StatusCode::UNAUTHORIZED,
                    "Admin session required".to_string(),
                ))
            }
        }
    }
}
