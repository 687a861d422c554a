use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use pocketgear_auth::{bearer_token, Identity};
use tracing::{debug, warn};

use crate::error::CatalogError;
use crate::http::error::{ApiError, Operation};
use crate::http::AppState;

/// The session behind a request, if any.
///
/// A missing, malformed or refused token is simply no session, and gated
/// routes answer 401 from there. When the token cannot be checked at all
/// (auth server down or answering with an error) the request fails with 500.
#[derive(Debug, Clone)]
pub struct Session(pub Option<Identity>);

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(Session(None));
        };
        let Some(token) = header.to_str().ok().and_then(bearer_token) else {
            debug!("Ignoring Authorization header without a bearer token");
            return Ok(Session(None));
        };
        let Some(verifier) = state.sessions.as_ref() else {
            warn!("Bearer token presented but no session verifier is configured");
            return Ok(Session(None));
        };

        match verifier.verify(token).await {
            Ok(identity) => {
                debug!(user_id = %identity.user_id, "Session resolved");
                Ok(Session(Some(identity)))
            }
            Err(err) if err.is_rejected_token() => {
                warn!(error = %err, "Session token rejected");
                Ok(Session(None))
            }
            Err(err) => Err(ApiError::from_catalog(
                CatalogError::internal(format!("session verification failed: {}", err)),
                Operation::VerifySession,
            )),
        }
    }
}
