//! Axum extractors for authentication and rate limiting.

use crate::auth::session::{require_admin, Realm, RoundVerifier};
use crate::config::Config;
use crate::error::AppError;
use crate::rate_limit::{client_hash, client_identifier, RateLimitDecision, RateLimiter};
use crate::storage::RoundStore;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;
use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub rate_limiter: Arc<RateLimiter>,
    pub rounds: RoundStore,
    pub votes: RoundVerifier,
    pub suggestions: RoundVerifier,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            rate_limiter: Arc::new(RateLimiter::new(config.rate_limit_prune_threshold)),
            rounds: RoundStore::new(),
            votes: RoundVerifier::new(Realm::Vote, config.vote_secret.value.clone()),
            suggestions: RoundVerifier::new(
                Realm::Suggestion,
                config.suggestion_secret.value.clone(),
            ),
            config: Arc::new(config),
        }
    }

    pub fn verifier(&self, realm: Realm) -> &RoundVerifier {
        match realm {
            Realm::Vote => &self.votes,
            Realm::Suggestion => &self.suggestions,
        }
    }
}

/// Admin-only extractor for API handlers.
///
/// Passes every request when no admin password is configured.
/// Returns 401 Unauthorized if the admin cookie is missing or invalid.
pub struct AdminSession;

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_admin(&parts.headers, state.config.admin_password()).inspect_err(
            |_| {
                tracing::warn!(
                    action = "admin_rejected",
                    path = %parts.uri.path(),
                    "Admin API request without a valid session"
                );
            },
        )?;
        Ok(AdminSession)
    }
}

/// Rate limiting identity of the caller (see [`client_identifier`]).
pub struct ClientId(pub String);

impl<S> FromRequestParts<S> for ClientId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientId(client_identifier(&parts.headers)))
    }
}

/// Count a request against `endpoint`'s per-minute budget.
///
/// # Returns
/// * `Ok(())` if under limit
/// * `Err(AppError::RateLimited)` with the seconds left in the window
pub fn check_rate_limit(
    state: &AppState,
    client: &ClientId,
    endpoint: &str,
    max_per_minute: u32,
) -> Result<(), AppError> {
    let decision = state.rate_limiter.check(&client.0, endpoint, max_per_minute);
    match decision {
        RateLimitDecision::Allowed => Ok(()),
        RateLimitDecision::Rejected { .. } => {
            let retry_after_secs = decision.retry_after_secs().unwrap_or(1);
            tracing::warn!(
                action = "rate_limited",
                endpoint = %endpoint,
                client_hash = %client_hash(&client.0),
                retry_after_secs,
                "Rate limit exceeded"
            );
            Err(AppError::RateLimited { retry_after_secs })
        }
    }
}
