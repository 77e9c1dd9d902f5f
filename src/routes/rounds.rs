//! Public round access endpoints.

use crate::auth::cookie::SetCookie;
use crate::auth::middleware::{check_rate_limit, AppState, ClientId};
use crate::auth::session::{password_matches, ROUND_COOKIE_MAX_AGE};
use crate::error::AppError;
use crate::models::{RoundStatusResponse, VerifyPasswordRequest};
use crate::rate_limit::client_hash;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::time::{SystemTime, UNIX_EPOCH};
use zeroize::Zeroizing;

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// GET /api/rounds/{realm}/{id}/access — Whether the caller must enter a password
///
/// Rounds without access settings are open and need no password.
pub async fn round_status(
    State(state): State<AppState>,
    Path((realm, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let (realm, id) = super::parse_round_path(&realm, &id)?;
    let access = state.rounds.get(realm, id).unwrap_or_default();

    let has_access =
        access.password().is_none() || state.verifier(realm).verify_headers(id, &headers);

    Ok(Json(RoundStatusResponse {
        round_id: id,
        requires_password: !has_access,
        has_access,
        is_open: access.is_open(now_unix()),
    }))
}

/// POST /api/rounds/{realm}/{id}/verify-password — Unlock a round
///
/// On success sets the realm's access cookie, bound to this round only.
pub async fn verify_password(
    State(state): State<AppState>,
    client: ClientId,
    Path((realm, id)): Path<(String, String)>,
    Json(req): Json<VerifyPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (realm, id) = super::parse_round_path(&realm, &id)?;

    check_rate_limit(
        &state,
        &client,
        &format!("{}-verify", realm),
        state.config.rate_limit_verify_per_min,
    )?;

    let submitted = Zeroizing::new(req.password);
    let access = state.rounds.get(realm, id).unwrap_or_default();

    if !access.is_open(now_unix()) {
        return Err(AppError::Forbidden("Round is closed".to_string()));
    }

    if let Some(expected) = access.password() {
        if !password_matches(&submitted, expected) {
            tracing::warn!(
                action = "round_password_failed",
                realm = %realm,
                round_id = id,
                client_hash = %client_hash(&client.0),
                "Incorrect round password"
            );
            return Err(AppError::Unauthorized("Incorrect password".to_string()));
        }
    }

    let verifier = state.verifier(realm);
    let cookie = SetCookie::new(
        realm.cookie_name(),
        &verifier.issue_token(id),
        ROUND_COOKIE_MAX_AGE,
    );

    tracing::info!(action = "round_unlocked", realm = %realm, round_id = id, "Round access granted");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie.to_header_value())],
        Json(serde_json::json!({ "success": true })),
    ))
}
