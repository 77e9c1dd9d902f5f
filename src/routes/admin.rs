//! Admin pages and round access management (all behind the admin gate).

use crate::auth::middleware::{AdminSession, AppState};
use crate::auth::session::Realm;
use crate::error::AppError;
use crate::models::{RoundAccess, RoundAccessRequest, RoundInfo};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};

/// GET /admin — Admin landing page
pub async fn dashboard(State(state): State<AppState>) -> Html<String> {
    let votes = state.rounds.list(Realm::Vote).len();
    let suggestions = state.rounds.list(Realm::Suggestion).len();
    Html(format!(
        "<!doctype html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>Book club admin</title></head><body>\
         <h1>Book club admin</h1>\
         <p>{} vote rounds and {} suggestion rounds have access settings.</p>\
         </body></html>\n",
        votes, suggestions
    ))
}

/// GET /api/admin/rounds — List rounds with access settings
pub async fn list_rounds(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let rounds: Vec<RoundInfo> = [Realm::Vote, Realm::Suggestion]
        .into_iter()
        .flat_map(|realm| {
            state
                .rounds
                .list(realm)
                .into_iter()
                .map(move |(round_id, access)| RoundInfo {
                    realm: realm.as_str().to_string(),
                    round_id,
                    has_password: access.password().is_some(),
                    closes_at: access.closes_at,
                })
        })
        .collect();

    Ok(Json(rounds))
}

/// PUT /api/admin/rounds/{realm}/{id} — Set a round's password and closing time
pub async fn put_round(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path((realm, id)): Path<(String, String)>,
    Json(req): Json<RoundAccessRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (realm, id) = super::parse_round_path(&realm, &id)?;

    let access = RoundAccess {
        password: req.password.filter(|p| !p.is_empty()),
        closes_at: req.closes_at,
    };
    let has_password = access.password.is_some();
    let replaced = state.rounds.upsert(realm, id, access);

    tracing::info!(
        action = "round_access_updated",
        realm = %realm,
        round_id = id,
        has_password,
        replaced,
        "Admin updated round access"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/admin/rounds/{realm}/{id} — Remove a round's access settings
pub async fn delete_round(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path((realm, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let (realm, id) = super::parse_round_path(&realm, &id)?;

    if !state.rounds.remove(realm, id) {
        return Err(AppError::NotFound("Round not found".to_string()));
    }

    tracing::info!(action = "round_access_removed", realm = %realm, round_id = id, "Admin removed round access");

    Ok(StatusCode::NO_CONTENT)
}
