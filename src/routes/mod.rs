//! HTTP route handlers.

pub mod admin;
pub mod auth;
pub mod rounds;

use crate::auth::middleware::AppState;
use crate::auth::session::Realm;
use crate::error::AppError;
use crate::middleware::{admin_gate, security_headers};
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;

/// Parse the `{realm}/{id}` segments of a round path.
///
/// An unknown realm is a 404, a non-numeric id a 400.
pub fn parse_round_path(realm: &str, id: &str) -> Result<(Realm, u64), AppError> {
    let realm = realm
        .parse::<Realm>()
        .map_err(|_| AppError::NotFound("Round not found".to_string()))?;
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::BadRequest("Invalid round id".to_string()));
    }
    let id = id
        .parse::<u64>()
        .map_err(|_| AppError::BadRequest("Invalid round id".to_string()))?;
    Ok((realm, id))
}

/// Build the router with all pages and API endpoints.
pub fn api_router() -> Router<AppState> {
    Router::new()
        // Admin pages (gated by `admin_gate`)
        .route("/admin", get(admin::dashboard))
        .route("/admin/login", get(auth::login_page))
        // Admin session endpoints
        .route("/api/admin/login", post(auth::login))
        .route("/api/admin/logout", post(auth::logout))
        // Admin round management
        .route("/api/admin/rounds", get(admin::list_rounds))
        .route(
            "/api/admin/rounds/{realm}/{id}",
            put(admin::put_round).delete(admin::delete_round),
        )
        // Round access endpoints
        .route("/api/rounds/{realm}/{id}/access", get(rounds::round_status))
        .route(
            "/api/rounds/{realm}/{id}/verify-password",
            post(rounds::verify_password),
        )
}

/// The full application: routes, admin gate, CORS and response headers.
///
/// The gate wraps every route so it runs before any handler. `CorsLayer::new()`
/// allows no origins, so cross-origin scripts cannot call the API with the
/// visitor's cookies.
pub fn app(state: AppState) -> Router {
    api_router()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            admin_gate,
        ))
        .layer(CorsLayer::new())
        .layer(axum::middleware::from_fn(security_headers))
        .with_state(state)
}
