//! Admin login, logout and the login page.

use crate::auth::cookie::SetCookie;
use crate::auth::middleware::{check_rate_limit, AppState, ClientId};
use crate::auth::session::{
    issue_admin_token, password_matches, ADMIN_COOKIE, ADMIN_COOKIE_MAX_AGE,
};
use crate::error::AppError;
use crate::middleware::ADMIN_PREFIX;
use crate::models::LoginRequest;
use crate::rate_limit::client_hash;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use serde::Deserialize;
use zeroize::Zeroizing;

/// Rate limit bucket for admin login attempts.
pub const LOGIN_ENDPOINT: &str = "admin-login";

#[derive(Debug, Deserialize)]
pub struct LoginPageQuery {
    pub from: Option<String>,
}

/// POST /api/admin/login — Exchange the admin password for a session cookie
pub async fn login(
    State(state): State<AppState>,
    client: ClientId,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    check_rate_limit(
        &state,
        &client,
        LOGIN_ENDPOINT,
        state.config.rate_limit_login_per_min,
    )?;

    let submitted = Zeroizing::new(req.password);

    let configured = state
        .config
        .admin_password()
        .ok_or_else(|| AppError::BadRequest("Admin login is not enabled".to_string()))?;

    if !password_matches(&submitted, configured) {
        tracing::warn!(action = "admin_login_failed", client_hash = %client_hash(&client.0), "Incorrect admin password");
        return Err(AppError::Unauthorized("Incorrect password".to_string()));
    }

    let cookie = SetCookie::new(
        ADMIN_COOKIE,
        &issue_admin_token(configured),
        ADMIN_COOKIE_MAX_AGE,
    )
    .secure(state.config.secure_cookies);

    tracing::info!(action = "admin_login", client_hash = %client_hash(&client.0), "Admin signed in");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie.to_header_value())],
        Json(serde_json::json!({ "success": true })),
    ))
}

/// POST /api/admin/logout — Drop the admin session cookie
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookie = SetCookie::expire(ADMIN_COOKIE).secure(state.config.secure_cookies);
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, cookie.to_header_value())],
    )
}

/// GET /admin/login — Login form
///
/// The admin gate sends signed-in callers straight to `/admin`.
pub async fn login_page(Query(query): Query<LoginPageQuery>) -> Html<String> {
    let target = safe_return_target(query.from.as_deref());
    Html(format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Book club admin</title></head>
<body>
<form id="login" data-return="{target}">
  <label>Admin password <input type="password" name="password" autofocus required></label>
  <button type="submit">Sign in</button>
  <p id="error" hidden></p>
</form>
<script>
document.getElementById("login").addEventListener("submit", async (event) => {{
  event.preventDefault();
  const form = event.target;
  const res = await fetch("/api/admin/login", {{
    method: "POST",
    headers: {{ "Content-Type": "application/json" }},
    body: JSON.stringify({{ password: form.password.value }}),
  }});
  if (res.ok) {{
    window.location.assign(form.dataset.return);
  }} else {{
    const body = await res.json().catch(() => ({{}}));
    const error = document.getElementById("error");
    error.textContent = body.error || "Sign in failed";
    error.hidden = false;
  }}
}});
</script>
</body>
</html>
"#,
        target = escape_html(&target)
    ))
}

/// Only same-site admin paths are accepted as a post-login destination.
fn safe_return_target(from: Option<&str>) -> String {
    match from {
        Some(from)
            if (from == ADMIN_PREFIX
                || from.starts_with("/admin/")
                || from.starts_with("/admin?"))
                && !from.contains('\\') =>
        {
            from.to_string()
        }
        _ => ADMIN_PREFIX.to_string(),
    }
}

fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
