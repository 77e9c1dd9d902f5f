//! Request gate for the admin area and response hardening headers.

use crate::auth::cookie::cookie_from_headers;
use crate::auth::middleware::AppState;
use crate::auth::session::{verify_admin_token, ADMIN_COOKIE};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Prefix of every gated page.
pub const ADMIN_PREFIX: &str = "/admin";

/// Login entry point; reachable without a session.
pub const LOGIN_PATH: &str = "/admin/login";

/// Characters escaped in the `from` query parameter. Slashes stay readable.
const RETURN_TARGET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

fn is_protected(path: &str) -> bool {
    path == ADMIN_PREFIX
        || path
            .strip_prefix(ADMIN_PREFIX)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn is_login(path: &str) -> bool {
    path == LOGIN_PATH || path == "/admin/login/"
}

/// Redirect target for an unauthenticated request to `path_and_query`.
pub fn login_redirect_target(path_and_query: &str) -> String {
    format!(
        "{}?from={}",
        LOGIN_PATH,
        utf8_percent_encode(path_and_query, RETURN_TARGET)
    )
}

/// Gate every request under `/admin` on a valid admin session cookie.
///
/// 1. Paths outside `/admin` pass through.
/// 2. Without a configured admin password everything passes through.
/// 3. The login page passes through, unless the caller is already signed in,
///    in which case they are sent to `/admin`.
/// 4. Anything else without a valid session is redirected to the login page
///    with the original path in `from`.
///
/// # Usage
///
/// ```rust,no_run
/// use axum::{middleware, Router};
/// use bookclub::{auth::AppState, config::Config, middleware::admin_gate};
///
/// let state = AppState::new(Config::from_env().unwrap());
/// let app: Router = Router::new()
///     .layer(middleware::from_fn_with_state(state.clone(), admin_gate))
///     .with_state(state);
/// ```
pub async fn admin_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if !is_protected(path) {
        return next.run(request).await;
    }

    let Some(password) = state.config.admin_password() else {
        return next.run(request).await;
    };

    let token = cookie_from_headers(request.headers(), ADMIN_COOKIE).unwrap_or_default();
    let authenticated = verify_admin_token(&token, password);

    if is_login(path) {
        if authenticated {
            return Redirect::to(ADMIN_PREFIX).into_response();
        }
        return next.run(request).await;
    }

    if !authenticated {
        let from = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or(path);
        tracing::info!(action = "admin_redirect", path = %path, "Redirecting to admin login");
        return Redirect::to(&login_redirect_target(from)).into_response();
    }

    next.run(request).await
}

/// Middleware that adds security headers to all responses.
///
/// - **X-Content-Type-Options: nosniff** and **X-Frame-Options: DENY** on
///   every response.
/// - **Referrer-Policy: same-origin** so `from` targets and round ids in
///   URLs are not sent to third-party sites.
/// - **Cache-Control: no-store** on any response that sets a cookie, so
///   shared caches never store an access token.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let sets_cookie = response.headers().contains_key(header::SET_COOKIE);
    let headers = response.headers_mut();

    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("referrer-policy", HeaderValue::from_static("same-origin"));
    if sets_cookie {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::issue_admin_token;
    use crate::config::{Config, RealmSecret};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    fn test_state(admin_password: Option<&str>) -> AppState {
        AppState::new(Config {
            admin_password: admin_password.map(str::to_string),
            vote_secret: RealmSecret::configured("v"),
            suggestion_secret: RealmSecret::configured("s"),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            secure_cookies: false,
            rate_limit_login_per_min: 5,
            rate_limit_verify_per_min: 10,
            rate_limit_prune_threshold: 100,
        })
    }

    fn gated_app(state: AppState) -> Router {
        Router::new()
            .route("/admin", get(|| async { "dashboard" }))
            .route("/admin/login", get(|| async { "login form" }))
            .route("/admin/rounds", get(|| async { "rounds" }))
            .route("/administrator", get(|| async { "not admin" }))
            .route("/vote", get(|| async { "public" }))
            .layer(middleware::from_fn_with_state(state.clone(), admin_gate))
            .with_state(state)
    }

    async fn get_path(app: Router, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        app.oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    fn admin_cookie(password: &str) -> String {
        format!("{}={}", ADMIN_COOKIE, issue_admin_token(password))
    }

    #[test]
    fn test_is_protected() {
        assert!(is_protected("/admin"));
        assert!(is_protected("/admin/"));
        assert!(is_protected("/admin/rounds/1"));
        assert!(!is_protected("/administrator"));
        assert!(!is_protected("/api/admin/login"));
        assert!(!is_protected("/"));
    }

    #[test]
    fn test_login_redirect_target() {
        assert_eq!(
            login_redirect_target("/admin/rounds"),
            "/admin/login?from=/admin/rounds"
        );
        assert_eq!(
            login_redirect_target("/admin?tab=votes&x=1"),
            "/admin/login?from=/admin%3Ftab%3Dvotes%26x%3D1"
        );
    }

    #[tokio::test]
    async fn test_gate_disabled_without_password() {
        let app = gated_app(test_state(None));
        let response = get_path(app, "/admin/rounds", Some("admin_session=junk")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_gate_disabled_with_empty_password() {
        let app = gated_app(test_state(Some("")));
        let response = get_path(app, "/admin", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unprotected_paths_pass() {
        let state = test_state(Some("secret1"));
        for path in ["/vote", "/administrator"] {
            let response = get_path(gated_app(state.clone()), path, None).await;
            assert_eq!(response.status(), StatusCode::OK, "{}", path);
        }
    }

    #[tokio::test]
    async fn test_redirects_without_session() {
        let app = gated_app(test_state(Some("secret1")));
        let response = get_path(app, "/admin/rounds", None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/admin/login?from=/admin/rounds");
    }

    #[tokio::test]
    async fn test_redirects_with_wrong_session() {
        let app = gated_app(test_state(Some("secret1")));
        let cookie = admin_cookie("old-password");
        let response = get_path(app, "/admin", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/admin/login?from=/admin");
    }

    #[tokio::test]
    async fn test_passes_with_valid_session() {
        let app = gated_app(test_state(Some("secret1")));
        let cookie = admin_cookie("secret1");
        let response = get_path(app, "/admin/rounds", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, "rounds");
    }

    #[tokio::test]
    async fn test_login_page_open_without_session() {
        let app = gated_app(test_state(Some("secret1")));
        let response = get_path(app, "/admin/login", None).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_page_redirects_when_signed_in() {
        let app = gated_app(test_state(Some("secret1")));
        let cookie = admin_cookie("secret1");
        let response = get_path(app, "/admin/login", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/admin");
    }

    #[tokio::test]
    async fn test_security_headers_applied() {
        let app = Router::new()
            .route("/", get(|| async { "plain" }))
            .route(
                "/cookie",
                get(|| async { ([(header::SET_COOKIE, "a=b")], "with cookie") }),
            )
            .layer(middleware::from_fn(security_headers));

        let response = get_path(app.clone(), "/", None).await;
        let headers = response.headers();
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
        assert_eq!(headers.get("referrer-policy").unwrap(), "same-origin");
        assert!(headers.get(header::CACHE_CONTROL).is_none());

        let response = get_path(app, "/cookie", None).await;
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-store"
        );
    }
}
