//! Admin session and round access verification.
//!
//! Both variants share one shape: a token is `resource:hmac(secret, message)`
//! where the message is bound to the resource. Nothing here reads
//! configuration; secrets and passwords are passed in by the caller.

use crate::auth::cookie::{cookie_from_headers, parse_cookie_header};
use crate::auth::signer::{sign, signatures_match};
use crate::auth::token::{AccessToken, ResourceId};
use crate::error::AppError;
use axum::http::HeaderMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Cookie carrying the admin session token.
pub const ADMIN_COOKIE: &str = "admin_session";

/// Admin session cookie lifetime.
pub const ADMIN_COOKIE_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Round access cookie lifetime.
pub const ROUND_COOKIE_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);

const ADMIN_MESSAGE: &str = "admin-session";

const PASSWORD_DIGEST_KEY: &str = "bookclub-password-compare";

// ============================================================================
// Admin realm
// ============================================================================

/// Issue the admin session token for `password`.
///
/// Call only after the submitted password matched (see [`password_matches`]).
pub fn issue_admin_token(password: &str) -> String {
    AccessToken::encode(ResourceId::Admin, &sign(password, ADMIN_MESSAGE))
}

/// Check a presented admin token against the configured password.
///
/// Returns false if either side is empty.
pub fn verify_admin_token(token: &str, password: &str) -> bool {
    if token.is_empty() || password.is_empty() {
        return false;
    }
    signatures_match(token, &issue_admin_token(password))
}

/// Gate for admin API handlers.
///
/// With no password configured the admin gate is disabled and every request
/// passes. Otherwise the admin cookie must carry a valid token.
pub fn require_admin(headers: &HeaderMap, password: Option<&str>) -> Result<(), AppError> {
    let Some(password) = password.filter(|p| !p.is_empty()) else {
        return Ok(());
    };
    let token = cookie_from_headers(headers, ADMIN_COOKIE).unwrap_or_default();
    if verify_admin_token(&token, password) {
        Ok(())
    } else {
        Err(AppError::Unauthorized("Unauthorized".to_string()))
    }
}

/// Constant-time comparison of a submitted password against the expected one.
///
/// Both sides are reduced to fixed-length digests first, so timing does not
/// depend on either password's length.
pub fn password_matches(submitted: &str, expected: &str) -> bool {
    signatures_match(&password_digest(submitted), &password_digest(expected))
}

fn password_digest(password: &str) -> String {
    sign(PASSWORD_DIGEST_KEY, password)
}

// ============================================================================
// Round realms
// ============================================================================

/// Which family of rounds a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Realm {
    Vote,
    Suggestion,
}

impl Realm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Realm::Vote => "vote",
            Realm::Suggestion => "suggestion",
        }
    }

    pub fn cookie_name(&self) -> &'static str {
        match self {
            Realm::Vote => "vote_access",
            Realm::Suggestion => "suggestion_access",
        }
    }

    fn message(&self, round_id: u64) -> String {
        format!("{}-round-access:{}", self.as_str(), round_id)
    }
}

impl fmt::Display for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Realm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vote" => Ok(Realm::Vote),
            "suggestion" => Ok(Realm::Suggestion),
            _ => Err(format!("Unknown realm: {}", s)),
        }
    }
}

/// Issues and verifies access tokens for one round realm.
#[derive(Clone)]
pub struct RoundVerifier {
    realm: Realm,
    secret: String,
}

impl RoundVerifier {
    pub fn new(realm: Realm, secret: impl Into<String>) -> Self {
        Self {
            realm,
            secret: secret.into(),
        }
    }

    pub fn realm(&self) -> Realm {
        self.realm
    }

    /// Issue a token bound to `round_id`.
    ///
    /// Issuance does not depend on whether the round currently has a password.
    pub fn issue_token(&self, round_id: u64) -> String {
        AccessToken::encode(ResourceId::Round(round_id), &self.signature(round_id))
    }

    /// Verify the realm cookie in a raw `Cookie` header for `round_id`.
    ///
    /// A token issued for another round, a malformed token, a bad signature
    /// and a missing cookie all yield `false`.
    pub fn verify(&self, round_id: u64, cookie_header: Option<&str>) -> bool {
        let Some(header) = cookie_header else {
            return false;
        };
        let cookies = parse_cookie_header(header);
        let Some(raw) = cookies.get(self.realm.cookie_name()) else {
            return false;
        };
        self.verify_token(round_id, raw)
    }

    /// Same as [`RoundVerifier::verify`], reading cookies from request headers.
    pub fn verify_headers(&self, round_id: u64, headers: &HeaderMap) -> bool {
        match cookie_from_headers(headers, self.realm.cookie_name()) {
            Some(raw) => self.verify_token(round_id, &raw),
            None => false,
        }
    }

    fn verify_token(&self, round_id: u64, raw: &str) -> bool {
        let Some(token) = AccessToken::decode(raw) else {
            return false;
        };
        if token.resource != ResourceId::Round(round_id) {
            return false;
        }
        signatures_match(&token.signature, &self.signature(round_id))
    }

    fn signature(&self, round_id: u64) -> String {
        sign(&self.secret, &self.realm.message(round_id))
    }
}

impl fmt::Debug for RoundVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoundVerifier")
            .field("realm", &self.realm)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    fn cookie(realm: Realm, token: &str) -> String {
        format!("{}={}", realm.cookie_name(), token)
    }

    #[test]
    fn test_admin_token_round_trip() {
        let token = issue_admin_token("secret1");
        assert!(token.starts_with("admin:"));
        assert!(verify_admin_token(&token, "secret1"));
    }

    #[test]
    fn test_admin_token_rejected_after_password_change() {
        let token = issue_admin_token("secret1");
        assert!(!verify_admin_token(&token, "secret2"));
    }

    #[test]
    fn test_admin_token_empty_inputs() {
        assert!(!verify_admin_token("", "secret1"));
        assert!(!verify_admin_token(&issue_admin_token(""), ""));
    }

    #[test]
    fn test_require_admin_disabled_without_password() {
        let mut headers = HeaderMap::new();
        assert!(require_admin(&headers, None).is_ok());
        assert!(require_admin(&headers, Some("")).is_ok());

        headers.insert(header::COOKIE, HeaderValue::from_static("admin_session=garbage"));
        assert!(require_admin(&headers, None).is_ok());
    }

    #[test]
    fn test_require_admin_with_password() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            require_admin(&headers, Some("secret1")),
            Err(AppError::Unauthorized(_))
        ));

        let value = format!("{}={}", ADMIN_COOKIE, issue_admin_token("secret1"));
        headers.insert(header::COOKIE, HeaderValue::from_str(&value).unwrap());
        assert!(require_admin(&headers, Some("secret1")).is_ok());
        assert!(require_admin(&headers, Some("rotated")).is_err());
    }

    #[test]
    fn test_password_matches() {
        assert!(password_matches("book42", "book42"));
        assert!(!password_matches("book4", "book42"));
        assert!(!password_matches("", "book42"));
        assert!(!password_matches("book42 and then some", "book42"));
        assert!(password_matches("", ""));
    }

    #[test]
    fn test_password_digest_length_is_fixed() {
        let short = password_digest("");
        let long = password_digest(&"x".repeat(4096));
        assert_eq!(short.len(), 64);
        assert_eq!(long.len(), short.len());
        assert_ne!(short, long);
    }

    #[test]
    fn test_round_token_round_trip() {
        let verifier = RoundVerifier::new(Realm::Vote, "s");
        for id in [0, 1, 42, u64::MAX] {
            let token = verifier.issue_token(id);
            assert!(verifier.verify(id, Some(&cookie(Realm::Vote, &token))));
        }
    }

    #[test]
    fn test_round_token_not_valid_for_other_round() {
        let verifier = RoundVerifier::new(Realm::Vote, "s");
        let token = verifier.issue_token(42);
        assert!(!verifier.verify(43, Some(&cookie(Realm::Vote, &token))));
    }

    #[test]
    fn test_round_token_with_swapped_id_rejected() {
        let verifier = RoundVerifier::new(Realm::Vote, "s");
        let token = verifier.issue_token(5);
        let signature = token.split_once(':').unwrap().1;
        let forged = format!("6:{}", signature);
        assert!(!verifier.verify(6, Some(&cookie(Realm::Vote, &forged))));
    }

    #[test]
    fn test_round_token_rejected_after_secret_change() {
        let token = RoundVerifier::new(Realm::Vote, "old").issue_token(1);
        let verifier = RoundVerifier::new(Realm::Vote, "new");
        assert!(!verifier.verify(1, Some(&cookie(Realm::Vote, &token))));
    }

    #[test]
    fn test_round_token_not_valid_across_realms() {
        let votes = RoundVerifier::new(Realm::Vote, "s");
        let suggestions = RoundVerifier::new(Realm::Suggestion, "s");
        let token = votes.issue_token(1);
        // Wrong cookie name
        assert!(!suggestions.verify(1, Some(&cookie(Realm::Vote, &token))));
        // Right cookie name, but signed for the vote realm
        assert!(!suggestions.verify(1, Some(&cookie(Realm::Suggestion, &token))));
    }

    #[test]
    fn test_round_verify_missing_or_empty_header() {
        let verifier = RoundVerifier::new(Realm::Suggestion, "s");
        assert!(!verifier.verify(1, None));
        assert!(!verifier.verify(1, Some("")));
        assert!(!verifier.verify(1, Some("other=1")));
        assert!(!verifier.verify(1, Some("suggestion_access=")));
        assert!(!verifier.verify(1, Some("suggestion_access=garbage")));
    }

    #[test]
    fn test_round_verify_percent_encoded_cookie() {
        let verifier = RoundVerifier::new(Realm::Vote, "s");
        let encoded = verifier.issue_token(9).replace(':', "%3A");
        assert!(verifier.verify(9, Some(&cookie(Realm::Vote, &encoded))));
    }

    #[test]
    fn test_round_verify_headers() {
        let verifier = RoundVerifier::new(Realm::Vote, "s");
        let mut headers = HeaderMap::new();
        assert!(!verifier.verify_headers(3, &headers));
        let value = cookie(Realm::Vote, &verifier.issue_token(3));
        headers.insert(header::COOKIE, HeaderValue::from_str(&value).unwrap());
        assert!(verifier.verify_headers(3, &headers));
        assert!(!verifier.verify_headers(4, &headers));
    }

    #[test]
    fn test_realm_parse() {
        assert_eq!("vote".parse::<Realm>().unwrap(), Realm::Vote);
        assert_eq!("suggestion".parse::<Realm>().unwrap(), Realm::Suggestion);
        assert!("admin".parse::<Realm>().is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let verifier = RoundVerifier::new(Realm::Vote, "hunter2");
        assert!(!format!("{:?}", verifier).contains("hunter2"));
    }
}
