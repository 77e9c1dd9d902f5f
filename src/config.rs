use std::env;
use std::net::SocketAddr;

/// Round secret used when nothing else is configured. Anyone who has read
/// this source can forge round access cookies while it is in use.
pub const BUILTIN_ROUND_SECRET: &str = "bookclub-round-access-default";

/// Where a round realm secret came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
    /// The realm's own environment variable.
    Realm,
    /// Fell back to `ADMIN_PASSWORD`.
    AdminPassword,
    /// Fell back to `ROUND_ACCESS_FALLBACK_SECRET`.
    Fallback,
    /// Fell back to [`BUILTIN_ROUND_SECRET`].
    Builtin,
}

#[derive(Clone)]
pub struct RealmSecret {
    pub value: String,
    pub source: SecretSource,
}

impl RealmSecret {
    pub fn configured(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            source: SecretSource::Realm,
        }
    }
}

impl std::fmt::Debug for RealmSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealmSecret")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .finish()
    }
}

#[derive(Clone)]
pub struct Config {
    // Admin gate; `None` disables it
    pub admin_password: Option<String>,

    // Round access secrets
    pub vote_secret: RealmSecret,
    pub suggestion_secret: RealmSecret,

    // Server
    pub bind_addr: SocketAddr,
    pub secure_cookies: bool,

    // Rate limiting
    pub rate_limit_login_per_min: u32,
    pub rate_limit_verify_per_min: u32,
    pub rate_limit_prune_threshold: usize,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field(
                "admin_password",
                &self.admin_password.as_ref().map(|_| "[REDACTED]"),
            )
            .field("vote_secret", &self.vote_secret)
            .field("suggestion_secret", &self.suggestion_secret)
            .field("bind_addr", &self.bind_addr)
            .field("secure_cookies", &self.secure_cookies)
            .field("rate_limit_login_per_min", &self.rate_limit_login_per_min)
            .field("rate_limit_verify_per_min", &self.rate_limit_verify_per_min)
            .field(
                "rate_limit_prune_threshold",
                &self.rate_limit_prune_threshold,
            )
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Attempt to load .env file, but don't fail if it doesn't exist
        // (env vars may be set directly in production)
        let _ = dotenvy::dotenv();

        // Admin gate - unset or empty leaves admin pages open
        let admin_password = non_empty_var("ADMIN_PASSWORD");

        // Round access secrets
        let fallback = non_empty_var("ROUND_ACCESS_FALLBACK_SECRET");
        let vote_secret =
            resolve_realm_secret("VOTE_ACCESS_SECRET", &admin_password, &fallback);
        let suggestion_secret =
            resolve_realm_secret("SUGGESTION_ACCESS_SECRET", &admin_password, &fallback);

        // Server
        let bind_addr_str = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_addr = bind_addr_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::ParseError("BIND_ADDR".to_string(), e.to_string()))?;
        let secure_cookies = parse_env_or_default("SECURE_COOKIES", false)?;

        // Rate limiting
        let rate_limit_login_per_min = parse_env_or_default("RATE_LIMIT_LOGIN_PER_MIN", 5)?;
        let rate_limit_verify_per_min = parse_env_or_default("RATE_LIMIT_VERIFY_PER_MIN", 10)?;
        let rate_limit_prune_threshold =
            parse_env_or_default("RATE_LIMIT_PRUNE_THRESHOLD", 10_000)?;

        for (key, value) in [
            ("RATE_LIMIT_LOGIN_PER_MIN", rate_limit_login_per_min),
            ("RATE_LIMIT_VERIFY_PER_MIN", rate_limit_verify_per_min),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue(
                    key.to_string(),
                    "must be at least 1".to_string(),
                ));
            }
        }

        Ok(Config {
            admin_password,
            vote_secret,
            suggestion_secret,
            bind_addr,
            secure_cookies,
            rate_limit_login_per_min,
            rate_limit_verify_per_min,
            rate_limit_prune_threshold,
        })
    }

    /// Configured admin password, or `None` when the admin gate is disabled.
    pub fn admin_password(&self) -> Option<&str> {
        self.admin_password.as_deref().filter(|p| !p.is_empty())
    }

    pub fn admin_gate_enabled(&self) -> bool {
        self.admin_password().is_some()
    }

    /// Emit startup warnings for permissive or weak settings.
    pub fn log_warnings(&self) {
        if !self.admin_gate_enabled() {
            tracing::warn!("ADMIN_PASSWORD is not set; admin pages and APIs are open");
        }
        for (realm, secret) in [
            ("vote", &self.vote_secret),
            ("suggestion", &self.suggestion_secret),
        ] {
            match secret.source {
                SecretSource::Realm => {}
                SecretSource::AdminPassword => tracing::info!(
                    realm,
                    "Round access secret not set; signing with ADMIN_PASSWORD"
                ),
                SecretSource::Fallback => tracing::warn!(
                    realm,
                    "Round access secret not set; signing with ROUND_ACCESS_FALLBACK_SECRET"
                ),
                SecretSource::Builtin => tracing::warn!(
                    realm,
                    "Round access secret not set; signing with the BUILT-IN DEFAULT. \
                     Round access cookies can be forged. Set a realm secret."
                ),
            }
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

/// Realm secret, else admin password, else fallback secret, else built-in.
fn resolve_realm_secret(
    key: &str,
    admin_password: &Option<String>,
    fallback: &Option<String>,
) -> RealmSecret {
    if let Some(value) = non_empty_var(key) {
        return RealmSecret::configured(value);
    }
    if let Some(value) = admin_password {
        return RealmSecret {
            value: value.clone(),
            source: SecretSource::AdminPassword,
        };
    }
    if let Some(value) = fallback {
        return RealmSecret {
            value: value.clone(),
            source: SecretSource::Fallback,
        };
    }
    RealmSecret {
        value: BUILTIN_ROUND_SECRET.to_string(),
        source: SecretSource::Builtin,
    }
}

/// Helper function to parse environment variable with a default value
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(key.to_string(), format!("{}: {}", e, val))),
        Err(_) => Ok(default),
    }
}
