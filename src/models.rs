//! Request and response models for the API.
//!
//! All models use serde for serialization/deserialization.

use serde::{Deserialize, Serialize};

// ============================================================================
// Admin Models
// ============================================================================

/// Admin login form.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

/// Round access settings submitted by an admin.
#[derive(Debug, Deserialize)]
pub struct RoundAccessRequest {
    /// Access password. `None` or empty makes the round open to everyone.
    pub password: Option<String>,
    /// Unix seconds after which password verification is refused.
    pub closes_at: Option<u64>,
}

/// Round info for admin listing. Never includes the password itself.
#[derive(Debug, Serialize)]
pub struct RoundInfo {
    pub realm: String,
    pub round_id: u64,
    pub has_password: bool,
    pub closes_at: Option<u64>,
}

// ============================================================================
// Round Models
// ============================================================================

/// Password submitted to unlock a round.
#[derive(Deserialize)]
pub struct VerifyPasswordRequest {
    pub password: String,
}

/// Access status of a round for the calling client.
#[derive(Debug, Serialize)]
pub struct RoundStatusResponse {
    pub round_id: u64,
    /// True when the round has a password and the caller holds no valid
    /// access cookie for it.
    pub requires_password: bool,
    pub has_access: bool,
    pub is_open: bool,
}

// ============================================================================
// Storage Models
// ============================================================================

/// Access settings for one round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundAccess {
    pub password: Option<String>,
    pub closes_at: Option<u64>,
}

impl RoundAccess {
    /// The configured password, treating an empty string as none.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    pub fn is_open(&self, now_unix: u64) -> bool {
        self.closes_at.map_or(true, |closes_at| now_unix < closes_at)
    }
}
