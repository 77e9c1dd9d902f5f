//! Access token wire format: `"{resource_id}:{signature_hex}"`.

use std::fmt;
use std::str::FromStr;

/// Logical resource an access token is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceId {
    /// The single admin realm resource.
    Admin,
    /// A vote or suggestion round.
    Round(u64),
}

impl ResourceId {
    const ADMIN: &'static str = "admin";
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Admin => f.write_str(Self::ADMIN),
            ResourceId::Round(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for ResourceId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::ADMIN {
            return Ok(ResourceId::Admin);
        }
        // Canonical decimal only: no sign and no leading zeros, so each round
        // has exactly one encoding.
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(());
        }
        if s.len() > 1 && s.starts_with('0') {
            return Err(());
        }
        s.parse::<u64>().map(ResourceId::Round).map_err(|_| ())
    }
}

/// A decoded `(resource, signature)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub resource: ResourceId,
    pub signature: String,
}

impl AccessToken {
    pub fn new(resource: ResourceId, signature: impl Into<String>) -> Self {
        Self {
            resource,
            signature: signature.into(),
        }
    }

    /// Encode a resource and signature into the cookie value format.
    pub fn encode(resource: ResourceId, signature: &str) -> String {
        format!("{}:{}", resource, signature)
    }

    /// Decode a token string.
    ///
    /// Returns `None` for a missing separator, an unknown or non-numeric
    /// resource id, or an empty signature. Callers treat `None` exactly like
    /// "not authenticated".
    pub fn decode(token: &str) -> Option<Self> {
        let (resource, signature) = token.split_once(':')?;
        if signature.is_empty() {
            return None;
        }
        let resource = resource.parse::<ResourceId>().ok()?;
        Some(Self::new(resource, signature))
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource, self.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_format() {
        assert_eq!(AccessToken::encode(ResourceId::Round(42), "ab12"), "42:ab12");
        assert_eq!(AccessToken::encode(ResourceId::Admin, "ff"), "admin:ff");
    }

    #[test]
    fn test_decode_valid() {
        let token = AccessToken::decode("42:deadbeef").unwrap();
        assert_eq!(token.resource, ResourceId::Round(42));
        assert_eq!(token.signature, "deadbeef");

        let token = AccessToken::decode("admin:00").unwrap();
        assert_eq!(token.resource, ResourceId::Admin);
    }

    #[test]
    fn test_decode_display_matches_encode() {
        let encoded = AccessToken::encode(ResourceId::Round(7), "cafe");
        assert_eq!(AccessToken::decode(&encoded).unwrap().to_string(), encoded);
    }

    #[test]
    fn test_decode_missing_separator() {
        assert_eq!(AccessToken::decode("42deadbeef"), None);
        assert_eq!(AccessToken::decode(""), None);
    }

    #[test]
    fn test_decode_non_numeric_id() {
        assert_eq!(AccessToken::decode("abc:deadbeef"), None);
        assert_eq!(AccessToken::decode("+42:deadbeef"), None);
        assert_eq!(AccessToken::decode("-1:deadbeef"), None);
        assert_eq!(AccessToken::decode(":deadbeef"), None);
    }

    #[test]
    fn test_decode_rejects_leading_zeros() {
        assert_eq!(AccessToken::decode("042:deadbeef"), None);
        assert_eq!(AccessToken::decode("00:deadbeef"), None);
        assert_eq!(
            AccessToken::decode("0:deadbeef").unwrap().resource,
            ResourceId::Round(0)
        );
    }

    #[test]
    fn test_decode_empty_signature() {
        assert_eq!(AccessToken::decode("42:"), None);
        assert_eq!(AccessToken::decode("admin:"), None);
    }

    #[test]
    fn test_decode_id_overflow() {
        assert_eq!(AccessToken::decode("99999999999999999999999:ab"), None);
    }
}
