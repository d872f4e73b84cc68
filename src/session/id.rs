//! Session identifiers

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Longest accepted session id
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Opaque caller-chosen session token
///
/// The only validation is filesystem safety: the id becomes a directory name
/// under the base directory, so it is limited to `[A-Za-z0-9._-]` and may not
/// start with a dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Validate a caller-supplied id
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();

        if raw.is_empty() {
            return Err(Error::InvalidInput("session id is empty".to_string()));
        }
        if raw.len() > MAX_SESSION_ID_LEN {
            return Err(Error::InvalidInput(format!(
                "session id is longer than {} characters",
                MAX_SESSION_ID_LEN
            )));
        }
        if raw.starts_with('.') {
            return Err(Error::InvalidInput(format!(
                "session id '{}' may not start with '.'",
                raw
            )));
        }
        if let Some(bad) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(Error::InvalidInput(format!(
                "session id contains invalid character {:?}",
                bad
            )));
        }

        Ok(SessionId(raw))
    }

    /// Fresh random id
    pub fn generate() -> Self {
        SessionId(Uuid::new_v4().to_string())
    }

    /// Borrow the id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SessionId::parse(s)
    }
}

impl TryFrom<String> for SessionId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        SessionId::parse(value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_safe_ids() {
        for ok in ["abc", "A-b_c.1", "550e8400-e29b-41d4-a716-446655440000"] {
            assert_eq!(SessionId::parse(ok).unwrap().as_str(), ok);
        }
    }

    #[test]
    fn test_rejects_unsafe_ids() {
        let too_long = "a".repeat(MAX_SESSION_ID_LEN + 1);
        for bad in ["", ".", "..", ".hidden", "a/b", "../etc", "a b", "a\0b", too_long.as_str()] {
            assert!(
                matches!(SessionId::parse(bad), Err(Error::InvalidInput(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_generated_ids_are_valid_and_unique() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert!(SessionId::parse(a.as_str()).is_ok());
    }

    #[test]
    fn test_serde_validates() {
        let id: SessionId = serde_json::from_str("\"abc-1\"").unwrap();
        assert_eq!(id.as_str(), "abc-1");
        assert!(serde_json::from_str::<SessionId>("\"../x\"").is_err());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc-1\"");
    }
}
