use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{Error, Result};

/// Authenticated identity: bearer token plus numeric user id.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    token: String,
    user_id: i64,
}

impl Session {
    pub fn new(token: impl Into<String>, user_id: i64) -> Self {
        Self {
            token: token.into(),
            user_id,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// A session is usable only with a non-empty token and a resolved user id.
    pub fn is_valid(&self) -> bool {
        !self.token.trim().is_empty() && self.user_id > 0
    }

    /// Precondition check run before every authorized backend call.
    pub fn ensure_valid(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(Error::session("Empty token, please log in again"));
        }
        if self.user_id <= 0 {
            return Err(Error::session("User id not resolved, please log in again"));
        }
        Ok(())
    }
}

// Keep the bearer token out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// Token and user id returned by login and registration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthGrant {
    pub token: String,
    pub user_id: i64,
}

impl fmt::Debug for AuthGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthGrant")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}

impl From<AuthGrant> for Session {
    fn from(grant: AuthGrant) -> Self {
        Session::new(grant.token, grant.user_id)
    }
}

/// Self-service account creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_rules() {
        assert!(Session::new("abc", 7).is_valid());
        assert!(!Session::new("", 7).is_valid());
        assert!(!Session::new("   ", 7).is_valid());
        assert!(!Session::new("abc", 0).is_valid());

        assert!(matches!(
            Session::new("", 7).ensure_valid(),
            Err(Error::Session(_))
        ));
        assert!(matches!(
            Session::new("abc", -1).ensure_valid(),
            Err(Error::Session(_))
        ));
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", Session::new("secret-token", 7));
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("user_id: 7"));
    }
}
