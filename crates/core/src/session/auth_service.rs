use log::{info, warn};
use std::sync::Arc;

use super::session_context::SessionContext;
use super::session_model::{AuthGrant, Registration, Session};
use crate::api::NutritionApi;
use crate::constants::DEFAULT_USER_ROLE;
use crate::errors::{Error, Result};
use crate::preferences::PreferenceStore;

/// Login, registration and logout on top of [`SessionContext`].
pub struct AuthService {
    api: Arc<dyn NutritionApi>,
    session: Arc<SessionContext>,
    preferences: Arc<dyn PreferenceStore>,
}

impl AuthService {
    pub fn new(
        api: Arc<dyn NutritionApi>,
        session: Arc<SessionContext>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        Self {
            api,
            session,
            preferences,
        }
    }

    /// Authenticate and establish a persisted session.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        if email.trim().is_empty() || password.trim().is_empty() {
            return Err(Error::validation("Email and password are required"));
        }

        let grant = self
            .api
            .login(email.trim(), password)
            .await
            .map_err(|e| auth_error("Login", e))?;
        self.adopt(grant)
    }

    /// Create an account and establish a persisted session. `role` defaults
    /// to `USER`.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Option<&str>,
    ) -> Result<Session> {
        if name.trim().is_empty() || email.trim().is_empty() || password.trim().is_empty() {
            return Err(Error::validation("Name, email and password are required"));
        }

        let registration = Registration {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
            role: role.unwrap_or(DEFAULT_USER_ROLE).to_string(),
        };
        let grant = self
            .api
            .register(&registration)
            .await
            .map_err(|e| auth_error("Registration", e))?;
        self.adopt(grant)
    }

    /// Invalidate the session and forget the persisted credentials.
    pub fn logout(&self) -> Result<()> {
        self.session.clear();
        SessionContext::forget(self.preferences.as_ref())
    }

    /// Re-establish the session persisted by a previous run.
    pub fn restore(&self) -> Result<Option<Session>> {
        self.session.restore(self.preferences.as_ref())
    }

    fn adopt(&self, grant: AuthGrant) -> Result<Session> {
        let session = self.session.establish(grant.token, grant.user_id)?;
        if let Err(e) = self.session.persist(self.preferences.as_ref()) {
            // The in-memory session is still usable for this run.
            warn!("Failed to persist session credentials: {}", e);
        }
        info!("Authenticated as user {}", session.user_id());
        Ok(session)
    }
}

/// Credential rejections become `Auth`; transport failures keep their kind.
fn auth_error(operation: &str, err: Error) -> Error {
    if err.is_client_error() {
        warn!("{} rejected: {}", operation, err);
        Error::Auth(err.to_string())
    } else {
        warn!("{} failed: {}", operation, err);
        err
    }
}
