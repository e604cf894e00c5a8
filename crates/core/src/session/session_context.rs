use log::{debug, info, warn};
use std::sync::{Arc, RwLock};

use super::session_model::Session;
use crate::constants::{AUTH_TOKEN_KEY, USER_ID_KEY};
use crate::errors::{Error, Result};
use crate::events::{DomainEvent, DomainEventSink};
use crate::preferences::{PreferenceStore, PreferenceStoreExt};

/// Holder of the active session.
///
/// Components never read this ambiently: callers obtain a [`Session`] from
/// [`SessionContext::require`] and pass it into each authenticated call.
pub struct SessionContext {
    current: RwLock<Option<Session>>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl SessionContext {
    pub fn new(event_sink: Arc<dyn DomainEventSink>) -> Self {
        Self {
            current: RwLock::new(None),
            event_sink,
        }
    }

    /// Replace any existing session.
    pub fn establish(&self, token: impl Into<String>, user_id: i64) -> Result<Session> {
        let session = Session::new(token, user_id);
        session.ensure_valid()?;

        {
            let mut current = self
                .current
                .write()
                .map_err(|_| Error::Unexpected("Session lock poisoned".into()))?;
            *current = Some(session.clone());
        }

        info!("Session established for user {}", user_id);
        self.event_sink
            .emit(DomainEvent::SessionEstablished { user_id });
        Ok(session)
    }

    /// The active session, or `None` when logged out.
    pub fn current(&self) -> Option<Session> {
        self.current.read().ok().and_then(|s| s.clone())
    }

    /// The active session, or a `Session` error.
    pub fn require(&self) -> Result<Session> {
        self.current()
            .ok_or_else(|| Error::session("No active session, please log in"))
    }

    pub fn is_active(&self) -> bool {
        self.current().is_some()
    }

    /// Invalidate the session. Subsequent `require()` calls fail fast.
    pub fn clear(&self) {
        let had_session = match self.current.write() {
            Ok(mut current) => current.take().is_some(),
            Err(poisoned) => poisoned.into_inner().take().is_some(),
        };
        if had_session {
            info!("Session cleared");
            self.event_sink.emit(DomainEvent::SessionCleared);
        }
    }

    /// Load the persisted credentials, if any, and establish them.
    pub fn restore(&self, preferences: &dyn PreferenceStore) -> Result<Option<Session>> {
        let token = preferences.get_or(AUTH_TOKEN_KEY, "")?;
        let user_id = preferences.get_i64_or(USER_ID_KEY, 0)?;

        if token.trim().is_empty() || user_id <= 0 {
            debug!("No persisted session to restore");
            return Ok(None);
        }

        match self.establish(token, user_id) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!("Persisted session could not be restored: {}", e);
                Ok(None)
            }
        }
    }

    /// Write the active session's credentials to the preference store.
    pub fn persist(&self, preferences: &dyn PreferenceStore) -> Result<()> {
        let session = self.require()?;
        preferences.set(AUTH_TOKEN_KEY, session.token())?;
        preferences.set_i64(USER_ID_KEY, session.user_id())
    }

    /// Remove persisted credentials.
    pub fn forget(preferences: &dyn PreferenceStore) -> Result<()> {
        preferences.remove(AUTH_TOKEN_KEY)?;
        preferences.remove(USER_ID_KEY)
    }
}
