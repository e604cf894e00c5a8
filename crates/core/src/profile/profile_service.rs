use log::{info, warn};
use std::sync::Arc;

use super::profile_model::Profile;
use crate::api::NutritionApi;
use crate::errors::Result;
use crate::session::Session;

/// Reads and updates the backend-held body profile.
pub struct ProfileService {
    api: Arc<dyn NutritionApi>,
}

impl ProfileService {
    pub fn new(api: Arc<dyn NutritionApi>) -> Self {
        Self { api }
    }

    pub async fn get_profile(&self, session: &Session) -> Result<Profile> {
        session.ensure_valid()?;
        self.api.get_profile(session.token()).await.map_err(|e| {
            warn!("Failed to load profile: {}", e);
            e
        })
    }

    /// Push the edited profile, then read it back so callers see what the
    /// backend actually stored.
    pub async fn update_profile(&self, session: &Session, profile: &Profile) -> Result<Profile> {
        session.ensure_valid()?;
        let message = self.api.update_profile(session.token(), profile).await?;
        info!("Profile updated for user {}: {}", session.user_id(), message);
        self.api.get_profile(session.token()).await
    }
}
