use async_trait::async_trait;

use crate::errors::Result;
use crate::profile::Profile;
use crate::readings::{NewReading, Reading};
use crate::session::{AuthGrant, Registration};

/// The REST backend as seen by the pipeline.
///
/// Implemented over HTTP by `smartbite-api`; tests use in-memory fakes.
/// Methods taking a `token` send it as a bearer credential.
#[async_trait]
pub trait NutritionApi: Send + Sync {
    /// POST /api/auth/login
    async fn login(&self, email: &str, password: &str) -> Result<AuthGrant>;

    /// POST /api/auth/registro
    async fn register(&self, registration: &Registration) -> Result<AuthGrant>;

    /// GET /api/profile
    async fn get_profile(&self, token: &str) -> Result<Profile>;

    /// PUT /api/profile. Returns the backend's confirmation text.
    async fn update_profile(&self, token: &str, profile: &Profile) -> Result<String>;

    /// GET /api/sensores/me
    async fn list_my_readings(&self, token: &str) -> Result<Vec<Reading>>;

    /// GET /api/sensores/todas
    async fn list_all_readings(&self) -> Result<Vec<Reading>>;

    /// POST /api/sensores/registrar. Returns the backend's confirmation text.
    async fn register_reading(&self, token: &str, reading: &NewReading) -> Result<String>;
}
