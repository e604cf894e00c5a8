//! HTTP client for the SmartBite REST backend.

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;

use smartbite_core::api::NutritionApi;
use smartbite_core::profile::Profile;
use smartbite_core::readings::{NewReading, Reading};
use smartbite_core::session::{AuthGrant, Registration};

use crate::error::{ApiError, Result};
use crate::types::*;

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client for the SmartBite backend.
#[derive(Debug, Clone)]
pub struct SmartBiteClient {
    client: reqwest::Client,
    base_url: String,
}

impl SmartBiteClient {
    /// Create a client for `base_url` (e.g. "https://api.smartbite.example").
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Use a preconfigured `reqwest::Client`.
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn headers(&self, token: Option<&str>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = token {
            let auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::auth("Invalid access token format"))?;
            headers.insert(AUTHORIZATION, auth_value);
        }

        Ok(headers)
    }

    /// Read the body, failing with its text on a non-success status.
    async fn read_body(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let body = response.text().await?;
        debug!("API response ({}): {}", status, body);

        if !status.is_success() {
            let message = if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            } else {
                body
            };
            return Err(ApiError::api(status.as_u16(), message));
        }
        Ok(body)
    }

    /// Parse a JSON response body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let body = Self::read_body(response).await?;
        serde_json::from_str(&body).map_err(|e| {
            log::error!(
                "Failed to deserialize response. Body: {}, Error: {}",
                body,
                e
            );
            ApiError::from(e)
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Auth
    // ─────────────────────────────────────────────────────────────────────────

    /// POST /api/auth/login
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .headers(self.headers(None)?)
            .json(&LoginRequest {
                correo: email,
                password,
            })
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// POST /api/auth/registro
    pub async fn register(&self, registration: &Registration) -> Result<LoginResponse> {
        debug!("Registering {} with role {}", registration.email, registration.role);
        let response = self
            .client
            .post(self.url("/api/auth/registro"))
            .headers(self.headers(None)?)
            .json(&RegistroRequest::from(registration))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Profile
    // ─────────────────────────────────────────────────────────────────────────

    /// GET /api/profile
    pub async fn get_profile(&self, token: &str) -> Result<PerfilResponse> {
        let response = self
            .client
            .get(self.url("/api/profile"))
            .headers(self.headers(Some(token))?)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// PUT /api/profile. The backend answers with plain text.
    pub async fn update_profile(&self, token: &str, perfil: &Perfil) -> Result<String> {
        let response = self
            .client
            .put(self.url("/api/profile"))
            .headers(self.headers(Some(token))?)
            .json(perfil)
            .send()
            .await?;

        Self::read_body(response).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Readings
    // ─────────────────────────────────────────────────────────────────────────

    /// GET /api/sensores/me
    pub async fn list_my_readings(&self, token: &str) -> Result<Vec<LecturaSensor>> {
        let response = self
            .client
            .get(self.url("/api/sensores/me"))
            .headers(self.headers(Some(token))?)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// GET /api/sensores/todas (no authentication)
    pub async fn list_all_readings(&self) -> Result<Vec<LecturaSensor>> {
        let response = self
            .client
            .get(self.url("/api/sensores/todas"))
            .headers(self.headers(None)?)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// POST /api/sensores/registrar. The backend answers with plain text.
    pub async fn register_reading(&self, token: &str, request: &LecturaRequest<'_>) -> Result<String> {
        debug!("Registering reading for user {}", request.usuario_id);
        let response = self
            .client
            .post(self.url("/api/sensores/registrar"))
            .headers(self.headers(Some(token))?)
            .json(request)
            .send()
            .await?;

        Self::read_body(response).await
    }
}

#[async_trait]
impl NutritionApi for SmartBiteClient {
    async fn login(&self, email: &str, password: &str) -> smartbite_core::Result<AuthGrant> {
        let response = SmartBiteClient::login(self, email, password).await?;
        Ok(response.into())
    }

    async fn register(&self, registration: &Registration) -> smartbite_core::Result<AuthGrant> {
        let response = SmartBiteClient::register(self, registration).await?;
        Ok(response.into())
    }

    async fn get_profile(&self, token: &str) -> smartbite_core::Result<Profile> {
        let response = SmartBiteClient::get_profile(self, token).await?;
        Ok(response.into())
    }

    async fn update_profile(&self, token: &str, profile: &Profile) -> smartbite_core::Result<String> {
        Ok(SmartBiteClient::update_profile(self, token, &Perfil::from(profile)).await?)
    }

    async fn list_my_readings(&self, token: &str) -> smartbite_core::Result<Vec<Reading>> {
        let raw = SmartBiteClient::list_my_readings(self, token).await?;
        Ok(raw.into_iter().map(Reading::from).collect())
    }

    async fn list_all_readings(&self) -> smartbite_core::Result<Vec<Reading>> {
        let raw = SmartBiteClient::list_all_readings(self).await?;
        Ok(raw.into_iter().map(Reading::from).collect())
    }

    async fn register_reading(
        &self,
        token: &str,
        reading: &NewReading,
    ) -> smartbite_core::Result<String> {
        Ok(SmartBiteClient::register_reading(self, token, &LecturaRequest::from(reading)).await?)
    }
}
