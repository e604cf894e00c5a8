//! Wire types for the SmartBite REST API.
//!
//! Field names follow the backend's Spanish JSON contract; conversions into
//! the `smartbite-core` domain types live next to each DTO.

use serde::{Deserialize, Serialize};
use smartbite_core::profile::Profile;
use smartbite_core::readings::{FoodPortion, NewReading, Reading};
use smartbite_core::session::{AuthGrant, Registration};

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

/// POST /api/auth/login
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub correo: &'a str,
    pub password: &'a str,
}

/// POST /api/auth/registro
#[derive(Debug, Clone, Serialize)]
pub struct RegistroRequest<'a> {
    pub nombre: &'a str,
    pub correo: &'a str,
    pub password: &'a str,
    pub rol: &'a str,
}

impl<'a> From<&'a Registration> for RegistroRequest<'a> {
    fn from(registration: &'a Registration) -> Self {
        Self {
            nombre: &registration.name,
            correo: &registration.email,
            password: &registration.password,
            rol: &registration.role,
        }
    }
}

/// Response of both login and registration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(rename = "userId", alias = "usuarioId", alias = "user_id")]
    pub user_id: i64,
}

impl From<LoginResponse> for AuthGrant {
    fn from(response: LoginResponse) -> Self {
        AuthGrant {
            token: response.token,
            user_id: response.user_id,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Profile
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Perfil {
    #[serde(default)]
    pub peso: Option<f64>,
    #[serde(default)]
    pub altura: Option<f64>,
    #[serde(default)]
    pub edad: Option<i32>,
    #[serde(default)]
    pub genero: Option<String>,
}

/// GET /api/profile returns either `{perfil: {...}}` or the bare profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PerfilResponse {
    Wrapped { perfil: Perfil },
    Flat(Perfil),
}

impl From<PerfilResponse> for Profile {
    fn from(response: PerfilResponse) -> Self {
        let perfil = match response {
            PerfilResponse::Wrapped { perfil } => perfil,
            PerfilResponse::Flat(perfil) => perfil,
        };
        Profile {
            weight_kg: perfil.peso,
            height_cm: perfil.altura,
            age: perfil.edad,
            gender: perfil.genero,
        }
    }
}

impl From<&Profile> for Perfil {
    fn from(profile: &Profile) -> Self {
        Self {
            peso: profile.weight_kg,
            altura: profile.height_cm,
            edad: profile.age,
            genero: profile.gender.clone(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Readings
// ─────────────────────────────────────────────────────────────────────────────

/// A numeric field the backend may send as a JSON number or as text,
/// possibly with a decimal comma.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LenientNumber {
    Number(f64),
    Text(String),
}

impl LenientNumber {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            LenientNumber::Number(n) => Some(*n),
            LenientNumber::Text(s) => s.trim().replace(',', ".").parse().ok(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_f64().map(|n| n as i64)
    }
}

/// A reading as listed by `/api/sensores/*`. Accepts camelCase and
/// snake_case keys; missing numbers decode as zero and missing names as
/// empty strings.
#[derive(Debug, Clone, Deserialize)]
pub struct LecturaSensor {
    #[serde(default, alias = "id_")]
    pub id: Option<LenientNumber>,
    #[serde(
        default,
        rename = "usuarioId",
        alias = "usuario_id",
        alias = "usuario_id_"
    )]
    pub usuario_id: Option<LenientNumber>,
    #[serde(default, rename = "nombreProteina", alias = "nombre_proteina")]
    pub nombre_proteina: Option<String>,
    #[serde(
        default,
        rename = "pesoProteina",
        alias = "peso_proteina",
        alias = "peso_proteinas"
    )]
    pub peso_proteina: Option<LenientNumber>,
    #[serde(default, rename = "nombreCarbohidrato", alias = "nombre_carbohidrato")]
    pub nombre_carbohidrato: Option<String>,
    #[serde(
        default,
        rename = "pesoCarbohidrato",
        alias = "peso_carbohidrato",
        alias = "peso_carbo"
    )]
    pub peso_carbohidrato: Option<LenientNumber>,
    #[serde(default, rename = "nombreVegetal", alias = "nombre_vegetal")]
    pub nombre_vegetal: Option<String>,
    #[serde(
        default,
        rename = "pesoVegetal",
        alias = "peso_vegetal",
        alias = "peso_veg"
    )]
    pub peso_vegetal: Option<LenientNumber>,
    #[serde(
        default,
        rename = "fechaHora",
        alias = "fecha_hora",
        alias = "fecha_hh"
    )]
    pub fecha_hora: Option<String>,
}

fn number_or_zero(value: &Option<LenientNumber>) -> f64 {
    value.as_ref().and_then(LenientNumber::as_f64).unwrap_or(0.0)
}

impl From<LecturaSensor> for Reading {
    fn from(raw: LecturaSensor) -> Self {
        Reading {
            id: raw.id.as_ref().and_then(LenientNumber::as_i64).unwrap_or(0),
            user_id: raw
                .usuario_id
                .as_ref()
                .and_then(LenientNumber::as_i64)
                .unwrap_or(0),
            protein: FoodPortion::new(
                raw.nombre_proteina.clone().unwrap_or_default(),
                number_or_zero(&raw.peso_proteina),
            ),
            carbohydrate: FoodPortion::new(
                raw.nombre_carbohidrato.clone().unwrap_or_default(),
                number_or_zero(&raw.peso_carbohidrato),
            ),
            vegetable: FoodPortion::new(
                raw.nombre_vegetal.clone().unwrap_or_default(),
                number_or_zero(&raw.peso_vegetal),
            ),
            recorded_at: raw.fecha_hora.unwrap_or_default(),
        }
    }
}

/// POST /api/sensores/registrar
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LecturaRequest<'a> {
    pub nombre_proteina: &'a str,
    pub peso_proteina: f64,
    pub nombre_carbohidrato: &'a str,
    pub peso_carbohidrato: f64,
    pub nombre_vegetal: &'a str,
    pub peso_vegetal: f64,
    pub usuario_id: i64,
}

impl<'a> From<&'a NewReading> for LecturaRequest<'a> {
    fn from(reading: &'a NewReading) -> Self {
        Self {
            nombre_proteina: &reading.protein.name,
            peso_proteina: reading.protein.grams,
            nombre_carbohidrato: &reading.carbohydrate.name,
            peso_carbohidrato: reading.carbohydrate.grams,
            nombre_vegetal: &reading.vegetable.name,
            peso_vegetal: reading.vegetable.grams,
            usuario_id: reading.user_id,
        }
    }
}
