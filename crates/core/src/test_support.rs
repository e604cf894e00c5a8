//! In-memory backend used by the unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::api::NutritionApi;
use crate::errors::{Error, Result};
use crate::profile::Profile;
use crate::readings::{FoodPortion, NewReading, Reading};
use crate::session::{AuthGrant, Registration};

pub const TEST_EMAIL: &str = "a@b.com";
pub const TEST_PASSWORD: &str = "x";
pub const TEST_USER_ID: i64 = 7;
pub const TEST_TOKEN: &str = "token-7";

pub fn reading(id: i64, recorded_at: &str, grams: (f64, f64, f64)) -> Reading {
    Reading {
        id,
        user_id: TEST_USER_ID,
        protein: FoodPortion::new("pollo", grams.0),
        carbohydrate: FoodPortion::new("arroz", grams.1),
        vegetable: FoodPortion::new("brocoli", grams.2),
        recorded_at: recorded_at.to_string(),
    }
}

#[derive(Default)]
pub struct MockNutritionApi {
    readings: Mutex<Vec<Reading>>,
    all_readings: Mutex<Vec<Reading>>,
    profile: Mutex<Profile>,
    scripted_lists: Mutex<VecDeque<(Duration, Result<Vec<Reading>>)>>,
    fail_register: AtomicBool,
    register_delay: Mutex<Duration>,
    pub login_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub register_calls: AtomicUsize,
    pub profile_updates: AtomicUsize,
}

impl MockNutritionApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_readings(readings: Vec<Reading>) -> Self {
        let api = Self::new();
        *api.readings.lock().unwrap() = readings;
        api
    }

    pub fn set_all_readings(&self, readings: Vec<Reading>) {
        *self.all_readings.lock().unwrap() = readings;
    }

    pub fn set_profile(&self, profile: Profile) {
        *self.profile.lock().unwrap() = profile;
    }

    /// Queue a canned response for the next list call, returned after `delay`.
    pub fn script_list(&self, delay: Duration, response: Result<Vec<Reading>>) {
        self.scripted_lists
            .lock()
            .unwrap()
            .push_back((delay, response));
    }

    pub fn fail_next_registrations(&self, fail: bool) {
        self.fail_register.store(fail, Ordering::SeqCst);
    }

    /// Hold every registration for `delay` before it is stored.
    pub fn delay_registrations(&self, delay: Duration) {
        *self.register_delay.lock().unwrap() = delay;
    }

    pub fn stored_readings(&self) -> Vec<Reading> {
        self.readings.lock().unwrap().clone()
    }

    fn check_token(token: &str) -> Result<()> {
        if token == TEST_TOKEN {
            Ok(())
        } else {
            Err(Error::api(401, "Token inválido"))
        }
    }
}

#[async_trait]
impl NutritionApi for MockNutritionApi {
    async fn login(&self, email: &str, password: &str) -> Result<AuthGrant> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        if email == TEST_EMAIL && password == TEST_PASSWORD {
            Ok(AuthGrant {
                token: TEST_TOKEN.to_string(),
                user_id: TEST_USER_ID,
            })
        } else {
            Err(Error::api(401, "Credenciales incorrectas"))
        }
    }

    async fn register(&self, registration: &Registration) -> Result<AuthGrant> {
        if registration.email == TEST_EMAIL {
            return Err(Error::api(409, "Correo ya registrado"));
        }
        Ok(AuthGrant {
            token: TEST_TOKEN.to_string(),
            user_id: TEST_USER_ID,
        })
    }

    async fn get_profile(&self, token: &str) -> Result<Profile> {
        Self::check_token(token)?;
        Ok(self.profile.lock().unwrap().clone())
    }

    async fn update_profile(&self, token: &str, profile: &Profile) -> Result<String> {
        Self::check_token(token)?;
        self.profile_updates.fetch_add(1, Ordering::SeqCst);
        *self.profile.lock().unwrap() = profile.clone();
        Ok("Perfil actualizado".to_string())
    }

    async fn list_my_readings(&self, token: &str) -> Result<Vec<Reading>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Self::check_token(token)?;

        let scripted = self.scripted_lists.lock().unwrap().pop_front();
        if let Some((delay, response)) = scripted {
            tokio::time::sleep(delay).await;
            return response;
        }
        Ok(self.readings.lock().unwrap().clone())
    }

    async fn list_all_readings(&self) -> Result<Vec<Reading>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.all_readings.lock().unwrap().clone())
    }

    async fn register_reading(&self, token: &str, new_reading: &NewReading) -> Result<String> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        Self::check_token(token)?;
        let delay = *self.register_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_register.load(Ordering::SeqCst) {
            return Err(Error::api(500, "Error interno"));
        }

        let mut readings = self.readings.lock().unwrap();
        let id = readings.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let recorded_at = chrono::Local::now()
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string();
        readings.push(Reading {
            id,
            user_id: new_reading.user_id,
            protein: new_reading.protein.clone(),
            carbohydrate: new_reading.carbohydrate.clone(),
            vegetable: new_reading.vegetable.clone(),
            recorded_at,
        });
        Ok("Lectura registrada".to_string())
    }
}
