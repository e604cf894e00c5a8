//! Exercises `SmartBiteClient` against an in-process backend.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use smartbite_api::SmartBiteClient;
use smartbite_core::api::NutritionApi;
use smartbite_core::profile::Profile;
use smartbite_core::readings::{FoodPortion, NewReading};
use smartbite_core::session::Registration;
use smartbite_core::Error;

const TOKEN: &str = "token-7";

#[derive(Default)]
struct Backend {
    readings: Mutex<Vec<Value>>,
    profile: Mutex<Value>,
    last_registration: Mutex<Option<Value>>,
}

type Shared = Arc<Backend>;

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", TOKEN))
        .unwrap_or(false)
}

async fn login(Json(body): Json<Value>) -> impl IntoResponse {
    if body["correo"] == "a@b.com" && body["password"] == "x" {
        (StatusCode::OK, Json(json!({ "token": TOKEN, "userId": 7 }))).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, "Credenciales incorrectas").into_response()
    }
}

async fn registro(State(backend): State<Shared>, Json(body): Json<Value>) -> impl IntoResponse {
    if body["correo"] == "a@b.com" {
        return (StatusCode::CONFLICT, "Correo ya registrado").into_response();
    }
    *backend.last_registration.lock().unwrap() = Some(body);
    (StatusCode::OK, Json(json!({ "token": TOKEN, "userId": 8 }))).into_response()
}

async fn get_profile(State(backend): State<Shared>, headers: HeaderMap) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "Token inválido").into_response();
    }
    let perfil = backend.profile.lock().unwrap().clone();
    Json(json!({ "perfil": perfil })).into_response()
}

async fn put_profile(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "Token inválido").into_response();
    }
    *backend.profile.lock().unwrap() = body;
    (StatusCode::OK, "Perfil actualizado").into_response()
}

async fn my_readings(State(backend): State<Shared>, headers: HeaderMap) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "Token inválido").into_response();
    }
    Json(Value::Array(backend.readings.lock().unwrap().clone())).into_response()
}

async fn all_readings(State(backend): State<Shared>) -> impl IntoResponse {
    let mut all = backend.readings.lock().unwrap().clone();
    all.push(json!({
        "id_": 99,
        "usuario_id": "3",
        "peso_proteina": "10,5",
        "peso_carbohidrato": 20,
        "peso_vegetal": 5,
        "fecha_hora": "2025-03-01T10:00:00"
    }));
    Json(Value::Array(all))
}

async fn registrar(
    State(backend): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "Token inválido").into_response();
    }
    let mut readings = backend.readings.lock().unwrap();
    let mut stored = body;
    stored["id"] = json!(readings.len() as i64 + 1);
    stored["fechaHora"] = json!("2025-03-01T12:00:00");
    readings.push(stored);
    (StatusCode::OK, "Lectura registrada").into_response()
}

async fn spawn_backend() -> (SmartBiteClient, Shared) {
    let backend: Shared = Arc::new(Backend::default());
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/registro", post(registro))
        .route("/api/profile", get(get_profile).put(put_profile))
        .route("/api/sensores/me", get(my_readings))
        .route("/api/sensores/todas", get(all_readings))
        .route("/api/sensores/registrar", post(registrar))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = SmartBiteClient::new(&format!("http://{}", addr)).unwrap();
    (client, backend)
}

#[tokio::test]
async fn test_login_success_and_rejection() {
    let (client, _backend) = spawn_backend().await;
    let api: &dyn NutritionApi = &client;

    let grant = api.login("a@b.com", "x").await.unwrap();
    assert_eq!(grant.user_id, 7);
    assert_eq!(grant.token, TOKEN);

    let err = api.login("a@b.com", "nope").await.unwrap_err();
    assert_eq!(
        err,
        Error::Api {
            status: 401,
            message: "Credenciales incorrectas".to_string()
        }
    );
}

#[tokio::test]
async fn test_register_sends_role_and_reports_conflict() {
    let (client, backend) = spawn_backend().await;
    let api: &dyn NutritionApi = &client;

    let registration = Registration {
        name: "Ana".to_string(),
        email: "ana@b.com".to_string(),
        password: "x".to_string(),
        role: "USER".to_string(),
    };
    let grant = api.register(&registration).await.unwrap();
    assert_eq!(grant.user_id, 8);
    let sent = backend.last_registration.lock().unwrap().clone().unwrap();
    assert_eq!(sent["nombre"], "Ana");
    assert_eq!(sent["rol"], "USER");

    let taken = Registration {
        email: "a@b.com".to_string(),
        ..registration
    };
    let err = api.register(&taken).await.unwrap_err();
    assert!(err.is_client_error());
}

#[tokio::test]
async fn test_register_then_list_readings() {
    let (client, _backend) = spawn_backend().await;
    let api: &dyn NutritionApi = &client;

    let new_reading = NewReading {
        user_id: 7,
        protein: FoodPortion::new("pollo", 50.0),
        carbohydrate: FoodPortion::new("arroz", 80.0),
        vegetable: FoodPortion::new("brocoli", 30.0),
    };
    let message = api.register_reading(TOKEN, &new_reading).await.unwrap();
    assert_eq!(message, "Lectura registrada");

    let readings = api.list_my_readings(TOKEN).await.unwrap();
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].id, 1);
    assert_eq!(readings[0].user_id, 7);
    assert_eq!(readings[0].protein, FoodPortion::new("pollo", 50.0));
    assert_eq!(readings[0].recorded_at, "2025-03-01T12:00:00");
}

#[tokio::test]
async fn test_list_all_readings_accepts_snake_case() {
    let (client, _backend) = spawn_backend().await;

    let readings = client.list_all_readings().await.unwrap();
    let api_readings = NutritionApi::list_all_readings(&client).await.unwrap();
    assert_eq!(readings.len(), 1);

    let reading = &api_readings[0];
    assert_eq!(reading.id, 99);
    assert_eq!(reading.user_id, 3);
    assert_eq!(reading.protein.grams, 10.5);
    assert_eq!(reading.carbohydrate.grams, 20.0);
}

#[tokio::test]
async fn test_bad_token_is_client_error() {
    let (client, _backend) = spawn_backend().await;
    let api: &dyn NutritionApi = &client;

    let err = api.list_my_readings("other").await.unwrap_err();
    assert!(err.is_client_error());
    assert!(err.to_string().contains("Token inválido"));
}

#[tokio::test]
async fn test_profile_update_then_fetch() {
    let (client, _backend) = spawn_backend().await;
    let api: &dyn NutritionApi = &client;

    let profile = Profile {
        weight_kg: Some(72.5),
        height_cm: Some(168.0),
        age: Some(41),
        gender: Some("F".to_string()),
    };
    let message = api.update_profile(TOKEN, &profile).await.unwrap();
    assert_eq!(message, "Perfil actualizado");

    let fetched = api.get_profile(TOKEN).await.unwrap();
    assert_eq!(fetched, profile);
}

#[tokio::test]
async fn test_unreachable_backend_is_http_error() {
    let client = SmartBiteClient::new("http://127.0.0.1:9").unwrap();
    let api: &dyn NutritionApi = &client;
    let err = api.list_all_readings().await.unwrap_err();
    assert!(matches!(err, Error::Http(_)));
}
