use std::sync::Arc;

use anyhow::Context;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use smartbite_api::SmartBiteClient;
use smartbite_core::events::{BroadcastEventSink, DomainEvent};
use smartbite_core::preferences::FilePreferenceStore;
use smartbite_core::session::Session;
use smartbite_core::{NutritionTracker, TrackerConfig};
use smartbite_telemetry::{MqttSettings, MqttTransport, QoS, TelemetryLink};

use crate::config::{Config, MqttConfig};

pub struct AppState {
    pub tracker: Arc<NutritionTracker>,
    pub events: BroadcastEventSink,
}

pub fn init_tracing() {
    let log_format = std::env::var("SMARTBITE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let api = SmartBiteClient::new(&config.api_url).context("Failed to build HTTP client")?;
    tracing::info!("Backend: {}", api.base_url());
    tracing::info!("Preferences file: {}", config.prefs_path.display());

    let preferences = FilePreferenceStore::new(config.prefs_path.clone());
    let events = BroadcastEventSink::new();
    let tracker = NutritionTracker::new(
        Arc::new(api),
        Arc::new(preferences),
        Arc::new(events.clone()),
        TrackerConfig {
            poll_interval: config.poll_interval,
            clear_sample_after_commit: config.clear_sample_after_commit,
        },
    );

    Ok(Arc::new(AppState {
        tracker: Arc::new(tracker),
        events,
    }))
}

/// Reuse the persisted session, or log in with the configured credentials.
pub async fn authenticate(state: &AppState, config: &Config) -> anyhow::Result<Session> {
    if let Some(session) = state.tracker.restore_session()? {
        tracing::info!("Restored session for user {}", session.user_id());
        return Ok(session);
    }

    match (&config.email, &config.password) {
        (Some(email), Some(password)) => Ok(state.tracker.login(email, password).await?),
        _ => anyhow::bail!(
            "No stored session; set SMARTBITE_EMAIL and SMARTBITE_PASSWORD to log in"
        ),
    }
}

/// Connect to the broker and route plate samples into the live buffer.
///
/// A failed connection is logged and leaves the monitor on REST polling.
pub async fn start_telemetry(state: &AppState, mqtt: &MqttConfig) -> anyhow::Result<TelemetryLink> {
    let mut settings = MqttSettings::new(mqtt.host.clone(), mqtt.port);
    if let (Some(username), Some(password)) = (&mqtt.username, &mqtt.password) {
        settings = settings.with_credentials(username.clone(), password.clone());
    }
    let link = TelemetryLink::new(Arc::new(MqttTransport::new(settings)));

    let tracker = Arc::clone(&state.tracker);
    link.subscribe(&mqtt.topic, QoS::AtLeastOnce, move |_topic: &str, payload: &[u8]| {
        tracker.ingest_payload(payload)?;
        Ok(())
    })
    .await?;

    if let Err(e) = link.connect().await {
        tracing::warn!("Live samples unavailable, continuing with polling only: {}", e);
    }
    Ok(link)
}

/// Log domain events and today's progress as they happen.
pub fn spawn_event_logger(state: &Arc<AppState>) -> JoinHandle<()> {
    let mut events = state.events.subscribe();
    let state = Arc::clone(state);
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => log_event(&state, &event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("Event logger skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn log_event(state: &AppState, event: &DomainEvent) {
    if event.is_failure() {
        tracing::warn!(event = %serde_json::to_string(event).unwrap_or_default(), "domain event");
    } else {
        tracing::debug!(event = %serde_json::to_string(event).unwrap_or_default(), "domain event");
    }

    match event {
        DomainEvent::ReadingsRefreshed { count } => match state.tracker.today_summary() {
            Ok(summary) => tracing::info!(
                "{} readings; today {:.0}/{} g protein, {:.0}/{} g carbohydrate, {:.0}/{} g vegetable ({})",
                count,
                summary.totals.protein,
                summary.goal.protein_g,
                summary.totals.carbohydrate,
                summary.goal.carbohydrate_g,
                summary.totals.vegetable,
                summary.goal.vegetable_g,
                summary.objective.as_key(),
            ),
            Err(e) => tracing::debug!("No summary: {}", e),
        },
        DomainEvent::LiveSampleUpdated { sample } => tracing::info!(
            "Plate: {:.1} g protein, {:.1} g carbohydrate, {:.1} g vegetable",
            sample.protein,
            sample.carbohydrate,
            sample.vegetable
        ),
        _ => {}
    }
}
