use log::{debug, info, warn};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::api::NutritionApi;
use crate::constants::DEFAULT_POLL_INTERVAL_SECS;
use crate::errors::Result;
use crate::events::DomainEventSink;
use crate::goals::{progress_against, CachedGoal, DailyGoal, GoalProgress, GoalService, Objective};
use crate::live_sample::{LiveSample, LiveSampleBuffer};
use crate::preferences::PreferenceStore;
use crate::profile::{Profile, ProfileService};
use crate::readings::{FoodNames, NutrientTotals, Reading, ReadingStore};
use crate::session::{AuthService, Session, SessionContext};

/// Runtime policy knobs for [`NutritionTracker`].
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Interval of the refresh polling fallback.
    pub poll_interval: Duration,
    /// Reset the live sample to zero after a successful save. Off by default:
    /// the plate keeps reporting what is physically on it.
    pub clear_sample_after_commit: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            clear_sample_after_commit: false,
        }
    }
}

/// Today's totals, the cached goal and the resulting progress.
#[derive(Debug, Clone, PartialEq)]
pub struct TodaySummary {
    pub totals: NutrientTotals,
    pub goal: DailyGoal,
    pub objective: Objective,
    pub progress: GoalProgress,
}

/// Facade a presentation layer drives: session lifecycle, readings, the
/// live plate sample and goal progress, all sharing one event sink.
pub struct NutritionTracker {
    config: TrackerConfig,
    session: Arc<SessionContext>,
    auth: AuthService,
    store: Arc<ReadingStore>,
    buffer: Arc<LiveSampleBuffer>,
    goals: GoalService,
    profiles: ProfileService,
    draft_names: RwLock<FoodNames>,
}

impl NutritionTracker {
    pub fn new(
        api: Arc<dyn NutritionApi>,
        preferences: Arc<dyn PreferenceStore>,
        event_sink: Arc<dyn DomainEventSink>,
        config: TrackerConfig,
    ) -> Self {
        let session = Arc::new(SessionContext::new(event_sink.clone()));
        Self {
            config,
            auth: AuthService::new(api.clone(), session.clone(), preferences.clone()),
            session,
            store: Arc::new(ReadingStore::new(api.clone(), event_sink.clone())),
            buffer: Arc::new(LiveSampleBuffer::new(event_sink.clone())),
            goals: GoalService::new(preferences, event_sink),
            profiles: ProfileService::new(api),
            draft_names: RwLock::new(FoodNames::default()),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn store(&self) -> &Arc<ReadingStore> {
        &self.store
    }

    pub fn live_sample(&self) -> &Arc<LiveSampleBuffer> {
        &self.buffer
    }

    pub fn goals(&self) -> &GoalService {
        &self.goals
    }

    // ─────────────────────────────────────────────────────────────────────
    // Session lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Authenticate, then drop the previous user's state. A failed attempt
    /// leaves the current session and its data untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.auth.login(email, password).await?;
        self.reset_user_state();
        Ok(session)
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Option<&str>,
    ) -> Result<Session> {
        let session = self.auth.register(name, email, password, role).await?;
        self.reset_user_state();
        Ok(session)
    }

    /// Re-establish the persisted session from a previous run, if any.
    pub fn restore_session(&self) -> Result<Option<Session>> {
        self.auth.restore()
    }

    /// Invalidate the session and drop every piece of per-user state so the
    /// next user never sees it.
    pub fn logout(&self) -> Result<()> {
        let result = self.auth.logout();
        self.reset_user_state();
        info!("Logged out");
        result
    }

    fn reset_user_state(&self) {
        self.store.clear();
        self.buffer.clear();
        self.set_food_names(FoodNames::default());
    }

    // ─────────────────────────────────────────────────────────────────────
    // Readings
    // ─────────────────────────────────────────────────────────────────────

    pub async fn refresh(&self) -> Result<usize> {
        let session = self.session.require()?;
        self.store.refresh(&session).await
    }

    /// Food names the user has typed for the next save.
    pub fn set_food_names(&self, names: FoodNames) {
        match self.draft_names.write() {
            Ok(mut draft) => *draft = names,
            Err(poisoned) => *poisoned.into_inner() = names,
        }
    }

    pub fn food_names(&self) -> FoodNames {
        match self.draft_names.read() {
            Ok(draft) => draft.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Save the current live sample under the draft food names, then
    /// refresh so the new reading is visible.
    ///
    /// The draft names are cleared after a successful save; the live sample
    /// is cleared only when `clear_sample_after_commit` is set. If the user
    /// logs out while the save is in flight, the refresh is skipped and the
    /// next user's state is left alone.
    pub async fn save_reading(&self) -> Result<String> {
        let session = self.session.require()?;
        let names = self.food_names();
        let sample = self.buffer.current();
        let epoch = self.store.epoch();

        let message = self.store.commit(&session, &names, &sample).await?;

        if self.store.epoch() != epoch {
            info!("Session ended while saving; skipping refresh");
            return Ok(message);
        }

        self.set_food_names(FoodNames::default());
        if self.config.clear_sample_after_commit {
            self.buffer.clear();
        }

        if let Err(e) = self.store.refresh_since(&session, epoch).await {
            // The reading is saved; the next poll will pick it up.
            warn!("Refresh after save failed: {}", e);
        }
        Ok(message)
    }

    /// Apply a raw telemetry payload to the live sample.
    pub fn ingest_payload(&self, payload: &[u8]) -> Result<LiveSample> {
        self.buffer.apply_payload(payload)
    }

    pub fn latest_readings(&self, n: usize) -> Vec<Reading> {
        self.store.latest(n)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Goals and profile
    // ─────────────────────────────────────────────────────────────────────

    /// Today's totals against the cached goal of the session user.
    pub fn today_summary(&self) -> Result<TodaySummary> {
        let session = self.session.require()?;
        let CachedGoal { objective, goal } = self.goals.load(session.user_id())?;
        let totals = self.store.today_aggregate();
        Ok(TodaySummary {
            totals,
            goal,
            objective,
            progress: progress_against(&totals, &goal),
        })
    }

    pub fn today_progress(&self) -> Result<GoalProgress> {
        self.today_summary().map(|s| s.progress)
    }

    pub fn set_objective(&self, objective: Objective) -> Result<()> {
        let session = self.session.require()?;
        self.goals.set_objective(session.user_id(), objective)
    }

    /// Recompute the goal from an explicit body weight.
    pub fn recompute_goal(&self, weight_kg: f64) -> Result<DailyGoal> {
        let session = self.session.require()?;
        self.goals.recompute(session.user_id(), weight_kg)
    }

    pub async fn profile(&self) -> Result<Profile> {
        let session = self.session.require()?;
        self.profiles.get_profile(&session).await
    }

    /// Save the profile and, when it carries a usable weight, recompute the
    /// cached goal from it.
    pub async fn update_profile(&self, profile: &Profile) -> Result<Profile> {
        let session = self.session.require()?;
        let stored = self.profiles.update_profile(&session, profile).await?;
        if let Some(weight) = stored.usable_weight() {
            self.goals.recompute(session.user_id(), weight)?;
        }
        Ok(stored)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Polling fallback
    // ─────────────────────────────────────────────────────────────────────

    /// Refresh on a fixed interval while a session is active. Ticks that
    /// find no session, or a refresh still running, are skipped.
    pub fn spawn_polling(self: &Arc<Self>) -> JoinHandle<()> {
        let tracker = Arc::clone(self);
        let period = self.config.poll_interval;
        tokio::spawn(async move {
            info!("Reading poller started ({:?} interval)", period);
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                tracker.poll_once().await;
            }
        })
    }

    async fn poll_once(&self) {
        let Some(session) = self.session.current() else {
            debug!("Poll skipped: no active session");
            return;
        };
        match self.store.refresh_if_idle(&session).await {
            Ok(Some(count)) => debug!("Poll refreshed {} readings", count),
            Ok(None) => {}
            Err(e) => debug!("Poll refresh failed: {}", e),
        }
    }
}
