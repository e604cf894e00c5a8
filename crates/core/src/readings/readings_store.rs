use chrono::NaiveDate;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use super::readings_model::{FoodNames, NewReading, NutrientTotals, Reading, ReadingScope};
use crate::api::NutritionApi;
use crate::errors::{Error, Result};
use crate::events::{DomainEvent, DomainEventSink};
use crate::live_sample::LiveSample;
use crate::session::Session;
use crate::utils::time_utils::{iso_date, local_today};

/// Decrements the in-flight counter when a refresh ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory mirror of the backend's reading history for one scope.
///
/// Contents only change through [`ReadingStore::refresh`] (wholesale
/// replacement) and [`ReadingStore::clear`]. A committed reading becomes
/// visible after the next refresh.
pub struct ReadingStore {
    api: Arc<dyn NutritionApi>,
    scope: ReadingScope,
    readings: RwLock<Vec<Reading>>,
    last_error: RwLock<Option<String>>,
    in_flight: AtomicUsize,
    /// Bumped by `clear()`; a refresh started before a clear is discarded.
    epoch: AtomicU64,
    event_sink: Arc<dyn DomainEventSink>,
}

impl ReadingStore {
    pub fn new(api: Arc<dyn NutritionApi>, event_sink: Arc<dyn DomainEventSink>) -> Self {
        Self::with_scope(api, ReadingScope::Own, event_sink)
    }

    pub fn with_scope(
        api: Arc<dyn NutritionApi>,
        scope: ReadingScope,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            api,
            scope,
            readings: RwLock::new(Vec::new()),
            last_error: RwLock::new(None),
            in_flight: AtomicUsize::new(0),
            epoch: AtomicU64::new(0),
            event_sink,
        }
    }

    pub fn scope(&self) -> ReadingScope {
        self.scope
    }

    /// Fetch the full list and replace the store contents.
    ///
    /// Overlapping calls are not ordered: whichever completes last wins. On
    /// failure the previous contents stay visible and the error is recorded
    /// in [`ReadingStore::last_error`].
    pub async fn refresh(&self, session: &Session) -> Result<usize> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);
        self.refresh_tracked(session, self.epoch()).await
    }

    /// Like [`ReadingStore::refresh`], but only if the store has not been
    /// cleared since `epoch` was read from [`ReadingStore::epoch`]. Fails
    /// with a `Session` error, without fetching, when it has.
    pub async fn refresh_since(&self, session: &Session, epoch: u64) -> Result<usize> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);
        self.refresh_tracked(session, epoch).await
    }

    /// Like [`ReadingStore::refresh`], but returns `Ok(None)` without
    /// fetching when another refresh is still running. Suited to polling.
    pub async fn refresh_if_idle(&self, session: &Session) -> Result<Option<usize>> {
        if self
            .in_flight
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Refresh already in flight, skipping");
            return Ok(None);
        }
        let _guard = InFlightGuard(&self.in_flight);
        self.refresh_tracked(session, self.epoch()).await.map(Some)
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Number of times the store has been cleared.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    async fn refresh_tracked(&self, session: &Session, epoch: u64) -> Result<usize> {
        if self.epoch() != epoch {
            debug!("Store was cleared before the refresh started, skipping");
            return Err(Error::session("Session ended before refresh"));
        }

        let fetched = match self.scope {
            ReadingScope::Own => {
                session.ensure_valid()?;
                self.api.list_my_readings(session.token()).await
            }
            ReadingScope::AllUsers => self.api.list_all_readings().await,
        };

        if self.epoch() != epoch {
            debug!("Store was cleared while a refresh was in flight, discarding result");
            return Err(Error::session("Session ended during refresh"));
        }

        match fetched {
            Ok(readings) => {
                let readings = sanitize(readings);
                let count = readings.len();
                self.replace(readings);
                self.set_last_error(None);
                debug!("Refreshed {:?} readings: {}", self.scope, count);
                self.event_sink
                    .emit(DomainEvent::ReadingsRefreshed { count });
                Ok(count)
            }
            Err(e) => {
                let message = e.to_string();
                warn!("Failed to refresh readings: {}", message);
                self.set_last_error(Some(message.clone()));
                self.event_sink
                    .emit(DomainEvent::refresh_failed(message.clone()));
                Err(Error::Refresh(message))
            }
        }
    }

    /// Register a new reading built from the live sample and food names.
    ///
    /// Fails with a `Session` error, without any network call, when the
    /// session is unusable. On success the store is not modified; call
    /// [`ReadingStore::refresh`] to observe the new reading.
    pub async fn commit(
        &self,
        session: &Session,
        names: &FoodNames,
        sample: &LiveSample,
    ) -> Result<String> {
        session.ensure_valid()?;

        for grams in [sample.protein, sample.carbohydrate, sample.vegetable] {
            if !grams.is_finite() || grams < 0.0 {
                return Err(Error::validation(format!(
                    "Weights must be non-negative, got {:?}",
                    sample
                )));
            }
        }

        let request = NewReading::from_sample(session.user_id(), names, sample);
        match self
            .api
            .register_reading(session.token(), &request)
            .await
        {
            Ok(message) => {
                info!(
                    "Reading registered for user {}: {}",
                    session.user_id(),
                    message
                );
                self.event_sink.emit(DomainEvent::ReadingCommitted {
                    user_id: session.user_id(),
                    message: message.clone(),
                });
                Ok(message)
            }
            Err(e) => {
                let message = e.to_string();
                warn!("Failed to register reading: {}", message);
                self.set_last_error(Some(message.clone()));
                self.event_sink
                    .emit(DomainEvent::commit_failed(message.clone()));
                Err(Error::Commit(message))
            }
        }
    }

    /// Totals of the readings taken today (local calendar date).
    pub fn today_aggregate(&self) -> NutrientTotals {
        self.aggregate_on(local_today())
    }

    /// Totals of the readings whose timestamp falls on `date`.
    pub fn aggregate_on(&self, date: NaiveDate) -> NutrientTotals {
        let prefix = iso_date(date);
        let readings = self.read_guard();
        readings
            .iter()
            .filter(|r| r.is_on(&prefix))
            .fold(NutrientTotals::default(), |mut totals, r| {
                totals.add(r);
                totals
            })
    }

    /// The `n` most recent readings, most recent first.
    pub fn latest(&self, n: usize) -> Vec<Reading> {
        let mut readings = self.readings();
        readings.sort_by(|a, b| {
            b.recorded_at
                .cmp(&a.recorded_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        readings.truncate(n);
        readings
    }

    /// Snapshot of the store contents in backend order.
    pub fn readings(&self) -> Vec<Reading> {
        self.read_guard().clone()
    }

    pub fn len(&self) -> usize {
        self.read_guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_guard().is_empty()
    }

    /// Message of the last failed refresh or commit, cleared by the next
    /// successful refresh.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().ok().and_then(|e| e.clone())
    }

    /// Drop all contents (logout). Refreshes already in flight are discarded.
    pub fn clear(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.replace(Vec::new());
        self.set_last_error(None);
        self.event_sink.emit(DomainEvent::ReadingsCleared);
    }

    fn read_guard(&self) -> std::sync::RwLockReadGuard<'_, Vec<Reading>> {
        match self.readings.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn replace(&self, readings: Vec<Reading>) {
        match self.readings.write() {
            Ok(mut guard) => *guard = readings,
            Err(poisoned) => *poisoned.into_inner() = readings,
        }
    }

    fn set_last_error(&self, message: Option<String>) {
        match self.last_error.write() {
            Ok(mut guard) => *guard = message,
            Err(poisoned) => *poisoned.into_inner() = message,
        }
    }
}

/// Drop duplicate ids (first occurrence wins) and readings with invalid
/// weights.
fn sanitize(readings: Vec<Reading>) -> Vec<Reading> {
    let mut seen = HashSet::with_capacity(readings.len());
    readings
        .into_iter()
        .filter(|r| {
            if !r.has_valid_weights() {
                warn!("Dropping reading {} with invalid weights", r.id);
                return false;
            }
            if !seen.insert(r.id) {
                warn!("Dropping duplicate reading id {}", r.id);
                return false;
            }
            true
        })
        .collect()
}
