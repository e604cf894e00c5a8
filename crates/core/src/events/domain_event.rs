//! Domain event types.

use serde::{Deserialize, Serialize};

use crate::goals::{DailyGoal, Objective};
use crate::live_sample::LiveSample;

/// Domain events emitted by core components after state changes.
///
/// Presentation layers observe these instead of polling every accessor.
/// Failures are emitted as events too, so a view can surface the message
/// without the operation having to bubble up an error.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A session was established (login, registration or restore).
    SessionEstablished { user_id: i64 },

    /// The session was cleared on logout.
    SessionCleared,

    /// The reading store contents were replaced by a fetch.
    ReadingsRefreshed { count: usize },

    /// A fetch failed; the previous contents are still in place.
    RefreshFailed { message: String },

    /// The reading store was emptied (logout).
    ReadingsCleared,

    /// The backend accepted a new reading.
    ReadingCommitted { user_id: i64, message: String },

    /// Saving a reading failed.
    CommitFailed { message: String },

    /// The plate reported a new weight triple.
    LiveSampleUpdated { sample: LiveSample },

    /// An inbound telemetry payload could not be applied.
    TelemetryPayloadRejected { message: String },

    /// Daily goals were recomputed and cached for a user.
    GoalRecomputed {
        user_id: i64,
        objective: Objective,
        goal: DailyGoal,
    },
}

impl DomainEvent {
    pub fn refresh_failed(message: impl Into<String>) -> Self {
        Self::RefreshFailed {
            message: message.into(),
        }
    }

    pub fn commit_failed(message: impl Into<String>) -> Self {
        Self::CommitFailed {
            message: message.into(),
        }
    }

    pub fn payload_rejected(message: impl Into<String>) -> Self {
        Self::TelemetryPayloadRejected {
            message: message.into(),
        }
    }

    /// Whether this event reports a failure the user should see.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            DomainEvent::RefreshFailed { .. }
                | DomainEvent::CommitFailed { .. }
                | DomainEvent::TelemetryPayloadRejected { .. }
        )
    }
}
