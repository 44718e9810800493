use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{PatternId, Position, TrackingId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TrackingError {
    #[error("cannot {action} a session that is {from}")]
    InvalidTransition {
        from: TrackingStatus,
        action: &'static str,
    },

    #[error("last activity is before started_at")]
    InvalidTimeRange,

    #[error("completed session is missing completed_at")]
    MissingCompletedAt,
}

/// Lifecycle of a tracking session.
///
/// Owned by the session layer; the navigator never reads or writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingStatus {
    Active,
    Paused,
    Completed,
    Abandoned,
}

impl TrackingStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TrackingStatus::Active => "active",
            TrackingStatus::Paused => "paused",
            TrackingStatus::Completed => "completed",
            TrackingStatus::Abandoned => "abandoned",
        }
    }
}

impl std::fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user's walk through one pattern: the cursor plus its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingSession {
    id: TrackingId,
    pattern_id: PatternId,
    position: Position,
    status: TrackingStatus,
    started_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TrackingSession {
    /// A fresh, active session with the cursor at the start.
    #[must_use]
    pub fn start(id: TrackingId, pattern_id: PatternId, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            pattern_id,
            position: Position::start(),
            status: TrackingStatus::Active,
            started_at,
            last_activity_at: started_at,
            completed_at: None,
        }
    }

    /// Rehydrate a session from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::InvalidTimeRange` if any timestamp precedes
    /// `started_at`, or `TrackingError::MissingCompletedAt` for a completed
    /// session without a completion time.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: TrackingId,
        pattern_id: PatternId,
        position: Position,
        status: TrackingStatus,
        started_at: DateTime<Utc>,
        last_activity_at: DateTime<Utc>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Self, TrackingError> {
        if last_activity_at < started_at || completed_at.is_some_and(|at| at < started_at) {
            return Err(TrackingError::InvalidTimeRange);
        }
        if status == TrackingStatus::Completed && completed_at.is_none() {
            return Err(TrackingError::MissingCompletedAt);
        }

        Ok(Self {
            id,
            pattern_id,
            position,
            status,
            started_at,
            last_activity_at,
            completed_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> TrackingId {
        self.id
    }

    #[must_use]
    pub fn pattern_id(&self) -> PatternId {
        self.pattern_id
    }

    #[must_use]
    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn position_mut(&mut self) -> &mut Position {
        &mut self.position
    }

    #[must_use]
    pub fn status(&self) -> TrackingStatus {
        self.status
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.last_activity_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == TrackingStatus::Active
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == TrackingStatus::Completed
    }

    pub fn record_activity(&mut self, at: DateTime<Utc>) {
        self.last_activity_at = self.last_activity_at.max(at);
    }

    /// # Errors
    ///
    /// Returns `TrackingError::InvalidTransition` unless the session is active.
    pub fn pause(&mut self, at: DateTime<Utc>) -> Result<(), TrackingError> {
        self.transition(TrackingStatus::Active, TrackingStatus::Paused, "pause", at)
    }

    /// # Errors
    ///
    /// Returns `TrackingError::InvalidTransition` unless the session is paused.
    pub fn resume(&mut self, at: DateTime<Utc>) -> Result<(), TrackingError> {
        self.transition(TrackingStatus::Paused, TrackingStatus::Active, "resume", at)
    }

    /// Mark the pattern as finished.
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::InvalidTransition` unless the session is active.
    pub fn complete(&mut self, at: DateTime<Utc>) -> Result<(), TrackingError> {
        self.transition(TrackingStatus::Active, TrackingStatus::Completed, "complete", at)?;
        self.completed_at = Some(at);
        Ok(())
    }

    /// Undo a completion so the user can step back into the pattern.
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::InvalidTransition` unless the session is completed.
    pub fn reopen(&mut self, at: DateTime<Utc>) -> Result<(), TrackingError> {
        self.transition(TrackingStatus::Completed, TrackingStatus::Active, "reopen", at)?;
        self.completed_at = None;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `TrackingError::InvalidTransition` for completed or already
    /// abandoned sessions.
    pub fn abandon(&mut self, at: DateTime<Utc>) -> Result<(), TrackingError> {
        match self.status {
            TrackingStatus::Active | TrackingStatus::Paused => {
                self.status = TrackingStatus::Abandoned;
                self.record_activity(at);
                Ok(())
            }
            from => Err(TrackingError::InvalidTransition {
                from,
                action: "abandon",
            }),
        }
    }

    fn transition(
        &mut self,
        expected: TrackingStatus,
        to: TrackingStatus,
        action: &'static str,
        at: DateTime<Utc>,
    ) -> Result<(), TrackingError> {
        if self.status != expected {
            return Err(TrackingError::InvalidTransition {
                from: self.status,
                action,
            });
        }
        self.status = to;
        self.record_activity(at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn session() -> TrackingSession {
        TrackingSession::start(TrackingId::new(1), PatternId::new(1), fixed_now())
    }

    #[test]
    fn starts_active_at_zero() {
        let session = session();
        assert!(session.is_active());
        assert!(session.position().is_start());
        assert_eq!(session.last_activity_at(), fixed_now());
        assert_eq!(session.completed_at(), None);
    }

    #[test]
    fn pause_resume_round_trip() {
        let mut session = session();
        let later = fixed_now() + Duration::minutes(5);

        session.pause(later).unwrap();
        assert_eq!(session.status(), TrackingStatus::Paused);
        assert_eq!(session.last_activity_at(), later);

        let err = session.pause(later).unwrap_err();
        assert_eq!(
            err,
            TrackingError::InvalidTransition {
                from: TrackingStatus::Paused,
                action: "pause"
            }
        );

        session.resume(later).unwrap();
        assert!(session.is_active());
    }

    #[test]
    fn complete_and_reopen_manage_completed_at() {
        let mut session = session();
        let done = fixed_now() + Duration::hours(2);

        session.complete(done).unwrap();
        assert!(session.is_complete());
        assert_eq!(session.completed_at(), Some(done));
        assert!(session.abandon(done).is_err());

        session.reopen(done).unwrap();
        assert!(session.is_active());
        assert_eq!(session.completed_at(), None);
    }

    #[test]
    fn abandon_from_paused() {
        let mut session = session();
        session.pause(fixed_now()).unwrap();
        session.abandon(fixed_now()).unwrap();
        assert_eq!(session.status(), TrackingStatus::Abandoned);
        assert!(session.resume(fixed_now()).is_err());
    }

    #[test]
    fn activity_never_moves_backwards() {
        let mut session = session();
        session.record_activity(fixed_now() - Duration::days(1));
        assert_eq!(session.last_activity_at(), fixed_now());
    }

    #[test]
    fn from_persisted_validates_timestamps() {
        let err = TrackingSession::from_persisted(
            TrackingId::new(1),
            PatternId::new(1),
            Position::start(),
            TrackingStatus::Active,
            fixed_now(),
            fixed_now() - Duration::seconds(1),
            None,
        )
        .unwrap_err();
        assert_eq!(err, TrackingError::InvalidTimeRange);

        let err = TrackingSession::from_persisted(
            TrackingId::new(1),
            PatternId::new(1),
            Position::start(),
            TrackingStatus::Completed,
            fixed_now(),
            fixed_now(),
            None,
        )
        .unwrap_err();
        assert_eq!(err, TrackingError::MissingCompletedAt);
    }

    #[test]
    fn status_display_matches_serde_names() {
        assert_eq!(TrackingStatus::Abandoned.to_string(), "abandoned");
        assert_eq!(
            serde_json::to_value(TrackingStatus::Paused).unwrap(),
            "paused"
        );
    }
}
