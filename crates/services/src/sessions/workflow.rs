use std::collections::HashMap;
use std::sync::Arc;

use stitch_core::ProgressReport;
use stitch_core::model::{PatternId, TrackingId, TrackingSession};
use storage::repository::{PatternRepository, StorageError, TrackingRepository};
use tokio::sync::Mutex;
use tracing::info;

use super::progress::StepOutcome;
use super::service::TrackerSession;
use crate::Clock;
use crate::error::TrackingServiceError;

type SessionLocks = Mutex<HashMap<TrackingId, Arc<Mutex<()>>>>;

/// Orchestrates storage-backed tracking sessions.
///
/// Every mutating call loads the session, applies exactly one transition and
/// saves the result before returning. Calls for the same `TrackingId` are
/// serialized, so two concurrent steps never read the same stale cursor.
#[derive(Clone)]
pub struct TrackingLoopService {
    clock: Clock,
    patterns: Arc<dyn PatternRepository>,
    trackings: Arc<dyn TrackingRepository>,
    locks: Arc<SessionLocks>,
    progress_on_step: bool,
}

impl TrackingLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        patterns: Arc<dyn PatternRepository>,
        trackings: Arc<dyn TrackingRepository>,
    ) -> Self {
        Self {
            clock,
            patterns,
            trackings,
            locks: Arc::new(Mutex::new(HashMap::new())),
            progress_on_step: true,
        }
    }

    /// Skip the progress query on step calls when the caller only needs the
    /// movement signal.
    #[must_use]
    pub fn with_progress_on_step(mut self, enabled: bool) -> Self {
        self.progress_on_step = enabled;
        self
    }

    /// Start tracking a pattern from its first stitch.
    ///
    /// # Errors
    ///
    /// Returns `TrackingServiceError::EmptyPattern` if the pattern has no
    /// stitches, or `TrackingServiceError::Storage` for missing patterns and
    /// repository failures.
    pub async fn start_tracking(
        &self,
        pattern_id: PatternId,
    ) -> Result<TrackingSession, TrackingServiceError> {
        let pattern = self
            .patterns
            .get_pattern(pattern_id)
            .await?
            .ok_or(StorageError::NotFound)?;
        if pattern.total_units() == 0 {
            return Err(TrackingServiceError::EmptyPattern);
        }

        let session = self
            .trackings
            .insert_tracking(pattern_id, self.clock.now())
            .await?;
        info!(
            tracking_id = %session.id(),
            pattern_id = %pattern_id,
            total_units = pattern.total_units(),
            "tracking started"
        );
        Ok(session)
    }

    /// # Errors
    ///
    /// Returns `TrackingServiceError::Storage` if the session is missing.
    pub async fn get_tracking(
        &self,
        id: TrackingId,
    ) -> Result<TrackingSession, TrackingServiceError> {
        Ok(self
            .trackings
            .get_tracking(id)
            .await?
            .ok_or(StorageError::NotFound)?)
    }

    /// # Errors
    ///
    /// Returns `TrackingServiceError` for missing sessions/patterns or a
    /// cursor that no longer fits its pattern.
    pub async fn progress(&self, id: TrackingId) -> Result<ProgressReport, TrackingServiceError> {
        self.load(id).await?.progress()
    }

    /// # Errors
    ///
    /// See [`TrackerSession::step_forward`]; storage failures are propagated.
    pub async fn step_forward(&self, id: TrackingId) -> Result<StepOutcome, TrackingServiceError> {
        self.apply(id, TrackerSession::step_forward).await
    }

    /// # Errors
    ///
    /// See [`TrackerSession::step_backward`]; storage failures are propagated.
    pub async fn step_backward(&self, id: TrackingId) -> Result<StepOutcome, TrackingServiceError> {
        self.apply(id, TrackerSession::step_backward).await
    }

    /// # Errors
    ///
    /// Returns `TrackingServiceError::Tracking` unless the session is active.
    pub async fn pause(&self, id: TrackingId) -> Result<TrackingSession, TrackingServiceError> {
        self.apply(id, |session| {
            session.pause()?;
            Ok(session.tracking().clone())
        })
        .await
    }

    /// # Errors
    ///
    /// Returns `TrackingServiceError::Tracking` unless the session is paused.
    pub async fn resume(&self, id: TrackingId) -> Result<TrackingSession, TrackingServiceError> {
        self.apply(id, |session| {
            session.resume()?;
            Ok(session.tracking().clone())
        })
        .await
    }

    /// # Errors
    ///
    /// Returns `TrackingServiceError::Tracking` for completed or already
    /// abandoned sessions.
    pub async fn abandon(&self, id: TrackingId) -> Result<TrackingSession, TrackingServiceError> {
        self.apply(id, |session| {
            session.abandon()?;
            Ok(session.tracking().clone())
        })
        .await
    }

    async fn load(&self, id: TrackingId) -> Result<TrackerSession, TrackingServiceError> {
        let tracking = self.get_tracking(id).await?;
        let pattern = self
            .patterns
            .get_pattern(tracking.pattern_id())
            .await?
            .ok_or(StorageError::NotFound)?;
        Ok(TrackerSession::new(Arc::new(pattern), tracking)?
            .with_clock(self.clock)
            .with_progress_on_step(self.progress_on_step))
    }

    /// Load, run `op`, persist. Nothing is saved when `op` fails.
    ///
    /// The per-session lock lives in `locks` only while some call holds or
    /// waits on it.
    async fn apply<T>(
        &self,
        id: TrackingId,
        op: impl FnOnce(&mut TrackerSession) -> Result<T, TrackingServiceError>,
    ) -> Result<T, TrackingServiceError> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(id).or_default())
        };
        let out = {
            let _guard = lock.lock().await;
            self.apply_locked(id, op).await
        };
        self.release(id, &lock).await;
        out
    }

    async fn apply_locked<T>(
        &self,
        id: TrackingId,
        op: impl FnOnce(&mut TrackerSession) -> Result<T, TrackingServiceError>,
    ) -> Result<T, TrackingServiceError> {
        let mut session = self.load(id).await?;
        let out = op(&mut session)?;
        self.trackings.save_tracking(session.tracking()).await?;
        Ok(out)
    }

    async fn release(&self, id: TrackingId, lock: &Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // Only the map and this call still hold it: nobody is queued.
        let idle = locks.get(&id).is_some_and(|held| Arc::ptr_eq(held, lock))
            && Arc::strong_count(lock) == 2;
        if idle {
            locks.remove(&id);
        }
    }
}
