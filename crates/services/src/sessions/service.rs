use std::fmt;
use std::sync::Arc;

use stitch_core::model::{Pattern, TrackingSession, TrackingStatus};
use stitch_core::{Clock, ProgressReport, compute_progress, navigator};
use tracing::{debug, info, warn};

use super::progress::StepOutcome;
use crate::error::TrackingServiceError;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory tracking session over one pattern.
///
/// Applies exactly one navigator call per request and keeps the lifecycle
/// status in step with what the navigator reports. Persisting the result is
/// left to the caller (see `TrackingLoopService`).
pub struct TrackerSession {
    pattern: Arc<Pattern>,
    tracking: TrackingSession,
    clock: Clock,
    progress_on_step: bool,
}

impl TrackerSession {
    /// Wrap a stored session together with the pattern it tracks.
    ///
    /// # Errors
    ///
    /// Returns `TrackingServiceError::PatternMismatch` if the session belongs to
    /// another pattern, or `TrackingServiceError::Navigation` if its cursor does
    /// not fit the pattern (e.g. the pattern was edited after the session began).
    pub fn new(
        pattern: Arc<Pattern>,
        tracking: TrackingSession,
    ) -> Result<Self, TrackingServiceError> {
        if tracking.pattern_id() != pattern.id() {
            return Err(TrackingServiceError::PatternMismatch {
                expected: tracking.pattern_id(),
                found: pattern.id(),
            });
        }
        tracking.position().check(&pattern)?;

        Ok(Self {
            pattern,
            tracking,
            clock: Clock::default(),
            progress_on_step: true,
        })
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Attach a `ProgressReport` to every `StepOutcome` (on by default).
    #[must_use]
    pub fn with_progress_on_step(mut self, enabled: bool) -> Self {
        self.progress_on_step = enabled;
        self
    }

    #[must_use]
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    #[must_use]
    pub fn tracking(&self) -> &TrackingSession {
        &self.tracking
    }

    #[must_use]
    pub fn into_tracking(self) -> TrackingSession {
        self.tracking
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.tracking.is_complete()
    }

    /// # Errors
    ///
    /// Returns `TrackingServiceError::Navigation` if the cursor no longer fits
    /// the pattern.
    pub fn progress(&self) -> Result<ProgressReport, TrackingServiceError> {
        Ok(compute_progress(self.tracking.position(), &self.pattern)?)
    }

    /// Mark the current stitch as done.
    ///
    /// A completed session answers again with `is_complete` and no movement.
    ///
    /// # Errors
    ///
    /// Returns `TrackingServiceError::NotActive` for paused or abandoned
    /// sessions, and navigation errors for a cursor that does not fit.
    pub fn step_forward(&mut self) -> Result<StepOutcome, TrackingServiceError> {
        match self.tracking.status() {
            TrackingStatus::Active => {}
            TrackingStatus::Completed => return self.outcome(false),
            status => return Err(self.refuse(status, "step forward")),
        }

        let before = *self.tracking.position();
        let exhausted = navigator::step_forward(self.tracking.position_mut(), &self.pattern)?;
        let now = self.clock.now();
        self.tracking.record_activity(now);
        debug!(
            tracking_id = %self.tracking.id(),
            position = ?self.tracking.position(),
            "stepped forward"
        );

        if exhausted {
            self.tracking.complete(now)?;
            info!(tracking_id = %self.tracking.id(), "pattern completed");
        }

        self.outcome(before != *self.tracking.position())
    }

    /// Undo the last stitch.
    ///
    /// Stepping back from a completed session reopens it on the final stitch.
    ///
    /// # Errors
    ///
    /// Returns `TrackingServiceError::NotActive` for paused or abandoned
    /// sessions, and navigation errors for a cursor that does not fit.
    pub fn step_backward(&mut self) -> Result<StepOutcome, TrackingServiceError> {
        let reopening = match self.tracking.status() {
            TrackingStatus::Active => false,
            TrackingStatus::Completed => true,
            status => return Err(self.refuse(status, "step backward")),
        };

        let moved = navigator::step_backward(self.tracking.position_mut(), &self.pattern)?;
        if moved {
            let now = self.clock.now();
            if reopening {
                self.tracking.reopen(now)?;
                info!(tracking_id = %self.tracking.id(), "completed session reopened");
            } else {
                self.tracking.record_activity(now);
            }
            debug!(
                tracking_id = %self.tracking.id(),
                position = ?self.tracking.position(),
                "stepped backward"
            );
        }

        self.outcome(moved)
    }

    /// # Errors
    ///
    /// Returns `TrackingServiceError::Tracking` unless the session is active.
    pub fn pause(&mut self) -> Result<(), TrackingServiceError> {
        self.tracking.pause(self.clock.now())?;
        info!(tracking_id = %self.tracking.id(), "session paused");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `TrackingServiceError::Tracking` unless the session is paused.
    pub fn resume(&mut self) -> Result<(), TrackingServiceError> {
        self.tracking.resume(self.clock.now())?;
        info!(tracking_id = %self.tracking.id(), "session resumed");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `TrackingServiceError::Tracking` for completed or already
    /// abandoned sessions.
    pub fn abandon(&mut self) -> Result<(), TrackingServiceError> {
        self.tracking.abandon(self.clock.now())?;
        info!(tracking_id = %self.tracking.id(), "session abandoned");
        Ok(())
    }

    fn refuse(&self, status: TrackingStatus, action: &str) -> TrackingServiceError {
        warn!(tracking_id = %self.tracking.id(), %status, action, "navigation refused");
        TrackingServiceError::NotActive { status }
    }

    fn outcome(&self, moved: bool) -> Result<StepOutcome, TrackingServiceError> {
        let progress = if self.progress_on_step {
            Some(self.progress()?)
        } else {
            None
        };
        Ok(StepOutcome {
            moved,
            is_complete: self.tracking.is_complete(),
            status: self.tracking.status(),
            progress,
        })
    }
}

impl fmt::Debug for TrackerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerSession")
            .field("pattern_id", &self.pattern.id())
            .field("groups_len", &self.pattern.groups().len())
            .field("tracking", &self.tracking)
            .field("progress_on_step", &self.progress_on_step)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
