use std::sync::Arc;

use stitch_core::model::Pattern;
use storage::repository::Storage;

use crate::Clock;
use crate::error::TrackingServiceError;
use crate::sessions::TrackingLoopService;

/// Environment variable that turns progress reports on step calls on or off.
pub const PROGRESS_ON_STEP_ENV: &str = "STITCH_PROGRESS_ON_STEP";

/// Tunables for the tracking services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    pub progress_on_step: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            progress_on_step: true,
        }
    }
}

impl ServiceConfig {
    /// Read overrides from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`; unknown values keep the defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = lookup(PROGRESS_ON_STEP_ENV) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => config.progress_on_step = true,
                "0" | "false" | "no" | "off" => config.progress_on_step = false,
                _ => {
                    tracing::warn!(value = %raw, "ignoring invalid {}", PROGRESS_ON_STEP_ENV);
                }
            }
        }
        config
    }
}

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    storage: Storage,
    tracking: Arc<TrackingLoopService>,
}

impl AppServices {
    #[must_use]
    pub fn new(storage: Storage, clock: Clock, config: ServiceConfig) -> Self {
        let tracking = Arc::new(
            TrackingLoopService::new(
                clock,
                Arc::clone(&storage.patterns),
                Arc::clone(&storage.trackings),
            )
            .with_progress_on_step(config.progress_on_step),
        );
        Self { storage, tracking }
    }

    /// Services over a fresh in-memory backend, configured from the environment.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::new(Storage::in_memory(), clock, ServiceConfig::from_env())
    }

    #[must_use]
    pub fn tracking(&self) -> Arc<TrackingLoopService> {
        Arc::clone(&self.tracking)
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Store a pattern authored elsewhere so it can be tracked.
    ///
    /// # Errors
    ///
    /// Returns `TrackingServiceError::Storage` if the pattern cannot be stored.
    pub async fn publish_pattern(&self, pattern: &Pattern) -> Result<(), TrackingServiceError> {
        self.storage.patterns.upsert_pattern(pattern).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stitch_core::model::{Entry, Group, PatternId, StitchId};
    use stitch_core::time::fixed_now;

    #[test]
    fn config_reads_boolean_spellings() {
        let off = ServiceConfig::from_lookup(|_| Some(" Off ".to_string()));
        assert!(!off.progress_on_step);
        let on = ServiceConfig::from_lookup(|_| Some("1".to_string()));
        assert!(on.progress_on_step);
        let junk = ServiceConfig::from_lookup(|_| Some("maybe".to_string()));
        assert_eq!(junk, ServiceConfig::default());
        let unset = ServiceConfig::from_lookup(|_| None);
        assert!(unset.progress_on_step);
    }

    #[tokio::test]
    async fn published_pattern_can_be_tracked() {
        let services = AppServices::new(
            Storage::in_memory(),
            Clock::fixed(fixed_now()),
            ServiceConfig {
                progress_on_step: false,
            },
        );
        let pattern = Pattern::new(
            PatternId::new(4),
            "Bookmark",
            vec![
                Group::new("Row 1", 1, vec![Entry::new(StitchId::new(1), 5, 1).unwrap()])
                    .unwrap(),
            ],
        );
        services.publish_pattern(&pattern).await.unwrap();

        let tracking = services.tracking();
        let session = tracking.start_tracking(pattern.id()).await.unwrap();
        let outcome = tracking.step_forward(session.id()).await.unwrap();
        assert!(outcome.moved);
        assert!(outcome.progress.is_none());
    }
}
