use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use stitch_core::model::{Pattern, PatternId, Position, TrackingId, TrackingSession, TrackingStatus};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Read access to authored patterns.
#[async_trait]
pub trait PatternRepository: Send + Sync {
    /// Persist or replace a pattern.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the pattern cannot be stored.
    async fn upsert_pattern(&self, pattern: &Pattern) -> Result<(), StorageError>;

    /// Fetch a pattern by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure; a missing pattern is `Ok(None)`.
    async fn get_pattern(&self, id: PatternId) -> Result<Option<Pattern>, StorageError>;
}

/// Persistence for tracking sessions (cursor plus lifecycle).
#[async_trait]
pub trait TrackingRepository: Send + Sync {
    /// Create a new active session at the start of `pattern_id`, allocating its ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be stored.
    async fn insert_tracking(
        &self,
        pattern_id: PatternId,
        started_at: DateTime<Utc>,
    ) -> Result<TrackingSession, StorageError>;

    /// Overwrite an existing session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session was never inserted.
    async fn save_tracking(&self, session: &TrackingSession) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failure; a missing session is `Ok(None)`.
    async fn get_tracking(&self, id: TrackingId) -> Result<Option<TrackingSession>, StorageError>;

    /// All sessions for a pattern, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn list_trackings(
        &self,
        pattern_id: PatternId,
    ) -> Result<Vec<TrackingSession>, StorageError>;
}

/// A session as it sits in the table: plain columns, revalidated on read.
#[derive(Debug, Clone)]
struct TrackingRow {
    id: TrackingId,
    pattern_id: PatternId,
    position: Position,
    status: TrackingStatus,
    started_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TrackingRow {
    fn from_session(session: &TrackingSession) -> Self {
        Self {
            id: session.id(),
            pattern_id: session.pattern_id(),
            position: *session.position(),
            status: session.status(),
            started_at: session.started_at(),
            last_activity_at: session.last_activity_at(),
            completed_at: session.completed_at(),
        }
    }

    fn into_session(self) -> Result<TrackingSession, StorageError> {
        TrackingSession::from_persisted(
            self.id,
            self.pattern_id,
            self.position,
            self.status,
            self.started_at,
            self.last_activity_at,
            self.completed_at,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

#[derive(Default)]
struct TrackingTable {
    next_id: u64,
    rows: HashMap<TrackingId, TrackingRow>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    patterns: Arc<Mutex<HashMap<PatternId, Pattern>>>,
    trackings: Arc<Mutex<TrackingTable>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PatternRepository for InMemoryRepository {
    async fn upsert_pattern(&self, pattern: &Pattern) -> Result<(), StorageError> {
        let mut guard = self
            .patterns
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(pattern.id(), pattern.clone());
        Ok(())
    }

    async fn get_pattern(&self, id: PatternId) -> Result<Option<Pattern>, StorageError> {
        let guard = self
            .patterns
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }
}

#[async_trait]
impl TrackingRepository for InMemoryRepository {
    async fn insert_tracking(
        &self,
        pattern_id: PatternId,
        started_at: DateTime<Utc>,
    ) -> Result<TrackingSession, StorageError> {
        let mut guard = self
            .trackings
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.next_id += 1;
        let session =
            TrackingSession::start(TrackingId::new(guard.next_id), pattern_id, started_at);
        guard
            .rows
            .insert(session.id(), TrackingRow::from_session(&session));
        Ok(session)
    }

    async fn save_tracking(&self, session: &TrackingSession) -> Result<(), StorageError> {
        let mut guard = self
            .trackings
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        match guard.rows.get_mut(&session.id()) {
            Some(row) if row.pattern_id != session.pattern_id() => Err(StorageError::Conflict),
            Some(row) => {
                *row = TrackingRow::from_session(session);
                Ok(())
            }
            None => Err(StorageError::NotFound),
        }
    }

    async fn get_tracking(&self, id: TrackingId) -> Result<Option<TrackingSession>, StorageError> {
        let guard = self
            .trackings
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .rows
            .get(&id)
            .cloned()
            .map(TrackingRow::into_session)
            .transpose()
    }

    async fn list_trackings(
        &self,
        pattern_id: PatternId,
    ) -> Result<Vec<TrackingSession>, StorageError> {
        let guard = self
            .trackings
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found = guard
            .rows
            .values()
            .filter(|row| row.pattern_id == pattern_id)
            .cloned()
            .map(TrackingRow::into_session)
            .collect::<Result<Vec<_>, _>>()?;
        found.sort_by_key(|session| (session.started_at(), session.id()));
        Ok(found)
    }
}

/// Aggregates pattern and tracking repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub patterns: Arc<dyn PatternRepository>,
    pub trackings: Arc<dyn TrackingRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let patterns: Arc<dyn PatternRepository> = Arc::new(repo.clone());
        let trackings: Arc<dyn TrackingRepository> = Arc::new(repo);
        Self {
            patterns,
            trackings,
        }
    }
}
