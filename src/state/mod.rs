// Session management module
//
// This module provides the SessionManager which wraps Session with thread-safe access
// using Arc<RwLock<T>> and emits change events for subscribers.

use crate::models::{CollectionRecord, ScoreResult, Session};
use crate::services::{ExportParser, FormatError, ScoringEngine};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Change events emitted when the session is modified
#[derive(Clone, Debug, PartialEq)]
pub enum SessionChange {
    /// A new collection replaced the previous one
    CollectionLoaded {
        player: String,
        realm: String,
        pets: usize,
    },

    /// The current score changed
    ScoreComputed { total: u32 },

    /// The session was emptied
    SessionCleared,
}

/// Thread-safe session holder with event emission
///
/// - Provides access to [`Session`] via `Arc<RwLock<T>>`
/// - Detects changes and emits [`SessionChange`] events
/// - Supports subscribing to changes via tokio broadcast channels
///
/// A collection is only ever swapped in wholesale, together with its score and
/// owned-species set. [`load_text`](Self::load_text) parses before taking the
/// lock, so a rejected export leaves the previous session untouched.
pub struct SessionManager {
    session: Arc<RwLock<Session>>,

    /// Broadcast channel for emitting session change events
    session_tx: broadcast::Sender<SessionChange>,
}

impl SessionManager {
    /// Create a new SessionManager with an empty session and a 100 event buffer
    pub fn new() -> Self {
        let (session_tx, _) = broadcast::channel(100);
        Self {
            session: Arc::new(RwLock::new(Session::default())),
            session_tx,
        }
    }

    /// Clone of the current session
    pub fn snapshot(&self) -> Session {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Execute a function with read access to the session
    ///
    /// # Example
    /// ```ignore
    /// let loaded = session_manager.read(|s| s.is_loaded());
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Session) -> R,
    {
        let session = self.session.read().unwrap_or_else(PoisonError::into_inner);
        f(&session)
    }

    /// Update the session and emit change events
    ///
    /// # Returns
    /// The SessionChange events that were emitted
    pub fn update<F>(&self, update_fn: F) -> Vec<SessionChange>
    where
        F: FnOnce(&mut Session),
    {
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        let old_session = session.clone();

        update_fn(&mut session);

        let changes = Self::detect_changes(&old_session, &session);

        for change in &changes {
            // Nobody listening is fine
            let _ = self.session_tx.send(change.clone());
        }

        changes
    }

    /// Subscribe to session change events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.session_tx.subscribe()
    }

    fn detect_changes(old: &Session, new: &Session) -> Vec<SessionChange> {
        let mut changes = Vec::new();

        if old.is_loaded() && !new.is_loaded() {
            changes.push(SessionChange::SessionCleared);
            return changes;
        }

        if old.loads != new.loads {
            if let Some(collection) = &new.collection {
                changes.push(SessionChange::CollectionLoaded {
                    player: collection.player_name.clone(),
                    realm: collection.realm_name.clone(),
                    pets: collection.pets.len(),
                });
            }
        }

        if old.score != new.score {
            if let Some(score) = &new.score {
                changes.push(SessionChange::ScoreComputed { total: score.total });
            }
        }

        changes
    }

    /// Replace the current collection and score
    pub fn replace_collection(
        &self,
        collection: CollectionRecord,
        score: Option<ScoreResult>,
    ) -> Vec<SessionChange> {
        self.update(|session| session.replace(collection, score))
    }

    /// Parse, score and install an export in one step.
    ///
    /// On a parse failure the session is left as it was.
    pub fn load_text(
        &self,
        parser: &ExportParser,
        engine: &ScoringEngine,
        text: &str,
    ) -> Result<Vec<SessionChange>, FormatError> {
        let collection = parser.load_collection(text)?;
        let score = engine.calculate(&collection.pets);
        Ok(self.replace_collection(collection, score))
    }

    /// Recompute the score of the loaded collection, e.g. after the scoring
    /// config changed
    pub fn rescore(&self, engine: &ScoringEngine) -> Vec<SessionChange> {
        self.update(|session| {
            session.score = session
                .collection
                .as_ref()
                .and_then(|c| engine.calculate(&c.pets));
        })
    }

    /// Drop the current collection
    pub fn clear(&self) -> Vec<SessionChange> {
        self.update(Session::clear)
    }

    /// Get an Arc reference to the session for sharing across threads
    pub fn session_arc(&self) -> Arc<RwLock<Session>> {
        Arc::clone(&self.session)
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
