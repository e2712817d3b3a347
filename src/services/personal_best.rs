//! Local personal-best tracking.
//!
//! One [`PersonalBestEntry`] is kept per device, serialized as JSON under
//! [`PERSONAL_BEST_KEY`]. It is replaced only by a strictly higher score.
//! Storage failures never surface to the caller: a read failure looks like an
//! empty store and a write failure reports that nothing was saved.

use crate::models::ScoreResult;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use thiserror::Error;

/// Well-known storage key of the personal best.
pub const PERSONAL_BEST_KEY: &str = "tauripets_personal_best";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Storage I/O error at {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt stored data: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Minimal string key-value store, shaped after browser local storage.
#[cfg_attr(test, mockall::automock)]
pub trait LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// Stores each key as `<key>.json` inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: Utf8PathBuf,
}

impl FileStorage {
    pub fn new<P: AsRef<Utf8Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, key: &str) -> Utf8PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl LocalStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        fs::read_to_string(&path)
            .map(Some)
            .map_err(|source| PersistenceError::Io { path, source })
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(|source| PersistenceError::Io {
                path: self.dir.clone(),
                source,
            })?;
        }

        let path = self.path_for(key);
        fs::write(&path, value).map_err(|source| PersistenceError::Io { path, source })
    }
}

/// Process-local storage, lost on exit.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Snapshot of the best score seen on this device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalBestEntry {
    pub player: String,
    pub realm: String,
    pub score: u32,
    /// Unique species count
    pub pets: u32,
    pub level25: u32,
    #[serde(default)]
    pub rare: u32,
    #[serde(default)]
    pub epic: u32,
    /// `YYYY-MM-DD`
    pub date: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl PersonalBestEntry {
    pub fn from_score(score: &ScoreResult, player: &str, realm: &str, now: DateTime<Utc>) -> Self {
        Self {
            player: player.to_string(),
            realm: realm.to_string(),
            score: score.total,
            pets: score.stats.unique_count,
            level25: score.stats.level25_count,
            rare: score.stats.rare_count,
            epic: score.stats.epic_count,
            date: now.format("%Y-%m-%d").to_string(),
            timestamp: now.timestamp_millis(),
        }
    }
}

/// What [`PersonalBestStore::save`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub saved: bool,
    pub is_new_best: bool,
    /// The new entry when saved, the standing one otherwise, `None` on failure
    pub entry: Option<PersonalBestEntry>,
}

impl SaveOutcome {
    fn failed() -> Self {
        Self {
            saved: false,
            is_new_best: false,
            entry: None,
        }
    }
}

pub struct PersonalBestStore<S: LocalStorage> {
    storage: S,
}

impl<S: LocalStorage> PersonalBestStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Stored entry, or `None` when nothing usable is stored.
    pub fn load(&self) -> Option<PersonalBestEntry> {
        match self.try_load() {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Ignoring unreadable personal best: {}", e);
                None
            }
        }
    }

    fn try_load(&self) -> Result<Option<PersonalBestEntry>, PersistenceError> {
        match self.storage.get(PERSONAL_BEST_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Record `score` if it beats the stored best.
    pub fn save(&mut self, score: &ScoreResult, player: &str, realm: &str) -> SaveOutcome {
        self.save_at(score, player, realm, Utc::now())
    }

    /// [`save`](Self::save) with an explicit clock.
    pub fn save_at(
        &mut self,
        score: &ScoreResult,
        player: &str,
        realm: &str,
        now: DateTime<Utc>,
    ) -> SaveOutcome {
        let current = self.load();

        // Ties keep the standing entry
        if let Some(current) = current.filter(|c| score.total <= c.score) {
            tracing::debug!(
                "Score {} does not beat personal best {}",
                score.total,
                current.score
            );
            return SaveOutcome {
                saved: false,
                is_new_best: false,
                entry: Some(current),
            };
        }

        let entry = PersonalBestEntry::from_score(score, player, realm, now);
        match self.write(&entry) {
            Ok(()) => {
                tracing::info!("New personal best for {}-{}: {}", player, realm, entry.score);
                SaveOutcome {
                    saved: true,
                    is_new_best: true,
                    entry: Some(entry),
                }
            }
            Err(e) => {
                tracing::warn!("Failed to store personal best: {}", e);
                SaveOutcome::failed()
            }
        }
    }

    fn write(&mut self, entry: &PersonalBestEntry) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(entry)?;
        self.storage.set(PERSONAL_BEST_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoreStats;
    use chrono::TimeZone;

    fn score(total: u32) -> ScoreResult {
        ScoreResult {
            total,
            quality_score: total,
            level_score: 0,
            bonus_score: 0,
            stats: ScoreStats {
                unique_count: 12,
                level25_count: 3,
                rare_count: 4,
                epic_count: 1,
                ..Default::default()
            },
            unlocked_achievements: Vec::new(),
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 18, 30, 0).unwrap()
    }

    #[test]
    fn test_first_save_is_new_best() {
        let mut store = PersonalBestStore::new(MemoryStorage::new());
        assert!(store.load().is_none());

        let outcome = store.save_at(&score(400), "Tester", "Evermoon", fixed_now());
        assert!(outcome.saved);
        assert!(outcome.is_new_best);

        let entry = store.load().unwrap();
        assert_eq!(entry.score, 400);
        assert_eq!(entry.pets, 12);
        assert_eq!(entry.level25, 3);
        assert_eq!(entry.rare, 4);
        assert_eq!(entry.epic, 1);
        assert_eq!(entry.date, "2024-03-09");
        assert_eq!(entry.timestamp, fixed_now().timestamp_millis());
    }

    #[test]
    fn test_higher_score_replaces() {
        let mut store = PersonalBestStore::new(MemoryStorage::new());
        store.save_at(&score(400), "Tester", "Evermoon", fixed_now());

        let outcome = store.save_at(&score(500), "Tester", "Evermoon", fixed_now());
        assert!(outcome.is_new_best);
        assert_eq!(store.load().unwrap().score, 500);
    }

    #[test]
    fn test_lower_and_equal_scores_keep_entry() {
        let mut store = PersonalBestStore::new(MemoryStorage::new());
        store.save_at(&score(500), "Tester", "Evermoon", fixed_now());
        let stored = store.storage().get(PERSONAL_BEST_KEY).unwrap();

        for total in [400, 500] {
            let outcome = store.save_at(&score(total), "Other", "Evermoon", fixed_now());
            assert!(!outcome.saved);
            assert!(!outcome.is_new_best);
            assert_eq!(outcome.entry.unwrap().score, 500);
        }

        assert_eq!(store.storage().get(PERSONAL_BEST_KEY).unwrap(), stored);
    }

    #[test]
    fn test_corrupt_entry_reads_as_absent() {
        let mut storage = MemoryStorage::new();
        storage.set(PERSONAL_BEST_KEY, "{not json").unwrap();
        let mut store = PersonalBestStore::new(storage);

        assert!(store.load().is_none());

        let outcome = store.save_at(&score(10), "Tester", "Evermoon", fixed_now());
        assert!(outcome.is_new_best);
        assert_eq!(store.load().unwrap().score, 10);
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let mut storage = MockLocalStorage::new();
        storage.expect_get().returning(|_| Ok(None));
        storage
            .expect_set()
            .returning(|_, _| Err(PersistenceError::Unavailable("quota exceeded".to_string())));

        let mut store = PersonalBestStore::new(storage);
        let outcome = store.save_at(&score(10), "Tester", "Evermoon", fixed_now());

        assert_eq!(
            outcome,
            SaveOutcome {
                saved: false,
                is_new_best: false,
                entry: None
            }
        );
    }

    #[test]
    fn test_read_failure_is_swallowed() {
        let mut storage = MockLocalStorage::new();
        storage
            .expect_get()
            .returning(|_| Err(PersistenceError::Unavailable("blocked".to_string())));

        let store = PersonalBestStore::new(storage);
        assert!(store.load().is_none());
    }

    #[test]
    fn test_entry_json_field_names() {
        let entry = PersonalBestEntry::from_score(&score(42), "Tester", "Evermoon", fixed_now());
        let json = serde_json::to_value(&entry).unwrap();

        for field in [
            "player", "realm", "score", "pets", "level25", "rare", "epic", "date", "timestamp",
        ] {
            assert!(json.get(field).is_some(), "missing {}", field);
        }
    }

    #[test]
    fn test_legacy_entry_without_rare_epic() {
        let json = r#"{"player":"A","realm":"B","score":5,"pets":1,"level25":0,"date":"2024-01-01","timestamp":1}"#;
        let entry: PersonalBestEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.rare, 0);
        assert_eq!(entry.epic, 0);
    }
}
