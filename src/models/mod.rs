//! Data models for the TauriPets companion.
//!
//! - [`RawCollection`] / [`RawPet`]: parser output, every field optional
//! - [`CollectionRecord`] / [`PetRecord`]: the normalized collection
//! - [`ScoreResult`]: score, stats and unlocked achievements for one collection
//! - [`UserConfig`] / [`ScoringConfig`]: settings and scoring tables loaded from YAML
//! - [`Session`]: the currently loaded collection and everything derived from it

pub mod config;
pub mod pet;
pub mod score;
pub mod session;

pub use config::{
    Achievement, AchievementStat, LeaderboardSettings, ScoringConfig, Settings, UserConfig,
};
pub use pet::{CollectionRecord, Family, MAX_LEVEL, PetRecord, Quality, RawCollection, RawPet};
pub use score::{ScoreResult, ScoreStats};
pub use session::Session;
