//! Services module - the parsing and scoring pipeline plus its persistence glue.
//!
//! Everything here is synchronous and free of presentation code, so each
//! stage can be driven from the CLI or from tests with explicit inputs.
//!
//! # Pipeline
//!
//! 1. [`ExportParser`] sniffs the input ([`detect_format`]) and runs either the
//!    copy-format or the saved-variables parser, producing a raw collection.
//! 2. [`normalize_collection`] reconciles the two parsers' field sets into
//!    [`crate::models::PetRecord`]s.
//! 3. [`ScoringEngine`] derives a [`crate::models::ScoreResult`].
//! 4. [`PersonalBestStore`] compares and persists the local best.
//! 5. [`submit_score`] / [`sync_collection`] push results to a
//!    [`LeaderboardBackend`].
//!
//! [`ReferenceCatalog`] and the [`collection_view`] helpers serve browsing.
//!
//! # Usage Example
//!
//! ```ignore
//! use tauripets::services::{ExportParser, ScoringEngine};
//!
//! let parser = ExportParser::new();
//! let collection = parser.load_collection(&text)?;
//! let score = ScoringEngine::default().calculate(&collection.pets);
//! ```

pub mod catalog;
pub mod collection_view;
pub mod leaderboard;
pub mod normalize;
pub mod parsing;
pub mod personal_best;
pub mod scoring;

pub use catalog::{CatalogCounts, CatalogFilter, CatalogPet, PetSource, ReferenceCatalog};
pub use collection_view::{CollectionStats, PetFilter, RemoteCollectionSummary, filter_pets};
pub use leaderboard::{
    CollectionPayload, LeaderboardBackend, LeaderboardEntry, RemoteError, RestLeaderboard,
    SubmissionError, SubmissionOutcome, build_entry, fetch_leaderboard, fingerprint,
    submit_recorded_score, submit_score, sync_collection, view_collection,
};
pub use normalize::{normalize_collection, normalize_pet};
pub use parsing::{ExportFormat, ExportParser, FormatError, detect_format, to_copy_format};
pub use personal_best::{
    FileStorage, LocalStorage, MemoryStorage, PERSONAL_BEST_KEY, PersistenceError,
    PersonalBestEntry, PersonalBestStore, SaveOutcome,
};
pub use scoring::{ScoringEngine, best_instances};
