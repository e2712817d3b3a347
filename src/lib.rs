// TauriPets - battle pet collection scoring and leaderboard companion
//
// This is the library crate containing the parsing and scoring pipeline.
// The binary crate (main.rs) provides the command-line front end.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use metrics::Metrics;
pub use models::{CollectionRecord, PetRecord, ScoreResult, ScoringConfig, Session, UserConfig};
pub use services::{ExportParser, FormatError, PersonalBestStore, ScoringEngine};
pub use state::{SessionChange, SessionManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
