use super::score::ScoreStats;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// User configuration from `TauriPets Config.yaml`
///
/// Every field has a default so a partial file (or none at all) still loads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub settings: Settings,
    pub leaderboard: LeaderboardSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding locally persisted state (personal best)
    pub data_dir: String,
    pub log_dir: String,
    pub debug_mode: bool,
    /// Optional path to the reference pet catalog (JSON or YAML)
    pub catalog_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: "TauriPets Data".to_string(),
            log_dir: "logs".to_string(),
            debug_mode: false,
            catalog_path: String::new(),
        }
    }
}

/// Remote leaderboard connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardSettings {
    /// Base URL of the REST endpoint, e.g. `https://example.supabase.co`
    pub url: String,
    pub api_key: String,
    /// Number of entries fetched for display
    pub limit: usize,
    pub timeout_secs: u64,
    pub scores_table: String,
    pub collections_table: String,
}

impl Default for LeaderboardSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            limit: default_leaderboard_limit(),
            timeout_secs: 15,
            scores_table: "Leaderboard".to_string(),
            collections_table: "collections".to_string(),
        }
    }
}

impl LeaderboardSettings {
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty()
    }
}

pub fn default_leaderboard_limit() -> usize {
    50
}

/// Which tally an achievement threshold is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementStat {
    UniqueCount,
    Level25Count,
    FamilyCount,
    RareCount,
    EpicCount,
    TotalLevels,
}

impl AchievementStat {
    pub fn value(self, stats: &ScoreStats) -> u32 {
        match self {
            AchievementStat::UniqueCount => stats.unique_count,
            AchievementStat::Level25Count => stats.level25_count,
            AchievementStat::FamilyCount => stats.family_count,
            AchievementStat::RareCount => stats.rare_count,
            AchievementStat::EpicCount => stats.epic_count,
            AchievementStat::TotalLevels => stats.total_levels,
        }
    }
}

/// A bonus tier: unlocked when `stat >= threshold`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub stat: AchievementStat,
    pub threshold: u32,
    pub bonus: u32,
}

impl Achievement {
    pub fn new(
        id: &str,
        name: &str,
        description: &str,
        stat: AchievementStat,
        threshold: u32,
        bonus: u32,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            stat,
            threshold,
            bonus,
        }
    }

    pub fn is_unlocked(&self, stats: &ScoreStats) -> bool {
        self.stat.value(stats) >= self.threshold
    }
}

/// Scoring tables from `TauriPets Scoring.yaml`
///
/// These are data, not logic: new tiers are added here without touching
/// the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Points per quality id for the best instance of each species
    pub quality_points: IndexMap<u8, u32>,
    /// Points for a quality id missing from `quality_points`
    pub unknown_quality_points: u32,
    /// Level points in hundredths: 12 means 0.12 points per level
    pub level_points_per_hundred: u32,
    /// Evaluated in order; every satisfied entry adds its bonus
    pub achievements: Vec<Achievement>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let mut quality_points = IndexMap::new();
        quality_points.insert(0, 2); // Poor
        quality_points.insert(1, 3); // Common
        quality_points.insert(2, 4); // Uncommon
        quality_points.insert(3, 5); // Rare
        quality_points.insert(4, 7); // Epic
        quality_points.insert(5, 12); // Legendary

        use AchievementStat::*;
        let achievements = vec![
            Achievement::new("collect50", "Collector", "50+ unique pets", UniqueCount, 50, 100),
            Achievement::new("collect100", "Dedicated", "100+ unique pets", UniqueCount, 100, 150),
            Achievement::new("collect250", "Obsessed", "250+ unique pets", UniqueCount, 250, 250),
            Achievement::new("collect500", "Insane", "500+ unique pets", UniqueCount, 500, 500),
            Achievement::new("train10", "Trainer", "10+ level 25 pets", Level25Count, 10, 200),
            Achievement::new("train25", "Pro Trainer", "25+ level 25 pets", Level25Count, 25, 300),
            Achievement::new("train50", "Elite Trainer", "50+ level 25 pets", Level25Count, 50, 500),
            Achievement::new("families", "Zoologist", "All 10 families", FamilyCount, 10, 100),
            Achievement::new("rare25", "Quality Hunter", "25+ rare or better", RareCount, 25, 150),
            Achievement::new("epic10", "Epic Collector", "10+ epic or better", EpicCount, 10, 200),
        ];

        Self {
            quality_points,
            unknown_quality_points: 2,
            level_points_per_hundred: 12,
            achievements,
        }
    }
}

impl ScoringConfig {
    /// Points awarded for a quality id.
    pub fn points_for_quality(&self, quality: u8) -> u32 {
        self.quality_points
            .get(&quality)
            .copied()
            .unwrap_or(self.unknown_quality_points)
    }

    pub fn achievement(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }
}
