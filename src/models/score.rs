use super::config::Achievement;
use serde::{Deserialize, Serialize};

/// Tallies the achievement predicates are evaluated against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreStats {
    /// Distinct species owned
    pub unique_count: u32,
    /// Pets at exactly level 25, duplicates included
    pub level25_count: u32,
    /// Distinct non-zero families seen
    pub family_count: u32,
    /// Pets of Rare quality or better, duplicates included
    pub rare_count: u32,
    /// Pets of Epic quality or better, duplicates included
    pub epic_count: u32,
    /// Sum of levels over the best instance of each species
    pub total_levels: u32,
}

/// Result of scoring one collection.
///
/// Created fresh for every load and never patched afterwards; a new
/// collection produces a new `ScoreResult`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreResult {
    pub total: u32,
    pub quality_score: u32,
    pub level_score: u32,
    pub bonus_score: u32,
    pub stats: ScoreStats,
    /// Unlocked achievements, in configuration order
    pub unlocked_achievements: Vec<Achievement>,
}

impl ScoreResult {
    pub fn has_achievement(&self, id: &str) -> bool {
        self.unlocked_achievements.iter().any(|a| a.id == id)
    }

    /// One-line breakdown, e.g. "1234 (quality 700, levels 134, bonuses +400)".
    pub fn summary(&self) -> String {
        format!(
            "{} (quality {}, levels {}, bonuses +{})",
            self.total, self.quality_score, self.level_score, self.bonus_score
        )
    }
}
