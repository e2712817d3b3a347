use crate::models::{MAX_LEVEL, PetRecord, ScoreResult, ScoreStats, ScoringConfig};
use std::collections::{BTreeMap, BTreeSet};

/// Quality id from which a pet counts as rare
pub const RARE_QUALITY: u8 = 3;

/// Quality id from which a pet counts as epic
pub const EPIC_QUALITY: u8 = 4;

/// Computes collection scores from a [`ScoringConfig`].
///
/// Scoring is a pure function of the pet list: the same pets in any order
/// give the same [`ScoreResult`].
///
/// # Algorithm
///
/// 1. Keep the best instance of each species (higher quality, then higher
///    level; first seen on a full tie).
/// 2. Each kept instance earns its quality points and `level * 0.12`.
/// 3. Level 25, rare, epic and family tallies run over *every* owned pet,
///    duplicates included.
/// 4. Every achievement whose threshold is met adds its bonus.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a pet list. Returns `None` for an empty list.
    pub fn calculate(&self, pets: &[PetRecord]) -> Option<ScoreResult> {
        if pets.is_empty() {
            return None;
        }

        let best = best_instances(pets);

        let mut quality_score: u32 = 0;
        let mut total_levels: u32 = 0;
        for pet in best.values() {
            quality_score =
                quality_score.saturating_add(self.config.points_for_quality(pet.quality));
            total_levels += pet.level as u32;
        }

        // Whole hundredths keep the result independent of summation order
        let level_score = u32::try_from(
            total_levels as u64 * self.config.level_points_per_hundred as u64 / 100,
        )
        .unwrap_or(u32::MAX);

        let mut families = BTreeSet::new();
        let mut stats = ScoreStats {
            unique_count: best.len() as u32,
            total_levels,
            ..Default::default()
        };
        for pet in pets {
            if pet.level == MAX_LEVEL {
                stats.level25_count += 1;
            }
            if pet.quality >= RARE_QUALITY {
                stats.rare_count += 1;
            }
            if pet.quality >= EPIC_QUALITY {
                stats.epic_count += 1;
            }
            if pet.family != 0 {
                families.insert(pet.family);
            }
        }
        stats.family_count = families.len() as u32;

        let unlocked_achievements: Vec<_> = self
            .config
            .achievements
            .iter()
            .filter(|a| a.is_unlocked(&stats))
            .cloned()
            .collect();
        // Hand-edited tables can carry huge values; saturate instead of wrapping
        let bonus_score = unlocked_achievements
            .iter()
            .fold(0u32, |acc, a| acc.saturating_add(a.bonus));

        let result = ScoreResult {
            total: quality_score
                .saturating_add(level_score)
                .saturating_add(bonus_score),
            quality_score,
            level_score,
            bonus_score,
            stats,
            unlocked_achievements,
        };

        tracing::info!(
            "Scored {} pets ({} unique): {}",
            pets.len(),
            stats.unique_count,
            result.summary()
        );

        Some(result)
    }
}

/// Best instance of each species, keyed by species id.
///
/// Higher quality wins; on equal quality the higher level wins; on a full
/// tie the first instance seen is kept.
pub fn best_instances(pets: &[PetRecord]) -> BTreeMap<u32, &PetRecord> {
    let mut best: BTreeMap<u32, &PetRecord> = BTreeMap::new();

    for pet in pets {
        best.entry(pet.species_id)
            .and_modify(|kept| {
                if pet.quality > kept.quality
                    || (pet.quality == kept.quality && pet.level > kept.level)
                {
                    *kept = pet;
                }
            })
            .or_insert(pet);
    }

    best
}
