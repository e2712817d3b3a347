use crate::models::{CollectionRecord, MAX_LEVEL, PetRecord};
use crate::services::leaderboard::CollectionPayload;
use crate::services::scoring::{EPIC_QUALITY, RARE_QUALITY};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Filters for browsing the player's own pets. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PetFilter {
    /// Case-insensitive substring of the species or custom name
    pub search: Option<String>,
    pub min_quality: Option<u8>,
    pub min_level: Option<u8>,
    pub family: Option<u8>,
}

impl PetFilter {
    pub fn matches(&self, pet: &PetRecord) -> bool {
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            let in_species = pet.species_name.to_lowercase().contains(&needle);
            let in_custom = pet
                .custom_name
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(&needle));
            if !in_species && !in_custom {
                return false;
            }
        }

        self.min_quality.is_none_or(|q| pet.quality >= q)
            && self.min_level.is_none_or(|l| pet.level >= l)
            && self.family.is_none_or(|f| pet.family == f)
    }
}

/// Display order: favorites first, then level, then quality (both
/// descending), then species name.
pub fn display_order(a: &PetRecord, b: &PetRecord) -> Ordering {
    b.favorite
        .cmp(&a.favorite)
        .then_with(|| b.level.cmp(&a.level))
        .then_with(|| b.quality.cmp(&a.quality))
        .then_with(|| a.species_name.cmp(&b.species_name))
}

/// Pets matching `filter`, in display order.
pub fn filter_pets<'a>(pets: &'a [PetRecord], filter: &PetFilter) -> Vec<&'a PetRecord> {
    let mut matched: Vec<&PetRecord> = pets.iter().filter(|p| filter.matches(p)).collect();
    matched.sort_by(|a, b| display_order(a, b));
    matched
}

/// Dashboard numbers for a loaded collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionStats {
    pub total: usize,
    pub level25: usize,
    pub rare: usize,
    pub epic: usize,
    pub favorites: usize,
    pub owned: u32,
    /// Denominator of the progress bar, 0 when nothing is known
    pub obtainable: u32,
}

impl CollectionStats {
    /// `catalog_size` stands in for the obtainable total when the export
    /// carried none.
    pub fn compute(collection: &CollectionRecord, catalog_size: usize) -> Self {
        let pets = &collection.pets;
        let owned = if collection.owned_pets > 0 {
            collection.owned_pets
        } else {
            pets.len() as u32
        };
        let obtainable = if collection.total_pets > 0 {
            collection.total_pets
        } else {
            catalog_size as u32
        };

        Self {
            total: pets.len(),
            level25: pets.iter().filter(|p| p.level == MAX_LEVEL).count(),
            rare: pets.iter().filter(|p| p.quality >= RARE_QUALITY).count(),
            epic: pets.iter().filter(|p| p.quality >= EPIC_QUALITY).count(),
            favorites: pets.iter().filter(|p| p.favorite).count(),
            owned,
            obtainable,
        }
    }

    /// Completion percentage, capped at 100.
    pub fn progress_percent(&self) -> f64 {
        if self.obtainable == 0 {
            return 0.0;
        }
        (self.owned as f64 / self.obtainable as f64 * 100.0).min(100.0)
    }

    /// e.g. "412 / 650 (63.4%)"
    pub fn progress_text(&self) -> String {
        format!(
            "{} / {} ({:.1}%)",
            self.owned,
            self.obtainable,
            self.progress_percent()
        )
    }
}

/// Summary of another player's stored collection.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCollectionSummary {
    pub player: String,
    pub realm: String,
    pub pet_count: usize,
    pub level25: usize,
    pub rare: usize,
    pub families: usize,
    pub score: Option<u32>,
    pub updated_at: Option<String>,
    /// Highest level first, then highest quality
    pub pets: Vec<PetRecord>,
}

impl RemoteCollectionSummary {
    /// `None` when the stored collection has no pets.
    pub fn from_payload(payload: CollectionPayload) -> Option<Self> {
        if payload.pets.is_empty() {
            return None;
        }

        let mut pets = payload.pets;
        let families: BTreeSet<u8> = pets.iter().map(|p| p.family).filter(|&f| f != 0).collect();
        let level25 = pets.iter().filter(|p| p.level == MAX_LEVEL).count();
        let rare = pets.iter().filter(|p| p.quality >= RARE_QUALITY).count();

        pets.sort_by(|a, b| b.level.cmp(&a.level).then_with(|| b.quality.cmp(&a.quality)));

        Some(Self {
            player: payload.player,
            realm: payload.realm,
            pet_count: pets.len(),
            level25,
            rare,
            families: families.len(),
            score: payload.score,
            updated_at: payload.updated_at,
            pets,
        })
    }
}
