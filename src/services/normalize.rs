//! Reconciles parser output into the canonical pet schema.
//!
//! The copy format and the saved-variables dump leave different fields
//! populated, so quality and family are always read through the
//! [`RawPet::quality`] / [`RawPet::family`] fallback chain, never from a
//! single field.

use crate::models::{CollectionRecord, Family, MAX_LEVEL, PetRecord, Quality, RawCollection, RawPet};

const UNKNOWN_SPECIES_NAME: &str = "Unknown";

/// Normalize one parsed pet.
pub fn normalize_pet(raw: &RawPet) -> PetRecord {
    let species_id = raw
        .species_id
        .and_then(|id| u32::try_from(id).ok())
        .unwrap_or(0);

    // A level outside 1..=25 is corrupt, not a max-level pet
    let level = match raw.level {
        Some(level) if (1..=MAX_LEVEL as i64).contains(&level) => level as u8,
        _ => 1,
    };

    let quality = u8::try_from(raw.quality())
        .ok()
        .and_then(Quality::from_id)
        .map(Quality::id)
        .unwrap_or(0);

    let family = u8::try_from(raw.family())
        .ok()
        .and_then(Family::from_id)
        .map(Family::id)
        .unwrap_or(0);

    let stat = |value: Option<i64>| {
        value
            .map(|v| v.clamp(0, u32::MAX as i64) as u32)
            .unwrap_or(0)
    };

    if raw.level.is_none_or(|l| !(1..=MAX_LEVEL as i64).contains(&l)) {
        tracing::debug!(
            "Species {}: level {:?} normalized to {}",
            species_id,
            raw.level,
            level
        );
    }

    PetRecord {
        species_id,
        species_name: raw
            .display_name()
            .unwrap_or(UNKNOWN_SPECIES_NAME)
            .to_string(),
        custom_name: raw.custom_name.clone().filter(|n| !n.is_empty()),
        family,
        level,
        quality,
        health: stat(raw.health),
        power: stat(raw.power),
        speed: stat(raw.speed),
        favorite: raw.favorite.unwrap_or(false),
        breed: raw.breed.clone().filter(|b| !b.is_empty()),
    }
}

/// Normalize a parsed collection.
///
/// `owned_pets` falls back to the number of pets when the export carried no
/// count.
pub fn normalize_collection(raw: RawCollection) -> CollectionRecord {
    let pets: Vec<PetRecord> = raw.pets.iter().map(normalize_pet).collect();

    CollectionRecord {
        owned_pets: raw.owned_pets.unwrap_or(pets.len() as u32),
        total_pets: raw.total_pets.unwrap_or(0),
        player_name: raw.player_name,
        realm_name: raw.realm_name,
        export_date: raw.export_date,
        addon_score: raw.addon_score,
        pets,
    }
}
