use super::pet::CollectionRecord;
use super::score::ScoreResult;
use std::collections::BTreeSet;

/// Everything derived from the most recently loaded collection.
///
/// A session is only ever replaced wholesale: loading a new export swaps the
/// collection, its score and the owned-species set together, so views never
/// see a score computed from a different collection than the one displayed.
///
/// `Session` is wrapped in `Arc<RwLock<Session>>` by
/// [`crate::state::SessionManager`]; mutate it through the manager so change
/// events are emitted.
#[derive(Clone, Debug, Default)]
pub struct Session {
    pub collection: Option<CollectionRecord>,
    pub score: Option<ScoreResult>,
    pub owned_species: BTreeSet<u32>,
    /// Number of collections loaded since start, including the current one
    pub loads: usize,
}

impl Session {
    /// Swap in a freshly parsed collection and its score.
    pub fn replace(&mut self, collection: CollectionRecord, score: Option<ScoreResult>) {
        self.owned_species = collection
            .pets
            .iter()
            .map(|p| p.species_id)
            .filter(|&id| id != 0)
            .collect();
        self.collection = Some(collection);
        self.score = score;
        self.loads += 1;
    }

    /// Drop the current collection and everything derived from it.
    pub fn clear(&mut self) {
        self.collection = None;
        self.score = None;
        self.owned_species.clear();
    }

    pub fn is_loaded(&self) -> bool {
        self.collection.is_some()
    }

    pub fn owns(&self, species_id: u32) -> bool {
        self.owned_species.contains(&species_id)
    }

    /// `(player, realm)` of the loaded collection.
    pub fn identity(&self) -> Option<(&str, &str)> {
        self.collection
            .as_ref()
            .map(|c| (c.player_name.as_str(), c.realm_name.as_str()))
    }
}
