//! Remote leaderboard and collection storage.
//!
//! The remote side is two PostgREST-style tables: one leaderboard row and one
//! stored collection per `(player, realm)`. [`LeaderboardBackend`] is the seam;
//! [`RestLeaderboard`] talks HTTP, tests substitute a mock.

use crate::models::{
    CollectionRecord, LeaderboardSettings, PetRecord, RawPet, ScoreResult, Session,
};
use crate::services::collection_view::RemoteCollectionSummary;
use crate::services::normalize::normalize_pet;
use crate::services::parsing::parse_leading_int;
use crate::services::personal_best::{LocalStorage, PersonalBestStore, SaveOutcome};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Leaderboard URL is not configured")]
    NotConfigured,
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Load your collection first")]
    NoScore,

    #[error("Player name is missing from the export")]
    MissingIdentity,

    #[error("No personal best on record, so there is nothing to submit")]
    NoPersonalBest,

    #[error("Your current leaderboard score ({existing}) is higher than {submitted}")]
    HigherScoreExists { existing: u32, submitted: u32 },

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player: String,
    pub realm: String,
    pub score: u32,
    /// Unique species count
    #[serde(default)]
    pub pets: u32,
    #[serde(default)]
    pub level25: u32,
    #[serde(default)]
    pub rare_count: u32,
    #[serde(default)]
    pub fingerprint: String,
    #[serde(default)]
    pub created_at: String,
}

impl LeaderboardEntry {
    pub fn identity(&self) -> String {
        format!("{}-{}", self.player, self.realm)
    }
}

/// A stored collection row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionPayload {
    pub player: String,
    pub realm: String,
    #[serde(default, deserialize_with = "deserialize_remote_pets")]
    pub pets: Vec<PetRecord>,
    #[serde(default)]
    pub score: Option<u32>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A scalar other uploaders write as a number, a flag or text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LooseValue {
    Flag(bool),
    Number(i64),
    Float(f64),
    Text(String),
}

impl LooseValue {
    fn number(&self) -> Option<i64> {
        match self {
            LooseValue::Flag(b) => Some(*b as i64),
            LooseValue::Number(n) => Some(*n),
            LooseValue::Float(f) if f.is_finite() => Some(*f as i64),
            LooseValue::Float(_) => None,
            LooseValue::Text(s) => parse_leading_int(s),
        }
    }

    fn flag(&self) -> bool {
        match self {
            LooseValue::Text(s) => s == "true",
            other => other.number().is_some_and(|n| n != 0),
        }
    }

    /// Text that isn't a number, such as a `"Rare"` quality label.
    fn label(&self) -> Option<String> {
        match self {
            LooseValue::Text(s) if parse_leading_int(s).is_none() => Some(s.clone()),
            _ => None,
        }
    }
}

/// Stored pet as any uploader may have written it.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RemotePet {
    #[serde(rename = "speciesID", alias = "speciesId", alias = "species_id")]
    species_id: Option<LooseValue>,
    name: Option<String>,
    #[serde(rename = "speciesName")]
    species_name: Option<String>,
    #[serde(rename = "customName")]
    custom_name: Option<String>,
    breed: Option<String>,
    quality: Option<LooseValue>,
    #[serde(rename = "qualityID")]
    quality_id: Option<LooseValue>,
    #[serde(rename = "petType")]
    pet_type: Option<LooseValue>,
    #[serde(rename = "familyID")]
    family_id: Option<LooseValue>,
    level: Option<LooseValue>,
    health: Option<LooseValue>,
    power: Option<LooseValue>,
    speed: Option<LooseValue>,
    favorite: Option<LooseValue>,
}

impl From<RemotePet> for RawPet {
    fn from(pet: RemotePet) -> Self {
        let number = |v: &Option<LooseValue>| v.as_ref().and_then(LooseValue::number);

        RawPet {
            species_id: number(&pet.species_id),
            quality: number(&pet.quality),
            quality_label: pet.quality.as_ref().and_then(LooseValue::label),
            quality_id: number(&pet.quality_id),
            pet_type: number(&pet.pet_type),
            family_id: number(&pet.family_id),
            level: number(&pet.level),
            health: number(&pet.health),
            power: number(&pet.power),
            speed: number(&pet.speed),
            favorite: pet.favorite.as_ref().map(LooseValue::flag),
            name: pet.name,
            species_name: pet.species_name,
            custom_name: pet.custom_name,
            breed: pet.breed,
            ..Default::default()
        }
    }
}

/// Stored pets go through the same normalization as parsed exports.
fn deserialize_remote_pets<'de, D>(deserializer: D) -> Result<Vec<PetRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let pets = Option::<Vec<RemotePet>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(pets
        .into_iter()
        .map(|pet| normalize_pet(&RawPet::from(pet)))
        .collect())
}

/// Content fingerprint of a pet list.
///
/// `c` followed by the first 16 hex digits of the SHA-256 of the sorted,
/// comma-joined `speciesID-level-quality` tuples, so the same pets in any
/// order give the same fingerprint.
pub fn fingerprint(pets: &[PetRecord]) -> String {
    let mut tuples: Vec<String> = pets
        .iter()
        .map(|p| format!("{}-{}-{}", p.species_id, p.level, p.quality))
        .collect();
    tuples.sort();

    let digest = Sha256::digest(tuples.join(",").as_bytes());
    let hex = format!("{:x}", digest);
    format!("c{}", &hex[..16])
}

/// Remote storage for scores and collections.
pub trait LeaderboardBackend {
    fn find_entry(&self, player: &str, realm: &str)
    -> Result<Option<LeaderboardEntry>, RemoteError>;

    /// Insert or replace the row for `(entry.player, entry.realm)`.
    fn upsert_entry(&self, entry: &LeaderboardEntry) -> Result<(), RemoteError>;

    /// Highest scores first.
    fn top_entries(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, RemoteError>;

    fn upsert_collection(&self, payload: &CollectionPayload) -> Result<(), RemoteError>;

    fn find_collection(
        &self,
        player: &str,
        realm: &str,
    ) -> Result<Option<CollectionPayload>, RemoteError>;
}

/// Leaderboard backed by a PostgREST endpoint (`<url>/rest/v1/<table>`).
#[derive(Debug, Clone)]
pub struct RestLeaderboard {
    http: Client,
    base_url: String,
    api_key: String,
    scores_table: String,
    collections_table: String,
}

impl RestLeaderboard {
    pub fn new(settings: &LeaderboardSettings) -> Result<Self, RemoteError> {
        if !settings.is_configured() {
            return Err(RemoteError::NotConfigured);
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: settings.url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            scores_table: settings.scores_table.clone(),
            collections_table: settings.collections_table.clone(),
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        let builder = self.http.request(method, url);
        if self.api_key.is_empty() {
            builder
        } else {
            builder
                .header("apikey", &self.api_key)
                .bearer_auth(&self.api_key)
        }
    }

    fn send(builder: RequestBuilder) -> Result<Response, RemoteError> {
        let resp = builder.send()?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().unwrap_or_default();
            return Err(RemoteError::Server {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }
        Ok(resp)
    }

    fn find_one<T: DeserializeOwned>(
        &self,
        table: &str,
        player: &str,
        realm: &str,
    ) -> Result<Option<T>, RemoteError> {
        let builder = self.request(Method::GET, table).query(&[
            ("select", "*".to_string()),
            ("player", format!("eq.{}", player)),
            ("realm", format!("eq.{}", realm)),
            ("limit", "1".to_string()),
        ]);
        let rows: Vec<T> = Self::send(builder)?.json()?;
        Ok(rows.into_iter().next())
    }

    fn upsert<T: Serialize>(&self, table: &str, row: &T) -> Result<(), RemoteError> {
        let builder = self
            .request(Method::POST, table)
            .query(&[("on_conflict", "player,realm")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[row]);
        Self::send(builder)?;
        Ok(())
    }
}

impl LeaderboardBackend for RestLeaderboard {
    fn find_entry(
        &self,
        player: &str,
        realm: &str,
    ) -> Result<Option<LeaderboardEntry>, RemoteError> {
        self.find_one(&self.scores_table, player, realm)
    }

    fn upsert_entry(&self, entry: &LeaderboardEntry) -> Result<(), RemoteError> {
        self.upsert(&self.scores_table, entry)
    }

    fn top_entries(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, RemoteError> {
        let builder = self.request(Method::GET, &self.scores_table).query(&[
            ("select", "*".to_string()),
            ("order", "score.desc".to_string()),
            ("limit", limit.to_string()),
        ]);
        Ok(Self::send(builder)?.json()?)
    }

    fn upsert_collection(&self, payload: &CollectionPayload) -> Result<(), RemoteError> {
        self.upsert(&self.collections_table, payload)
    }

    fn find_collection(
        &self,
        player: &str,
        realm: &str,
    ) -> Result<Option<CollectionPayload>, RemoteError> {
        self.find_one(&self.collections_table, player, realm)
    }
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Leaderboard row for a scored collection.
pub fn build_entry(
    score: &ScoreResult,
    player: &str,
    realm: &str,
    pets: &[PetRecord],
    now: DateTime<Utc>,
) -> LeaderboardEntry {
    LeaderboardEntry {
        player: player.to_string(),
        realm: realm.to_string(),
        score: score.total,
        pets: score.stats.unique_count,
        level25: score.stats.level25_count,
        rare_count: score.stats.rare_count,
        fingerprint: fingerprint(pets),
        created_at: timestamp(now),
    }
}

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub entry: LeaderboardEntry,
    /// Score the row held before this submission
    pub previous: Option<u32>,
    /// Refreshed top list, `None` if the refresh failed
    pub leaderboard: Option<Vec<LeaderboardEntry>>,
}

fn scored_collection(
    session: &Session,
) -> Result<(&CollectionRecord, &ScoreResult), SubmissionError> {
    let (Some(collection), Some(score)) = (&session.collection, &session.score) else {
        return Err(SubmissionError::NoScore);
    };
    if collection.player_name.trim().is_empty() {
        return Err(SubmissionError::MissingIdentity);
    }
    Ok((collection, score))
}

/// Record the session's score in the personal-best store, then submit it.
///
/// Nothing is sent unless the store holds a personal best afterwards, so an
/// unwritable store blocks submission.
pub fn submit_recorded_score<B, S>(
    backend: &B,
    store: &mut PersonalBestStore<S>,
    session: &Session,
    limit: usize,
) -> Result<(SaveOutcome, SubmissionOutcome), SubmissionError>
where
    B: LeaderboardBackend + ?Sized,
    S: LocalStorage,
{
    let (collection, score) = scored_collection(session)?;

    let saved = store.save(score, &collection.player_name, &collection.realm_name);
    if store.load().is_none() {
        tracing::warn!(
            "Not submitting for {}: no personal best could be recorded",
            collection.identity()
        );
        return Err(SubmissionError::NoPersonalBest);
    }

    let outcome = submit_score(backend, session, limit)?;
    Ok((saved, outcome))
}

/// Submit the session's score, then refetch the top `limit` entries.
///
/// Rejected without touching the row when the stored score is strictly
/// higher.
pub fn submit_score<B: LeaderboardBackend + ?Sized>(
    backend: &B,
    session: &Session,
    limit: usize,
) -> Result<SubmissionOutcome, SubmissionError> {
    let (collection, score) = scored_collection(session)?;

    let entry = build_entry(
        score,
        &collection.player_name,
        &collection.realm_name,
        &collection.pets,
        Utc::now(),
    );

    let existing = backend.find_entry(&entry.player, &entry.realm)?;
    if let Some(existing) = existing.as_ref().filter(|e| e.score > entry.score) {
        tracing::info!(
            "Submission for {} rejected: stored {} beats {}",
            entry.identity(),
            existing.score,
            entry.score
        );
        return Err(SubmissionError::HigherScoreExists {
            existing: existing.score,
            submitted: entry.score,
        });
    }

    backend.upsert_entry(&entry)?;
    tracing::info!("Submitted {} for {}", entry.score, entry.identity());

    let leaderboard = match fetch_leaderboard(backend, limit) {
        Ok(entries) => Some(entries),
        Err(e) => {
            tracing::warn!("Score submitted but leaderboard refresh failed: {}", e);
            None
        }
    };

    Ok(SubmissionOutcome {
        entry,
        previous: existing.map(|e| e.score),
        leaderboard,
    })
}

/// Top `limit` entries, highest score first.
pub fn fetch_leaderboard<B: LeaderboardBackend + ?Sized>(
    backend: &B,
    limit: usize,
) -> Result<Vec<LeaderboardEntry>, RemoteError> {
    let mut entries = backend.top_entries(limit)?;
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries.truncate(limit);
    Ok(entries)
}

/// Upload the session's collection so other players can view it.
pub fn sync_collection<B: LeaderboardBackend + ?Sized>(
    backend: &B,
    session: &Session,
) -> Result<CollectionPayload, SubmissionError> {
    let collection = session.collection.as_ref().ok_or(SubmissionError::NoScore)?;
    if collection.player_name.trim().is_empty() {
        return Err(SubmissionError::MissingIdentity);
    }

    let payload = CollectionPayload {
        player: collection.player_name.clone(),
        realm: collection.realm_name.clone(),
        pets: collection.pets.clone(),
        score: session.score.as_ref().map(|s| s.total),
        updated_at: Some(timestamp(Utc::now())),
    };

    backend.upsert_collection(&payload)?;
    tracing::info!(
        "Synced {} pets for {}-{}",
        payload.pets.len(),
        payload.player,
        payload.realm
    );
    Ok(payload)
}

/// Stored collection of another player, `None` if absent or empty.
pub fn view_collection<B: LeaderboardBackend + ?Sized>(
    backend: &B,
    player: &str,
    realm: &str,
) -> Result<Option<RemoteCollectionSummary>, RemoteError> {
    Ok(backend
        .find_collection(player, realm)?
        .and_then(RemoteCollectionSummary::from_payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoreStats;
    use chrono::TimeZone;

    fn pets() -> Vec<PetRecord> {
        vec![
            PetRecord::new(10, "A").with_level(25).with_quality(3),
            PetRecord::new(2, "B").with_level(5).with_quality(1),
            PetRecord::new(7, "C").with_level(12).with_quality(4),
        ]
    }

    #[test]
    fn test_fingerprint_shape() {
        let fp = fingerprint(&pets());
        assert_eq!(fp.len(), 17);
        assert!(fp.starts_with('c'));
        assert!(fp[1..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_ignores_order() {
        let mut reversed = pets();
        reversed.reverse();
        assert_eq!(fingerprint(&pets()), fingerprint(&reversed));
    }

    #[test]
    fn test_fingerprint_changes_with_level() {
        let mut changed = pets();
        changed[1].level = 6;
        assert_ne!(fingerprint(&pets()), fingerprint(&changed));
    }

    #[test]
    fn test_build_entry() {
        let score = ScoreResult {
            total: 1234,
            quality_score: 0,
            level_score: 0,
            bonus_score: 0,
            stats: ScoreStats {
                unique_count: 3,
                level25_count: 1,
                rare_count: 2,
                ..Default::default()
            },
            unlocked_achievements: Vec::new(),
        };
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let entry = build_entry(&score, "Tester", "Evermoon", &pets(), now);

        assert_eq!(entry.score, 1234);
        assert_eq!(entry.pets, 3);
        assert_eq!(entry.level25, 1);
        assert_eq!(entry.rare_count, 2);
        assert_eq!(entry.created_at, "2024-05-01T12:00:00.000Z");
        assert_eq!(entry.identity(), "Tester-Evermoon");
    }

    #[test]
    fn test_entry_payload_fields() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let score = ScoreResult {
            total: 1,
            quality_score: 1,
            level_score: 0,
            bonus_score: 0,
            stats: ScoreStats::default(),
            unlocked_achievements: Vec::new(),
        };
        let json = serde_json::to_value(build_entry(&score, "A", "B", &pets(), now)).unwrap();
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();

        assert_eq!(
            keys,
            vec![
                "created_at",
                "fingerprint",
                "level25",
                "pets",
                "player",
                "rare_count",
                "realm",
                "score"
            ]
        );
    }

    #[test]
    fn test_sparse_remote_row_deserializes() {
        let row = r#"{"id": 4, "player": "A", "realm": "B", "score": 77}"#;
        let entry: LeaderboardEntry = serde_json::from_str(row).unwrap();
        assert_eq!(entry.score, 77);
        assert_eq!(entry.rare_count, 0);
        assert!(entry.fingerprint.is_empty());
    }

    #[test]
    fn test_collection_row_from_raw_uploader() {
        let row = r#"{
            "player": "Other",
            "realm": "Evermoon",
            "pets": [
                {"speciesID": 40, "name": "Bombay Cat", "level": 12, "qualityID": 3,
                 "quality": "Rare", "familyID": 5, "favorite": 1},
                {"speciesID": "39", "speciesName": "Mechanical Squirrel", "quality": 4,
                 "petType": 10, "level": 25.0},
                {"speciesID": 41}
            ],
            "score": null
        }"#;
        let payload: CollectionPayload = serde_json::from_str(row).unwrap();

        assert_eq!(payload.pets.len(), 3);
        let cat = &payload.pets[0];
        assert_eq!(cat.species_name, "Bombay Cat");
        assert_eq!((cat.level, cat.quality, cat.family), (12, 3, 5));
        assert!(cat.favorite);

        let squirrel = &payload.pets[1];
        assert_eq!(squirrel.species_id, 39);
        assert_eq!((squirrel.level, squirrel.quality, squirrel.family), (25, 4, 10));

        let bare = &payload.pets[2];
        assert_eq!(bare.species_name, "Unknown");
        assert_eq!((bare.level, bare.quality), (1, 0));
        assert!(payload.score.is_none());
    }

    #[test]
    fn test_collection_payload_reads_back_its_own_json() {
        let payload = CollectionPayload {
            player: "A".to_string(),
            realm: "B".to_string(),
            pets: pets(),
            score: Some(9),
            updated_at: None,
        };
        let json = serde_json::to_string(&payload).unwrap();
        let back: CollectionPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);

        let empty: CollectionPayload =
            serde_json::from_str(r#"{"player":"A","realm":"B","pets":null}"#).unwrap();
        assert!(empty.pets.is_empty());
    }

    #[test]
    fn test_rest_requires_url() {
        let settings = LeaderboardSettings::default();
        assert!(matches!(
            RestLeaderboard::new(&settings),
            Err(RemoteError::NotConfigured)
        ));
    }
}
