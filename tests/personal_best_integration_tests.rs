//! Integration tests for the file-backed personal-best store
//!
//! These tests verify:
//! - Entries persist across store instances
//! - Only strictly higher scores replace the stored entry
//! - Corrupt or unwritable storage degrades to "no entry"

use camino::Utf8PathBuf;
use std::fs;
use tauripets::services::{FileStorage, LocalStorage, PERSONAL_BEST_KEY, PersonalBestEntry};
use tauripets::{ExportParser, PersonalBestStore, ScoreResult, ScoringEngine};
use tempfile::TempDir;

fn create_test_data_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = Utf8PathBuf::try_from(temp_dir.path().join("TauriPets Data")).unwrap();
    (temp_dir, data_dir)
}

fn score_with_total(total: u32) -> ScoreResult {
    let mut score = ScoringEngine::default()
        .calculate(&[tauripets::PetRecord::new(1, "Pet")])
        .unwrap();
    score.total = total;
    score
}

#[test]
fn test_entry_persists_across_instances() {
    let (_temp_dir, data_dir) = create_test_data_dir();

    let collection = ExportParser::new()
        .load_collection("TAURIPETS:Tester:Evermoon\n39|Mechanical Squirrel|10|25|4|1|1|1|1")
        .unwrap();
    let score = ScoringEngine::default()
        .calculate(&collection.pets)
        .unwrap();

    {
        let mut store = PersonalBestStore::new(FileStorage::new(&data_dir));
        let outcome = store.save(&score, &collection.player_name, &collection.realm_name);
        assert!(outcome.saved);
        assert!(outcome.is_new_best);
    }

    // The data directory is created on first write
    assert!(data_dir.join("tauripets_personal_best.json").exists());

    let store = PersonalBestStore::new(FileStorage::new(&data_dir));
    let entry = store.load().unwrap();
    assert_eq!(entry.player, "Tester");
    assert_eq!(entry.realm, "Evermoon");
    assert_eq!(entry.score, 10);
    assert_eq!(entry.pets, 1);
    assert_eq!(entry.level25, 1);
    assert_eq!(entry.epic, 1);
    assert_eq!(entry.date.len(), 10);
}

#[test]
fn test_only_strictly_higher_scores_replace() {
    let (_temp_dir, data_dir) = create_test_data_dir();
    let mut store = PersonalBestStore::new(FileStorage::new(&data_dir));

    assert!(store.save(&score_with_total(400), "Tester", "Evermoon").is_new_best);
    assert!(store.save(&score_with_total(500), "Tester", "Evermoon").is_new_best);

    let before = fs::read_to_string(data_dir.join("tauripets_personal_best.json")).unwrap();

    let lower = store.save(&score_with_total(400), "Tester", "Evermoon");
    assert!(!lower.is_new_best);
    assert!(!lower.saved);
    assert_eq!(lower.entry.unwrap().score, 500);

    let equal = store.save(&score_with_total(500), "Alt", "Evermoon");
    assert!(!equal.is_new_best);
    assert_eq!(equal.entry.unwrap().player, "Tester");

    let after = fs::read_to_string(data_dir.join("tauripets_personal_best.json")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_corrupt_file_is_treated_as_absent() {
    let (_temp_dir, data_dir) = create_test_data_dir();
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(data_dir.join("tauripets_personal_best.json"), "{\"score\": \"lots\"").unwrap();

    let mut store = PersonalBestStore::new(FileStorage::new(&data_dir));
    assert!(store.load().is_none());

    let outcome = store.save(&score_with_total(1), "Tester", "Evermoon");
    assert!(outcome.is_new_best);
    assert_eq!(store.load().unwrap().score, 1);
}

#[test]
fn test_unwritable_storage_reports_nothing_saved() {
    let (_temp_dir, data_dir) = create_test_data_dir();
    // A regular file where the data directory should be
    fs::write(&data_dir, "not a directory").unwrap();

    let mut store = PersonalBestStore::new(FileStorage::new(&data_dir));
    let outcome = store.save(&score_with_total(100), "Tester", "Evermoon");

    assert!(!outcome.saved);
    assert!(!outcome.is_new_best);
    assert!(outcome.entry.is_none());
    assert!(store.load().is_none());
}

#[test]
fn test_entry_written_by_other_tools_loads() {
    let (_temp_dir, data_dir) = create_test_data_dir();
    let mut storage = FileStorage::new(&data_dir);
    storage
        .set(
            PERSONAL_BEST_KEY,
            r#"{"player":"Tester","realm":"Evermoon","score":2500,"pets":300,"level25":40,"rare":120,"epic":30,"date":"2024-01-15","timestamp":1705312800000}"#,
        )
        .unwrap();

    let store = PersonalBestStore::new(storage);
    assert_eq!(
        store.load(),
        Some(PersonalBestEntry {
            player: "Tester".to_string(),
            realm: "Evermoon".to_string(),
            score: 2500,
            pets: 300,
            level25: 40,
            rare: 120,
            epic: 30,
            date: "2024-01-15".to_string(),
            timestamp: 1705312800000,
        })
    );
}
