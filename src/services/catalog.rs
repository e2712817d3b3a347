use anyhow::{Context, Result};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;

/// Where a pet is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetSource {
    Wild,
    Vendor,
    Drop,
    Quest,
    Achievement,
    Profession,
    Promotion,
    Event,
    Tcg,
    #[serde(other)]
    Unknown,
}

impl PetSource {
    pub fn label(self) -> &'static str {
        match self {
            PetSource::Wild => "Wild",
            PetSource::Vendor => "Vendor",
            PetSource::Drop => "Drop",
            PetSource::Quest => "Quest",
            PetSource::Achievement => "Achievement",
            PetSource::Profession => "Profession",
            PetSource::Promotion => "Promo",
            PetSource::Event => "Event",
            PetSource::Tcg => "TCG",
            PetSource::Unknown => "Other",
        }
    }

    /// Parse the lowercase key used in catalog files.
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_lowercase().as_str() {
            "wild" => PetSource::Wild,
            "vendor" => PetSource::Vendor,
            "drop" => PetSource::Drop,
            "quest" => PetSource::Quest,
            "achievement" => PetSource::Achievement,
            "profession" => PetSource::Profession,
            "promotion" | "promo" => PetSource::Promotion,
            "event" => PetSource::Event,
            "tcg" => PetSource::Tcg,
            _ => PetSource::Unknown,
        }
    }
}

/// One obtainable pet in the reference catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPet {
    #[serde(rename = "speciesID")]
    pub species_id: u32,
    pub name: String,
    #[serde(default)]
    pub family: u8,
    #[serde(default)]
    pub zone: String,
    #[serde(default = "default_source")]
    pub source: PetSource,
    /// Free-form acquisition note, e.g. the vendor's name
    #[serde(rename = "sourceText", default)]
    pub source_text: String,
    #[serde(rename = "isWild", default)]
    pub is_wild: bool,
}

fn default_source() -> PetSource {
    PetSource::Unknown
}

/// Catalog browsing filters. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub search: Option<String>,
    pub zone: Option<String>,
    pub source: Option<PetSource>,
    pub family: Option<u8>,
    /// Hide owned pets. Ignored while nothing is owned.
    pub missing_only: bool,
}

/// Owned / missing split of a filtered catalog listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogCounts {
    pub shown: usize,
    pub owned: usize,
    pub missing: usize,
}

/// Static table of every obtainable pet.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCatalog {
    pets: Vec<CatalogPet>,
}

impl ReferenceCatalog {
    pub fn new(pets: Vec<CatalogPet>) -> Self {
        Self { pets }
    }

    /// Load a catalog file. `.yaml`/`.yml` files are read as YAML, anything
    /// else as JSON.
    pub fn load<P: AsRef<Utf8Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read pet catalog: {}", path))?;

        let pets: Vec<CatalogPet> = match path.extension() {
            Some("yaml") | Some("yml") => serde_yaml_ng::from_str(&contents)
                .with_context(|| format!("Failed to parse pet catalog: {}", path))?,
            _ => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse pet catalog: {}", path))?,
        };

        tracing::info!("Loaded {} catalog pets from {}", pets.len(), path);
        Ok(Self::new(pets))
    }

    pub fn len(&self) -> usize {
        self.pets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pets.is_empty()
    }

    pub fn pets(&self) -> &[CatalogPet] {
        &self.pets
    }

    pub fn get(&self, species_id: u32) -> Option<&CatalogPet> {
        self.pets.iter().find(|p| p.species_id == species_id)
    }

    /// Distinct non-empty zones, sorted.
    pub fn zones(&self) -> Vec<&str> {
        self.pets
            .iter()
            .map(|p| p.zone.as_str())
            .filter(|z| !z.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Matching pets: owned first, then by zone, then by name.
    pub fn filter(&self, filter: &CatalogFilter, owned: &BTreeSet<u32>) -> Vec<&CatalogPet> {
        let search = filter
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let hide_owned = filter.missing_only && !owned.is_empty();

        let mut pets: Vec<&CatalogPet> = self
            .pets
            .iter()
            .filter(|p| {
                search
                    .as_deref()
                    .is_none_or(|s| p.name.to_lowercase().contains(s))
            })
            .filter(|p| filter.zone.as_deref().is_none_or(|z| p.zone == z))
            .filter(|p| filter.source.is_none_or(|s| p.source == s))
            .filter(|p| filter.family.is_none_or(|f| p.family == f))
            .filter(|p| !hide_owned || !owned.contains(&p.species_id))
            .collect();

        pets.sort_by(|a, b| {
            let a_owned = owned.contains(&a.species_id);
            let b_owned = owned.contains(&b.species_id);
            b_owned
                .cmp(&a_owned)
                .then_with(|| a.zone.cmp(&b.zone))
                .then_with(|| a.name.cmp(&b.name))
        });
        pets
    }

    pub fn counts(pets: &[&CatalogPet], owned: &BTreeSet<u32>) -> CatalogCounts {
        let owned_count = pets
            .iter()
            .filter(|p| owned.contains(&p.species_id))
            .count();
        CatalogCounts {
            shown: pets.len(),
            owned: owned_count,
            missing: pets.len() - owned_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    const CATALOG_JSON: &str = r#"[
        {"speciesID": 39, "name": "Mechanical Squirrel", "family": 10, "zone": "", "source": "profession", "sourceText": "Engineering"},
        {"speciesID": 379, "name": "Squirrel", "family": 5, "zone": "Elwynn Forest", "source": "wild", "isWild": true},
        {"speciesID": 40, "name": "Bombay Cat", "family": 5, "zone": "Elwynn Forest", "source": "vendor"},
        {"speciesID": 68, "name": "Crimson Snake", "family": 8, "zone": "Durotar", "source": "mystery"}
    ]"#;

    fn catalog() -> ReferenceCatalog {
        ReferenceCatalog::new(serde_json::from_str(CATALOG_JSON).unwrap())
    }

    #[test]
    fn test_unknown_source_maps_to_other() {
        let catalog = catalog();
        let snake = catalog.get(68).unwrap();
        assert_eq!(snake.source, PetSource::Unknown);
        assert_eq!(snake.source.label(), "Other");
        assert_eq!(PetSource::from_key("promotion").label(), "Promo");
    }

    #[test]
    fn test_zones_are_distinct_and_sorted() {
        assert_eq!(catalog().zones(), vec!["Durotar", "Elwynn Forest"]);
    }

    #[test]
    fn test_owned_pets_sort_first() {
        let catalog = catalog();
        let owned = BTreeSet::from([68]);
        let pets = catalog.filter(&CatalogFilter::default(), &owned);

        let ids: Vec<u32> = pets.iter().map(|p| p.species_id).collect();
        assert_eq!(ids, vec![68, 39, 40, 379]);

        let counts = ReferenceCatalog::counts(&pets, &owned);
        assert_eq!(counts.owned, 1);
        assert_eq!(counts.missing, 3);
    }

    #[test]
    fn test_missing_only_ignored_without_collection() {
        let catalog = catalog();
        let filter = CatalogFilter {
            missing_only: true,
            ..Default::default()
        };

        assert_eq!(catalog.filter(&filter, &BTreeSet::new()).len(), 4);
        assert_eq!(catalog.filter(&filter, &BTreeSet::from([40, 379])).len(), 2);
    }

    #[test]
    fn test_combined_filters() {
        let catalog = catalog();
        let filter = CatalogFilter {
            search: Some("SQUIRREL".to_string()),
            source: Some(PetSource::Wild),
            ..Default::default()
        };
        let pets = catalog.filter(&filter, &BTreeSet::new());
        assert_eq!(pets.len(), 1);
        assert!(pets[0].is_wild);

        let filter = CatalogFilter {
            zone: Some("Elwynn Forest".to_string()),
            family: Some(5),
            ..Default::default()
        };
        let names: Vec<_> = catalog
            .filter(&filter, &BTreeSet::new())
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["Bombay Cat", "Squirrel"]);
    }

    #[test]
    fn test_load_yaml_and_json() {
        let temp_dir = TempDir::new().unwrap();
        let dir = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();

        let json_path = dir.join("pets.json");
        fs::write(&json_path, CATALOG_JSON).unwrap();
        assert_eq!(ReferenceCatalog::load(&json_path).unwrap().len(), 4);

        let yaml_path = dir.join("pets.yaml");
        fs::write(
            &yaml_path,
            "- speciesID: 39\n  name: Mechanical Squirrel\n  family: 10\n  source: profession\n",
        )
        .unwrap();
        let catalog = ReferenceCatalog::load(&yaml_path).unwrap();
        assert_eq!(catalog.get(39).unwrap().source, PetSource::Profession);
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(ReferenceCatalog::load("does/not/exist.json").is_err());
    }
}
