use serde::{Deserialize, Serialize};

/// Highest level a battle pet can reach.
pub const MAX_LEVEL: u8 = 25;

/// Battle pet family (the in-game "pet type").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    Humanoid = 1,
    Dragonkin = 2,
    Flying = 3,
    Undead = 4,
    Critter = 5,
    Magic = 6,
    Elemental = 7,
    Beast = 8,
    Aquatic = 9,
    Mechanical = 10,
}

impl Family {
    pub const ALL: [Family; 10] = [
        Family::Humanoid,
        Family::Dragonkin,
        Family::Flying,
        Family::Undead,
        Family::Critter,
        Family::Magic,
        Family::Elemental,
        Family::Beast,
        Family::Aquatic,
        Family::Mechanical,
    ];

    /// Look up a family by its numeric id. Zero and out-of-range ids are unknown.
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.id() == id)
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Family::Humanoid => "Humanoid",
            Family::Dragonkin => "Dragonkin",
            Family::Flying => "Flying",
            Family::Undead => "Undead",
            Family::Critter => "Critter",
            Family::Magic => "Magic",
            Family::Elemental => "Elemental",
            Family::Beast => "Beast",
            Family::Aquatic => "Aquatic",
            Family::Mechanical => "Mechanical",
        }
    }
}

/// Rarity tier of an owned pet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quality {
    Poor = 0,
    Common = 1,
    Uncommon = 2,
    Rare = 3,
    Epic = 4,
    Legendary = 5,
}

impl Quality {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Quality::Poor),
            1 => Some(Quality::Common),
            2 => Some(Quality::Uncommon),
            3 => Some(Quality::Rare),
            4 => Some(Quality::Epic),
            5 => Some(Quality::Legendary),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Quality::Poor => "Poor",
            Quality::Common => "Common",
            Quality::Uncommon => "Uncommon",
            Quality::Rare => "Rare",
            Quality::Epic => "Epic",
            Quality::Legendary => "Legendary",
        }
    }
}

/// A pet exactly as one of the export parsers extracted it.
///
/// Every field is optional and keeps the addon's own naming. The two export
/// formats populate different subsets (the copy format fills `pet_type` and
/// `quality`, the saved-variables dump may only carry `family_id` and
/// `quality_id`), so nothing outside this type should read those fields
/// directly. Use [`RawPet::quality`] and [`RawPet::family`] instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPet {
    pub species_id: Option<i64>,
    pub name: Option<String>,
    pub species_name: Option<String>,
    pub custom_name: Option<String>,
    pub pet_id: Option<String>,
    pub breed: Option<String>,

    /// Numeric quality as carried by the copy format or aliased from `qualityID`
    pub quality: Option<i64>,
    /// Display label some addon versions write into `["quality"]`
    pub quality_label: Option<String>,
    pub quality_id: Option<i64>,

    pub pet_type: Option<i64>,
    pub family_id: Option<i64>,
    /// Display label some addon versions write into `["family"]`
    pub family_label: Option<String>,

    pub level: Option<i64>,
    pub health: Option<i64>,
    pub power: Option<i64>,
    pub speed: Option<i64>,

    pub favorite: Option<bool>,
    pub can_battle: Option<bool>,
    pub is_tradeable: Option<bool>,
    pub is_unique: Option<bool>,
}

impl RawPet {
    /// Numeric quality, falling back to `qualityID`, then 0.
    pub fn quality(&self) -> i64 {
        self.quality.or(self.quality_id).unwrap_or(0)
    }

    /// Family id, falling back from `petType` to `familyID`, then 0.
    ///
    /// A zero `petType` counts as absent.
    pub fn family(&self) -> i64 {
        self.pet_type
            .filter(|&v| v != 0)
            .or(self.family_id.filter(|&v| v != 0))
            .unwrap_or(0)
    }

    /// Species name, falling back to the generic `name` attribute.
    pub fn display_name(&self) -> Option<&str> {
        self.species_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.name.as_deref().filter(|s| !s.is_empty()))
    }
}

/// Collection as it came out of a parser, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCollection {
    pub player_name: String,
    pub realm_name: String,
    pub export_date: Option<String>,
    pub owned_pets: Option<u32>,
    pub total_pets: Option<u32>,
    pub addon_score: Option<u32>,
    pub pets: Vec<RawPet>,
}

/// Normalized pet, the unit the scoring engine and views consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetRecord {
    #[serde(rename = "speciesID")]
    pub species_id: u32,
    #[serde(rename = "speciesName")]
    pub species_name: String,
    #[serde(rename = "customName", default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    /// Family id 1..=10, 0 when unknown
    #[serde(rename = "petType", default)]
    pub family: u8,
    pub level: u8,
    pub quality: u8,
    #[serde(default)]
    pub health: u32,
    #[serde(default)]
    pub power: u32,
    #[serde(default)]
    pub speed: u32,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
}

impl PetRecord {
    /// Minimal record, mostly useful for building collections by hand.
    pub fn new(species_id: u32, species_name: impl Into<String>) -> Self {
        Self {
            species_id,
            species_name: species_name.into(),
            custom_name: None,
            family: 0,
            level: 1,
            quality: 0,
            health: 0,
            power: 0,
            speed: 0,
            favorite: false,
            breed: None,
        }
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_family(mut self, family: u8) -> Self {
        self.family = family;
        self
    }

    pub fn family_kind(&self) -> Option<Family> {
        Family::from_id(self.family)
    }

    pub fn quality_kind(&self) -> Option<Quality> {
        Quality::from_id(self.quality)
    }

    pub fn is_max_level(&self) -> bool {
        self.level == MAX_LEVEL
    }
}

/// Normalized collection for one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRecord {
    pub player_name: String,
    pub realm_name: String,
    pub export_date: Option<String>,
    pub owned_pets: u32,
    pub total_pets: u32,
    /// Score the in-game addon computed itself, when the export carries one
    pub addon_score: Option<u32>,
    pub pets: Vec<PetRecord>,
}

impl CollectionRecord {
    /// `Name-Realm` display identity.
    pub fn identity(&self) -> String {
        format!("{}-{}", self.player_name, self.realm_name)
    }
}
