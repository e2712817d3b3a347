//! Parsers for the two TauriPets export formats.
//!
//! - **Copy format**: the text the addon puts on the clipboard. One header line
//!   `TAURIPETS:<player>:<realm>:<date>:<owned>:<total>:<addonScore>` followed by
//!   one pipe-delimited line per pet:
//!   `speciesID|speciesName|petType|level|quality|health|power|speed|favorite`.
//! - **Saved variables**: the addon's `SavedVariables` Lua dump, with the data
//!   under either `TauriPetsGUI_Export` or `TauriPetsDB`.
//!
//! Both parsers are tolerant on purpose. Exports come from several addon
//! versions with slightly different shapes, so fields are pulled out with
//! patterns over an allowlist and anything missing is left for the normalizer
//! to default. Only structural problems (wrong header, no pet table) are
//! errors.

use super::normalize::normalize_collection;
use crate::models::{CollectionRecord, RawCollection, RawPet};
use regex::Regex;
use thiserror::Error;

/// Header tag of the copy format
pub const COPY_FORMAT_TAG: &str = "TAURIPETS";

/// Root table names the saved-variables dump may use
pub const ROOT_TABLES: [&str; 2] = ["TauriPetsGUI_Export", "TauriPetsDB"];

const DEFAULT_PLAYER: &str = "Unknown";
const DEFAULT_REALM: &str = "TauriWoW";
const DEFAULT_SPECIES_NAME: &str = "Unknown";

const STRING_FIELDS: [&str; 7] = [
    "name",
    "speciesName",
    "customName",
    "quality",
    "family",
    "petID",
    "breed",
];

const INTEGER_FIELDS: [&str; 8] = [
    "speciesID",
    "familyID",
    "level",
    "qualityID",
    "health",
    "power",
    "speed",
    "petType",
];

const BOOLEAN_FIELDS: [&str; 4] = ["favorite", "canBattle", "isTradeable", "isUnique"];

/// Errors for input that cannot be turned into a collection.
///
/// The messages are shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Empty data")]
    EmptyData,

    #[error("Invalid format")]
    InvalidFormat,

    #[error("No pets found")]
    NoPetsFound,

    #[error("Could not find pet data")]
    PetDataNotFound,

    #[error("Unrecognized format")]
    UnrecognizedFormat,
}

/// Which export format a piece of text is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    CopyFormat,
    SavedVariables,
}

/// Sniff the export format from the text itself.
///
/// File extensions are never consulted: players paste saved-variables dumps
/// and save clipboard exports as `.lua` often enough that only content is
/// reliable.
pub fn detect_format(text: &str) -> Result<ExportFormat, FormatError> {
    let trimmed = strip_bom(text).trim();
    if trimmed.is_empty() {
        return Err(FormatError::EmptyData);
    }

    if trimmed.starts_with(&format!("{}:", COPY_FORMAT_TAG)) {
        Ok(ExportFormat::CopyFormat)
    } else if ROOT_TABLES.iter().any(|root| trimmed.contains(root)) {
        Ok(ExportFormat::SavedVariables)
    } else {
        Err(FormatError::UnrecognizedFormat)
    }
}

/// Drop a leading UTF-8 byte order mark, which `str::trim` keeps.
fn strip_bom(text: &str) -> &str {
    text.trim_start_matches('\u{feff}')
}

/// Parse an integer the way the addon's own web tooling does: skip leading
/// whitespace, accept a sign, take the leading digit run and ignore the rest.
pub fn parse_leading_int(field: &str) -> Option<i64> {
    let s = field.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Parse an integer, substituting `default` for unparseable or zero values.
fn int_or(field: &str, default: i64) -> i64 {
    parse_leading_int(field)
        .filter(|&v| v != 0)
        .unwrap_or(default)
}

/// Parse a non-negative header count; zero and garbage both mean "not given".
fn count_field(field: Option<&str>) -> Option<u32> {
    field
        .and_then(parse_leading_int)
        .and_then(|v| u32::try_from(v).ok())
        .filter(|&v| v != 0)
}

fn non_empty_or(field: Option<&str>, default: &str) -> String {
    match field {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => default.to_string(),
    }
}

/// Split a `Name-Realm` identity on the first dash. Extra dashes stay in the realm.
pub fn split_player_identity(identity: &str) -> (String, String) {
    let (name, realm) = identity.split_once('-').unwrap_or((identity, ""));
    (
        non_empty_or(Some(name), DEFAULT_PLAYER),
        non_empty_or(Some(realm), DEFAULT_REALM),
    )
}

/// Parser for both export formats.
///
/// Regex patterns are compiled once at construction; keep one parser around
/// rather than building a new one per export.
pub struct ExportParser {
    /// `TauriPetsGUI_Export = {`
    gui_root_pattern: Regex,
    /// `TauriPetsDB = {`
    db_root_pattern: Regex,
    player_pattern: Regex,
    export_date_pattern: Regex,
    total_pets_pattern: Regex,
    max_pets_pattern: Regex,
    /// `["pets"] = { ... }, ["player"]`: the pet table when it precedes the player field
    pets_section_pattern: Regex,
    /// Fallback: the widest `["pets"] = { ... }` that closes the root table
    pets_section_wide_pattern: Regex,
    /// `}, -- [n]`: the marker the Lua serializer writes after each array entry
    entry_separator_pattern: Regex,
    string_fields: Vec<(&'static str, Regex)>,
    integer_fields: Vec<(&'static str, Regex)>,
    boolean_fields: Vec<(&'static str, Regex)>,
}

impl ExportParser {
    /// Create a new ExportParser with compiled regex patterns
    pub fn new() -> Self {
        let field = |name: &str, value: &str| {
            Regex::new(&format!(
                r#"\["{}"\]\s*=\s*{}"#,
                regex::escape(name),
                value
            ))
            .expect("Invalid field regex")
        };

        Self {
            gui_root_pattern: Regex::new(r"TauriPetsGUI_Export\s*=\s*\{")
                .expect("Invalid root regex"),
            db_root_pattern: Regex::new(r"TauriPetsDB\s*=\s*\{").expect("Invalid root regex"),
            player_pattern: field("player", r#""([^"]+)""#),
            export_date_pattern: field("exportDate", r#""([^"]+)""#),
            total_pets_pattern: field("totalPets", r"(\d+)"),
            max_pets_pattern: field("maxPets", r"(\d+)"),
            pets_section_pattern: Regex::new(r#"\["pets"\]\s*=\s*\{([\s\S]*?)\},\s*\["player"\]"#)
                .expect("Invalid pets section regex"),
            pets_section_wide_pattern: Regex::new(r#"\["pets"\]\s*=\s*\{([\s\S]+)\}\s*,?\s*\}"#)
                .expect("Invalid pets section regex"),
            entry_separator_pattern: Regex::new(r"\},\s*--\s*\[\d+\]")
                .expect("Invalid entry separator regex"),
            string_fields: STRING_FIELDS
                .iter()
                .map(|&name| (name, field(name, r#""([^"]*)""#)))
                .collect(),
            integer_fields: INTEGER_FIELDS
                .iter()
                .map(|&name| (name, field(name, r"(-?\d+)")))
                .collect(),
            boolean_fields: BOOLEAN_FIELDS
                .iter()
                .map(|&name| (name, field(name, r"(true|false)")))
                .collect(),
        }
    }

    /// Detect the format and parse, without normalizing.
    pub fn parse(&self, text: &str) -> Result<RawCollection, FormatError> {
        match detect_format(text)? {
            ExportFormat::CopyFormat => self.parse_copy_format(text),
            ExportFormat::SavedVariables => self.parse_saved_variables(text),
        }
    }

    /// Parse, normalize and validate an export.
    ///
    /// All-or-nothing: either a complete, non-empty collection comes back or
    /// an error does, never a partial record.
    pub fn load_collection(&self, text: &str) -> Result<CollectionRecord, FormatError> {
        let raw = self.parse(text)?;
        let collection = normalize_collection(raw);

        if collection.pets.is_empty() {
            tracing::warn!("Export for {} contained no usable pets", collection.identity());
            return Err(FormatError::NoPetsFound);
        }

        tracing::info!(
            "Loaded collection for {}: {} pets ({} owned, {} obtainable)",
            collection.identity(),
            collection.pets.len(),
            collection.owned_pets,
            collection.total_pets
        );
        Ok(collection)
    }

    /// Parse the clipboard copy format.
    pub fn parse_copy_format(&self, text: &str) -> Result<RawCollection, FormatError> {
        let trimmed = strip_bom(text).trim();
        if trimmed.is_empty() {
            return Err(FormatError::EmptyData);
        }

        let mut lines = trimmed.lines();
        let header_line = lines.next().ok_or(FormatError::EmptyData)?.trim();
        let header: Vec<&str> = header_line.split(':').collect();
        if header.first().copied() != Some(COPY_FORMAT_TAG) {
            return Err(FormatError::InvalidFormat);
        }

        let mut collection = RawCollection {
            player_name: non_empty_or(header.get(1).copied(), DEFAULT_PLAYER),
            realm_name: non_empty_or(header.get(2).copied(), DEFAULT_REALM),
            export_date: header
                .get(3)
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string()),
            owned_pets: count_field(header.get(4).copied()),
            total_pets: count_field(header.get(5).copied()),
            addon_score: count_field(header.get(6).copied()),
            pets: Vec::new(),
        };

        let mut skipped = 0usize;
        for line in lines.map(str::trim).filter(|l| !l.is_empty()) {
            let parts: Vec<&str> = line.split('|').collect();
            if parts.len() < 8 {
                skipped += 1;
                tracing::debug!("Skipping short pet line ({} fields): {}", parts.len(), line);
                continue;
            }

            collection.pets.push(RawPet {
                species_id: Some(int_or(parts[0], 0)),
                species_name: Some(non_empty_or(Some(parts[1]), DEFAULT_SPECIES_NAME)),
                pet_type: Some(int_or(parts[2], 0)),
                level: Some(int_or(parts[3], 1)),
                quality: Some(int_or(parts[4], 0)),
                health: Some(int_or(parts[5], 0)),
                power: Some(int_or(parts[6], 0)),
                speed: Some(int_or(parts[7], 0)),
                favorite: Some(parts.get(8).copied() == Some("1")),
                ..Default::default()
            });
        }

        if collection.pets.is_empty() {
            return Err(FormatError::NoPetsFound);
        }

        tracing::debug!(
            "Parsed copy format: {} pets, {} lines skipped",
            collection.pets.len(),
            skipped
        );
        Ok(collection)
    }

    /// Parse a `SavedVariables` Lua dump.
    pub fn parse_saved_variables(&self, content: &str) -> Result<RawCollection, FormatError> {
        let root = if self.gui_root_pattern.is_match(content) {
            ROOT_TABLES[0]
        } else if self.db_root_pattern.is_match(content) {
            ROOT_TABLES[1]
        } else {
            return Err(FormatError::PetDataNotFound);
        };
        tracing::debug!("Found saved variables root table {}", root);

        let mut collection = RawCollection::default();

        let section = self
            .pets_section_pattern
            .captures(content)
            .or_else(|| self.pets_section_wide_pattern.captures(content))
            .and_then(|caps| caps.get(1));

        // Some addon variants repeat ["player"] inside pet entries; the root
        // table's own key wins.
        let identity = section
            .and_then(|m| {
                self.player_pattern
                    .captures(&content[..m.start()])
                    .or_else(|| self.player_pattern.captures(&content[m.end()..]))
            })
            .or_else(|| self.player_pattern.captures(content));
        if let Some(caps) = identity {
            let (player, realm) = split_player_identity(&caps[1]);
            collection.player_name = player;
            collection.realm_name = realm;
        }

        collection.export_date = self
            .export_date_pattern
            .captures(content)
            .map(|caps| caps[1].to_string());
        collection.owned_pets = self
            .total_pets_pattern
            .captures(content)
            .and_then(|caps| caps[1].parse().ok())
            .filter(|&v: &u32| v != 0);
        collection.total_pets = self
            .max_pets_pattern
            .captures(content)
            .and_then(|caps| caps[1].parse().ok())
            .filter(|&v: &u32| v != 0);

        match section {
            Some(section) => collection.pets = self.parse_pet_blocks(section.as_str()),
            None => tracing::warn!("No pets table found under {}", root),
        }

        Ok(collection)
    }

    /// Split a pets table into per-entry blocks and extract each one.
    fn parse_pet_blocks(&self, section: &str) -> Vec<RawPet> {
        let mut pets = Vec::new();
        let mut discarded = 0usize;

        for block in self.entry_separator_pattern.split(section) {
            if block.trim().is_empty() || !block.contains("speciesID") {
                continue;
            }

            let pet = self.parse_pet_block(block);
            if pet.display_name().is_some() {
                pets.push(pet);
            } else {
                discarded += 1;
            }
        }

        if discarded > 0 {
            tracing::debug!("Discarded {} pet entries without a name", discarded);
        }
        pets
    }

    /// Extract the allowlisted attributes from one pet entry.
    fn parse_pet_block(&self, block: &str) -> RawPet {
        let mut pet = RawPet::default();

        for (name, pattern) in &self.string_fields {
            let Some(caps) = pattern.captures(block) else {
                continue;
            };
            let value = Some(caps[1].to_string());
            match *name {
                "name" => pet.name = value,
                "speciesName" => pet.species_name = value,
                "customName" => pet.custom_name = value,
                "quality" => pet.quality_label = value,
                "family" => pet.family_label = value,
                "petID" => pet.pet_id = value,
                "breed" => pet.breed = value,
                _ => {}
            }
        }

        for (name, pattern) in &self.integer_fields {
            let Some(value) = pattern
                .captures(block)
                .and_then(|caps| caps[1].parse::<i64>().ok())
            else {
                continue;
            };
            match *name {
                "speciesID" => pet.species_id = Some(value),
                "familyID" => pet.family_id = Some(value),
                "level" => pet.level = Some(value),
                "qualityID" => pet.quality_id = Some(value),
                "health" => pet.health = Some(value),
                "power" => pet.power = Some(value),
                "speed" => pet.speed = Some(value),
                "petType" => pet.pet_type = Some(value),
                _ => {}
            }
        }

        for (name, pattern) in &self.boolean_fields {
            let Some(caps) = pattern.captures(block) else {
                continue;
            };
            let value = Some(&caps[1] == "true");
            match *name {
                "favorite" => pet.favorite = value,
                "canBattle" => pet.can_battle = value,
                "isTradeable" => pet.is_tradeable = value,
                "isUnique" => pet.is_unique = value,
                _ => {}
            }
        }

        apply_field_aliases(&mut pet);
        pet
    }
}

impl Default for ExportParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Fold the alternate attribute names older addon versions write onto the
/// canonical ones. Applied the same way whichever root table matched.
fn apply_field_aliases(pet: &mut RawPet) {
    if pet.species_name.as_deref().is_none_or(str::is_empty) {
        if let Some(name) = pet.name.as_ref().filter(|n| !n.is_empty()) {
            pet.species_name = Some(name.clone());
        }
    }

    if pet.pet_type.is_none_or(|v| v == 0) {
        if let Some(family_id) = pet.family_id.filter(|&v| v != 0) {
            pet.pet_type = Some(family_id);
        }
    }

    if pet.quality_id.is_some() {
        pet.quality = pet.quality_id;
    }
}

/// Render a collection in the clipboard copy format.
///
/// Separator characters inside names are replaced with spaces so the output
/// always parses back.
pub fn to_copy_format(collection: &CollectionRecord) -> String {
    let clean = |s: &str| s.replace(['|', ':', '\n', '\r'], " ");

    let mut out = format!(
        "{}:{}:{}:{}:{}:{}:{}",
        COPY_FORMAT_TAG,
        clean(&collection.player_name),
        clean(&collection.realm_name),
        collection.export_date.as_deref().map(clean).unwrap_or_default(),
        collection.owned_pets,
        collection.total_pets,
        collection.addon_score.unwrap_or(0)
    );

    for pet in &collection.pets {
        out.push('\n');
        out.push_str(&format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}",
            pet.species_id,
            pet.species_name.replace(['|', '\n', '\r'], " "),
            pet.family,
            pet.level,
            pet.quality,
            pet.health,
            pet.power,
            pet.speed,
            if pet.favorite { 1 } else { 0 }
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const COPY_EXPORT: &str = "TAURIPETS:Tester:Evermoon:2024-03-01:3:650:1234
39|Mechanical Squirrel|10|25|3|1546|273|273|1
40|Bombay Cat|8|1|1|150|10|10
46|Darkmoon Monkey|5|12|2|800|150|160|0";

    const SAVED_VARIABLES: &str = r#"
TauriPetsGUI_Export = {
	["pets"] = {
		{
			["speciesID"] = 39,
			["speciesName"] = "Mechanical Squirrel",
			["level"] = 25,
			["qualityID"] = 4,
			["familyID"] = 10,
			["favorite"] = true,
			["breed"] = "P/P",
		}, -- [1]
		{
			["speciesID"] = 40,
			["name"] = "Bombay Cat",
			["customName"] = "Whiskers",
			["level"] = 3,
			["quality"] = "Common",
			["petType"] = 8,
		}, -- [2]
		{
			["level"] = 5,
		}, -- [3]
	},
	["player"] = "Tester-Argent-Dawn",
	["exportDate"] = "2024-03-01",
	["totalPets"] = 2,
	["maxPets"] = 650,
}
"#;

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("42"), Some(42));
        assert_eq!(parse_leading_int("  7abc"), Some(7));
        assert_eq!(parse_leading_int("-3"), Some(-3));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("-"), None);
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(COPY_EXPORT), Ok(ExportFormat::CopyFormat));
        assert_eq!(detect_format(SAVED_VARIABLES), Ok(ExportFormat::SavedVariables));
        assert_eq!(detect_format("TauriPetsDB = {}"), Ok(ExportFormat::SavedVariables));
        assert_eq!(detect_format("   \n "), Err(FormatError::EmptyData));
        assert_eq!(
            detect_format("hello world"),
            Err(FormatError::UnrecognizedFormat)
        );
    }

    #[test]
    fn test_parse_copy_format_header() {
        let parser = ExportParser::new();
        let raw = parser.parse_copy_format(COPY_EXPORT).unwrap();

        assert_eq!(raw.player_name, "Tester");
        assert_eq!(raw.realm_name, "Evermoon");
        assert_eq!(raw.export_date.as_deref(), Some("2024-03-01"));
        assert_eq!(raw.owned_pets, Some(3));
        assert_eq!(raw.total_pets, Some(650));
        assert_eq!(raw.addon_score, Some(1234));
    }

    #[test]
    fn test_parse_copy_format_pets() {
        let parser = ExportParser::new();
        let raw = parser.parse_copy_format(COPY_EXPORT).unwrap();

        assert_eq!(raw.pets.len(), 3);
        assert_eq!(raw.pets[0].species_id, Some(39));
        assert_eq!(raw.pets[0].level, Some(25));
        assert_eq!(raw.pets[0].quality, Some(3));
        assert_eq!(raw.pets[0].favorite, Some(true));
        // Missing ninth field
        assert_eq!(raw.pets[1].favorite, Some(false));
        assert_eq!(raw.pets[2].favorite, Some(false));
    }

    #[test]
    fn test_copy_format_header_defaults() {
        let parser = ExportParser::new();
        let raw = parser.parse_copy_format("TAURIPETS\n1|A|1|1|1|1|1|1").unwrap();

        assert_eq!(raw.player_name, "Unknown");
        assert_eq!(raw.realm_name, "TauriWoW");
        assert_eq!(raw.export_date, None);
        assert_eq!(raw.owned_pets, None);
    }

    #[test]
    fn test_copy_format_numeric_fallbacks() {
        let parser = ExportParser::new();
        let raw = parser
            .parse_copy_format("TAURIPETS:A:B\nx|Pet|?|0|bad|-|n/a||1")
            .unwrap();
        let pet = &raw.pets[0];

        assert_eq!(pet.species_id, Some(0));
        assert_eq!(pet.pet_type, Some(0));
        assert_eq!(pet.level, Some(1));
        assert_eq!(pet.quality, Some(0));
        assert_eq!(pet.health, Some(0));
        assert_eq!(pet.power, Some(0));
        assert_eq!(pet.speed, Some(0));
        assert_eq!(pet.favorite, Some(true));
    }

    #[test]
    fn test_copy_format_skips_short_lines() {
        let parser = ExportParser::new();
        let raw = parser
            .parse_copy_format("TAURIPETS:A:B\n1|Short|1\n\n2|Full|1|5|2|1|1|1\r\n")
            .unwrap();

        assert_eq!(raw.pets.len(), 1);
        assert_eq!(raw.pets[0].species_id, Some(2));
    }

    #[test]
    fn test_copy_format_errors() {
        let parser = ExportParser::new();

        assert_eq!(parser.parse_copy_format(""), Err(FormatError::EmptyData));
        assert_eq!(
            parser.parse_copy_format("TAURIPET:A:B\n1|A|1|1|1|1|1|1"),
            Err(FormatError::InvalidFormat)
        );
        assert_eq!(
            parser.parse_copy_format("PETS:TAURIPETS:A\n1|A|1|1|1|1|1|1"),
            Err(FormatError::InvalidFormat)
        );
        assert_eq!(
            parser.parse_copy_format("TAURIPETS:A:B\n1|too|short"),
            Err(FormatError::NoPetsFound)
        );
    }

    #[test]
    fn test_parse_saved_variables_identity() {
        let parser = ExportParser::new();
        let raw = parser.parse_saved_variables(SAVED_VARIABLES).unwrap();

        assert_eq!(raw.player_name, "Tester");
        assert_eq!(raw.realm_name, "Argent-Dawn");
        assert_eq!(raw.export_date.as_deref(), Some("2024-03-01"));
        assert_eq!(raw.owned_pets, Some(2));
        assert_eq!(raw.total_pets, Some(650));
    }

    #[test]
    fn test_parse_saved_variables_pets_and_aliases() {
        let parser = ExportParser::new();
        let raw = parser.parse_saved_variables(SAVED_VARIABLES).unwrap();

        // Third entry has no speciesID and is dropped
        assert_eq!(raw.pets.len(), 2);

        let squirrel = &raw.pets[0];
        assert_eq!(squirrel.species_id, Some(39));
        assert_eq!(squirrel.quality, Some(4));
        assert_eq!(squirrel.pet_type, Some(10));
        assert_eq!(squirrel.favorite, Some(true));
        assert_eq!(squirrel.breed.as_deref(), Some("P/P"));

        let cat = &raw.pets[1];
        assert_eq!(cat.species_name.as_deref(), Some("Bombay Cat"));
        assert_eq!(cat.custom_name.as_deref(), Some("Whiskers"));
        assert_eq!(cat.quality, None);
        assert_eq!(cat.quality_label.as_deref(), Some("Common"));
        assert_eq!(cat.quality(), 0);
        assert_eq!(cat.family(), 8);
    }

    #[test]
    fn test_saved_variables_db_root_matches_gui_root() {
        let parser = ExportParser::new();
        let db_dump = SAVED_VARIABLES.replace("TauriPetsGUI_Export", "TauriPetsDB");

        let gui = parser.parse_saved_variables(SAVED_VARIABLES).unwrap();
        let db = parser.parse_saved_variables(&db_dump).unwrap();
        assert_eq!(gui, db);
    }

    #[test]
    fn test_saved_variables_without_root() {
        let parser = ExportParser::new();
        assert_eq!(
            parser.parse_saved_variables(r#"SomeOtherAddon = { ["pets"] = {} }"#),
            Err(FormatError::PetDataNotFound)
        );
    }

    #[test]
    fn test_saved_variables_missing_player_keeps_empty_identity() {
        let parser = ExportParser::new();
        let raw = parser
            .parse_saved_variables(
                r#"TauriPetsDB = {
	["pets"] = {
		{
			["speciesID"] = 1,
			["speciesName"] = "Pet",
		}, -- [1]
	},
}"#,
            )
            .unwrap();

        assert_eq!(raw.player_name, "");
        assert_eq!(raw.pets.len(), 1);
    }

    #[test]
    fn test_copy_format_with_byte_order_mark() {
        let parser = ExportParser::new();
        let text = format!("\u{feff}{}", COPY_EXPORT);

        assert_eq!(detect_format(&text), Ok(ExportFormat::CopyFormat));
        let collection = parser.load_collection(&text).unwrap();
        assert_eq!(collection.player_name, "Tester");
        assert_eq!(collection.pets.len(), 3);
    }

    #[test]
    fn test_saved_variables_player_inside_pet_entry_ignored() {
        let parser = ExportParser::new();
        let dump = SAVED_VARIABLES.replace(
            r#"["breed"] = "P/P","#,
            r#"["breed"] = "P/P",
			["player"] = "Trader-Elsewhere","#,
        );

        let raw = parser.parse_saved_variables(&dump).unwrap();
        assert_eq!(raw.player_name, "Tester");
        assert_eq!(raw.realm_name, "Argent-Dawn");
        assert_eq!(raw.pets.len(), 2);
    }

    #[test]
    fn test_split_player_identity() {
        assert_eq!(
            split_player_identity("Tester-Argent-Dawn"),
            ("Tester".to_string(), "Argent-Dawn".to_string())
        );
        assert_eq!(
            split_player_identity("Tester"),
            ("Tester".to_string(), "TauriWoW".to_string())
        );
        assert_eq!(
            split_player_identity("-Evermoon"),
            ("Unknown".to_string(), "Evermoon".to_string())
        );
    }

    #[test]
    fn test_load_collection_rejects_empty_saved_variables() {
        let parser = ExportParser::new();
        let result = parser.load_collection(r#"TauriPetsDB = { ["pets"] = { }, ["player"] = "A-B", }"#);
        assert_eq!(result, Err(FormatError::NoPetsFound));
    }

    #[test]
    fn test_to_copy_format_roundtrip() {
        let parser = ExportParser::new();
        let collection = parser.load_collection(COPY_EXPORT).unwrap();

        let text = to_copy_format(&collection);
        let reparsed = parser.load_collection(&text).unwrap();

        assert_eq!(reparsed, collection);
    }
}
