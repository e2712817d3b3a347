//! TauriPets - battle pet collection scoring and leaderboard companion
//!
//! Main entry point for the command-line application.
//!
//! # Execution Flow
//!
//! 1. Load `TauriPets Config.yaml` and `TauriPets Scoring.yaml` from the config directory
//! 2. Initialize logging → `<log_dir>/tauripets.<date>`
//! 3. Run the requested subcommand against a [`SessionManager`]
//! 4. Log the run summary
//!
//! # Subcommands
//!
//! - `score <FILE|->`: parse an export, print the score, update the personal best
//! - `best`: show the stored personal best
//! - `submit <FILE|->`: score an export and submit it to the leaderboard
//! - `leaderboard`: show the top scores
//! - `view <PLAYER> <REALM>`: summarize another player's uploaded collection
//! - `catalog [CATALOG]`: browse the reference pet catalog
//! - `pets <FILE|->`: list and filter the pets in an export

use anyhow::{Context, Result, bail};
use camino::Utf8Path;
use clap::{Args, Parser, Subcommand};
use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::time::Instant;
use tauripets::models::{Family, Quality};
use tauripets::services::{
    CatalogFilter, CollectionStats, FileStorage, LeaderboardEntry, PetFilter, PetSource,
    ReferenceCatalog, RestLeaderboard, SubmissionError, fetch_leaderboard, filter_pets,
    submit_recorded_score, sync_collection, to_copy_format, view_collection,
};
use tauripets::{
    APP_NAME, ConfigManager, ExportParser, Metrics, PersonalBestStore, ScoringEngine, Session,
    SessionChange, SessionManager, UserConfig, VERSION, logging,
};

#[derive(Parser)]
#[command(name = "tauripets", version)]
#[command(about = "Score battle pet collections and compare them on the leaderboard", long_about = None)]
struct Cli {
    /// Directory holding TauriPets Config.yaml and TauriPets Scoring.yaml
    #[arg(long, global = true, default_value = "TauriPets Data")]
    config_dir: String,

    /// Also log to the console, at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Filters shared by commands that list the player's own pets.
#[derive(Args, Clone, Default)]
struct PetFilterArgs {
    /// Substring of the species or custom name
    #[arg(short, long)]
    search: Option<String>,

    /// Minimum quality id (0 Poor .. 5 Legendary)
    #[arg(long)]
    min_quality: Option<u8>,

    /// Minimum level
    #[arg(long)]
    min_level: Option<u8>,

    /// Family id (1 Humanoid .. 10 Mechanical)
    #[arg(long)]
    family: Option<u8>,
}

impl From<PetFilterArgs> for PetFilter {
    fn from(args: PetFilterArgs) -> Self {
        PetFilter {
            search: args.search,
            min_quality: args.min_quality,
            min_level: args.min_level,
            family: args.family,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Score an export and update the personal best
    Score {
        /// Export file, or `-` for stdin
        input: String,

        /// Upload the collection so others can view it
        #[arg(long)]
        sync: bool,

        /// Print the collection in the copy format
        #[arg(long)]
        export: bool,
    },

    /// Show the stored personal best
    Best,

    /// Score an export and submit it to the leaderboard
    Submit {
        /// Export file, or `-` for stdin
        input: String,
    },

    /// Show the top scores
    Leaderboard {
        /// Number of entries (defaults to the configured limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Summarize another player's uploaded collection
    View { player: String, realm: String },

    /// Browse the reference pet catalog
    Catalog {
        /// Catalog file (JSON or YAML); defaults to settings.catalog_path
        catalog: Option<String>,

        /// Export whose pets count as owned
        #[arg(long)]
        owned: Option<String>,

        #[arg(short, long)]
        search: Option<String>,

        #[arg(long)]
        zone: Option<String>,

        /// wild, vendor, drop, quest, achievement, profession, promotion, event, tcg
        #[arg(long)]
        source: Option<String>,

        #[arg(long)]
        family: Option<u8>,

        /// Only pets not yet owned
        #[arg(long)]
        missing: bool,

        /// List the catalog's zones instead of its pets
        #[arg(long)]
        zones: bool,
    },

    /// List the pets in an export
    Pets {
        /// Export file, or `-` for stdin
        input: String,

        #[command(flatten)]
        filter: PetFilterArgs,
    },
}

struct App {
    config: UserConfig,
    parser: ExportParser,
    engine: ScoringEngine,
    sessions: SessionManager,
    metrics: Metrics,
}

impl App {
    fn read_input(input: &str) -> Result<String> {
        if input == "-" {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read export from stdin")?;
            return Ok(text);
        }
        fs::read_to_string(input).with_context(|| format!("Failed to read export: {}", input))
    }

    /// Parse and score an export into the session.
    fn load(&self, input: &str) -> Result<Session> {
        let text = Self::read_input(input)?;
        let started = Instant::now();

        let changes = match self.sessions.load_text(&self.parser, &self.engine, &text) {
            Ok(changes) => changes,
            Err(e) => {
                self.metrics.record_parse_failure();
                return Err(e).with_context(|| format!("Could not load {}", input));
            }
        };

        self.metrics.record_collection_loaded(started.elapsed());
        for change in &changes {
            if let SessionChange::ScoreComputed { .. } = change {
                self.metrics.record_score();
            }
            tracing::debug!("Session change: {:?}", change);
        }

        Ok(self.sessions.snapshot())
    }

    fn personal_best_store(&self) -> PersonalBestStore<FileStorage> {
        PersonalBestStore::new(FileStorage::new(&self.config.settings.data_dir))
    }

    fn backend(&self) -> Result<RestLeaderboard> {
        RestLeaderboard::new(&self.config.leaderboard).context(
            "Set leaderboard.url in TauriPets Config.yaml or TAURIPETS__LEADERBOARD__URL",
        )
    }

    fn catalog(&self, path: Option<&str>) -> Result<Option<ReferenceCatalog>> {
        let path = path.unwrap_or(&self.config.settings.catalog_path);
        if path.is_empty() {
            return Ok(None);
        }
        ReferenceCatalog::load(path).map(Some)
    }

    fn score(&self, input: &str, sync: bool, export: bool) -> Result<()> {
        let session = self.load(input)?;
        let (Some(collection), Some(score)) = (&session.collection, &session.score) else {
            bail!("No pets to score in {}", input);
        };

        if export {
            println!("{}", to_copy_format(collection));
            return Ok(());
        }

        let catalog_size = match self.catalog(None) {
            Ok(catalog) => catalog.map(|c| c.len()).unwrap_or(0),
            Err(e) => {
                tracing::warn!("Catalog unavailable: {:#}", e);
                0
            }
        };
        let stats = CollectionStats::compute(collection, catalog_size);

        println!("{}", collection.identity());
        println!(
            "Exported: {}",
            collection.export_date.as_deref().unwrap_or("Unknown")
        );
        println!(
            "Pets: {}  Level 25: {}  Rare+: {}  Epic+: {}  Favorites: {}",
            stats.total, stats.level25, stats.rare, stats.epic, stats.favorites
        );
        if stats.obtainable > 0 {
            println!("Progress: {}", stats.progress_text());
        }
        println!();
        println!("Score: {}", score.summary());
        for achievement in &score.unlocked_achievements {
            println!(
                "  + {} ({}) +{}",
                achievement.name, achievement.description, achievement.bonus
            );
        }

        let outcome =
            self.personal_best_store()
                .save(score, &collection.player_name, &collection.realm_name);
        if outcome.is_new_best {
            self.metrics.record_personal_best();
            println!("New personal best!");
        } else if let Some(best) = outcome.entry {
            println!("Personal best: {} ({})", best.score, best.date);
        }

        if sync {
            match self
                .backend()
                .and_then(|backend| sync_collection(&backend, &session).map_err(Into::into))
            {
                Ok(payload) => {
                    self.metrics.record_submission();
                    println!("Uploaded {} pets", payload.pets.len());
                }
                Err(e) => {
                    self.metrics.record_remote_error();
                    eprintln!("Collection upload failed: {:#}", e);
                }
            }
        }

        Ok(())
    }

    fn best(&self) -> Result<()> {
        match self.personal_best_store().load() {
            Some(best) => {
                println!("{}-{}: {}", best.player, best.realm, best.score);
                println!(
                    "Pets: {}  Level 25: {}  Rare+: {}  Epic+: {}",
                    best.pets, best.level25, best.rare, best.epic
                );
                println!("Recorded: {}", best.date);
            }
            None => println!("No personal best recorded yet"),
        }
        Ok(())
    }

    fn submit(&self, input: &str) -> Result<()> {
        let session = self.load(input)?;
        let backend = self.backend()?;
        let mut store = self.personal_best_store();

        match submit_recorded_score(
            &backend,
            &mut store,
            &session,
            self.config.leaderboard.limit,
        ) {
            Ok((best, outcome)) => {
                if best.is_new_best {
                    self.metrics.record_personal_best();
                    println!("New personal best!");
                }
                self.metrics.record_submission();
                println!(
                    "Score submitted: {} ({})",
                    outcome.entry.score,
                    outcome.entry.identity()
                );
                if let Some(leaderboard) = outcome.leaderboard {
                    print_leaderboard(&leaderboard, Some(&outcome.entry.identity()));
                }
                Ok(())
            }
            Err(e @ SubmissionError::HigherScoreExists { .. }) => {
                println!("{}", e);
                Ok(())
            }
            Err(e) => {
                if let SubmissionError::Remote(_) = e {
                    self.metrics.record_remote_error();
                }
                Err(e).context("Score submission failed")
            }
        }
    }

    fn leaderboard(&self, limit: Option<usize>) -> Result<()> {
        let backend = self.backend()?;
        let limit = limit.unwrap_or(self.config.leaderboard.limit);

        let entries = fetch_leaderboard(&backend, limit).inspect_err(|_| {
            self.metrics.record_remote_error();
        })?;

        let me = self
            .personal_best_store()
            .load()
            .map(|b| format!("{}-{}", b.player, b.realm));
        print_leaderboard(&entries, me.as_deref());
        Ok(())
    }

    fn view(&self, player: &str, realm: &str) -> Result<()> {
        let backend = self.backend()?;
        let summary = view_collection(&backend, player, realm).inspect_err(|_| {
            self.metrics.record_remote_error();
        })?;

        let Some(summary) = summary else {
            println!("Collection not found: {}-{} hasn't uploaded a collection yet", player, realm);
            return Ok(());
        };

        println!("{}-{}'s Collection", summary.player, summary.realm);
        println!(
            "Pets: {}  Level 25: {}  Rare+: {}  Families: {}  Score: {}",
            summary.pet_count,
            summary.level25,
            summary.rare,
            summary.families,
            summary
                .score
                .map(|s| s.to_string())
                .unwrap_or_else(|| "N/A".to_string())
        );

        const SHOWN: usize = 50;
        for pet in summary.pets.iter().take(SHOWN) {
            println!(
                "  {:<32} Lv {:>2}  {}",
                pet.species_name,
                pet.level,
                pet.quality_kind().map(Quality::name).unwrap_or("Common")
            );
        }
        if summary.pet_count > SHOWN {
            println!("  ... and {} more pets", summary.pet_count - SHOWN);
        }
        println!(
            "Last updated: {}",
            summary.updated_at.as_deref().unwrap_or("Unknown")
        );
        Ok(())
    }

    fn catalog_cmd(
        &self,
        path: Option<&str>,
        owned: Option<&str>,
        filter: CatalogFilter,
        zones: bool,
    ) -> Result<()> {
        let Some(catalog) = self.catalog(path)? else {
            bail!("No catalog given and settings.catalog_path is not set");
        };

        if zones {
            for zone in catalog.zones() {
                println!("{}", zone);
            }
            return Ok(());
        }

        let owned_species: BTreeSet<u32> = match owned {
            Some(input) => self.load(input)?.owned_species,
            None => BTreeSet::new(),
        };

        let pets = catalog.filter(&filter, &owned_species);
        for pet in &pets {
            let marker = if owned_species.contains(&pet.species_id) { "*" } else { " " };
            println!(
                "{} {:<32} {:<12} {:<24} {}",
                marker,
                pet.name,
                Family::from_id(pet.family).map(Family::name).unwrap_or("Unknown"),
                pet.zone,
                pet.source.label()
            );
        }

        if owned_species.is_empty() {
            println!("Showing {} pets", pets.len());
        } else {
            let counts = ReferenceCatalog::counts(&pets, &owned_species);
            println!(
                "Showing {} pets ({} owned, {} missing)",
                counts.shown, counts.owned, counts.missing
            );
        }
        Ok(())
    }

    fn pets(&self, input: &str, filter: PetFilter) -> Result<()> {
        let session = self.load(input)?;
        let Some(collection) = &session.collection else {
            bail!("No collection loaded from {}", input);
        };

        let pets = filter_pets(&collection.pets, &filter);
        for pet in &pets {
            println!(
                "{} {:<32} Lv {:>2}  {:<10} {:<10} {:>5}/{:>4}/{:>4}{}",
                if pet.favorite { "*" } else { " " },
                pet.custom_name.as_deref().unwrap_or(&pet.species_name),
                pet.level,
                pet.quality_kind().map(Quality::name).unwrap_or("Poor"),
                pet.family_kind().map(Family::name).unwrap_or("Unknown"),
                pet.health,
                pet.power,
                pet.speed,
                pet.breed
                    .as_deref()
                    .map(|b| format!("  {}", b))
                    .unwrap_or_default()
            );
        }
        println!("Showing {} of {} pets", pets.len(), collection.pets.len());
        Ok(())
    }
}

fn print_leaderboard(entries: &[LeaderboardEntry], highlight: Option<&str>) {
    if entries.is_empty() {
        println!("No scores submitted yet");
        return;
    }

    for (rank, entry) in entries.iter().enumerate() {
        let identity = entry.identity();
        let marker = if highlight == Some(identity.as_str()) { ">" } else { " " };
        println!(
            "{}{:>3}. {:<32} {:>7}  pets {:>4}  lv25 {:>4}",
            marker,
            rank + 1,
            identity,
            entry.score,
            entry.pets,
            entry.level25
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_manager = ConfigManager::new(&cli.config_dir)?;
    let config = config_manager.load_user_config()?;
    let scoring = config_manager.load_scoring_config()?;

    let _guard = logging::setup_logging_with_console(
        Utf8Path::new(&config.settings.log_dir),
        logging::LOG_PREFIX,
        config.settings.debug_mode || cli.verbose,
        cli.verbose,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let app = App {
        config,
        parser: ExportParser::new(),
        engine: ScoringEngine::new(scoring),
        sessions: SessionManager::new(),
        metrics: Metrics::new(),
    };

    let result = match cli.command {
        Commands::Score {
            input,
            sync,
            export,
        } => app.score(&input, sync, export),
        Commands::Best => app.best(),
        Commands::Submit { input } => app.submit(&input),
        Commands::Leaderboard { limit } => app.leaderboard(limit),
        Commands::View { player, realm } => app.view(&player, &realm),
        Commands::Catalog {
            catalog,
            owned,
            search,
            zone,
            source,
            family,
            missing,
            zones,
        } => {
            let filter = CatalogFilter {
                search,
                zone,
                source: source.as_deref().map(PetSource::from_key),
                family,
                missing_only: missing,
            };
            app.catalog_cmd(catalog.as_deref(), owned.as_deref(), filter, zones)
        }
        Commands::Pets { input, filter } => app.pets(&input, filter.into()),
    };

    if let Err(e) = &result {
        tracing::error!("{:#}", e);
    }
    app.metrics.log_summary();
    tracing::info!("Shutdown complete");

    result
}
