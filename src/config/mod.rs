use crate::models::{ScoringConfig, UserConfig};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Prefix of environment variables that override the user config,
/// e.g. `TAURIPETS__LEADERBOARD__URL`.
pub const ENV_PREFIX: &str = "TAURIPETS";

/// Configuration manager for loading and saving YAML configuration files.
///
/// Manages two configuration files:
/// - User config (`TauriPets Config.yaml`): data/log directories, leaderboard connection
/// - Scoring config (`TauriPets Scoring.yaml`): quality points, level multiplier, achievements
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    user_config_path: Utf8PathBuf,
    scoring_config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager, creating `config_dir` if needed.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            user_config_path: config_dir.join("TauriPets Config.yaml"),
            scoring_config_path: config_dir.join("TauriPets Scoring.yaml"),
            config_dir,
        })
    }

    /// Load the user configuration, layering `TAURIPETS__*` environment
    /// variables over the YAML file. Missing file means defaults.
    pub fn load_user_config(&self) -> Result<UserConfig> {
        self.build_user_config(::config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Like [`load_user_config`](Self::load_user_config), with the override
    /// variables taken from `vars` instead of the process environment.
    pub fn load_user_config_with_env(
        &self,
        vars: ::config::Map<String, String>,
    ) -> Result<UserConfig> {
        self.build_user_config(::config::Environment::with_prefix(ENV_PREFIX).source(Some(vars)))
    }

    fn build_user_config(&self, env: ::config::Environment) -> Result<UserConfig> {
        if !self.user_config_path.exists() {
            tracing::warn!(
                "User config file not found at {}, using defaults",
                self.user_config_path
            );
        }

        let settings = ::config::Config::builder()
            .add_source(
                ::config::File::from(self.user_config_path.as_std_path())
                    .format(::config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(env.separator("__").try_parsing(true))
            .build()
            .with_context(|| format!("Failed to read user config: {}", self.user_config_path))?;

        let config: UserConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse user config: {}", self.user_config_path))?;

        tracing::info!("Loaded user config from {}", self.user_config_path);
        Ok(config)
    }

    /// Save the user configuration file.
    pub fn save_user_config(&self, config: &UserConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize user config to YAML")?;

        fs::write(&self.user_config_path, yaml_string)
            .with_context(|| format!("Failed to write user config: {}", self.user_config_path))?;

        tracing::info!("Saved user config to {}", self.user_config_path);
        Ok(())
    }

    /// Load the scoring tables, or the built-in defaults if the file doesn't exist.
    pub fn load_scoring_config(&self) -> Result<ScoringConfig> {
        if !self.scoring_config_path.exists() {
            tracing::debug!(
                "Scoring config not found at {}, using built-in tables",
                self.scoring_config_path
            );
            return Ok(ScoringConfig::default());
        }

        let file_contents = fs::read_to_string(&self.scoring_config_path).with_context(|| {
            format!("Failed to read scoring config: {}", self.scoring_config_path)
        })?;

        let config: ScoringConfig = serde_yaml_ng::from_str(&file_contents).with_context(|| {
            format!("Failed to parse scoring config: {}", self.scoring_config_path)
        })?;

        tracing::info!(
            "Loaded scoring config from {} ({} achievements)",
            self.scoring_config_path,
            config.achievements.len()
        );
        Ok(config)
    }

    /// Save the scoring tables.
    pub fn save_scoring_config(&self, config: &ScoringConfig) -> Result<()> {
        let yaml_string = serde_yaml_ng::to_string(config)
            .context("Failed to serialize scoring config to YAML")?;

        fs::write(&self.scoring_config_path, yaml_string).with_context(|| {
            format!("Failed to write scoring config: {}", self.scoring_config_path)
        })?;

        tracing::info!("Saved scoring config to {}", self.scoring_config_path);
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn user_config_path(&self) -> &Utf8Path {
        &self.user_config_path
    }

    pub fn scoring_config_path(&self) -> &Utf8Path {
        &self.scoring_config_path
    }
}
