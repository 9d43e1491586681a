/// Configuration system for history-mapper
///
/// Supports loading from multiple sources with priority:
/// CLI args > Environment variables > Config file > Defaults
use crate::error::{ConfigError, MapperError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MapperConfig {
    /// Method matching configuration
    #[serde(default)]
    pub matching: MatchingConfig,

    /// History walk configuration
    #[serde(default)]
    pub walk: WalkConfig,

    /// Mirror repository configuration
    #[serde(default)]
    pub mirror: MirrorConfig,
}

/// Method matching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Minimum LCS similarity ratio (0.0 to 1.0) for a candidate to be accepted
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,

    /// Look for the method in other files changed by the same commit when it
    /// disappears from its own file
    #[serde(default = "default_follow_moves")]
    pub follow_moves: bool,
}

/// History walk configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkConfig {
    /// Maximum number of first-parent hops considered between two commits
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

/// Mirror repository configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Directory under which per-instance mirrors are created
    #[serde(default = "default_mirror_root")]
    pub root: PathBuf,
}

fn default_min_similarity() -> f64 {
    0.5
}

fn default_follow_moves() -> bool {
    true
}

fn default_max_steps() -> usize {
    10_000
}

fn default_mirror_root() -> PathBuf {
    crate::paths::PlatformPaths::default_mirror_root()
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_similarity: default_min_similarity(),
            follow_moves: default_follow_moves(),
        }
    }
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
        }
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            root: default_mirror_root(),
        }
    }
}

impl MapperConfig {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, MapperError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: MapperConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location or fall back to defaults
    pub fn load_or_default() -> Result<Self, MapperError> {
        let config_path = crate::paths::PlatformPaths::default_config_path();

        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            Self::from_file(&config_path)
        } else {
            tracing::debug!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), MapperError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::SaveFailed(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), MapperError> {
        if !(0.0..=1.0).contains(&self.matching.min_similarity) {
            return Err(ConfigError::InvalidValue {
                key: "matching.min_similarity".to_string(),
                reason: format!(
                    "must be between 0.0 and 1.0, got {}",
                    self.matching.min_similarity
                ),
            }
            .into());
        }

        if self.walk.max_steps == 0 {
            return Err(ConfigError::InvalidValue {
                key: "walk.max_steps".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if self.mirror.root.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "mirror.root".to_string(),
                reason: "must not be empty".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("HISTORY_MAPPER_MIN_SIMILARITY")
            && let Ok(min_similarity) = value.parse()
        {
            self.matching.min_similarity = min_similarity;
        }

        if let Ok(value) = std::env::var("HISTORY_MAPPER_FOLLOW_MOVES")
            && let Ok(follow_moves) = value.parse()
        {
            self.matching.follow_moves = follow_moves;
        }

        if let Ok(value) = std::env::var("HISTORY_MAPPER_MAX_STEPS")
            && let Ok(max_steps) = value.parse()
        {
            self.walk.max_steps = max_steps;
        }

        if let Ok(root) = std::env::var("HISTORY_MAPPER_MIRROR_ROOT") {
            self.mirror.root = PathBuf::from(root);
        }
    }

    /// Create a new config from the default file with environment overrides
    pub fn new() -> Result<Self, MapperError> {
        let mut config = Self::load_or_default()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }
}
