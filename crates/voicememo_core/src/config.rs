//! Engine tuning configuration.
//!
//! # Responsibility
//! - Hold context-budget and matcher thresholds used by core callers.
//! - Load overrides from an optional TOML file.
//!
//! # Invariants
//! - Every field has a default; a missing file yields `EngineConfig::default()`.
//! - Loaded values are validated before being returned.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_MAX_CONTEXT_CHARS: usize = 12_000;
const DEFAULT_MAX_CONTEXT_NOTES: usize = 50;
const DEFAULT_FALLBACK_NOTES: usize = 5;
const DEFAULT_AUTO_COMPLETE_CONFIDENCE: f64 = 1.0;

/// Limits applied when rendering notes into answer context.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContextBudget {
    /// Maximum rendered context length, in characters.
    pub max_chars: usize,
    /// Maximum number of notes rendered.
    pub max_notes: usize,
    /// Most-recent notes used when nothing scores above zero.
    pub fallback_notes: usize,
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CONTEXT_CHARS,
            max_notes: DEFAULT_MAX_CONTEXT_NOTES,
            fallback_notes: DEFAULT_FALLBACK_NOTES,
        }
    }
}

/// Policy for consuming task completion candidates.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Candidates at or above this confidence are completed without review.
    pub auto_complete_confidence: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            auto_complete_confidence: DEFAULT_AUTO_COMPLETE_CONFIDENCE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub context: ContextBudget,
    pub matcher: MatcherConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.context.max_chars == 0 {
            return Err(ConfigError::Invalid(
                "context.max_chars must be greater than zero".to_string(),
            ));
        }
        if self.context.max_notes == 0 {
            return Err(ConfigError::Invalid(
                "context.max_notes must be greater than zero".to_string(),
            ));
        }
        if self.context.fallback_notes == 0 {
            return Err(ConfigError::Invalid(
                "context.fallback_notes must be greater than zero".to_string(),
            ));
        }
        let confidence = self.matcher.auto_complete_confidence;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(ConfigError::Invalid(format!(
                "matcher.auto_complete_confidence must be within [0, 1], got {confidence}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid TOML config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Parses and validates TOML config text.
pub fn parse_config(content: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Loads config from `path`, falling back to defaults when the file is absent.
pub fn load_config(path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(EngineConfig::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}
