//! Run configuration, loaded from `config.yaml`.
//!
//! The user file is deep-merged over the serialized defaults, so a file only
//! needs the keys it wants to change. Unknown keys are ignored. Values that
//! parse but make no sense are corrected in place with a warning; a file that
//! cannot be read or parsed at all falls back to the defaults entirely.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use tracing::{error, info, warn};

use crate::error::ConfigError;
use crate::importance::ImportanceLevel;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DigestConfig {
    #[serde(default)]
    pub importance: ScoringConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub format: FormatConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

/// Weights and thresholds for the importance scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(rename = "commit_types", default = "default_commit_types")]
    pub commit_type_weights: BTreeMap<String, u32>,
    #[serde(rename = "change_sizes", default)]
    pub size_buckets: SizeBuckets,
    #[serde(rename = "file_types", default)]
    pub file_type_weights: FileTypeWeights,
    #[serde(rename = "scopes", default)]
    pub scope_thresholds: ScopeThresholds,
    #[serde(rename = "thresholds", default)]
    pub level_thresholds: LevelThresholds,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            commit_type_weights: default_commit_types(),
            size_buckets: SizeBuckets::default(),
            file_type_weights: FileTypeWeights::default(),
            scope_thresholds: ScopeThresholds::default(),
            level_thresholds: LevelThresholds::default(),
        }
    }
}

fn default_commit_types() -> BTreeMap<String, u32> {
    [
        ("feat", 8),
        ("fix", 7),
        ("perf", 6),
        ("refactor", 5),
        ("test", 3),
        ("docs", 2),
        ("ci", 2),
        ("chore", 1),
        ("style", 1),
        ("build", 1),
        ("other", 3),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Changed-line thresholds; a commit must exceed a threshold to enter the bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeBuckets {
    pub large: u64,
    pub medium: u64,
    pub small: u64,
}

impl Default for SizeBuckets {
    fn default() -> Self {
        Self {
            large: 500,
            medium: 100,
            small: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTypeWeights {
    pub core: u32,
    pub config: u32,
    pub test: u32,
    pub doc: u32,
}

impl Default for FileTypeWeights {
    fn default() -> Self {
        Self {
            core: 2,
            config: 1,
            test: 1,
            doc: 0,
        }
    }
}

/// File-count thresholds for the scope weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeThresholds {
    pub wide: usize,
    pub medium: usize,
}

impl Default for ScopeThresholds {
    fn default() -> Self {
        Self { wide: 5, medium: 3 }
    }
}

/// Score cutoffs; `high` is expected to be strictly greater than `medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelThresholds {
    pub high: u32,
    pub medium: u32,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self { high: 10, medium: 6 }
    }
}

/// Pacing and retry settings for the LLM calls.
///
/// Values are signed so that a negative entry in the file can be detected
/// and replaced instead of failing the whole parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default)]
    pub delays: Delays,
    #[serde(default)]
    pub backoff: BackoffConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delays {
    pub fast: i64,
    pub normal: i64,
    pub slow: i64,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            fast: 5,
            normal: 10,
            slow: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    pub initial: i64,
    pub max: i64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: 10,
            max: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: i64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

/// Report layout settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatConfig {
    #[serde(default = "default_true", deserialize_with = "lenient_bool")]
    pub enable_toc: bool,
    #[serde(default = "default_true", deserialize_with = "lenient_bool")]
    pub enable_grouping: bool,
    #[serde(default = "default_true", deserialize_with = "lenient_bool")]
    pub enable_stats: bool,
    #[serde(default)]
    pub diff: DiffConfig,
    /// Ceiling for the rendered report; GitHub rejects issue bodies above 65536.
    #[serde(default = "default_max_body_chars")]
    pub max_body_chars: usize,
    /// Offset used for report dates and the commit table.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            enable_toc: true,
            enable_grouping: true,
            enable_stats: true,
            diff: DiffConfig::default(),
            max_body_chars: default_max_body_chars(),
            utc_offset_hours: default_utc_offset_hours(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_body_chars() -> usize {
    65_536
}

/// Smallest accepted report size; leaves room for the truncation notice.
const MIN_BODY_CHARS: usize = 1_024;

fn default_utc_offset_hours() -> i32 {
    8
}

/// Patch truncation for the user prompt, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffConfig {
    pub truncate_threshold: usize,
    pub truncate_to: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            truncate_threshold: 50_000,
            truncate_to: 50_000,
        }
    }
}

/// Model call settings not supplied through the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Use this level's prompt template for every commit.
    #[serde(default, deserialize_with = "lenient_level")]
    pub force_level: Option<ImportanceLevel>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            force_level: None,
            timeout: default_timeout(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_tokens() -> u32 {
    2048
}

/// Accept any YAML value for a flag; anything but a boolean becomes `true`.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        other => {
            warn!("Config warning: format flag must be a boolean, got {:?}; using true", other);
            Ok(true)
        }
    }
}

/// Accept any YAML value for `llm.force_level`; unknown levels become `None`.
fn lenient_level<'de, D>(deserializer: D) -> Result<Option<ImportanceLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => match s.parse::<ImportanceLevel>() {
            Ok(level) => Ok(Some(level)),
            Err(_) => {
                warn!("Config warning: llm.force_level must be low/medium/high or null, got '{}'", s);
                Ok(None)
            }
        },
        other => {
            warn!("Config warning: llm.force_level must be low/medium/high or null, got {:?}", other);
            Ok(None)
        }
    }
}

impl DigestConfig {
    /// Parse a YAML document and merge it over the defaults.
    ///
    /// An empty document yields the defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let user: Value = serde_yaml::from_str(text).map_err(ConfigError::ParseFailed)?;
        if user.is_null() {
            return Ok(Self::default());
        }

        let mut merged =
            serde_yaml::to_value(Self::default()).map_err(ConfigError::ParseFailed)?;
        merge_values(&mut merged, user);

        let config: Self = serde_yaml::from_value(merged).map_err(ConfigError::ParseFailed)?;
        Ok(config.validated())
    }

    /// Correct out-of-range values in place, logging a warning for each.
    ///
    /// Ill-ordered level thresholds are only reported: bucketing still uses
    /// them as given.
    pub fn validated(mut self) -> Self {
        let thresholds = self.importance.level_thresholds;
        if thresholds.high <= thresholds.medium {
            warn!(
                "Config warning: importance.thresholds.high ({}) should be greater than medium ({})",
                thresholds.high, thresholds.medium
            );
        }

        let defaults = Delays::default();
        let delays = &mut self.rate_limit.delays;
        for (name, value, default) in [
            ("fast", &mut delays.fast, defaults.fast),
            ("normal", &mut delays.normal, defaults.normal),
            ("slow", &mut delays.slow, defaults.slow),
        ] {
            if *value < 0 {
                warn!(
                    "Config warning: rate_limit.delays.{} must not be negative, using default {}",
                    name, default
                );
                *value = default;
            }
        }

        let backoff_defaults = BackoffConfig::default();
        let backoff = &mut self.rate_limit.backoff;
        if backoff.initial < 0 {
            warn!("Config warning: rate_limit.backoff.initial must not be negative, using default");
            backoff.initial = backoff_defaults.initial;
        }
        if backoff.max < backoff.initial {
            warn!("Config warning: rate_limit.backoff.max must be >= initial, using initial");
            backoff.max = backoff.initial;
        }

        if self.rate_limit.retry.max_attempts < 1 {
            warn!("Config warning: rate_limit.retry.max_attempts must be >= 1");
            self.rate_limit.retry.max_attempts = 1;
        }

        let diff = &mut self.format.diff;
        if diff.truncate_to > diff.truncate_threshold {
            warn!("Config warning: format.diff.truncate_to exceeds truncate_threshold, clamping");
            diff.truncate_to = diff.truncate_threshold;
        }

        if !(-12..=14).contains(&self.format.utc_offset_hours) {
            warn!(
                "Config warning: format.utc_offset_hours {} is out of range, using default",
                self.format.utc_offset_hours
            );
            self.format.utc_offset_hours = default_utc_offset_hours();
        }

        if self.format.max_body_chars < MIN_BODY_CHARS {
            warn!(
                "Config warning: format.max_body_chars {} is below {}, using default",
                self.format.max_body_chars, MIN_BODY_CHARS
            );
            self.format.max_body_chars = default_max_body_chars();
        }

        if self.llm.timeout == 0 {
            warn!("Config warning: llm.timeout must be positive, using default");
            self.llm.timeout = default_timeout();
        }

        self
    }
}

/// Recursively overlay `overlay` onto `base`; mappings merge, everything else replaces.
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Load the configuration, never failing.
///
/// A missing file is normal and logged at info level; unreadable or
/// malformed files are logged as errors. Both fall back to the defaults.
pub fn load_config(path: Option<&Path>) -> DigestConfig {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));

    if !path.exists() {
        info!("Config file {} not found, using defaults", path.display());
        return DigestConfig::default();
    }

    match std::fs::read_to_string(path)
        .map_err(ConfigError::ReadFailed)
        .and_then(|text| DigestConfig::from_yaml_str(&text))
    {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            error!("{}; using defaults", e);
            DigestConfig::default()
        }
    }
}
