use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MemoriaConfig {
    pub storage: StorageConfig,
    pub retrieval: RetrievalConfig,
    pub location: LocationConfig,
    pub lifecycle: LifecycleConfig,
    pub background: BackgroundConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    pub log_level: String,
}

/// Ranking knobs for the retrieval pipeline.
///
/// The three weights conventionally sum to 1.0 but are used exactly as
/// given — users tune them, so they are never silently normalized.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub max_results: usize,
    /// Candidates below this retrieval probability are discarded.
    pub min_probability: f64,
    /// `d` in the base-level forgetting equation.
    pub decay: f64,
    /// `s` — logistic noise parameter.
    pub noise: f64,
    /// `τ` — logistic threshold.
    pub threshold: f64,
    pub probe_weight: f64,
    pub base_level_weight: f64,
    pub spreading_weight: f64,
    /// Minimum raw similarity for context assembly.
    pub context_min_similarity: f64,
    /// Token budget for context assembly (≈4 chars per token).
    pub context_token_budget: usize,
}

/// Familiarity-model knobs.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LocationConfig {
    /// `α` in `familiarity(n) = 1 − 1/(1 + α·n)`.
    pub familiarity_alpha: f64,
    /// Familiarity at or above this counts as well-known.
    pub well_known_threshold: f64,
    /// Fraction of familiarity removed per decay pass.
    pub decay_factor: f64,
    /// Days without access before a location is eligible for decay.
    pub stale_threshold_days: u32,
    /// Decay floor for ordinary locations.
    pub floor: f64,
    /// Peak familiarity at or above this earns the elevated floor.
    pub sticky_threshold: f64,
    /// Decay floor for locations that were ever sticky.
    pub well_known_floor: f64,
    /// Minimum familiarity for orphan detection.
    pub orphan_min_familiarity: f64,
    /// Days without access before a familiar location counts as orphaned.
    pub orphan_stale_days: u32,
    /// Two accesses within this window count as co-accessed.
    pub co_access_window_minutes: u32,
    /// Strength increments per co-occurrence, by shared context.
    pub strength_same_task_same_activity: f64,
    pub strength_same_task: f64,
    pub strength_same_activity: f64,
    pub strength_baseline: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Model tag embeddings are expected to carry.
    pub model: String,
    /// Model tag for the visual embedding space.
    pub visual_model: String,
    /// Memories regenerated per background batch.
    pub regen_batch_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BackgroundConfig {
    pub regen_interval_secs: u64,
    pub decay_interval_secs: u64,
}

impl Default for MemoriaConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            retrieval: RetrievalConfig::default(),
            location: LocationConfig::default(),
            lifecycle: LifecycleConfig::default(),
            background: BackgroundConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_memoria_dir()
            .join("memoria.db")
            .to_string_lossy()
            .into_owned();
        Self {
            db_path,
            log_level: "info".into(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_results: 10,
            min_probability: 0.1,
            decay: 0.5,
            noise: 0.25,
            threshold: 0.0,
            probe_weight: 0.4,
            base_level_weight: 0.3,
            spreading_weight: 0.3,
            context_min_similarity: 0.3,
            context_token_budget: 300,
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            familiarity_alpha: 0.1,
            well_known_threshold: 0.7,
            decay_factor: 0.1,
            stale_threshold_days: 30,
            floor: 0.1,
            sticky_threshold: 0.8,
            well_known_floor: 0.4,
            orphan_min_familiarity: 0.4,
            orphan_stale_days: 60,
            co_access_window_minutes: 30,
            strength_same_task_same_activity: 0.20,
            strength_same_task: 0.15,
            strength_same_activity: 0.10,
            strength_baseline: 0.05,
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            model: "bge-base-en-v1.5".into(),
            visual_model: "clip-vit-b-32".into(),
            regen_batch_size: 10,
        }
    }
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            regen_interval_secs: 5,
            decay_interval_secs: 3600,
        }
    }
}

impl RetrievalConfig {
    /// Weights are used as given, but negative weights are never valid.
    pub fn validate(&self) -> Result<()> {
        for (name, w) in [
            ("probe_weight", self.probe_weight),
            ("base_level_weight", self.base_level_weight),
            ("spreading_weight", self.spreading_weight),
        ] {
            if w < 0.0 {
                anyhow::bail!("{name} must be non-negative, got {w}");
            }
        }
        Ok(())
    }
}

/// Returns `~/.memoria/`
pub fn default_memoria_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".memoria")
}

/// Returns the default config file path: `~/.memoria/config.toml`
pub fn default_config_path() -> PathBuf {
    default_memoria_dir().join("config.toml")
}

impl MemoriaConfig {
    /// Load config from the default TOML file then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            MemoriaConfig::default()
        };

        config.apply_env_overrides();
        config.retrieval.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides (MEMORIA_DB, MEMORIA_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MEMORIA_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("MEMORIA_LOG_LEVEL") {
            self.storage.log_level = val;
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
