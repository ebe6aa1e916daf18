use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::matcher::MatchingConfig;
use crate::recommend::Thresholds;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub stat_category: StatCategory,
    pub sport_filter: SportFilter,
    pub stat_position_filter: Option<Vec<String>>,
    pub recommend: Thresholds,
    pub api: ApiConfig,
    pub matching: MatchingConfig,
    pub output: OutputConfig,
    pub projections_columns: ProjectionsColumns,
}

// Transparent string wrappers so the defaults ("rushing_yards", "NFL") live
// with the type instead of scattered default fns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatCategory(pub String);

impl Default for StatCategory {
    fn default() -> Self {
        Self("rushing_yards".to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SportFilter(pub String);

impl Default for SportFilter {
    fn default() -> Self {
        Self("NFL".to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub enabled: bool,
    pub endpoint_url: Option<String>,
    pub headers: HashMap<String, String>,
    pub params: HashMap<String, String>,
    pub cache_path: Option<PathBuf>,
    pub cache_ttl_minutes: u64,
    pub offline_lines_path: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint_url: None,
            headers: HashMap::new(),
            params: HashMap::new(),
            cache_path: None,
            cache_ttl_minutes: 60,
            offline_lines_path: PathBuf::from("data/lines_sample.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub out_path: PathBuf,
    pub include_no_pick: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            out_path: PathBuf::from("out/recommended_picks.csv"),
            include_no_pick: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionsColumns {
    pub player_col: String,
    pub team_col: String,
    pub pos_col: String,
    pub proj_col: String,
}

impl Default for ProjectionsColumns {
    fn default() -> Self {
        Self {
            player_col: "Player".to_string(),
            team_col: "Team".to_string(),
            pos_col: "Pos".to_string(),
            proj_col: "ProjYards".to_string(),
        }
    }
}

pub fn load_settings(path: &Path) -> Result<Settings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read settings file {}", path.display()))?;
    let mut settings: Settings = serde_json::from_str(&raw)
        .with_context(|| format!("parse settings file {}", path.display()))?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

pub fn default_settings() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Environment wins over the settings file, matching how the rest of the
/// knobs in this repo are tuned without editing config.
fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(endpoint) = env::var("PROP_PICKS_ENDPOINT") {
        let endpoint = endpoint.trim().to_string();
        if !endpoint.is_empty() {
            settings.api.endpoint_url = Some(endpoint);
            settings.api.enabled = true;
        }
    }
    settings.api.enabled = env_bool("PROP_PICKS_API_ENABLED", settings.api.enabled);
    if let Some(ttl) = env_u64("PROP_PICKS_CACHE_TTL_MIN") {
        settings.api.cache_ttl_minutes = ttl.clamp(1, 24 * 60);
    }
    if let Ok(sport) = env::var("PROP_PICKS_SPORT") {
        let sport = sport.trim().to_string();
        if !sport.is_empty() {
            settings.sport_filter = SportFilter(sport);
        }
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| {
            let t = v.trim().to_ascii_lowercase();
            !(t.is_empty() || t == "0" || t == "false" || t == "off" || t == "no")
        })
        .unwrap_or(default)
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|v| v.trim().parse::<u64>().ok())
}
