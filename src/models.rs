use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One row of the user's own projections, supplied by an external loader.
/// Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRecord {
    pub player_name: String,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub pos: Option<String>,
    pub stat_category: String,
    pub projected_value: f64,
}

/// One market line, produced by the normalizer or read from an offline
/// snapshot. The offline snapshot format is exactly this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRecord {
    pub player_name: String,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub pos: Option<String>,
    pub stat_category: String,
    pub line_value: f64,
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_source() -> String {
    "underdog".to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPair {
    pub projection: ProjectionRecord,
    pub line: LineRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Over,
    Under,
    NoPick,
}

impl Tier {
    /// Uppercase label used by the CSV export.
    pub fn label(self) -> &'static str {
        match self {
            Tier::Over => "OVER",
            Tier::Under => "UNDER",
            Tier::NoPick => "NO_PICK",
        }
    }
}

/// Verdict for one matched pair. Derived, never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub player_name: String,
    pub team: Option<String>,
    pub pos: Option<String>,
    pub stat_category: String,
    pub line_value: f64,
    pub projected_value: f64,
    pub tier: Tier,
    pub diff_abs: f64,
    pub diff_pct: f64,
    pub reason: String,
    pub source: String,
}

/// Fatal engine errors. Record-level anomalies are never errors; they are
/// counted and reported in the run summary.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("malformed payload: missing required collection `{0}`")]
    MalformedPayload(&'static str),
    #[error("lines unavailable: no cached entry and live fetch failed ({0})")]
    FetchUnavailable(String),
}
