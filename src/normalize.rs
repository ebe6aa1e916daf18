use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

use crate::models::{EngineError, LineRecord};

/// Raw pick'em payload: three cross-referenced collections. Every field below
/// the top level is optional because the upstream schema drifts; missing data
/// at a join step drops the line, it never aborts the run.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPayload {
    pub players: Option<Vec<RawPlayer>>,
    pub appearances: Option<Vec<RawAppearance>>,
    pub over_under_lines: Option<Vec<RawLine>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPlayer {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub sport_id: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAppearance {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub player_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLine {
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub stat_value: Option<f64>,
    #[serde(default)]
    pub over_under: Option<RawOverUnder>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOverUnder {
    #[serde(default)]
    pub appearance_stat: Option<RawAppearanceStat>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAppearanceStat {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub appearance_id: Option<String>,
    #[serde(default)]
    pub display_stat: Option<String>,
}

/// Output of one normalize pass. `skipped` aggregates every dropped line
/// (unresolved joins, sport mismatch, empty name, empty category, bad value).
#[derive(Debug, Default)]
pub struct NormalizeOutcome {
    pub lines: Vec<LineRecord>,
    pub skipped: usize,
}

pub fn parse_payload_json(raw: &str) -> Result<RawPayload, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Flatten the nested payload into `LineRecord`s restricted to `sport_filter`
/// (case-sensitive exact match on the resolved player's `sport_id`). Output
/// order follows `over_under_lines` input order. Pure transform; the only
/// failure is a structurally absent top-level collection.
pub fn normalize_payload(
    payload: &RawPayload,
    sport_filter: &str,
) -> Result<NormalizeOutcome, EngineError> {
    let players = payload
        .players
        .as_ref()
        .ok_or(EngineError::MalformedPayload("players"))?;
    let appearances = payload
        .appearances
        .as_ref()
        .ok_or(EngineError::MalformedPayload("appearances"))?;
    let ou_lines = payload
        .over_under_lines
        .as_ref()
        .ok_or(EngineError::MalformedPayload("over_under_lines"))?;

    let players_by_id: HashMap<&str, &RawPlayer> = players
        .iter()
        .filter_map(|p| p.id.as_deref().map(|id| (id, p)))
        .collect();
    let appearances_by_id: HashMap<&str, &RawAppearance> = appearances
        .iter()
        .filter_map(|a| a.id.as_deref().map(|id| (id, a)))
        .collect();

    let mut out = NormalizeOutcome::default();
    for line in ou_lines {
        match resolve_line(line, &players_by_id, &appearances_by_id, sport_filter) {
            Some(record) => out.lines.push(record),
            None => out.skipped += 1,
        }
    }
    Ok(out)
}

fn resolve_line(
    line: &RawLine,
    players_by_id: &HashMap<&str, &RawPlayer>,
    appearances_by_id: &HashMap<&str, &RawAppearance>,
    sport_filter: &str,
) -> Option<LineRecord> {
    let stat = line.over_under.as_ref()?.appearance_stat.as_ref()?;
    let appearance_id = stat.appearance_id.as_deref()?;
    let appearance = appearances_by_id.get(appearance_id)?;
    let player_id = appearance.player_id.as_deref()?;
    let player = players_by_id.get(player_id)?;

    if player.sport_id.as_deref() != Some(sport_filter) {
        return None;
    }

    let player_name = player_display_name(player)?;
    let stat_category = map_display_stat(stat.display_stat.as_deref()?)?;
    let line_value = line.stat_value?;

    Some(LineRecord {
        player_name,
        team: player.team.clone().filter(|t| !t.trim().is_empty()),
        pos: player.position.clone().filter(|p| !p.trim().is_empty()),
        stat_category,
        line_value,
        source: "underdog".to_string(),
    })
}

/// Prefer `full_name`; otherwise join first/last. Empty after trimming means
/// the player is unusable and the line is dropped.
fn player_display_name(player: &RawPlayer) -> Option<String> {
    if let Some(full) = player.full_name.as_deref() {
        let full = full.trim();
        if !full.is_empty() {
            return Some(full.to_string());
        }
    }
    let first = player.first_name.as_deref().unwrap_or("").trim();
    let last = player.last_name.as_deref().unwrap_or("").trim();
    let joined = format!("{first} {last}");
    let joined = joined.trim();
    if joined.is_empty() {
        None
    } else {
        Some(joined.to_string())
    }
}

/// Map an Underdog display label to a canonical stat category. Unknown labels
/// fall back to the trimmed lowercased label so new markets still flow
/// through; an empty label drops the line.
pub fn map_display_stat(label: &str) -> Option<String> {
    let lowered = label.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    if lowered.contains("yard") || lowered.contains("yds") {
        if lowered.contains("rush") {
            return Some("rushing_yards".to_string());
        }
        if lowered.contains("receiv") || lowered.starts_with("rec") {
            return Some("receiving_yards".to_string());
        }
        if lowered.contains("pass") || lowered.contains("throw") {
            return Some("passing_yards".to_string());
        }
    }
    Some(lowered)
}

fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    // Upstream ids show up as strings or bare numbers depending on endpoint.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Str(String),
        Int(i64),
        Float(f64),
    }
    let value = Option::<IdRepr>::deserialize(deserializer)?;
    Ok(value.map(|v| match v {
        IdRepr::Str(s) => s,
        IdRepr::Int(n) => n.to_string(),
        IdRepr::Float(n) => n.to_string(),
    }))
}

fn de_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    // `stat_value` arrives as "80.5" on some endpoints and 80.5 on others.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumRepr {
        Num(f64),
        Str(String),
    }
    let value = Option::<NumRepr>::deserialize(deserializer)?;
    Ok(match value {
        Some(NumRepr::Num(n)) => Some(n),
        Some(NumRepr::Str(s)) => s.trim().parse::<f64>().ok(),
        None => None,
    })
}
