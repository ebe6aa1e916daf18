use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::Settings;
use crate::http_client::http_client;
use crate::line_cache::{cache_key, CacheStore, LineCache};
use crate::models::{EngineError, LineRecord};
use crate::normalize::{normalize_payload, parse_payload_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinesOrigin {
    Api,
    Offline,
}

/// Lines handed to the matcher, with provenance for the run summary.
#[derive(Debug)]
pub struct LoadedLines {
    pub lines: Vec<LineRecord>,
    pub origin: LinesOrigin,
    pub stale: bool,
    pub fetched_at: Option<u64>,
    pub normalizer_skipped: usize,
}

/// Acquire lines per the configured policy: cache (fresh) → live fetch →
/// stale cache → offline snapshot. Staleness and origin are surfaced, never
/// hidden.
pub fn acquire_lines<S: CacheStore>(
    settings: &Settings,
    cache: &LineCache<S>,
) -> Result<LoadedLines> {
    let sport = settings.sport_filter.0.as_str();

    if settings.api.enabled
        && let Some(endpoint) = settings.api.endpoint_url.as_deref()
    {
        let params = sorted_params(&settings.api.params);
        let key = cache_key(endpoint, &params, sport);
        // Skip count only exists when the closure actually fetched; cache
        // hits replay already-normalized lines.
        let skipped = std::cell::Cell::new(0usize);
        let fetch = || {
            let (lines, dropped) =
                fetch_lines_live(endpoint, &settings.api.headers, &params, sport)?;
            if dropped > 0 {
                tracing::info!(dropped, "normalizer dropped unresolvable lines");
            }
            skipped.set(dropped);
            Ok(lines)
        };
        match cache.get_or_fetch(&key, fetch) {
            Ok(cached) => {
                return Ok(LoadedLines {
                    lines: cached.lines,
                    origin: LinesOrigin::Api,
                    stale: cached.stale,
                    fetched_at: Some(cached.fetched_at),
                    normalizer_skipped: skipped.get(),
                });
            }
            Err(err @ EngineError::FetchUnavailable(_)) => {
                tracing::warn!(error = %err, "falling back to offline snapshot");
            }
            Err(err) => return Err(err.into()),
        }
    }

    let lines = load_lines_offline(&settings.api.offline_lines_path)?;
    Ok(LoadedLines {
        lines,
        origin: LinesOrigin::Offline,
        stale: false,
        fetched_at: None,
        normalizer_skipped: 0,
    })
}

/// Fetch the raw payload and run it through the normalizer. Returns the
/// normalized lines plus the aggregate skip count.
pub fn fetch_lines_live(
    endpoint: &str,
    headers: &HashMap<String, String>,
    params: &[(String, String)],
    sport_filter: &str,
) -> Result<(Vec<LineRecord>, usize)> {
    let client = http_client()?;
    let mut req = client.get(endpoint);
    for (name, value) in params {
        req = req.query(&[(name.as_str(), value.as_str())]);
    }
    for (name, value) in headers {
        req = req.header(name.as_str(), value.as_str());
    }
    let resp = req.send().context("lines request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading lines body")?;
    if !status.is_success() {
        let snippet: String = body.trim().replace('\n', " ").chars().take(200).collect();
        return Err(anyhow::anyhow!("lines http {}: {}", status, snippet));
    }

    let payload = parse_payload_json(&body).context("invalid lines json")?;
    let outcome = normalize_payload(&payload, sport_filter)?;
    Ok((outcome.lines, outcome.skipped))
}

/// Read an offline snapshot: a flat JSON array in `LineRecord` shape. This
/// path bypasses the normalizer's join entirely. Entries that do not fit the
/// shape (or carry a blank player/category) are skipped, not fatal.
pub fn load_lines_offline(path: &Path) -> Result<Vec<LineRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read offline lines {}", path.display()))?;
    let items: Vec<serde_json::Value> = serde_json::from_str(&raw)
        .with_context(|| format!("parse offline lines {}", path.display()))?;

    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        let Ok(line) = serde_json::from_value::<LineRecord>(item) else {
            continue;
        };
        if line.player_name.trim().is_empty() || line.stat_category.trim().is_empty() {
            continue;
        }
        lines.push(line);
    }
    Ok(lines)
}

fn sorted_params(params: &HashMap<String, String>) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    out.sort();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_snapshot_keeps_valid_rows_and_skips_junk() {
        let dir = std::env::temp_dir().join(format!("prop_picks_lines_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("mkdir");
        let path = dir.join("lines.json");
        fs::write(
            &path,
            r#"[
                {"player_name": "Derrick Henry", "team": "BAL", "pos": "RB", "stat_category": "rushing_yards", "line_value": 95.5, "source": "underdog"},
                {"player_name": "  ", "stat_category": "rushing_yards", "line_value": 10.0},
                {"player_name": "No Category", "stat_category": "", "line_value": 10.0},
                {"not": "a line"},
                {"player_name": "No Source Field", "stat_category": "rushing_yards", "line_value": 61.5}
            ]"#,
        )
        .expect("write snapshot");

        let lines = load_lines_offline(&path).expect("loads");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].player_name, "Derrick Henry");
        // `source` defaults when the snapshot omits it.
        assert_eq!(lines[1].source, "underdog");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn sorted_params_are_deterministic() {
        let mut params = HashMap::new();
        params.insert("sport_id".to_string(), "nfl".to_string());
        params.insert("limit".to_string(), "500".to_string());
        let sorted = sorted_params(&params);
        assert_eq!(sorted[0].0, "limit");
        assert_eq!(sorted[1].0, "sport_id");
    }
}
