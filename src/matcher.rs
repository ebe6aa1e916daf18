use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{LineRecord, MatchedPair, ProjectionRecord};

/// Reserved for future fuzzy variants; only the exact strategy exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameStrategy {
    #[default]
    Exact,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub name_strategy: NameStrategy,
    pub team_required: bool,
    pub position_required: bool,
}

/// Canonical identity: two records are the same player iff their keys are
/// equal. Team/position only participate when the matching config requires
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedKey {
    name: String,
    team: Option<String>,
    pos: Option<String>,
}

impl NormalizedKey {
    pub fn new(name: &str, team: Option<&str>, pos: Option<&str>, cfg: &MatchingConfig) -> Self {
        Self {
            name: normalize_name(name),
            team: if cfg.team_required {
                team.map(|t| t.trim().to_uppercase()).filter(|t| !t.is_empty())
            } else {
                None
            },
            pos: if cfg.position_required {
                pos.map(|p| p.trim().to_uppercase()).filter(|p| !p.is_empty())
            } else {
                None
            },
        }
    }
}

/// Lowercase, strip punctuation, collapse whitespace, drop generational
/// suffixes. "Ja'Marr Chase" and "ja marr chase" normalize to the same key.
pub fn normalize_name(name: &str) -> String {
    let mut cleaned = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            cleaned.extend(ch.to_lowercase());
        } else {
            // Punctuation and whitespace both break words, so "Ja'Marr"
            // and "ja marr" collapse to the same key.
            cleaned.push(' ');
        }
    }
    let mut words: Vec<&str> = cleaned.split_whitespace().collect();
    if words.len() > 1 && matches!(words[words.len() - 1], "jr" | "sr" | "ii" | "iii" | "iv") {
        words.pop();
    }
    words.join(" ")
}

pub fn normalize_category(category: &str) -> String {
    category.trim().to_lowercase()
}

/// Result of one matching pass. Unmatched records are kept in input order so
/// the caller can report them; nothing is silently discarded.
#[derive(Debug, Default)]
pub struct MatchOutcome {
    pub pairs: Vec<MatchedPair>,
    pub unmatched_projections: Vec<ProjectionRecord>,
    pub unmatched_lines: Vec<LineRecord>,
    pub ambiguous_lines: Vec<LineRecord>,
    pub malformed_skipped: usize,
}

/// Link each projection to at most one line for the target stat category.
/// Pure function of its inputs: identical inputs yield identical pair order
/// (projection input order) and identical unmatched sets.
pub fn match_records(
    projections: &[ProjectionRecord],
    lines: &[LineRecord],
    target_category: &str,
    cfg: &MatchingConfig,
) -> MatchOutcome {
    let target = normalize_category(target_category);
    let mut out = MatchOutcome::default();

    // First-seen wins: a later line that normalizes to an occupied key is
    // ambiguous and never matched, so matching stays deterministic.
    let mut index: HashMap<NormalizedKey, usize> = HashMap::new();
    let mut indexed: Vec<(LineRecord, bool)> = Vec::new();
    for line in lines {
        if !line.line_value.is_finite() {
            out.malformed_skipped += 1;
            continue;
        }
        if normalize_name(&line.player_name).is_empty() {
            out.malformed_skipped += 1;
            continue;
        }
        if normalize_category(&line.stat_category) != target {
            out.unmatched_lines.push(line.clone());
            continue;
        }
        let key = NormalizedKey::new(
            &line.player_name,
            line.team.as_deref(),
            line.pos.as_deref(),
            cfg,
        );
        if index.contains_key(&key) {
            out.ambiguous_lines.push(line.clone());
            continue;
        }
        index.insert(key, indexed.len());
        indexed.push((line.clone(), false));
    }

    for projection in projections {
        if normalize_name(&projection.player_name).is_empty() {
            out.malformed_skipped += 1;
            continue;
        }
        if !projection.projected_value.is_finite() {
            out.malformed_skipped += 1;
            continue;
        }
        if normalize_category(&projection.stat_category) != target {
            out.unmatched_projections.push(projection.clone());
            continue;
        }
        let key = NormalizedKey::new(
            &projection.player_name,
            projection.team.as_deref(),
            projection.pos.as_deref(),
            cfg,
        );
        match index.get(&key) {
            Some(&slot) if !indexed[slot].1 => {
                indexed[slot].1 = true;
                out.pairs.push(MatchedPair {
                    projection: projection.clone(),
                    line: indexed[slot].0.clone(),
                });
            }
            // Already consumed by an earlier projection, or no line at all.
            _ => out.unmatched_projections.push(projection.clone()),
        }
    }

    for (line, consumed) in indexed {
        if !consumed {
            out.unmatched_lines.push(line);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projection(name: &str, value: f64) -> ProjectionRecord {
        ProjectionRecord {
            player_name: name.to_string(),
            team: None,
            pos: None,
            stat_category: "rushing_yards".to_string(),
            projected_value: value,
        }
    }

    fn line(name: &str, value: f64) -> LineRecord {
        LineRecord {
            player_name: name.to_string(),
            team: None,
            pos: None,
            stat_category: "rushing_yards".to_string(),
            line_value: value,
            source: "underdog".to_string(),
        }
    }

    #[test]
    fn normalizes_punctuation_case_and_suffixes() {
        assert_eq!(normalize_name("Ja'Marr Chase"), normalize_name("ja marr chase"));
        assert_eq!(normalize_name("A.J. Brown"), "a j brown");
        assert_eq!(normalize_name("D'Andre Swift"), "d andre swift");
        assert_eq!(normalize_name("  Odell   Beckham Jr "), "odell beckham");
        assert_eq!(normalize_name("Marvin Harrison Jr."), "marvin harrison");
        assert_eq!(normalize_name("III"), "iii");
    }

    #[test]
    fn matches_across_naming_inconsistencies() {
        let projections = vec![projection("Ja'Marr Chase", 95.0)];
        let lines = vec![line("ja marr chase", 80.0)];
        let out = match_records(&projections, &lines, "rushing_yards", &MatchingConfig::default());
        assert_eq!(out.pairs.len(), 1);
        assert!(out.unmatched_projections.is_empty());
        assert!(out.unmatched_lines.is_empty());
    }

    #[test]
    fn duplicate_line_keys_keep_first_and_flag_rest_ambiguous() {
        let projections = vec![projection("A. Smith", 100.0)];
        let lines = vec![line("A. Smith", 80.0), line("A Smith ", 85.0)];
        let out = match_records(&projections, &lines, "rushing_yards", &MatchingConfig::default());
        assert_eq!(out.pairs.len(), 1);
        assert_eq!(out.pairs[0].line.line_value, 80.0);
        assert_eq!(out.ambiguous_lines.len(), 1);
        assert_eq!(out.ambiguous_lines[0].line_value, 85.0);
        assert!(out.unmatched_lines.is_empty());
    }

    #[test]
    fn no_cross_category_matches() {
        let mut p = projection("Derrick Henry", 95.0);
        p.stat_category = "receiving_yards".to_string();
        let lines = vec![line("Derrick Henry", 80.0)];
        let out = match_records(&[p], &lines, "rushing_yards", &MatchingConfig::default());
        assert!(out.pairs.is_empty());
        assert_eq!(out.unmatched_projections.len(), 1);
        assert_eq!(out.unmatched_lines.len(), 1);
    }

    #[test]
    fn blank_projection_names_count_as_malformed_not_unmatched() {
        let projections = vec![projection("   ", 50.0), projection("Real Name", 50.0)];
        let out = match_records(&projections, &[], "rushing_yards", &MatchingConfig::default());
        assert_eq!(out.malformed_skipped, 1);
        assert_eq!(out.unmatched_projections.len(), 1);
        assert_eq!(out.unmatched_projections[0].player_name, "Real Name");
    }

    #[test]
    fn non_finite_values_are_malformed_on_either_side() {
        let projections = vec![projection("Nan Guy", f64::NAN)];
        let lines = vec![line("Inf Guy", f64::INFINITY)];
        let out = match_records(&projections, &lines, "rushing_yards", &MatchingConfig::default());
        assert!(out.pairs.is_empty());
        assert_eq!(out.malformed_skipped, 2);
        assert!(out.unmatched_projections.is_empty());
        assert!(out.unmatched_lines.is_empty());
    }

    #[test]
    fn consumed_line_cannot_match_a_second_projection() {
        let projections = vec![projection("Bijan Robinson", 90.0), projection("bijan robinson", 85.0)];
        let lines = vec![line("Bijan Robinson", 80.0)];
        let out = match_records(&projections, &lines, "rushing_yards", &MatchingConfig::default());
        assert_eq!(out.pairs.len(), 1);
        assert_eq!(out.pairs[0].projection.projected_value, 90.0);
        assert_eq!(out.unmatched_projections.len(), 1);
    }

    #[test]
    fn team_required_splits_otherwise_identical_keys() {
        let mut p = projection("Josh Allen", 260.0);
        p.team = Some("BUF".to_string());
        let mut l = line("Josh Allen", 250.0);
        l.team = Some("jax".to_string());
        let cfg = MatchingConfig {
            team_required: true,
            ..MatchingConfig::default()
        };
        let out = match_records(&[p], &[l], "rushing_yards", &cfg);
        assert!(out.pairs.is_empty());
        assert_eq!(out.unmatched_projections.len(), 1);
        assert_eq!(out.unmatched_lines.len(), 1);
    }

    #[test]
    fn matching_is_deterministic_across_runs() {
        let projections = vec![
            projection("One Player", 10.0),
            projection("Two Player", 20.0),
            projection("Three Player", 30.0),
        ];
        let lines = vec![
            line("Two Player", 19.0),
            line("One Player", 11.0),
            line("Stray Line", 5.0),
        ];
        let cfg = MatchingConfig::default();
        let a = match_records(&projections, &lines, "rushing_yards", &cfg);
        let b = match_records(&projections, &lines, "rushing_yards", &cfg);
        assert_eq!(a.pairs, b.pairs);
        assert_eq!(a.unmatched_projections, b.unmatched_projections);
        assert_eq!(a.unmatched_lines, b.unmatched_lines);
        // Pair order equals projection input order.
        assert_eq!(a.pairs[0].projection.player_name, "One Player");
        assert_eq!(a.pairs[1].projection.player_name, "Two Player");
    }
}
