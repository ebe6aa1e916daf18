use serde::{Deserialize, Serialize};

use crate::models::{MatchedPair, Recommendation, Tier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdRule {
    AbsOnly,
    PctOnly,
    #[default]
    AbsOrPct,
}

impl ThresholdRule {
    pub fn name(self) -> &'static str {
        match self {
            ThresholdRule::AbsOnly => "abs_only",
            ThresholdRule::PctOnly => "pct_only",
            ThresholdRule::AbsOrPct => "abs_or_pct",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub rule: ThresholdRule,
    pub min_diff_abs: f64,
    pub min_diff_pct: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            rule: ThresholdRule::AbsOrPct,
            min_diff_abs: 10.0,
            min_diff_pct: 0.10,
        }
    }
}

/// Produce exactly one recommendation for a matched pair. Infallible for
/// finite inputs; non-finite values are excluded upstream by the matcher.
pub fn decide(pair: &MatchedPair, thresholds: &Thresholds) -> Recommendation {
    let projected = pair.projection.projected_value;
    let line_value = pair.line.line_value;
    let diff_abs = projected - line_value;
    // A zero line never becomes an infinite-percentage signal: the pct branch
    // just does not fire.
    let diff_pct = if line_value != 0.0 { diff_abs / line_value } else { 0.0 };

    let abs_ok = diff_abs.abs() >= thresholds.min_diff_abs;
    let pct_ok = line_value != 0.0 && diff_pct.abs() >= thresholds.min_diff_pct;

    let satisfied = match thresholds.rule {
        ThresholdRule::AbsOnly => abs_ok,
        ThresholdRule::PctOnly => pct_ok,
        ThresholdRule::AbsOrPct => abs_ok || pct_ok,
    };

    let tier = if !satisfied || diff_abs == 0.0 {
        Tier::NoPick
    } else if diff_abs > 0.0 {
        Tier::Over
    } else {
        Tier::Under
    };

    let reason = reason_for(thresholds, diff_abs, diff_pct, abs_ok, pct_ok, tier);

    Recommendation {
        player_name: pair.line.player_name.clone(),
        team: pair.line.team.clone().or_else(|| pair.projection.team.clone()),
        pos: pair.line.pos.clone().or_else(|| pair.projection.pos.clone()),
        stat_category: pair.line.stat_category.clone(),
        line_value,
        projected_value: projected,
        tier,
        diff_abs,
        diff_pct,
        reason,
        source: pair.line.source.clone(),
    }
}

pub fn decide_all(pairs: &[MatchedPair], thresholds: &Thresholds) -> Vec<Recommendation> {
    pairs.iter().map(|pair| decide(pair, thresholds)).collect()
}

/// Deterministic audit string: which branch fired and the numbers behind it.
fn reason_for(
    thresholds: &Thresholds,
    diff_abs: f64,
    diff_pct: f64,
    abs_ok: bool,
    pct_ok: bool,
    tier: Tier,
) -> String {
    let rule = thresholds.rule.name();
    if tier == Tier::NoPick {
        if diff_abs == 0.0 {
            return format!("{rule}: diff 0.0, no directional edge");
        }
        return format!(
            "{rule}: |diff| {:.1} < min_abs {:.1} and |pct| {:.3} < min_pct {:.3}",
            diff_abs.abs(),
            thresholds.min_diff_abs,
            diff_pct.abs(),
            thresholds.min_diff_pct,
        );
    }
    match (abs_ok, pct_ok) {
        (true, true) => format!(
            "{rule}: |diff| {:.1} >= min_abs {:.1} and |pct| {:.3} >= min_pct {:.3}",
            diff_abs.abs(),
            thresholds.min_diff_abs,
            diff_pct.abs(),
            thresholds.min_diff_pct,
        ),
        (true, false) => format!(
            "{rule}: |diff| {:.1} >= min_abs {:.1}",
            diff_abs.abs(),
            thresholds.min_diff_abs,
        ),
        _ => format!(
            "{rule}: |pct| {:.3} >= min_pct {:.3}",
            diff_pct.abs(),
            thresholds.min_diff_pct,
        ),
    }
}
