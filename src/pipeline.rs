use serde::Serialize;

use crate::matcher::{match_records, MatchingConfig};
use crate::models::{LineRecord, ProjectionRecord, Recommendation};
use crate::recommend::{decide_all, Thresholds};

/// Aggregate counts every completed run must report. A zero-recommendation
/// run with no counts is a defect, so these travel with the output.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunSummary {
    pub matched: usize,
    pub unmatched_projections: usize,
    pub unmatched_lines: usize,
    pub ambiguous_lines: usize,
    pub malformed_skipped: usize,
    pub normalizer_skipped: usize,
    pub stale_lines: bool,
}

#[derive(Debug)]
pub struct RunReport {
    pub recommendations: Vec<Recommendation>,
    pub unmatched_projections: Vec<ProjectionRecord>,
    pub unmatched_lines: Vec<LineRecord>,
    pub summary: RunSummary,
}

/// One synchronous pass: match, decide, summarize. Pure and idempotent; the
/// cache is the only component with side effects and it sits outside this
/// function.
pub fn run_pipeline(
    projections: &[ProjectionRecord],
    lines: &[LineRecord],
    target_category: &str,
    matching: &MatchingConfig,
    thresholds: &Thresholds,
) -> RunReport {
    let outcome = match_records(projections, lines, target_category, matching);
    let recommendations = decide_all(&outcome.pairs, thresholds);

    let summary = RunSummary {
        matched: outcome.pairs.len(),
        unmatched_projections: outcome.unmatched_projections.len(),
        unmatched_lines: outcome.unmatched_lines.len(),
        ambiguous_lines: outcome.ambiguous_lines.len(),
        malformed_skipped: outcome.malformed_skipped,
        normalizer_skipped: 0,
        stale_lines: false,
    };

    RunReport {
        recommendations,
        unmatched_projections: outcome.unmatched_projections,
        unmatched_lines: outcome.unmatched_lines,
        summary,
    }
}
