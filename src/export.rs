use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::models::{Recommendation, Tier};

const HEADERS: [&str; 10] = [
    "Player",
    "Team",
    "Pos",
    "StatCategory",
    "Line",
    "MyProjection",
    "Diff",
    "DiffPct",
    "Recommendation",
    "Source",
];

pub fn write_recommendations_csv(
    path: &Path,
    recommendations: &[Recommendation],
    include_no_pick: bool,
) -> Result<usize> {
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let file =
        File::create(path).with_context(|| format!("create export file {}", path.display()))?;
    write_recommendations(file, recommendations, include_no_pick)
}

/// Write the export rows, returning how many were written. `no_pick` rows are
/// excluded unless the output config opts in.
pub fn write_recommendations<W: Write>(
    writer: W,
    recommendations: &[Recommendation],
    include_no_pick: bool,
) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(HEADERS).context("write export header")?;

    let mut written = 0usize;
    for rec in recommendations {
        if rec.tier == Tier::NoPick && !include_no_pick {
            continue;
        }
        let line_value = format!("{:.1}", rec.line_value);
        let projected = format!("{:.1}", rec.projected_value);
        let diff = format!("{:.1}", rec.diff_abs);
        let diff_pct = format!("{:.3}", rec.diff_pct);
        csv_writer
            .write_record([
                rec.player_name.as_str(),
                rec.team.as_deref().unwrap_or(""),
                rec.pos.as_deref().unwrap_or(""),
                rec.stat_category.as_str(),
                line_value.as_str(),
                projected.as_str(),
                diff.as_str(),
                diff_pct.as_str(),
                rec.tier.label(),
                rec.source.as_str(),
            ])
            .context("write export row")?;
        written += 1;
    }
    csv_writer.flush().context("flush export")?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, tier: Tier) -> Recommendation {
        Recommendation {
            player_name: name.to_string(),
            team: Some("CIN".to_string()),
            pos: Some("WR".to_string()),
            stat_category: "rushing_yards".to_string(),
            line_value: 80.0,
            projected_value: 95.0,
            tier,
            diff_abs: 15.0,
            diff_pct: 0.1875,
            reason: "abs_or_pct: |diff| 15.0 >= min_abs 10.0".to_string(),
            source: "underdog".to_string(),
        }
    }

    #[test]
    fn writes_header_and_formatted_rows() {
        let mut buf = Vec::new();
        let written =
            write_recommendations(&mut buf, &[rec("Ja'Marr Chase", Tier::Over)], false).expect("writes");
        assert_eq!(written, 1);
        let text = String::from_utf8(buf).expect("utf8");
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Player,Team,Pos,StatCategory,Line,MyProjection,Diff,DiffPct,Recommendation,Source"
        );
        assert_eq!(
            lines.next().unwrap(),
            "Ja'Marr Chase,CIN,WR,rushing_yards,80.0,95.0,15.0,0.188,OVER,underdog"
        );
    }

    #[test]
    fn no_pick_rows_excluded_unless_opted_in() {
        let recs = vec![rec("Pick Guy", Tier::Over), rec("Skip Guy", Tier::NoPick)];

        let mut buf = Vec::new();
        let written = write_recommendations(&mut buf, &recs, false).expect("writes");
        assert_eq!(written, 1);
        assert!(!String::from_utf8(buf).unwrap().contains("Skip Guy"));

        let mut buf = Vec::new();
        let written = write_recommendations(&mut buf, &recs, true).expect("writes");
        assert_eq!(written, 2);
        assert!(String::from_utf8(buf).unwrap().contains("NO_PICK"));
    }
}
