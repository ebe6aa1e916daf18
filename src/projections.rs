use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::ProjectionsColumns;
use crate::matcher::normalize_category;
use crate::models::ProjectionRecord;

/// Default position filters per stat category, applied when the settings file
/// does not override them.
pub fn default_positions_for_stat(stat_category: &str) -> Vec<String> {
    match normalize_category(stat_category).as_str() {
        "rushing_yards" => vec!["RB".to_string()],
        "receiving_yards" => vec!["WR".to_string(), "TE".to_string()],
        "passing_yards" => vec!["QB".to_string()],
        _ => Vec::new(),
    }
}

pub fn load_projections_csv(
    path: &Path,
    stat_category: &str,
    columns: &ProjectionsColumns,
    position_filter: &[String],
) -> Result<Vec<ProjectionRecord>> {
    let file = File::open(path)
        .with_context(|| format!("open projections file {}", path.display()))?;
    read_projections(file, stat_category, columns, position_filter)
}

/// Parse projection rows from CSV. Malformed rows (blank player, missing or
/// unparseable value) are skipped; the matcher accounts for anything that
/// slips through.
pub fn read_projections<R: Read>(
    reader: R,
    stat_category: &str,
    columns: &ProjectionsColumns,
    position_filter: &[String],
) -> Result<Vec<ProjectionRecord>> {
    let stat_category = normalize_category(stat_category);
    let pos_filter: Vec<String> = position_filter
        .iter()
        .map(|p| p.trim().to_uppercase())
        .filter(|p| !p.is_empty())
        .collect();

    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);
    let headers = csv_reader.headers().context("read projections header")?.clone();

    let player_idx = column_index(&headers, &columns.player_col)
        .with_context(|| format!("projections missing column `{}`", columns.player_col))?;
    let proj_idx = column_index(&headers, &columns.proj_col)
        .with_context(|| format!("projections missing column `{}`", columns.proj_col))?;
    let team_idx = column_index(&headers, &columns.team_col);
    let pos_idx = column_index(&headers, &columns.pos_col);

    let mut out = Vec::new();
    for record in csv_reader.records() {
        let record = record.context("read projections row")?;
        let player_name = record.get(player_idx).unwrap_or("").trim().to_string();
        if player_name.is_empty() {
            continue;
        }
        let team = team_idx
            .and_then(|idx| record.get(idx))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let pos = pos_idx
            .and_then(|idx| record.get(idx))
            .map(|p| p.trim().to_uppercase())
            .filter(|p| !p.is_empty());
        if !pos_filter.is_empty()
            && let Some(pos) = pos.as_deref()
            && !pos_filter.iter().any(|f| f == pos)
        {
            continue;
        }
        let Some(projected_value) = record
            .get(proj_idx)
            .and_then(|v| v.trim().parse::<f64>().ok())
        else {
            continue;
        };
        out.push(ProjectionRecord {
            player_name,
            team,
            pos,
            stat_category: stat_category.clone(),
            projected_value,
        });
    }
    Ok(out)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}
