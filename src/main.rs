use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use prop_picks::config::{self, Settings, SportFilter, StatCategory};
use prop_picks::export::write_recommendations_csv;
use prop_picks::line_cache::{FileStore, LineCache};
use prop_picks::lines_fetch::{acquire_lines, LinesOrigin};
use prop_picks::pipeline::run_pipeline;
use prop_picks::projections::{default_positions_for_stat, load_projections_csv};
use prop_picks::recommend::ThresholdRule;

struct CliArgs {
    config: Option<PathBuf>,
    projections: PathBuf,
    stat: Option<String>,
    sport: Option<String>,
    offline_lines: Option<PathBuf>,
    min_diff_abs: Option<f64>,
    min_diff_pct: Option<f64>,
    rule: Option<ThresholdRule>,
    out: Option<PathBuf>,
    include_no_pick: bool,
}

fn parse_args() -> Result<CliArgs> {
    let mut out = CliArgs {
        config: None,
        projections: PathBuf::from("data/my_projections.csv"),
        stat: None,
        sport: None,
        offline_lines: None,
        min_diff_abs: None,
        min_diff_pct: None,
        rule: None,
        out: None,
        include_no_pick: false,
    };

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .with_context(|| format!("{flag} requires a value"))
        };
        match arg.as_str() {
            "--config" => out.config = Some(PathBuf::from(value("--config")?)),
            "--projections" => out.projections = PathBuf::from(value("--projections")?),
            "--stat" => out.stat = Some(value("--stat")?),
            "--sport" => out.sport = Some(value("--sport")?),
            "--offline-lines" => out.offline_lines = Some(PathBuf::from(value("--offline-lines")?)),
            "--min-diff-abs" => {
                out.min_diff_abs =
                    Some(value("--min-diff-abs")?.parse().context("--min-diff-abs must be a number")?)
            }
            "--min-diff-pct" => {
                out.min_diff_pct =
                    Some(value("--min-diff-pct")?.parse().context("--min-diff-pct must be a number")?)
            }
            "--rule" => {
                out.rule = Some(match value("--rule")?.as_str() {
                    "abs_only" => ThresholdRule::AbsOnly,
                    "pct_only" => ThresholdRule::PctOnly,
                    "abs_or_pct" => ThresholdRule::AbsOrPct,
                    other => anyhow::bail!(
                        "unknown rule `{other}`, expected abs_only, pct_only or abs_or_pct"
                    ),
                })
            }
            "--out" => out.out = Some(PathBuf::from(value("--out")?)),
            "--include-no-pick" => out.include_no_pick = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument `{other}` (try --help)"),
        }
    }
    Ok(out)
}

fn print_usage() {
    println!(
        "prop_picks: over/under prop pick recommender\n\n\
         Usage: prop_picks [options]\n\n\
         Options:\n\
         \x20 --config PATH          settings file (JSON)\n\
         \x20 --projections PATH     projections CSV (default data/my_projections.csv)\n\
         \x20 --stat CATEGORY        stat category (e.g. rushing_yards)\n\
         \x20 --sport SPORT          sport filter (default NFL)\n\
         \x20 --offline-lines PATH   offline lines snapshot (JSON)\n\
         \x20 --min-diff-abs N       absolute diff threshold\n\
         \x20 --min-diff-pct N       percent diff threshold (0.10 = 10%)\n\
         \x20 --rule RULE            abs_only | pct_only | abs_or_pct\n\
         \x20 --out PATH             output CSV path\n\
         \x20 --include-no-pick      export no_pick rows too"
    );
}

fn load_effective_settings(args: &CliArgs) -> Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => config::load_settings(path)?,
        None => config::default_settings(),
    };
    if let Some(stat) = &args.stat {
        settings.stat_category = StatCategory(stat.clone());
    }
    if let Some(sport) = &args.sport {
        settings.sport_filter = SportFilter(sport.clone());
    }
    if let Some(path) = &args.offline_lines {
        settings.api.offline_lines_path = path.clone();
    }
    if let Some(v) = args.min_diff_abs {
        settings.recommend.min_diff_abs = v;
    }
    if let Some(v) = args.min_diff_pct {
        settings.recommend.min_diff_pct = v;
    }
    if let Some(rule) = args.rule {
        settings.recommend.rule = rule;
    }
    if let Some(path) = &args.out {
        settings.output.out_path = path.clone();
    }
    if args.include_no_pick {
        settings.output.include_no_pick = true;
    }
    Ok(settings)
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    let settings = load_effective_settings(&args)?;
    let stat_category = settings.stat_category.0.clone();

    let position_filter = settings
        .stat_position_filter
        .clone()
        .unwrap_or_else(|| default_positions_for_stat(&stat_category));
    if !position_filter.is_empty() {
        tracing::info!(stat = %stat_category, positions = ?position_filter, "using position filter");
    }

    tracing::info!(path = %args.projections.display(), "loading projections");
    let projections = load_projections_csv(
        &args.projections,
        &stat_category,
        &settings.projections_columns,
        &position_filter,
    )?;
    tracing::info!(count = projections.len(), "projections loaded");

    let cache_path = settings
        .api
        .cache_path
        .clone()
        .or_else(FileStore::default_path)
        .unwrap_or_else(|| PathBuf::from("data/cache/lines_cache.json"));
    let cache = LineCache::new(
        FileStore::new(cache_path),
        Duration::from_secs(settings.api.cache_ttl_minutes * 60),
    );

    let loaded = acquire_lines(&settings, &cache)?;
    let origin = match loaded.origin {
        LinesOrigin::Api => "api",
        LinesOrigin::Offline => "offline snapshot",
    };
    tracing::info!(count = loaded.lines.len(), origin, stale = loaded.stale, "lines loaded");
    if loaded.stale {
        tracing::warn!("serving stale cached lines: live refresh failed");
    }
    if let Some(fetched_at) = loaded.fetched_at
        && let Some(when) = chrono::DateTime::from_timestamp(fetched_at as i64, 0)
    {
        tracing::info!(fetched_at = %when.to_rfc3339(), "lines fetch time");
    }

    let mut report = run_pipeline(
        &projections,
        &loaded.lines,
        &stat_category,
        &settings.matching,
        &settings.recommend,
    );
    report.summary.stale_lines = loaded.stale;
    report.summary.normalizer_skipped = loaded.normalizer_skipped;

    let written = write_recommendations_csv(
        &settings.output.out_path,
        &report.recommendations,
        settings.output.include_no_pick,
    )?;

    let s = report.summary;
    println!(
        "matched {} | unmatched projections {} | unmatched lines {} | ambiguous lines {} | malformed skipped {}{}",
        s.matched,
        s.unmatched_projections,
        s.unmatched_lines,
        s.ambiguous_lines,
        s.malformed_skipped,
        if s.stale_lines { " | STALE LINES" } else { "" },
    );
    println!(
        "wrote {} picks to {}",
        written,
        settings.output.out_path.display()
    );
    for rec in &report.recommendations {
        tracing::debug!(
            player = %rec.player_name,
            tier = rec.tier.label(),
            reason = %rec.reason,
            "decision"
        );
    }

    Ok(())
}
