use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand, ValueEnum};
use dialoguer::MultiSelect;
use dupsy::core::{MatchSet, Metric, PairSide, Side, ThresholdPreset};
use dupsy::services::collect_sources;
use dupsy::{ComparisonSummary, Config, ExportOutcome, Session};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dupsy", version, about = "Find and remove fuzzy duplicate values in spreadsheets")]
struct Cli {
    /// Config file (default: <config dir>/dupsy/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the columns of the first source
    Columns {
        #[command(flatten)]
        sources: SourceArgs,
    },

    /// Find and list fuzzy matches
    Scan {
        #[command(flatten)]
        matching: MatchArgs,
        /// Print matches as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the deduplicated match report
    Report {
        #[command(flatten)]
        matching: MatchArgs,
        /// Report file (.xlsx or .csv; default: match_report-<timestamp>.xlsx)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Write all sources as one table with marked values removed
    Clean {
        #[command(flatten)]
        matching: MatchArgs,
        /// Cleaned file (.xlsx or .csv; default: cleaned-<timestamp>.xlsx)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Start with every side marked (true) or unmarked (false)
        #[arg(long, value_name = "BOOL")]
        default_remove: Option<bool>,
        /// Unmark one side of a pair, e.g. `3a`
        #[arg(long, value_name = "PAIR")]
        keep: Vec<PairSide>,
        /// Mark one side of a pair, e.g. `3b`
        #[arg(long, value_name = "PAIR")]
        remove: Vec<PairSide>,
        /// Choose the sides to remove interactively
        #[arg(short, long)]
        interactive: bool,
        /// Only show what would be removed
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Spreadsheet to include (repeatable)
    #[arg(short, long = "file", value_name = "FILE")]
    files: Vec<PathBuf>,
    /// Directory to scan for spreadsheets (repeatable)
    #[arg(short, long = "dir", value_name = "DIR")]
    dirs: Vec<PathBuf>,
}

#[derive(Args, Debug)]
struct MatchArgs {
    #[command(flatten)]
    sources: SourceArgs,
    /// Column to compare (repeatable)
    #[arg(short, long = "column", value_name = "NAME", required = true)]
    columns: Vec<String>,
    /// Threshold preset
    #[arg(short, long, value_enum, conflicts_with = "min_score")]
    threshold: Option<PresetArg>,
    /// Exact threshold, 0-100
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    min_score: Option<u8>,
    /// Similarity metric
    #[arg(long, value_enum)]
    metric: Option<MetricArg>,
    /// Ignore cells that are blank after trimming
    #[arg(long)]
    skip_empty: bool,
}

/// Threshold presets as named on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum PresetArg {
    /// 100
    Complete,
    /// 95
    Strict,
    /// 87
    Balanced,
    /// 75
    Loose,
    /// 65
    VeryLoose,
}

impl From<PresetArg> for ThresholdPreset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Complete => ThresholdPreset::Complete,
            PresetArg::Strict => ThresholdPreset::Strict,
            PresetArg::Balanced => ThresholdPreset::Balanced,
            PresetArg::Loose => ThresholdPreset::Loose,
            PresetArg::VeryLoose => ThresholdPreset::VeryLoose,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum MetricArg {
    /// Indel ratio (default)
    Ratio,
    /// Normalized Levenshtein distance
    Levenshtein,
    JaroWinkler,
}

impl From<MetricArg> for Metric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Ratio => Metric::Ratio,
            MetricArg::Levenshtein => Metric::Levenshtein,
            MetricArg::JaroWinkler => Metric::JaroWinkler,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Columns { sources } => {
            let mut session = Session::new(config);
            session.set_sources(collect_sources(&sources.files, &sources.dirs));
            let columns = session
                .available_columns()
                .context("Please select at least one file")?;
            println!("🗂️  Columns in {}:", session.sources()[0].path.display());
            for column in columns {
                println!("   ▶ {}", column);
            }
        }

        Commands::Scan { matching, json } => {
            let mut session = build_session(config, &matching);
            let summary = compare(&mut session, json)?;
            let matches = session.matches().map(MatchSet::all_pairs).unwrap_or_default();
            if json {
                println!("{}", serde_json::to_string_pretty(matches)?);
            } else {
                print_matches(&session, &summary);
            }
        }

        Commands::Report { matching, output } => {
            let mut session = build_session(config, &matching);
            let summary = compare(&mut session, false)?;
            print_matches(&session, &summary);

            let path = output.unwrap_or_else(|| timestamped("match_report"));
            match session
                .export_report(&path)
                .with_context(|| format!("Failed to export report to {:?}", path))?
            {
                ExportOutcome::Written { path, rows } => {
                    println!("\n✅ Match report with {} row(s) exported to {}", rows, path.display())
                }
                ExportOutcome::NothingToExport => println!("\nNo match data to export."),
            }
        }

        Commands::Clean {
            matching,
            output,
            default_remove,
            keep,
            remove,
            interactive,
            dry_run,
        } => {
            let mut session = build_session(config, &matching);
            if let Some(value) = default_remove {
                session.set_default_remove_intent(value);
            }
            let summary = compare(&mut session, false)?;
            print_matches(&session, &summary);
            if summary.pairs == 0 {
                return Ok(());
            }

            for pick in &keep {
                session
                    .set_intent(pick.index, pick.side, false)
                    .with_context(|| format!("Invalid --keep {}", pick))?;
            }
            for pick in &remove {
                session
                    .set_intent(pick.index, pick.side, true)
                    .with_context(|| format!("Invalid --remove {}", pick))?;
            }
            if interactive {
                choose_removals(session.matches_mut()?)?;
            }

            if dry_run {
                for plan in session.preview_cleanup()? {
                    println!(
                        "   📦 [dry-run] REMOVE {} row(s) from {}",
                        plan.rows.len(),
                        plan.source
                    );
                }
                println!("\n⚠️  Dry-run only; no files were written.");
                return Ok(());
            }

            let path = output.unwrap_or_else(|| timestamped("cleaned"));
            match session
                .export_cleaned(&path)
                .with_context(|| format!("Failed to clean and export to {:?}", path))?
            {
                ExportOutcome::Written { path, rows } => println!(
                    "\n✅ Cleaned file with {} row(s) exported to {}",
                    rows,
                    path.display()
                ),
                ExportOutcome::NothingToExport => println!("\nNo match data to export."),
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Apply config, then command-line overrides, to a fresh session.
fn build_session(mut config: Config, args: &MatchArgs) -> Session {
    if let Some(preset) = args.threshold {
        config.threshold = ThresholdPreset::from(preset).value();
    }
    if let Some(score) = args.min_score {
        config.threshold = score;
    }
    if let Some(metric) = args.metric {
        config.metric = metric.into();
    }
    if args.skip_empty {
        config.skip_empty_keys = true;
    }

    let mut session = Session::new(config);
    session.set_sources(collect_sources(&args.sources.files, &args.sources.dirs));
    session.set_columns(args.columns.clone());
    session
}

fn compare(session: &mut Session, quiet: bool) -> Result<ComparisonSummary> {
    if session.sources().is_empty() {
        anyhow::bail!("Please select files and columns.");
    }
    if quiet {
        return Ok(session.run_comparison()?);
    }

    println!(
        "▶ Comparing {} across {} file(s) at threshold {}",
        session.columns().join(", "),
        session.sources().len(),
        threshold_label(session.config().threshold)
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
    spinner.set_message("Scoring pairs…");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = benchmark("comparison", || session.run_comparison());
    spinner.finish_and_clear();
    Ok(result?)
}

fn print_matches(session: &Session, summary: &ComparisonSummary) {
    println!(
        "▶ {} record(s), {} comparison(s)",
        summary.records, summary.comparisons
    );
    let Some(matches) = session.matches().filter(|m| !m.is_empty()) else {
        println!("No fuzzy matches found.");
        return;
    };

    println!("Found {} fuzzy match(es):", matches.len());
    for (i, pair) in matches.all_pairs().iter().enumerate() {
        println!(
            "\n [{}] {} [{}] ⟷ {} [{}]  [Score: {}]",
            i, pair.key_a, pair.source_a, pair.key_b, pair.source_b, pair.score
        );
        for (side, key, source) in [
            (Side::A, &pair.key_a, &pair.source_a),
            (Side::B, &pair.key_b, &pair.source_b),
        ] {
            let marked = matches.intent(i, side).unwrap_or(false);
            let tag = PairSide { index: i, side };
            println!(
                "   {} {:<5} Remove {} from {}",
                if marked { "🗑️ " } else { "🏆" },
                tag.to_string(),
                key,
                source
            );
        }
    }
}

/// Let the operator tick the sides to remove, pre-checked with their
/// current intent.
fn choose_removals(matches: &mut MatchSet) -> Result<()> {
    let mut items = Vec::with_capacity(matches.len() * 2);
    let mut defaults = Vec::with_capacity(matches.len() * 2);
    let mut sides = Vec::with_capacity(matches.len() * 2);

    for (i, pair) in matches.all_pairs().iter().enumerate() {
        for (side, key, source) in [
            (Side::A, &pair.key_a, &pair.source_a),
            (Side::B, &pair.key_b, &pair.source_b),
        ] {
            items.push(format!("[{}] Remove {} from {}  (score {})", i, key, source, pair.score));
            defaults.push(matches.intent(i, side)?);
            sides.push((i, side));
        }
    }

    let chosen = MultiSelect::new()
        .with_prompt("Select values to remove (space toggles, enter confirms)")
        .items(&items)
        .defaults(&defaults)
        .interact()
        .context("Selection cancelled")?;

    matches.set_all(false);
    for pick in chosen {
        let (index, side) = sides[pick];
        matches.set_intent(index, side, true)?;
    }
    println!("▶ {} value(s) marked for removal", matches.marked_count());
    Ok(())
}

/// `87 (Balanced)` for preset values, the bare number otherwise.
fn threshold_label(threshold: u8) -> String {
    match ThresholdPreset::ALL.into_iter().find(|p| p.value() == threshold) {
        Some(preset) => format!("{} ({})", threshold, preset.label()),
        None => threshold.to_string(),
    }
}

/// `<stem>-<local timestamp>.xlsx` in the current directory.
fn timestamped(stem: &str) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    Path::new(".").join(format!("{}-{}.xlsx", stem, stamp))
}

/// Run `f()`, print how long it took (with `label`), and return its result.
fn benchmark<T, F: FnOnce() -> T>(label: &str, f: F) -> T {
    let start = Instant::now();
    let result = f();
    println!("⏱ {} took {:.2?}", label, start.elapsed());
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_label_names_presets() {
        assert_eq!(threshold_label(87), "87 (Balanced)");
        assert_eq!(threshold_label(100), "100 (Complete Match)");
        assert_eq!(threshold_label(90), "90");
    }

    #[test]
    fn test_cli_presets_and_metrics_map_to_engine_values() {
        let cli = Cli::try_parse_from([
            "dupsy", "scan", "-f", "a.csv", "-c", "Name", "-t", "very-loose", "--metric",
            "jaro-winkler",
        ])
        .unwrap();
        let Commands::Scan { matching, .. } = cli.command else {
            panic!("expected scan");
        };

        let config = build_session(Config::default(), &matching).config().clone();
        assert_eq!(config.threshold, 65);
        assert_eq!(config.metric, Metric::JaroWinkler);
    }

    #[test]
    fn test_preset_conflicts_with_min_score() {
        let result = Cli::try_parse_from([
            "dupsy", "scan", "-f", "a.csv", "-c", "Name", "-t", "strict", "--min-score", "50",
        ]);
        assert!(result.is_err());
    }
}
