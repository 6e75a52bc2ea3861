// src/main.rs

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use dsa_mastery_lib::config::default_data_dir;
use dsa_mastery_lib::constants::DSA_MASTER_PATTERNS;
use dsa_mastery_lib::{
    Difficulty, GeneratedNote, OfflineClassifier, Problem, ProblemProgressTracker, ProblemStatus,
    Report, TrackerConfig,
};
use log::{info, warn};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dsa-mastery")]
#[command(about = "Track DSA interview practice by pattern", long_about = None)]
struct Cli {
    /// Directory holding the catalog and progress files
    #[arg(long, env = "DSA_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Problem catalog (JSON list); defaults to <data-dir>/neetcode_150.json
    #[arg(long, env = "DSA_CATALOG_FILE", global = true)]
    catalog: Option<PathBuf>,

    /// Progress record; defaults to <data-dir>/progress.json
    #[arg(long, env = "DSA_PROGRESS_FILE", global = true)]
    progress: Option<PathBuf>,

    /// Offer the canonical pattern list even where the catalog has no problems yet
    #[arg(long, global = true)]
    master_patterns: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Next unsolved problem, in the given pattern or the next open one
    Today {
        #[arg(long)]
        pattern: Option<String>,
    },

    /// Random unsolved problem
    Random {
        /// Easy, Medium or Hard
        #[arg(long)]
        difficulty: Option<String>,
    },

    /// Show one problem and its ledger entry
    Show { id: String },

    /// Patterns in study order with per-pattern counters
    Patterns,

    /// List problems, optionally by pattern ("any" for all) and status
    List {
        #[arg(long)]
        pattern: Option<String>,

        /// completed, skipped or unset
        #[arg(long)]
        status: Option<String>,
    },

    /// Mark a problem skipped
    Skip { id: String },

    /// Record a solve
    Solve {
        id: String,

        /// JSON file with the analysis to store alongside the solve
        #[arg(long)]
        analysis: Option<PathBuf>,

        /// Source file with the solution
        #[arg(long)]
        code: Option<PathBuf>,
    },

    /// Set the pattern currently being studied
    Focus { pattern: String },

    /// Override a problem's pattern
    Reclassify { id: String, pattern: String },

    /// Attach a markdown note to a problem and collect its flashcards
    Note { id: String, file: PathBuf },

    /// Print stored flashcards for a problem
    Flashcards { id: String },

    /// Progress overview
    Summary,

    /// Open the problem page in the default browser
    Open { id: String },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    info!("Catalog: {:?}, progress: {:?}", config.catalog_path, config.progress_path);

    let mut tracker = ProblemProgressTracker::open(config, OfflineClassifier)
        .context("problem catalog unavailable")?;
    print_warnings(tracker.startup_report());

    match cli.command {
        Commands::Today { pattern } => today(&tracker, pattern.as_deref()),
        Commands::Random { difficulty } => {
            let difficulty = difficulty
                .map(|d| d.parse::<Difficulty>())
                .transpose()
                .map_err(|e: String| anyhow!(e))?;
            match tracker.get_random_unsolved(difficulty) {
                Some(p) => print_problem(p),
                None => println!("No unsolved problems match."),
            }
            Ok(())
        }
        Commands::Show { id } => show(&tracker, &id),
        Commands::Patterns => {
            patterns(&tracker);
            Ok(())
        }
        Commands::List { pattern, status } => {
            list(&tracker, pattern.as_deref(), status.as_deref())
        }
        Commands::Skip { id } => {
            let report = tracker
                .mark_skipped(&id)
                .ok_or_else(|| anyhow!("no problem with id '{}'", id))?;
            print_warnings(&report);
            println!("Skipped {}.", id);
            Ok(())
        }
        Commands::Solve { id, analysis, code } => solve(&mut tracker, &id, analysis, code),
        Commands::Focus { pattern } => match tracker.set_current_pattern(&pattern) {
            Some(report) => {
                print_warnings(&report);
                println!("Now studying: {}", pattern);
                Ok(())
            }
            None => bail!(
                "unknown pattern '{}'. Known patterns: {}",
                pattern,
                tracker.get_all_patterns().join(", ")
            ),
        },
        Commands::Reclassify { id, pattern } => {
            let report = tracker
                .reclassify(&id, &pattern)
                .ok_or_else(|| anyhow!("no problem with id '{}' (or empty pattern)", id))?;
            print_warnings(&report);
            println!("{} is now filed under {}.", id, pattern.trim());
            Ok(())
        }
        Commands::Note { id, file } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("failed to read note {:?}", file))?;
            let note = GeneratedNote::from_markdown(text);
            let count = note.flashcards.len();
            let report = tracker
                .attach_note(&id, Some(file.display().to_string()), note.flashcards)
                .ok_or_else(|| anyhow!("no problem with id '{}'", id))?;
            print_warnings(&report);
            println!("Attached note to {} ({} flashcards).", id, count);
            Ok(())
        }
        Commands::Flashcards { id } => {
            let entry = tracker
                .progress_entry(&id)
                .ok_or_else(|| anyhow!("no progress recorded for '{}'", id))?;
            for card in entry.flashcards() {
                println!("{}", card);
            }
            Ok(())
        }
        Commands::Summary => {
            let summary = tracker.get_progress_summary();
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Commands::Open { id } => {
            let problem = tracker
                .get_by_id(&id)
                .ok_or_else(|| anyhow!("no problem with id '{}'", id))?;
            if problem.url.is_empty() {
                bail!("{} has no url", id);
            }
            webbrowser::open(&problem.url)
                .with_context(|| format!("failed to open {}", problem.url))
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<TrackerConfig> {
    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    if !data_dir.exists() {
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data dir {:?}", data_dir))?;
    }

    let mut config = TrackerConfig::in_dir(&data_dir);
    if let Some(catalog) = &cli.catalog {
        config.catalog_path = catalog.clone();
    }
    if let Some(progress) = &cli.progress {
        config.progress_path = progress.clone();
    }
    if cli.master_patterns {
        config = config.with_master_patterns(DSA_MASTER_PATTERNS);
    }
    Ok(config)
}

fn today(tracker: &ProblemProgressTracker, pattern: Option<&str>) -> Result<()> {
    match tracker.get_today_problem(pattern) {
        (Some(pattern), Some(problem)) => {
            println!("Pattern: {}", pattern);
            print_problem(problem);
        }
        (Some(pattern), None) => println!("Nothing left in {}.", pattern),
        (None, _) => println!("Every problem is solved."),
    }
    Ok(())
}

fn show(tracker: &ProblemProgressTracker, id: &str) -> Result<()> {
    let problem = tracker
        .get_by_id(id)
        .ok_or_else(|| anyhow!("no problem with id '{}'", id))?;
    print_problem(problem);
    if !problem.description.is_empty() {
        println!("\n{}", problem.description);
    }
    if let Some(entry) = tracker.progress_entry(id) {
        println!(
            "\nLast update {} (solved: {})",
            entry.date.format("%Y-%m-%d %H:%M"),
            entry.solved
        );
        if let Some(path) = &entry.note_path {
            println!("Note: {}", path);
        }
    }
    Ok(())
}

fn patterns(tracker: &ProblemProgressTracker) {
    let summary = tracker.get_progress_summary();
    let current = tracker.get_current_pattern();
    let mut all = tracker.get_all_patterns();
    all.sort_by_key(|p| tracker.get_pattern_index(p).unwrap_or(usize::MAX));

    for pattern in all {
        let total = tracker.get_by_pattern(Some(pattern.as_str())).len();
        let done = tracker
            .get_by_pattern(Some(pattern.as_str()))
            .iter()
            .filter(|p| p.is_completed())
            .count();
        let stats = summary.patterns.get(&pattern).copied().unwrap_or_default();
        let marker = if current.as_deref() == Some(pattern.as_str()) { "*" } else { " " };
        println!(
            "{} {:<22} {:>3}/{:<3} (solves recorded: {})",
            marker, pattern, done, total, stats.solved
        );
    }
}

fn list(
    tracker: &ProblemProgressTracker,
    pattern: Option<&str>,
    status: Option<&str>,
) -> Result<()> {
    let status: Option<ProblemStatus> = status
        .map(|s| s.parse::<ProblemStatus>())
        .transpose()
        .map_err(|e: String| anyhow!(e))?;
    for problem in tracker
        .get_by_pattern(pattern)
        .into_iter()
        .filter(|p| status.map_or(true, |s| p.status == s))
    {
        print_problem(problem);
    }
    Ok(())
}

fn solve(
    tracker: &mut ProblemProgressTracker,
    id: &str,
    analysis: Option<PathBuf>,
    code: Option<PathBuf>,
) -> Result<()> {
    let problem = tracker
        .get_by_id(id)
        .cloned()
        .ok_or_else(|| anyhow!("no problem with id '{}'", id))?;

    let analysis = match analysis {
        Some(path) => {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read analysis {:?}", path))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("analysis {:?} is not valid JSON", path))?
        }
        None => Value::Null,
    };
    let code = code
        .map(|path| {
            fs::read_to_string(&path).with_context(|| format!("failed to read code {:?}", path))
        })
        .transpose()?;

    let report = tracker
        .record_solution(&problem, code.as_deref(), analysis)
        .ok_or_else(|| anyhow!("no problem with id '{}'", id))?;
    print_warnings(&report);
    let summary = tracker.get_progress_summary();
    println!(
        "Recorded {} - {}/{} solved, streak {}.",
        problem.title, summary.solved, summary.total, summary.streak
    );
    Ok(())
}

fn print_problem(p: &Problem) {
    let status = match p.status {
        ProblemStatus::Unset => "",
        ProblemStatus::Completed => " [done]",
        ProblemStatus::Skipped => " [skipped]",
    };
    println!(
        "{:<8} {:<6} {:<45} {}{}",
        p.id, p.difficulty, p.title, p.url, status
    );
}

fn print_warnings(report: &Report) {
    for w in &report.warnings {
        warn!("{}", w);
    }
}
