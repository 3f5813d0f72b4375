use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "drillmotion", version)]
struct Cli {
    /// Log debug diagnostics (incomplete timelines, discarded passes) to stderr.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that every sheet ends where the next begins.
    Check(CheckArgs),
    /// Print one dot's movement records on a sheet.
    Timeline(TimelineArgs),
    /// Print a dot's position and facing at a beat.
    State(StateArgs),
    /// Print the beats at which dots come within a step of each other.
    Collisions(CollisionArgs),
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Input show JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct TimelineArgs {
    /// Input show JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Sheet index (0-based).
    #[arg(long)]
    sheet: usize,

    /// Dot label.
    #[arg(long)]
    dot: String,
}

#[derive(Parser, Debug)]
struct StateArgs {
    /// Input show JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Dot label.
    #[arg(long)]
    dot: String,

    /// Beat to sample; sheet-local with `--sheet`, show-wide otherwise.
    #[arg(long)]
    beat: f64,

    /// Sheet index (0-based).
    #[arg(long)]
    sheet: Option<usize>,
}

#[derive(Parser, Debug)]
struct CollisionArgs {
    /// Input show JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Sheet index (0-based).
    #[arg(long)]
    sheet: usize,
}

#[derive(serde::Serialize)]
struct StateOut {
    x: f64,
    y: f64,
    angle: f64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Check(args) => cmd_check(args),
        Command::Timeline(args) => cmd_timeline(args),
        Command::State(args) => cmd_state(args),
        Command::Collisions(args) => cmd_collisions(args),
    }
}

fn read_show(path: &Path) -> anyhow::Result<drillmotion::Show> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read show '{}'", path.display()))?;
    let mut show = drillmotion::Show::from_json_str(&text)
        .with_context(|| format!("load show '{}'", path.display()))?;
    show.update_all_movements()
        .with_context(|| "resolve continuities")?;
    Ok(show)
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).with_context(|| "serialize output")?;
    println!("{text}");
    Ok(())
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let show = read_show(&args.in_path)?;
    let report = show.check_consistency()?;
    print_json(&report)?;
    if !report.is_clean() {
        anyhow::bail!(
            "{} sheet(s) have consistency issues",
            report.sheets.len()
        );
    }
    Ok(())
}

fn cmd_timeline(args: TimelineArgs) -> anyhow::Result<()> {
    let show = read_show(&args.in_path)?;
    let dot = drillmotion::DotId::new(args.dot);
    let timeline = show.sheet(args.sheet)?.timeline(&dot)?;
    if !timeline.is_complete() {
        eprintln!(
            "warning: timeline covers {} of {} beats",
            timeline.beats_covered(),
            timeline.num_beats()
        );
    }
    print_json(&timeline.records())
}

fn cmd_state(args: StateArgs) -> anyhow::Result<()> {
    let show = read_show(&args.in_path)?;
    let dot = drillmotion::DotId::new(args.dot);
    let state = match args.sheet {
        Some(sheet) => show.sheet_state_at(sheet, &dot, args.beat)?,
        None => show.state_at(&dot, args.beat)?,
    };
    print_json(&StateOut {
        x: state.position.x,
        y: state.position.y,
        angle: state.angle.degrees(),
    })
}

fn cmd_collisions(args: CollisionArgs) -> anyhow::Result<()> {
    let mut show = read_show(&args.in_path)?;
    let set = show.update_collisions(args.sheet)?;
    print_json(set)
}
