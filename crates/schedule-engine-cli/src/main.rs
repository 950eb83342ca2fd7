//! `boxsched` CLI: expand schedules and check box slots from JSON.
//!
//! ## Usage
//!
//! ```sh
//! # Expand a recurrence rule over a date range (stdin → stdout)
//! echo '{"rule":{"type":"weekly","dayOfWeek":[1,2]},"range":{"from":"2022-02-01","to":"2022-02-20"}}' \
//!   | boxsched expand
//!
//! # Report dates a schedule shares with other schedules of its venue
//! boxsched overlaps -i schedules.json
//!
//! # Validate a batch of new slots against each other and persisted slots
//! boxsched check-slots -i slots.json --cleanup-minutes 15
//!
//! # Book two slots on different boxes as one linked double booking
//! boxsched link -i pair.json --offset-minutes 15
//! ```
//!
//! Settings not given as flags come from `SchedulerConfig::from_env()`.
//! Logs go to stderr; set `RUST_LOG` or pass `--verbose` for more detail.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use schedule_engine::{
    check_schedule_overlaps, expand, find_batch_conflicts, DateRange, RecurrenceRule, Schedule,
    SchedulerConfig, Slot, SlotBook, SlotLink, SlotRequest,
};
use serde::Deserialize;
use std::io::{self, Read};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "boxsched",
    version,
    about = "Venue box schedule expansion and slot conflict checks"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Cleanup buffer in minutes (overrides BOXSCHED_CLEANUP_MINUTES)
    #[arg(long, global = true)]
    cleanup_minutes: Option<u32>,

    /// Log engine decisions at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand a recurrence rule into applied dates
    Expand {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Report dates a schedule shares with other schedules of its venue
    Overlaps {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Check new slots against each other and persisted slots; exits 1 on conflict
    CheckSlots {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
    /// Link two new slots on different boxes into a double booking
    Link {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Start offset between the halves (overrides BOXSCHED_LINK_OFFSET_MINUTES)
        #[arg(long)]
        offset_minutes: Option<u32>,
    },
}

#[derive(Deserialize)]
struct ExpandInput {
    #[serde(default)]
    rule: Option<RecurrenceRule>,
    range: DateRange,
}

#[derive(Deserialize)]
struct OverlapsInput {
    schedule: Schedule,
    #[serde(default)]
    others: Vec<Schedule>,
}

#[derive(Deserialize)]
struct CheckSlotsInput {
    candidates: Vec<SlotRequest>,
    #[serde(default)]
    existing: Vec<Slot>,
}

#[derive(Deserialize)]
struct LinkInput {
    first: Slot,
    second: Slot,
    #[serde(default)]
    existing: Vec<Slot>,
    #[serde(default)]
    links: Vec<SlotLink>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = SchedulerConfig::from_env().context("Failed to load configuration")?;
    if let Some(minutes) = cli.cleanup_minutes {
        config.cleanup_minutes = minutes;
    }
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Expand { input, output } => {
            let request: ExpandInput = parse_input(input.as_deref())?;
            ensure_range_allowed(&request.range, &config)?;
            let applied = expand(request.rule.as_ref(), &request.range)
                .context("Failed to expand recurrence rule")?;
            write_output(output.as_deref(), &serde_json::to_string_pretty(&applied)?)?;
        }
        Commands::Overlaps { input, output } => {
            let request: OverlapsInput = parse_input(input.as_deref())?;
            for schedule in std::iter::once(&request.schedule).chain(&request.others) {
                ensure_range_allowed(&schedule.range, &config)?;
            }
            let overlaps = check_schedule_overlaps(&request.schedule, &request.others)
                .context("Failed to compare schedules")?;
            write_output(output.as_deref(), &serde_json::to_string_pretty(&overlaps)?)?;
        }
        Commands::CheckSlots { input } => {
            let request: CheckSlotsInput = parse_input(input.as_deref())?;
            let report =
                find_batch_conflicts(&request.candidates, &request.existing, config.cleanup())
                    .context("Failed to check slots")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.is_clean() {
                process::exit(1);
            }
        }
        Commands::Link {
            input,
            offset_minutes,
        } => {
            let request: LinkInput = parse_input(input.as_deref())?;
            let offset = offset_minutes.unwrap_or(config.link_offset_minutes);
            let mut book = SlotBook::load(request.existing, request.links)
                .context("Persisted slots are inconsistent")?;
            let pair = book
                .insert_pair(request.first, request.second, offset, config.cleanup())
                .context("Failed to link slots")?;
            println!("{}", serde_json::to_string_pretty(&pair)?);
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "info,schedule_engine=debug,schedule_engine_cli=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(io::stderr)
        .init();
}

/// Reject ranges longer than the configured expansion limit.
fn ensure_range_allowed(range: &DateRange, config: &SchedulerConfig) -> Result<()> {
    if range.len_days() > i64::from(config.max_range_days) {
        anyhow::bail!(
            "Date range {}..{} spans {} days, more than the limit of {}",
            range.from(),
            range.to(),
            range.len_days(),
            config.max_range_days
        );
    }
    Ok(())
}

fn parse_input<T: for<'de> Deserialize<'de>>(path: Option<&str>) -> Result<T> {
    let raw = read_input(path)?;
    serde_json::from_str(&raw).context("Failed to parse input JSON")
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
