// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use navscore_core::import::TrackCsvParser;
use navscore_core::legs::LegTiming;
use navscore_core::matcher::CrossingStatus;
use navscore_core::off_course::OffCourseLeg;
use navscore_core::route::format_mmss;
use navscore_core::{score_batch, score_flight, ScoreBreakdown, ScoreRequest, ScoringConfig};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one flight from a JSON request
    Score {
        request: PathBuf,
        /// Scoring config JSON, overrides the request's own
        #[arg(short, long, env = "NAVSCORE_CONFIG")]
        config: Option<PathBuf>,
        /// CSV track (time,lat,lon[,alt]) replacing the request's trajectory
        #[arg(short, long)]
        track: Option<PathBuf>,
        /// Print the breakdown as JSON
        #[arg(long)]
        json: bool,
    },
    /// Score several requests in parallel
    Batch {
        #[arg(required = true)]
        requests: Vec<PathBuf>,
        #[arg(short, long, env = "NAVSCORE_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Print the default scoring config
    DefaultConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Score {
            request,
            config,
            track,
            json,
        } => {
            let mut req = load_request(&request)?;
            if let Some(cfg) = resolve_config(config.as_deref())? {
                req.config = cfg;
            }
            if let Some(path) = track {
                req.trajectory = TrackCsvParser::parse_file(&path)
                    .with_context(|| format!("Failed to import track {}", path.display()))?;
                info!(
                    "[CLI] Trajectory replaced from CSV: path={} points={}",
                    path.display(),
                    req.trajectory.len()
                );
            }

            let breakdown = score_flight(&req)
                .with_context(|| format!("Failed to score {}", request.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&breakdown)?);
            } else {
                print_breakdown(&req, &breakdown);
            }
        }
        Commands::Batch { requests, config } => {
            let override_config = resolve_config(config.as_deref())?;
            let mut loaded = Vec::with_capacity(requests.len());
            for path in &requests {
                let mut req = load_request(path)?;
                if let Some(cfg) = &override_config {
                    req.config = cfg.clone();
                }
                loaded.push(req);
            }

            let mut failures = 0usize;
            for (path, result) in requests.iter().zip(score_batch(&loaded)) {
                match result {
                    Ok(b) => println!(
                        "{:>7.2}  {}  (deviation {}, off-course {:.2} nm, fuel {:+.1}%)",
                        b.overall_score,
                        path.display(),
                        format_mmss(b.total_time_deviation),
                        b.total_off_course,
                        b.fuel_error_pct
                    ),
                    Err(e) => {
                        failures += 1;
                        println!("  error  {}  {}", path.display(), e);
                    }
                }
            }
            if failures > 0 {
                anyhow::bail!("{} of {} requests could not be scored", failures, requests.len());
            }
        }
        Commands::DefaultConfig => {
            println!("{}", serde_json::to_string_pretty(&ScoringConfig::default())?);
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    // Fails only if a logger is already installed.
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

fn load_request(path: &Path) -> Result<ScoreRequest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse request {}", path.display()))
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "navscore", "navscore")
        .map(|dirs| dirs.config_dir().join("scoring.json"))
}

/// `--config` wins, then the user's `scoring.json`. `None` keeps the
/// config embedded in each request.
fn resolve_config(explicit: Option<&Path>) -> Result<Option<ScoringConfig>> {
    if let Some(path) = explicit {
        return ScoringConfig::load(path).map(Some);
    }
    match user_config_path() {
        Some(path) if path.exists() => {
            debug!("[CLI] Using user scoring config: path={}", path.display());
            ScoringConfig::load(&path).map(Some)
        }
        _ => Ok(None),
    }
}

fn print_breakdown(req: &ScoreRequest, b: &ScoreBreakdown) {
    match b.departure.time() {
        Some(time) => println!(
            "Departure: {} at {}",
            req.start_gate.name,
            time.format("%H:%M:%S")
        ),
        None => println!("Departure: {} not detected", req.start_gate.name),
    }
    println!();
    println!(
        "{:<4} {:<28} {:>8} {:>8} {:>8} {:>8} {:>10}",
        "Leg", "From -> To", "Plan", "Actual", "Dev", "Penalty", "Off-course"
    );
    for (leg, oc) in b.legs.iter().zip(&b.off_course_legs) {
        let (actual, dev) = match leg.timing {
            LegTiming::Timed {
                actual_secs,
                deviation_secs,
            } => (format_mmss(actual_secs), format_mmss(deviation_secs)),
            LegTiming::Missed => ("--".to_string(), "missed".to_string()),
        };
        let off_course = match oc {
            OffCourseLeg::Measured { deviation_nm, .. } => format!("{:.2} nm", deviation_nm),
            OffCourseLeg::Unavailable => "--".to_string(),
            OffCourseLeg::Degenerate { .. } => "n/a".to_string(),
        };
        println!(
            "{:<4} {:<28} {:>8} {:>8} {:>8} {:>8.2} {:>10}",
            leg.leg + 1,
            format!("{} -> {}", leg.from, leg.to),
            format_mmss(leg.planned_secs),
            actual,
            dev,
            leg.penalty,
            off_course
        );
    }

    let missed: Vec<&str> = b
        .checkpoint_results
        .iter()
        .filter(|c| c.crossing == CrossingStatus::Missed)
        .map(|c| c.name.as_str())
        .collect();
    if !missed.is_empty() {
        println!("Missed checkpoints: {}", missed.join(", "));
    }

    println!();
    println!(
        "Total time:   planned {}  flown {}  deviation {}  penalty {:.2}",
        format_mmss(b.estimated_total_time),
        b.actual_total_time.map_or("--".to_string(), format_mmss),
        format_mmss(b.total_time_deviation),
        b.total_time_penalty + b.total_time_error_penalty
    );
    println!(
        "Off course:   {:.2} nm  penalty {:.2}",
        b.total_off_course, b.off_course_penalty
    );
    println!(
        "Fuel:         {:+.1}%  penalty {:.2}",
        b.fuel_error_pct, b.fuel_penalty
    );
    println!(
        "Secrets:      {} found, {} checkpoint / {} enroute missed  penalty {:.2}",
        b.secrets_found.len(),
        b.secrets_missed_checkpoint,
        b.secrets_missed_enroute,
        b.secrets_penalty
    );
    println!();
    println!("Score: {:.2} / {:.0}", b.overall_score, navscore_core::MAX_SCORE);
}
