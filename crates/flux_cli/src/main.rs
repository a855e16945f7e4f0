//! Flux Replay - headless tween scenario runner
//!
//! Loads a TOML scenario, drives its tweens with a fixed-step clock the way
//! a game loop would, and prints the animated values frame by frame.

mod replay;
mod scenario;

use anyhow::{Context, Result};
use clap::Parser;
use replay::{Replay, Report, RunOptions};
use scenario::Scenario;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Replay tween scenarios headlessly
#[derive(Parser, Debug)]
#[command(name = "flux-replay")]
#[command(about = "Replay tween scenarios against a fixed-step clock")]
#[command(version)]
struct Args {
    /// Scenario file (TOML)
    scenario: PathBuf,

    /// Timestep in seconds, overriding the scenario's `settings.dt`
    #[arg(long)]
    dt: Option<f32>,

    /// Stop after this much simulated time
    #[arg(long)]
    max_time: Option<f32>,

    /// Print every n-th frame
    #[arg(long)]
    every: Option<usize>,

    /// Emit the full report as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let scenario = Scenario::from_path(&args.scenario)?;
    let replay = Replay::build(&scenario)
        .with_context(|| format!("invalid scenario {}", args.scenario.display()))?;

    info!(
        tweens = scenario.tweens.len(),
        values = scenario.values.len(),
        "replaying {}",
        args.scenario.display()
    );

    let options = RunOptions {
        dt: args.dt,
        max_time: args.max_time,
        every: args.every,
    };
    let report = replay.run(&scenario, options)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_table(&report);
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_table(report: &Report) {
    let Some(first) = report.frames.first() else {
        return;
    };

    let mut header = format!("{:>6} {:>9}", "frame", "time");
    for name in first.values.keys().chain(first.flags.keys()) {
        header.push_str(&format!(" {name:>10}"));
    }
    println!("{header}");

    for frame in &report.frames {
        let mut row = format!("{:>6} {:>9.4}", frame.frame, frame.time);
        for value in frame.values.values() {
            row.push_str(&format!(" {value:>10.4}"));
        }
        for count in frame.flags.values() {
            row.push_str(&format!(" {count:>10}"));
        }
        println!("{row}");
    }

    println!();
    for event in &report.events {
        println!("{:>9.4}  {:?} {}", event.time, event.kind, event.tween);
    }
    if report.unfinished > 0 {
        println!(
            "stopped at {:.4}s with {} tween(s) unfinished",
            report.elapsed, report.unfinished
        );
    }
}
