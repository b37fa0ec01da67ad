// SPDX-License-Identifier: GPL-2.0-only
// Copyright (C) 2024 Ankit Kumar Pandey <ankitkpandey1@gmail.com>

//! schedboostctl - drive the boost arbitration engine from the shell
//!
//! Commands use the control-file encoding: `0` resets, `+k` requests
//! mode `k`, `-k` releases it. The engine is wired to an in-memory
//! placement backend whose state is printed after each command.

use anyhow::{bail, Context, Result};
use clap::Parser;
use schedboost_common::BoostMode;
use schedboost_core::{ControlFile, EngineBuilder, EngineConfig, PlacementState};
use std::io::BufRead;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Scheduler boost arbitration driver
///
/// Applies boost commands in order and reports the requested value, the
/// effective mode and the resulting placement state after each one.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Commands to apply (0 = reset, k = request mode k, -k = release)
    #[arg(allow_negative_numbers = true)]
    commands: Vec<i32>,

    /// Command to apply after the positional ones (repeatable)
    #[arg(short = 'c', long = "command", allow_negative_numbers = true)]
    command: Vec<i32>,

    /// Also read one command per line from stdin
    #[arg(long)]
    stdin: bool,

    /// Group driven by the conservative and restrained modes
    #[arg(long, default_value = schedboost_common::config::DEFAULT_BOOST_GROUP)]
    boost_group: String,

    /// Boost override written while conservative is effective
    #[arg(long, default_value_t = schedboost_common::config::CONSERVATIVE_BOOST_OVERRIDE)]
    conservative_override: u32,

    /// Boost override written while restrained is effective
    #[arg(long, default_value_t = schedboost_common::config::RESTRAINED_BOOST_OVERRIDE)]
    restrained_override: u32,

    /// Print Prometheus metrics before exiting
    #[arg(long)]
    metrics: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = if args.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let placement = Arc::new(PlacementState::new());
    placement.add_group(&args.boost_group);

    let config = EngineConfig {
        boost_group: args.boost_group.clone(),
        conservative_override: args.conservative_override,
        restrained_override: args.restrained_override,
    };
    let engine = EngineBuilder::with_config(config).build(placement.clone());
    let control = ControlFile::new(Arc::new(engine));

    info!(
        "schedboostctl starting, boost group {:?} (conservative={}, restrained={})",
        args.boost_group, args.conservative_override, args.restrained_override
    );

    // Never leave a boost behind on interrupt
    let c = control.clone();
    ctrlc::set_handler(move || {
        info!("Received interrupt, dropping all boosts...");
        c.engine().reset();
        std::process::exit(130);
    })
    .context("Error setting Ctrl-C handler")?;

    let mut rejected = 0usize;

    for command in args.commands.iter().chain(&args.command) {
        if !apply(&control, &placement, &args.boost_group, &command.to_string()) {
            rejected += 1;
        }
    }

    if args.stdin {
        for line in std::io::stdin().lock().lines() {
            let line = line.context("Failed to read command from stdin")?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if !apply(&control, &placement, &args.boost_group, line) {
                rejected += 1;
            }
        }
    }

    if args.metrics {
        print!("{}", control.engine().metrics().render());
    }

    if rejected > 0 {
        bail!("{} command(s) rejected", rejected);
    }

    Ok(())
}

/// Write one command and print the resulting state. Returns `false` if
/// the command was rejected.
fn apply(control: &ControlFile, placement: &PlacementState, group: &str, input: &str) -> bool {
    if let Err(e) = control.write(input) {
        warn!("{}: {}", input, e);
        return false;
    }

    let effective: BoostMode = control.engine().effective();
    println!(
        "requested={} effective={} ({}) energy_aware_disabled={} {}.boost_override={}",
        control.read().trim_end(),
        effective as u32,
        effective,
        placement.energy_aware_disabled(),
        group,
        placement
            .boost_override(group)
            .map_or_else(|| "-".to_string(), |v| v.to_string()),
    );
    true
}
