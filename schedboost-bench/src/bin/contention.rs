//! Lock contention stress test
//!
//! Many threads take and drop scoped boost requests on random modes while
//! a reader spins on the published mirror.
//!
//! Expected behavior:
//! - Every request is matched by a release, so the engine ends at NoBoost
//! - Placement state is fully restored (energy-aware on, no override)
//! - Enter and exit hook counts balance for every elevated mode

use clap::Parser;
use schedboost_common::BoostMode;
use schedboost_core::{EngineBuilder, PlacementState};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Boost engine contention stress test
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Number of requesting threads
    #[arg(short = 'n', long, default_value_t = 8)]
    threads: usize,

    /// Duration to run the test (seconds)
    #[arg(short, long, default_value_t = 5)]
    duration: u64,

    /// How long each request is held (microseconds)
    #[arg(long, default_value_t = 20)]
    hold_us: u64,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt().with_env_filter("info").init();

    tracing::info!("Boost contention stress test");
    tracing::info!("  {} requesting threads", args.threads);
    tracing::info!("  {} second duration", args.duration);

    let placement = Arc::new(PlacementState::with_default_group());
    let engine = EngineBuilder::new().build(placement.clone());
    let mirror = engine.mirror();

    let stop = AtomicBool::new(false);
    let requests = AtomicU64::new(0);
    let mirror_reads = AtomicU64::new(0);
    let wait_samples: parking_lot::Mutex<Vec<Duration>> = parking_lot::Mutex::new(Vec::new());

    let scoped = crossbeam::scope(|s| {
        for t in 0..args.threads {
            let engine = &engine;
            let stop = &stop;
            let requests = &requests;
            let wait_samples = &wait_samples;
            let hold = Duration::from_micros(args.hold_us);

            s.spawn(move |_| {
                let mut rng: u64 = 0x9e37_79b9_7f4a_7c15 ^ (t as u64 + 1);
                let mut local = Vec::new();

                while !stop.load(Ordering::Relaxed) {
                    // xorshift64
                    rng ^= rng << 13;
                    rng ^= rng >> 7;
                    rng ^= rng << 17;
                    let mode = BoostMode::ELEVATED[(rng % 3) as usize];

                    let start = Instant::now();
                    let guard = match engine.acquire(mode) {
                        Ok(guard) => guard,
                        Err(e) => {
                            tracing::error!("request failed: {}", e);
                            return;
                        }
                    };
                    local.push(start.elapsed());

                    thread::sleep(hold);
                    drop(guard);
                    requests.fetch_add(1, Ordering::Relaxed);
                }

                wait_samples.lock().extend(local);
            });
        }

        let stop_ref = &stop;
        let mirror_reads = &mirror_reads;
        let mirror = &mirror;
        s.spawn(move |_| {
            while !stop_ref.load(Ordering::Relaxed) {
                std::hint::black_box(mirror.get());
                mirror_reads.fetch_add(1, Ordering::Relaxed);
            }
        });

        tracing::info!("Running for {} seconds...", args.duration);
        thread::sleep(Duration::from_secs(args.duration));
        stop.store(true, Ordering::Release);
    });

    if scoped.is_err() {
        tracing::error!("FAIL: a worker thread panicked");
        std::process::exit(1);
    }

    // Report results
    let snapshot = engine.snapshot();
    let metrics = engine.metrics();

    tracing::info!("\n=== Results ===");
    tracing::info!("Requests: {}", requests.load(Ordering::Relaxed));
    tracing::info!("Mirror reads: {}", mirror_reads.load(Ordering::Relaxed));
    for mode in BoostMode::ELEVATED {
        tracing::info!(
            "{}: enter={} exit={}",
            mode,
            metrics.enters(mode),
            metrics.exits(mode)
        );
    }

    let mut samples = wait_samples.lock();
    if !samples.is_empty() {
        samples.sort();
        let p50 = samples[samples.len() / 2];
        let p99 = samples[samples.len() * 99 / 100];
        let max = samples[samples.len() - 1];

        tracing::info!("Request latency p50: {:?}", p50);
        tracing::info!("Request latency p99: {:?}", p99);
        tracing::info!("Request latency max: {:?}", max);
    }

    let mut failed = false;
    if snapshot.effective != BoostMode::NoBoost || snapshot.refcounts != [0; 4] {
        tracing::error!("FAIL: engine not back at baseline: {:?}", snapshot);
        failed = true;
    }
    if placement.energy_aware_disabled() || placement.boost_override("top-app") != Some(0) {
        tracing::error!("FAIL: placement state not restored");
        failed = true;
    }
    for mode in BoostMode::ELEVATED {
        if metrics.enters(mode) != metrics.exits(mode) {
            tracing::error!("FAIL: unbalanced hooks for {}", mode);
            failed = true;
        }
    }
    if failed {
        std::process::exit(1);
    }

    tracing::info!("PASS: engine and placement restored");
}
