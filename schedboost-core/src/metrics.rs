//! Prometheus metrics for the boost engine
//!
//! ## Metrics Exported
//!
//! - `schedboost_transitions_total{from, to}` - Effective mode changes
//! - `schedboost_hook_calls_total{mode, hook}` - Enter/exit hook invocations
//! - `schedboost_resets_total` - Reset commands applied
//! - `schedboost_invalid_commands_total` - Commands rejected as invalid
//! - `schedboost_effective_mode` - Wire value of the effective mode

use schedboost_common::BoostMode;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

const MODES: usize = BoostMode::ALL.len();

/// Metrics collector for one engine
///
/// Modes are a closed set, so every series is a fixed atomic slot.
pub struct BoostMetrics {
    transitions: [[AtomicU64; MODES]; MODES],
    enters: [AtomicU64; MODES],
    exits: [AtomicU64; MODES],
    resets: AtomicU64,
    invalid_commands: AtomicU64,
    effective: AtomicU32,
}

impl Default for BoostMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl BoostMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            transitions: std::array::from_fn(|_| std::array::from_fn(|_| AtomicU64::new(0))),
            enters: std::array::from_fn(|_| AtomicU64::new(0)),
            exits: std::array::from_fn(|_| AtomicU64::new(0)),
            resets: AtomicU64::new(0),
            invalid_commands: AtomicU64::new(0),
            effective: AtomicU32::new(BoostMode::NoBoost as u32),
        }
    }

    /// Record an effective mode change
    pub fn record_transition(&self, from: BoostMode, to: BoostMode) {
        self.transitions[from.index()][to.index()].fetch_add(1, Ordering::Relaxed);
        self.effective.store(to as u32, Ordering::Relaxed);
    }

    /// Record an enter hook call
    pub fn record_enter(&self, mode: BoostMode) {
        self.enters[mode.index()].fetch_add(1, Ordering::Relaxed);
    }

    /// Record an exit hook call
    pub fn record_exit(&self, mode: BoostMode) {
        self.exits[mode.index()].fetch_add(1, Ordering::Relaxed);
    }

    /// Record a reset
    pub fn record_reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected command
    pub fn record_invalid(&self) {
        self.invalid_commands.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of transitions from `from` to `to`
    pub fn transitions(&self, from: BoostMode, to: BoostMode) -> u64 {
        self.transitions[from.index()][to.index()].load(Ordering::Relaxed)
    }

    /// Number of enter hook calls for `mode`
    pub fn enters(&self, mode: BoostMode) -> u64 {
        self.enters[mode.index()].load(Ordering::Relaxed)
    }

    /// Number of exit hook calls for `mode`
    pub fn exits(&self, mode: BoostMode) -> u64 {
        self.exits[mode.index()].load(Ordering::Relaxed)
    }

    /// Number of resets applied
    pub fn resets(&self) -> u64 {
        self.resets.load(Ordering::Relaxed)
    }

    /// Number of rejected commands
    pub fn invalid_commands(&self) -> u64 {
        self.invalid_commands.load(Ordering::Relaxed)
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> String {
        let mut output = String::new();

        // Transitions, only the pairs that happened
        output.push_str("# HELP schedboost_transitions_total Effective boost mode changes\n");
        output.push_str("# TYPE schedboost_transitions_total counter\n");
        for from in BoostMode::ALL {
            for to in BoostMode::ALL {
                let count = self.transitions(from, to);
                if count == 0 {
                    continue;
                }
                output.push_str(&format!(
                    "schedboost_transitions_total{{from=\"{}\",to=\"{}\"}} {}\n",
                    from, to, count
                ));
            }
        }

        // Hook calls
        output.push_str("# HELP schedboost_hook_calls_total Boost hook invocations by mode\n");
        output.push_str("# TYPE schedboost_hook_calls_total counter\n");
        for mode in BoostMode::ALL {
            output.push_str(&format!(
                "schedboost_hook_calls_total{{mode=\"{}\",hook=\"enter\"}} {}\n",
                mode,
                self.enters(mode)
            ));
            output.push_str(&format!(
                "schedboost_hook_calls_total{{mode=\"{}\",hook=\"exit\"}} {}\n",
                mode,
                self.exits(mode)
            ));
        }

        output.push_str("# HELP schedboost_resets_total Reset commands applied\n");
        output.push_str("# TYPE schedboost_resets_total counter\n");
        output.push_str(&format!("schedboost_resets_total {}\n", self.resets()));

        output.push_str("# HELP schedboost_invalid_commands_total Commands rejected as invalid\n");
        output.push_str("# TYPE schedboost_invalid_commands_total counter\n");
        output.push_str(&format!(
            "schedboost_invalid_commands_total {}\n",
            self.invalid_commands()
        ));

        output.push_str("# HELP schedboost_effective_mode Currently effective boost mode\n");
        output.push_str("# TYPE schedboost_effective_mode gauge\n");
        output.push_str(&format!(
            "schedboost_effective_mode {}\n",
            self.effective.load(Ordering::Relaxed)
        ));

        output
    }
}
