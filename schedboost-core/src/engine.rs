//! Arbitration engine
//!
//! The engine owns the [`ModeTable`] and the effective mode. Every command
//! runs as one critical section under a single lock: count update, hook
//! calls and the effective mode update all complete before another caller
//! can observe anything.
//!
//! # Transition Rules
//!
//! ```text
//! request(m):  count 0 -> 1 and the priority scan picks a new winner
//!              => exit(old), enter(new)
//! release(m):  count 1 -> 0 and m was the effective mode
//!              => exit(m), enter(next winner)
//! reset:       exit every requested mode, zero all counts, back to NoBoost
//! ```
//!
//! At most one exit/enter pair per mode happens in one call, and an enter
//! is always directly preceded by an exit.

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::guard::BoostGuard;
use crate::hooks::BoostHook;
use crate::metrics::BoostMetrics;
use crate::table::ModeTable;
use parking_lot::Mutex;
use schedboost_common::{BoostMode, Command};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Read-only mirror of the engine's committed state
///
/// Scheduling code holds one of these (see [`BoostEngine::mirror`]) and
/// reads it without touching the engine lock. The effective mode and the
/// raw command share one word, so a reader always sees a pair that was
/// committed together.
#[derive(Debug, Default)]
pub struct EffectiveBoost {
    // requested (as u32) << 32 | effective mode
    packed: AtomicU64,
}

impl EffectiveBoost {
    #[inline]
    fn pack(mode: BoostMode, requested: i32) -> u64 {
        (u64::from(requested as u32) << 32) | u64::from(mode as u32)
    }

    #[inline]
    fn unpack(word: u64) -> (BoostMode, i32) {
        let mode = BoostMode::try_from(word as u32).unwrap_or_default();
        (mode, (word >> 32) as u32 as i32)
    }

    /// Effective mode and last applied raw command, read together
    #[inline]
    pub fn load(&self) -> (BoostMode, i32) {
        Self::unpack(self.packed.load(Ordering::Acquire))
    }

    /// Currently effective mode
    #[inline]
    pub fn get(&self) -> BoostMode {
        self.load().0
    }

    /// Whether any elevated mode is effective
    #[inline]
    pub fn is_boosted(&self) -> bool {
        self.get().is_elevated()
    }

    /// Raw value of the last successfully applied command
    #[inline]
    pub fn requested(&self) -> i32 {
        self.load().1
    }

    fn publish(&self, mode: BoostMode, requested: i32) {
        self.packed
            .store(Self::pack(mode, requested), Ordering::Release);
    }
}

/// Consistent view of the engine, taken under the lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSnapshot {
    /// Effective mode
    pub effective: BoostMode,

    /// Last applied raw command
    pub requested: i32,

    /// Outstanding requests per mode, in [`BoostMode::ALL`] order
    pub refcounts: [u32; 4],
}

impl EngineSnapshot {
    /// Outstanding requests for `mode`
    #[inline]
    pub fn refcount(&self, mode: BoostMode) -> u32 {
        self.refcounts[mode.index()]
    }
}

/// State guarded by the engine lock
struct EngineState {
    table: ModeTable,
    effective: BoostMode,
    /// Bumped by every reset; scoped requests from an older generation
    /// were already discarded
    generation: u64,
}

/// Priority-arbitrated boost engine
///
/// Create one with [`EngineBuilder`](crate::EngineBuilder) and share it by
/// reference or `Arc`. Hooks run with the lock held and must not call
/// back into the engine.
pub struct BoostEngine {
    config: EngineConfig,
    state: Mutex<EngineState>,
    mirror: Arc<EffectiveBoost>,
    metrics: BoostMetrics,
}

impl BoostEngine {
    pub(crate) fn new(config: EngineConfig, hooks: [Box<dyn BoostHook>; 4]) -> Self {
        Self {
            config,
            state: Mutex::new(EngineState {
                table: ModeTable::new(hooks),
                effective: BoostMode::NoBoost,
                generation: 0,
            }),
            mirror: Arc::new(EffectiveBoost::default()),
            metrics: BoostMetrics::new(),
        }
    }

    /// Get the engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the engine metrics
    pub fn metrics(&self) -> &BoostMetrics {
        &self.metrics
    }

    /// Shareable handle on the published state
    pub fn mirror(&self) -> Arc<EffectiveBoost> {
        self.mirror.clone()
    }

    /// Currently effective mode, lock-free
    #[inline]
    pub fn query(&self) -> BoostMode {
        self.mirror.get()
    }

    /// Alias of [`query`](Self::query)
    #[inline]
    pub fn effective(&self) -> BoostMode {
        self.query()
    }

    /// Raw value of the last successfully applied command
    #[inline]
    pub fn requested(&self) -> i32 {
        self.mirror.requested()
    }

    /// Take a consistent snapshot of counts and effective mode
    pub fn snapshot(&self) -> EngineSnapshot {
        let state = self.state.lock();
        EngineSnapshot {
            effective: state.effective,
            requested: self.mirror.requested(),
            refcounts: state.table.snapshot(),
        }
    }

    /// Apply a raw wire command
    ///
    /// `0` resets, `+k` requests mode `k`, `-k` releases it. Returns the
    /// effective mode after the command.
    pub fn dispatch(&self, command: i32) -> Result<BoostMode> {
        let decoded = Command::try_from(command).map_err(|()| self.reject(command))?;
        Ok(self.execute(decoded))
    }

    /// Add one request for an elevated mode
    pub fn request(&self, mode: BoostMode) -> Result<BoostMode> {
        self.validate(mode)?;
        Ok(self.execute(Command::Request(mode)))
    }

    /// Drop one request for an elevated mode
    ///
    /// Releasing a mode nobody requested is a no-op.
    pub fn release(&self, mode: BoostMode) -> Result<BoostMode> {
        self.validate(mode)?;
        Ok(self.execute(Command::Release(mode)))
    }

    /// Discard every outstanding request and return to `NoBoost`
    pub fn reset(&self) -> BoostMode {
        self.execute(Command::Reset)
    }

    /// Request `mode` for the lifetime of the returned guard
    ///
    /// A reset while the guard is alive discards its request, and the
    /// guard's drop then leaves later requests for the same mode alone.
    pub fn acquire(&self, mode: BoostMode) -> Result<BoostGuard<'_>> {
        self.validate(mode)?;

        let mut state = self.state.lock();
        self.apply_locked(&mut state, Command::Request(mode));
        let generation = state.generation;
        drop(state);

        Ok(BoostGuard::new(self, mode, generation))
    }

    fn validate(&self, mode: BoostMode) -> Result<()> {
        if mode.is_elevated() {
            Ok(())
        } else {
            Err(self.reject(mode as i32))
        }
    }

    fn reject(&self, command: i32) -> Error {
        self.metrics.record_invalid();
        warn!(command, "rejecting invalid boost command");
        Error::InvalidMode(command)
    }

    /// Run one decoded command as a single critical section
    fn execute(&self, command: Command) -> BoostMode {
        let mut state = self.state.lock();
        self.apply_locked(&mut state, command)
    }

    /// Release a scoped request unless a reset already discarded it
    pub(crate) fn release_scoped(&self, mode: BoostMode, generation: u64) {
        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(mode = %mode, "scoped request already dropped by reset");
            return;
        }
        self.apply_locked(&mut state, Command::Release(mode));
    }

    fn apply_locked(&self, state: &mut EngineState, command: Command) -> BoostMode {
        match command {
            Command::Reset => self.reset_locked(state),
            Command::Request(mode) => self.request_locked(state, mode),
            Command::Release(mode) => self.release_locked(state, mode),
        }

        debug_assert_eq!(
            state.effective,
            state.table.highest_active_or_baseline(),
            "effective mode diverged from the priority scan"
        );

        self.mirror.publish(state.effective, command.raw());
        debug!(
            command = command.raw(),
            effective = %state.effective,
            "boost command applied"
        );
        state.effective
    }

    fn request_locked(&self, state: &mut EngineState, mode: BoostMode) {
        // Already covered by an earlier request
        if !state.table.increment(mode) {
            return;
        }

        let next = state.table.highest_active_or_baseline();
        if next == state.effective {
            return;
        }

        self.transition(state, next);
    }

    fn release_locked(&self, state: &mut EngineState, mode: BoostMode) {
        if !state.table.decrement(mode) {
            return;
        }

        // A mode that was outranked the whole time was never entered
        if mode != state.effective {
            return;
        }

        let next = state.table.highest_active_or_baseline();
        self.transition(state, next);
    }

    fn reset_locked(&self, state: &mut EngineState) {
        let prev = state.effective;
        let metrics = &self.metrics;

        state.table.clear_all(|mode| metrics.record_exit(mode));
        state.generation = state.generation.wrapping_add(1);
        metrics.record_reset();

        if prev != BoostMode::NoBoost {
            state.table.enter(BoostMode::NoBoost);
            metrics.record_enter(BoostMode::NoBoost);
            metrics.record_transition(prev, BoostMode::NoBoost);
        }
        state.effective = BoostMode::NoBoost;

        info!(from = %prev, "boost reset");
    }

    /// Leave the effective mode and enter `next`
    fn transition(&self, state: &mut EngineState, next: BoostMode) {
        let prev = state.effective;

        state.table.exit(prev);
        self.metrics.record_exit(prev);

        state.table.enter(next);
        self.metrics.record_enter(next);

        state.effective = next;
        self.metrics.record_transition(prev, next);
        debug!(from = %prev, to = %next, "boost transition");
    }
}
