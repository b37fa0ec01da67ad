//! Mode table
//!
//! One entry per [`BoostMode`] holding its outstanding request count and
//! its hook. The table has no synchronization of its own; every method
//! assumes the caller holds the engine lock.

use crate::hooks::BoostHook;
use schedboost_common::BoostMode;

/// Per-mode state
struct ModeEntry {
    refcount: u32,
    hook: Box<dyn BoostHook>,
}

impl ModeEntry {
    fn new(hook: Box<dyn BoostHook>) -> Self {
        Self { refcount: 0, hook }
    }
}

/// Fixed table indexed by [`BoostMode`]
pub struct ModeTable {
    entries: [ModeEntry; 4],
}

impl ModeTable {
    /// Build a table from the four hooks, in [`BoostMode::ALL`] order
    pub fn new(hooks: [Box<dyn BoostHook>; 4]) -> Self {
        Self {
            entries: hooks.map(ModeEntry::new),
        }
    }

    #[inline]
    fn entry(&self, mode: BoostMode) -> &ModeEntry {
        &self.entries[mode.index()]
    }

    #[inline]
    fn entry_mut(&mut self, mode: BoostMode) -> &mut ModeEntry {
        &mut self.entries[mode.index()]
    }

    /// Request counts in [`BoostMode::ALL`] order
    pub fn snapshot(&self) -> [u32; 4] {
        [
            self.entries[0].refcount,
            self.entries[1].refcount,
            self.entries[2].refcount,
            self.entries[3].refcount,
        ]
    }

    /// Add one request. Returns `true` on the 0 -> 1 transition.
    pub fn increment(&mut self, mode: BoostMode) -> bool {
        let entry = self.entry_mut(mode);
        entry.refcount = entry.refcount.saturating_add(1);
        entry.refcount == 1
    }

    /// Drop one request. Returns `true` on the 1 -> 0 transition.
    ///
    /// Dropping from zero is a no-op and returns `false`.
    pub fn decrement(&mut self, mode: BoostMode) -> bool {
        let entry = self.entry_mut(mode);
        if entry.refcount == 0 {
            return false;
        }
        entry.refcount -= 1;
        entry.refcount == 0
    }

    /// Highest-priority elevated mode with a request, else `NoBoost`
    pub fn highest_active_or_baseline(&self) -> BoostMode {
        BoostMode::ELEVATED
            .into_iter()
            .find(|&mode| self.entry(mode).refcount >= 1)
            .unwrap_or(BoostMode::NoBoost)
    }

    /// Exit every requested elevated mode and zero its count.
    ///
    /// `on_exit` is told about each mode after its exit hook ran.
    pub fn clear_all(&mut self, mut on_exit: impl FnMut(BoostMode)) {
        for mode in BoostMode::ELEVATED {
            let entry = self.entry_mut(mode);
            if entry.refcount > 0 {
                entry.hook.exit();
                entry.refcount = 0;
                on_exit(mode);
            }
        }
    }

    /// Run the enter hook of `mode`
    #[inline]
    pub fn enter(&self, mode: BoostMode) {
        self.entry(mode).hook.enter();
    }

    /// Run the exit hook of `mode`
    #[inline]
    pub fn exit(&self, mode: BoostMode) {
        self.entry(mode).hook.exit();
    }
}
