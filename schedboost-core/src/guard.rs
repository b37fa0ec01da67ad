//! Scoped boost requests
//!
//! Whoever enables a boost is responsible for disabling it. A
//! [`BoostGuard`] ties one request to a scope so the release cannot be
//! forgotten, even on early return or panic.
//!
//! # Example
//!
//! ```rust,no_run
//! use schedboost_core::{BoostMode, EngineBuilder, PlacementState};
//! use std::sync::Arc;
//!
//! let engine = EngineBuilder::new().build(Arc::new(PlacementState::with_default_group()));
//!
//! fn launch_app(engine: &schedboost_core::BoostEngine) -> schedboost_core::Result<()> {
//!     let _boost = engine.acquire(BoostMode::Conservative)?;
//!     // ... startup work runs boosted ...
//!     Ok(())
//! } // Guard dropped, request released
//!
//! launch_app(&engine).unwrap();
//! ```

use crate::engine::BoostEngine;
use schedboost_common::BoostMode;

/// RAII guard holding one request for a boost mode
///
/// Guards nest like plain requests: two guards on the same mode hold a
/// count of two, and the mode stays effective until both are dropped.
/// A reset discards the guard's request; dropping it afterwards does
/// nothing.
#[must_use = "dropping the guard releases the boost immediately"]
pub struct BoostGuard<'a> {
    engine: &'a BoostEngine,
    mode: BoostMode,
    generation: u64,
}

impl<'a> BoostGuard<'a> {
    /// The request has already been applied by the caller
    pub(crate) fn new(engine: &'a BoostEngine, mode: BoostMode, generation: u64) -> Self {
        Self {
            engine,
            mode,
            generation,
        }
    }

    /// Mode held by this guard
    #[inline]
    pub fn mode(&self) -> BoostMode {
        self.mode
    }
}

impl Drop for BoostGuard<'_> {
    fn drop(&mut self) {
        self.engine.release_scoped(self.mode, self.generation);
    }
}

impl std::fmt::Debug for BoostGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoostGuard").field("mode", &self.mode).finish()
    }
}
