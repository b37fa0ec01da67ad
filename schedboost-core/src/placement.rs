// SPDX-License-Identifier: GPL-2.0-only
// Copyright (C) 2024 Ankit Kumar Pandey <ankitkpandey1@gmail.com>

//! Placement subsystems the boost hooks act on
//!
//! The engine does not own these. Hooks call into them through the two
//! traits below; [`PlacementState`] is an in-memory implementation of both
//! used by the CLI, the bench and tests.

use parking_lot::RwLock;
use schedboost_common::config;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tracing::debug;

/// Energy-aware placement toggle
pub trait EnergyAwareControl: Send + Sync {
    /// Disable (`true`) or re-enable (`false`) energy-aware placement
    fn set_energy_aware_disabled(&self, disabled: bool);
}

/// Per-group boost override attribute
pub trait GroupBoostControl: Send + Sync {
    /// Write the boost override of `group`.
    ///
    /// Returns `false` if the group does not exist.
    fn set_boost_override(&self, group: &str, value: u32) -> bool;
}

/// In-memory placement state
#[derive(Debug, Default)]
pub struct PlacementState {
    energy_aware_disabled: AtomicBool,
    groups: RwLock<HashMap<String, AtomicU32>>,
}

impl PlacementState {
    /// Create placement state with no groups registered
    pub fn new() -> Self {
        Self::default()
    }

    /// Create placement state with the default boost group registered
    pub fn with_default_group() -> Self {
        let state = Self::new();
        state.add_group(config::DEFAULT_BOOST_GROUP);
        state
    }

    /// Register a group with no override. Re-registering keeps the value.
    pub fn add_group(&self, name: &str) {
        self.groups
            .write()
            .entry(name.to_string())
            .or_insert_with(|| AtomicU32::new(config::BOOST_OVERRIDE_NONE));
    }

    /// Whether energy-aware placement is currently disabled
    #[inline]
    pub fn energy_aware_disabled(&self) -> bool {
        self.energy_aware_disabled.load(Ordering::Acquire)
    }

    /// Current boost override of `group`, if it exists
    pub fn boost_override(&self, group: &str) -> Option<u32> {
        self.groups
            .read()
            .get(group)
            .map(|v| v.load(Ordering::Acquire))
    }
}

impl EnergyAwareControl for PlacementState {
    fn set_energy_aware_disabled(&self, disabled: bool) {
        self.energy_aware_disabled.store(disabled, Ordering::Release);
    }
}

impl GroupBoostControl for PlacementState {
    fn set_boost_override(&self, group: &str, value: u32) -> bool {
        match self.groups.read().get(group) {
            Some(slot) => {
                slot.store(value, Ordering::Release);
                true
            }
            None => {
                debug!(group, "boost group not found");
                false
            }
        }
    }
}
