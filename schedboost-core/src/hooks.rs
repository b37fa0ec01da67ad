// SPDX-License-Identifier: GPL-2.0-only
// Copyright (C) 2024 Ankit Kumar Pandey <ankitkpandey1@gmail.com>

//! Enter/exit hooks for each boost mode
//!
//! A hook runs with the engine lock held, so it must be fast and must not
//! call back into the engine. Hooks are not idempotent in general: the
//! engine guarantees `enter` and `exit` alternate for any one mode.

use crate::placement::{EnergyAwareControl, GroupBoostControl};
use schedboost_common::config;
use std::sync::Arc;
use tracing::debug;

/// Side effects of entering and leaving a boost mode
pub trait BoostHook: Send + Sync {
    /// The mode just became effective
    fn enter(&self);

    /// The mode just stopped being effective
    fn exit(&self);
}

/// Baseline hook, does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBoostHook;

impl BoostHook for NoBoostHook {
    fn enter(&self) {}

    fn exit(&self) {}
}

/// Full throttle: turn energy-aware placement off while effective
pub struct FullThrottleHook {
    placement: Arc<dyn EnergyAwareControl>,
}

impl FullThrottleHook {
    pub fn new(placement: Arc<dyn EnergyAwareControl>) -> Self {
        Self { placement }
    }
}

impl BoostHook for FullThrottleHook {
    fn enter(&self) {
        self.placement.set_energy_aware_disabled(true);
    }

    fn exit(&self) {
        self.placement.set_energy_aware_disabled(false);
    }
}

/// Write a boost override on a group while effective
///
/// Used by both the conservative and the restrained mode, which differ
/// only in the value written. A missing group makes both sides a no-op.
pub struct GroupOverrideHook {
    groups: Arc<dyn GroupBoostControl>,
    group: String,
    value: u32,
}

impl GroupOverrideHook {
    pub fn new(groups: Arc<dyn GroupBoostControl>, group: impl Into<String>, value: u32) -> Self {
        Self {
            groups,
            group: group.into(),
            value,
        }
    }

    fn write(&self, value: u32) {
        if !self.groups.set_boost_override(&self.group, value) {
            debug!(group = %self.group, value, "boost override skipped");
        }
    }
}

impl BoostHook for GroupOverrideHook {
    fn enter(&self) {
        self.write(self.value);
    }

    fn exit(&self) {
        self.write(config::BOOST_OVERRIDE_NONE);
    }
}
