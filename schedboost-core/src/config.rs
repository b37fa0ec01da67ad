//! Engine configuration and builder

use crate::engine::BoostEngine;
use crate::hooks::{BoostHook, FullThrottleHook, GroupOverrideHook, NoBoostHook};
use crate::placement::{EnergyAwareControl, GroupBoostControl};
use schedboost_common::{config, BoostMode};
use std::sync::Arc;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Group whose boost override conservative/restrained write
    pub boost_group: String,

    /// Override written while conservative is effective
    pub conservative_override: u32,

    /// Override written while restrained is effective
    pub restrained_override: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            boost_group: config::DEFAULT_BOOST_GROUP.to_string(),
            conservative_override: config::CONSERVATIVE_BOOST_OVERRIDE,
            restrained_override: config::RESTRAINED_BOOST_OVERRIDE,
        }
    }
}

/// Boost engine builder
///
/// Building is the only way to get a [`BoostEngine`]; the result starts
/// at `NoBoost` with every count at zero.
pub struct EngineBuilder {
    config: EngineConfig,
    hooks: [Option<Box<dyn BoostHook>>; 4],
}

impl EngineBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            hooks: [None, None, None, None],
        }
    }

    /// Start from an existing configuration
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::new()
        }
    }

    /// Set the group driven by conservative and restrained
    pub fn boost_group(mut self, group: impl Into<String>) -> Self {
        self.config.boost_group = group.into();
        self
    }

    /// Set the override written by conservative
    pub fn conservative_override(mut self, value: u32) -> Self {
        self.config.conservative_override = value;
        self
    }

    /// Set the override written by restrained
    pub fn restrained_override(mut self, value: u32) -> Self {
        self.config.restrained_override = value;
        self
    }

    /// Replace the hook of one elevated mode
    ///
    /// The baseline hook is fixed and cannot be replaced; passing
    /// `NoBoost` is ignored.
    pub fn hook(mut self, mode: BoostMode, hook: impl BoostHook + 'static) -> Self {
        if mode.is_elevated() {
            self.hooks[mode.index()] = Some(Box::new(hook));
        }
        self
    }

    /// Get the configuration built so far
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build the engine, wiring default hooks to `placement`
    pub fn build<P>(self, placement: Arc<P>) -> BoostEngine
    where
        P: EnergyAwareControl + GroupBoostControl + 'static,
    {
        let energy: Arc<dyn EnergyAwareControl> = placement.clone();
        let groups: Arc<dyn GroupBoostControl> = placement;
        self.build_with(energy, groups)
    }

    /// Build the engine with separate placement collaborators
    pub fn build_with(
        self,
        energy: Arc<dyn EnergyAwareControl>,
        groups: Arc<dyn GroupBoostControl>,
    ) -> BoostEngine {
        let EngineBuilder { config, hooks } = self;
        let [_, full_throttle, conservative, restrained] = hooks;

        let table_hooks: [Box<dyn BoostHook>; 4] = [
            Box::new(NoBoostHook),
            full_throttle
                .unwrap_or_else(|| -> Box<dyn BoostHook> { Box::new(FullThrottleHook::new(energy)) }),
            conservative.unwrap_or_else(|| -> Box<dyn BoostHook> {
                Box::new(GroupOverrideHook::new(
                    groups.clone(),
                    config.boost_group.clone(),
                    config.conservative_override,
                ))
            }),
            restrained.unwrap_or_else(|| -> Box<dyn BoostHook> {
                Box::new(GroupOverrideHook::new(
                    groups,
                    config.boost_group.clone(),
                    config.restrained_override,
                ))
            }),
        ];

        BoostEngine::new(config, table_hooks)
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
