// SPDX-License-Identifier: GPL-2.0-only
// Copyright (C) 2024 Ankit Kumar Pandey <ankitkpandey1@gmail.com>

//! # schedboost-common
//!
//! Shared vocabulary for the scheduler boost arbiter.
//!
//! This crate defines the closed set of boost modes and the signed integer
//! command encoding used at the control-file boundary. It has no
//! dependencies so placement code can consume it without pulling in the
//! engine.
//!
//! ## Wire Contract
//!
//! A command is one signed integer:
//!
//! ```text
//!   0   reset: drop every outstanding request, back to NoBoost
//!  +k   request mode k   (k in 1..=NUM_ELEVATED_MODES)
//!  -k   release mode k
//! ```
//!
//! Modes are numbered by descending priority, so `1` always wins.

#![no_std]

// ============================================================================
// Boost Mode
// ============================================================================

/// Scheduler boost mode
///
/// Elevated modes are ordered by descending priority: when several are
/// requested at once, the one with the lowest discriminant is effective.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BoostMode {
    /// Baseline, nothing special is happening.
    #[default]
    NoBoost = 0,

    /// Disable energy-aware placement entirely.
    FullThrottle = 1,

    /// Bias the boost group towards big CPUs.
    Conservative = 2,

    /// Mild boost of the boost group.
    Restrained = 3,
}

impl BoostMode {
    /// Every mode, indexed by discriminant
    pub const ALL: [BoostMode; 4] = [
        BoostMode::NoBoost,
        BoostMode::FullThrottle,
        BoostMode::Conservative,
        BoostMode::Restrained,
    ];

    /// Elevated modes in descending priority order
    pub const ELEVATED: [BoostMode; config::NUM_ELEVATED_MODES] = [
        BoostMode::FullThrottle,
        BoostMode::Conservative,
        BoostMode::Restrained,
    ];

    /// Whether this mode is something other than the baseline
    #[inline]
    pub fn is_elevated(self) -> bool {
        !matches!(self, BoostMode::NoBoost)
    }

    /// Position of this mode in [`BoostMode::ALL`]
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable lowercase name, used in logs and metric labels
    pub fn name(self) -> &'static str {
        match self {
            BoostMode::NoBoost => "no_boost",
            BoostMode::FullThrottle => "full_throttle",
            BoostMode::Conservative => "conservative",
            BoostMode::Restrained => "restrained",
        }
    }
}

impl TryFrom<u32> for BoostMode {
    type Error = ();

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BoostMode::NoBoost),
            1 => Ok(BoostMode::FullThrottle),
            2 => Ok(BoostMode::Conservative),
            3 => Ok(BoostMode::Restrained),
            _ => Err(()),
        }
    }
}

impl core::fmt::Display for BoostMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Command
// ============================================================================

/// Decoded form of the signed integer command
///
/// The engine never looks at sign or magnitude; it only sees this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Discard every outstanding request
    Reset,

    /// Add one request for an elevated mode
    Request(BoostMode),

    /// Drop one request for an elevated mode
    Release(BoostMode),
}

impl Command {
    /// Encode back to the wire value
    pub fn raw(self) -> i32 {
        match self {
            Command::Reset => 0,
            Command::Request(mode) => mode as i32,
            Command::Release(mode) => -(mode as i32),
        }
    }
}

impl TryFrom<i32> for Command {
    type Error = ();

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if value == 0 {
            return Ok(Command::Reset);
        }

        // unsigned_abs keeps i32::MIN out of overflow territory
        let mode = BoostMode::try_from(value.unsigned_abs())?;
        if !mode.is_elevated() {
            return Err(());
        }

        if value > 0 {
            Ok(Command::Request(mode))
        } else {
            Ok(Command::Release(mode))
        }
    }
}

// ============================================================================
// Configuration constants
// ============================================================================

/// Configuration constants
pub mod config {
    /// Number of elevated modes, the K of the wire contract
    pub const NUM_ELEVATED_MODES: usize = 3;

    /// Group whose boost override the conservative/restrained modes drive
    pub const DEFAULT_BOOST_GROUP: &str = "top-app";

    /// Override written by the conservative mode
    pub const CONSERVATIVE_BOOST_OVERRIDE: u32 = 1;

    /// Override written by the restrained mode
    pub const RESTRAINED_BOOST_OVERRIDE: u32 = 30;

    /// Override value meaning "no override"
    pub const BOOST_OVERRIDE_NONE: u32 = 0;
}

// ============================================================================
// Tests
// ============================================================================
