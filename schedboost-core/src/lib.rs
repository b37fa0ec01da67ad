//! # schedboost-core
//!
//! A priority-arbitrated, reference-counted scheduler boost engine.
//!
//! Independent callers request boost *levels*. The engine keeps a count of
//! outstanding requests per mode and always runs the highest-priority
//! requested mode, calling exactly one exit hook and one enter hook when
//! the winner changes.
//!
//! ## Key Components
//!
//! - **Mode Table**: per-mode request counts and enter/exit hooks
//! - **Engine**: serializes commands and sequences transitions
//! - **Mirror**: lock-free view of the effective mode for placement code
//! - **Guard**: scoped request released on drop
//! - **Control File**: integer read/write tunable in front of the engine
//!
//! ## Usage
//!
//! ```rust,no_run
//! use schedboost_core::{BoostMode, EngineBuilder, PlacementState};
//! use std::sync::Arc;
//!
//! let placement = Arc::new(PlacementState::with_default_group());
//! let engine = EngineBuilder::new().build(placement.clone());
//!
//! engine.request(BoostMode::Conservative).unwrap();
//! engine.request(BoostMode::FullThrottle).unwrap();
//! assert_eq!(engine.query(), BoostMode::FullThrottle);
//!
//! engine.release(BoostMode::FullThrottle).unwrap();
//! assert_eq!(engine.query(), BoostMode::Conservative);
//! ```

pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod guard;
pub mod hooks;
pub mod metrics;
pub mod placement;
pub mod table;

pub use config::{EngineBuilder, EngineConfig};
pub use control::ControlFile;
pub use engine::{BoostEngine, EffectiveBoost, EngineSnapshot};
pub use error::{Error, Result};
pub use guard::BoostGuard;
pub use hooks::BoostHook;
pub use metrics::BoostMetrics;
pub use placement::{EnergyAwareControl, GroupBoostControl, PlacementState};

/// Re-export common types
pub use schedboost_common::{config as constants, BoostMode, Command};
