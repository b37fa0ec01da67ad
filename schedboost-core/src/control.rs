//! Control-file surface
//!
//! Mimics a read/write tunable: reading yields the last applied raw
//! command, writing parses one integer and forwards it to
//! [`BoostEngine::dispatch`]. The raw value is stored inside the engine's
//! critical section, so concurrent writers are totally ordered.

use crate::engine::BoostEngine;
use crate::error::{Error, Result};
use std::sync::Arc;

/// Read/write control file bound to an engine
#[derive(Clone)]
pub struct ControlFile {
    engine: Arc<BoostEngine>,
}

impl ControlFile {
    pub fn new(engine: Arc<BoostEngine>) -> Self {
        Self { engine }
    }

    /// Engine behind this file
    pub fn engine(&self) -> &Arc<BoostEngine> {
        &self.engine
    }

    /// Last applied raw command, newline terminated
    pub fn read(&self) -> String {
        format!("{}\n", self.engine.requested())
    }

    /// Wire value of the effective mode, newline terminated
    pub fn effective(&self) -> String {
        format!("{}\n", self.engine.effective() as u32)
    }

    /// Parse and apply one command. Returns the number of bytes consumed.
    ///
    /// Surrounding whitespace is ignored. On error nothing changes.
    pub fn write(&self, input: &str) -> Result<usize> {
        let value: i32 = input
            .trim()
            .parse()
            .map_err(|_| Error::Parse(input.to_string()))?;

        self.engine.dispatch(value)?;
        Ok(input.len())
    }
}

impl std::fmt::Debug for ControlFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlFile")
            .field("requested", &self.engine.requested())
            .field("effective", &self.engine.effective())
            .finish()
    }
}
