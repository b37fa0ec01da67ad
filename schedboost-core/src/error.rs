//! Error types for the boost engine

use thiserror::Error;

/// Alias for `Result<T, Error>`
pub type Result<T> = std::result::Result<T, Error>;

/// Boost engine errors
///
/// Neither variant ever leaves partial state behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Command magnitude outside the closed mode enumeration
    #[error("invalid boost mode: {0}")]
    InvalidMode(i32),

    /// Control-file write that is not an integer
    #[error("cannot parse boost command: {0:?}")]
    Parse(String),
}
