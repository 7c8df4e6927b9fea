//! Error types for byki

use thiserror::Error;

/// Main error type for deck decoding
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not look like a deck this decoder understands.
    #[error("Invalid deck format: {0}")]
    Format(String),

    /// A read at an absolute offset ran past the end of the buffer.
    #[error("Out of bounds read: {len} bytes at offset {offset:#x} exceeds buffer length {buffer_len:#x}")]
    OutOfBounds {
        offset: u64,
        len: u64,
        buffer_len: usize,
    },

    /// A linked record list revisited a node or exceeded the step budget.
    #[error("Corrupt {list} list: {reason} at offset {offset:#x}")]
    CorruptList {
        list: &'static str,
        reason: &'static str,
        offset: u32,
    },
}

/// Result type alias for byki operations
pub type Result<T> = std::result::Result<T, Error>;
