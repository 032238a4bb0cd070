//! Error types for mapping shared RAM and register windows.

use thiserror::Error;

/// Errors raised while mapping or attaching to shared hardware memory.
#[derive(Error, Debug)]
pub enum ShmError {
    /// A physical window could not be mapped into the process.
    #[error("Failed to map {window} at {base:#x} ({len} bytes): {source}")]
    Map {
        /// Window name
        window: &'static str,
        /// Physical base address
        base: u64,
        /// Requested length in bytes
        len: usize,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The side of the shared region is already attached in this process.
    #[error("Shared region already attached by another {side} handle")]
    AlreadyAttached {
        /// `"host"` or `"rtu"`
        side: &'static str,
    },

    /// Region is too small for the fixed shared RAM layout.
    #[error("Shared region too small: {words} words (need {required})")]
    TooSmall {
        /// Words available
        words: usize,
        /// Words required by the layout
        required: usize,
    },
}

/// Result type for shared memory operations
pub type ShmResult<T> = Result<T, ShmError>;
