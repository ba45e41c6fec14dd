//! ZX0-specific error types.

use thiserror::Error;

/// ZX0 compression/decompression errors.
#[derive(Debug, Error)]
pub enum Zx0Error {
    /// The input buffer is empty; ZX0 streams always describe at least one byte.
    #[error("Cannot compress empty input")]
    EmptyInput,

    /// The uncompressed prefix covers the whole input.
    #[error("Skip of {skip} bytes leaves nothing to compress (input is {input_size} bytes)")]
    SkipTooLarge {
        /// Requested number of pass-through bytes.
        skip: usize,
        /// Total input size.
        input_size: usize,
    },

    /// A read advanced past the end of the compressed stream.
    #[error("Unexpected end of compressed data at byte {position}")]
    UnexpectedEof {
        /// Byte position where the read failed.
        position: usize,
    },

    /// A match referenced data before the start of the decoded output.
    #[error("Invalid back-reference offset {offset} with only {decoded} bytes decoded")]
    InvalidOffset {
        /// The offending back-offset.
        offset: usize,
        /// Number of bytes decoded so far.
        decoded: usize,
    },

    /// The worker pool for the optimal parser could not be built.
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type for ZX0 operations.
pub type Result<T> = std::result::Result<T, Zx0Error>;
