//! # OxiZX0
//!
//! Pure Rust optimal compressor and decompressor for the ZX0 format.
//!
//! ZX0 is a compact LZ-family byte-stream format with interlaced
//! Elias-gamma length/offset codes, designed for very small decompressors
//! on 8-bit targets. This crate produces bit-exact v2 streams (and the
//! older classic v1 variant) using an optimal parser: a shortest-path
//! search over every literal/match choice, so the output is the smallest
//! reachable within the format rules.
//!
//! ## Example
//!
//! ```rust
//! use oxizx0::{compress, decompress};
//!
//! let original = b"TOBEORNOTTOBEORTOBEORNOT";
//! let packed = compress(original).unwrap();
//! let unpacked = decompress(&packed).unwrap();
//! assert_eq!(unpacked, original);
//! ```
//!
//! ## Variants and parameters
//!
//! [`Zx0Config`] selects the stream variant (forward/backwards polarity,
//! classic v1 encoding, the quick offset range) and the compression
//! parameters (`skip` pass-through prefix, parser thread count):
//!
//! ```rust
//! use oxizx0::{Zx0Config, Zx0Encoder, Zx0Decoder};
//!
//! let config = Zx0Config { threads: 4, ..Zx0Config::V2 };
//! let stream = Zx0Encoder::new(config).encode(b"some data").unwrap();
//! let back = Zx0Decoder::new(config).decode(&stream.data).unwrap();
//! assert_eq!(back, b"some data");
//! ```
//!
//! `EncodedStream::delta` reports how far the compressed stream must be
//! placed behind the end of its own uncompressed image for safe in-place
//! depacking, the figure ZX0 depackers on constrained targets rely on.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod bitstream;
mod config;
mod decoder;
mod encoder;
mod error;
mod optimize;

pub use config::{
    Zx0Config, END_MARKER_MSB, INITIAL_OFFSET, MAX_OFFSET, QUICK_MAX_OFFSET,
};
pub use decoder::Zx0Decoder;
pub use encoder::{EncodedStream, Zx0Encoder};
pub use error::{Result, Zx0Error};

/// Compress `input` with the default (v2, forward) configuration.
///
/// This is shorthand for `Zx0Encoder::new(Zx0Config::default())` and
/// returns only the stream bytes; use [`Zx0Encoder::encode`] when the
/// in-place [`delta`](EncodedStream::delta) is needed.
pub fn compress(input: &[u8]) -> Result<Vec<u8>> {
    Ok(Zx0Encoder::new(Zx0Config::default()).encode(input)?.data)
}

/// Decompress a default-configuration (v2, forward) ZX0 stream.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>> {
    Zx0Decoder::new(Zx0Config::default()).decode(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_default() {
        let original = b"TOBEORNOTTOBEORTOBEORNOT";
        let packed = compress(original).unwrap();
        assert_eq!(decompress(&packed).unwrap(), original);
    }

    #[test]
    fn test_single_byte() {
        let packed = compress(b"A").unwrap();
        assert_eq!(decompress(&packed).unwrap(), b"A");
    }

    #[test]
    fn test_repeating_pattern_compresses() {
        let original = vec![b'X'; 1000];
        let packed = compress(&original).unwrap();
        assert!(packed.len() < 16);
        assert_eq!(decompress(&packed).unwrap(), original);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(compress(b"").is_err());
    }
}
