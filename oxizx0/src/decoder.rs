//! ZX0 decoder.
//!
//! Decompression is a three-state machine: after every token a single bit
//! selects the next state. Literal runs feed bytes straight from the input;
//! match tokens re-read the output one byte at a time so self-overlapping
//! runs inflate correctly.

use crate::bitstream::BitReader;
use crate::config::{Zx0Config, END_MARKER_MSB, INITIAL_OFFSET};
use crate::error::{Result, Zx0Error};

/// Decoder states; the bit after each token picks the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Copy a run of literal bytes from the input.
    Literals,
    /// Copy a match at the carried offset.
    MatchLastOffset,
    /// Read a new offset, then copy a match at it.
    MatchNewOffset,
}

/// ZX0 decoder.
///
/// Only the format flags of the configuration matter here; `skip` and
/// `threads` are compression-side parameters.
#[derive(Debug, Clone, Copy)]
pub struct Zx0Decoder {
    config: Zx0Config,
}

impl Zx0Decoder {
    /// Create a decoder with the given configuration.
    pub fn new(config: Zx0Config) -> Self {
        Self { config }
    }

    /// Decompress a ZX0 stream.
    ///
    /// Fails with [`Zx0Error::UnexpectedEof`] when the stream is truncated
    /// and [`Zx0Error::InvalidOffset`] when a corrupt stream references
    /// data before the start of the output. There is no checksum.
    pub fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut reader = BitReader::new(
            input,
            self.config.backwards_mode,
            self.config.invert_mode(),
        );
        let mut output = Vec::new();
        let mut last_offset = INITIAL_OFFSET;
        let mut state = State::Literals;

        loop {
            state = match state {
                State::Literals => {
                    let length = reader.read_interlaced_elias_gamma(false)?;
                    for _ in 0..length {
                        let byte = reader.read_byte()?;
                        output.push(byte);
                    }
                    if reader.read_bit()? {
                        State::MatchNewOffset
                    } else {
                        State::MatchLastOffset
                    }
                }
                State::MatchLastOffset => {
                    let length = reader.read_interlaced_elias_gamma(false)?;
                    copy_from_history(&mut output, last_offset, length)?;
                    if reader.read_bit()? {
                        State::MatchNewOffset
                    } else {
                        State::Literals
                    }
                }
                State::MatchNewOffset => {
                    let msb = reader.read_interlaced_elias_gamma(true)?;
                    if msb == END_MARKER_MSB {
                        break;
                    }
                    let lsb = (reader.read_byte()? >> 1) as usize;
                    last_offset = if self.config.backwards_mode {
                        msb * 128 + lsb - 127
                    } else {
                        msb * 128 - lsb
                    };
                    // The LSB of the offset byte is the first bit of the
                    // length code.
                    reader.set_backtrack();
                    let length = reader.read_interlaced_elias_gamma(false)? + 1;
                    copy_from_history(&mut output, last_offset, length)?;
                    if reader.read_bit()? {
                        State::MatchNewOffset
                    } else {
                        State::Literals
                    }
                }
            };
        }

        Ok(output)
    }
}

/// Append `length` bytes copied from `offset` bytes back in `output`.
fn copy_from_history(output: &mut Vec<u8>, offset: usize, length: usize) -> Result<()> {
    if offset > output.len() {
        return Err(Zx0Error::InvalidOffset {
            offset,
            decoded: output.len(),
        });
    }
    for _ in 0..length {
        let byte = output[output.len() - offset];
        output.push(byte);
    }
    Ok(())
}
