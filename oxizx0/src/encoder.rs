//! ZX0 encoder: optimal parse plus bit-level serialization.

use std::sync::Arc;

use crate::bitstream::BitWriter;
use crate::config::{Zx0Config, END_MARKER_MSB, INITIAL_OFFSET};
use crate::error::{Result, Zx0Error};
use crate::optimize::{optimize, Block};

/// A finished compressed stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedStream {
    /// The ZX0 byte stream.
    pub data: Vec<u8>,
    /// Minimum distance the output must trail the input for the stream to
    /// be depacked in place over its own source buffer.
    pub delta: usize,
}

/// ZX0 encoder.
///
/// Produces the shortest stream reachable within the format rules for the
/// configured variant. The same configuration must be used to decode.
#[derive(Debug, Clone, Copy)]
pub struct Zx0Encoder {
    config: Zx0Config,
}

impl Zx0Encoder {
    /// Create an encoder with the given configuration.
    pub fn new(config: Zx0Config) -> Self {
        Self { config }
    }

    /// The encoder's configuration.
    pub fn config(&self) -> &Zx0Config {
        &self.config
    }

    /// Compress `input` into a ZX0 stream.
    ///
    /// The configured `skip` prefix is not represented in the stream; the
    /// caller keeps those bytes around itself.
    pub fn encode(&self, input: &[u8]) -> Result<EncodedStream> {
        self.encode_with_progress(input, &mut |_, _| {})
    }

    /// Compress `input`, reporting `(parsed, total)` positions as the
    /// optimal parse advances.
    pub fn encode_with_progress(
        &self,
        input: &[u8],
        progress: &mut dyn FnMut(usize, usize),
    ) -> Result<EncodedStream> {
        if input.is_empty() {
            return Err(Zx0Error::EmptyInput);
        }
        if self.config.skip >= input.len() {
            return Err(Zx0Error::SkipTooLarge {
                skip: self.config.skip,
                input_size: input.len(),
            });
        }

        let terminal = optimize(input, &self.config, progress)?;
        Ok(self.emit(&terminal, input))
    }

    /// Serialize the winning parse chain.
    fn emit(&self, terminal: &Arc<Block>, input: &[u8]) -> EncodedStream {
        let skip = self.config.skip;
        let backwards = self.config.backwards_mode;

        // Token stream plus the 18-bit end marker, rounded up to bytes. The
        // stream occupies exactly this much: the opening backtrack swallows
        // the first literal's indicator bit.
        let output_size = (terminal.bits + 24) / 8;
        let mut writer = BitWriter::with_capacity(output_size, backwards, self.config.invert_mode());

        // Collect the chain root-first; the sentinel itself is not emitted.
        let mut tokens: Vec<(usize, usize)> = Vec::new();
        let mut node = Some(Arc::clone(terminal));
        while let Some(block) = node {
            if block.prev.is_some() {
                tokens.push((block.end, block.offset));
            }
            node = block.prev.clone();
        }
        tokens.reverse();

        let initial_diff = output_size as isize - input.len() as isize + skip as isize;
        let margin = |consumed: usize, written: usize| {
            initial_diff + (consumed - skip) as isize - written as isize
        };
        let mut delta = 0isize;
        let mut input_index = skip;
        let mut last_offset = INITIAL_OFFSET;

        for &(end, offset) in &tokens {
            let length = end - input_index;
            if offset == 0 {
                // literal run
                writer.write_bit(false);
                writer.write_interlaced_elias_gamma(length, false);
                for _ in 0..length {
                    writer.write_byte(input[input_index]);
                    input_index += 1;
                    delta = delta.max(margin(input_index, writer.position()));
                }
            } else if offset == last_offset {
                // match at the carried offset
                writer.write_bit(false);
                writer.write_interlaced_elias_gamma(length, false);
                input_index += length;
                delta = delta.max(margin(input_index, writer.position()));
            } else {
                // match at a new offset
                writer.write_bit(true);
                writer.write_interlaced_elias_gamma((offset - 1) / 128 + 1, true);
                let lsb = ((offset - 1) % 128) as u8;
                writer.write_byte(if backwards { lsb << 1 } else { (127 - lsb) << 1 });
                // The zero LSB just written hosts the first bit of the
                // length code.
                writer.set_backtrack();
                writer.write_interlaced_elias_gamma(length - 1, false);
                input_index += length;
                delta = delta.max(margin(input_index, writer.position()));
                last_offset = offset;
            }
        }

        writer.write_bit(true);
        writer.write_interlaced_elias_gamma(END_MARKER_MSB, true);
        debug_assert_eq!(writer.position(), output_size);

        EncodedStream {
            data: writer.into_vec(),
            delta: delta as usize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_byte_classic_stream() {
        let encoder = Zx0Encoder::new(Zx0Config::CLASSIC);
        let stream = encoder.encode(b"A").unwrap();
        // literal gamma(1), 'A', end marker
        assert_eq!(stream.data, vec![0xC0, 0x41, 0x00, 0x20]);
        assert_eq!(stream.delta, 2);
    }

    #[test]
    fn test_single_byte_v2_stream() {
        let encoder = Zx0Encoder::new(Zx0Config::V2);
        let stream = encoder.encode(b"A").unwrap();
        // same stream with the end-marker data bits invert-encoded
        assert_eq!(stream.data, vec![0xD5, 0x41, 0x55, 0x60]);
    }

    #[test]
    fn test_alternating_pair_classic_stream() {
        let encoder = Zx0Encoder::new(Zx0Config::CLASSIC);
        let stream = encoder.encode(b"ABABABAB").unwrap();
        assert_eq!(
            stream.data,
            vec![0x39, 0x41, 0x42, 0xFC, 0xC0, 0x00, 0x20]
        );
        assert_eq!(stream.delta, 2);
    }

    #[test]
    fn test_output_size_matches_parse_cost() {
        let input = b"the quick brown fox jumps over the lazy dog";
        let terminal = optimize(input, &Zx0Config::V2, &mut |_, _| {}).unwrap();
        let stream = Zx0Encoder::new(Zx0Config::V2).encode(input).unwrap();
        assert_eq!(stream.data.len(), (terminal.bits + 24) / 8);
    }

    #[test]
    fn test_empty_input_rejected() {
        let encoder = Zx0Encoder::new(Zx0Config::V2);
        assert!(matches!(encoder.encode(b""), Err(Zx0Error::EmptyInput)));
    }

    #[test]
    fn test_skip_must_leave_data() {
        let encoder = Zx0Encoder::new(Zx0Config {
            skip: 3,
            ..Zx0Config::V2
        });
        assert!(matches!(
            encoder.encode(b"abc"),
            Err(Zx0Error::SkipTooLarge {
                skip: 3,
                input_size: 3
            })
        ));
    }

    #[test]
    fn test_progress_reaches_total() {
        let input = vec![7u8; 64];
        let mut last = (0, 0);
        Zx0Encoder::new(Zx0Config::V2)
            .encode_with_progress(&input, &mut |done, total| last = (done, total))
            .unwrap();
        assert_eq!(last, (64, 64));
    }
}
