//! Optimal parsing for ZX0 compression.
//!
//! The parser runs a left-to-right shortest-path dynamic program over the
//! input: at every position it weighs, for every legal back-offset, closing
//! the pending token as a literal run or as a match, and keeps the cheapest
//! parse (in output bits) ending there. The offset range is split into
//! contiguous shards that are evaluated in parallel and reduced in offset
//! order, so any thread count produces the same parse.

use std::sync::Arc;

use crate::config::{Zx0Config, INITIAL_OFFSET};
use crate::error::Result;

/// One node of a parse chain.
///
/// A block records the token that ends at `end` and links back to the parse
/// it extends. The winning chain is read root-first by the encoder.
pub struct Block {
    /// Total cost in output bits of the parse ending here.
    pub bits: usize,
    /// Input position one past the last byte this token covers.
    pub end: usize,
    /// Match back-offset; 0 marks a literal run.
    pub offset: usize,
    /// The parse this token extends; `None` only for the sentinel.
    pub prev: Option<Arc<Block>>,
}

impl Drop for Block {
    fn drop(&mut self) {
        // Unwind the chain iteratively: a recursive drop would overflow the
        // stack on chains covering large inputs.
        let mut prev = self.prev.take();
        while let Some(node) = prev {
            prev = match Arc::try_unwrap(node) {
                Ok(mut block) => block.prev.take(),
                Err(_) => None,
            };
        }
    }
}

/// Cost in bits of the interlaced Elias-gamma code for `value`.
pub fn elias_gamma_bits(value: usize) -> usize {
    let mut value = value;
    let mut bits = 1;
    while value > 1 {
        value >>= 1;
        bits += 2;
    }
    bits
}

/// Largest legal back-offset at `index` under the configured limit.
pub fn offset_ceiling(index: usize, offset_limit: usize) -> usize {
    index.clamp(1, offset_limit)
}

/// Per-offset parser state owned by one worker.
///
/// A shard covers the contiguous offsets `first_offset..first_offset + len`
/// and is the only writer of their table slices; the published `optimal`
/// prefix is its only shared read.
struct OffsetShard {
    /// First offset covered by this shard.
    first_offset: usize,
    /// Best parse ending in a literal run that can still carry each offset.
    last_literal: Vec<Option<Arc<Block>>>,
    /// Best parse ending in a match at each offset.
    last_match: Vec<Option<Arc<Block>>>,
    /// Length of the byte run currently matchable at each offset.
    match_length: Vec<usize>,
    /// Best split length per run length; rolled out lazily each position.
    best_length: Vec<usize>,
}

impl OffsetShard {
    fn new(first_offset: usize, len: usize, input_size: usize) -> Self {
        let mut best_length = vec![0; input_size.max(3)];
        best_length[2] = 2;
        Self {
            first_offset,
            last_literal: vec![None; len],
            last_match: vec![None; len],
            match_length: vec![0; len],
            best_length,
        }
    }

    /// Evaluate every offset of this shard at `index` and return the
    /// cheapest parse ending there, if any.
    fn scan(
        &mut self,
        input: &[u8],
        skip: usize,
        index: usize,
        ceiling: usize,
        optimal: &[Option<Arc<Block>>],
    ) -> Option<Arc<Block>> {
        let mut best: Option<Arc<Block>> = None;
        // High-water mark of the best_length roll-out, reset every position.
        let mut rolled_out = 2usize;
        let last = ceiling.min(self.first_offset + self.match_length.len() - 1);

        for offset in self.first_offset..=last {
            let slot = offset - self.first_offset;
            if index != skip && index >= offset && input[index] == input[index - offset] {
                // Close the pending literal run with a match that keeps the
                // carried offset. The run since that literal is all-matching
                // at this offset: the literal node is refreshed on every
                // mismatch.
                if let Some(literal) = &self.last_literal[slot] {
                    let length = index + 1 - literal.end;
                    let bits = literal.bits + 1 + elias_gamma_bits(length);
                    let block = Arc::new(Block {
                        bits,
                        end: index + 1,
                        offset,
                        prev: Some(Arc::clone(literal)),
                    });
                    self.last_match[slot] = Some(Arc::clone(&block));
                    if best.as_ref().map_or(true, |b| b.bits > bits) {
                        best = Some(block);
                    }
                }

                // Extend the run and weigh a match at a freshly coded offset.
                self.match_length[slot] += 1;
                let run = self.match_length[slot];
                if run > 1 {
                    if rolled_out < run {
                        let seed = self.best_length[rolled_out];
                        let mut bits =
                            parse_bits(optimal, index - seed) + elias_gamma_bits(seed - 1);
                        loop {
                            rolled_out += 1;
                            let candidate = parse_bits(optimal, index - rolled_out)
                                + elias_gamma_bits(rolled_out - 1);
                            // <= keeps the longer split on ties; the decoder
                            // can always represent it.
                            if candidate <= bits {
                                self.best_length[rolled_out] = rolled_out;
                                bits = candidate;
                            } else {
                                self.best_length[rolled_out] = self.best_length[rolled_out - 1];
                            }
                            if rolled_out >= run {
                                break;
                            }
                        }
                    }

                    let length = self.best_length[run];
                    let parent = parse_block(optimal, index - length);
                    let bits = parent.bits
                        + 8
                        + elias_gamma_bits((offset - 1) / 128 + 1)
                        + elias_gamma_bits(length - 1);
                    let replace = match &self.last_match[slot] {
                        Some(held) => held.end != index + 1 || held.bits > bits,
                        None => true,
                    };
                    if replace {
                        let block = Arc::new(Block {
                            bits,
                            end: index + 1,
                            offset,
                            prev: Some(parent),
                        });
                        self.last_match[slot] = Some(Arc::clone(&block));
                        if best.as_ref().map_or(true, |b| b.bits > bits) {
                            best = Some(block);
                        }
                    }
                }
            } else {
                // The run breaks here; close the pending match with a
                // literal run reaching the current byte.
                self.match_length[slot] = 0;
                if let Some(matched) = &self.last_match[slot] {
                    let length = index + 1 - matched.end;
                    let bits = matched.bits + 1 + elias_gamma_bits(length) + 8 * length;
                    let block = Arc::new(Block {
                        bits,
                        end: index + 1,
                        offset: 0,
                        prev: Some(Arc::clone(matched)),
                    });
                    self.last_literal[slot] = Some(Arc::clone(&block));
                    if best.as_ref().map_or(true, |b| b.bits > bits) {
                        best = Some(block);
                    }
                }
            }
        }

        best
    }
}

fn parse_bits(optimal: &[Option<Arc<Block>>], position: usize) -> usize {
    parse_block(optimal, position).bits
}

fn parse_block(optimal: &[Option<Arc<Block>>], position: usize) -> Arc<Block> {
    Arc::clone(
        optimal[position]
            .as_ref()
            .expect("every position past the pass-through prefix has a parse"),
    )
}

/// Find the cheapest token sequence covering `input[skip..]`.
///
/// Returns the terminal block of the winning chain. `progress` is invoked
/// once per parsed position with `(done, total)`.
///
/// Preconditions (`!input.is_empty()`, `skip < input.len()`) are enforced by
/// the encoder before calling.
pub fn optimize(
    input: &[u8],
    config: &Zx0Config,
    progress: &mut dyn FnMut(usize, usize),
) -> Result<Arc<Block>> {
    let skip = config.skip;
    let input_size = input.len();
    let offset_limit = config.offset_limit();
    let max_offset = offset_ceiling(input_size - 1, offset_limit);
    let threads = config.threads.max(1);

    // Never create an empty shard: more threads than offsets just leaves
    // workers idle.
    let shard_size = max_offset.div_ceil(threads);
    let shard_count = max_offset.div_ceil(shard_size);
    let mut shards: Vec<OffsetShard> = (0..shard_count)
        .map(|i| {
            let first = 1 + i * shard_size;
            let len = shard_size.min(max_offset + 1 - first);
            OffsetShard::new(first, len, input_size)
        })
        .collect();

    // Fake initial block: the decompressor starts with a carried offset of
    // 1, so the opening literal needs a match at that offset to close.
    shards[0].last_match[0] = Some(Arc::new(Block {
        bits: 0,
        end: skip,
        offset: INITIAL_OFFSET,
        prev: None,
    }));

    let pool = if threads > 1 {
        Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()?,
        )
    } else {
        None
    };

    let mut optimal: Vec<Option<Arc<Block>>> = vec![None; input_size];

    for index in skip..input_size {
        let ceiling = offset_ceiling(index, offset_limit);
        let candidates: Vec<Option<Arc<Block>>> = match &pool {
            Some(pool) => pool.install(|| {
                use rayon::prelude::*;
                shards
                    .par_iter_mut()
                    .map(|shard| shard.scan(input, skip, index, ceiling, &optimal))
                    .collect()
            }),
            None => shards
                .iter_mut()
                .map(|shard| shard.scan(input, skip, index, ceiling, &optimal))
                .collect(),
        };

        // Deterministic reduction: shards ascend by offset and only a
        // strictly cheaper parse replaces the incumbent.
        let mut best: Option<Arc<Block>> = None;
        for candidate in candidates.into_iter().flatten() {
            if best.as_ref().map_or(true, |b| b.bits > candidate.bits) {
                best = Some(candidate);
            }
        }
        optimal[index] = best;

        progress(index + 1 - skip, input_size - skip);
    }

    Ok(optimal[input_size - 1]
        .take()
        .expect("the parse always reaches the final position"))
}
