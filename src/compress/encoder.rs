// LZSS encoder.
//
// LzssEncoder walks the input left to right and yields one Block per
// step:
//   - position 0 is always a literal, so every reference has output to
//     point back into
//   - otherwise the best match is taken unless it is shorter than
//     MIN_MATCH or the lazy check prefers a literal
//
// encode() serializes those blocks behind a header with BlockWriter and
// pads the result to a 4-byte boundary.

use log::{debug, trace};
use thiserror::Error;

use crate::format::block::{Block, BlockWriter};
use crate::format::header::{HEADER_LEN, Header, MAX_UNCOMPRESSED_LEN, MIN_MATCH, Mode};
use crate::matching::finder::MatchFinder;
use crate::matching::lazy::prefer_literal;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for the LZSS encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeOptions {
    /// Output format.
    pub mode: Mode,
    /// Never emit a reference with displacement 1. Required when the GBA
    /// BIOS decompresses straight into VRAM.
    pub vram_safe: bool,
}

impl EncodeOptions {
    pub fn new(mode: Mode, vram_safe: bool) -> Self {
        Self { mode, vram_safe }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("input is {len} bytes, the 24-bit size field allows at most {max}")]
    InputTooLarge { len: usize, max: usize },
}

// ---------------------------------------------------------------------------
// LzssEncoder
// ---------------------------------------------------------------------------

/// Parses an input buffer into literal and reference blocks.
pub struct LzssEncoder<'s> {
    source: &'s [u8],
    finder: MatchFinder,
    pos: usize,
}

impl<'s> LzssEncoder<'s> {
    pub fn new(source: &'s [u8], opts: EncodeOptions) -> Self {
        Self {
            source,
            finder: MatchFinder::new(opts.mode, opts.vram_safe),
            pos: 0,
        }
    }

    /// Input bytes covered by the blocks yielded so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn choose(&self, pos: usize) -> Block {
        let literal = Block::Literal(self.source[pos]);
        if pos == 0 {
            return literal;
        }

        let Some(m) = self.finder.best(self.source, pos) else {
            return literal;
        };
        if m.length < MIN_MATCH {
            return literal;
        }

        let remaining = self.source.len() - pos;
        if m.length < remaining {
            let skip = self.finder.best_len(self.source, pos + 1);
            let next = self.finder.best_len(self.source, pos + m.length);
            if prefer_literal(m.length, skip, next) {
                trace!(
                    "pos {pos}: literal instead of len {} (skip {skip}, next {next})",
                    m.length
                );
                return literal;
            }
        }

        Block::Reference(m)
    }
}

impl Iterator for LzssEncoder<'_> {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        if self.pos >= self.source.len() {
            return None;
        }
        let block = self.choose(self.pos);
        self.pos += block.expanded_len();
        Some(block)
    }
}

// ---------------------------------------------------------------------------
// Convenience functions
// ---------------------------------------------------------------------------

/// Compress `source`, appending header, blocks and padding to `out`.
pub fn encode_into(
    source: &[u8],
    opts: EncodeOptions,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    if source.len() > MAX_UNCOMPRESSED_LEN {
        return Err(EncodeError::InputTooLarge {
            len: source.len(),
            max: MAX_UNCOMPRESSED_LEN,
        });
    }

    let start = out.len();
    // Worst case: every block a literal, one flag byte per eight.
    out.reserve(HEADER_LEN + source.len() + source.len() / 8 + 4);
    Header::new(opts.mode, source.len() as u32).encode(out);

    let mut writer = BlockWriter::new(out, opts.mode);
    for block in LzssEncoder::new(source, opts) {
        writer.push(block);
    }
    let (blocks, references) = (writer.blocks(), writer.references());
    writer.finish();

    debug!(
        "{}: {} -> {} bytes ({blocks} blocks, {references} references, vram_safe={})",
        opts.mode,
        source.len(),
        out.len() - start,
        opts.vram_safe
    );
    Ok(())
}

/// Compress `source` into a new buffer.
pub fn encode(source: &[u8], opts: EncodeOptions) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    encode_into(source, opts, &mut out)?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::block::Match;

    fn blocks(source: &[u8], mode: Mode, vram_safe: bool) -> Vec<Block> {
        LzssEncoder::new(source, EncodeOptions::new(mode, vram_safe)).collect()
    }

    #[test]
    fn empty_input_is_header_plus_flag_byte() {
        let out = encode(b"", EncodeOptions::default()).unwrap();
        assert_eq!(out, [0x10, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn single_byte_is_literal() {
        let out = encode(&[0x42], EncodeOptions::new(Mode::Lz11, false)).unwrap();
        assert_eq!(out, [0x11, 1, 0, 0, 0x00, 0x42, 0, 0]);
    }

    #[test]
    fn first_block_is_always_literal() {
        let b = blocks(&[9; 40], Mode::Lz11, false);
        assert_eq!(b[0], Block::Literal(9));
    }

    #[test]
    fn run_uses_displacement_one() {
        // At position 1 an 18-byte match leaves one byte over; the lazy
        // check defers it a byte so the match covers the rest exactly.
        let b = blocks(&[0xAA; 20], Mode::Lz10, false);
        assert_eq!(
            b,
            [
                Block::Literal(0xAA),
                Block::Literal(0xAA),
                Block::Reference(Match {
                    displacement: 1,
                    length: 18
                }),
            ]
        );
    }

    #[test]
    fn run_in_vram_safe_mode_avoids_displacement_one() {
        let b = blocks(&[0xAA; 20], Mode::Lz10, true);
        assert_eq!(b[0], Block::Literal(0xAA));
        assert_eq!(b[1], Block::Literal(0xAA));
        for block in &b {
            if let Block::Reference(m) = block {
                assert_ne!(m.displacement, 1);
            }
        }
        assert!(b.iter().any(Block::is_reference));
        let total: usize = b.iter().map(Block::expanded_len).sum();
        assert_eq!(total, 20);
    }

    #[test]
    fn short_matches_become_literals() {
        // "ab" repeats, but a 2-byte match is never encoded.
        let b = blocks(b"abXab", Mode::Lz10, false);
        assert!(b.iter().all(|b| !b.is_reference()));
    }

    #[test]
    fn lazy_check_prefers_later_longer_match() {
        // At position 11 "bcd" (len 3 at disp 10) is available, but one
        // byte later "cdefgh" (len 6) is; taking the literal wins.
        let src = b"abcdXcdefghbcdefgh";
        let b = blocks(src, Mode::Lz10, false);
        let mut pos = 0;
        for block in &b {
            if pos == 11 {
                assert_eq!(*block, Block::Literal(b'b'));
            }
            pos += block.expanded_len();
        }
        assert!(b.iter().any(|b| matches!(
            b,
            Block::Reference(Match { length: 6, .. })
        )));
    }

    #[test]
    fn output_is_word_aligned() {
        for len in 0..40 {
            let src: Vec<u8> = (0..len).map(|i| (i * 7 % 5) as u8).collect();
            let out = encode(&src, EncodeOptions::default()).unwrap();
            assert_eq!(out.len() % 4, 0, "len {len}");
        }
    }

    #[test]
    fn encode_into_appends() {
        let mut out = vec![0xEE; 3];
        encode_into(b"abc", EncodeOptions::default(), &mut out).unwrap();
        assert_eq!(&out[..3], &[0xEE; 3]);
        assert_eq!(&out[3..7], &[0x10, 3, 0, 0]);
    }

    #[test]
    fn oversized_input_is_rejected() {
        let src = vec![0u8; MAX_UNCOMPRESSED_LEN + 1];
        assert_eq!(
            encode(&src, EncodeOptions::default()),
            Err(EncodeError::InputTooLarge {
                len: MAX_UNCOMPRESSED_LEN + 1,
                max: MAX_UNCOMPRESSED_LEN
            })
        );
    }
}
