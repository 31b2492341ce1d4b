// Block codewords and flag-byte grouping.
//
// A compressed body is a sequence of groups: one flag byte followed by up
// to eight blocks. Flag bits are consumed MSB first; a set bit marks a
// back-reference, a clear bit a literal byte.
//
// Reference codewords (D = displacement - 1, 12 bits):
//
//   LZ10           LLLL DDDD | DDDD DDDD                    len = L + 3
//   LZ11 normal    LLLL DDDD | DDDD DDDD                    len = L + 1   (L >= 2)
//   LZ11 extended  0000 LLLL | LLLL DDDD | DDDD DDDD        len = L + 0x11
//   LZ11 extra     0001 LLLL | LLLL LLLL | LLLL DDDD | DDDD DDDD
//                                                           len = L + 0x111

use super::header::{MAX_DISPLACEMENT, MIN_MATCH, Mode};

/// Longest LZ11 reference that fits the 2-byte form.
pub const LZ11_NORMAL_MAX: usize = 0x10;
/// Longest LZ11 reference that fits the 3-byte form.
pub const LZ11_EXTENDED_MAX: usize = 0x110;

const LZ11_EXTENDED_BIAS: usize = 0x11;
const LZ11_EXTRA_BIAS: usize = 0x111;

// ---------------------------------------------------------------------------
// Match / Block
// ---------------------------------------------------------------------------

/// A back-reference: copy `length` bytes starting `displacement` bytes
/// behind the current write position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub displacement: usize,
    pub length: usize,
}

/// One decision of the encoder (or one flag bit worth of decoder work).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    Literal(u8),
    Reference(Match),
}

impl Block {
    /// Number of uncompressed bytes this block expands to.
    pub fn expanded_len(&self) -> usize {
        match self {
            Self::Literal(_) => 1,
            Self::Reference(m) => m.length,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }
}

// ---------------------------------------------------------------------------
// Reference codewords
// ---------------------------------------------------------------------------

/// Encoded size in bytes of a reference of `length` in `mode`.
pub fn reference_size(mode: Mode, length: usize) -> usize {
    match mode {
        Mode::Lz10 => 2,
        Mode::Lz11 if length <= LZ11_NORMAL_MAX => 2,
        Mode::Lz11 if length <= LZ11_EXTENDED_MAX => 3,
        Mode::Lz11 => 4,
    }
}

/// Append the codeword for `m` to `out`.
///
/// The caller guarantees `MIN_MATCH <= m.length <= mode.max_match_len()`
/// and `1 <= m.displacement <= MAX_DISPLACEMENT`.
pub fn encode_reference(mode: Mode, m: Match, out: &mut Vec<u8>) {
    debug_assert!(m.length >= MIN_MATCH && m.length <= mode.max_match_len());
    debug_assert!(m.displacement >= 1 && m.displacement <= MAX_DISPLACEMENT);

    let disp = m.displacement - 1;
    let disp_hi = (disp >> 8) as u8;
    let disp_lo = disp as u8;

    match mode {
        Mode::Lz10 => {
            let len = (m.length - MIN_MATCH) as u8;
            out.extend_from_slice(&[(len << 4) | disp_hi, disp_lo]);
        }
        Mode::Lz11 if m.length <= LZ11_NORMAL_MAX => {
            let len = (m.length - 1) as u8;
            out.extend_from_slice(&[(len << 4) | disp_hi, disp_lo]);
        }
        Mode::Lz11 if m.length <= LZ11_EXTENDED_MAX => {
            let len = m.length - LZ11_EXTENDED_BIAS;
            out.extend_from_slice(&[
                (len >> 4) as u8,
                ((len << 4) as u8) | disp_hi,
                disp_lo,
            ]);
        }
        Mode::Lz11 => {
            let len = m.length - LZ11_EXTRA_BIAS;
            out.extend_from_slice(&[
                0x10 | (len >> 12) as u8,
                (len >> 4) as u8,
                ((len << 4) as u8) | disp_hi,
                disp_lo,
            ]);
        }
    }
}

/// Decode the reference codeword at the start of `input`.
///
/// Returns the match and the number of bytes consumed, or `None` if
/// `input` ends inside the codeword. Displacement and length are not
/// validated against the output produced so far.
pub fn decode_reference(mode: Mode, input: &[u8]) -> Option<(Match, usize)> {
    let b0 = *input.first()? as usize;

    let (length, disp_at) = match mode {
        Mode::Lz10 => ((b0 >> 4) + MIN_MATCH, 0),
        Mode::Lz11 => match b0 >> 4 {
            0 => {
                let b1 = *input.get(1)? as usize;
                (((b0 << 4) | (b1 >> 4)) + LZ11_EXTENDED_BIAS, 1)
            }
            1 => {
                let b1 = *input.get(1)? as usize;
                let b2 = *input.get(2)? as usize;
                (
                    (((b0 & 0x0F) << 12) | (b1 << 4) | (b2 >> 4)) + LZ11_EXTRA_BIAS,
                    2,
                )
            }
            n => (n + 1, 0),
        },
    };

    let hi = *input.get(disp_at)? as usize;
    let lo = *input.get(disp_at + 1)? as usize;
    let displacement = (((hi & 0x0F) << 8) | lo) + 1;

    Some((
        Match {
            displacement,
            length,
        },
        disp_at + 2,
    ))
}

// ---------------------------------------------------------------------------
// BlockWriter
// ---------------------------------------------------------------------------

/// Appends blocks to an output buffer, managing the flag byte of each group.
///
/// The flag slot for a group is reserved before any of its blocks are
/// known; each committed reference sets its bit retroactively.
pub struct BlockWriter<'a> {
    out: &'a mut Vec<u8>,
    mode: Mode,
    /// Offset of the current group's flag byte in `out`.
    flag_pos: usize,
    /// Bits still free in the current flag byte.
    shift: u8,
    blocks: u64,
    references: u64,
}

impl<'a> BlockWriter<'a> {
    /// Start writing blocks at the end of `out`; reserves the first flag byte.
    pub fn new(out: &'a mut Vec<u8>, mode: Mode) -> Self {
        let flag_pos = out.len();
        out.push(0);
        Self {
            out,
            mode,
            flag_pos,
            shift: 8,
            blocks: 0,
            references: 0,
        }
    }

    /// Claim the next flag bit, opening a new group if the current one is full.
    fn next_bit(&mut self) -> u8 {
        if self.shift == 0 {
            self.flag_pos = self.out.len();
            self.out.push(0);
            self.shift = 8;
        }
        self.shift -= 1;
        self.blocks += 1;
        1 << self.shift
    }

    pub fn literal(&mut self, byte: u8) {
        self.next_bit();
        self.out.push(byte);
    }

    pub fn reference(&mut self, m: Match) {
        let bit = self.next_bit();
        self.out[self.flag_pos] |= bit;
        self.references += 1;
        encode_reference(self.mode, m, self.out);
    }

    pub fn push(&mut self, block: Block) {
        match block {
            Block::Literal(byte) => self.literal(byte),
            Block::Reference(m) => self.reference(m),
        }
    }

    /// Blocks written so far.
    pub fn blocks(&self) -> u64 {
        self.blocks
    }

    /// References written so far.
    pub fn references(&self) -> u64 {
        self.references
    }

    /// Zero-pad the output to a 4-byte boundary.
    pub fn finish(self) {
        let padded = (self.out.len() + 3) & !3;
        self.out.resize(padded, 0);
    }
}

// ---------------------------------------------------------------------------
// FlagReader
// ---------------------------------------------------------------------------

/// Consumes flag bits MSB first, asking for a fresh flag byte every eight.
#[derive(Debug, Default)]
pub struct FlagReader {
    flags: u8,
    mask: u8,
}

impl FlagReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once all eight bits of the current flag byte are used.
    pub fn needs_byte(&self) -> bool {
        self.mask == 0
    }

    pub fn load(&mut self, flags: u8) {
        self.flags = flags;
        self.mask = 0x80;
    }

    /// Next flag bit: `true` for a reference.
    pub fn next(&mut self) -> bool {
        debug_assert!(self.mask != 0);
        let bit = self.flags & self.mask != 0;
        self.mask >>= 1;
        bit
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
