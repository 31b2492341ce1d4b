// LZSS decoder.
//
// LzssDecoder reconstructs the output one block at a time:
//   - a flag byte is fetched whenever the previous eight bits are used up
//   - a clear bit copies one literal byte
//   - a set bit decodes a mode-specific reference and copies from the
//     output already produced, byte by byte when source and destination
//     overlap
//
// Decoding stops as soon as the header's declared size is reached, so
// alignment padding (or anything else after the stream) is never read.
//
// Malformations the BIOS would survive are downgraded to warnings, each
// kind reported once per decode. Anything that would read outside the
// input or before the start of the output is fatal.

use std::fmt;

use log::{debug, warn};
use thiserror::Error;

use crate::format::block::{Block, FlagReader, Match, decode_reference};
use crate::format::header::{HEADER_LEN, Header, HeaderError, Mode};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid header: {0}")]
    Header(#[from] HeaderError),
    #[error(
        "displacement {displacement} at output offset {produced} reads before the start of the output"
    )]
    DisplacementOutOfRange { displacement: usize, produced: usize },
    #[error("compressed data ends at byte {offset} with {missing} output bytes still expected")]
    UnexpectedEof { offset: usize, missing: usize },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    LengthOverrun,
    VramUnsafe,
}

/// A recoverable malformation found while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    /// A reference claimed more bytes than the header has left; it was
    /// truncated to `remaining`.
    LengthOverrun {
        offset: usize,
        claimed: usize,
        remaining: usize,
    },
    /// A displacement-1 reference in a stream decoded as VRAM-safe.
    VramUnsafe { offset: usize },
}

impl Warning {
    pub fn kind(&self) -> WarningKind {
        match self {
            Self::LengthOverrun { .. } => WarningKind::LengthOverrun,
            Self::VramUnsafe { .. } => WarningKind::VramUnsafe,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthOverrun {
                offset,
                claimed,
                remaining,
            } => write!(
                f,
                "block at output offset {offset} claims {claimed} bytes but only {remaining} remain; truncating"
            ),
            Self::VramUnsafe { offset } => {
                write!(f, "stream is not VRAM-safe (displacement 1 at output offset {offset})")
            }
        }
    }
}

/// Warnings raised by one decode call. Only the first occurrence of each
/// kind is kept (and logged); later ones are counted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeWarnings {
    first: Vec<Warning>,
    repeated: u64,
}

impl DecodeWarnings {
    fn report(&mut self, warning: Warning) {
        if self.contains(warning.kind()) {
            self.repeated += 1;
            return;
        }
        warn!("{warning}");
        self.first.push(warning);
    }

    pub fn contains(&self, kind: WarningKind) -> bool {
        self.first.iter().any(|w| w.kind() == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_empty()
    }

    /// First occurrence of each kind, in the order they were raised.
    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.first.iter()
    }

    /// Occurrences suppressed because their kind was already reported.
    pub fn repeated(&self) -> u64 {
        self.repeated
    }
}

// ---------------------------------------------------------------------------
// Decoded
// ---------------------------------------------------------------------------

/// Result of a decode with its side information.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub header: Header,
    pub data: Vec<u8>,
    pub warnings: DecodeWarnings,
    /// Compressed bytes read, header included, padding excluded.
    pub consumed: usize,
}

// ---------------------------------------------------------------------------
// LzssDecoder
// ---------------------------------------------------------------------------

/// Block-at-a-time decoder over an in-memory compressed stream.
pub struct LzssDecoder<'a> {
    input: &'a [u8],
    pos: usize,
    header: Header,
    vram_safe: bool,
    flags: FlagReader,
    output: Vec<u8>,
    remaining: usize,
    warnings: DecodeWarnings,
}

impl<'a> LzssDecoder<'a> {
    /// Parse the header of `input`; the mode comes from its tag.
    pub fn new(input: &'a [u8], vram_safe: bool) -> Result<Self, DecodeError> {
        let header = Header::decode(input)?;
        Ok(Self::with_header(input, header, vram_safe))
    }

    /// Parse the header of `input`, requiring it to be a `mode` stream.
    pub fn with_mode(input: &'a [u8], mode: Mode, vram_safe: bool) -> Result<Self, DecodeError> {
        let header = Header::decode_expecting(input, mode)?;
        Ok(Self::with_header(input, header, vram_safe))
    }

    fn with_header(input: &'a [u8], header: Header, vram_safe: bool) -> Self {
        let size = header.uncompressed_size as usize;
        Self {
            input,
            pos: HEADER_LEN,
            header,
            vram_safe,
            flags: FlagReader::new(),
            output: Vec::with_capacity(size),
            remaining: size,
            warnings: DecodeWarnings::default(),
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Bytes of output produced so far.
    pub fn produced(&self) -> usize {
        self.output.len()
    }

    pub fn is_finished(&self) -> bool {
        self.remaining == 0
    }

    pub fn warnings(&self) -> &DecodeWarnings {
        &self.warnings
    }

    fn eof(&self) -> DecodeError {
        DecodeError::UnexpectedEof {
            offset: self.pos,
            missing: self.remaining,
        }
    }

    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        let byte = *self.input.get(self.pos).ok_or_else(|| self.eof())?;
        self.pos += 1;
        Ok(byte)
    }

    /// Decode the next block.
    ///
    /// Returns the output offset the block starts at and the block as
    /// applied (a truncated reference reports its truncated length), or
    /// `None` once the declared size has been produced.
    pub fn next_block(&mut self) -> Result<Option<(usize, Block)>, DecodeError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        if self.flags.needs_byte() {
            let flags = self.read_byte()?;
            self.flags.load(flags);
        }

        let offset = self.output.len();

        if !self.flags.next() {
            let byte = self.read_byte()?;
            self.output.push(byte);
            self.remaining -= 1;
            return Ok(Some((offset, Block::Literal(byte))));
        }

        let input = self.input;
        let (mut m, used) = input
            .get(self.pos..)
            .and_then(|rest| decode_reference(self.header.mode, rest))
            .ok_or_else(|| self.eof())?;
        self.pos += used;

        if m.length > self.remaining {
            self.warnings.report(Warning::LengthOverrun {
                offset,
                claimed: m.length,
                remaining: self.remaining,
            });
            m.length = self.remaining;
        }
        if m.displacement > offset {
            return Err(DecodeError::DisplacementOutOfRange {
                displacement: m.displacement,
                produced: offset,
            });
        }
        if self.vram_safe && m.displacement == 1 {
            self.warnings.report(Warning::VramUnsafe { offset });
        }

        copy_back(&mut self.output, m);
        self.remaining -= m.length;
        Ok(Some((offset, Block::Reference(m))))
    }

    /// Decode to the end of the stream.
    pub fn run(mut self) -> Result<Decoded, DecodeError> {
        while self.next_block()?.is_some() {}
        debug!(
            "{}: {} -> {} bytes",
            self.header.mode,
            self.pos,
            self.output.len()
        );
        Ok(Decoded {
            header: self.header,
            data: self.output,
            warnings: self.warnings,
            consumed: self.pos,
        })
    }
}

/// Append `m.length` bytes copied from `m.displacement` bytes back.
///
/// When the length exceeds the displacement the source run overlaps the
/// bytes being written and must be copied in write order.
#[inline]
fn copy_back(output: &mut Vec<u8>, m: Match) {
    let start = output.len() - m.displacement;
    if m.length <= m.displacement {
        output.extend_from_within(start..start + m.length);
    } else {
        output.reserve(m.length);
        for i in start..start + m.length {
            let byte = output[i];
            output.push(byte);
        }
    }
}

// ---------------------------------------------------------------------------
// BlockIter
// ---------------------------------------------------------------------------

/// Iterates the blocks of a compressed stream as `(output_offset, block)`.
///
/// Stops after the first error, which is yielded as the last item.
pub struct BlockIter<'a> {
    decoder: LzssDecoder<'a>,
    failed: bool,
}

impl<'a> BlockIter<'a> {
    pub fn new(input: &'a [u8]) -> Result<Self, DecodeError> {
        Ok(Self {
            decoder: LzssDecoder::new(input, false)?,
            failed: false,
        })
    }

    pub fn header(&self) -> &Header {
        self.decoder.header()
    }
}

impl Iterator for BlockIter<'_> {
    type Item = Result<(usize, Block), DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.decoder.next_block() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience functions
// ---------------------------------------------------------------------------

/// Decode a stream of either mode, taking the mode from the header tag.
pub fn decode(input: &[u8], vram_safe: bool) -> Result<Vec<u8>, DecodeError> {
    Ok(LzssDecoder::new(input, vram_safe)?.run()?.data)
}

/// Decode a stream that must be of `mode`.
pub fn decode_as(input: &[u8], mode: Mode, vram_safe: bool) -> Result<Vec<u8>, DecodeError> {
    Ok(LzssDecoder::with_mode(input, mode, vram_safe)?.run()?.data)
}

/// Decode and return warnings and consumed length along with the data.
///
/// With `expected` set the header tag must match it.
pub fn decode_with_report(
    input: &[u8],
    expected: Option<Mode>,
    vram_safe: bool,
) -> Result<Decoded, DecodeError> {
    let decoder = match expected {
        Some(mode) => LzssDecoder::with_mode(input, mode, vram_safe)?,
        None => LzssDecoder::new(input, vram_safe)?,
    };
    decoder.run()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
