// GBA BIOS compression header (LZ10 / LZ11).
//
// Four bytes: a type tag followed by the uncompressed size as a 24-bit
// little-endian integer. The same layout is shared by both LZSS modes.

use std::fmt;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Format limits
// ---------------------------------------------------------------------------

/// Size of the compression header in bytes.
pub const HEADER_LEN: usize = 4;

/// Largest input the 24-bit size field can describe.
pub const MAX_UNCOMPRESSED_LEN: usize = 0x00FF_FFFF;

/// Upper bound on compressed input accepted by the file helpers.
///
/// Comfortably above the encoder's worst case of one flag byte per eight
/// literals plus header and padding, `(MAX_UNCOMPRESSED_LEN + 1) * 9 / 8 + 3`.
pub const MAX_COMPRESSED_LEN: usize = 0x01B0_0003;

/// Shortest back-reference worth encoding.
pub const MIN_MATCH: usize = 3;

/// Longest LZ10 back-reference (4-bit length field, bias 3).
pub const LZ10_MAX_LEN: usize = 18;

/// Longest LZ11 back-reference (16-bit extra-extended field, bias 0x111).
pub const LZ11_MAX_LEN: usize = 65808;

/// Furthest back-reference for both modes (12-bit field, bias 1).
pub const MAX_DISPLACEMENT: usize = 4096;

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// LZSS flavour, identified on the wire by the header tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Tag `0x10`: fixed 2-byte references, lengths 3..=18.
    #[default]
    Lz10,
    /// Tag `0x11`: tiered 2/3/4-byte references, lengths 3..=65808.
    Lz11,
}

impl Mode {
    /// Header tag byte.
    pub const fn tag(self) -> u8 {
        match self {
            Self::Lz10 => 0x10,
            Self::Lz11 => 0x11,
        }
    }

    /// Mode for a header tag, if the tag names one.
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x10 => Some(Self::Lz10),
            0x11 => Some(Self::Lz11),
            _ => None,
        }
    }

    pub const fn max_match_len(self) -> usize {
        match self {
            Self::Lz10 => LZ10_MAX_LEN,
            Self::Lz11 => LZ11_MAX_LEN,
        }
    }

    pub const fn max_displacement(self) -> usize {
        MAX_DISPLACEMENT
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Lz10 => "LZ10",
            Self::Lz11 => "LZ11",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("truncated header: need 4 bytes, got {0}")]
    Truncated(usize),
    #[error("unknown compression tag {0:#04X}")]
    UnknownTag(u8),
    #[error("expected {expected} stream, header tag is {found:#04X}")]
    ModeMismatch { expected: Mode, found: u8 },
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Parsed compression header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub mode: Mode,
    /// Exact number of bytes the decoder must produce.
    pub uncompressed_size: u32,
}

impl Header {
    pub fn new(mode: Mode, uncompressed_size: u32) -> Self {
        debug_assert!(uncompressed_size as usize <= MAX_UNCOMPRESSED_LEN);
        Self {
            mode,
            uncompressed_size,
        }
    }

    /// Serialized form: tag, then size in little-endian order.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let size = self.uncompressed_size;
        [
            self.mode.tag(),
            size as u8,
            (size >> 8) as u8,
            (size >> 16) as u8,
        ]
    }

    /// Append the header to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_bytes());
    }

    /// Parse the header at the start of `input`.
    pub fn decode(input: &[u8]) -> Result<Self, HeaderError> {
        let Some(bytes) = input.get(..HEADER_LEN) else {
            return Err(HeaderError::Truncated(input.len()));
        };
        let mode = Mode::from_tag(bytes[0]).ok_or(HeaderError::UnknownTag(bytes[0]))?;
        let uncompressed_size =
            u32::from(bytes[1]) | (u32::from(bytes[2]) << 8) | (u32::from(bytes[3]) << 16);
        Ok(Self {
            mode,
            uncompressed_size,
        })
    }

    /// Parse the header and require it to carry `expected`'s tag.
    pub fn decode_expecting(input: &[u8], expected: Mode) -> Result<Self, HeaderError> {
        if let Some(&tag) = input.first()
            && tag != expected.tag()
        {
            return Err(HeaderError::ModeMismatch {
                expected,
                found: tag,
            });
        }
        Self::decode(input)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_roundtrip() {
        for mode in [Mode::Lz10, Mode::Lz11] {
            assert_eq!(Mode::from_tag(mode.tag()), Some(mode));
        }
        assert_eq!(Mode::from_tag(0x40), None);
    }

    #[test]
    fn size_is_little_endian_24_bit() {
        let hdr = Header::new(Mode::Lz11, 0x00AB_CDEF);
        assert_eq!(hdr.to_bytes(), [0x11, 0xEF, 0xCD, 0xAB]);
        assert_eq!(Header::decode(&hdr.to_bytes()).unwrap(), hdr);
    }

    #[test]
    fn decode_ignores_trailing_bytes() {
        let hdr = Header::decode(&[0x10, 0x05, 0x00, 0x00, 0xFF, 0xFF]).unwrap();
        assert_eq!(hdr.mode, Mode::Lz10);
        assert_eq!(hdr.uncompressed_size, 5);
    }

    #[test]
    fn truncated_header() {
        assert_eq!(Header::decode(&[]), Err(HeaderError::Truncated(0)));
        assert_eq!(
            Header::decode(&[0x10, 0x01, 0x00]),
            Err(HeaderError::Truncated(3))
        );
    }

    #[test]
    fn unknown_tag() {
        assert_eq!(
            Header::decode(&[0x24, 0, 0, 0]),
            Err(HeaderError::UnknownTag(0x24))
        );
    }

    #[test]
    fn expecting_wrong_mode() {
        let err = Header::decode_expecting(&[0x11, 0, 0, 0], Mode::Lz10).unwrap_err();
        assert_eq!(
            err,
            HeaderError::ModeMismatch {
                expected: Mode::Lz10,
                found: 0x11
            }
        );
        assert!(Header::decode_expecting(&[0x11, 0, 0, 0], Mode::Lz11).is_ok());
    }

    #[test]
    fn mode_limits() {
        assert_eq!(Mode::Lz10.max_match_len(), 18);
        assert_eq!(Mode::Lz11.max_match_len(), 65808);
        assert_eq!(Mode::Lz10.max_displacement(), 4096);
        assert_eq!(Mode::Lz11.max_displacement(), 4096);
        assert_eq!(Mode::default(), Mode::Lz10);
        assert_eq!(Mode::Lz11.to_string(), "LZ11");
    }
}
