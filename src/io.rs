// File-level I/O helpers for LZ10/LZ11 encoding/decoding.
//
// Both directions work on whole buffers, so readers are drained into
// memory (with a size limit) before the codec runs. `decode_*` can skip a
// byte offset first to pull a compressed blob out of a larger image such
// as a ROM dump. SHA-256 digests of the uncompressed data are computed
// when the `file-io` feature is enabled.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

#[cfg(feature = "file-io")]
use sha2::Digest;
use thiserror::Error;

use crate::compress::decoder::{self, DecodeError};
use crate::compress::encoder::{self, EncodeError, EncodeOptions};
use crate::format::header::{MAX_COMPRESSED_LEN, MAX_UNCOMPRESSED_LEN, Mode};

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `encode_stream()` / `encode_file()`.
#[derive(Debug, Clone)]
pub struct EncodeStats {
    pub mode: Mode,
    /// Uncompressed input size in bytes.
    pub input_size: u64,
    /// Compressed output size in bytes, padding included.
    pub output_size: u64,
    /// SHA-256 of the uncompressed input (if `file-io` feature is enabled).
    pub input_sha256: Option<[u8; 32]>,
}

/// Statistics returned by `decode_stream()` / `decode_file()`.
#[derive(Debug, Clone)]
pub struct DecodeStats {
    pub mode: Mode,
    /// Compressed bytes read after the start offset, including any trailing
    /// data that was not part of the stream.
    pub input_size: u64,
    /// Compressed bytes belonging to the stream (header + body).
    pub consumed: u64,
    /// Decompressed size in bytes.
    pub output_size: u64,
    /// Number of distinct warnings raised while decoding.
    pub warnings: usize,
    /// SHA-256 of the decompressed output (if `file-io` feature is enabled).
    pub output_sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for file I/O operations.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("input too large (limit {limit} bytes)")]
    TooLarge { limit: usize },
    #[error("offset {offset} is past the end of the input ({len} bytes)")]
    OffsetPastEnd { offset: u64, len: u64 },
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Decode-side settings for the stream/file helpers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// Require this mode's tag instead of accepting either.
    pub mode: Option<Mode>,
    /// Warn about displacement-1 references.
    pub vram_safe: bool,
    /// Bytes to skip before the compression header.
    pub offset: u64,
}

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Read `reader` to the end, failing once more than `limit` bytes arrive.
pub fn read_limited<R: Read>(reader: &mut R, limit: usize) -> Result<Vec<u8>, IoError> {
    let mut out = Vec::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        out.extend_from_slice(&buf[..n]);
        if out.len() > limit {
            return Err(IoError::TooLarge { limit });
        }
    }
    Ok(out)
}

/// Discard the first `offset` bytes of `reader`.
pub fn skip<R: Read>(reader: &mut R, offset: u64) -> Result<(), IoError> {
    if offset == 0 {
        return Ok(());
    }
    let skipped = io::copy(&mut reader.take(offset), &mut io::sink())?;
    if skipped < offset {
        return Err(IoError::OffsetPastEnd {
            offset,
            len: skipped,
        });
    }
    Ok(())
}

#[cfg(feature = "file-io")]
fn sha256(data: &[u8]) -> Option<[u8; 32]> {
    Some(sha2::Sha256::digest(data).into())
}

#[cfg(not(feature = "file-io"))]
fn sha256(_data: &[u8]) -> Option<[u8; 32]> {
    None
}

// ---------------------------------------------------------------------------
// Streams
// ---------------------------------------------------------------------------

/// Compress everything `reader` yields and write the stream to `writer`.
pub fn encode_stream<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    opts: EncodeOptions,
) -> Result<EncodeStats, IoError> {
    let input = read_limited(reader, MAX_UNCOMPRESSED_LEN)?;
    let packed = encoder::encode(&input, opts)?;
    writer.write_all(&packed)?;
    writer.flush()?;

    Ok(EncodeStats {
        mode: opts.mode,
        input_size: input.len() as u64,
        output_size: packed.len() as u64,
        input_sha256: sha256(&input),
    })
}

/// Decompress the stream `reader` yields (after `opts.offset`) into `writer`.
pub fn decode_stream<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    opts: DecodeOptions,
) -> Result<DecodeStats, IoError> {
    skip(reader, opts.offset)?;
    let input = read_limited(reader, MAX_COMPRESSED_LEN)?;
    let decoded = decoder::decode_with_report(&input, opts.mode, opts.vram_safe)?;
    writer.write_all(&decoded.data)?;
    writer.flush()?;

    Ok(DecodeStats {
        mode: decoded.header.mode,
        input_size: input.len() as u64,
        consumed: decoded.consumed as u64,
        output_size: decoded.data.len() as u64,
        warnings: decoded.warnings.iter().count(),
        output_sha256: sha256(&decoded.data),
    })
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// The output file is only created once the codec has succeeded.
fn write_output(path: &Path, data: &[u8]) -> Result<(), IoError> {
    let mut writer = BufWriter::with_capacity(BUF_SIZE, File::create(path)?);
    writer.write_all(data)?;
    writer.flush()?;
    Ok(())
}

/// Compress `input_path` into `output_path`.
pub fn encode_file(
    input_path: &Path,
    output_path: &Path,
    opts: EncodeOptions,
) -> Result<EncodeStats, IoError> {
    let mut reader = BufReader::with_capacity(BUF_SIZE, File::open(input_path)?);
    let mut packed = Vec::new();
    let stats = encode_stream(&mut reader, &mut packed, opts)?;
    write_output(output_path, &packed)?;
    Ok(stats)
}

/// Decompress `input_path` into `output_path`.
pub fn decode_file(
    input_path: &Path,
    output_path: &Path,
    opts: DecodeOptions,
) -> Result<DecodeStats, IoError> {
    let mut reader = BufReader::with_capacity(BUF_SIZE, File::open(input_path)?);
    let mut decoded = Vec::new();
    let stats = decode_stream(&mut reader, &mut decoded, opts)?;
    write_output(output_path, &decoded)?;
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> Vec<u8> {
        b"0123456789ABCDEF".repeat(40)
    }

    #[test]
    fn encode_decode_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw.bin");
        let packed = dir.path().join("raw.lz");
        let unpacked = dir.path().join("unpacked.bin");
        std::fs::write(&raw, sample()).unwrap();

        let enc = encode_file(&raw, &packed, EncodeOptions::new(Mode::Lz11, true)).unwrap();
        assert_eq!(enc.mode, Mode::Lz11);
        assert_eq!(enc.input_size, sample().len() as u64);
        assert!(enc.output_size < enc.input_size);
        assert_eq!(enc.output_size % 4, 0);

        let dec = decode_file(
            &packed,
            &unpacked,
            DecodeOptions {
                vram_safe: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(dec.mode, Mode::Lz11);
        assert_eq!(dec.output_size, enc.input_size);
        assert_eq!(dec.input_size, enc.output_size);
        assert!(dec.consumed <= dec.input_size);
        assert_eq!(dec.warnings, 0);
        assert_eq!(std::fs::read(&unpacked).unwrap(), sample());
    }

    #[test]
    fn decode_at_offset() {
        let packed = encoder::encode(&sample(), EncodeOptions::default()).unwrap();
        let mut rom = vec![0xFFu8; 100];
        rom.extend_from_slice(&packed);
        rom.extend_from_slice(&[0x55; 64]);

        let mut out = Vec::new();
        let stats = decode_stream(
            &mut Cursor::new(&rom),
            &mut out,
            DecodeOptions {
                offset: 100,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(out, sample());
        assert_eq!(stats.input_size, (packed.len() + 64) as u64);
        assert!(stats.consumed <= packed.len() as u64);
    }

    #[test]
    fn offset_past_end() {
        let mut out = Vec::new();
        let err = decode_stream(
            &mut Cursor::new(vec![0u8; 10]),
            &mut out,
            DecodeOptions {
                offset: 20,
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(
            err,
            IoError::OffsetPastEnd {
                offset: 20,
                len: 10
            }
        ));
    }

    #[test]
    fn read_limited_enforces_limit() {
        let data = vec![1u8; 100];
        assert_eq!(read_limited(&mut Cursor::new(&data), 100).unwrap(), data);
        assert!(matches!(
            read_limited(&mut Cursor::new(&data), 99),
            Err(IoError::TooLarge { limit: 99 })
        ));
    }

    #[test]
    fn decode_errors_are_wrapped() {
        let mut out = Vec::new();
        let err = decode_stream(
            &mut Cursor::new(vec![0x40, 0, 0, 0]),
            &mut out,
            DecodeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, IoError::Decode(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn failed_decode_leaves_output_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.lz");
        let existing = dir.path().join("existing.bin");
        let fresh = dir.path().join("fresh.bin");
        std::fs::write(&bad, [0x10, 4, 0, 0, 0b0100_0000, b'a', 0x00, 0x01]).unwrap();
        std::fs::write(&existing, b"precious").unwrap();

        let err = decode_file(&bad, &existing, DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, IoError::Decode(_)));
        assert_eq!(std::fs::read(&existing).unwrap(), b"precious");

        assert!(decode_file(&bad, &fresh, DecodeOptions::default()).is_err());
        assert!(!fresh.exists());
    }

    #[test]
    fn failed_encode_leaves_output_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let big = dir.path().join("big.bin");
        let existing = dir.path().join("existing.lz");
        let fresh = dir.path().join("fresh.lz");
        std::fs::write(&big, vec![0u8; MAX_UNCOMPRESSED_LEN + 1]).unwrap();
        std::fs::write(&existing, b"precious").unwrap();

        let err = encode_file(&big, &existing, EncodeOptions::default()).unwrap_err();
        assert!(matches!(err, IoError::TooLarge { .. }));
        assert_eq!(std::fs::read(&existing).unwrap(), b"precious");

        assert!(encode_file(&big, &fresh, EncodeOptions::default()).is_err());
        assert!(!fresh.exists());
    }

    #[cfg(feature = "file-io")]
    #[test]
    fn sha256_matches_between_directions() {
        let mut packed = Vec::new();
        let enc = encode_stream(
            &mut Cursor::new(sample()),
            &mut packed,
            EncodeOptions::default(),
        )
        .unwrap();
        let mut out = Vec::new();
        let dec = decode_stream(&mut Cursor::new(&packed), &mut out, DecodeOptions::default())
            .unwrap();
        assert!(enc.input_sha256.is_some());
        assert_eq!(enc.input_sha256, dec.output_sha256);
    }
}
