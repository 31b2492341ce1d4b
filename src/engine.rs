// Top-level entry points.
//
// Thin wrappers that pair the header codec with the LZSS encoder and
// decoder, plus batch helpers for many independent buffers.

use crate::compress::decoder::{self, DecodeError};
use crate::compress::encoder::{self, EncodeError, EncodeOptions};
use crate::format::header::Mode;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// ---------------------------------------------------------------------------
// Single buffer
// ---------------------------------------------------------------------------

/// Compress `source` as a `mode` stream.
///
/// Fails only if `source` is longer than the 24-bit size field allows.
pub fn encode(source: &[u8], mode: Mode, vram_safe: bool) -> Result<Vec<u8>, EncodeError> {
    encoder::encode(source, EncodeOptions::new(mode, vram_safe))
}

/// Decompress an LZ10 or LZ11 stream. With `vram_safe`, displacement-1
/// references are reported as a warning.
pub fn decode(source: &[u8], vram_safe: bool) -> Result<Vec<u8>, DecodeError> {
    decoder::decode(source, vram_safe)
}

/// Decompress a stream whose header must carry `mode`'s tag.
pub fn decode_as(source: &[u8], mode: Mode, vram_safe: bool) -> Result<Vec<u8>, DecodeError> {
    decoder::decode_as(source, mode, vram_safe)
}

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

/// Compress each buffer independently. Results keep the input order.
pub fn encode_batch<S: AsRef<[u8]> + Sync>(
    sources: &[S],
    opts: EncodeOptions,
) -> Vec<Result<Vec<u8>, EncodeError>> {
    #[cfg(feature = "parallel")]
    let iter = sources.par_iter();
    #[cfg(not(feature = "parallel"))]
    let iter = sources.iter();

    iter.map(|s| encoder::encode(s.as_ref(), opts)).collect()
}

/// Decompress each stream independently. Results keep the input order.
pub fn decode_batch<S: AsRef<[u8]> + Sync>(
    streams: &[S],
    vram_safe: bool,
) -> Vec<Result<Vec<u8>, DecodeError>> {
    #[cfg(feature = "parallel")]
    let iter = streams.par_iter();
    #[cfg(not(feature = "parallel"))]
    let iter = streams.iter();

    iter.map(|s| decoder::decode(s.as_ref(), vram_safe)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_both_modes() {
        let data = b"the quick brown fox jumps over the lazy dog, the quick brown fox";
        for mode in [Mode::Lz10, Mode::Lz11] {
            for vram in [false, true] {
                let packed = encode(data, mode, vram).unwrap();
                assert_eq!(packed[0], mode.tag());
                assert_eq!(decode(&packed, vram).unwrap(), data);
                assert_eq!(decode_as(&packed, mode, vram).unwrap(), data);
            }
        }
    }

    #[test]
    fn batch_keeps_order() {
        let inputs: Vec<Vec<u8>> = (0..16u8).map(|i| vec![i; i as usize * 13]).collect();
        let packed: Vec<Vec<u8>> = encode_batch(&inputs, EncodeOptions::default())
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();
        let unpacked: Vec<Vec<u8>> = decode_batch(&packed, false)
            .into_iter()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(unpacked, inputs);
    }
}
