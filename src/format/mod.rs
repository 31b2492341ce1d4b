// GBA BIOS LZSS wire format.
//
// # Modules
//
// - `header`: 4-byte tag + 24-bit size header, mode limits
// - `block`: reference codewords (LZ10 / LZ11 tiers) and flag-byte groups

pub mod block;
pub mod header;

pub use block::{Block, BlockWriter, FlagReader, Match, decode_reference, encode_reference};
pub use header::{Header, HeaderError, Mode};
