// LZSS compression and decompression.
//
// - `encoder`: LzssEncoder, match search + lazy parse, block serialization
// - `decoder`: LzssDecoder, flag-driven block decoding with overlap-aware copies

pub mod decoder;
pub mod encoder;

pub use decoder::{
    BlockIter, DecodeError, DecodeWarnings, Decoded, LzssDecoder, Warning, WarningKind,
};
pub use encoder::{EncodeError, EncodeOptions, LzssEncoder};
