//! gbalz: GBA BIOS LZ10/LZ11 (LZSS) compression in Rust.
//!
//! The crate provides:
//! - The wire format: header and block codewords (`format`)
//! - The backward window match search and lazy parse (`matching`)
//! - The encoder and decoder (`compress`)
//! - One-call entry points and batch helpers (`engine`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use gbalz::Mode;
//!
//! let data = b"tile tile tile tile map map map";
//! let packed = gbalz::encode(data, Mode::Lz11, true).unwrap();
//! assert_eq!(packed.len() % 4, 0);
//! let unpacked = gbalz::decode(&packed, true).unwrap();
//! assert_eq!(unpacked, data);
//! ```

pub mod compress;
pub mod engine;
pub mod format;
pub mod io;
pub mod matching;

#[cfg(feature = "cli")]
pub mod cli;

pub use compress::decoder::{DecodeError, Decoded, Warning, decode_with_report};
pub use compress::encoder::{EncodeError, EncodeOptions};
pub use engine::{decode, decode_as, encode};
pub use format::header::Mode;
