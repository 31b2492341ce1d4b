// Match search for the LZSS encoder.
//
// - `finder`: backward window scan for the longest earlier copy
// - `lazy`: one-step lookahead deciding match vs. literal

pub mod finder;
pub mod lazy;

pub use finder::{MatchFinder, find_best_match};
pub use lazy::prefer_literal;
