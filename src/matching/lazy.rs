// One-step lookahead ("lazy matching").
//
// Before committing a match at position p, compare two parses:
//
//   take:  [match at p, len L]        [best match at p + L, len N]
//   skip:  [literal at p]             [best match at p + 1, len S]
//
// Lengths below MIN_MATCH count as 1 (the byte goes out as a literal).
// The match is dropped for a literal when L + N <= S + 1.

use crate::format::header::MIN_MATCH;

/// Bytes a parse step covers when `len` is the best match available.
#[inline]
pub fn effective_len(len: usize) -> usize {
    if len < MIN_MATCH { 1 } else { len }
}

/// Whether to emit a literal instead of a `current`-byte match, given the
/// best match lengths one byte later (`skip`) and right after the current
/// match (`next`).
#[inline]
pub fn prefer_literal(current: usize, skip: usize, next: usize) -> bool {
    current + effective_len(next) <= effective_len(skip) + 1
}
