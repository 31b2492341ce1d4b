// Backward window search for the longest earlier copy of the bytes at a
// position.
//
// Every earlier occurrence of the first byte inside the window is tried,
// nearest first. Ties keep the candidate found last, i.e. the farthest
// one. Compressed output depends on that tie rule.

use crate::format::block::Match;
use crate::format::header::Mode;

/// Longest match for `source[pos..]` starting inside
/// `[pos - max_disp, pos)`.
///
/// Candidate lengths are capped at `min(max_len, source.len() - pos)`. With
/// `vram_safe`, the candidate at displacement 1 scores zero. Returns `None`
/// when no candidate scores at least one byte. The returned length may be
/// below [`MIN_MATCH`](crate::format::header::MIN_MATCH); the caller decides
/// whether it is worth a reference.
///
/// Requires `0 < pos < source.len()`.
pub fn find_best_match(
    source: &[u8],
    pos: usize,
    max_len: usize,
    max_disp: usize,
    vram_safe: bool,
) -> Option<Match> {
    debug_assert!(pos > 0 && pos < source.len());

    let max_len = max_len.min(source.len() - pos);
    if max_len == 0 {
        return None;
    }
    let needle = &source[pos..pos + max_len];
    let first = needle[0];
    let window_start = pos.saturating_sub(max_disp);

    let mut best_len = 0usize;
    let mut best_disp = 0usize;

    for cand in (window_start..pos).rev() {
        if source[cand] != first {
            continue;
        }
        let displacement = pos - cand;
        let length = if vram_safe && displacement == 1 {
            0
        } else {
            common_prefix(&source[cand..], needle)
        };

        // Non-strict: a later (farther) candidate wins a tie.
        if length >= best_len {
            best_len = length;
            best_disp = displacement;
        }
        if best_len == max_len {
            break;
        }
    }

    (best_len > 0).then_some(Match {
        displacement: best_disp,
        length: best_len,
    })
}

/// Number of leading bytes `haystack` shares with `needle`.
///
/// `haystack` may overlap `needle` in the source buffer; that is the
/// self-referential run case and compares exactly as the decoder will copy.
#[inline]
fn common_prefix(haystack: &[u8], needle: &[u8]) -> usize {
    haystack
        .iter()
        .zip(needle)
        .take_while(|(a, b)| a == b)
        .count()
}

// ---------------------------------------------------------------------------
// MatchFinder
// ---------------------------------------------------------------------------

/// `find_best_match` bound to one mode's limits and a VRAM-safety setting.
#[derive(Debug, Clone, Copy)]
pub struct MatchFinder {
    max_len: usize,
    max_disp: usize,
    vram_safe: bool,
}

impl MatchFinder {
    pub fn new(mode: Mode, vram_safe: bool) -> Self {
        Self {
            max_len: mode.max_match_len(),
            max_disp: mode.max_displacement(),
            vram_safe,
        }
    }

    /// Best match at `pos`, capped at the mode's maximum length.
    pub fn best(&self, source: &[u8], pos: usize) -> Option<Match> {
        find_best_match(source, pos, self.max_len, self.max_disp, self.vram_safe)
    }

    /// Length of the best match at `pos`, 0 if there is none or `pos` is
    /// at the end of `source`.
    pub fn best_len(&self, source: &[u8], pos: usize) -> usize {
        if pos == 0 || pos >= source.len() {
            return 0;
        }
        self.best(source, pos).map_or(0, |m| m.length)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
