//! Greedy longest-match search between a search window and a lookahead.
//!
//! Every candidate start position in the search window is scanned
//! linearly until the first mismatch. The cost is
//! O(search_len × lookahead_len) per call, which stays small because both
//! windows are capped at 255 bytes by the token format.

use crate::window::WindowBuffer;

/// Random access to a read-only run of bytes.
pub trait ByteSequence {
    fn len(&self) -> usize;

    fn byte_at(&self, index: usize) -> u8;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ByteSequence for [u8] {
    fn len(&self) -> usize {
        <[u8]>::len(self)
    }

    fn byte_at(&self, index: usize) -> u8 {
        self[index]
    }
}

impl ByteSequence for WindowBuffer<u8> {
    fn len(&self) -> usize {
        WindowBuffer::len(self)
    }

    fn byte_at(&self, index: usize) -> u8 {
        self[index]
    }
}

/// Result of a search. `offset` counts back from the end of the search
/// window, so offset 1 is the most recent byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub offset: usize,
    pub length: usize,
}

impl Match {
    pub const NONE: Match = Match {
        offset: 0,
        length: 0,
    };

    pub fn is_none(&self) -> bool {
        self.length == 0
    }
}

/// Bounds on the length of a reported match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchLimits {
    /// Shorter runs are reported as [`Match::NONE`].
    pub min_length: usize,
    /// Scanning stops once a run reaches this length.
    pub max_length: usize,
}

impl MatchLimits {
    pub fn new(min_length: usize, max_length: usize) -> Self {
        Self {
            min_length: min_length.max(1),
            max_length,
        }
    }
}

/// Finds the longest run in `search` equal to a prefix of `lookahead`.
///
/// Runs never extend past the end of `search`. Among runs of equal length
/// the one with the smallest offset wins.
pub fn find_longest_match<S, L>(search: &S, lookahead: &L, limits: MatchLimits) -> Match
where
    S: ByteSequence + ?Sized,
    L: ByteSequence + ?Sized,
{
    let search_len = search.len();
    let limit = lookahead.len().min(limits.max_length);
    if search_len == 0 || limit == 0 {
        return Match::NONE;
    }

    let mut best = Match::NONE;

    // Most recent candidates first, so only a strictly longer run replaces
    // the current best.
    for start in (0..search_len).rev() {
        let reach = limit.min(search_len - start);
        if reach <= best.length {
            continue;
        }

        let mut length = 0;
        while length < reach && search.byte_at(start + length) == lookahead.byte_at(length) {
            length += 1;
        }

        if length > best.length {
            best = Match {
                offset: search_len - start,
                length,
            };
            if length == limit {
                break;
            }
        }
    }

    if best.length < limits.min_length {
        Match::NONE
    } else {
        best
    }
}
