//! Positions: coordinates in the text collection and paired BWT intervals.

use crate::bitvec::BitVector;

/// A (text, offset) coordinate. Texts come in strand pairs: text `2k` is
/// the forward strand of contig `k` and text `2k + 1` its reverse
/// complement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextPosition {
    pub text: u64,
    pub offset: u64,
}

impl TextPosition {
    pub fn new(text: u64, offset: u64) -> Self {
        TextPosition { text, offset }
    }

    /// The contig this position belongs to (both strands share one).
    pub fn contig(&self) -> u64 {
        self.text / 2
    }

    /// True on the reverse-complement strand.
    pub fn is_reverse(&self) -> bool {
        self.text % 2 == 1
    }

    /// The same physical base addressed from the other strand of a contig
    /// of the given length.
    pub fn flip(&self, contig_length: u64) -> Self {
        TextPosition {
            text: self.text ^ 1,
            offset: contig_length - 1 - self.offset,
        }
    }

    /// Shift along the strand by a signed amount.
    pub fn with_offset_shift(&self, delta: i64) -> Self {
        TextPosition {
            text: self.text,
            offset: (self.offset as i64 + delta) as u64,
        }
    }
}

/// A pair of equal-length BWT intervals: the forward interval covers rows
/// whose suffixes start with the current pattern, the reverse interval the
/// rows for its reverse complement. `end_offset` is length minus one, so a
/// zero-length position carries `-1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FmdPosition {
    pub forward_start: i64,
    pub reverse_start: i64,
    pub end_offset: i64,
}

/// The canonical empty position.
pub const EMPTY_FMD_POSITION: FmdPosition = FmdPosition {
    forward_start: 0,
    reverse_start: 0,
    end_offset: -1,
};

impl Default for FmdPosition {
    fn default() -> Self {
        EMPTY_FMD_POSITION
    }
}

impl std::fmt::Display for FmdPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}] and [{}, {}]",
            self.forward_start,
            self.forward_start + self.end_offset,
            self.reverse_start,
            self.reverse_start + self.end_offset
        )
    }
}

impl FmdPosition {
    pub fn new(forward_start: i64, reverse_start: i64, end_offset: i64) -> Self {
        FmdPosition {
            forward_start,
            reverse_start,
            end_offset,
        }
    }

    /// Swap the two intervals; the position then represents the reverse
    /// complement of its pattern.
    pub fn flip(&self) -> Self {
        FmdPosition {
            forward_start: self.reverse_start,
            reverse_start: self.forward_start,
            end_offset: self.end_offset,
        }
    }

    /// In-place [`FmdPosition::flip`].
    pub fn flip_in_place(&mut self) {
        std::mem::swap(&mut self.forward_start, &mut self.reverse_start);
    }

    /// Number of BWT rows selected, counting only rows the mask admits.
    pub fn length(&self, mask: Option<&BitVector>) -> u64 {
        if self.end_offset < 0 {
            return 0;
        }
        match mask {
            None => (self.end_offset + 1) as u64,
            Some(m) => m.ones_in(
                self.forward_start as usize,
                (self.forward_start + self.end_offset) as usize,
            ) as u64,
        }
    }

    /// True if no rows survive under the mask.
    pub fn is_empty(&self, mask: Option<&BitVector>) -> bool {
        self.length(mask) == 0
    }

    /// The range number this position maps to, if every masked row of the
    /// forward interval falls inside one range of the partition. Ranges are
    /// maximal runs of zeros terminated by a one in `ranges`.
    pub fn range(&self, ranges: &BitVector, mask: Option<&BitVector>) -> Option<u64> {
        if self.end_offset < 0 {
            return None;
        }
        let lo = self.forward_start as usize;
        let hi = (self.forward_start + self.end_offset) as usize;
        let (first, last) = match mask {
            None => (lo, hi),
            Some(m) => {
                let (first, first_rank) = m.value_after(lo)?;
                if first > hi {
                    return None;
                }
                let in_range = m.ones_in(lo, hi);
                let last = m.select1(first_rank + in_range - 1)?;
                (first, last)
            }
        };
        // A row belongs to the range counted by the ones strictly before it;
        // a terminating one belongs to the run it closes.
        let first_range = ranges.rank1(first) as u64;
        let last_range = ranges.rank1(last) as u64;
        if first_range == last_range {
            Some(first_range)
        } else {
            None
        }
    }

    /// Number of distinct ranges the masked interval touches.
    pub fn range_count(&self, ranges: &BitVector, mask: Option<&BitVector>) -> u64 {
        if self.is_empty(mask) {
            return 0;
        }
        let lo = self.forward_start as usize;
        let hi = (self.forward_start + self.end_offset) as usize;
        let (first, last) = match mask {
            None => (lo, hi),
            Some(m) => {
                let (first, first_rank) = match m.value_after(lo) {
                    Some(v) => v,
                    None => return 0,
                };
                if first > hi {
                    return 0;
                }
                let in_range = m.ones_in(lo, hi);
                match m.select1(first_rank + in_range - 1) {
                    Some(last) => (first, last),
                    None => return 0,
                }
            }
        };
        (ranges.rank1(last) - ranges.rank1(first)) as u64 + 1
    }
}
