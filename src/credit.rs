//! Post-mapping disambiguation and interior credit propagation.
//!
//! After a query is mapped independently by left and right contexts, the
//! filter reconciles the two answers, anchors the region between the
//! outermost trustworthy "sentinel" bases, and lets confidently mapped
//! neighbors imply coordinates for unmapped interior bases whose own
//! contexts failed.

use crate::bitvec::BitVector;
use crate::error::Result;
use crate::index::FmdIndex;
use crate::mapper::{disambiguate, Mapper, Mapping};
use crate::position::TextPosition;

/// Applies disambiguation and credit to paired mapping vectors.
pub struct CreditFilter<'a> {
    index: &'a FmdIndex,
    /// Range partition used to verify sentinel words.
    ranges: &'a BitVector,
    /// Mismatches tolerated when verifying sentinel uniqueness.
    z_max: u32,
}

impl<'a> CreditFilter<'a> {
    pub fn new(index: &'a FmdIndex, ranges: &'a BitVector, z_max: u32) -> Self {
        CreditFilter {
            index,
            ranges,
            z_max,
        }
    }

    /// Reconcile `left` and `right` mappings of `query` and fill unmapped
    /// interior bases from consistent neighbor implications.
    pub fn apply(
        &self,
        left: &[Mapping],
        right: &[Mapping],
        query: &[u8],
    ) -> Result<Vec<Mapping>> {
        debug_assert_eq!(left.len(), right.len());
        debug_assert_eq!(left.len(), query.len());

        let disambiguated: Vec<Mapping> = left
            .iter()
            .zip(right.iter())
            .map(|(l, r)| disambiguate(l, r))
            .collect();

        let mapper = Mapper::new(self.index);

        // The left sentinel is the leftmost base that left-mapped, survived
        // disambiguation, and whose minimal unique word is really unique
        // within z_max mismatches.
        let mut left_sentinel: Option<usize> = None;
        for i in 0..disambiguated.len() {
            if left[i].is_mapped() && disambiguated[i].is_mapped() {
                let word_length = disambiguated[i].left_min_unique as usize;
                if word_length == 0 || word_length > i + 1 {
                    continue;
                }
                let word = &query[i + 1 - word_length..=i];
                if mapper.mismatch_count(self.ranges, word, self.z_max, None)? {
                    left_sentinel = Some(i);
                    log::debug!("left sentinel found at {i}");
                    break;
                }
            }
        }

        let mut right_sentinel: Option<usize> = None;
        for i in (0..disambiguated.len()).rev() {
            if right[i].is_mapped() && disambiguated[i].is_mapped() {
                let word_length = disambiguated[i].right_min_unique as usize;
                if word_length == 0 || i + word_length > query.len() {
                    continue;
                }
                let word = &query[i..i + word_length];
                if mapper.mismatch_count(self.ranges, word, self.z_max, None)? {
                    right_sentinel = Some(i);
                    log::debug!("right sentinel found at {i}");
                    break;
                }
            }
        }

        let (left_sentinel, right_sentinel) = match (left_sentinel, right_sentinel) {
            (Some(l), Some(r)) if l < r => (l, r),
            _ => {
                // No anchored region; disambiguation is all we can do.
                log::debug!("no sequence between sentinels, no credit applied");
                return Ok(disambiguated);
            }
        };

        // The furthest any context reaches bounds how far we look for
        // crediting neighbors.
        let max_left_context = disambiguated
            .iter()
            .map(|m| m.left_max_context as usize)
            .max()
            .unwrap_or(0);
        let max_right_context = disambiguated
            .iter()
            .map(|m| m.right_max_context as usize)
            .max()
            .unwrap_or(0);
        log::debug!("max context sizes: {max_left_context}|{max_right_context}");

        let mut result = Vec::with_capacity(disambiguated.len());
        result.extend_from_slice(&disambiguated[..=left_sentinel]);

        for i in left_sentinel + 1..right_sentinel {
            if disambiguated[i].is_mapped() {
                result.push(disambiguated[i]);
                continue;
            }

            // Bases to the left whose right contexts reach i imply a place
            // for it.
            let right_implied = self.implied_position(
                &disambiguated,
                right,
                i,
                (i.saturating_sub(max_right_context)..i).rev(),
                |mapping, distance| mapping.right_max_context as usize >= distance + 1,
            );
            // And bases to the right whose left contexts reach back.
            let left_implied = self.implied_position(
                &disambiguated,
                left,
                i,
                i + 1..disambiguated.len().min(i + max_left_context),
                |mapping, distance| mapping.left_max_context as usize >= distance + 1,
            );

            let credited = match (left_implied, right_implied) {
                (Consistency::One(l), Consistency::One(r)) if l == r => Some(l),
                (Consistency::One(_), Consistency::One(_)) => None,
                (Consistency::One(l), Consistency::None) => Some(l),
                (Consistency::None, Consistency::One(r)) => Some(r),
                _ => None,
            };

            match credited {
                Some(location) => {
                    log::trace!("credited base {i} to text {location:?}");
                    result.push(Mapping {
                        location: Some(location),
                        ..Default::default()
                    });
                }
                None => result.push(Mapping::unmapped()),
            }
        }

        result.extend_from_slice(&disambiguated[right_sentinel..]);
        Ok(result)
    }

    /// Collect the position implied for base `i` by every crediting
    /// neighbor in `candidates`, classifying the set as empty, consistent,
    /// or conflicting.
    fn implied_position<I, F>(
        &self,
        disambiguated: &[Mapping],
        side: &[Mapping],
        i: usize,
        candidates: I,
        reaches: F,
    ) -> Consistency
    where
        I: Iterator<Item = usize>,
        F: Fn(&Mapping, usize) -> bool,
    {
        let mut found: Option<TextPosition> = None;
        for j in candidates {
            if !side[j].is_mapped() || !disambiguated[j].is_mapped() {
                continue;
            }
            let distance = i.abs_diff(j);
            // The neighbor's context must reach all the way to i; its own
            // base takes up the first character. This keeps credit from
            // running off the end of a contig.
            if !reaches(&disambiguated[j], distance) {
                continue;
            }
            let location = disambiguated[j]
                .location
                .expect("mapped neighbors carry locations");
            let implied = location.with_offset_shift(i as i64 - j as i64);
            match found {
                None => found = Some(implied),
                Some(existing) if existing == implied => {}
                Some(_) => return Consistency::Conflicting,
            }
        }
        match found {
            Some(position) => Consistency::One(position),
            None => Consistency::None,
        }
    }
}

enum Consistency {
    None,
    One(TextPosition),
    Conflicting,
}
