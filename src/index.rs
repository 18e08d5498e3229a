//! The FMD-index: a bidirectional FM-index over a collection of contigs
//! and their reverse complements.
//!
//! Owns the rank-queryable BWT, the sampled suffix array, the LCP array,
//! the contig table, and the per-genome masks. All query methods take
//! `&self` and are safe to call from many threads at once; the index never
//! changes after loading.
//!
//! The search primitives live here: bidirectional extension, left-only
//! extension, LCP-based right retraction, counting, locating, and
//! character display. The mapping state machines that drive them are in
//! [`crate::mapper`].

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use crate::alphabet::{complement, complement_code, encode, BASES_BY_RC, NUM_BASES, SEPARATOR};
use crate::bitvec::BitVector;
use crate::bwt::RankedBwt;
use crate::contigs::ContigSet;
use crate::error::{Error, Result};
use crate::lcp::LcpArray;
use crate::position::{FmdPosition, TextPosition};
use crate::ssa::SampledSuffixArray;

/// An immutable, load-resident FMD-index.
pub struct FmdIndex {
    bwt: RankedBwt,
    ssa: SampledSuffixArray,
    lcp: LcpArray,
    contigs: ContigSet,
    masks: Vec<BitVector>,
    /// BWT row whose L-column symbol is the last base of each contig's
    /// forward strand; lets display walk a contig without un-locating.
    end_indices: Vec<u64>,
}

fn suffixed(basename: &Path, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}{}", basename.display(), suffix))
}

impl FmdIndex {
    /// Load an index from its on-disk file set (`basename.bwt`,
    /// `basename.ssa`, `basename.lcp`, `basename.contigs`,
    /// `basename.msk`).
    pub fn load(basename: &Path) -> Result<Self> {
        log::info!("loading index {}", basename.display());

        let bwt = RankedBwt::load(&suffixed(basename, ".bwt"))?;
        let ssa = SampledSuffixArray::load(&suffixed(basename, ".ssa"))?;
        let lcp = LcpArray::load(&suffixed(basename, ".lcp"))?;

        // Genome masks: concatenated bit vectors, count inferred from EOF.
        let mut mask_bytes = Vec::new();
        File::open(suffixed(basename, ".msk"))?.read_to_end(&mut mask_bytes)?;
        let mut masks = Vec::new();
        let mut cursor = Cursor::new(&mask_bytes[..]);
        while (cursor.position() as usize) < mask_bytes.len() {
            masks.push(BitVector::read_from(&mut cursor)?);
        }

        let contigs = ContigSet::load(&suffixed(basename, ".contigs"), masks.len())?;
        Self::from_parts(bwt, ssa, lcp, contigs, masks)
    }

    /// Assemble an index from already-built parts (used by the naive
    /// constructor and by tests).
    pub fn from_parts(
        bwt: RankedBwt,
        ssa: SampledSuffixArray,
        lcp: LcpArray,
        contigs: ContigSet,
        masks: Vec<BitVector>,
    ) -> Result<Self> {
        let mut index = FmdIndex {
            bwt,
            ssa,
            lcp,
            contigs,
            masks,
            end_indices: Vec::new(),
        };

        // The first 2 x contigs rows have the separator in the F column, so
        // their L symbols are the last real characters of the texts.
        let mut end_indices = vec![0u64; index.contigs.len()];
        for row in 0..(index.contigs.len() as u64 * 2) {
            let position = index.locate(row)?;
            if !position.is_reverse() {
                end_indices[position.contig() as usize] = row;
            }
        }
        index.end_indices = end_indices;

        log::info!(
            "index ready: {} contigs, {} genomes, BWT length {}",
            index.contigs.len(),
            index.masks.len(),
            index.bwt.len()
        );
        Ok(index)
    }

    /// Total number of BWT rows (bases of both strands plus separators).
    pub fn bwt_length(&self) -> u64 {
        self.bwt.len()
    }

    /// The contig table.
    pub fn contigs(&self) -> &ContigSet {
        &self.contigs
    }

    /// Number of genomes with masks.
    pub fn num_genomes(&self) -> usize {
        self.masks.len()
    }

    /// The mask of one genome.
    pub fn genome_mask(&self, genome: usize) -> &BitVector {
        &self.masks[genome]
    }

    /// True if a BWT row belongs to the given genome.
    pub fn is_in_genome(&self, row: u64, genome: usize) -> bool {
        self.masks[genome].get(row as usize)
    }

    /// The position selecting every BWT row (the empty pattern).
    pub fn covering_position(&self) -> FmdPosition {
        FmdPosition::new(0, 0, self.bwt.len() as i64 - 1)
    }

    /// The position of a single-character pattern.
    pub fn char_position(&self, c: u8) -> Result<FmdPosition> {
        let code = encode(c)?;
        let forward_start = self.bwt.pc(code) as i64;
        let reverse_start = self.bwt.pc(complement_code(code)) as i64;
        let end_offset = self.bwt.symbol_count(code) as i64 - 1;
        Ok(FmdPosition::new(forward_start, reverse_start, end_offset))
    }

    /// Extend a position with one character: backward prepends `c` to the
    /// pattern, forward appends it. Returns the new position.
    pub fn extend(&self, range: FmdPosition, c: u8, backward: bool) -> Result<FmdPosition> {
        if !backward {
            // Only backward search is implemented directly: flip, extend
            // with the complement, flip back.
            return Ok(self.extend(range.flip(), complement(c)?, true)?.flip());
        }
        if c == 0 {
            return Err(Error::InvalidBase('\0'));
        }
        let code = encode(c)?;

        let start_occ = self.bwt.full_occ(range.forward_start - 1);
        let end_occ = self.bwt.full_occ(range.forward_start + range.end_offset);

        // Forward starts and lengths for all four candidate extensions.
        let mut forward_starts = [0i64; NUM_BASES + 1];
        let mut lengths = [0i64; NUM_BASES + 1];
        for b in 1..=NUM_BASES as u8 {
            forward_starts[b as usize] =
                (self.bwt.pc(b) + start_occ[b as usize]) as i64;
            lengths[b as usize] = end_occ[b as usize] as i64 - start_occ[b as usize] as i64;
        }

        // The end-of-text slot takes whatever part of the old interval the
        // four bases do not account for, and comes first in the reverse
        // ordering.
        let mut end_of_text = range.end_offset + 1;
        for b in 1..=NUM_BASES {
            end_of_text -= lengths[b];
        }

        // Partition the old reverse interval in alphabetical order by
        // reverse complement.
        let mut reverse_starts = [0i64; NUM_BASES + 1];
        let mut cursor = range.reverse_start + end_of_text;
        for &b in BASES_BY_RC.iter() {
            reverse_starts[b as usize] = cursor;
            cursor += lengths[b as usize];
        }

        Ok(FmdPosition::new(
            forward_starts[code as usize],
            reverse_starts[code as usize],
            lengths[code as usize] - 1,
        ))
    }

    /// In-place extension that only materializes the result for the one
    /// requested character. Same answers as [`FmdIndex::extend`].
    pub fn extend_fast(&self, range: &mut FmdPosition, c: u8, backward: bool) -> Result<()> {
        let c = if backward { c } else { complement(c)? };
        let code = encode(c)?;
        if !backward {
            range.flip_in_place();
        }

        let start_occ = self.bwt.full_occ(range.forward_start - 1);
        let end_occ = self.bwt.full_occ(range.forward_start + range.end_offset);

        // Separator occurrences precede every base in the reverse ordering.
        range.reverse_start +=
            end_occ[SEPARATOR as usize] as i64 - start_occ[SEPARATOR as usize] as i64;
        for &b in BASES_BY_RC.iter() {
            let length = end_occ[b as usize] as i64 - start_occ[b as usize] as i64;
            if b == code {
                range.forward_start = (self.bwt.pc(b) + start_occ[b as usize]) as i64;
                range.end_offset = length - 1;
                break;
            }
            range.reverse_start += length;
        }

        if !backward {
            range.flip_in_place();
        }
        Ok(())
    }

    /// Backward extension of the forward interval only. The reverse
    /// interval is left stale: the position can afterwards only be
    /// extended left or retracted on the right.
    pub fn extend_left_only(&self, range: &mut FmdPosition, c: u8) -> Result<()> {
        let code = encode(c)?;
        let start_rank = self.bwt.occ(code, range.forward_start - 1) as i64;
        let end_rank = self.bwt.occ(code, range.forward_start + range.end_offset) as i64 - 1;
        range.forward_start = self.bwt.pc(code) as i64 + start_rank;
        range.end_offset = end_rank - start_rank;
        Ok(())
    }

    /// Parent suffix-tree node of the forward interval: its string depth
    /// and the LCP index that carries it.
    fn parent_depth(&self, range: &FmdPosition) -> Result<(u64, u64)> {
        let range_start = range.forward_start as u64;
        let range_end = (range.forward_start + range.end_offset + 1) as u64;
        let start_lcp = self.lcp.get(range_start)?;
        // One past the interval may be one past the LCP array; the root is
        // bounded by an imaginary zero there.
        let end_lcp = if range_end < self.bwt.len() {
            self.lcp.get(range_end)?
        } else {
            0
        };
        // The greater value is the parent's depth. Ties go to the start,
        // which is always a real LCP index.
        if start_lcp >= end_lcp {
            Ok((start_lcp, range_start))
        } else {
            Ok((end_lcp, range_end))
        }
    }

    /// One parent-interval jump on the right. Only the forward interval is
    /// maintained. Returns the new pattern length (the parent's string
    /// depth).
    pub fn retract_right_only(&self, range: &mut FmdPosition) -> Result<u64> {
        let (depth, lcp_index) = self.parent_depth(range)?;
        let new_start = self.lcp.psv(lcp_index)?;
        // The NSV can be one past the end when we reach the root.
        let new_end = self.lcp.nsv(lcp_index)?;
        range.forward_start = new_start as i64;
        range.end_offset = new_end as i64 - new_start as i64 - 1;
        Ok(depth)
    }

    /// Retract on the right until the pattern length is at most
    /// `new_length`, jumping through parent intervals.
    pub fn retract_right_only_to(&self, range: &mut FmdPosition, new_length: u64) -> Result<()> {
        loop {
            let (depth, _) = self.parent_depth(range)?;
            if depth < new_length {
                // The parent is already shallower than the target; this
                // interval is the deepest one covering the target length.
                return Ok(());
            }
            let jumped = self.retract_right_only(range)?;
            if jumped == new_length {
                return Ok(());
            }
        }
    }

    /// Count occurrences of a pattern: the position of all BWT rows whose
    /// suffixes start with it. The empty pattern covers everything.
    pub fn count(&self, pattern: &[u8]) -> Result<FmdPosition> {
        if pattern.is_empty() {
            return Ok(self.covering_position());
        }
        let mut position = self.char_position(pattern[pattern.len() - 1])?;
        for &c in pattern[..pattern.len() - 1].iter().rev() {
            if position.is_empty(None) {
                break;
            }
            self.extend_fast(&mut position, c, true)?;
        }
        Ok(position)
    }

    /// Resolve a BWT row to its (text, offset) coordinate.
    pub fn locate(&self, row: u64) -> Result<TextPosition> {
        self.ssa.locate(&self.bwt, row)
    }

    /// LF-mapping on the BWT.
    pub fn lf(&self, row: u64) -> u64 {
        self.bwt.lf(row)
    }

    /// The L-column character at a BWT row (`$` at separators).
    pub fn display(&self, row: u64) -> u8 {
        crate::alphabet::decode(self.bwt.code_at(row))
    }

    /// The F-column character at a BWT row: the largest code whose prefix
    /// count does not exceed the row.
    pub fn display_first(&self, row: u64) -> u8 {
        let mut code = SEPARATOR;
        for c in (0..NUM_BASES as u8 + 1).rev() {
            if row >= self.bwt.pc(c) {
                code = c;
                break;
            }
        }
        crate::alphabet::decode(code)
    }

    /// The base at a 0-based offset of a contig's forward strand, read out
    /// of the index by LF-walking from the contig's end row.
    pub fn display_base(&self, contig: usize, offset: u64) -> Result<u8> {
        let length = self.contigs.contig(contig).length;
        if offset >= length {
            return Err(Error::OutOfRange {
                what: "display",
                index: offset,
                len: length,
            });
        }
        let mut row = self.end_indices[contig];
        for _ in 0..(length - offset - 1) {
            row = self.lf(row);
        }
        Ok(self.display(row))
    }

    /// Reconstruct a whole contig's forward strand.
    pub fn display_contig(&self, contig: usize) -> String {
        let length = self.contigs.contig(contig).length as usize;
        let mut bases = Vec::with_capacity(length);
        let mut row = self.end_indices[contig];
        for _ in 0..length {
            bases.push(self.display(row));
            row = self.lf(row);
        }
        bases.reverse();
        String::from_utf8(bases).expect("contig bases are ASCII")
    }

    /// BWT row whose L symbol is the last base of a contig.
    pub fn contig_end_index(&self, contig: usize) -> u64 {
        self.end_indices[contig]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naive::NaiveIndexBuilder;

    fn toy_index() -> FmdIndex {
        // A single non-palindromic contig; its reverse complement is
        // ATGACCGT.
        NaiveIndexBuilder::new()
            .contig("seq0", b"ACGGTCAT", 0)
            .build()
            .unwrap()
    }

    #[test]
    fn covering_position_counts_everything() {
        let index = toy_index();
        // 2 strands x 8 bases + 2 separators.
        assert_eq!(index.bwt_length(), 18);
        let cover = index.covering_position();
        assert_eq!(cover.length(None), 18);
    }

    #[test]
    fn count_finds_substrings_of_both_strands() {
        let index = toy_index();
        assert_eq!(index.count(b"ACGGTCAT").unwrap().length(None), 1);
        assert_eq!(index.count(b"ATGACCGT").unwrap().length(None), 1);
        assert_eq!(index.count(b"GGTC").unwrap().length(None), 1);
        // "GT" occurs on both strands.
        assert_eq!(index.count(b"GT").unwrap().length(None), 2);
        // "T" occurs twice per strand.
        assert_eq!(index.count(b"T").unwrap().length(None), 4);
        assert_eq!(index.count(b"TTT").unwrap().length(None), 0);
        assert_eq!(index.count(b"").unwrap().length(None), 18);
    }

    #[test]
    fn count_is_monotone_in_pattern_length() {
        let index = toy_index();
        let pattern = b"GTCAT";
        for i in 0..pattern.len() {
            let shorter = index.count(&pattern[i + 1..]).unwrap();
            let longer = index.count(&pattern[i..]).unwrap();
            assert!(longer.length(None) <= shorter.length(None));
        }
    }

    #[test]
    fn forward_and_backward_extension_agree() {
        let index = toy_index();
        // Building "GTC" backward from C or forward from G must select the
        // same rows.
        let mut backward = index.char_position(b'C').unwrap();
        backward = index.extend(backward, b'T', true).unwrap();
        backward = index.extend(backward, b'G', true).unwrap();

        let mut forward = index.char_position(b'G').unwrap();
        forward = index.extend(forward, b'T', false).unwrap();
        forward = index.extend(forward, b'C', false).unwrap();

        assert_eq!(backward, forward);
        assert_eq!(backward.length(None), 1);
    }

    #[test]
    fn extension_preserves_interval_equality() {
        let index = toy_index();
        // Walk a pattern that exists on one strand; at every step the
        // reverse interval must mirror the forward interval's length, which
        // equals the occurrence count of the reverse complement.
        let pattern = b"GGTCAT";
        let mut position = index.covering_position();
        for (i, &c) in pattern.iter().enumerate().rev() {
            position = index.extend(position, c, true).unwrap();
            let rc = crate::alphabet::reverse_complement(&pattern[i..]).unwrap();
            let rc_count = index.count(&rc).unwrap().length(None);
            assert_eq!(position.length(None), rc_count, "after {} chars", pattern.len() - i);
            // The flipped position must select exactly the rc rows.
            assert_eq!(position.flip(), index.count(&rc).unwrap());
        }
    }

    #[test]
    fn extend_fast_matches_extend() {
        let index = toy_index();
        let pattern = b"TCAT";
        let mut slow = index.covering_position();
        let mut fast = index.covering_position();
        for &c in pattern.iter().rev() {
            slow = index.extend(slow, c, true).unwrap();
            index.extend_fast(&mut fast, c, true).unwrap();
            assert_eq!(slow, fast);
        }
        // And forward.
        let mut slow = index.char_position(b'G').unwrap();
        let mut fast = slow;
        for &c in b"GTC" {
            slow = index.extend(slow, c, false).unwrap();
            index.extend_fast(&mut fast, c, false).unwrap();
            assert_eq!(slow, fast);
        }
    }

    #[test]
    fn invalid_bases_are_rejected() {
        let index = toy_index();
        let cover = index.covering_position();
        assert!(matches!(
            index.extend(cover, b'N', true),
            Err(Error::InvalidBase('N'))
        ));
        assert!(matches!(
            index.extend(cover, 0, true),
            Err(Error::InvalidBase('\0'))
        ));
        let mut position = cover;
        assert!(index.extend_left_only(&mut position, b'x').is_err());
    }

    #[test]
    fn forward_extension_inverts_retraction() {
        let index = toy_index();
        let full = index.count(b"GGTC").unwrap();
        let prefix = index.count(b"GGT").unwrap();
        // Appending the dropped character on the right restores the longer
        // pattern's position.
        assert_eq!(index.extend(prefix, b'C', false).unwrap(), full);
        // Retracting the longer pattern recovers the prefix's forward
        // interval ("GGT" happens to select the same single row).
        let mut retracted = full;
        index.retract_right_only_to(&mut retracted, 3).unwrap();
        assert_eq!(retracted.forward_start, prefix.forward_start);
        assert_eq!(retracted.end_offset, prefix.end_offset);
    }

    #[test]
    fn retraction_jumps_to_a_wider_parent_interval() {
        let index = toy_index();
        // "GTC" occurs once but "GT" occurs on both strands, so retracting
        // the length-3 pattern to 2 characters must widen the interval.
        let full = index.count(b"GTC").unwrap();
        assert_eq!(full.length(None), 1);
        let parent = index.count(b"GT").unwrap();
        assert_eq!(parent.length(None), 2);
        let mut retracted = full;
        index.retract_right_only_to(&mut retracted, 2).unwrap();
        assert_eq!(retracted.forward_start, parent.forward_start);
        assert_eq!(retracted.end_offset, parent.end_offset);
    }

    #[test]
    fn retract_at_covering_interval_is_fixed_point() {
        let index = toy_index();
        let mut cover = index.covering_position();
        let depth = index.retract_right_only(&mut cover).unwrap();
        assert_eq!(depth, 0);
        assert_eq!(cover.forward_start, 0);
        assert_eq!(cover.end_offset, index.bwt_length() as i64 - 1);
    }

    #[test]
    fn locate_and_display_agree() {
        let index = toy_index();
        let contig = b"ACGGTCAT";
        // Every base of the forward strand can be found by searching a
        // unique context, located, and displayed back.
        let position = index.count(b"GGTCAT").unwrap();
        assert_eq!(position.length(None), 1);
        let located = index.locate(position.forward_start as u64).unwrap();
        assert_eq!(located, TextPosition::new(0, 2));
        for offset in 0..contig.len() as u64 {
            assert_eq!(
                index.display_base(0, offset).unwrap(),
                contig[offset as usize]
            );
        }
    }

    #[test]
    fn display_contig_reconstructs_both_contigs() {
        let index = NaiveIndexBuilder::new()
            .contig("a", b"ACGGTCAT", 0)
            .contig("b", b"TTAGC", 0)
            .build()
            .unwrap();
        assert_eq!(index.display_contig(0), "ACGGTCAT");
        assert_eq!(index.display_contig(1), "TTAGC");
    }

    #[test]
    fn genome_masks_partition_rows() {
        let index = NaiveIndexBuilder::new()
            .contig("a", b"ACGGTCAT", 0)
            .contig("b", b"TTAGC", 1)
            .build()
            .unwrap();
        assert_eq!(index.num_genomes(), 2);
        for row in 0..index.bwt_length() {
            let in_a = index.is_in_genome(row, 0);
            let in_b = index.is_in_genome(row, 1);
            assert!(in_a != in_b, "row {row} must be in exactly one genome");
        }
        // Masked counting: "TT" only occurs in genome 1's contig (and the
        // RC "AA" pattern stays in the same genome).
        let position = index.count(b"TT").unwrap();
        assert_eq!(position.length(Some(index.genome_mask(1))), 1);
        assert_eq!(position.length(Some(index.genome_mask(0))), 0);
    }
}
