//! Mapping state machines over FMD-index intervals.
//!
//! Each machine walks a query and decides, per base, whether some
//! surrounding context pins the base to a single place (or single range)
//! in the reference. They differ in which side the context grows from and
//! how failure is handled: retraction, restart, or mismatch probing.
//! Recoverable conditions (no unique context, left/right disagreement)
//! become unmapped results; only structural problems surface as errors.

use crate::alphabet::reverse_complement;
use crate::bitvec::BitVector;
use crate::error::{Error, Result};
use crate::index::FmdIndex;
use crate::position::{FmdPosition, TextPosition, EMPTY_FMD_POSITION};

const ASCII_BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Where one query base maps, with the context bookkeeping the credit
/// filter feeds on. Max contexts record the longest context attempted and
/// may be nonzero even when the base is unmapped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Mapping {
    pub location: Option<TextPosition>,
    /// Context length (including the base) that made the base unique on
    /// each side, zero when that side never mapped it.
    pub left_min_unique: u32,
    pub right_min_unique: u32,
    /// Longest context reached on each side.
    pub left_max_context: u32,
    pub right_max_context: u32,
}

impl Mapping {
    /// An unmapped mapping with no context.
    pub fn unmapped() -> Self {
        Default::default()
    }

    /// True when the mapping carries a location.
    pub fn is_mapped(&self) -> bool {
        self.location.is_some()
    }
}

/// Reconcile independent left-context and right-context answers for one
/// base: agreement or one-sided knowledge maps, disagreement does not.
/// Context bookkeeping merges elementwise, so the operation is commutative
/// and idempotent.
pub fn disambiguate(left: &Mapping, right: &Mapping) -> Mapping {
    let location = match (left.location, right.location) {
        (Some(a), Some(b)) if a == b => Some(a),
        (Some(_), Some(_)) => None,
        (Some(a), None) => Some(a),
        (None, other) => other,
    };
    Mapping {
        location,
        left_min_unique: left.left_min_unique.max(right.left_min_unique),
        right_min_unique: left.right_min_unique.max(right.right_min_unique),
        left_max_context: left.left_max_context.max(right.left_max_context),
        right_max_context: left.right_max_context.max(right.right_max_context),
    }
}

/// One base's answer from a range-based machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeMapping {
    /// The range every masked row of the context interval fell into.
    pub range: Option<u64>,
    /// Context length (including the base) at acceptance.
    pub context: u32,
}

impl RangeMapping {
    fn unmapped() -> Self {
        RangeMapping {
            range: None,
            context: 0,
        }
    }
}

/// One base's answer from the two-sided credit machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreditMapping {
    pub range: Option<u64>,
    /// Symmetric context size when the range first became unique.
    pub characters: u32,
    /// Total bases examined on both sides.
    pub max_characters: u32,
}

/// Working state of the restart-based machines.
struct MapAttempt {
    position: FmdPosition,
    characters: u32,
    confirmed: bool,
}

impl MapAttempt {
    fn start_over() -> Self {
        MapAttempt {
            position: EMPTY_FMD_POSITION,
            characters: 0,
            confirmed: false,
        }
    }
}

/// How [`Mapper::mismatch_extend`] treats the extension character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MismatchExtendMode {
    /// Extend by the true base and by every mismatched base.
    Both,
    /// Extend by the true base only.
    MatchOnly,
    /// Extend by mismatched bases only (the split-mode probe).
    MismatchOnly,
}

/// Search state for the k-mismatch machines: all surviving intervals with
/// their accumulated mismatch counts.
#[derive(Clone, Debug)]
pub struct MismatchState {
    pub positions: Vec<(FmdPosition, u32)>,
    pub characters: u32,
    pub max_characters: u32,
    pub confirmed: bool,
}

impl MismatchState {
    /// The canonical empty state: one empty interval, nothing counted.
    pub fn empty() -> Self {
        MismatchState {
            positions: vec![(EMPTY_FMD_POSITION, 0)],
            characters: 0,
            max_characters: 0,
            confirmed: false,
        }
    }

    /// True for the canonical empty state.
    pub fn is_empty(&self) -> bool {
        self.positions.len() == 1 && self.positions[0].0.is_empty(None)
    }

    fn unique_range(&self, ranges: &BitVector, mask: Option<&BitVector>) -> Option<u64> {
        if self.positions.len() == 1 {
            self.positions[0].0.range(ranges, mask)
        } else {
            None
        }
    }
}

/// Drives the state machines against one index.
pub struct Mapper<'a> {
    index: &'a FmdIndex,
}

impl<'a> Mapper<'a> {
    pub fn new(index: &'a FmdIndex) -> Self {
        Mapper { index }
    }

    /// Locate the single masked row of a unique interval.
    fn locate_unique(
        &self,
        position: &FmdPosition,
        mask: Option<&BitVector>,
    ) -> Result<TextPosition> {
        let mut start = position.forward_start as u64;
        if let Some(m) = mask {
            // The interval is nonempty under the mask, so a set bit exists
            // at or after the start.
            if let Some((row, _)) = m.value_after(start as usize) {
                start = row as u64;
            }
        }
        self.index.locate(start)
    }

    /// Map every query base by its right context: iterate right to left,
    /// extending the pattern leftward with `extend_left_only` and
    /// retracting its right end when an extension would empty the
    /// interval. A base maps when the masked interval is a singleton and
    /// the pattern is at least `min_ctx` long.
    pub fn map_right(
        &self,
        query: &[u8],
        mask: Option<&BitVector>,
        min_ctx: u32,
    ) -> Result<Vec<Mapping>> {
        log::debug!(
            "right-mapping {} bases with minimum context {} ({})",
            query.len(),
            min_ctx,
            if mask.is_some() {
                "one genome"
            } else {
                "all genomes"
            }
        );

        let mut mappings = Vec::with_capacity(query.len());
        let mut search = self.index.covering_position();
        let mut pattern_length: u64 = 0;

        for i in (0..query.len()).rev() {
            let mut extended = search;
            self.index.extend_left_only(&mut extended, query[i])?;

            while extended.is_empty(mask) {
                if pattern_length == 0 {
                    // Every base is assumed to occur at least once in the
                    // index; an empty result at length zero means it does
                    // not.
                    return Err(Error::MissingAlphabet {
                        base: query[i] as char,
                    });
                }
                pattern_length = self.index.retract_right_only(&mut search)?;
                log::trace!("retracted to pattern length {pattern_length}");
                extended = search;
                self.index.extend_left_only(&mut extended, query[i])?;
            }

            search = extended;
            pattern_length += 1;

            if search.length(mask) == 1 && pattern_length >= min_ctx as u64 {
                let location = self.locate_unique(&search, mask)?;
                log::trace!(
                    "mapped {}-character context to text {} offset {}",
                    pattern_length,
                    location.text,
                    location.offset
                );
                mappings.push(Mapping {
                    location: Some(location),
                    right_min_unique: pattern_length as u32,
                    right_max_context: pattern_length as u32,
                    ..Default::default()
                });
            } else {
                mappings.push(Mapping {
                    right_max_context: pattern_length as u32,
                    ..Default::default()
                });
            }
        }

        mappings.reverse();
        Ok(mappings)
    }

    /// Map every query base by its left context: right-map the reverse
    /// complement and flip each answer back onto the opposite strand.
    pub fn map_left(
        &self,
        query: &[u8],
        mask: Option<&BitVector>,
        min_ctx: u32,
    ) -> Result<Vec<Mapping>> {
        let rc = reverse_complement(query)?;
        let mut mappings = self.map_right(&rc, mask, min_ctx)?;
        mappings.reverse();
        for mapping in mappings.iter_mut() {
            if let Some(location) = mapping.location {
                let contig_length = self
                    .index
                    .contigs()
                    .contig(location.contig() as usize)
                    .length;
                mapping.location = Some(location.flip(contig_length));
            }
            std::mem::swap(&mut mapping.left_min_unique, &mut mapping.right_min_unique);
            std::mem::swap(
                &mut mapping.left_max_context,
                &mut mapping.right_max_context,
            );
        }
        Ok(mappings)
    }

    /// Map with both contexts and keep only the answers they agree on.
    pub fn map_both(
        &self,
        query: &[u8],
        mask: Option<&BitVector>,
        min_ctx: u32,
    ) -> Result<Vec<Mapping>> {
        let right = self.map_right(query, mask, min_ctx)?;
        let left = self.map_left(query, mask, min_ctx)?;
        debug_assert_eq!(left.len(), right.len());
        Ok(left
            .iter()
            .zip(right.iter())
            .map(|(l, r)| disambiguate(l, r))
            .collect())
    }

    /// Map every query base by its left context with the greedy restart
    /// machine: extend forward while results remain, restart with a fresh
    /// backward search when they run out. The mapped base is the right end
    /// of its pattern, so the located coordinate is shifted by the context
    /// length.
    pub fn map(
        &self,
        query: &[u8],
        mask: Option<&BitVector>,
        min_ctx: u32,
    ) -> Result<Vec<Mapping>> {
        log::debug!(
            "left-mapping {} bases with minimum context {}",
            query.len(),
            min_ctx
        );

        let mut mappings = Vec::with_capacity(query.len());
        let mut attempt = MapAttempt::start_over();
        let mut i = 0usize;

        while i < query.len() {
            if attempt.position.is_empty(mask) {
                log::trace!("starting over by mapping position {i}");
                attempt = self.map_position(query, i, mask)?;
            } else {
                attempt.position = self.index.extend(attempt.position, query[i], false)?;
                attempt.characters += 1;
            }

            if attempt.confirmed
                && attempt.characters >= min_ctx
                && attempt.position.length(mask) == 1
            {
                let located = self.locate_unique(&attempt.position, mask)?;
                // The pattern ends at this base; move from its start to
                // its end.
                let location = located.with_offset_shift(attempt.characters as i64 - 1);
                mappings.push(Mapping {
                    location: Some(location),
                    left_min_unique: attempt.characters,
                    left_max_context: attempt.characters,
                    ..Default::default()
                });
            } else if attempt.confirmed && attempt.position.is_empty(mask) {
                // The extension emptied the interval: the left context was
                // too long. Retry this base with a fresh start.
                log::trace!("restarting at position {i}");
                continue;
            } else {
                // Too little context, a nonexistent context, or a
                // still-ambiguous interval; restarting here cannot help.
                mappings.push(Mapping {
                    left_max_context: attempt.characters,
                    ..Default::default()
                });
                attempt.confirmed = true;
            }
            i += 1;
        }

        Ok(mappings)
    }

    /// Backward search from one base until the interval is a singleton,
    /// empties, or the query runs out.
    fn map_position(
        &self,
        query: &[u8],
        index: usize,
        mask: Option<&BitVector>,
    ) -> Result<MapAttempt> {
        let mut result = MapAttempt {
            position: self.index.char_position(query[index])?,
            characters: 1,
            confirmed: false,
        };
        if result.position.is_empty(mask) {
            return Ok(result);
        }
        if result.position.length(mask) == 1 {
            result.confirmed = true;
            return Ok(result);
        }
        for j in (0..index).rev() {
            let next = self.index.extend(result.position, query[j], true)?;
            if next.is_empty(mask) {
                return Ok(result);
            }
            result.position = next;
            result.characters += 1;
            if next.length(mask) == 1 {
                result.confirmed = true;
                return Ok(result);
            }
        }
        Ok(result)
    }

    /// Map every query base to a range of the partition `ranges`: same
    /// restart machine as [`Mapper::map`], but backward extension and a
    /// range-membership uniqueness test. `add_ctx` demands that many
    /// further characters after the interval first becomes range-unique.
    pub fn map_ranges(
        &self,
        ranges: &BitVector,
        query: &[u8],
        mask: Option<&BitVector>,
        min_ctx: u32,
        add_ctx: u32,
    ) -> Result<Vec<RangeMapping>> {
        log::debug!(
            "range-mapping {} bases with minimum context {} and {} additional",
            query.len(),
            min_ctx,
            add_ctx
        );

        let mut mappings = Vec::with_capacity(query.len());
        let mut attempt = MapAttempt::start_over();
        // Context found since uniqueness; -1 so the confirming character
        // brings it to zero.
        let mut extra_context: i64 = -1;
        let mut i = query.len() as i64 - 1;

        while i >= 0 {
            let qi = i as usize;
            if attempt.position.is_empty(mask) {
                attempt = self.map_position_ranges(ranges, query, qi, mask)?;
                extra_context = -1;
            } else {
                attempt.position = self.index.extend(attempt.position, query[qi], true)?;
                attempt.characters += 1;
            }

            let range = attempt.position.range(ranges, mask);
            if attempt.confirmed && range.is_some() {
                extra_context += 1;
            }

            if attempt.confirmed
                && range.is_some()
                && attempt.characters >= min_ctx
                && extra_context >= add_ctx as i64
            {
                mappings.push(RangeMapping {
                    range,
                    context: attempt.characters,
                });
            } else if attempt.confirmed && attempt.position.is_empty(mask) {
                // Too-long right context; retry this base fresh.
                continue;
            } else {
                mappings.push(RangeMapping::unmapped());
                attempt.confirmed = true;
            }
            i -= 1;
        }

        mappings.reverse();
        Ok(mappings)
    }

    /// Forward search from one base until range-unique, empty, or out of
    /// query. Remembers the last range-unique interval seen.
    fn map_position_ranges(
        &self,
        ranges: &BitVector,
        query: &[u8],
        index: usize,
        mask: Option<&BitVector>,
    ) -> Result<MapAttempt> {
        let mut result = MapAttempt {
            position: self.index.char_position(query[index])?,
            characters: 1,
            confirmed: false,
        };
        if result.position.is_empty(mask) {
            return Ok(result);
        }
        if result.position.range(ranges, mask).is_some() {
            result.confirmed = true;
            return Ok(result);
        }
        let mut found = EMPTY_FMD_POSITION;
        for j in index + 1..query.len() {
            let next = self.index.extend(result.position, query[j], false)?;
            if next.is_empty(mask) {
                return Ok(result);
            }
            result.position = next;
            result.characters += 1;
            if next.range(ranges, mask).is_some() {
                result.confirmed = true;
                found = next;
            }
        }
        if result.confirmed {
            result.position = found;
        }
        Ok(result)
    }

    /// Two-sided credit mapping: for each center base, grow context
    /// symmetrically (forward then backward per step) and commit the
    /// earliest range-unique interval found.
    pub fn credit_map(
        &self,
        ranges: &BitVector,
        query: &[u8],
        mask: Option<&BitVector>,
        min_ctx: u32,
    ) -> Result<Vec<CreditMapping>> {
        log::debug!(
            "credit-mapping {} bases with two-sided minimum context {}",
            query.len(),
            min_ctx
        );
        let mut mappings = Vec::with_capacity(query.len());
        for i in (0..query.len()).rev() {
            mappings.push(self.credit_map_position(ranges, query, i, mask, min_ctx)?);
        }
        mappings.reverse();
        Ok(mappings)
    }

    fn credit_map_position(
        &self,
        ranges: &BitVector,
        query: &[u8],
        index: usize,
        mask: Option<&BitVector>,
        min_ctx: u32,
    ) -> Result<CreditMapping> {
        let mut position = self.index.char_position(query[index])?;
        if position.is_empty(mask) {
            return Ok(CreditMapping {
                range: None,
                characters: 0,
                max_characters: 0,
            });
        }

        let mut characters: u32 = 1;
        let mut max_characters: u32 = 1;
        let mut confirmed = false;
        let mut found = EMPTY_FMD_POSITION;
        if position.range(ranges, mask).is_some() {
            confirmed = true;
            found = position;
        }

        let mut step = 1usize;
        while index + step < query.len() && index >= step {
            let forward = self.index.extend(position, query[index + step], false)?;
            if forward.is_empty(mask) {
                break;
            }
            let next = self.index.extend(forward, query[index - step], true)?;
            if next.is_empty(mask) {
                break;
            }
            position = next;
            max_characters += 1;
            match (confirmed, next.range(ranges, mask)) {
                (false, Some(_)) => {
                    confirmed = true;
                    characters = max_characters;
                    found = next;
                }
                (true, _) => {
                    // The earliest unique hit stays committed; only the
                    // examined count grows.
                }
                (false, None) => {
                    characters = max_characters;
                }
            }
            step += 1;
        }

        if confirmed && max_characters >= min_ctx {
            Ok(CreditMapping {
                range: found.range(ranges, mask),
                characters,
                max_characters,
            })
        } else {
            Ok(CreditMapping {
                range: None,
                characters: 0,
                max_characters: 0,
            })
        }
    }

    /// Extend every state of a k-mismatch search by one character.
    /// Match extensions keep their mismatch count; mismatch extensions pay
    /// one, capped at `z_max`. Empty extensions are dropped; an entirely
    /// empty result collapses to the canonical empty state.
    pub fn mismatch_extend(
        &self,
        prev: &MismatchState,
        c: u8,
        backward: bool,
        z_max: u32,
        mask: Option<&BitVector>,
        mode: MismatchExtendMode,
    ) -> Result<MismatchState> {
        debug_assert!(!prev.positions.is_empty(), "state always holds positions");
        if !crate::alphabet::is_base(c) {
            return Err(Error::InvalidBase(c as char));
        }

        let mut positions = Vec::new();
        for &(position, z) in &prev.positions {
            if mode != MismatchExtendMode::MismatchOnly {
                let extended = self.index.extend(position, c, backward)?;
                if extended.length(mask) > 0 {
                    positions.push((extended, z));
                }
            }
            if mode != MismatchExtendMode::MatchOnly && z < z_max {
                for &base in ASCII_BASES.iter() {
                    if base == c {
                        continue;
                    }
                    let extended = self.index.extend(position, base, backward)?;
                    if extended.length(mask) > 0 {
                        positions.push((extended, z + 1));
                    }
                }
            }
        }

        if positions.is_empty() {
            positions.push((EMPTY_FMD_POSITION, 0));
        }
        Ok(MismatchState {
            positions,
            characters: prev.characters,
            max_characters: prev.max_characters,
            confirmed: prev.confirmed,
        })
    }

    /// Map every query base to a range allowing up to `z_max` mismatches
    /// in its context, in split mode: before extending by the true base,
    /// probe whether any mismatched extension of the carried state
    /// survives; if one does, a competing explanation exists and the
    /// search restarts at this position.
    pub fn mismatch_map(
        &self,
        ranges: &BitVector,
        query: &[u8],
        mask: Option<&BitVector>,
        min_ctx: u32,
        add_ctx: u32,
        z_max: u32,
    ) -> Result<Vec<RangeMapping>> {
        log::debug!(
            "mismatch-mapping {} bases with minimum context {}, {} additional, z_max {}",
            query.len(),
            min_ctx,
            add_ctx,
            z_max
        );

        let mut mappings = Vec::with_capacity(query.len());
        let mut search = MismatchState::empty();
        let mut extra_context: i64 = -1;
        let mut i = query.len() as i64 - 1;

        while i >= 0 {
            let qi = i as usize;
            if search.is_empty() {
                log::trace!("starting over by mismatch-mapping position {qi}");
                let (fresh, fresh_extra) =
                    self.mismatch_map_position(ranges, query, qi, min_ctx, add_ctx, z_max, mask)?;
                search = fresh;
                extra_context = fresh_extra;

                // The uniqueness decision waits until the fresh state's
                // range is known.
                let range = search.unique_range(ranges, mask);
                if search.confirmed
                    && range.is_some()
                    && search.characters >= min_ctx
                    && extra_context >= add_ctx as i64
                {
                    mappings.push(RangeMapping {
                        range,
                        context: search.characters,
                    });
                } else {
                    mappings.push(RangeMapping::unmapped());
                    search.confirmed = true;
                }
            } else {
                let probe = self.mismatch_extend(
                    &search,
                    query[qi],
                    true,
                    z_max,
                    mask,
                    MismatchExtendMode::MismatchOnly,
                )?;
                if !probe.is_empty() {
                    // A mismatched context also survives here; the carried
                    // context could mask a competing explanation. Restart.
                    log::trace!("mismatch probe hit at position {qi}, restarting");
                    search = MismatchState::empty();
                    continue;
                }

                search = self.mismatch_extend(
                    &search,
                    query[qi],
                    true,
                    z_max,
                    mask,
                    MismatchExtendMode::MatchOnly,
                )?;
                search.characters += 1;
                search.max_characters += 1;

                if search.is_empty() {
                    // The true-base extension died; retry this base fresh.
                    continue;
                }

                let range = search.unique_range(ranges, mask);
                if search.confirmed && range.is_some() {
                    extra_context += 1;
                }
                if search.confirmed
                    && range.is_some()
                    && search.characters >= min_ctx
                    && extra_context >= add_ctx as i64
                {
                    mappings.push(RangeMapping {
                        range,
                        context: search.characters,
                    });
                } else {
                    mappings.push(RangeMapping::unmapped());
                    search.confirmed = true;
                }
            }
            i -= 1;
        }

        mappings.reverse();
        Ok(mappings)
    }

    /// Fresh forward mismatch search from one base. Returns the state and
    /// the extra-context count past first uniqueness.
    #[allow(clippy::too_many_arguments)]
    fn mismatch_map_position(
        &self,
        ranges: &BitVector,
        query: &[u8],
        index: usize,
        min_ctx: u32,
        add_ctx: u32,
        z_max: u32,
        mask: Option<&BitVector>,
    ) -> Result<(MismatchState, i64)> {
        let mut extra_context: i64 = -1;
        let mut result = MismatchState {
            positions: vec![(self.index.char_position(query[index])?, 0)],
            characters: 1,
            max_characters: 1,
            confirmed: false,
        };
        if result.positions[0].0.is_empty(mask) {
            // The character is absent; the caller will restart downstream.
            result.positions = vec![(EMPTY_FMD_POSITION, 0)];
            result.confirmed = true;
            return Ok((result, extra_context));
        }
        if result.positions[0].0.range(ranges, mask).is_some() {
            extra_context = 0;
            result.confirmed = true;
            return Ok((result, extra_context));
        }

        let mut found: Vec<(FmdPosition, u32)> = Vec::new();
        for j in index + 1..query.len() {
            let next = self.mismatch_extend(
                &result,
                query[j],
                false,
                z_max,
                mask,
                MismatchExtendMode::Both,
            )?;
            if next.is_empty() {
                // Maximal context reached; keep the state only if it is
                // already a single acceptable survivor.
                if result.positions.len() == 1
                    && result.characters >= min_ctx
                    && extra_context >= add_ctx as i64
                {
                    result.confirmed = true;
                    result.characters = result.max_characters;
                    return Ok((result, extra_context));
                }
                return Ok((MismatchState::empty(), extra_context));
            }

            let unique = next.positions.len() == 1
                && next.positions[0].0.range(ranges, mask).is_some();
            if !result.confirmed && unique && result.characters >= min_ctx {
                extra_context = 0;
                result.positions = next.positions;
                result.characters += 1;
                result.max_characters += 1;
                result.confirmed = true;
                found = result.positions.clone();
            } else if result.confirmed && unique {
                extra_context += 1;
                result.positions = next.positions;
                result.max_characters += 1;
            } else {
                result.positions = next.positions;
                result.characters += 1;
                result.max_characters += 1;
            }
        }

        if result.confirmed {
            result.positions = found;
        } else {
            return Ok((MismatchState::empty(), extra_context));
        }
        Ok((result, extra_context))
    }

    /// True when a word occurs exactly once (in the range sense) within
    /// `z_max` mismatches. The mismatch may sit at any word position,
    /// including the seed character.
    pub fn mismatch_count(
        &self,
        ranges: &BitVector,
        word: &[u8],
        z_max: u32,
        mask: Option<&BitVector>,
    ) -> Result<bool> {
        let Some((&last, rest)) = word.split_last() else {
            return Ok(false);
        };
        if !crate::alphabet::is_base(last) {
            return Err(Error::InvalidBase(last as char));
        }

        let mut positions = Vec::new();
        for &base in ASCII_BASES.iter() {
            let z = u32::from(base != last);
            if z > z_max {
                continue;
            }
            let position = self.index.char_position(base)?;
            if position.length(mask) > 0 {
                positions.push((position, z));
            }
        }
        if positions.is_empty() {
            return Ok(false);
        }

        let mut state = MismatchState {
            positions,
            characters: 1,
            max_characters: 1,
            confirmed: false,
        };
        for &c in rest.iter().rev() {
            state = self.mismatch_extend(&state, c, true, z_max, mask, MismatchExtendMode::Both)?;
            if state.is_empty() {
                return Ok(false);
            }
        }
        Ok(state.unique_range(ranges, mask).is_some())
    }
}
