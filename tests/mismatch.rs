//! k-mismatch extension and mapping: searches that tolerate a bounded
//! number of substitutions in the context.

use fmd_map::bitvec::BitVector;
use fmd_map::index::FmdIndex;
use fmd_map::mapper::{Mapper, MismatchExtendMode, MismatchState};
use fmd_map::naive::NaiveIndexBuilder;
use fmd_map::position::TextPosition;

fn single_contig_index() -> FmdIndex {
    NaiveIndexBuilder::new()
        .contig("seq0", b"ACGGTCAT", 0)
        .build()
        .unwrap()
}

fn row_ranges(index: &FmdIndex) -> BitVector {
    BitVector::ones(index.bwt_length() as usize)
}

/// Walk a whole query backward in bulk mode and return the final state.
fn bulk_extend(mapper: &Mapper, index: &FmdIndex, query: &[u8], z_max: u32) -> MismatchState {
    let seed = index.char_position(query[query.len() - 1]).unwrap();
    let mut state = MismatchState {
        positions: vec![(seed, 0)],
        characters: 1,
        max_characters: 1,
        confirmed: false,
    };
    for &c in query[..query.len() - 1].iter().rev() {
        state = mapper
            .mismatch_extend(&state, c, true, z_max, None, MismatchExtendMode::Both)
            .unwrap();
    }
    state
}

#[test]
fn one_substitution_still_finds_the_reference() {
    let index = single_contig_index();
    let mapper = Mapper::new(&index);

    // The query differs from the contig at position 6 (A -> G). With one
    // mismatch allowed, exactly one explanation survives the whole query.
    let state = bulk_extend(&mapper, &index, b"ACGGTCGT", 1);
    assert_eq!(state.positions.len(), 1);
    let (position, z) = state.positions[0];
    assert_eq!(z, 1);
    assert_eq!(position.length(None), 1);
    assert_eq!(
        index.locate(position.forward_start as u64).unwrap(),
        TextPosition::new(0, 0)
    );
}

#[test]
fn exact_search_dies_without_mismatch_budget() {
    let index = single_contig_index();
    let mapper = Mapper::new(&index);
    let state = bulk_extend(&mapper, &index, b"ACGGTCGT", 0);
    assert!(state.is_empty());
}

#[test]
fn mismatch_budget_multiplies_explanations() {
    let index = single_contig_index();
    let mapper = Mapper::new(&index);
    // "CA" is exact-unique, but with one mismatch "CC" and "CG" (on the
    // reverse strand) also survive.
    let exact = bulk_extend(&mapper, &index, b"CA", 0);
    assert_eq!(exact.positions.len(), 1);
    let fuzzy = bulk_extend(&mapper, &index, b"CA", 1);
    assert_eq!(fuzzy.positions.len(), 3);
}

#[test]
fn mismatch_count_verifies_word_uniqueness() {
    let index = single_contig_index();
    let mapper = Mapper::new(&index);
    let ranges = row_ranges(&index);

    assert!(mapper.mismatch_count(&ranges, b"CAT", 0, None).unwrap());
    assert!(mapper.mismatch_count(&ranges, b"GGTC", 0, None).unwrap());
    // "CGT" on the reverse strand is one substitution away from "CAT".
    assert!(!mapper.mismatch_count(&ranges, b"CAT", 1, None).unwrap());
    // A single ambiguous character is never unique.
    assert!(!mapper.mismatch_count(&ranges, b"T", 0, None).unwrap());
    // Absent words are not unique either.
    assert!(!mapper.mismatch_count(&ranges, b"TTT", 0, None).unwrap());
    assert!(!mapper.mismatch_count(&ranges, b"", 0, None).unwrap());
}

#[test]
fn mismatch_map_short_query() {
    let index = single_contig_index();
    let mapper = Mapper::new(&index);
    let ranges = row_ranges(&index);

    // Exact mode: "CA" pins position 0, the trailing "A" stays ambiguous.
    let exact = mapper
        .mismatch_map(&ranges, b"CA", None, 1, 0, 0)
        .unwrap();
    assert_eq!(exact.len(), 2);
    assert!(exact[0].range.is_some());
    assert_eq!(exact[0].context, 2);
    assert!(exact[1].range.is_none());

    // One mismatch of budget admits "CC" and "CG" as competing
    // explanations, so nothing is unique any more.
    let fuzzy = mapper
        .mismatch_map(&ranges, b"CA", None, 1, 0, 1)
        .unwrap();
    assert!(fuzzy.iter().all(|m| m.range.is_none()));
}

#[test]
fn mismatch_map_with_zero_budget_maps_the_same_positions() {
    let index = single_contig_index();
    let mapper = Mapper::new(&index);
    let ranges = row_ranges(&index);

    // The two machines choose different committed intervals (the mismatch
    // machine commits its earliest unique state), but with no mismatch
    // budget they must agree on which positions map at all.
    let plain = mapper
        .map_ranges(&ranges, b"ACGGTCAT", None, 1, 0)
        .unwrap();
    let mismatch = mapper
        .mismatch_map(&ranges, b"ACGGTCAT", None, 1, 0, 0)
        .unwrap();
    assert_eq!(plain.len(), mismatch.len());
    for (i, (a, b)) in plain.iter().zip(mismatch.iter()).enumerate() {
        assert_eq!(a.range.is_some(), b.range.is_some(), "position {i}");
    }
}

#[test]
fn mismatch_map_places_a_substituted_query() {
    let index = single_contig_index();
    let mapper = Mapper::new(&index);
    let ranges = row_ranges(&index);

    // Same substituted query as the bulk test. The left half of the query
    // maps into the contig's row despite the mismatch at position 6.
    let mappings = mapper
        .mismatch_map(&ranges, b"ACGGTCGT", None, 1, 0, 1)
        .unwrap();
    assert_eq!(mappings.len(), 8);

    let full_row = index.count(b"ACGGTCAT").unwrap().forward_start as u64;
    assert_eq!(mappings[0].range, Some(full_row));
    assert_eq!(mappings[0].context, 8);
    for i in 1..=4 {
        assert!(mappings[i].range.is_some(), "position {i}");
    }
    for i in 5..8 {
        assert!(mappings[i].range.is_none(), "position {i}");
    }
}
