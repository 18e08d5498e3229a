//! Disambiguation and credit propagation over paired mapping vectors.

use fmd_map::bitvec::BitVector;
use fmd_map::credit::CreditFilter;
use fmd_map::index::FmdIndex;
use fmd_map::mapper::{disambiguate, Mapper, Mapping};
use fmd_map::naive::NaiveIndexBuilder;
use fmd_map::position::TextPosition;

/// "CAT" and "GAA" each occur exactly once over both strands (the
/// reverse complement is TTCGCAATG), so positions 2 and 6 can anchor
/// credit.
fn sentinel_index() -> FmdIndex {
    NaiveIndexBuilder::new()
        .contig("seq0", b"CATTGCGAA", 0)
        .build()
        .unwrap()
}

fn row_ranges(index: &FmdIndex) -> BitVector {
    BitVector::ones(index.bwt_length() as usize)
}

fn mapped(text: u64, offset: u64) -> Mapping {
    Mapping {
        location: Some(TextPosition::new(text, offset)),
        ..Default::default()
    }
}

#[test]
fn disambiguate_is_commutative_and_idempotent() {
    let a = mapped(0, 3);
    let b = mapped(0, 5);
    let unmapped = Mapping::unmapped();

    assert_eq!(disambiguate(&a, &a), a);
    assert_eq!(disambiguate(&unmapped, &unmapped), unmapped);
    assert_eq!(disambiguate(&a, &b), disambiguate(&b, &a));
    // Disagreement unmaps.
    assert!(!disambiguate(&a, &b).is_mapped());
    // One-sided knowledge survives.
    assert_eq!(disambiguate(&a, &unmapped).location, a.location);
    assert_eq!(disambiguate(&unmapped, &a).location, a.location);
}

#[test]
fn disambiguate_merges_context_bookkeeping() {
    let left = Mapping {
        location: Some(TextPosition::new(0, 4)),
        left_min_unique: 3,
        left_max_context: 5,
        ..Default::default()
    };
    let right = Mapping {
        location: Some(TextPosition::new(0, 4)),
        right_min_unique: 2,
        right_max_context: 7,
        ..Default::default()
    };
    let combined = disambiguate(&left, &right);
    assert_eq!(combined.location, left.location);
    assert_eq!(combined.left_min_unique, 3);
    assert_eq!(combined.left_max_context, 5);
    assert_eq!(combined.right_min_unique, 2);
    assert_eq!(combined.right_max_context, 7);
}

/// Left/right vectors with sentinels at 2 and 6 whose max contexts span
/// the unmapped interior.
fn sentinel_vectors() -> (Vec<Mapping>, Vec<Mapping>) {
    let mut left = vec![Mapping::unmapped(); 9];
    let mut right = vec![Mapping::unmapped(); 9];
    left[2] = Mapping {
        location: Some(TextPosition::new(0, 2)),
        left_min_unique: 3,
        left_max_context: 3,
        ..Default::default()
    };
    right[2] = Mapping {
        location: Some(TextPosition::new(0, 2)),
        right_min_unique: 3,
        right_max_context: 7,
        ..Default::default()
    };
    left[6] = Mapping {
        location: Some(TextPosition::new(0, 6)),
        left_min_unique: 3,
        left_max_context: 7,
        ..Default::default()
    };
    right[6] = Mapping {
        location: Some(TextPosition::new(0, 6)),
        right_min_unique: 3,
        right_max_context: 3,
        ..Default::default()
    };
    (left, right)
}

#[test]
fn credit_fills_unmapped_interior_bases() {
    let index = sentinel_index();
    let ranges = row_ranges(&index);
    let filter = CreditFilter::new(&index, &ranges, 0);
    let (left, right) = sentinel_vectors();

    let result = filter.apply(&left, &right, b"CATTGCGAA").unwrap();
    assert_eq!(result.len(), 9);

    // Outside the sentinels nothing changes.
    assert!(!result[0].is_mapped());
    assert!(!result[1].is_mapped());
    assert!(!result[7].is_mapped());
    assert!(!result[8].is_mapped());
    assert_eq!(result[2].location, Some(TextPosition::new(0, 2)));
    assert_eq!(result[6].location, Some(TextPosition::new(0, 6)));

    // The interior is implied consistently from both sides.
    for i in 3..6 {
        assert_eq!(
            result[i].location,
            Some(TextPosition::new(0, i as u64)),
            "position {i}"
        );
    }
}

#[test]
fn conflicting_implications_stay_unmapped() {
    let index = sentinel_index();
    let ranges = row_ranges(&index);
    let filter = CreditFilter::new(&index, &ranges, 0);
    let (mut left, mut right) = sentinel_vectors();

    // Move the right-hand anchor somewhere inconsistent: its implications
    // now disagree with the left-hand ones.
    left[6].location = Some(TextPosition::new(0, 7));
    right[6].location = Some(TextPosition::new(0, 7));

    let result = filter.apply(&left, &right, b"CATTGCGAA").unwrap();
    for i in 3..6 {
        assert!(!result[i].is_mapped(), "position {i}");
    }
}

#[test]
fn short_context_cannot_give_credit() {
    let index = sentinel_index();
    let ranges = row_ranges(&index);
    let filter = CreditFilter::new(&index, &ranges, 0);
    let (mut left, mut right) = sentinel_vectors();

    // Clip the anchors' max contexts: a 2-character context covers the
    // anchor base plus one neighbor only.
    right[2].right_max_context = 2;
    left[6].left_max_context = 2;

    let result = filter.apply(&left, &right, b"CATTGCGAA").unwrap();
    // Position 4 is two steps from either anchor and stays out of reach;
    // positions 3 and 5 are each implied by one side.
    assert_eq!(result[3].location, Some(TextPosition::new(0, 3)));
    assert!(!result[4].is_mapped());
    assert_eq!(result[5].location, Some(TextPosition::new(0, 5)));
}

#[test]
fn no_sentinels_passes_disambiguation_through() {
    let index = sentinel_index();
    let ranges = row_ranges(&index);
    let filter = CreditFilter::new(&index, &ranges, 0);

    let left = vec![Mapping::unmapped(); 9];
    let right = vec![Mapping::unmapped(); 9];
    let result = filter.apply(&left, &right, b"CATTGCGAA").unwrap();
    assert!(result.iter().all(|m| !m.is_mapped()));
}

#[test]
fn ambiguous_sentinel_word_is_rejected() {
    // Make the left anchor's word "TT", which occurs more than once, so
    // no left sentinel is found and no credit flows.
    let index = sentinel_index();
    let ranges = row_ranges(&index);
    let filter = CreditFilter::new(&index, &ranges, 0);
    let (mut left, mut right) = sentinel_vectors();
    left[2] = Mapping::unmapped();
    right[2] = Mapping::unmapped();
    left[3] = Mapping {
        location: Some(TextPosition::new(0, 3)),
        left_min_unique: 2, // word "TT" at positions 2..=3
        left_max_context: 2,
        ..Default::default()
    };
    right[3] = Mapping {
        location: Some(TextPosition::new(0, 3)),
        right_min_unique: 2,
        right_max_context: 7,
        ..Default::default()
    };

    let result = filter.apply(&left, &right, b"CATTGCGAA").unwrap();
    // Disambiguation survives but positions 4 and 5 get no credit.
    assert_eq!(result[3].location, Some(TextPosition::new(0, 3)));
    assert!(!result[4].is_mapped());
    assert!(!result[5].is_mapped());
}

#[test]
fn credit_composes_with_real_mapping_output() {
    // End to end: run both one-sided machines, then the filter. On a
    // clean query the filter must not lose anything the mappers found.
    let index = sentinel_index();
    let ranges = row_ranges(&index);
    let mapper = Mapper::new(&index);
    let filter = CreditFilter::new(&index, &ranges, 0);

    let query = b"CATTGCGAA";
    let left = mapper.map_left(query, None, 2).unwrap();
    let right = mapper.map_right(query, None, 2).unwrap();
    let filtered = filter.apply(&left, &right, query).unwrap();

    let direct = mapper.map_both(query, None, 2).unwrap();
    for (i, (f, d)) in filtered.iter().zip(direct.iter()).enumerate() {
        if d.is_mapped() {
            assert_eq!(f.location, d.location, "position {i}");
        }
    }
}
