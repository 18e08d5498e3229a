//! fmd-map: a bidirectional FMD-index over DNA sequence collections.
//!
//! The index holds every contig together with its reverse complement and
//! answers, for each base of a query, where in the reference a uniquely
//! occurring surrounding context places it. Index construction is done by
//! an external builder ([`builder::IndexBuilder`] wraps it); querying is
//! fully load-resident and reentrant.
//!
//! ## Example
//! ```
//! use fmd_map::mapper::Mapper;
//! use fmd_map::naive::NaiveIndexBuilder;
//!
//! let index = NaiveIndexBuilder::new()
//!     .contig("seq0", b"ACGGTCAT", 0)
//!     .build()
//!     .unwrap();
//! let mapper = Mapper::new(&index);
//! let mappings = mapper.map_both(b"GGTCA", None, 2).unwrap();
//! assert!(mappings.iter().all(|m| m.is_mapped()));
//! ```

pub mod alphabet;
pub mod bitvec;
pub mod builder; // External BWT builder adapter (child process + merge)
pub mod bwt;
pub mod contigs;
pub mod credit; // Disambiguation + credit propagation filter
pub mod error;
pub mod index; // FmdIndex: loading plus the search primitives
pub mod interval;
pub mod lcp;
pub mod mapper; // Mapping state machines
pub mod naive; // Naive small-input construction (tests, toy references)
pub mod position;
pub mod ssa;
