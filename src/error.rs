//! Error types for index loading, searching, and building.

use thiserror::Error;

/// Error variants for FMD-index operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A mapping retraction reached pattern length zero, meaning a base in
    /// the query does not occur anywhere in the index.
    #[error("no results at zero pattern length: is {base:?} missing from the index?")]
    MissingAlphabet { base: char },

    /// An extension was requested with a character outside {A, C, G, T}.
    #[error("character {0:?} is not a DNA base")]
    InvalidBase(char),

    /// An LCP / PSV / NSV / locate access walked off the end of the BWT.
    #[error("{what} index {index} out of range for BWT of length {len}")]
    OutOfRange {
        what: &'static str,
        index: u64,
        len: u64,
    },

    /// A contig declares a genome id with no corresponding mask.
    #[error("contig {name:?} belongs to genome {genome} but only {masks} genome masks are present")]
    GenomeOverflow {
        name: String,
        genome: u64,
        masks: usize,
    },

    /// The external index builder exited with a nonzero status.
    #[error("index build command {command:?} failed with {status}")]
    IndexBuildFailed { command: String, status: String },

    /// An I/O error occurred during load or build.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for FMD-index operations.
pub type Result<T> = std::result::Result<T, Error>;
