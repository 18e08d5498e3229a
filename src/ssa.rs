//! Sampled suffix array: resolves a BWT row to a (text, offset) coordinate.
//!
//! Sampled rows are marked in a bit vector and carry an explicit
//! coordinate; any other row is resolved by LF-walking to the nearest
//! sampled row and adding back the steps taken. Text-start boundaries are
//! always sampled, so a walk never crosses from one text into another.
//! With the builder's `SAMPLE_RATE = 1` every row is sampled and locate is
//! a table lookup.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::bitvec::BitVector;
use crate::bwt::RankedBwt;
use crate::error::{Error, Result};
use crate::position::TextPosition;

/// Sampled suffix array with LF-walk fallback.
pub struct SampledSuffixArray {
    rate: u64,
    marked: BitVector,
    samples: Vec<TextPosition>,
}

impl SampledSuffixArray {
    /// Assemble from a full suffix array given per-row coordinates.
    ///
    /// `coordinates[i]` is the (text, offset) of BWT row `i`, where the
    /// offset of a text's separator equals the text length. Rows whose
    /// offset is a multiple of `rate`, and every separator row, are kept.
    pub fn from_coordinates(coordinates: &[TextPosition], text_lengths: &[u64], rate: u64) -> Self {
        assert!(rate > 0, "sample rate must be positive");
        let mut positions = Vec::new();
        let mut samples = Vec::new();
        for (row, pos) in coordinates.iter().enumerate() {
            let is_separator = pos.offset == text_lengths[pos.text as usize];
            if pos.offset % rate == 0 || is_separator {
                positions.push(row);
                samples.push(*pos);
            }
        }
        SampledSuffixArray {
            rate,
            marked: BitVector::from_positions(coordinates.len(), &positions),
            samples,
        }
    }

    /// Sample rate this array was built with.
    pub fn rate(&self) -> u64 {
        self.rate
    }

    /// Resolve a BWT row to its coordinate.
    pub fn locate(&self, bwt: &RankedBwt, row: u64) -> Result<TextPosition> {
        if row >= bwt.len() {
            return Err(Error::OutOfRange {
                what: "locate",
                index: row,
                len: bwt.len(),
            });
        }
        let mut current = row;
        let mut steps = 0u64;
        while !self.marked.get(current as usize) {
            current = bwt.lf(current);
            steps += 1;
        }
        let sample = self.samples[self.marked.rank1(current as usize)];
        Ok(TextPosition {
            text: sample.text,
            offset: sample.offset + steps,
        })
    }

    /// Read a `.ssa` file: little-endian u64 rate, u64 sample count, the
    /// marked-row bit vector, then (text, offset) u64 pairs in rank order.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        let rate = u64::from_le_bytes(buf);
        reader.read_exact(&mut buf)?;
        let count = u64::from_le_bytes(buf) as usize;
        let marked = BitVector::read_from(&mut reader)?;
        let mut samples = Vec::with_capacity(count);
        for _ in 0..count {
            reader.read_exact(&mut buf)?;
            let text = u64::from_le_bytes(buf);
            reader.read_exact(&mut buf)?;
            let offset = u64::from_le_bytes(buf);
            samples.push(TextPosition { text, offset });
        }
        log::debug!(
            "loaded sampled suffix array ({} samples, rate {}) from {}",
            count,
            rate,
            path.display()
        );
        Ok(SampledSuffixArray {
            rate,
            marked,
            samples,
        })
    }

    /// Write the `.ssa` layout read back by [`SampledSuffixArray::load`].
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(&self.rate.to_le_bytes())?;
        writer.write_all(&(self.samples.len() as u64).to_le_bytes())?;
        self.marked.write_to(&mut writer)?;
        for s in &self.samples {
            writer.write_all(&s.text.to_le_bytes())?;
            writer.write_all(&s.offset.to_le_bytes())?;
        }
        writer.flush()?;
        Ok(())
    }
}
