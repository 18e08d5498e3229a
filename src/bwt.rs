//! Rank-queryable BWT string: the L-column plus the structures backward
//! search needs.
//!
//! Occurrence counts are checkpointed every 64 symbols and finished with a
//! short scan, the same shape as the checkpointed occurrence tables the
//! big aligners use. The F-column is represented only by its prefix counts
//! (the C-table).

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::alphabet::{decode, ALPHABET, SEPARATOR};
use crate::error::{Error, Result};

const OCC_BLOCK: usize = 64;

/// BWT L-column with rank support.
pub struct RankedBwt {
    /// Symbol codes, 0 = separator, 1..=4 = A, C, G, T.
    data: Vec<u8>,
    /// `pc[c]` = number of BWT symbols with code < c.
    pc: [u64; ALPHABET],
    /// Cumulative symbol counts before each 64-symbol block.
    checkpoints: Vec<[u64; ALPHABET]>,
}

impl RankedBwt {
    /// Build rank structures over a code sequence.
    pub fn from_codes(data: Vec<u8>) -> Self {
        let mut totals = [0u64; ALPHABET];
        let num_blocks = data.len().div_ceil(OCC_BLOCK);
        let mut checkpoints = Vec::with_capacity(num_blocks);
        for (i, &code) in data.iter().enumerate() {
            if i % OCC_BLOCK == 0 {
                checkpoints.push(totals);
            }
            totals[code as usize] += 1;
        }
        if data.is_empty() {
            checkpoints.push(totals);
        }
        let mut pc = [0u64; ALPHABET];
        let mut below = 0u64;
        for c in 0..ALPHABET {
            pc[c] = below;
            below += totals[c];
        }
        RankedBwt {
            data,
            pc,
            checkpoints,
        }
    }

    /// Total number of BWT symbols (separators included).
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// True if the BWT holds no symbols.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of symbols with code strictly less than `code`.
    #[inline]
    pub fn pc(&self, code: u8) -> u64 {
        self.pc[code as usize]
    }

    /// Total occurrences of one code.
    #[inline]
    pub fn symbol_count(&self, code: u8) -> u64 {
        let c = code as usize;
        if c + 1 < ALPHABET {
            self.pc[c + 1] - self.pc[c]
        } else {
            self.len() - self.pc[c]
        }
    }

    /// Code at a BWT row.
    #[inline]
    pub fn code_at(&self, row: u64) -> u8 {
        self.data[row as usize]
    }

    /// Occurrences of `code` in rows `[0, i]` inclusive; `i = -1` yields 0.
    pub fn occ(&self, code: u8, i: i64) -> u64 {
        if i < 0 {
            return 0;
        }
        let i = i as usize;
        debug_assert!(i < self.data.len());
        let block = i / OCC_BLOCK;
        let mut count = self.checkpoints[block][code as usize];
        for &c in &self.data[block * OCC_BLOCK..=i] {
            count += (c == code) as u64;
        }
        count
    }

    /// Occurrence counts of the whole alphabet in rows `[0, i]` inclusive.
    pub fn full_occ(&self, i: i64) -> [u64; ALPHABET] {
        if i < 0 {
            return [0; ALPHABET];
        }
        let i = i as usize;
        debug_assert!(i < self.data.len());
        let block = i / OCC_BLOCK;
        let mut counts = self.checkpoints[block];
        for &c in &self.data[block * OCC_BLOCK..=i] {
            counts[c as usize] += 1;
        }
        counts
    }

    /// LF-mapping: the row holding the previous character of the same text.
    pub fn lf(&self, row: u64) -> u64 {
        let code = self.code_at(row);
        self.pc(code) + self.occ(code, row as i64) - 1
    }

    /// Read a `.bwt` file: little-endian u64 length, then one byte per
    /// symbol (0 for the separator, ASCII otherwise).
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        let len = u64::from_le_bytes(buf) as usize;
        let mut raw = vec![0u8; len];
        reader.read_exact(&mut raw)?;
        let mut data = Vec::with_capacity(len);
        for b in raw {
            let code = match b {
                0 => SEPARATOR,
                b'A' => 1,
                b'C' => 2,
                b'G' => 3,
                b'T' => 4,
                other => {
                    return Err(Error::Io(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("unexpected symbol {other:#04x} in {}", path.display()),
                    )))
                }
            };
            data.push(code);
        }
        log::debug!(
            "loaded BWT of {} symbols from {}",
            data.len(),
            path.display()
        );
        Ok(Self::from_codes(data))
    }

    /// Write the `.bwt` layout read back by [`RankedBwt::load`].
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(&self.len().to_le_bytes())?;
        for &code in &self.data {
            let byte = if code == SEPARATOR { 0 } else { decode(code) };
            writer.write_all(&[byte])?;
        }
        writer.flush()?;
        Ok(())
    }
}
