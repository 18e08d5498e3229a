//! Longest-common-prefix array with PSV/NSV support.
//!
//! `values[i]` is the length of the longest common prefix between the
//! suffixes at BWT rows `i` and `i - 1` (0 at row 0). PSV and NSV point at
//! the nearest smaller value to the left and right; together they cut out
//! the parent suffix-tree node of any row range, which is what right
//! retraction jumps through.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{Error, Result};

/// LCP values plus precomputed previous/next-smaller-value indices.
pub struct LcpArray {
    values: Vec<u64>,
    psvs: Vec<u64>,
    nsvs: Vec<u64>,
}

impl LcpArray {
    /// Number of entries (equal to the BWT length).
    pub fn len(&self) -> u64 {
        self.values.len() as u64
    }

    /// True if the array is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn check(&self, what: &'static str, index: u64) -> Result<usize> {
        if index >= self.len() {
            return Err(Error::OutOfRange {
                what,
                index,
                len: self.len(),
            });
        }
        Ok(index as usize)
    }

    /// LCP value at a row.
    pub fn get(&self, index: u64) -> Result<u64> {
        Ok(self.values[self.check("LCP", index)?])
    }

    /// Index of the previous smaller value, 0 when none exists.
    pub fn psv(&self, index: u64) -> Result<u64> {
        Ok(self.psvs[self.check("LCP PSV", index)?])
    }

    /// Index of the next smaller value, one past the end when none exists.
    pub fn nsv(&self, index: u64) -> Result<u64> {
        Ok(self.nsvs[self.check("LCP NSV", index)?])
    }

    /// Build the LCP and its PSV/NSV indexes from a suffix array over a
    /// code sequence (separators compare as ordinary symbols).
    pub fn from_suffix_array(sa: &[usize], text: &[u8]) -> Self {
        let n = sa.len();
        let mut values = Vec::with_capacity(n);
        for i in 0..n {
            if i == 0 {
                // Nothing precedes the first suffix; row 0 also serves as
                // the "no smaller value to the left" anchor.
                values.push(0);
                continue;
            }
            let a = &text[sa[i - 1]..];
            let b = &text[sa[i]..];
            let lcp = a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count();
            values.push(lcp as u64);
        }

        // Nearest-smaller-value scans with a stack of candidate indices.
        let mut psvs = vec![0u64; n];
        let mut stack: Vec<usize> = Vec::new();
        for i in 0..n {
            while let Some(&top) = stack.last() {
                if values[top] < values[i] {
                    break;
                }
                stack.pop();
            }
            psvs[i] = stack.last().map(|&j| j as u64).unwrap_or(0);
            stack.push(i);
        }

        let mut nsvs = vec![n as u64; n];
        stack.clear();
        for i in (0..n).rev() {
            while let Some(&top) = stack.last() {
                if values[top] < values[i] {
                    break;
                }
                stack.pop();
            }
            nsvs[i] = stack.last().map(|&j| j as u64).unwrap_or(n as u64);
            stack.push(i);
        }

        LcpArray { values, psvs, nsvs }
    }

    /// Read a `.lcp` file: little-endian u64 count, then the value, PSV,
    /// and NSV arrays in that order.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        let n = u64::from_le_bytes(buf) as usize;
        let mut read_array = |reader: &mut BufReader<File>| -> Result<Vec<u64>> {
            let mut out = Vec::with_capacity(n);
            let mut buf = [0u8; 8];
            for _ in 0..n {
                reader.read_exact(&mut buf)?;
                out.push(u64::from_le_bytes(buf));
            }
            Ok(out)
        };
        let values = read_array(&mut reader)?;
        let psvs = read_array(&mut reader)?;
        let nsvs = read_array(&mut reader)?;
        log::debug!("loaded LCP array of {} entries from {}", n, path.display());
        Ok(LcpArray { values, psvs, nsvs })
    }

    /// Write the `.lcp` layout read back by [`LcpArray::load`].
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(&self.len().to_le_bytes())?;
        for array in [&self.values, &self.psvs, &self.nsvs] {
            for v in array.iter() {
                writer.write_all(&v.to_le_bytes())?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_psv_nsv(values: &[u64]) -> (Vec<u64>, Vec<u64>) {
        let n = values.len();
        let mut psvs = vec![0u64; n];
        let mut nsvs = vec![n as u64; n];
        for i in 0..n {
            for j in (0..i).rev() {
                if values[j] < values[i] {
                    psvs[i] = j as u64;
                    break;
                }
            }
            for (j, &v) in values.iter().enumerate().skip(i + 1) {
                if v < values[i] {
                    nsvs[i] = j as u64;
                    break;
                }
            }
        }
        (psvs, nsvs)
    }

    #[test]
    fn stack_scans_match_reference() {
        // Suffix array of "banana"-like code data is irrelevant here; feed
        // values through the constructor by faking a text whose adjacent
        // suffix LCPs are the ones we want is fiddly, so check the scans
        // directly against the quadratic definition on a built instance.
        let text: Vec<u8> = vec![1, 2, 1, 2, 1, 0];
        let mut sa: Vec<usize> = (0..text.len()).collect();
        sa.sort_by(|&a, &b| text[a..].cmp(&text[b..]));
        let lcp = LcpArray::from_suffix_array(&sa, &text);
        let (psvs, nsvs) = reference_psv_nsv(&lcp.values);
        assert_eq!(lcp.psvs, psvs);
        assert_eq!(lcp.nsvs, nsvs);
    }

    #[test]
    fn lcp_values_of_small_text() {
        // text = ACA$ ; suffixes sorted: $  A$  ACA$  CA$
        let text: Vec<u8> = vec![1, 2, 1, 0];
        let mut sa: Vec<usize> = (0..text.len()).collect();
        sa.sort_by(|&a, &b| text[a..].cmp(&text[b..]));
        assert_eq!(sa, vec![3, 2, 0, 1]);
        let lcp = LcpArray::from_suffix_array(&sa, &text);
        assert_eq!(lcp.values, vec![0, 0, 1, 0]);
    }

    #[test]
    fn out_of_range_is_an_error() {
        let lcp = LcpArray {
            values: vec![0, 1],
            psvs: vec![0, 0],
            nsvs: vec![2, 2],
        };
        assert!(lcp.get(1).is_ok());
        assert!(matches!(lcp.get(2), Err(Error::OutOfRange { .. })));
        assert!(matches!(lcp.psv(5), Err(Error::OutOfRange { .. })));
        assert!(matches!(lcp.nsv(2), Err(Error::OutOfRange { .. })));
    }

    #[test]
    fn save_load_roundtrip() {
        let text: Vec<u8> = vec![4, 1, 4, 1, 4, 0];
        let mut sa: Vec<usize> = (0..text.len()).collect();
        sa.sort_by(|&a, &b| text[a..].cmp(&text[b..]));
        let lcp = LcpArray::from_suffix_array(&sa, &text);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toy.lcp");
        lcp.save(&path).unwrap();
        let back = LcpArray::load(&path).unwrap();
        assert_eq!(back.values, lcp.values);
        assert_eq!(back.psvs, lcp.psvs);
        assert_eq!(back.nsvs, lcp.nsvs);
    }
}
