//! Rank/select bit vector used for genome masks and range partitions.
//!
//! Plain blocked layout: raw 64-bit words plus a cumulative rank sample per
//! 512-bit block. Rank is a sample lookup plus at most eight popcounts;
//! select binary-searches the samples and scans one block. Serialization is
//! the little-endian layout consumed back by [`BitVector::read_from`], which
//! is how `.msk` files store one mask per genome.

use std::io::{self, Read, Write};

const WORDS_PER_BLOCK: usize = 8;
const BITS_PER_BLOCK: usize = WORDS_PER_BLOCK * 64;

/// An immutable bit vector with O(1) rank and near-O(1) select.
#[derive(Clone)]
pub struct BitVector {
    words: Vec<u64>,
    /// Ones before each block, with one trailing entry holding the total.
    block_ranks: Vec<u64>,
    len: usize,
}

impl std::fmt::Debug for BitVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitVector")
            .field("len", &self.len)
            .field("ones", &self.count_ones())
            .finish()
    }
}

impl BitVector {
    /// Build from raw words; bits at `len` and beyond are ignored.
    pub fn from_words(mut words: Vec<u64>, len: usize) -> Self {
        let needed = len.div_ceil(64);
        words.resize(needed, 0);
        // Mask out any stray bits past the end so popcounts stay honest.
        if len % 64 != 0 {
            if let Some(last) = words.last_mut() {
                *last &= (1u64 << (len % 64)) - 1;
            }
        }
        let num_blocks = needed.div_ceil(WORDS_PER_BLOCK);
        let mut block_ranks = Vec::with_capacity(num_blocks + 1);
        let mut total = 0u64;
        for block in 0..num_blocks {
            block_ranks.push(total);
            let start = block * WORDS_PER_BLOCK;
            let end = (start + WORDS_PER_BLOCK).min(words.len());
            for &w in &words[start..end] {
                total += w.count_ones() as u64;
            }
        }
        block_ranks.push(total);
        BitVector {
            words,
            block_ranks,
            len,
        }
    }

    /// Build a vector of `len` zeros with ones at the given positions.
    pub fn from_positions(len: usize, positions: &[usize]) -> Self {
        let mut words = vec![0u64; len.div_ceil(64)];
        for &p in positions {
            debug_assert!(p < len);
            words[p / 64] |= 1u64 << (p % 64);
        }
        Self::from_words(words, len)
    }

    /// Build from a boolean slice.
    pub fn from_bools(bits: &[bool]) -> Self {
        let mut words = vec![0u64; bits.len().div_ceil(64)];
        for (i, &b) in bits.iter().enumerate() {
            if b {
                words[i / 64] |= 1u64 << (i % 64);
            }
        }
        Self::from_words(words, bits.len())
    }

    /// Build an all-ones vector.
    pub fn ones(len: usize) -> Self {
        Self::from_words(vec![u64::MAX; len.div_ceil(64)], len)
    }

    /// Total number of bits.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the vector has length zero.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total number of set bits.
    pub fn count_ones(&self) -> usize {
        *self.block_ranks.last().unwrap_or(&0) as usize
    }

    /// Bit at position `i`, false when out of range.
    pub fn get(&self, i: usize) -> bool {
        if i >= self.len {
            return false;
        }
        self.words[i / 64] & (1u64 << (i % 64)) != 0
    }

    /// Number of set bits in `[0, i)`. Clamped at the length.
    pub fn rank1(&self, i: usize) -> usize {
        let i = i.min(self.len);
        if i == 0 {
            return 0;
        }
        let block = i / BITS_PER_BLOCK;
        let mut rank = self.block_ranks[block] as usize;
        let first_word = block * WORDS_PER_BLOCK;
        let last_word = i / 64;
        for w in first_word..last_word {
            rank += self.words[w].count_ones() as usize;
        }
        let tail = i % 64;
        if tail != 0 {
            rank += (self.words[last_word] & ((1u64 << tail) - 1)).count_ones() as usize;
        }
        rank
    }

    /// Number of set bits in the inclusive range `[a, b]`.
    pub fn ones_in(&self, a: usize, b: usize) -> usize {
        if b < a {
            return 0;
        }
        self.rank1(b + 1) - self.rank1(a)
    }

    /// Position of the k-th set bit (0-indexed), if it exists.
    pub fn select1(&self, k: usize) -> Option<usize> {
        if k >= self.count_ones() {
            return None;
        }
        let target = (k + 1) as u64;
        // Find the block whose cumulative rank first reaches the target.
        let mut lo = 0usize;
        let mut hi = self.block_ranks.len() - 1;
        while lo < hi {
            let mid = (lo + hi) / 2;
            if self.block_ranks[mid + 1] < target {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        let block = lo;
        let mut remaining = (target - self.block_ranks[block]) as usize;
        let first_word = block * WORDS_PER_BLOCK;
        for w in first_word..(first_word + WORDS_PER_BLOCK).min(self.words.len()) {
            let ones = self.words[w].count_ones() as usize;
            if ones >= remaining {
                let mut word = self.words[w];
                for _ in 1..remaining {
                    word &= word - 1; // clear lowest set bit
                }
                return Some(w * 64 + word.trailing_zeros() as usize);
            }
            remaining -= ones;
        }
        None
    }

    /// First set bit at or after `i`, returned with its rank, or None if no
    /// set bit remains.
    pub fn value_after(&self, i: usize) -> Option<(usize, usize)> {
        let rank = self.rank1(i);
        self.select1(rank).map(|pos| (pos, rank))
    }

    /// Serialize as little-endian length, word count, and raw words.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&(self.len as u64).to_le_bytes())?;
        writer.write_all(&(self.words.len() as u64).to_le_bytes())?;
        for w in &self.words {
            writer.write_all(&w.to_le_bytes())?;
        }
        Ok(())
    }

    /// Deserialize a vector written by [`BitVector::write_to`].
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        let len = u64::from_le_bytes(buf) as usize;
        reader.read_exact(&mut buf)?;
        let num_words = u64::from_le_bytes(buf) as usize;
        if num_words != len.div_ceil(64) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("bit vector of {len} bits cannot have {num_words} words"),
            ));
        }
        let mut words = Vec::with_capacity(num_words);
        for _ in 0..num_words {
            reader.read_exact(&mut buf)?;
            words.push(u64::from_le_bytes(buf));
        }
        Ok(Self::from_words(words, len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_and_get_small() {
        let bv = BitVector::from_positions(10, &[0, 3, 9]);
        assert!(bv.get(0));
        assert!(!bv.get(1));
        assert!(bv.get(9));
        assert!(!bv.get(10));
        assert_eq!(bv.rank1(0), 0);
        assert_eq!(bv.rank1(1), 1);
        assert_eq!(bv.rank1(4), 2);
        assert_eq!(bv.rank1(10), 3);
        assert_eq!(bv.rank1(100), 3);
        assert_eq!(bv.ones_in(1, 9), 2);
        assert_eq!(bv.ones_in(3, 3), 1);
    }

    #[test]
    fn select_inverts_rank() {
        let positions = [1usize, 63, 64, 120, 511, 512, 700, 1023];
        let bv = BitVector::from_positions(1024, &positions);
        for (k, &p) in positions.iter().enumerate() {
            assert_eq!(bv.select1(k), Some(p));
            assert_eq!(bv.rank1(p), k);
        }
        assert_eq!(bv.select1(positions.len()), None);
    }

    #[test]
    fn value_after_walks_forward() {
        let bv = BitVector::from_positions(600, &[5, 70, 520]);
        assert_eq!(bv.value_after(0), Some((5, 0)));
        assert_eq!(bv.value_after(5), Some((5, 0)));
        assert_eq!(bv.value_after(6), Some((70, 1)));
        assert_eq!(bv.value_after(71), Some((520, 2)));
        assert_eq!(bv.value_after(521), None);
    }

    #[test]
    fn ones_vector() {
        let bv = BitVector::ones(77);
        assert_eq!(bv.count_ones(), 77);
        assert_eq!(bv.rank1(77), 77);
        assert_eq!(bv.select1(76), Some(76));
    }

    #[test]
    fn serialization_roundtrip() {
        let bv = BitVector::from_positions(1000, &[0, 13, 512, 999]);
        let mut bytes = Vec::new();
        bv.write_to(&mut bytes).unwrap();
        let back = BitVector::read_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(back.len(), 1000);
        for i in 0..1000 {
            assert_eq!(back.get(i), bv.get(i));
        }
    }

    #[test]
    fn random_rank_matches_naive() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let bits: Vec<bool> = (0..2000).map(|_| rng.gen_bool(0.3)).collect();
        let bv = BitVector::from_bools(&bits);
        let mut naive = 0usize;
        for i in 0..bits.len() {
            assert_eq!(bv.rank1(i), naive, "rank mismatch at {i}");
            if bits[i] {
                assert_eq!(bv.select1(naive), Some(i));
                naive += 1;
            }
        }
        assert_eq!(bv.count_ones(), naive);
    }
}
