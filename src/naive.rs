//! Naive index construction for small inputs.
//!
//! Builds the doubled text collection (forward and reverse-complement
//! strand per contig), sorts suffixes outright, and derives the BWT,
//! sampled suffix array, and LCP from the same order. Quadratic-ish and
//! proud of it: this exists so tests and toy references have a ground
//! truth, while real references go through the external builder adapter.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::alphabet::{encode, reverse_complement, SEPARATOR};
use crate::bitvec::BitVector;
use crate::bwt::RankedBwt;
use crate::contigs::{Contig, ContigSet};
use crate::error::Result;
use crate::index::FmdIndex;
use crate::lcp::LcpArray;
use crate::position::TextPosition;
use crate::ssa::SampledSuffixArray;

/// Collects contigs and builds an [`FmdIndex`] or its on-disk file set.
pub struct NaiveIndexBuilder {
    contigs: Vec<Contig>,
    sequences: Vec<Vec<u8>>,
    sample_rate: u64,
}

impl Default for NaiveIndexBuilder {
    fn default() -> Self {
        NaiveIndexBuilder {
            contigs: Vec::new(),
            sequences: Vec::new(),
            sample_rate: 1,
        }
    }
}

struct BuiltParts {
    bwt: RankedBwt,
    ssa: SampledSuffixArray,
    lcp: LcpArray,
    contigs: ContigSet,
    masks: Vec<BitVector>,
}

impl NaiveIndexBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a contig (upper-case ACGT only) assigned to a genome.
    pub fn contig(mut self, name: &str, sequence: &[u8], genome: u64) -> Self {
        self.contigs.push(Contig {
            name: name.to_string(),
            scaffold_start: 0,
            length: sequence.len() as u64,
            genome,
        });
        self.sequences.push(sequence.to_vec());
        self
    }

    /// Override the suffix array sample rate (default 1: every row).
    pub fn sample_rate(mut self, rate: u64) -> Self {
        self.sample_rate = rate;
        self
    }

    fn build_parts(&self) -> Result<BuiltParts> {
        // Lay out the text collection: forward then reverse complement of
        // each contig, each text followed by a separator.
        let mut texts: Vec<Vec<u8>> = Vec::with_capacity(self.sequences.len() * 2);
        for sequence in &self.sequences {
            let forward: Vec<u8> = sequence
                .iter()
                .map(|&b| encode(b))
                .collect::<Result<_>>()?;
            let reverse: Vec<u8> = reverse_complement(sequence)?
                .iter()
                .map(|&b| encode(b))
                .collect::<Result<_>>()?;
            texts.push(forward);
            texts.push(reverse);
        }

        let total: usize = texts.iter().map(|t| t.len() + 1).sum();
        let mut concat = Vec::with_capacity(total);
        let mut coordinates = Vec::with_capacity(total);
        for (text_id, text) in texts.iter().enumerate() {
            for (offset, &code) in text.iter().enumerate() {
                concat.push(code);
                coordinates.push(TextPosition::new(text_id as u64, offset as u64));
            }
            concat.push(SEPARATOR);
            coordinates.push(TextPosition::new(text_id as u64, text.len() as u64));
        }

        // Sort all suffixes of the concatenation.
        let mut sa: Vec<usize> = (0..concat.len()).collect();
        sa.sort_by(|&a, &b| concat[a..].cmp(&concat[b..]));

        // The BWT is the character before each sorted suffix.
        let n = concat.len();
        let bwt_codes: Vec<u8> = sa.iter().map(|&s| concat[(s + n - 1) % n]).collect();
        let row_coordinates: Vec<TextPosition> = sa.iter().map(|&s| coordinates[s]).collect();

        let text_lengths: Vec<u64> = texts.iter().map(|t| t.len() as u64).collect();
        let ssa =
            SampledSuffixArray::from_coordinates(&row_coordinates, &text_lengths, self.sample_rate);
        let lcp = LcpArray::from_suffix_array(&sa, &concat);
        let bwt = RankedBwt::from_codes(bwt_codes);

        let num_genomes = self
            .contigs
            .iter()
            .map(|c| c.genome as usize + 1)
            .max()
            .unwrap_or(0);
        let mut masks = Vec::with_capacity(num_genomes);
        for genome in 0..num_genomes {
            let bits: Vec<bool> = row_coordinates
                .iter()
                .map(|p| self.contigs[p.contig() as usize].genome as usize == genome)
                .collect();
            masks.push(BitVector::from_bools(&bits));
        }

        let contigs = ContigSet::new(self.contigs.clone(), num_genomes)?;
        Ok(BuiltParts {
            bwt,
            ssa,
            lcp,
            contigs,
            masks,
        })
    }

    /// Build an in-memory index.
    pub fn build(&self) -> Result<FmdIndex> {
        let parts = self.build_parts()?;
        FmdIndex::from_parts(parts.bwt, parts.ssa, parts.lcp, parts.contigs, parts.masks)
    }

    /// Write the full on-disk file set for `basename`.
    pub fn write(&self, basename: &Path) -> Result<()> {
        let parts = self.build_parts()?;
        let suffixed = |suffix: &str| -> std::path::PathBuf {
            std::path::PathBuf::from(format!("{}{}", basename.display(), suffix))
        };
        parts.bwt.save(&suffixed(".bwt"))?;
        parts.ssa.save(&suffixed(".ssa"))?;
        parts.lcp.save(&suffixed(".lcp"))?;
        parts.contigs.save(&suffixed(".contigs"))?;

        let mut mask_writer = BufWriter::new(std::fs::File::create(suffixed(".msk"))?);
        for mask in &parts.masks {
            mask.write_to(&mut mask_writer)?;
        }
        mask_writer.flush()?;

        // Mirror the external builder's append log of contig sizes.
        let mut sizes = BufWriter::new(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(suffixed(".chrom.sizes"))?,
        );
        for contig in parts.contigs.iter() {
            writeln!(sizes, "{}\t{}", contig.name, contig.length)?;
        }
        sizes.flush()?;

        log::info!(
            "wrote naive index {} ({} contigs, BWT length {})",
            basename.display(),
            parts.contigs.len(),
            parts.bwt.len()
        );
        Ok(())
    }
}
