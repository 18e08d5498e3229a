//! Contig metadata: names, scaffold starts, lengths, and genome assignment.
//!
//! Loaded from the `.contigs` sidecar, one tab-separated record per contig
//! in contig-number order. The genome assignment is inverted into
//! contiguous per-genome contig ranges at load time.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::position::TextPosition;

/// One contig record from the `.contigs` file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contig {
    pub name: String,
    /// Start of the contig on its source scaffold.
    pub scaffold_start: u64,
    pub length: u64,
    pub genome: u64,
}

/// All contigs of an index plus derived lookup tables.
pub struct ContigSet {
    contigs: Vec<Contig>,
    /// Bases in all contigs before each contig.
    cumulative: Vec<u64>,
    /// Per-genome `[first, last)` contig ranges.
    genome_ranges: Vec<(usize, usize)>,
}

impl ContigSet {
    /// Assemble from records; `num_genomes` is the number of masks that
    /// exist, used to reject out-of-range genome assignments.
    pub fn new(contigs: Vec<Contig>, num_genomes: usize) -> Result<Self> {
        let mut cumulative = Vec::with_capacity(contigs.len());
        let mut sum = 0u64;
        for contig in &contigs {
            cumulative.push(sum);
            sum += contig.length;
        }

        let mut genome_ranges = vec![(0usize, 0usize); num_genomes];
        let mut current: Option<(u64, usize)> = None;
        for (i, contig) in contigs.iter().enumerate() {
            if contig.genome as usize >= num_genomes {
                return Err(Error::GenomeOverflow {
                    name: contig.name.clone(),
                    genome: contig.genome,
                    masks: num_genomes,
                });
            }
            match current {
                Some((genome, start)) if genome == contig.genome => {
                    genome_ranges[genome as usize] = (start, i + 1);
                }
                _ => {
                    current = Some((contig.genome, i));
                    genome_ranges[contig.genome as usize] = (i, i + 1);
                }
            }
        }

        Ok(ContigSet {
            contigs,
            cumulative,
            genome_ranges,
        })
    }

    /// Parse a `.contigs` file.
    pub fn load(path: &Path, num_genomes: usize) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut contigs = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split('\t');
            let parse = |field: Option<&str>, what: &str| -> Result<String> {
                field.map(str::to_string).ok_or_else(|| {
                    Error::Io(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("{}:{}: missing {what}", path.display(), lineno + 1),
                    ))
                })
            };
            let name = parse(fields.next(), "contig name")?;
            let number = |field: Option<&str>, what: &str| -> Result<u64> {
                parse(field, what)?.parse().map_err(|e| {
                    Error::Io(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("{}:{}: bad {what}: {e}", path.display(), lineno + 1),
                    ))
                })
            };
            contigs.push(Contig {
                name,
                scaffold_start: number(fields.next(), "scaffold start")?,
                length: number(fields.next(), "contig length")?,
                genome: number(fields.next(), "genome id")?,
            });
        }
        log::info!(
            "loaded {} contigs in {} genomes from {}",
            contigs.len(),
            num_genomes,
            path.display()
        );
        Self::new(contigs, num_genomes)
    }

    /// Write the `.contigs` layout read back by [`ContigSet::load`].
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        for c in &self.contigs {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}",
                c.name, c.scaffold_start, c.length, c.genome
            )?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }

    pub fn contig(&self, index: usize) -> &Contig {
        &self.contigs[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contig> {
        self.contigs.iter()
    }

    /// Bases in all contigs before the given contig.
    pub fn cumulative_length(&self, index: usize) -> u64 {
        self.cumulative[index]
    }

    /// Total bases over both strands of every contig.
    pub fn total_length(&self) -> u64 {
        self.contigs.iter().map(|c| c.length).sum::<u64>() * 2
    }

    /// The `[first, last)` contig range of a genome.
    pub fn genome_contigs(&self, genome: usize) -> (usize, usize) {
        self.genome_ranges[genome]
    }

    /// 1-based offset of a position from the left end of its forward
    /// strand, whichever strand it is addressed on.
    pub fn strand_offset(&self, position: TextPosition) -> u64 {
        let length = self.contig(position.contig() as usize).length;
        if position.is_reverse() {
            length - position.offset
        } else {
            position.offset + 1
        }
    }

    /// Display name of a position: `N{contig}B{offset}`, 1-based.
    pub fn position_name(&self, position: TextPosition) -> String {
        format!("N{}B{}", position.contig(), self.strand_offset(position))
    }

    /// Global 0-based number of the base among all forward-strand bases.
    pub fn base_id(&self, position: TextPosition) -> u64 {
        self.cumulative_length(position.contig() as usize) + self.strand_offset(position) - 1
    }
}
