//! Adapter around the external BWT construction toolchain.
//!
//! For each input FASTA this writes the doubled haplotype file the builder
//! expects (upper-cased sequences and their reverse complements, NUL
//! separated), a parameters file, and then runs `build_rlcsa` as a child
//! process, merging the result into any existing index with `merge_rlcsa`.
//! The temporary working directory is released on every exit path.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use bio::io::fasta;
use flate2::read::GzDecoder;

use crate::alphabet::reverse_complement;
use crate::error::{Error, Result};

const BUILD_COMMAND: &str = "build_rlcsa";
const MERGE_COMMAND: &str = "merge_rlcsa";

/// Builds and extends the on-disk index for one basename.
pub struct IndexBuilder {
    basename: PathBuf,
    threads: usize,
}

/// Open a FASTA path, transparently decompressing `.gz` inputs.
fn open_fasta(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path)?;
    if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

impl IndexBuilder {
    pub fn new(basename: &Path, threads: usize) -> Self {
        IndexBuilder {
            basename: basename.to_path_buf(),
            threads: threads.max(1),
        }
    }

    fn suffixed(&self, suffix: &str) -> PathBuf {
        PathBuf::from(format!("{}{}", self.basename.display(), suffix))
    }

    /// Ingest one FASTA: write its haplotypes, index them with the
    /// external builder, and merge into the running index.
    pub fn add(&self, fasta_path: &Path) -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let haplotype_path = temp_dir.path().join("haplotypes");

        log::info!(
            "adding {} to index {}",
            fasta_path.display(),
            self.basename.display()
        );

        {
            let mut haplotypes = BufWriter::new(File::create(&haplotype_path)?);
            let mut sizes = BufWriter::new(
                fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(self.suffixed(".chrom.sizes"))?,
            );

            let reader = fasta::Reader::new(open_fasta(fasta_path)?);
            for record in reader.records() {
                let record = record.map_err(|e| {
                    Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
                })?;
                let sequence: Vec<u8> =
                    record.seq().iter().map(|b| b.to_ascii_uppercase()).collect();

                // Forward and reverse-complement strands, each
                // NUL-terminated.
                haplotypes.write_all(&sequence)?;
                haplotypes.write_all(&[0])?;
                haplotypes.write_all(&reverse_complement(&sequence)?)?;
                haplotypes.write_all(&[0])?;

                writeln!(sizes, "{}\t{}", record.id(), sequence.len())?;
            }
            haplotypes.flush()?;
            sizes.flush()?;
        }

        // The builder reads its configuration from a sidecar parameters
        // file next to its input.
        let mut parameters = BufWriter::new(File::create(
            temp_dir.path().join("haplotypes.rlcsa.parameters"),
        )?);
        writeln!(parameters, "RLCSA_BLOCK_SIZE = 32")?;
        writeln!(parameters, "SAMPLE_RATE = 1")?;
        writeln!(parameters, "SUPPORT_DISPLAY = 1")?;
        writeln!(parameters, "SUPPORT_LOCATE = 1")?;
        writeln!(parameters, "WEIGHTED_SAMPLES = 0")?;
        parameters.flush()?;
        drop(parameters);

        self.run(
            Command::new(BUILD_COMMAND)
                .arg(&haplotype_path)
                .arg(self.threads.to_string()),
            BUILD_COMMAND,
        )?;

        self.merge(&haplotype_path)?;

        // temp_dir drops here, releasing the working directory; the same
        // happens on every early error return above.
        Ok(())
    }

    /// Merge a freshly built partial index into the running index, or
    /// adopt it wholesale if none exists yet.
    fn merge(&self, other_basename: &Path) -> Result<()> {
        let array = self.suffixed(".rlcsa.array");
        if array.exists() {
            self.run(
                Command::new(MERGE_COMMAND)
                    .arg(&self.basename)
                    .arg(other_basename)
                    .arg(self.threads.to_string()),
                MERGE_COMMAND,
            )
        } else {
            for suffix in [".rlcsa.array", ".rlcsa.parameters", ".rlcsa.sa_samples"] {
                let from = PathBuf::from(format!("{}{}", other_basename.display(), suffix));
                fs::copy(&from, self.suffixed(suffix))?;
            }
            Ok(())
        }
    }

    fn run(&self, command: &mut Command, name: &str) -> Result<()> {
        log::debug!("running {command:?}");
        let status = command.status().map_err(|e| Error::IndexBuildFailed {
            command: name.to_string(),
            status: e.to_string(),
        })?;
        if !status.success() {
            return Err(Error::IndexBuildFailed {
                command: format!("{command:?}"),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}
