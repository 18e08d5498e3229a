use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;

use fmd_map::builder::IndexBuilder;
use fmd_map::index::FmdIndex;
use fmd_map::mapper::Mapper;

#[derive(Parser)]
#[command(name = "fmd-map")]
#[command(about = "Bidirectional FMD-index builder and unique-context mapper", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose level: 1=error, 2=warning, 3=message, 4+=debugging
    #[arg(short = 'v', long, value_name = "INT", default_value = "3", global = true)]
    verbosity: i32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build or extend an index from reference FASTA files
    Index {
        /// Prefix for the index file set
        #[arg(value_name = "BASENAME")]
        basename: PathBuf,

        /// Input FASTA file(s), optionally gzipped
        #[arg(value_name = "REF.FA", required = true)]
        fasta: Vec<PathBuf>,

        /// Number of threads for the external builder
        #[arg(short = 't', long, value_name = "INT")]
        threads: Option<usize>,
    },

    /// Map query sequences against an index
    Map {
        /// Index prefix (built with 'index')
        #[arg(value_name = "BASENAME")]
        basename: PathBuf,

        /// Query FASTA file
        #[arg(value_name = "QUERY.FA")]
        query: PathBuf,

        /// Minimum context length for a mapping to count
        #[arg(short = 'c', long, value_name = "INT", default_value = "20")]
        min_context: u32,

        /// Restrict mapping to one genome's contigs
        #[arg(short = 'g', long, value_name = "INT")]
        genome: Option<usize>,

        /// Output TSV file (default: stdout)
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Number of threads (default: all available cores)
        #[arg(short = 't', long, value_name = "INT")]
        threads: Option<usize>,
    },
}

fn init_logging(verbosity: i32) {
    let level = match verbosity {
        v if v <= 1 => log::LevelFilter::Error,
        2 => log::LevelFilter::Warn,
        3 => log::LevelFilter::Info,
        4 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn read_queries(path: &PathBuf) -> io::Result<Vec<(String, Vec<u8>)>> {
    let file: Box<dyn Read> = Box::new(std::fs::File::open(path)?);
    let reader = bio::io::fasta::Reader::new(file);
    let mut queries = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        queries.push((record.id().to_string(), record.seq().to_vec()));
    }
    Ok(queries)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    match cli.command {
        Commands::Index {
            basename,
            fasta,
            threads,
        } => {
            let threads = threads.unwrap_or_else(num_cpus::get);
            let builder = IndexBuilder::new(&basename, threads);
            for path in &fasta {
                if let Err(e) = builder.add(path) {
                    log::error!("indexing {} failed: {}", path.display(), e);
                    std::process::exit(1);
                }
            }
            log::info!("indexed {} file(s) into {}", fasta.len(), basename.display());
        }

        Commands::Map {
            basename,
            query,
            min_context,
            genome,
            output,
            threads,
        } => {
            let num_threads = threads.unwrap_or_else(num_cpus::get).max(1);
            if let Err(e) = rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()
            {
                log::warn!("failed to configure thread pool: {e}");
            }
            log::info!("using {} thread(s)", num_threads);

            let index = match FmdIndex::load(&basename) {
                Ok(index) => index,
                Err(e) => {
                    log::error!("loading {} failed: {}", basename.display(), e);
                    std::process::exit(1);
                }
            };
            if let Some(g) = genome {
                if g >= index.num_genomes() {
                    log::error!(
                        "genome {} requested but the index has {} genomes",
                        g,
                        index.num_genomes()
                    );
                    std::process::exit(1);
                }
            }

            let queries = match read_queries(&query) {
                Ok(queries) => queries,
                Err(e) => {
                    log::error!("reading {} failed: {}", query.display(), e);
                    std::process::exit(1);
                }
            };

            // Queries are independent; map them in parallel and emit in
            // input order.
            let results: Vec<_> = queries
                .par_iter()
                .map(|(name, sequence)| {
                    let mapper = Mapper::new(&index);
                    let mask = genome.map(|g| index.genome_mask(g));
                    let mappings = mapper.map_both(sequence, mask, min_context)?;
                    Ok((name, sequence, mappings))
                })
                .collect::<fmd_map::error::Result<Vec<_>>>()
                .unwrap_or_else(|e| {
                    log::error!("mapping failed: {e}");
                    std::process::exit(1);
                });

            let sink: Box<dyn Write> = match output {
                Some(path) => match std::fs::File::create(&path) {
                    Ok(file) => Box::new(file),
                    Err(e) => {
                        log::error!("creating {} failed: {}", path.display(), e);
                        std::process::exit(1);
                    }
                },
                None => Box::new(io::stdout()),
            };
            let mut writer = BufWriter::new(sink);

            let mut mapped_bases = 0usize;
            let mut total_bases = 0usize;
            for (name, sequence, mappings) in &results {
                for (i, mapping) in mappings.iter().enumerate() {
                    total_bases += 1;
                    let place = match mapping.location {
                        Some(location) => {
                            mapped_bases += 1;
                            index.contigs().position_name(location)
                        }
                        None => "*".to_string(),
                    };
                    if let Err(e) = writeln!(
                        writer,
                        "{}\t{}\t{}\t{}",
                        name, i, sequence[i] as char, place
                    ) {
                        log::error!("writing output failed: {e}");
                        std::process::exit(1);
                    }
                }
            }
            if let Err(e) = writer.flush() {
                log::error!("writing output failed: {e}");
                std::process::exit(1);
            }
            log::info!("mapped {}/{} query bases", mapped_bases, total_bases);
        }
    }
}
