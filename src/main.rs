use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use protein_fm::io::fasta::read_proteins;
use protein_fm::{IndexConfig, MassTable, MatchingOptions, MatchingPolicy, ProteinIndex, ProteinMapping, Tag};

// jemalloc：多线程批量查询时分配更快
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(
    name = "protein-fm",
    author,
    version,
    about = "Map peptides and sequence tags onto a protein FASTA database",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Map peptides exactly or with ambiguity expansion
    Map {
        /// Protein FASTA database
        database: PathBuf,
        /// Peptides to map
        peptides: Vec<String>,
        /// File with one peptide per line
        #[arg(long = "peptides-file")]
        peptides_file: Option<PathBuf>,
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Map sequence tags such as `[97.05]TIDE[156.10]` with a mass tolerance
    Tag {
        /// Protein FASTA database
        database: PathBuf,
        /// Tags to map (bracket syntax or JSON)
        tags: Vec<String>,
        /// File with one tag per line
        #[arg(long = "tags-file")]
        tags_file: Option<PathBuf>,
        /// Mass tolerance in Da
        #[arg(long, default_value_t = 0.02)]
        tolerance: f64,
        #[command(flatten)]
        query: QueryArgs,
    },
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Residue matching policy
    #[arg(long, value_enum, default_value_t = MatchingPolicy::Exact)]
    policy: MatchingPolicy,
    /// Largest fraction of X accepted in a peptide (non-exact policies)
    #[arg(long = "limit-x", default_value_t = 0.25)]
    limit_x: f64,
    #[arg(short = 't', long = "threads", default_value_t = 1)]
    threads: usize,
    /// Print one JSON object per query instead of TSV
    #[arg(long)]
    json: bool,
    /// Output path (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

impl QueryArgs {
    fn options(&self) -> MatchingOptions {
        MatchingOptions { policy: self.policy, limit_x: self.limit_x }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("protein_fm=debug,info")
    } else {
        EnvFilter::new("protein_fm=warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Map { database, peptides, peptides_file, query } => {
            let peptides = collect_queries(peptides, peptides_file.as_deref())?;
            run_map(&database, &peptides, &query)
        }
        Commands::Tag { database, tags, tags_file, tolerance, query } => {
            let tags = collect_queries(tags, tags_file.as_deref())?;
            run_tag(&database, &tags, tolerance, &query)
        }
    }
}

/// Command-line queries followed by those read from `file`; blank and `#` lines are skipped.
fn collect_queries(mut queries: Vec<String>, file: Option<&Path>) -> Result<Vec<String>> {
    if let Some(path) = file {
        let fh = std::fs::File::open(path).with_context(|| format!("cannot open query file '{}'", path.display()))?;
        for line in std::io::BufReader::new(fh).lines() {
            let line = line.with_context(|| format!("cannot read query file '{}'", path.display()))?;
            let line = line.trim();
            if !line.is_empty() && !line.starts_with('#') {
                queries.push(line.to_string());
            }
        }
    }
    if queries.is_empty() {
        anyhow::bail!("no queries given");
    }
    Ok(queries)
}

fn load_index(database: &Path, config: &IndexConfig) -> Result<ProteinIndex> {
    let proteins = read_proteins(database)?;
    if proteins.is_empty() {
        anyhow::bail!("FASTA file '{}' contains no sequences", database.display());
    }
    if proteins.iter().all(|(_, seq)| seq.is_empty()) {
        anyhow::bail!("FASTA file '{}' contains only empty sequences", database.display());
    }

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("invalid progress bar template")?
            .progress_chars("█▓▒░  "),
    );
    pb.set_message("building index");
    let index = ProteinIndex::build(
        proteins.iter().map(|(acc, seq)| (acc.as_str(), seq.as_slice())),
        MassTable::default(),
        config,
        &pb,
    )
    .with_context(|| format!("cannot index '{}'", database.display()))?;
    pb.finish_and_clear();
    Ok(index)
}

fn run_map(database: &Path, peptides: &[String], args: &QueryArgs) -> Result<()> {
    // 肽段映射只需要正向索引
    let config = IndexConfig { build_reverse: false, ..IndexConfig::default() };
    let index = load_index(database, &config)?;
    let options = args.options();

    let pool = thread_pool(args.threads)?;
    let results = pool.install(|| {
        peptides
            .par_iter()
            .map(|p| index.map_peptide(p, &options))
            .collect::<protein_fm::Result<Vec<_>>>()
    })?;

    write_results(peptides, &results, args)
}

fn run_tag(database: &Path, tags: &[String], tolerance: f64, args: &QueryArgs) -> Result<()> {
    let parsed = tags
        .iter()
        .map(|t| t.parse::<Tag>().with_context(|| format!("cannot parse tag '{}'", t)))
        .collect::<Result<Vec<_>>>()?;

    let index = load_index(database, &IndexConfig::default())?;
    let options = args.options();

    let pool = thread_pool(args.threads)?;
    let results = pool.install(|| {
        parsed
            .par_iter()
            .map(|tag| index.map_tag(tag.elements(), &options, tolerance))
            .collect::<protein_fm::Result<Vec<_>>>()
    })?;

    let labels: Vec<String> = parsed.iter().map(Tag::to_string).collect();
    write_results(&labels, &results, args)
}

fn thread_pool(threads: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .context("failed to build thread pool")
}

#[derive(Serialize)]
struct QueryReport<'a> {
    query: &'a str,
    peptides: BTreeMap<&'a str, BTreeMap<&'a str, &'a [usize]>>,
}

impl<'a> QueryReport<'a> {
    fn new(query: &'a str, mapping: &'a ProteinMapping) -> Self {
        let peptides = mapping
            .iter()
            .map(|(peptide, hits)| {
                let per_protein = hits.iter().map(|(acc, offsets)| (acc.as_str(), offsets.as_slice())).collect();
                (peptide.as_str(), per_protein)
            })
            .collect();
        Self { query, peptides }
    }
}

fn write_results(queries: &[String], results: &[ProteinMapping], args: &QueryArgs) -> Result<()> {
    let mut out: Box<dyn Write> = if let Some(p) = &args.out {
        let fh = std::fs::File::create(p).with_context(|| format!("cannot create output '{}'", p.display()))?;
        Box::new(std::io::BufWriter::new(fh))
    } else {
        Box::new(std::io::BufWriter::new(std::io::stdout()))
    };

    if !args.json {
        writeln!(out, "query\tpeptide\taccession\toffset")?;
    }
    let mut mapped = 0usize;
    for (query, mapping) in queries.iter().zip(results) {
        if !mapping.is_empty() {
            mapped += 1;
        }
        let report = QueryReport::new(query, mapping);
        if args.json {
            serde_json::to_writer(&mut out, &report)?;
            writeln!(out)?;
            continue;
        }
        for (peptide, hits) in &report.peptides {
            for (accession, offsets) in hits {
                for offset in offsets.iter() {
                    writeln!(out, "{}\t{}\t{}\t{}", query, peptide, accession, offset)?;
                }
            }
        }
    }
    out.flush()?;
    info!(queries = queries.len(), mapped, "mapping finished");
    Ok(())
}
