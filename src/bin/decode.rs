//! `hf-decode`: extract a k-best list from an already-rescored hypergraph
//! under a weight vector. Feature-function rescoring itself is an external
//! collaborator's job (§1); this front-end assumes the input hypergraph's
//! edge features are already final and only needs to score, rank, and
//! emit derivations.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use hyperforge::algorithms::{no_duplicate_filter, KBest};
use hyperforge::hypergraph::Edge;
use hyperforge::io::{hypergraph, kbest, weights as weight_io};
use hyperforge::semiring::Tropical;
use hyperforge::weight::IdTable;

#[derive(Parser, Debug)]
#[command(name = "hf-decode", about = "extract a k-best list from a rescored hypergraph")]
struct Args {
    /// hypergraph text file (§6 record format)
    #[arg(long)]
    hypergraph: PathBuf,

    /// weight-vector text file
    #[arg(long)]
    weights: PathBuf,

    /// number of derivations to extract per segment
    #[arg(long, default_value_t = 1)]
    size: usize,

    /// segment id to attach to every emitted entry
    #[arg(long, default_value = "0")]
    id: String,

    /// output k-best file; `.gz` suffix writes gzip
    #[arg(long)]
    output: PathBuf,
}

fn yield_of<'g>(edge: Edge<'g>, tails: &[&Vec<String>]) -> Vec<String> {
    if tails.is_empty() {
        match edge.rule() {
            Some(rule) => rule.split_whitespace().map(String::from).collect(),
            None => Vec::new(),
        }
    } else {
        tails.iter().flat_map(|t| t.iter().cloned()).collect()
    }
}

fn main() -> Result<()> {
    hyperforge::init();
    let args = Args::parse();

    let mut table = IdTable::new();
    let graph_text = fs::read_to_string(&args.hypergraph).context("reading hypergraph")?;
    let mut graph = hypergraph::read(&graph_text, &mut table).context("parsing hypergraph")?;
    if !graph.is_topologically_sorted() {
        graph.topological_sort().context("sorting hypergraph")?;
    }
    graph.validate().context("validating hypergraph")?;

    let weights_text = fs::read_to_string(&args.weights).context("reading weights")?;
    let weight = weight_io::parse(&weights_text, &mut table).context("parsing weights")?;

    let extractor = KBest::new(
        &graph,
        |edge: Edge| Tropical::new(weight.dot(edge.features())),
        yield_of,
        no_duplicate_filter,
    )?;

    let mut entries = Vec::with_capacity(args.size);
    for k in 0..args.size {
        match extractor.get(k) {
            Ok((tokens, _score)) => entries.push(kbest::Entry {
                id: args.id.clone(),
                tokens,
                features: hyperforge::feature::FeatureMap::new(),
            }),
            Err(hyperforge::Error::Exhausted) => break,
            Err(e) => return Err(e.into()),
        }
    }

    log::info!("extracted {} derivations for segment {}", entries.len(), args.id);

    if !hyperforge::confirm_overwrite(&args.output).context("prompting before overwrite")? {
        return Ok(());
    }
    let file = fs::File::create(&args.output).context("creating output file")?;
    if args.output.extension().and_then(|e| e.to_str()) == Some("gz") {
        kbest::write_gz(&entries, &table, file)?;
    } else {
        kbest::write_all(&entries, &table, file)?;
    }
    hyperforge::report_written(&args.output);
    Ok(())
}
