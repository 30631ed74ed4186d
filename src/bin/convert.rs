//! `hf-convert`: format conversions and validation for the text I/O
//! formats (§6) — k-best plain/gzip, hypergraph round-trip validation,
//! and lattice distance reporting.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use hyperforge::io::{hypergraph, kbest, lattice};
use hyperforge::weight::IdTable;

#[derive(Parser, Debug)]
#[command(name = "hf-convert", about = "convert between the core's text I/O formats")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// re-emit a k-best list, switching between plain text and gzip by file extension
    Kbest {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// parse a hypergraph record and report its node/edge counts
    Hypergraph {
        #[arg(long)]
        input: PathBuf,
    },
    /// parse a lattice and report its shortest/longest path distance
    Lattice {
        #[arg(long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    hyperforge::init();
    let args = Args::parse();

    match args.command {
        Command::Kbest { input, output } => {
            let mut table = IdTable::new();
            let input_is_gz = input.extension().and_then(|e| e.to_str()) == Some("gz");
            let reader = fs::File::open(&input).context("opening input")?;
            let entries = if input_is_gz {
                kbest::read_gz(reader, &mut table)?
            } else {
                kbest::read_all(reader, &mut table)?
            };

            if !hyperforge::confirm_overwrite(&output).context("prompting before overwrite")? {
                return Ok(());
            }
            let output_is_gz = output.extension().and_then(|e| e.to_str()) == Some("gz");
            let writer = fs::File::create(&output).context("creating output")?;
            if output_is_gz {
                kbest::write_gz(&entries, &table, writer)?;
            } else {
                kbest::write_all(&entries, &table, writer)?;
            }
            log::info!("converted {} entries", entries.len());
            hyperforge::report_written(&output);
        }
        Command::Hypergraph { input } => {
            let mut table = IdTable::new();
            let text = fs::read_to_string(&input).context("reading hypergraph")?;
            let graph = hypergraph::read(&text, &mut table).context("parsing hypergraph")?;
            graph.validate().context("validating hypergraph")?;
            println!(
                "nodes={} edges={} sorted={} goal={}",
                graph.node_count(),
                graph.edge_count(),
                graph.is_topologically_sorted(),
                graph.goal().map(|g| g.index().to_string()).unwrap_or_else(|| "none".into())
            );
        }
        Command::Lattice { input } => {
            let text = fs::read_to_string(&input).context("reading lattice")?;
            let parsed = lattice::parse(&text).context("parsing lattice")?;
            println!(
                "positions={} shortest={} longest={}",
                parsed.positions.len(),
                parsed.shortest_distance(),
                parsed.longest_distance()
            );
        }
    }
    Ok(())
}
