//! `hf-mert`: line search along a fixed direction (§4.9). Two modes mirror
//! the two algorithms the core ships: `envelope` builds the full per-segment
//! k-best envelope (needed for BLEU-like corpus statistics), `subgradient`
//! sweeps the cheaper piecewise-linear hinge variant.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use hyperforge::io::{kbest, references, weights as weight_io};
use hyperforge::mert::{envelope_optimum, subgradient_optimum, SegmentEnvelope};
use hyperforge::oracle::{self, Hypothesis};
use hyperforge::scorer::{Bleu, BleuScorer, Scorer};
use hyperforge::train::margin_instances;
use hyperforge::weight::IdTable;

#[derive(Parser, Debug)]
#[command(name = "hf-mert", about = "line search a weight vector along a fixed direction")]
struct Args {
    #[arg(long)]
    kbest: PathBuf,

    #[arg(long)]
    references: PathBuf,

    /// current weight vector (the line-search origin)
    #[arg(long)]
    origin: PathBuf,

    /// weight vector whose difference from `origin` gives the search direction
    #[arg(long)]
    target: PathBuf,

    #[arg(long, value_enum, default_value_t = Mode::Envelope)]
    mode: Mode,

    #[arg(long, default_value_t = -1.0)]
    k_min: f64,

    #[arg(long, default_value_t = 1.0)]
    k_max: f64,

    #[arg(long)]
    output: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Envelope,
    Subgradient,
}

fn group_by_segment(entries: Vec<kbest::Entry>) -> Vec<(String, Vec<kbest::Entry>)> {
    let mut order = Vec::new();
    let mut segments: BTreeMap<String, Vec<kbest::Entry>> = BTreeMap::new();
    for entry in entries {
        if !segments.contains_key(&entry.id) {
            order.push(entry.id.clone());
        }
        segments.entry(entry.id.clone()).or_default().push(entry);
    }
    order.into_iter().map(|id| (id.clone(), segments.remove(&id).unwrap())).collect()
}

fn main() -> Result<()> {
    hyperforge::init();
    let args = Args::parse();

    let mut table = IdTable::new();
    let references_text = fs::read_to_string(&args.references).context("reading references")?;
    let references = references::parse(&references_text).context("parsing references")?;

    let file = fs::File::open(&args.kbest).context("opening k-best file")?;
    let is_gz = args.kbest.extension().and_then(|e| e.to_str()) == Some("gz");
    let entries = if is_gz { kbest::read_gz(file, &mut table)? } else { kbest::read_all(file, &mut table)? };
    let grouped = group_by_segment(entries);

    let origin = weight_io::parse(&fs::read_to_string(&args.origin).context("reading origin")?, &mut table)?;
    let target = weight_io::parse(&fs::read_to_string(&args.target).context("reading target")?, &mut table)?;
    let direction = hyperforge::feature::FeatureMap::from(
        origin
            .inner()
            .keys()
            .chain(target.inner().keys())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .map(|&id| (id, target.get(id) - origin.get(id)))
            .collect::<BTreeMap<_, _>>(),
    );

    let mut segments: Vec<Vec<Hypothesis<Bleu>>> = Vec::with_capacity(grouped.len());
    for (id, candidates) in &grouped {
        let refs = references.get(id).cloned().unwrap_or_default();
        let scorer = BleuScorer::new(refs);
        segments.push(
            candidates
                .iter()
                .map(|e| Hypothesis::new(e.tokens.clone(), e.features.clone(), scorer.score(&e.tokens)))
                .collect(),
        );
    }

    let k = match args.mode {
        Mode::Envelope => {
            let envelopes: Vec<SegmentEnvelope<Bleu>> = segments
                .iter()
                .map(|segment| {
                    let pairs: Vec<_> = segment.iter().map(|h| (h.features.clone(), h.stat.clone())).collect();
                    SegmentEnvelope::build(&pairs, &origin, &direction)
                })
                .collect();
            let (lower, upper, objective) =
                envelope_optimum(&envelopes, args.k_min, args.k_max, &hyperforge::mert::Penalty::None);
            log::info!("optimal plateau [{lower}, {upper}], objective {objective:.6}");
            lower
        }
        Mode::Subgradient => {
            let oracle_set = oracle::select(&segments).context("selecting oracle set")?;
            let mut instances = Vec::new();
            for (segment, ties) in segments.iter().zip(oracle_set.iter()) {
                let oracle_hyps = vec![segment[ties[0]].clone()];
                instances.extend(margin_instances(segment, &oracle_hyps));
            }
            subgradient_optimum(&instances, &origin, &direction, args.k_min, args.k_max)
        }
    };

    log::info!("selected step k = {k:.6}");
    let mut chosen = origin;
    chosen.add_scaled(&direction, k);
    if !hyperforge::confirm_overwrite(&args.output).context("prompting before overwrite")? {
        return Ok(());
    }
    fs::write(&args.output, weight_io::write(&chosen, &table)?).context("writing weights")?;
    hyperforge::report_written(&args.output);
    Ok(())
}
