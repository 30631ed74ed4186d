//! `hf-train`: online margin training (§4.7) over a k-best list scored
//! against a reference set. Distills oracle/k-best pairs per segment via
//! [`hyperforge::train::margin_instances`] and drives one of the margin
//! learners to convergence over a fixed epoch budget.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use hyperforge::io::{kbest, references, weights as weight_io};
use hyperforge::oracle::{self, Hypothesis};
use hyperforge::scorer::{Bleu, BleuScorer, Scorer};
use hyperforge::train::hinge::Hinge;
use hyperforge::train::optimized_hinge::OptimizedHinge;
use hyperforge::train::schedule::Simple;
use hyperforge::train::Learner;
use hyperforge::weight::{IdTable, Weight};

#[derive(Parser, Debug)]
#[command(name = "hf-train", about = "train a weight vector from a scored k-best list")]
struct Args {
    /// k-best file covering every segment; `.gz` suffix reads gzip
    #[arg(long)]
    kbest: PathBuf,

    /// reference-set text file
    #[arg(long)]
    references: PathBuf,

    #[arg(long, value_enum, default_value_t = LearnerKind::Hinge)]
    learner: LearnerKind,

    #[arg(long, default_value_t = 0.01)]
    lambda: f64,

    #[arg(long, default_value_t = 0.1)]
    eta: f64,

    #[arg(long, default_value_t = 10)]
    epochs: usize,

    /// weight-vector output file
    #[arg(long)]
    output: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum LearnerKind {
    Hinge,
    OptimizedHinge,
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

    let kbest_text_is_gz = args.kbest.extension().and_then(|e| e.to_str()) == Some("gz");
    let file = fs::File::open(&args.kbest).context("opening k-best file")?;
    let entries = if kbest_text_is_gz {
        kbest::read_gz(file, &mut table)?
    } else {
        kbest::read_all(file, &mut table)?
    };

    let grouped = group_by_segment(entries);
    let mut segments: Vec<Vec<Hypothesis<Bleu>>> = Vec::with_capacity(grouped.len());
    for (id, candidates) in &grouped {
        let refs = references.get(id).cloned().unwrap_or_default();
        let scorer = BleuScorer::new(refs);
        let hyps = candidates
            .iter()
            .map(|e| Hypothesis::new(e.tokens.clone(), e.features.clone(), scorer.score(&e.tokens)))
            .collect();
        segments.push(hyps);
    }

    let oracle_set = oracle::select(&segments).context("selecting oracle set")?;
    let oracle_hyps: Vec<Vec<Hypothesis<Bleu>>> = segments
        .iter()
        .zip(oracle_set.iter())
        .map(|(segment, ties)| vec![segment[ties[0]].clone()])
        .collect();

    let mut learner: Box<dyn Learner<Bleu>> = match args.learner {
        LearnerKind::Hinge => Box::new(Hinge::new(Simple::new(args.eta), args.lambda)),
        LearnerKind::OptimizedHinge => Box::new(OptimizedHinge::new(Simple::new(args.eta), args.lambda)),
    };

    let mut weights = Weight::new();
    for epoch in 0..args.epochs {
        for (kbest_segment, oracle_segment) in segments.iter().zip(oracle_hyps.iter()) {
            learner.encode(kbest_segment, oracle_segment);
        }
        let objective = learner.learn(&mut weights);
        log::info!("epoch {epoch}: objective {objective:.6}");
    }

    let text = weight_io::write(&weights, &table)?;
    if !hyperforge::confirm_overwrite(&args.output).context("prompting before overwrite")? {
        return Ok(());
    }
    fs::write(&args.output, text).context("writing weights")?;
    hyperforge::report_written(&args.output);
    Ok(())
}
