//! oracle selector (§4.6): greedy hill-climb over per-segment k-best lists
//! that approximately maximizes corpus-level reward.

use rand::seq::SliceRandom;

use crate::error::{Error, Result};
use crate::feature::FeatureMap;
use crate::scorer::Statistic;
use crate::ORACLE_MAX_ROUNDS;

/// a decoded candidate (§3 "Hypothesis"): its token yield, the feature map
/// it accrued under some rescored hypergraph, and the scorer statistic of
/// its yield against the segment's references. `loss` is cached at
/// construction so callers don't recompute it on every comparison.
#[derive(Debug, Clone)]
pub struct Hypothesis<S: Statistic> {
    pub tokens: Vec<String>,
    pub features: FeatureMap,
    pub stat: S,
    pub loss: f64,
}

impl<S: Statistic> Hypothesis<S> {
    pub fn new(tokens: Vec<String>, features: FeatureMap, stat: S) -> Self {
        let loss = stat.loss();
        Self {
            tokens,
            features,
            stat,
            loss,
        }
    }
}

/// oracle indices for every segment, tie-preserving: a segment whose
/// best-reward candidates tie all appear in its entry.
pub type OracleSet = Vec<Vec<usize>>;

/// greedy hill-climb oracle selection. returns the tie-preserving oracle
/// set from whichever round produced the best corpus-level reward.
pub fn select<S: Statistic>(segments: &[Vec<Hypothesis<S>>]) -> Result<OracleSet> {
    if segments.is_empty() {
        return Err(Error::InvalidConfig(
            "oracle selection requires at least one segment".into(),
        ));
    }
    for segment in segments {
        if segment.is_empty() {
            return Err(Error::InvalidConfig(
                "every segment needs at least one hypothesis".into(),
            ));
        }
    }

    let mut selected: Vec<usize> = vec![0; segments.len()];
    let mut corpus = sum_selected(segments, &selected);

    let mut best_reward = corpus.reward();
    let mut best_ties: OracleSet = selected.iter().map(|&i| vec![i]).collect();

    let mut order: Vec<usize> = (0..segments.len()).collect();
    let mut rng = rand::rng();

    for _ in 0..ORACLE_MAX_ROUNDS {
        order.shuffle(&mut rng);
        let mut changed = false;
        let mut round_ties: OracleSet = vec![Vec::new(); segments.len()];

        for &s in &order {
            let mut residual = corpus.clone();
            residual -= segments[s][selected[s]].stat.clone();

            let mut best_reward_s = f64::NEG_INFINITY;
            let mut best_h = selected[s];
            let mut ties = Vec::new();
            for (h, hyp) in segments[s].iter().enumerate() {
                let mut candidate = residual.clone();
                candidate += hyp.stat.clone();
                let reward = candidate.reward();
                if reward > best_reward_s + 1e-12 {
                    best_reward_s = reward;
                    best_h = h;
                    ties.clear();
                    ties.push(h);
                } else if (reward - best_reward_s).abs() <= 1e-12 {
                    ties.push(h);
                }
            }

            if best_h != selected[s] {
                changed = true;
            }
            selected[s] = best_h;
            round_ties[s] = ties;

            corpus = residual;
            corpus += segments[s][best_h].stat.clone();
        }

        if corpus.reward() > best_reward {
            best_reward = corpus.reward();
            best_ties = round_ties;
        }

        if !changed {
            break;
        }
    }

    Ok(best_ties)
}

fn sum_selected<S: Statistic>(segments: &[Vec<Hypothesis<S>>], selected: &[usize]) -> S {
    let mut iter = segments
        .iter()
        .zip(selected.iter())
        .map(|(segment, &i)| segment[i].stat.clone());
    let mut total = iter.next().expect("at least one segment");
    for stat in iter {
        total += stat;
    }
    total
}
