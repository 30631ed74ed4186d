use std::collections::HashMap;
use std::ops::{AddAssign, SubAssign};

use crate::error::{Error, Result};

use super::{Scorer, Statistic};

const ORDERS: usize = 4;
const SMOOTH_BASE: f64 = crate::BLEU_SMOOTH;

/// BLEU statistic (§3/§4.5): per-order matched/hypothesis n-gram counts
/// plus a reference length, additive over segments.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bleu {
    pub matched: [u64; ORDERS],
    pub hypothesis: [u64; ORDERS],
    pub reference_length: u64,
}

impl Bleu {
    pub fn new(matched: [u64; ORDERS], hypothesis: [u64; ORDERS], reference_length: u64) -> Self {
        Self {
            matched,
            hypothesis,
            reference_length,
        }
    }

    /// geometric-mean precision with NIST-style smoothing: a zero matched
    /// count at order n is replaced by a constant that starts at
    /// [`crate::BLEU_SMOOTH`] and shrinks geometrically (×0.1) for each
    /// further consecutive zero-matched order, so higher orders are
    /// penalized more than the first one that fails to match at all.
    fn geometric_precision(&self) -> Option<f64> {
        let mut log_sum = 0.0;
        let mut active_orders = 0;
        let mut smoothing = SMOOTH_BASE;
        for n in 0..ORDERS {
            if self.hypothesis[n] == 0 {
                continue;
            }
            active_orders += 1;
            let precision = if self.matched[n] == 0 {
                let value = smoothing / self.hypothesis[n] as f64;
                smoothing *= 0.1;
                value
            } else {
                self.matched[n] as f64 / self.hypothesis[n] as f64
            };
            log_sum += precision.ln();
        }
        if active_orders == 0 {
            None
        } else {
            Some((log_sum / active_orders as f64).exp())
        }
    }

    fn brevity_penalty(&self) -> f64 {
        let hyp_len = self.hypothesis[0];
        if hyp_len == 0 {
            return 0.0;
        }
        if hyp_len >= self.reference_length {
            1.0
        } else {
            (1.0 - self.reference_length as f64 / hyp_len as f64).exp()
        }
    }

    fn score(&self) -> f64 {
        match self.geometric_precision() {
            Some(precision) => self.brevity_penalty() * precision,
            None => 0.0,
        }
    }
}

impl AddAssign for Bleu {
    fn add_assign(&mut self, rhs: Self) {
        for n in 0..ORDERS {
            self.matched[n] += rhs.matched[n];
            self.hypothesis[n] += rhs.hypothesis[n];
        }
        self.reference_length += rhs.reference_length;
    }
}

impl SubAssign for Bleu {
    fn sub_assign(&mut self, rhs: Self) {
        for n in 0..ORDERS {
            self.matched[n] = self.matched[n].saturating_sub(rhs.matched[n]);
            self.hypothesis[n] = self.hypothesis[n].saturating_sub(rhs.hypothesis[n]);
        }
        self.reference_length = self.reference_length.saturating_sub(rhs.reference_length);
    }
}

impl Statistic for Bleu {
    fn loss(&self) -> f64 {
        (1.0 - self.score()).clamp(0.0, 1.0)
    }

    fn reward(&self) -> f64 {
        self.score()
    }

    fn encode(&self) -> String {
        format!(
            "bleu {} {} {} {} {} {} {} {} {}",
            self.matched[0],
            self.matched[1],
            self.matched[2],
            self.matched[3],
            self.hypothesis[0],
            self.hypothesis[1],
            self.hypothesis[2],
            self.hypothesis[3],
            self.reference_length
        )
    }

    fn decode(text: &str) -> Result<Self> {
        let mut tokens = text.split_whitespace();
        if tokens.next() != Some("bleu") {
            return Err(Error::ParseError(format!("not a bleu statistic: {text:?}")));
        }
        let mut next = |what: &str| -> Result<u64> {
            tokens
                .next()
                .ok_or_else(|| Error::ParseError(format!("bleu statistic missing {what}")))?
                .parse::<u64>()
                .map_err(|e| Error::ParseError(format!("bleu statistic {what}: {e}")))
        };
        let mut matched = [0u64; ORDERS];
        let mut hypothesis = [0u64; ORDERS];
        for m in matched.iter_mut() {
            *m = next("matched count")?;
        }
        for h in hypothesis.iter_mut() {
            *h = next("hypothesis count")?;
        }
        let reference_length = next("reference length")?;
        Ok(Self {
            matched,
            hypothesis,
            reference_length,
        })
    }
}

/// counts n-gram matches of a hypothesis against one or more references
/// (§6: "multiple references per id allowed"), clipping each n-gram's
/// matched count to the maximum count it attains in any single reference
/// (standard corpus-BLEU clipping) and choosing the closest reference
/// length as the effective reference length.
pub struct BleuScorer {
    references: Vec<Vec<String>>,
}

impl BleuScorer {
    pub fn new(references: Vec<Vec<String>>) -> Self {
        Self { references }
    }

    fn closest_length(&self, hyp_len: usize) -> u64 {
        self.references
            .iter()
            .map(|r| r.len())
            .min_by_key(|&len| (len as i64 - hyp_len as i64).abs())
            .unwrap_or(0) as u64
    }
}

fn ngram_counts(tokens: &[String], n: usize) -> HashMap<&[String], u64> {
    let mut counts = HashMap::new();
    if n == 0 || tokens.len() < n {
        return counts;
    }
    for window in tokens.windows(n) {
        *counts.entry(window).or_insert(0) += 1;
    }
    counts
}

impl Scorer for BleuScorer {
    type Stat = Bleu;

    fn score(&self, hypothesis: &[String]) -> Bleu {
        let hypothesis = hypothesis.to_vec();
        let mut matched = [0u64; ORDERS];
        let mut hyp_counts = [0u64; ORDERS];

        for n in 1..=ORDERS {
            let hyp_ngrams = ngram_counts(&hypothesis, n);
            hyp_counts[n - 1] = hyp_ngrams.values().sum();

            let mut clipped = 0u64;
            for (gram, &count) in &hyp_ngrams {
                let max_ref_count = self
                    .references
                    .iter()
                    .map(|r| *ngram_counts(r, n).get(gram.as_ref() as &[String]).unwrap_or(&0))
                    .max()
                    .unwrap_or(0);
                clipped += count.min(max_ref_count);
            }
            matched[n - 1] = clipped;
        }

        Bleu::new(matched, hyp_counts, self.closest_length(hypothesis.len()))
    }
}
