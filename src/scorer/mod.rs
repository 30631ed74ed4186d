//! evaluation metric abstraction (§4.5): a `Scorer` turns a hypothesis into
//! an additive `Statistic`; the core ships one concrete implementation
//! (BLEU) and treats others as external collaborators.

mod bleu;

pub use bleu::{Bleu, BleuScorer};

/// an additive per-segment evaluation statistic. `+=`/`-=` let callers
/// maintain a running corpus-level aggregate without re-scoring every
/// segment; `loss()`/`reward()` expose the same number both ways since some
/// callers minimize and some maximize.
pub trait Statistic: Clone + Default + std::ops::AddAssign + std::ops::SubAssign {
    /// lower is better, conventionally bounded to [0, 1].
    fn loss(&self) -> f64;

    /// higher is better; `reward() == 1.0 - loss()` unless a scorer
    /// documents otherwise.
    fn reward(&self) -> f64 {
        1.0 - self.loss()
    }

    /// round-trips through [`Scorer`]'s textual encoding (§6).
    fn encode(&self) -> String;
    fn decode(text: &str) -> crate::error::Result<Self>
    where
        Self: Sized;
}

/// scores a hypothesis sentence against this segment's references,
/// producing an additive [`Statistic`].
pub trait Scorer {
    type Stat: Statistic;

    fn score(&self, hypothesis: &[String]) -> Self::Stat;
}
