//! scorer-statistic encode/decode dispatch (§6): the text form of a
//! `Statistic` already carries its own type tag as the first whitespace
//! token (see [`crate::scorer::Bleu::encode`]); this module only needs to
//! know which tag maps to which concrete type.

use crate::error::{Error, Result};
use crate::scorer::Bleu;

/// decode a statistic whose concrete type is picked by its leading tag
/// token. Only `bleu` is a built-in scorer; callers adding a scorer of
/// their own decode it directly through that scorer's `Statistic` impl
/// instead of going through this dispatcher.
pub fn decode_bleu(text: &str) -> Result<Bleu> {
    Bleu::decode(text)
}

pub fn tag(text: &str) -> Result<&str> {
    text.split_whitespace()
        .next()
        .ok_or_else(|| Error::ParseError("empty statistic text".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::Statistic;

    #[test]
    fn tag_reads_the_leading_token() {
        let stat = Bleu::new([1, 0, 0, 0], [1, 0, 0, 0], 1);
        let text = stat.encode();
        assert_eq!(tag(&text).unwrap(), "bleu");
    }

    #[test]
    fn decode_bleu_round_trips() {
        let stat = Bleu::new([3, 2, 1, 0], [3, 2, 1, 0], 3);
        let decoded = decode_bleu(&stat.encode()).unwrap();
        assert_eq!(stat, decoded);
    }
}
