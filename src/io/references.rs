//! reference-set text format (§6): one line per reference, `id |||
//! reference-sentence`; multiple references per id accumulate in
//! encounter order, ready to hand to [`crate::scorer::BleuScorer::new`].

use std::collections::BTreeMap;

use crate::error::{Error, Result};

pub fn parse(text: &str) -> Result<BTreeMap<String, Vec<Vec<String>>>> {
    let mut references: BTreeMap<String, Vec<Vec<String>>> = BTreeMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (id, sentence) = line
            .split_once("|||")
            .ok_or_else(|| Error::ParseError(format!("reference line missing |||: {line}")))?;
        let tokens = sentence.trim().split_whitespace().map(String::from).collect();
        references.entry(id.trim().to_string()).or_default().push(tokens);
    }
    Ok(references)
}

pub fn write(references: &BTreeMap<String, Vec<Vec<String>>>) -> String {
    let mut out = String::new();
    for (id, sentences) in references {
        for sentence in sentences {
            out.push_str(id);
            out.push_str(" ||| ");
            out.push_str(&sentence.join(" "));
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiple_references_accumulate_per_id() {
        let text = "0 ||| le chat noir\n0 ||| the black cat\n1 ||| bonjour\n";
        let parsed = parse(text).unwrap();
        assert_eq!(parsed["0"].len(), 2);
        assert_eq!(parsed["1"], vec![vec!["bonjour".to_string()]]);
    }

    #[test]
    fn round_trips_through_write() {
        let text = "0 ||| a b\n0 ||| c d\n";
        let parsed = parse(text).unwrap();
        let rendered = write(&parsed);
        assert_eq!(parse(&rendered).unwrap(), parsed);
    }
}
