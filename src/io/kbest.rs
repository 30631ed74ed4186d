//! k-best text format (§6): one entry per line, `id ||| yield |||
//! feature-map`; a segment's list may also be stored as a `N.gz` file
//! (gzip via `flate2`, matching the teacher's choice of compression
//! crate elsewhere in its pipeline).

use std::io::{BufRead, BufReader, Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{Error, Result};
use crate::feature::FeatureMap;
use crate::weight::IdTable;

use super::{parse_features, write_features};

/// one decoded candidate as stored on disk: a segment id, its token
/// yield, and the feature contributions it accrued.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub id: String,
    pub tokens: Vec<String>,
    pub features: FeatureMap,
}

pub fn write_line(entry: &Entry, table: &IdTable) -> Result<String> {
    Ok(format!(
        "{} ||| {} ||| {}",
        entry.id,
        entry.tokens.join(" "),
        write_features(&entry.features, table)?
    ))
}

pub fn parse_line(line: &str, table: &mut IdTable) -> Result<Entry> {
    let mut fields = line.splitn(3, "|||");
    let id = fields
        .next()
        .ok_or_else(|| Error::ParseError("k-best line missing id".into()))?
        .trim()
        .to_string();
    let tokens = fields
        .next()
        .ok_or_else(|| Error::ParseError("k-best line missing yield".into()))?
        .trim()
        .split_whitespace()
        .map(String::from)
        .collect();
    let features_text = fields
        .next()
        .ok_or_else(|| Error::ParseError("k-best line missing feature map".into()))?
        .trim();
    let features = parse_features(features_text, table)?;
    Ok(Entry { id, tokens, features })
}

/// read every line of a plain-text k-best list.
pub fn read_all(reader: impl Read, table: &mut IdTable) -> Result<Vec<Entry>> {
    BufReader::new(reader)
        .lines()
        .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
        .map(|line| {
            let line = line.map_err(|e| Error::ParseError(e.to_string()))?;
            parse_line(&line, table)
        })
        .collect()
}

/// write every entry as a plain-text k-best list.
pub fn write_all(entries: &[Entry], table: &IdTable, mut writer: impl Write) -> Result<()> {
    for entry in entries {
        writeln!(writer, "{}", write_line(entry, table)?)
            .map_err(|e| Error::ParseError(e.to_string()))?;
    }
    Ok(())
}

/// read a gzip-compressed k-best list (`N.gz` directory layout).
pub fn read_gz(reader: impl Read, table: &mut IdTable) -> Result<Vec<Entry>> {
    read_all(GzDecoder::new(reader), table)
}

/// write a gzip-compressed k-best list.
pub fn write_gz(entries: &[Entry], table: &IdTable, writer: impl Write) -> Result<()> {
    let mut encoder = GzEncoder::new(writer, Compression::default());
    write_all(entries, table, &mut encoder)?;
    encoder
        .finish()
        .map_err(|e| Error::ParseError(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, table: &mut IdTable) -> Entry {
        let mut features = FeatureMap::new();
        features.add(table.intern("lm"), 2.0);
        Entry {
            id: id.to_string(),
            tokens: vec!["le".into(), "chat".into()],
            features,
        }
    }

    #[test]
    fn plain_text_round_trips() {
        let mut table = IdTable::new();
        let entries = vec![entry("0", &mut table)];
        let mut buffer = Vec::new();
        write_all(&entries, &table, &mut buffer).unwrap();
        let parsed = read_all(&buffer[..], &mut table).unwrap();
        assert_eq!(parsed, entries);
    }

    #[test]
    fn gzip_round_trips() {
        let mut table = IdTable::new();
        let entries = vec![entry("1", &mut table)];
        let mut buffer = Vec::new();
        write_gz(&entries, &table, &mut buffer).unwrap();
        let parsed = read_gz(&buffer[..], &mut table).unwrap();
        assert_eq!(parsed, entries);
    }
}
