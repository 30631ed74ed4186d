//! text I/O formats (§6): hypergraph records, k-best lists (plain or
//! gzip), reference sets, nested-array lattices, scorer-statistic
//! encode/decode (the latter delegated to [`crate::scorer::Statistic`],
//! so it lives where the statistic does rather than being reimplemented
//! here — see [`scorer`]), and a weight-vector save/load format for the
//! CLI front-ends ([`weights`]).

pub mod hypergraph;
pub mod kbest;
pub mod lattice;
pub mod references;
pub mod scorer;
pub mod weights;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};
use crate::feature::FeatureMap;
use crate::weight::IdTable;

pub(crate) fn encode_double(value: f64) -> String {
    let mut bytes = Vec::with_capacity(8);
    bytes.write_f64::<BigEndian>(value).expect("write to a Vec never fails");
    BASE64.encode(bytes)
}

pub(crate) fn decode_double(text: &str) -> Result<f64> {
    let bytes = BASE64
        .decode(text)
        .map_err(|e| Error::ParseError(format!("invalid base64 double: {e}")))?;
    let mut cursor = std::io::Cursor::new(bytes);
    cursor
        .read_f64::<BigEndian>()
        .map_err(|_| Error::ParseError("double must decode to 8 bytes".into()))
}

/// `name=base64(double) …`, shared by the hypergraph and k-best formats.
pub(crate) fn write_features(features: &FeatureMap, table: &IdTable) -> Result<String> {
    let mut parts = Vec::with_capacity(features.inner().len());
    for (&id, &value) in features.inner() {
        let name = table
            .name(id)
            .ok_or_else(|| Error::InvalidConfig(format!("feature id {id} has no interned name")))?;
        parts.push(format!("{name}={}", encode_double(value)));
    }
    Ok(parts.join(" "))
}

pub(crate) fn parse_features(text: &str, table: &mut IdTable) -> Result<FeatureMap> {
    let mut map = FeatureMap::new();
    if text.is_empty() {
        return Ok(map);
    }
    for token in text.split_whitespace() {
        let (name, value) = token
            .split_once('=')
            .ok_or_else(|| Error::ParseError(format!("malformed feature entry: {token}")))?;
        let id = table.intern(name);
        map.add(id, decode_double(value)?);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_round_trips_through_base64() {
        let encoded = encode_double(-3.5);
        assert_eq!(decode_double(&encoded).unwrap(), -3.5);
    }
}
