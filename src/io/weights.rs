//! weight-vector text format: reuses the same `name=base64(double)`
//! feature-map grammar (§6) the CLI front-ends load/save trained weights
//! with, one entry per line rather than space-separated (a weight file is
//! meant to be read by eye, a feature-map field inside a record isn't).

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::weight::{IdTable, Weight};

use super::{decode_double, encode_double};

pub fn write(weights: &Weight, table: &IdTable) -> Result<String> {
    let mut out = String::new();
    for (&id, &value) in weights.inner() {
        let name = table
            .name(id)
            .ok_or_else(|| Error::InvalidConfig(format!("feature id {id} has no interned name")))?;
        out.push_str(&format!("{name}={}\n", encode_double(value)));
    }
    Ok(out)
}

pub fn parse(text: &str, table: &mut IdTable) -> Result<Weight> {
    let mut map: BTreeMap<u32, f64> = BTreeMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (name, value) = line
            .split_once('=')
            .ok_or_else(|| Error::ParseError(format!("malformed weight line: {line}")))?;
        let id = table.intern(name);
        map.insert(id, decode_double(value)?);
    }
    Ok(Weight::from(map))
}
