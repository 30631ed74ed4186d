//! hypergraph text format (§6): a node count, then one line per edge
//! (`head [tails] ||| rule ||| feature-map ||| attribute-map`), then the
//! goal node id last. Feature-map entries are `name=base64(double)`;
//! attribute-map entries are `name:i=123` / `name:f=1.5` / `name:s=text`
//! (string values may not contain whitespace — the spec's "typed
//! literals" wording doesn't specify a quoting rule, so this crate picks
//! the simplest one and records it in DESIGN.md).

use std::fmt::Write as _;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::feature::{AttributeMap, AttributeValue};
use crate::hypergraph::{Hypergraph, NodeId};
use crate::weight::IdTable;

use super::{parse_features, write_features};

fn write_attributes(attributes: &AttributeMap) -> String {
    let mut parts = Vec::with_capacity(attributes.inner().len());
    for (name, value) in attributes.inner() {
        let rendered = match value {
            AttributeValue::Int(v) => format!("{name}:i={v}"),
            AttributeValue::Float(v) => format!("{name}:f={v}"),
            AttributeValue::Str(v) => format!("{name}:s={v}"),
        };
        parts.push(rendered);
    }
    parts.join(" ")
}

fn parse_attributes(text: &str) -> Result<AttributeMap> {
    let mut map = AttributeMap::new();
    if text.is_empty() {
        return Ok(map);
    }
    for token in text.split_whitespace() {
        let (key, value) = token
            .split_once('=')
            .ok_or_else(|| Error::ParseError(format!("malformed attribute entry: {token}")))?;
        let (name, kind) = key
            .split_once(':')
            .ok_or_else(|| Error::ParseError(format!("attribute missing type tag: {key}")))?;
        let typed = match kind {
            "i" => AttributeValue::Int(
                value
                    .parse()
                    .map_err(|_| Error::ParseError(format!("bad int attribute: {value}")))?,
            ),
            "f" => AttributeValue::Float(
                value
                    .parse()
                    .map_err(|_| Error::ParseError(format!("bad float attribute: {value}")))?,
            ),
            "s" => AttributeValue::Str(value.to_string()),
            other => return Err(Error::ParseError(format!("unknown attribute type: {other}"))),
        };
        map.set(name, typed);
    }
    Ok(map)
}

/// serialize `graph` to its text form, resolving feature ids to names via
/// `table`.
pub fn write(graph: &Hypergraph, table: &IdTable) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "nodes {}", graph.node_count()).unwrap();
    for edge in graph.edges() {
        let tails = edge
            .tail_ids()
            .iter()
            .map(|t| t.index().to_string())
            .collect::<Vec<_>>()
            .join(",");
        let rule = edge.rule().unwrap_or("-");
        let features = write_features(edge.features(), table)?;
        let attributes = write_attributes(edge.attributes());
        writeln!(
            out,
            "edge {} {} ||| {} ||| {} ||| {}",
            edge.head().id().index(),
            tails,
            rule,
            features,
            attributes
        )
        .unwrap();
    }
    let goal = graph
        .goal()
        .ok_or_else(|| Error::InvalidGraph("cannot serialize a hypergraph without a goal".into()))?;
    writeln!(out, "goal {}", goal.index()).unwrap();
    Ok(out)
}

/// parse a hypergraph from its text form, interning feature names into
/// `table`.
pub fn read(text: &str, table: &mut IdTable) -> Result<Hypergraph> {
    let mut graph = Hypergraph::new();
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    let header = lines
        .next()
        .ok_or_else(|| Error::ParseError("empty hypergraph input".into()))?;
    let count: usize = header
        .strip_prefix("nodes ")
        .ok_or_else(|| Error::ParseError("expected 'nodes <count>' header".into()))?
        .trim()
        .parse()
        .map_err(|_| Error::ParseError("malformed node count".into()))?;
    for _ in 0..count {
        graph.add_node();
    }

    for line in lines {
        if let Some(rest) = line.strip_prefix("edge ") {
            let (head_tails, remainder) = rest
                .split_once("|||")
                .ok_or_else(|| Error::ParseError("edge missing ||| separator".into()))?;
            let mut head_tails = head_tails.split_whitespace();
            let head: u32 = head_tails
                .next()
                .ok_or_else(|| Error::ParseError("edge missing head id".into()))?
                .parse()
                .map_err(|_| Error::ParseError("malformed head id".into()))?;
            let tails: Vec<NodeId> = match head_tails.next() {
                Some(list) if !list.is_empty() => list
                    .split(',')
                    .map(|t| {
                        t.parse::<u32>()
                            .map(NodeId)
                            .map_err(|_| Error::ParseError(format!("malformed tail id: {t}")))
                    })
                    .collect::<Result<_>>()?,
                _ => Vec::new(),
            };

            let mut fields = remainder.splitn(3, "|||");
            let rule = fields
                .next()
                .ok_or_else(|| Error::ParseError("edge missing rule field".into()))?
                .trim();
            let rule = if rule == "-" {
                None
            } else {
                Some(Arc::from(rule))
            };
            let features_text = fields
                .next()
                .ok_or_else(|| Error::ParseError("edge missing feature field".into()))?
                .trim();
            let attributes_text = fields
                .next()
                .ok_or_else(|| Error::ParseError("edge missing attribute field".into()))?
                .trim();

            let features = parse_features(features_text, table)?;
            let attributes = parse_attributes(attributes_text)?;
            graph.add_edge(NodeId(head), tails, rule, features, attributes)?;
        } else if let Some(rest) = line.strip_prefix("goal ") {
            let goal: u32 = rest
                .trim()
                .parse()
                .map_err(|_| Error::ParseError("malformed goal id".into()))?;
            graph.set_goal(NodeId(goal))?;
        } else {
            return Err(Error::ParseError(format!("unrecognized line: {line}")));
        }
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_small_graph() {
        let mut table = IdTable::new();
        let mut graph = Hypergraph::new();
        let a = graph.add_node();
        let b = graph.add_node();
        let mut features = FeatureMap::new();
        features.add(table.intern("lm"), 1.5);
        let mut attributes = AttributeMap::new();
        attributes.set("span", AttributeValue::Int(3));
        graph
            .add_edge(b, vec![a], Some(Arc::from("rule-1")), features, attributes)
            .unwrap();
        graph.set_goal(b).unwrap();

        let text = write(&graph, &table).unwrap();
        let mut table2 = table.clone();
        let parsed = read(&text, &mut table2).unwrap();

        assert_eq!(parsed.node_count(), 2);
        assert_eq!(parsed.edge_count(), 1);
        assert_eq!(parsed.goal().unwrap().index(), 1);
        let edge = parsed.edges().next().unwrap();
        assert_eq!(edge.rule(), Some("rule-1"));
        assert_eq!(edge.features().get(table2.id("lm").unwrap()), 1.5);
        assert_eq!(
            edge.attributes().get("span"),
            Some(&AttributeValue::Int(3))
        );
    }

    #[test]
    fn rejects_malformed_feature_entry() {
        let mut table = IdTable::new();
        let text = "nodes 1\nedge 0 ||| - ||| broken ||| \ngoal 0\n";
        assert!(matches!(read(text, &mut table), Err(Error::ParseError(_))));
    }
}
