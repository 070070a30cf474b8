//! GraphSON 3.0 adjacency-list encoding.
//!
//! One JSON object per line, one line per vertex. Each vertex line carries
//! its properties, its outgoing edges under `outE` and its incoming edges
//! under `inE`, so a reader can rebuild the whole graph line by line.
//!
//! Ids are typed `g:Int64`. Vertex ids are the dense vertex handles; edge
//! ids and then vertex-property ids are drawn from one counter starting
//! after the last vertex id.

use std::collections::BTreeMap;
use std::io::{self, Write};

use serde_json::{json, Map, Value};

use crate::store::{Edge, GraphStore, Vertex};

/// Vertex label written for every account.
pub const VERTEX_LABEL: &str = "person";

/// Property key holding the remote account id.
pub const USER_ID_KEY: &str = "user_id";

fn int64(n: u64) -> Value {
    json!({ "@type": "g:Int64", "@value": n })
}

/// Write the whole store to `out`. Returns the number of vertex lines.
pub fn write_graph<W: Write>(store: &GraphStore, out: &mut W) -> io::Result<usize> {
    let vertex_count = store.vertex_count() as u64;
    let edge_count = store.edge_count() as u64;
    let mut next_property_id = vertex_count + edge_count;

    for vertex in store.vertices() {
        let line = encode_vertex(store, vertex, vertex_count, &mut next_property_id);
        serde_json::to_writer(&mut *out, &line)?;
        out.write_all(b"\n")?;
    }

    out.flush()?;
    Ok(store.vertex_count())
}

fn encode_vertex(
    store: &GraphStore,
    vertex: &Vertex,
    edge_id_base: u64,
    next_property_id: &mut u64,
) -> Value {
    let mut line = Map::new();
    line.insert("id".into(), int64(vertex.handle.index() as u64));
    line.insert("label".into(), Value::from(VERTEX_LABEL));

    let out_e = group_edges(store.out_edges(vertex.handle), edge_id_base, |e| {
        ("inV", e.target.index())
    });
    if !out_e.is_empty() {
        line.insert("outE".into(), Value::Object(out_e));
    }

    let in_e = group_edges(store.in_edges(vertex.handle), edge_id_base, |e| {
        ("outV", e.source.index())
    });
    if !in_e.is_empty() {
        line.insert("inE".into(), Value::Object(in_e));
    }

    let mut properties = Map::new();
    properties.insert(
        USER_ID_KEY.into(),
        json!([{ "id": int64(take(next_property_id)), "value": int64(vertex.external_id.0) }]),
    );
    for (key, value) in &vertex.attributes {
        properties.insert(
            key.as_str().into(),
            json!([{ "id": int64(take(next_property_id)), "value": value }]),
        );
    }
    line.insert("properties".into(), Value::Object(properties));

    Value::Object(line)
}

/// Group edges by label; `other_end` names the far vertex field and index.
fn group_edges<'a>(
    edges: impl Iterator<Item = &'a Edge>,
    edge_id_base: u64,
    other_end: impl Fn(&Edge) -> (&'static str, usize),
) -> Map<String, Value> {
    let mut grouped: BTreeMap<&'static str, Vec<Value>> = BTreeMap::new();
    for edge in edges {
        let (field, vertex_index) = other_end(edge);
        let mut entry = Map::new();
        entry.insert("id".into(), int64(edge_id_base + edge.index as u64));
        entry.insert(field.into(), int64(vertex_index as u64));
        grouped
            .entry(edge.label.as_str())
            .or_default()
            .push(Value::Object(entry));
    }
    grouped
        .into_iter()
        .map(|(label, list)| (label.to_string(), Value::Array(list)))
        .collect()
}

fn take(counter: &mut u64) -> u64 {
    let id = *counter;
    *counter += 1;
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use followgraph_core::{AttributeKey, EdgeLabel, ExternalId};

    fn sample_store() -> GraphStore {
        let mut store = GraphStore::new();
        let alice = store.get_or_create_vertex(ExternalId(100));
        let bob = store.get_or_create_vertex(ExternalId(200));
        let carol = store.get_or_create_vertex(ExternalId(300));
        store.add_edge(alice, bob, EdgeLabel::Follows).unwrap();
        store.add_edge(alice, carol, EdgeLabel::Follows).unwrap();
        store.set_attribute(carol, AttributeKey::Name, "Carol").unwrap();
        store
    }

    fn lines(store: &GraphStore) -> Vec<Value> {
        let mut buf = Vec::new();
        write_graph(store, &mut buf).unwrap();
        String::from_utf8(buf)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_one_line_per_vertex() {
        let store = sample_store();
        let lines = lines(&store);

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["id"]["@value"], 0);
        assert_eq!(lines[0]["label"], "person");
        assert_eq!(lines[2]["properties"]["user_id"][0]["value"]["@value"], 300);
    }

    #[test]
    fn test_edges_on_both_ends() {
        let lines = lines(&sample_store());

        let out = lines[0]["outE"]["follows"].as_array().unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["inV"]["@value"], 1);
        assert_eq!(out[1]["inV"]["@value"], 2);
        assert!(lines[0].get("inE").is_none());

        let incoming = lines[2]["inE"]["follows"].as_array().unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0]["outV"]["@value"], 0);
        assert_eq!(incoming[0]["id"], out[1]["id"]);
    }

    #[test]
    fn test_only_present_attributes_written() {
        let lines = lines(&sample_store());

        let carol = lines[2]["properties"].as_object().unwrap();
        assert_eq!(carol["name"][0]["value"], "Carol");
        assert!(!carol.contains_key("location"));

        let bob = lines[1]["properties"].as_object().unwrap();
        assert_eq!(bob.len(), 1);
    }

    #[test]
    fn test_ids_do_not_collide() {
        let lines = lines(&sample_store());
        let mut ids = Vec::new();
        for line in &lines {
            ids.push(line["id"]["@value"].as_u64().unwrap());
            for edge in line["outE"]["follows"].as_array().into_iter().flatten() {
                ids.push(edge["id"]["@value"].as_u64().unwrap());
            }
            for values in line["properties"].as_object().unwrap().values() {
                ids.push(values[0]["id"]["@value"].as_u64().unwrap());
            }
        }
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn test_empty_graph_writes_nothing() {
        let mut buf = Vec::new();
        let written = write_graph(&GraphStore::new(), &mut buf).unwrap();
        assert_eq!(written, 0);
        assert!(buf.is_empty());
    }
}
