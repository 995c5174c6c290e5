//! Cycle detection over graph collections.
//!
//! Iterative DFS with an explicit recursion stack, started from every node in
//! turn. An edge back to a node still on the stack closes a cycle. Cycles that
//! share nodes are found from different roots; each one is reported once,
//! rotated so its smallest node comes first.

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use serde_json::Value;

use mender_core::models::{Severity, Violation, ViolationType};
use mender_core::record::{get_path, key_string, referenced_keys, Record};
use mender_core::schema::AdjacencyExtractor;

use super::record_key;

/// Directed edges read out of `records`.
pub fn edges_from(
    extractor: &AdjacencyExtractor,
    key_path: &str,
    records: &[Record],
) -> Vec<(String, String)> {
    let mut edges = Vec::new();
    for record in records {
        match extractor {
            AdjacencyExtractor::NodeList { field } => {
                let from = record_key(record, key_path);
                if from.is_empty() {
                    continue;
                }
                if let Some(value) = get_path(record, field) {
                    for to in referenced_keys(value) {
                        edges.push((from.clone(), to));
                    }
                }
            }
            AdjacencyExtractor::EdgeRecord {
                from_field,
                to_field,
            } => {
                let from = get_path(record, from_field).and_then(key_string);
                let to = get_path(record, to_field).and_then(key_string);
                if let (Some(from), Some(to)) = (from, to) {
                    edges.push((from, to));
                }
            }
        }
    }
    edges
}

/// Every distinct cycle, as a path whose first node is repeated at the end.
pub fn find_cycles(edges: &[(String, String)]) -> Vec<Vec<String>> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for (from, to) in edges {
        graph.add_edge(from.as_str(), to.as_str(), ());
    }

    let mut roots: Vec<&str> = graph.nodes().collect();
    roots.sort_unstable();

    let mut seen: BTreeSet<Vec<String>> = BTreeSet::new();
    let mut cycles = Vec::new();

    for root in roots {
        let mut visited: HashSet<&str> = HashSet::from([root]);
        let mut stack: Vec<(&str, Vec<&str>, usize)> = vec![(root, successors(&graph, root), 0)];
        let mut on_stack: HashMap<&str, usize> = HashMap::from([(root, 0)]);

        loop {
            let Some(frame) = stack.last_mut() else {
                break;
            };
            let next = frame.1.get(frame.2).copied();
            frame.2 += 1;

            match next {
                Some(node) => {
                    if let Some(&pos) = on_stack.get(node) {
                        let members: Vec<&str> = stack[pos..].iter().map(|f| f.0).collect();
                        let canonical = canonical_rotation(&members);
                        if seen.insert(canonical.clone()) {
                            let mut path = canonical;
                            path.push(path[0].clone());
                            cycles.push(path);
                        }
                    } else if visited.insert(node) {
                        on_stack.insert(node, stack.len());
                        stack.push((node, successors(&graph, node), 0));
                    }
                }
                None => {
                    if let Some((done, _, _)) = stack.pop() {
                        on_stack.remove(done);
                    }
                }
            }
        }
    }
    cycles
}

fn successors<'g>(graph: &DiGraphMap<&'g str, ()>, node: &'g str) -> Vec<&'g str> {
    let mut next: Vec<&'g str> = graph
        .neighbors_directed(node, Direction::Outgoing)
        .collect();
    next.sort_unstable();
    next
}

fn canonical_rotation(members: &[&str]) -> Vec<String> {
    let start = members
        .iter()
        .enumerate()
        .min_by_key(|(_, m)| **m)
        .map(|(i, _)| i)
        .unwrap_or(0);
    members[start..]
        .iter()
        .chain(members[..start].iter())
        .map(|m| m.to_string())
        .collect()
}

/// One `circular_reference` violation per distinct cycle in a graph collection.
pub fn scan_cycles(
    collection: &str,
    key_path: &str,
    extractor: &AdjacencyExtractor,
    records: &[Record],
) -> Vec<Violation> {
    let edges = edges_from(extractor, key_path, records);
    let field = extractor.describe_field();
    find_cycles(&edges)
        .into_iter()
        .map(|path| {
            let display = path.join(" -> ");
            Violation::new(
                ViolationType::CircularReference,
                collection,
                &path[0],
                &field,
                Value::from(path.clone()),
                Severity::Warning,
                format!("{collection} contains a cycle: {display}"),
            )
            .with_path(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn edges(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    #[test]
    fn triangle_is_one_cycle() {
        let cycles = find_cycles(&edges(&[("A", "B"), ("B", "C"), ("C", "A")]));
        assert_eq!(cycles, vec![vec!["A", "B", "C", "A"]]);
    }

    #[test]
    fn rotation_does_not_matter() {
        let cycles = find_cycles(&edges(&[("C", "A"), ("B", "C"), ("A", "B")]));
        assert_eq!(cycles, vec![vec!["A", "B", "C", "A"]]);
    }

    #[test]
    fn dag_has_no_cycles() {
        let cycles = find_cycles(&edges(&[("A", "B"), ("A", "C"), ("B", "C")]));
        assert!(cycles.is_empty());
    }

    #[test]
    fn self_loop_is_a_cycle() {
        assert_eq!(find_cycles(&edges(&[("A", "A")])), vec![vec!["A", "A"]]);
    }

    #[test]
    fn cycles_sharing_nodes_are_all_reported() {
        let cycles = find_cycles(&edges(&[("A", "B"), ("B", "C"), ("C", "A"), ("A", "C")]));
        assert_eq!(cycles, vec![vec!["A", "B", "C", "A"], vec!["A", "C", "A"]]);
    }

    #[test]
    fn two_disjoint_cycles() {
        let cycles = find_cycles(&edges(&[("A", "B"), ("B", "A"), ("X", "Y"), ("Y", "X")]));
        assert_eq!(cycles.len(), 2);
    }

    #[test]
    fn node_list_extractor() {
        let records = vec![
            json!({"id": "graphs", "prerequisites": ["trees"]}),
            json!({"id": "trees", "prerequisites": ["graphs"]}),
        ];
        let extractor = AdjacencyExtractor::NodeList {
            field: "prerequisites".to_string(),
        };
        let found = scan_cycles("tag_relationships", "id", &extractor, &records);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].record_id, "graphs");
        assert_eq!(
            found[0].path.as_deref(),
            Some(&["graphs".to_string(), "trees".to_string(), "graphs".to_string()][..])
        );
    }

    #[test]
    fn edge_record_extractor() {
        let records = vec![
            json!({"id": "r1", "problem_id1": "A", "problem_id2": "B"}),
            json!({"id": "r2", "problem_id1": "B", "problem_id2": "C"}),
            json!({"id": "r3", "problem_id1": "C", "problem_id2": "A"}),
        ];
        let extractor = AdjacencyExtractor::EdgeRecord {
            from_field: "problem_id1".to_string(),
            to_field: "problem_id2".to_string(),
        };
        let found = scan_cycles("problem_relationships", "id", &extractor, &records);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].field, "problem_id1->problem_id2");
        assert_eq!(found[0].value, json!(["A", "B", "C", "A"]));
    }
}
