//! Synchronous walks over the cached view of the target tree.
//!
//! These are pure reads: no fetches are issued and the tree is never
//! mutated. A branch is only descended while the predicate says a match
//! could still exist below it, and only through child keys the predicate's
//! next-token sets accept, so unrelated siblings are pruned without being
//! visited. Pruning changes performance, never results.

use std::collections::BTreeMap;

use kanshi_path::{KeyPath, PathPredicate, any_matches};

use crate::node::{NodeRef, Value};

/// Collect every cached value whose path matches the predicate.
///
/// Leaf attribute values are matched and recorded but never descended into.
/// The result map is ordered by the canonical path comparator.
pub fn collect_cached_values(
    predicate: &PathPredicate,
    seed: &NodeRef,
) -> BTreeMap<KeyPath, Value> {
    let mut result = BTreeMap::new();
    visit_value(
        predicate,
        &mut result,
        KeyPath::root(),
        &Value::Node(seed.clone()),
    );
    result
}

fn visit_value(
    predicate: &PathPredicate,
    result: &mut BTreeMap<KeyPath, Value>,
    path: KeyPath,
    value: &Value,
) {
    if predicate.matches(&path) {
        result.insert(path.clone(), value.clone());
    }
    let Value::Node(node) = value else {
        return;
    };
    if !predicate.successor_could_match(&path, true) {
        return;
    }
    let next_names = predicate.next_names(&path);
    if !next_names.is_empty() {
        for (name, child) in node.cached_attributes() {
            if !any_matches(&next_names, &name) {
                continue;
            }
            visit_value(predicate, result, path.extended(name), &child);
        }
    }
    let next_indices = predicate.next_indices(&path);
    if !next_indices.is_empty() {
        for (index, child) in node.cached_elements() {
            if !any_matches(&next_indices, &index) {
                continue;
            }
            visit_value(predicate, result, path.extended(index), &Value::Node(child));
        }
    }
}

/// Collect every cached *node* whose path matches the predicate.
///
/// Same traversal as [`collect_cached_values`], restricted to values that
/// are themselves nodes; leaf attributes are skipped entirely.
pub fn collect_cached_successors(
    predicate: &PathPredicate,
    seed: &NodeRef,
) -> BTreeMap<KeyPath, NodeRef> {
    let mut result = BTreeMap::new();
    visit_node(predicate, &mut result, KeyPath::root(), seed.clone());
    result
}

fn visit_node(
    predicate: &PathPredicate,
    result: &mut BTreeMap<KeyPath, NodeRef>,
    path: KeyPath,
    node: NodeRef,
) {
    if predicate.matches(&path) {
        result.insert(path.clone(), node.clone());
    }
    if !predicate.successor_could_match(&path, true) {
        return;
    }
    let next_names = predicate.next_names(&path);
    if !next_names.is_empty() {
        for (name, child) in node.cached_attributes() {
            let Value::Node(child) = child else {
                continue;
            };
            if !any_matches(&next_names, &name) {
                continue;
            }
            visit_node(predicate, result, path.extended(name), child);
        }
    }
    let next_indices = predicate.next_indices(&path);
    if !next_indices.is_empty() {
        for (index, child) in node.cached_elements() {
            if !any_matches(&next_indices, &index) {
                continue;
            }
            visit_node(predicate, result, path.extended(index), child);
        }
    }
}
