//! The concurrent, fetch-driven walk over the live target tree.
//!
//! Unlike the cached walks, this one may not assume anything is resident:
//! wherever the predicate says a match could still exist below a node, the
//! complete attribute and/or element tables are fetched from the target
//! before deciding which children to descend into. Fetches for sibling
//! branches run concurrently; a fence joins every branch spawned under a
//! node and surfaces the first failure as the failure of the whole walk.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Mutex;

use futures::FutureExt;
use futures::future::{BoxFuture, try_join_all};
use tracing::{debug, trace};

use kanshi_path::{KeyPath, PathPredicate, any_matches};

use crate::node::{ModelResult, NodeRef, Value};

/// Many-to-one join of fallible asynchronous operations.
///
/// `ready` completes once every included operation has completed, and fails
/// as soon as any one of them fails — the first failure wins and later
/// outcomes are immaterial. Siblings are not actively cancelled on failure;
/// they are simply no longer awaited.
pub struct Fence<'a> {
    parties: Vec<BoxFuture<'a, ModelResult<()>>>,
}

impl<'a> Fence<'a> {
    pub fn new() -> Self {
        Self {
            parties: Vec::new(),
        }
    }

    /// Add one operation to the join.
    pub fn include<F>(&mut self, operation: F)
    where
        F: Future<Output = ModelResult<()>> + Send + 'a,
    {
        self.parties.push(operation.boxed());
    }

    /// Wait for every included operation, failing on the first failure.
    pub async fn ready(self) -> ModelResult<()> {
        try_join_all(self.parties).await.map(|_| ())
    }
}

impl Default for Fence<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetch and collect every node whose path matches the predicate.
///
/// Traversal, fetching, and recording run concurrently across branches; the
/// returned map is nevertheless fully ordered by the canonical path
/// comparator and independent of completion order. Any fetch failure fails
/// the whole operation (no retries here — that is the connector's policy).
pub async fn fetch_successors(
    predicate: &PathPredicate,
    seed: &NodeRef,
) -> ModelResult<BTreeMap<KeyPath, NodeRef>> {
    let result = Mutex::new(BTreeMap::new());
    fetch_successors_into(predicate, &result, KeyPath::root(), seed.clone()).await?;
    let result = result
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    debug!(matches = result.len(), "fetch walk complete");
    Ok(result)
}

/// Recursive worker behind [`fetch_successors`], collecting into a shared,
/// caller-owned map.
///
/// On failure the map is left as-is: entries recorded before the failure
/// are not retracted. Callers wanting all-or-nothing semantics discard the
/// map when this returns an error.
pub fn fetch_successors_into<'a>(
    predicate: &'a PathPredicate,
    result: &'a Mutex<BTreeMap<KeyPath, NodeRef>>,
    path: KeyPath,
    node: NodeRef,
) -> BoxFuture<'a, ModelResult<()>> {
    async move {
        let mut fence = Fence::new();
        if predicate.matches(&path) {
            trace!(path = %path, "recording match");
            let mut entries = result.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            entries.insert(path.clone(), node.clone());
        }
        if predicate.successor_could_match(&path, true) {
            let next_names = predicate.next_names(&path);
            if !next_names.is_empty() {
                let node = node.clone();
                let path = path.clone();
                fence.include(async move {
                    trace!(path = %path, "fetching attributes");
                    let attributes = node.fetch_attributes().await?;
                    let mut branches = Fence::new();
                    for (name, value) in attributes {
                        let Value::Node(child) = value else {
                            continue;
                        };
                        if !any_matches(&next_names, &name) {
                            continue;
                        }
                        branches.include(fetch_successors_into(
                            predicate,
                            result,
                            path.extended(name),
                            child,
                        ));
                    }
                    branches.ready().await
                });
            }
            let next_indices = predicate.next_indices(&path);
            if !next_indices.is_empty() {
                let node = node.clone();
                let path = path.clone();
                fence.include(async move {
                    trace!(path = %path, "fetching elements");
                    let elements = node.fetch_elements().await?;
                    let mut branches = Fence::new();
                    for (index, child) in elements {
                        if !any_matches(&next_indices, &index) {
                            continue;
                        }
                        branches.include(fetch_successors_into(
                            predicate,
                            result,
                            path.extended(index),
                            child,
                        ));
                    }
                    branches.ready().await
                });
            }
        }
        fence.ready().await
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ModelError;
    use crate::testing::{FetchStats, MockNode};
    use kanshi_path::PathPredicate;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    fn pred(text: &str) -> PathPredicate {
        PathPredicate::parse(text).unwrap()
    }

    fn keys(map: &BTreeMap<KeyPath, NodeRef>) -> Vec<String> {
        map.keys().map(|k| k.to_string()).collect()
    }

    /// `procs` processes with `threads` threads each, nothing cached, with
    /// per-node fetch latency chosen by the caller.
    fn uncached_tree(
        procs: u64,
        threads: u64,
        latency: impl Fn(u64, u64) -> u64,
    ) -> (NodeRef, Arc<FetchStats>) {
        let mut root = MockNode::new();
        let stats = root.stats();
        root.hide_cache();
        let mut processes = root.child();
        processes.hide_cache();
        for pid in 0..procs {
            let mut proc = root.child();
            proc.hide_cache();
            proc.latency_ms(latency(pid, 0));
            let mut thread_list = root.child();
            thread_list.hide_cache();
            for tid in 0..threads {
                let mut thread = root.child();
                thread.hide_cache();
                thread.latency_ms(latency(pid, tid));
                thread_list.element(tid, thread.into_ref());
            }
            proc.attr_node("Threads", thread_list.into_ref());
            processes.element(pid, proc.into_ref());
        }
        root.attr_node("Processes", processes.into_ref());
        (root.into_ref(), stats)
    }

    #[tokio::test]
    async fn discovers_uncached_branches() {
        let (root, _) = uncached_tree(2, 2, |_, _| 0);
        let predicate = pred("Processes[].Threads[]");

        // Nothing is cached, so the synchronous walk sees nothing...
        assert!(crate::walk::collect_cached_successors(&predicate, &root).is_empty());

        // ...but the fetching walk completes the tree as it descends.
        let found = fetch_successors(&predicate, &root).await.unwrap();
        assert_eq!(
            keys(&found),
            vec![
                "Processes[0].Threads[0]",
                "Processes[0].Threads[1]",
                "Processes[1].Threads[0]",
                "Processes[1].Threads[1]",
            ]
        );
    }

    #[tokio::test]
    async fn fetches_only_what_the_predicate_needs() {
        let (root, stats) = uncached_tree(2, 2, |_, _| 0);
        fetch_successors(&pred("Processes[].Threads[]"), &root)
            .await
            .unwrap();

        // Attribute fetches: root, and each of the two processes. Element
        // fetches: the Processes container and each Threads container. No
        // node is asked for both tables, and the matched thread nodes are
        // never fetched into at all.
        assert_eq!(stats.attribute_fetches.load(Ordering::SeqCst), 3);
        assert_eq!(stats.element_fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn empty_predicate_fetches_nothing() {
        let (root, stats) = uncached_tree(2, 2, |_, _| 0);
        let found = fetch_successors(&PathPredicate::none(), &root).await.unwrap();
        assert!(found.is_empty());
        assert_eq!(stats.total(), 0);
    }

    /// Completion order must not affect the result: runs with ascending and
    /// descending per-branch latencies produce the identical mapping.
    #[tokio::test(flavor = "multi_thread")]
    async fn result_is_independent_of_completion_order() {
        let predicate = pred("Processes[].Threads[]");

        let (fast_first, _) = uncached_tree(3, 3, |pid, tid| (pid * 3 + tid) * 7);
        let (slow_first, _) = uncached_tree(3, 3, |pid, tid| (8 - pid * 3 - tid) * 7);

        let a = fetch_successors(&predicate, &fast_first).await.unwrap();
        let b = fetch_successors(&predicate, &slow_first).await.unwrap();

        assert_eq!(keys(&a), keys(&b));
        assert_eq!(a.len(), 9);
        assert_eq!(keys(&a)[0], "Processes[0].Threads[0]");
        assert_eq!(keys(&a)[8], "Processes[2].Threads[2]");
    }

    #[tokio::test]
    async fn one_failed_fetch_fails_the_walk() {
        let mut root = MockNode::new();
        root.hide_cache();
        let mut processes = root.child();
        processes.hide_cache();

        let mut healthy = root.child();
        healthy.hide_cache();
        let mut sick = root.child();
        sick.hide_cache();
        sick.fail_fetch("thread list unavailable");

        processes.element(0, healthy.into_ref());
        processes.element(1, sick.into_ref());
        root.attr_node("Processes", processes.into_ref());
        let root = root.into_ref();

        let err = match fetch_successors(&pred("Processes[].Threads[]"), &root).await {
            Ok(_) => panic!("expected fetch to fail"),
            Err(e) => e,
        };
        assert!(matches!(
            err,
            ModelError::Fetch(message) if message.contains("thread list unavailable")
        ));
    }

    /// Entries recorded before a failure stay in the shared map; failure
    /// does not retract them.
    #[tokio::test(flavor = "multi_thread")]
    async fn partial_results_survive_failure() {
        let mut root = MockNode::new();
        root.hide_cache();
        let mut processes = root.child();
        processes.hide_cache();

        // The healthy process resolves immediately; the sick one fails
        // only after the healthy branch has long been recorded.
        let healthy = {
            let mut node = root.child();
            node.hide_cache();
            node.into_ref()
        };
        let sick = {
            let mut node = root.child();
            node.hide_cache();
            node.latency_ms(100);
            node.fail_fetch("lost connection");
            node.into_ref()
        };
        processes.element(0, healthy);
        processes.element(1, sick);
        root.attr_node("Processes", processes.into_ref());
        let root = root.into_ref();

        // Processes[i] both match and get descended into (for Threads), so
        // the match is recorded before the sick node's own fetch fails.
        let predicate = pred("Processes[]").or(pred("Processes[].Threads[]"));

        let result = Mutex::new(BTreeMap::new());
        let outcome = fetch_successors_into(&predicate, &result, KeyPath::root(), root).await;

        assert!(outcome.is_err());
        let entries = result.into_inner().unwrap();
        assert_eq!(keys(&entries), vec!["Processes[0]", "Processes[1]"]);
    }
}
