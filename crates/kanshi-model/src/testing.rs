//! In-memory mock target tree for walker tests.
//!
//! `MockNode` plays the debug-session connector: a tree built up-front,
//! with switches for the behaviors the walkers must cope with — caches that
//! are not populated yet, fetches with artificial latency, and fetches that
//! fail. All nodes of one tree share a `FetchStats` so tests can assert on
//! how many remote requests a walk actually issued.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::node::{ModelError, ModelResult, NodeRef, TargetNode, Value};

/// Fetch counters shared by every node of one mock tree.
#[derive(Debug, Default)]
pub(crate) struct FetchStats {
    pub attribute_fetches: AtomicUsize,
    pub element_fetches: AtomicUsize,
}

impl FetchStats {
    pub fn total(&self) -> usize {
        self.attribute_fetches.load(Ordering::SeqCst) + self.element_fetches.load(Ordering::SeqCst)
    }
}

pub(crate) struct MockNode {
    attributes: BTreeMap<String, Value>,
    elements: BTreeMap<String, NodeRef>,
    /// When false the cached accessors return empty tables, simulating a
    /// subtree nothing has been fetched into yet.
    cache_visible: bool,
    latency: Duration,
    fail: Option<String>,
    stats: Arc<FetchStats>,
}

impl MockNode {
    pub fn new() -> Self {
        Self::with_stats(Arc::default())
    }

    pub fn with_stats(stats: Arc<FetchStats>) -> Self {
        Self {
            attributes: BTreeMap::new(),
            elements: BTreeMap::new(),
            cache_visible: true,
            latency: Duration::ZERO,
            fail: None,
            stats,
        }
    }

    /// A fresh node sharing this node's stats, for building one tree.
    pub fn child(&self) -> Self {
        Self::with_stats(self.stats.clone())
    }

    pub fn stats(&self) -> Arc<FetchStats> {
        self.stats.clone()
    }

    pub fn attr_node(&mut self, name: &str, node: NodeRef) -> &mut Self {
        self.attributes.insert(name.to_string(), Value::Node(node));
        self
    }

    pub fn attr_leaf(&mut self, name: &str, value: Value) -> &mut Self {
        self.attributes.insert(name.to_string(), value);
        self
    }

    pub fn element(&mut self, index: u64, node: NodeRef) -> &mut Self {
        self.elements.insert(index.to_string(), node);
        self
    }

    /// Make the cached accessors return empty tables; only fetching will
    /// reveal this node's children.
    pub fn hide_cache(&mut self) -> &mut Self {
        self.cache_visible = false;
        self
    }

    pub fn latency_ms(&mut self, millis: u64) -> &mut Self {
        self.latency = Duration::from_millis(millis);
        self
    }

    /// Make both fetch operations fail with the given message.
    pub fn fail_fetch(&mut self, message: &str) -> &mut Self {
        self.fail = Some(message.to_string());
        self
    }

    pub fn into_ref(self) -> NodeRef {
        Arc::new(self)
    }

    async fn simulate_remote(&self) -> ModelResult<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match &self.fail {
            Some(message) => Err(ModelError::Fetch(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TargetNode for MockNode {
    fn cached_attributes(&self) -> BTreeMap<String, Value> {
        if self.cache_visible {
            self.attributes.clone()
        } else {
            BTreeMap::new()
        }
    }

    fn cached_elements(&self) -> BTreeMap<String, NodeRef> {
        if self.cache_visible {
            self.elements.clone()
        } else {
            BTreeMap::new()
        }
    }

    async fn fetch_attributes(&self) -> ModelResult<BTreeMap<String, Value>> {
        self.stats.attribute_fetches.fetch_add(1, Ordering::SeqCst);
        self.simulate_remote().await?;
        Ok(self.attributes.clone())
    }

    async fn fetch_elements(&self) -> ModelResult<BTreeMap<String, NodeRef>> {
        self.stats.element_fetches.fetch_add(1, Ordering::SeqCst);
        self.simulate_remote().await?;
        Ok(self.elements.clone())
    }
}
