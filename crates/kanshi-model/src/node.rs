//! The target-object collaborator contract.
//!
//! A `TargetNode` is one node of the remote target model: a process, a
//! thread, a register bank, a memory region. Each node carries two local
//! lookup tables — *attributes* keyed by name segment and *elements* keyed
//! by index segment — reflecting only what has already been retrieved from
//! the debug session. Absence from a cached table means "not yet known",
//! never "absent on the target".

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Shared handle to a node. Nodes are owned by the connector; the walkers
/// only ever clone handles.
pub type NodeRef = Arc<dyn TargetNode>;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors surfaced by the live model.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("target disconnected: {0}")]
    Disconnected(String),
}

/// An attribute value: a child node, or an opaque leaf the target reported.
#[derive(Clone)]
pub enum Value {
    Node(NodeRef),
    Bool(bool),
    Int(i64),
    String(String),
}

impl Value {
    pub fn is_node(&self) -> bool {
        matches!(self, Value::Node(_))
    }

    pub fn as_node(&self) -> Option<&NodeRef> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Node(_) => write!(f, "Node(..)"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::String(s) => write!(f, "String({s:?})"),
        }
    }
}

/// One node of the remote target model.
///
/// The cached accessors are synchronous snapshots: no I/O, possibly
/// incomplete, and each call returns an internally consistent copy even if
/// the connector is concurrently filling its cache. The fetch operations go
/// to the remote session and resolve to the *complete* current table, with
/// the same key/value shape as the cached accessor.
///
/// Retry policy, timeouts, and cancellation all belong to the connector;
/// the walkers treat a fetch error as final.
#[async_trait]
pub trait TargetNode: Send + Sync {
    /// Attributes already known locally, keyed by name segment.
    fn cached_attributes(&self) -> BTreeMap<String, Value>;

    /// Child elements already known locally, keyed by bare index segment
    /// (`"0"`, not `"[0]"`).
    fn cached_elements(&self) -> BTreeMap<String, NodeRef>;

    /// Fetch the complete current attribute table from the target.
    async fn fetch_attributes(&self) -> ModelResult<BTreeMap<String, Value>>;

    /// Fetch the complete current element table from the target.
    async fn fetch_elements(&self) -> ModelResult<BTreeMap<String, NodeRef>>;
}
