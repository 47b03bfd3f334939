//! kanshi-model: the live target-object tree and its pattern-driven walkers.
//!
//! Provides:
//! - **TargetNode**: the trait a debug-session connector implements to expose
//!   one node of the remote target model (cached and fetching accessors)
//! - **collect_cached_values / collect_cached_successors**: synchronous walks
//!   over data already resident locally, with predicate-driven pruning
//! - **fetch_successors**: the concurrent walk that issues remote fetches to
//!   complete unknown parts of the tree while it descends
//!
//! The walkers are generic over `TargetNode`, so connectors for different
//! debugging backends plug in without touching traversal code. Nothing here
//! spins up a runtime; the async walk runs on whatever executor drives it.

pub mod fetch;
pub mod node;
pub mod walk;

#[cfg(test)]
pub(crate) mod testing;

pub use fetch::{Fence, fetch_successors};
pub use node::{ModelError, ModelResult, NodeRef, TargetNode, Value};
pub use walk::{collect_cached_successors, collect_cached_values};
