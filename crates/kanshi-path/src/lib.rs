//! kanshi-path: paths, patterns, and predicates for the kanshi target model.
//!
//! Provides:
//! - **KeyPath**: a concrete location in the target tree, ordered canonically
//! - **PathPattern**: a fixed-length sequence of match tokens
//! - **PathPredicate**: a pattern or a union of patterns, queried uniformly
//! - The pattern-string parser/printer (`Processes[].Threads[]` syntax)
//!
//! This crate is a leaf dependency with no async runtime and no I/O. It
//! exists so that consumers (the model walkers, protocol plumbing, UIs) can
//! work with kanshi's addressing types without pulling in the engine's deps.

pub mod path;
pub mod pattern;
pub mod predicate;

pub use path::{KeyPath, compare_segments, is_index, is_name};
pub use pattern::{PathPattern, PatternToken, any_matches};
pub use predicate::PathPredicate;

use thiserror::Error;

/// Result type for pattern and path parsing.
pub type PatternResult<T> = Result<T, PatternError>;

/// Errors from parsing a path or pattern string.
///
/// Each variant carries the offending segment so callers can point at the
/// exact piece of input that failed. Parsing never returns a partial value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("unclosed '[' in segment: {0}")]
    UnclosedBracket(String),
    #[error("unexpected text after ']' in segment: {0}")]
    TrailingText(String),
    #[error("index is not numeric in segment: {0}")]
    NonNumericIndex(String),
    #[error("wildcard segment not allowed in a concrete path: {0}")]
    WildcardInPath(String),
}
