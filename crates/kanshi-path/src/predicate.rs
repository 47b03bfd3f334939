//! Predicates: a single pattern, or a union of patterns matched as one.
//!
//! Every query a walker needs — match, viability, next-key sets — is
//! answered here so traversal code never cares whether it was handed one
//! pattern or many.

use std::collections::BTreeSet;
use std::fmt;

use crate::path::KeyPath;
use crate::pattern::{PathPattern, PatternToken};
use crate::PatternResult;

/// The matching abstraction the walkers are written against.
///
/// `Union` is a logical OR over its patterns, kept flat and deduplicated;
/// every query aggregates over the children and nothing else. An empty
/// union matches nothing and has no viable successors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPredicate {
    Pattern(PathPattern),
    Union(BTreeSet<PathPattern>),
}

impl PathPredicate {
    /// Predicate matching nothing.
    pub fn none() -> Self {
        PathPredicate::Union(BTreeSet::new())
    }

    /// Parse a single-pattern predicate from the dotted/bracketed syntax.
    pub fn parse(text: &str) -> PatternResult<Self> {
        Ok(PathPredicate::Pattern(PathPattern::parse(text)?))
    }

    /// OR this predicate with another, flattening nested unions and
    /// deduplicating identical patterns.
    pub fn or(self, other: PathPredicate) -> PathPredicate {
        let mut patterns = self.into_patterns();
        patterns.extend(other.into_patterns());
        PathPredicate::Union(patterns)
    }

    fn into_patterns(self) -> BTreeSet<PathPattern> {
        match self {
            PathPredicate::Pattern(pattern) => BTreeSet::from([pattern]),
            PathPredicate::Union(patterns) => patterns,
        }
    }

    fn patterns(&self) -> Box<dyn Iterator<Item = &PathPattern> + '_> {
        match self {
            PathPredicate::Pattern(pattern) => Box::new(std::iter::once(pattern)),
            PathPredicate::Union(patterns) => Box::new(patterns.iter()),
        }
    }

    /// True iff this predicate contains no patterns at all.
    ///
    /// The presence of a pattern does not guarantee a matching object
    /// exists, but the absence of any pattern guarantees none can.
    pub fn is_empty(&self) -> bool {
        match self {
            PathPredicate::Pattern(_) => false,
            PathPredicate::Union(patterns) => patterns.is_empty(),
        }
    }

    /// Does any pattern fully match the path?
    pub fn matches(&self, path: &KeyPath) -> bool {
        self.patterns().any(|p| p.matches(path))
    }

    /// Could any pattern match some extension of the path?
    /// See [`PathPattern::successor_could_match`] for the `strict` contract.
    pub fn successor_could_match(&self, path: &KeyPath, strict: bool) -> bool {
        self.patterns()
            .any(|p| p.successor_could_match(path, strict))
    }

    /// Does any pattern fully match some prefix of the path?
    /// See [`PathPattern::ancestor_matches`] for the `strict` contract.
    pub fn ancestor_matches(&self, path: &KeyPath, strict: bool) -> bool {
        self.patterns().any(|p| p.ancestor_matches(path, strict))
    }

    /// Union of the children's next-key tokens below `path`.
    pub fn next_keys(&self, path: &KeyPath) -> BTreeSet<PatternToken> {
        self.patterns().flat_map(|p| p.next_keys(path)).collect()
    }

    /// Union of the children's next tokens that could accept a name.
    pub fn next_names(&self, path: &KeyPath) -> BTreeSet<PatternToken> {
        self.patterns().flat_map(|p| p.next_names(path)).collect()
    }

    /// Union of the children's next tokens that could accept an index.
    pub fn next_indices(&self, path: &KeyPath) -> BTreeSet<PatternToken> {
        self.patterns().flat_map(|p| p.next_indices(path)).collect()
    }

    /// The single pattern, if this predicate holds exactly one.
    pub fn singleton_pattern(&self) -> Option<&PathPattern> {
        match self {
            PathPredicate::Pattern(pattern) => Some(pattern),
            PathPredicate::Union(patterns) if patterns.len() == 1 => patterns.iter().next(),
            PathPredicate::Union(_) => None,
        }
    }

    /// The one path this predicate matches, if it is a single wildcard-free
    /// pattern.
    pub fn singleton_path(&self) -> Option<KeyPath> {
        self.singleton_pattern()?.singleton_path()
    }

    /// Substitute wildcards left to right in every pattern.
    /// See [`PathPattern::apply_keys`].
    pub fn apply_keys<S: AsRef<str>>(&self, keys: &[S]) -> PathPredicate {
        match self {
            PathPredicate::Pattern(pattern) => PathPredicate::Pattern(pattern.apply_keys(keys)),
            PathPredicate::Union(patterns) => {
                PathPredicate::Union(patterns.iter().map(|p| p.apply_keys(keys)).collect())
            }
        }
    }
}

impl From<PathPattern> for PathPredicate {
    fn from(pattern: PathPattern) -> Self {
        PathPredicate::Pattern(pattern)
    }
}

impl fmt::Display for PathPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for pattern in self.patterns() {
            if !first {
                write!(f, "|")?;
            }
            write!(f, "{pattern}")?;
            first = false;
        }
        Ok(())
    }
}
