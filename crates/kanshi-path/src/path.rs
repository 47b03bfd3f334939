//! Key segments and concrete paths into the target model tree.
//!
//! A path is an ordered sequence of string segments. Every segment is
//! classified by lexical shape as exactly one of *name* or *index*: a
//! segment made entirely of ASCII digits is an index, anything else is a
//! name. Indices are stored without brackets; brackets belong to the
//! printed syntax only (`Processes[0].Threads`).

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::pattern::{PatternToken, parse_tokens};
use crate::{PatternError, PatternResult};

/// True if the segment is an index: non-empty and all ASCII digits.
pub fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// True if the segment is a name. Every segment is exactly one of the two.
pub fn is_name(segment: &str) -> bool {
    !is_index(segment)
}

/// Order two sibling segments: indices numerically, names lexicographically,
/// indices before names.
pub fn compare_segments(a: &str, b: &str) -> Ordering {
    match (is_index(a), is_index(b)) {
        (true, true) => compare_indices(a, b),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.cmp(b),
    }
}

/// Exact numeric comparison of digit strings, without parsing into a fixed
/// width integer: strip leading zeros, compare lengths, then bytes.
fn compare_indices(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// A concrete location in the target model tree.
///
/// Immutable once built; extension clones. Paths order by the canonical
/// comparator: segment-by-segment over the common prefix using
/// [`compare_segments`], then shorter-prefix-first, so `Threads[2]` sorts
/// before `Threads[10]` and a node sorts before its successors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// The empty path, addressing the root of the tree.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from segments. Indices are given bare (`"0"`, not `"[0]"`).
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse from the dotted/bracketed syntax, e.g. `Processes[0].Threads`.
    ///
    /// Wildcard segments are rejected here; a concrete path has none.
    pub fn parse(text: &str) -> PatternResult<Self> {
        let mut segments = Vec::new();
        for token in parse_tokens(text)? {
            match token {
                PatternToken::Literal(seg) => segments.push(seg),
                PatternToken::AnyName | PatternToken::AnyIndex => {
                    return Err(PatternError::WildcardInPath(text.to_string()));
                }
            }
        }
        Ok(Self { segments })
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// A new path with one more segment appended.
    pub fn extended(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }
}

impl Ord for KeyPath {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.segments.iter().zip(&other.segments) {
            match compare_segments(a, b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        self.segments.len().cmp(&other.segments.len())
    }
}

impl PartialOrd for KeyPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for seg in &self.segments {
            if is_index(seg) {
                write!(f, "[{seg}]")?;
            } else if first {
                write!(f, "{seg}")?;
            } else {
                write!(f, ".{seg}")?;
            }
            first = false;
        }
        Ok(())
    }
}

impl FromStr for KeyPath {
    type Err = PatternError;

    fn from_str(s: &str) -> PatternResult<Self> {
        Self::parse(s)
    }
}

// Paths ride the wire in their printed form, not as raw segment lists.
impl Serialize for KeyPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for KeyPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
