//! Path patterns: fixed-length token sequences matched against paths.
//!
//! Implements the addressing glob of the target model:
//! - a bare segment is a literal name (`Threads`)
//! - `[2]` is a literal index
//! - an empty segment matches any name
//! - `[]` matches any index
//!
//! `Processes[].Threads[].Stack.Frames[]` is a seven-token pattern. There is
//! no "any number of segments" token; a pattern only ever matches paths of
//! its own length, which is what lets the walkers prune aggressively.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::path::{KeyPath, is_index, is_name};
use crate::{PatternError, PatternResult};

/// One position in a pattern.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PatternToken {
    /// Matches exactly this segment.
    Literal(String),
    /// Matches any name segment. Printed as an empty segment.
    AnyName,
    /// Matches any index segment. Printed as `[]`.
    AnyIndex,
}

impl PatternToken {
    /// Does this token accept the given segment?
    pub fn key_matches(&self, segment: &str) -> bool {
        match self {
            PatternToken::Literal(lit) => lit == segment,
            PatternToken::AnyName => is_name(segment),
            PatternToken::AnyIndex => is_index(segment),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        !matches!(self, PatternToken::Literal(_))
    }

    /// The literal segment, if this token is one.
    pub fn literal(&self) -> Option<&str> {
        match self {
            PatternToken::Literal(lit) => Some(lit),
            _ => None,
        }
    }
}

/// Does any token in the set accept the segment?
pub fn any_matches<'a, I>(tokens: I, segment: &str) -> bool
where
    I: IntoIterator<Item = &'a PatternToken>,
{
    tokens.into_iter().any(|t| t.key_matches(segment))
}

/// A fixed-length sequence of tokens describing a set of paths.
///
/// Immutable once constructed. A pattern only matches paths of exactly its
/// own length; viability of shorter paths is a separate query
/// ([`PathPattern::successor_could_match`]).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathPattern {
    tokens: Vec<PatternToken>,
}

impl PathPattern {
    /// The empty pattern: matches only the root path.
    pub fn root() -> Self {
        Self { tokens: Vec::new() }
    }

    pub fn new<I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = PatternToken>,
    {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }

    /// Build from raw token strings: `""` is the wildcard name, `"[]"` the
    /// wildcard index, anything else a literal (indices given bare: `"0"`).
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tokens: keys
                .into_iter()
                .map(|k| match k.as_ref() {
                    "" => PatternToken::AnyName,
                    "[]" => PatternToken::AnyIndex,
                    lit => PatternToken::Literal(lit.to_string()),
                })
                .collect(),
        }
    }

    /// Parse the dotted/bracketed syntax, e.g. `Processes[].Threads[]`.
    pub fn parse(text: &str) -> PatternResult<Self> {
        Ok(Self {
            tokens: parse_tokens(text)?,
        })
    }

    pub fn tokens(&self) -> &[PatternToken] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_root(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Full match: equal length and every position accepts its segment.
    pub fn matches(&self, path: &KeyPath) -> bool {
        self.tokens.len() == path.len() && self.prefix_matches(path)
    }

    /// Could some extension of `path` match this pattern?
    ///
    /// True iff `path` is a positional prefix of the pattern. With `strict`,
    /// the exact-length case (an already complete match) is excluded, which
    /// lets callers distinguish "keep descending" from "already matched
    /// here". Paths longer than the pattern are never viable.
    pub fn successor_could_match(&self, path: &KeyPath, strict: bool) -> bool {
        if path.len() > self.tokens.len() {
            return false;
        }
        if strict && path.len() == self.tokens.len() {
            return false;
        }
        self.prefix_matches(path)
    }

    /// Does some prefix of `path` fully match this pattern?
    ///
    /// With `strict`, the path itself does not count as its own ancestor.
    pub fn ancestor_matches(&self, path: &KeyPath, strict: bool) -> bool {
        if path.len() < self.tokens.len() {
            return false;
        }
        if strict && path.len() == self.tokens.len() {
            return false;
        }
        self.prefix_matches(path)
    }

    // Every position that exists on both sides matches. zip stops at the
    // shorter sequence, so length policy stays with the callers above.
    fn prefix_matches(&self, path: &KeyPath) -> bool {
        self.tokens
            .iter()
            .zip(path.segments())
            .all(|(token, segment)| token.key_matches(segment))
    }

    /// The token that would have to match directly below `path`, if any.
    pub fn next_keys(&self, path: &KeyPath) -> BTreeSet<PatternToken> {
        self.tokens.get(path.len()).cloned().into_iter().collect()
    }

    /// The next token, if it could accept a name segment.
    pub fn next_names(&self, path: &KeyPath) -> BTreeSet<PatternToken> {
        let mut out = BTreeSet::new();
        match self.tokens.get(path.len()) {
            Some(token @ PatternToken::AnyName) => {
                out.insert(token.clone());
            }
            Some(token @ PatternToken::Literal(lit)) if is_name(lit) => {
                out.insert(token.clone());
            }
            _ => {}
        }
        out
    }

    /// The next token, if it could accept an index segment.
    pub fn next_indices(&self, path: &KeyPath) -> BTreeSet<PatternToken> {
        let mut out = BTreeSet::new();
        match self.tokens.get(path.len()) {
            Some(token @ PatternToken::AnyIndex) => {
                out.insert(token.clone());
            }
            Some(token @ PatternToken::Literal(lit)) if is_index(lit) => {
                out.insert(token.clone());
            }
            _ => {}
        }
        out
    }

    /// The one path this pattern matches, if it has no wildcards.
    pub fn singleton_path(&self) -> Option<KeyPath> {
        let mut segments = Vec::with_capacity(self.tokens.len());
        for token in &self.tokens {
            segments.push(token.literal()?.to_string());
        }
        Some(KeyPath::new(segments))
    }

    /// Substitute wildcards from left to right with the given keys.
    ///
    /// Each wildcard (either kind) consumes the next unconsumed key and
    /// becomes a literal. Leftover wildcards stay when keys run out;
    /// leftover keys are ignored when tokens run out. Never fails.
    pub fn apply_keys<S: AsRef<str>>(&self, keys: &[S]) -> PathPattern {
        let mut remaining = keys.iter();
        let tokens = self
            .tokens
            .iter()
            .map(|token| {
                if token.is_wildcard()
                    && let Some(key) = remaining.next()
                {
                    PatternToken::Literal(key.as_ref().to_string())
                } else {
                    token.clone()
                }
            })
            .collect();
        Self { tokens }
    }

    /// [`PathPattern::apply_keys`] with decimal integer keys.
    pub fn apply_int_keys(&self, keys: &[u64]) -> PathPattern {
        let keys: Vec<String> = keys.iter().map(u64::to_string).collect();
        self.apply_keys(&keys)
    }
}

/// Tokenize the dotted/bracketed syntax shared by paths and patterns.
///
/// The empty string is the root (zero tokens). Each `.`-separated piece is
/// an optional leading name followed by any number of `[...]` groups, so
/// `Frames[0][1]` yields three tokens.
pub(crate) fn parse_tokens(text: &str) -> PatternResult<Vec<PatternToken>> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    let mut tokens = Vec::new();
    for piece in text.split('.') {
        parse_piece(piece, &mut tokens)?;
    }
    Ok(tokens)
}

fn parse_piece(piece: &str, tokens: &mut Vec<PatternToken>) -> PatternResult<()> {
    if piece.is_empty() {
        tokens.push(PatternToken::AnyName);
        return Ok(());
    }
    let (name, mut rest) = match piece.find('[') {
        Some(pos) => piece.split_at(pos),
        None => (piece, ""),
    };
    if !name.is_empty() {
        tokens.push(PatternToken::Literal(name.to_string()));
    }
    while !rest.is_empty() {
        let Some(inner) = rest.strip_prefix('[') else {
            return Err(PatternError::TrailingText(piece.to_string()));
        };
        let Some(end) = inner.find(']') else {
            return Err(PatternError::UnclosedBracket(piece.to_string()));
        };
        match &inner[..end] {
            "" => tokens.push(PatternToken::AnyIndex),
            content if is_index(content) => {
                tokens.push(PatternToken::Literal(content.to_string()));
            }
            _ => return Err(PatternError::NonNumericIndex(piece.to_string())),
        }
        rest = &inner[end + 1..];
    }
    Ok(())
}

// Same rendering rules as KeyPath: names dotted, indices and wildcard
// indices bracketed, wildcard names as empty segments.
impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for token in &self.tokens {
            match token {
                PatternToken::Literal(lit) if is_index(lit) => write!(f, "[{lit}]")?,
                PatternToken::AnyIndex => write!(f, "[]")?,
                PatternToken::Literal(lit) => {
                    if first {
                        write!(f, "{lit}")?;
                    } else {
                        write!(f, ".{lit}")?;
                    }
                }
                PatternToken::AnyName => {
                    if !first {
                        write!(f, ".")?;
                    }
                }
            }
            first = false;
        }
        Ok(())
    }
}

impl FromStr for PathPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> PatternResult<Self> {
        Self::parse(s)
    }
}

impl Serialize for PathPattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PathPattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
