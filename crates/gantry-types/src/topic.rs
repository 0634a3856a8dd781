//! Topic grammar and wildcard matching.
//!
//! Topics are hierarchical slash-separated strings; patterns are compiled
//! into a sequence of segment matchers and walked against the topic's
//! segments. Matching is a pure function of `(pattern, topic)`.

use crate::ErrorCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised when compiling a topic pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopicError {
    /// The pattern string is empty.
    #[error("topic pattern must not be empty")]
    Empty,

    /// `#` used anywhere but the final segment.
    #[error("wildcard '#' is only legal as the final segment: {0}")]
    WildcardPosition(String),
}

impl ErrorCode for TopicError {
    fn code(&self) -> &'static str {
        match self {
            Self::Empty => "TOPIC_EMPTY_PATTERN",
            Self::WildcardPosition(_) => "TOPIC_WILDCARD_POSITION",
        }
    }

    fn is_recoverable(&self) -> bool {
        // A malformed pattern never becomes valid on retry.
        false
    }
}

/// One compiled pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Matches a segment byte-for-byte.
    Literal(String),
    /// `*`: consumes exactly one segment, whatever its content.
    AnyOne,
    /// `#`: consumes the remainder, including an empty remainder.
    AnyRest,
}

/// A compiled topic pattern.
///
/// Supports exact segments plus the wildcards `*` (one segment) and `#`
/// (zero-or-more trailing segments). `#` is only legal as the final
/// segment; [`TopicExpr::parse`] rejects anything else.
///
/// # Example
///
/// ```
/// use gantry_types::TopicExpr;
///
/// let expr = TopicExpr::parse("/sensor/*/reading").unwrap();
/// assert!(expr.matches("/sensor/kitchen/reading"));
/// assert!(!expr.matches("/sensor/kitchen/reading/raw"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TopicExpr {
    pattern: String,
    segments: Vec<Segment>,
}

impl TopicExpr {
    /// Compiles a pattern into segment matchers.
    ///
    /// # Errors
    ///
    /// - [`TopicError::Empty`] for an empty pattern
    /// - [`TopicError::WildcardPosition`] if `#` is not the final segment
    pub fn parse(pattern: &str) -> Result<Self, TopicError> {
        if pattern.is_empty() {
            return Err(TopicError::Empty);
        }
        let parts: Vec<&str> = pattern.split('/').collect();
        let last = parts.len() - 1;
        let mut segments = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            let segment = match *part {
                "#" if i != last => {
                    return Err(TopicError::WildcardPosition(pattern.to_string()));
                }
                "#" => Segment::AnyRest,
                "*" => Segment::AnyOne,
                literal => Segment::Literal(literal.to_string()),
            };
            segments.push(segment);
        }
        Ok(Self {
            pattern: pattern.to_string(),
            segments,
        })
    }

    /// The source pattern this expression was compiled from.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Walks the compiled segments against `topic`.
    ///
    /// Returns `false` when either side is exhausted before the other,
    /// unless the pattern ends in `#`, which always succeeds once
    /// reached (it admits the empty remainder).
    #[must_use]
    pub fn matches(&self, topic: &str) -> bool {
        let mut parts = topic.split('/');
        let mut segments = self.segments.iter();
        loop {
            match segments.next() {
                Some(Segment::AnyRest) => return true,
                Some(segment) => match parts.next() {
                    Some(part) => {
                        if let Segment::Literal(literal) = segment {
                            if literal != part {
                                return false;
                            }
                        }
                    }
                    None => return false,
                },
                None => return parts.next().is_none(),
            }
        }
    }
}

impl TryFrom<String> for TopicExpr {
    type Error = TopicError;

    fn try_from(pattern: String) -> Result<Self, TopicError> {
        Self::parse(&pattern)
    }
}

impl From<TopicExpr> for String {
    fn from(expr: TopicExpr) -> String {
        expr.pattern
    }
}

impl std::fmt::Display for TopicExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// Returns `true` iff any pattern in `exprs` matches `topic`.
#[must_use]
pub fn any_match(exprs: &[TopicExpr], topic: &str) -> bool {
    exprs.iter().any(|expr| expr.matches(topic))
}
