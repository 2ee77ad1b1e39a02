//! Scoring-based request matching.
//!
//! Matching is graded, not boolean: every matcher reports a score in
//! `[0.0, 1.0]` where `1.0` is a full match and `0.0` a mismatch. Scores
//! compose through [`MatchOperator`] (AND = minimum, OR = maximum) and a
//! matcher's [`MatchBehaviour`] can invert its own score to express
//! reject-on-match rules.
//!
//! # Module Structure
//!
//! - `score` - score range, behaviour conversion and operator combination
//! - `string_matcher` - leaf matchers over a single string value
//! - `header_matcher` - the header field matcher (the representative field
//!   matcher; other request attributes plug in through [`RequestMatcher`])
//! - `result` - the per-pass score accumulator
//!
//! All matchers are immutable after construction and safe to evaluate from
//! any number of requests concurrently.

mod header_matcher;
mod result;
mod score;
mod string_matcher;

pub use header_matcher::{ConfigError, HeaderMatcher, HeaderPredicate, RequestMatcher};
pub use result::{MatchResult, MatchScoreEntry};
pub use score::{MatchBehaviour, MatchOperator, Score, MISMATCH, PERFECT};
pub use string_matcher::{RegexMatcher, StringScorer, WildcardMatcher};
