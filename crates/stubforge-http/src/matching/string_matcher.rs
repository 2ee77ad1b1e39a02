//! Leaf matchers: pure predicates over a single string value.
//!
//! A leaf matcher holds its configured pattern and case flag, applies its
//! [`MatchBehaviour`] to the raw outcome exactly once, and reports a graded
//! [`Score`]. The trait channel is `f64` rather than `bool` so graded
//! matchers (e.g. string similarity) can be added without touching the
//! combination logic in the field matchers.

use super::score::{score_from_bool, MatchBehaviour, Score};
use regex::RegexBuilder;
use wildmatch::WildMatch;

/// A pure, total predicate over one string value.
///
/// Implementations are immutable after construction and safe for unbounded
/// concurrent invocation.
pub trait StringScorer: Send + Sync {
    /// Diagnostic name recorded alongside scores.
    fn name(&self) -> &'static str;

    /// Score a value against the configured pattern. Never fails: absence
    /// of a match is a score, not an error.
    fn score(&self, value: &str) -> Score;
}

/// Glob matcher supporting `*` (any run) and `?` (any single character).
///
/// A pattern without wildcards degenerates to an exact literal comparison.
/// The full value must match the pattern.
pub struct WildcardMatcher {
    pattern: String,
    glob: WildMatch,
    ignore_case: bool,
    behaviour: MatchBehaviour,
}

impl WildcardMatcher {
    pub fn new(behaviour: MatchBehaviour, pattern: &str, ignore_case: bool) -> Self {
        // Pre-lower the pattern once so case-insensitive scoring only pays
        // for lowering the incoming value.
        let glob = if ignore_case {
            WildMatch::new(&pattern.to_lowercase())
        } else {
            WildMatch::new(pattern)
        };
        Self {
            pattern: pattern.to_string(),
            glob,
            ignore_case,
            behaviour,
        }
    }

    /// The configured pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn is_match(&self, value: &str) -> bool {
        if self.ignore_case {
            self.glob.matches(&value.to_lowercase())
        } else {
            self.glob.matches(value)
        }
    }
}

impl StringScorer for WildcardMatcher {
    fn name(&self) -> &'static str {
        "wildcard"
    }

    fn score(&self, value: &str) -> Score {
        self.behaviour.convert(score_from_bool(self.is_match(value)))
    }
}

/// Regular-expression matcher (search semantics, not anchored).
pub struct RegexMatcher {
    pattern: String,
    regex: regex::Regex,
    behaviour: MatchBehaviour,
}

impl RegexMatcher {
    /// Compile the pattern eagerly; an invalid pattern is a configuration
    /// error surfaced at construction, never at match time.
    pub fn new(
        behaviour: MatchBehaviour,
        pattern: &str,
        ignore_case: bool,
    ) -> Result<Self, super::ConfigError> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .build()
            .map_err(|e| super::ConfigError::InvalidPattern(pattern.to_string(), e.to_string()))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            behaviour,
        })
    }

    /// The configured pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl StringScorer for RegexMatcher {
    fn name(&self) -> &'static str {
        "regex"
    }

    fn score(&self, value: &str) -> Score {
        self.behaviour
            .convert(score_from_bool(self.regex.is_match(value)))
    }
}
