//! Header field matcher.
//!
//! Combines one or more leaf matchers (or arbitrary predicates over the
//! whole header map) into a single score for the request. The same
//! combination algorithm generalizes to any other request attribute by
//! swapping the observed-value extraction; headers are the representative
//! implementation.

use super::result::MatchResult;
use super::score::{MatchBehaviour, MatchOperator, Score, MISMATCH};
use super::string_matcher::{StringScorer, WildcardMatcher};
use crate::model::RequestMessage;
use std::collections::HashMap;
use std::sync::Arc;

/// Eagerly reported configuration error. Matcher construction validates
/// its inputs and fails fast; nothing is deferred to match time.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("header name must not be empty")]
    EmptyName,
    #[error("at least one pattern is required")]
    NoPatterns,
    #[error("at least one predicate is required")]
    NoPredicates,
    #[error("invalid pattern '{0}': {1}")]
    InvalidPattern(String, String),
}

/// Arbitrary predicate over the (optionally case-normalized) header map.
pub type HeaderPredicate = Arc<dyn Fn(&HashMap<String, Vec<String>>) -> bool + Send + Sync>;

/// A matcher over one request attribute, reporting into the accumulator.
///
/// Implementations are immutable configuration created when a mapping is
/// registered; evaluation is pure and safe under unlimited request-level
/// parallelism.
pub trait RequestMatcher: Send + Sync {
    /// Diagnostic name recorded in the accumulator.
    fn name(&self) -> &'static str;

    /// Score the request, recording the result into `result`.
    fn score(&self, request: &RequestMessage, result: &mut MatchResult) -> Score;
}

enum HeaderMatcherInner {
    Patterns {
        header: String,
        matchers: Vec<Arc<dyn StringScorer>>,
    },
    Predicates(Vec<HeaderPredicate>),
}

/// Matches one named header against configured patterns, or the whole
/// header map against configured predicates.
pub struct HeaderMatcher {
    behaviour: MatchBehaviour,
    operator: MatchOperator,
    ignore_case: bool,
    inner: HeaderMatcherInner,
}

impl HeaderMatcher {
    /// Single glob pattern against one header, `Or` operator.
    pub fn new(
        behaviour: MatchBehaviour,
        header: &str,
        pattern: &str,
        ignore_case: bool,
    ) -> Result<Self, ConfigError> {
        Self::with_patterns(
            behaviour,
            MatchOperator::default(),
            header,
            ignore_case,
            &[pattern],
        )
    }

    /// One or more glob patterns against one header.
    ///
    /// Each pattern becomes a [`WildcardMatcher`] carrying this matcher's
    /// behaviour and case flag.
    pub fn with_patterns(
        behaviour: MatchBehaviour,
        operator: MatchOperator,
        header: &str,
        ignore_case: bool,
        patterns: &[&str],
    ) -> Result<Self, ConfigError> {
        let matchers = patterns
            .iter()
            .map(|pattern| {
                Arc::new(WildcardMatcher::new(behaviour, pattern, ignore_case))
                    as Arc<dyn StringScorer>
            })
            .collect();
        Self::with_matchers(behaviour, operator, header, ignore_case, matchers)
    }

    /// One or more pre-built leaf matchers against one header.
    ///
    /// The leaves carry their own behaviour; this matcher's behaviour is
    /// only applied to the missing-header case.
    pub fn with_matchers(
        behaviour: MatchBehaviour,
        operator: MatchOperator,
        header: &str,
        ignore_case: bool,
        matchers: Vec<Arc<dyn StringScorer>>,
    ) -> Result<Self, ConfigError> {
        if header.is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if matchers.is_empty() {
            return Err(ConfigError::NoPatterns);
        }
        Ok(Self {
            behaviour,
            operator,
            ignore_case,
            inner: HeaderMatcherInner::Patterns {
                header: header.to_string(),
                matchers,
            },
        })
    }

    /// Arbitrary predicates over the full header map.
    ///
    /// When `ignore_case` is set the map handed to each predicate has
    /// lowercased names.
    pub fn from_predicates(
        predicates: Vec<HeaderPredicate>,
        ignore_case: bool,
    ) -> Result<Self, ConfigError> {
        if predicates.is_empty() {
            return Err(ConfigError::NoPredicates);
        }
        Ok(Self {
            behaviour: MatchBehaviour::default(),
            operator: MatchOperator::default(),
            ignore_case,
            inner: HeaderMatcherInner::Predicates(predicates),
        })
    }

    fn is_match(&self, request: &RequestMessage) -> Score {
        let lookup = request.headers.lookup(self.ignore_case);

        match &self.inner {
            HeaderMatcherInner::Predicates(predicates) => {
                let outcomes: Vec<bool> = predicates.iter().map(|p| p(&lookup)).collect();
                self.operator.combine_bools(&outcomes)
            }
            HeaderMatcherInner::Patterns { header, matchers } => {
                let key = if self.ignore_case {
                    header.to_lowercase()
                } else {
                    header.clone()
                };
                let Some(values) = lookup.get(&key) else {
                    // "does not have this header" satisfies a reject rule
                    return self.behaviour.convert(MISMATCH);
                };

                // Every observed value must satisfy a pattern for that
                // pattern to count; the configured operator then combines
                // across patterns (Or: any one pattern suffices).
                let per_matcher: Vec<Score> = matchers
                    .iter()
                    .map(|matcher| {
                        let per_value: Vec<Score> =
                            values.iter().map(|value| matcher.score(value)).collect();
                        MatchOperator::And.combine(&per_value)
                    })
                    .collect();
                self.operator.combine(&per_matcher)
            }
        }
    }
}

impl RequestMatcher for HeaderMatcher {
    fn name(&self) -> &'static str {
        "headers"
    }

    fn score(&self, request: &RequestMessage, result: &mut MatchResult) -> Score {
        let score = self.is_match(request);
        result.add_score(self.name(), score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::{RegexMatcher, PERFECT};
    use url::Url;

    fn request_with_headers(headers: &[(&str, &str)]) -> RequestMessage {
        let mut request = RequestMessage::new(
            "GET",
            Url::parse("http://localhost/test").unwrap(),
            "127.0.0.1",
        );
        for (name, value) in headers {
            request.headers.add(name, *value);
        }
        request
    }

    #[test]
    fn test_all_values_match_glob() {
        // X-Foo: [BARBAZ, bar] against bar* (case-insensitive) -> 1.0
        let matcher =
            HeaderMatcher::new(MatchBehaviour::AcceptOnMatch, "X-Foo", "bar*", true).unwrap();
        let request = request_with_headers(&[("X-Foo", "BARBAZ"), ("X-Foo", "bar")]);

        let mut result = MatchResult::new();
        assert_eq!(matcher.score(&request, &mut result), PERFECT);
        assert_eq!(result.entries().len(), 1);
        assert_eq!(result.entries()[0].matcher, "headers");
    }

    #[test]
    fn test_one_value_failing_fails_the_pattern() {
        // X-Foo: [BARBAZ, qux] -> qux fails bar* -> AND over values -> 0.0
        let matcher =
            HeaderMatcher::new(MatchBehaviour::AcceptOnMatch, "X-Foo", "bar*", true).unwrap();
        let request = request_with_headers(&[("X-Foo", "BARBAZ"), ("X-Foo", "qux")]);

        let mut result = MatchResult::new();
        assert_eq!(matcher.score(&request, &mut result), MISMATCH);
    }

    #[test]
    fn test_missing_header_accept_vs_reject() {
        let request = request_with_headers(&[("X-Other", "1")]);

        let accept =
            HeaderMatcher::new(MatchBehaviour::AcceptOnMatch, "X-Foo", "*", true).unwrap();
        let mut result = MatchResult::new();
        assert_eq!(accept.score(&request, &mut result), MISMATCH);

        let reject =
            HeaderMatcher::new(MatchBehaviour::RejectOnMatch, "X-Foo", "*", true).unwrap();
        let mut result = MatchResult::new();
        assert_eq!(reject.score(&request, &mut result), PERFECT);
    }

    #[test]
    fn test_or_across_patterns_takes_maximum() {
        let matcher = HeaderMatcher::with_patterns(
            MatchBehaviour::AcceptOnMatch,
            MatchOperator::Or,
            "Accept",
            true,
            &["application/json", "application/xml"],
        )
        .unwrap();

        let json = request_with_headers(&[("Accept", "application/json")]);
        let xml = request_with_headers(&[("Accept", "application/xml")]);
        let html = request_with_headers(&[("Accept", "text/html")]);

        let mut result = MatchResult::new();
        assert_eq!(matcher.score(&json, &mut result), PERFECT);
        assert_eq!(matcher.score(&xml, &mut result), PERFECT);
        assert_eq!(matcher.score(&html, &mut result), MISMATCH);
    }

    #[test]
    fn test_and_across_patterns_requires_all() {
        let matcher = HeaderMatcher::with_patterns(
            MatchBehaviour::AcceptOnMatch,
            MatchOperator::And,
            "X-Tag",
            true,
            &["*beta*", "*v2*"],
        )
        .unwrap();

        let both = request_with_headers(&[("X-Tag", "beta-v2")]);
        let one = request_with_headers(&[("X-Tag", "beta-v1")]);

        let mut result = MatchResult::new();
        assert_eq!(matcher.score(&both, &mut result), PERFECT);
        assert_eq!(matcher.score(&one, &mut result), MISMATCH);
    }

    #[test]
    fn test_case_sensitive_header_name() {
        let matcher =
            HeaderMatcher::new(MatchBehaviour::AcceptOnMatch, "x-foo", "1", false).unwrap();

        // Name lookup is case-sensitive when ignore_case is off
        let request = request_with_headers(&[("X-Foo", "1")]);
        let mut result = MatchResult::new();
        assert_eq!(matcher.score(&request, &mut result), MISMATCH);

        let request = request_with_headers(&[("x-foo", "1")]);
        let mut result = MatchResult::new();
        assert_eq!(matcher.score(&request, &mut result), PERFECT);
    }

    #[test]
    fn test_custom_leaf_matchers() {
        let leaves: Vec<Arc<dyn StringScorer>> = vec![Arc::new(
            RegexMatcher::new(MatchBehaviour::AcceptOnMatch, r"^req-\d+$", false).unwrap(),
        )];
        let matcher = HeaderMatcher::with_matchers(
            MatchBehaviour::AcceptOnMatch,
            MatchOperator::Or,
            "X-Request-Id",
            true,
            leaves,
        )
        .unwrap();

        let request = request_with_headers(&[("X-Request-Id", "req-123")]);
        let mut result = MatchResult::new();
        assert_eq!(matcher.score(&request, &mut result), PERFECT);
    }

    #[test]
    fn test_predicates_over_normalized_map() {
        let predicates: Vec<HeaderPredicate> = vec![
            Arc::new(|headers| headers.contains_key("authorization")),
            Arc::new(|headers| {
                headers
                    .get("authorization")
                    .map(|v| v.iter().any(|t| t.starts_with("Bearer ")))
                    .unwrap_or(false)
            }),
        ];
        let matcher = HeaderMatcher::from_predicates(predicates, true).unwrap();

        let request = request_with_headers(&[("Authorization", "Bearer abc")]);
        let mut result = MatchResult::new();
        // Or operator: either predicate holding suffices
        assert_eq!(matcher.score(&request, &mut result), PERFECT);

        let request = request_with_headers(&[("X-Other", "1")]);
        let mut result = MatchResult::new();
        assert_eq!(matcher.score(&request, &mut result), MISMATCH);
    }

    #[test]
    fn test_empty_configuration_is_rejected() {
        assert!(HeaderMatcher::new(MatchBehaviour::AcceptOnMatch, "", "*", true).is_err());
        assert!(HeaderMatcher::with_patterns(
            MatchBehaviour::AcceptOnMatch,
            MatchOperator::Or,
            "X-Foo",
            true,
            &[],
        )
        .is_err());
        assert!(HeaderMatcher::from_predicates(Vec::new(), false).is_err());
    }
}
