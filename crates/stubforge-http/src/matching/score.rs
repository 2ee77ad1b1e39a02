//! Score primitives: the graded match range, behaviour conversion and
//! logical combination of scores.

use serde::{Deserialize, Serialize};

/// A match score in `[0.0, 1.0]`.
///
/// `1.0` is a full match, `0.0` a mismatch; intermediate values express
/// partial matches from graded matchers.
pub type Score = f64;

/// Canonical mismatch score.
pub const MISMATCH: Score = 0.0;

/// Canonical full-match score.
pub const PERFECT: Score = 1.0;

/// Whether a matcher accepts or rejects when its pattern matches.
///
/// The conversion is applied exactly once, at the point the raw score is
/// computed. Callers combine already-converted scores and must never
/// re-apply it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchBehaviour {
    /// The effective score is the raw score.
    #[default]
    AcceptOnMatch,

    /// The effective score is `1.0 - raw`.
    RejectOnMatch,
}

impl MatchBehaviour {
    /// Apply the behaviour to a raw score.
    #[inline]
    pub fn convert(self, raw: Score) -> Score {
        match self {
            MatchBehaviour::AcceptOnMatch => raw,
            MatchBehaviour::RejectOnMatch => PERFECT - raw,
        }
    }
}

/// Logical combinator over a sequence of scores.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchOperator {
    /// All must match: combined score is the minimum.
    And,

    /// Any may match: combined score is the maximum.
    #[default]
    Or,
}

impl MatchOperator {
    /// Combine a sequence of scores. An empty sequence is a mismatch.
    pub fn combine(self, scores: &[Score]) -> Score {
        if scores.is_empty() {
            return MISMATCH;
        }
        match self {
            MatchOperator::And => scores.iter().copied().fold(PERFECT, f64::min),
            MatchOperator::Or => scores.iter().copied().fold(MISMATCH, f64::max),
        }
    }

    /// Coerce boolean outcomes to `1.0`/`0.0` and combine them.
    pub fn combine_bools(self, outcomes: &[bool]) -> Score {
        let scores: Vec<Score> = outcomes.iter().map(|&b| score_from_bool(b)).collect();
        self.combine(&scores)
    }
}

/// Coerce a boolean outcome to a score.
#[inline]
pub fn score_from_bool(matched: bool) -> Score {
    if matched {
        PERFECT
    } else {
        MISMATCH
    }
}

/// Whether a score counts as a full match.
#[inline]
pub fn is_perfect(score: Score) -> bool {
    (score - PERFECT).abs() < f64::EPSILON
}
