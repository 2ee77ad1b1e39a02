//! Per-pass score accumulator.

use super::score::{is_perfect, Score, MISMATCH};

/// One recorded matcher contribution.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchScoreEntry {
    /// Diagnostic name of the matcher that produced the score.
    pub matcher: &'static str,
    pub score: Score,
}

/// Diagnostic accumulator for one matching pass over one request.
///
/// Owned exclusively by that pass: created per request, discarded when the
/// pass completes, never shared across concurrent passes.
#[derive(Debug, Default)]
pub struct MatchResult {
    entries: Vec<MatchScoreEntry>,
}

impl MatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a matcher's contribution and hand the score back so callers
    /// can record and return in one expression.
    pub fn add_score(&mut self, matcher: &'static str, score: Score) -> Score {
        self.entries.push(MatchScoreEntry { matcher, score });
        score
    }

    /// Recorded contributions, in evaluation order.
    pub fn entries(&self) -> &[MatchScoreEntry] {
        &self.entries
    }

    /// Mean score across all contributions; mismatch when nothing ran.
    pub fn average_score(&self) -> Score {
        if self.entries.is_empty() {
            return MISMATCH;
        }
        self.entries.iter().map(|e| e.score).sum::<Score>() / self.entries.len() as Score
    }

    /// Whether every contribution was a full match.
    pub fn is_perfect(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(|e| is_perfect(e.score))
    }
}
