/// Result filtering policy
///
/// Pure filters applied to an already-ranked result set, in a fixed order:
/// type allow-list (which disables the deny-list), type deny-list, absolute
/// score threshold, relative score threshold, then truncation. Nothing here
/// re-sorts.

use crate::config::SimilarityConfig;
use crate::document::Candidate;

/// Post-ranking filter settings for one retrieval.
#[derive(Debug, Clone)]
pub struct FilterPolicy {
    /// Keep only these types when non-empty; the deny-list is then ignored
    pub allowed_types: Vec<String>,
    /// Drop these types when no allow-list is set
    pub denied_types: Vec<String>,
    /// Drop candidates scoring below this (a value <= 0 disables it)
    pub min_score: f64,
    /// Drop candidates scoring below top_score * ratio, where top_score is
    /// the first entry's score before any filtering (<= 0 disables it)
    pub min_score_ratio: f64,
    /// Final result count (0 disables truncation)
    pub max_results: usize,
}

impl FilterPolicy {
    pub fn from_config(config: &SimilarityConfig) -> Self {
        FilterPolicy {
            allowed_types: config.allowed_type_list(),
            denied_types: config.denied_type_list(),
            min_score: config.min_score,
            min_score_ratio: config.min_score_ratio,
            max_results: config.max_results,
        }
    }

    /// Apply all enabled filters to a ranked candidate list.
    pub fn apply(&self, candidates: Vec<Candidate>) -> Vec<Candidate> {
        let top_score = candidates.first().map(|c| c.score).unwrap_or(0.0);
        let mut result = candidates;

        if !self.allowed_types.is_empty() {
            result.retain(|c| self.allowed_types.contains(&c.doc_type));
        } else if !self.denied_types.is_empty() {
            result.retain(|c| !self.denied_types.contains(&c.doc_type));
        }

        if self.min_score > 0.0 {
            result.retain(|c| c.score >= self.min_score);
        }

        if self.min_score_ratio > 0.0 {
            let cutoff = top_score * self.min_score_ratio;
            result.retain(|c| c.score >= cutoff);
        }

        if self.max_results > 0 && result.len() > self.max_results {
            result.truncate(self.max_results);
        }

        result
    }
}
