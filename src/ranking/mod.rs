/// Client-side score fusion
///
/// Merges the lexical and vector candidate lists of a hybrid retrieval into
/// one ranked set. Lexical and vector scores live on incompatible scales, so
/// each list is normalized by its own maximum before the weighted merge.
/// Documents found by both legs carry both subscores and outrank documents
/// found by one leg with the same contributing subscore.

pub mod policy;

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::config::SimilarityConfig;
use crate::document::{Candidate, DocumentRef, Origin};

/// Weights applied to the normalized subscores during fusion.
#[derive(Debug, Clone, Copy)]
pub struct FusionPolicy {
    pub lexical_weight: f64,
    pub vector_weight: f64,
}

impl FusionPolicy {
    pub fn from_config(config: &SimilarityConfig) -> Self {
        FusionPolicy {
            lexical_weight: config.lexical_weight,
            vector_weight: config.vector_weight,
        }
    }
}

/// Fuse two single-leg candidate lists into one ranked set.
///
/// The output satisfies: one entry per document reference, both subscores
/// present (zero-filled for single-origin hits), fused score in
/// [0, lexical_weight + vector_weight], descending order with dual-origin
/// entries winning exact ties. Truncation is left to the policy filter so
/// type filtering never runs on an already-shortened list.
pub fn fuse(
    lexical: Vec<Candidate>,
    vector: Vec<Candidate>,
    policy: &FusionPolicy,
) -> Vec<Candidate> {
    let lexical = normalize(lexical);
    let vector = normalize(vector);

    let mut merged: Vec<Candidate> = Vec::with_capacity(lexical.len() + vector.len());
    let mut index: HashMap<DocumentRef, usize> = HashMap::new();

    for candidate in lexical.into_iter().chain(vector) {
        match index.get(&candidate.document) {
            Some(&i) => {
                let existing = &mut merged[i];
                if existing.origin == candidate.origin {
                    // duplicate within one leg, keep the first (higher) hit
                    continue;
                }
                existing.origin = Origin::Hybrid;
                if existing.lexical_score.is_none() {
                    existing.lexical_score = candidate.lexical_score;
                }
                if existing.vector_score.is_none() {
                    existing.vector_score = candidate.vector_score;
                }
                if existing.title.is_empty() {
                    existing.title = candidate.title;
                }
                if existing.url.is_empty() {
                    existing.url = candidate.url;
                }
                if existing.snippet.is_empty() {
                    existing.snippet = candidate.snippet;
                }
            }
            None => {
                index.insert(candidate.document.clone(), merged.len());
                merged.push(candidate);
            }
        }
    }

    for candidate in &mut merged {
        let lexical_part = candidate.lexical_score.unwrap_or(0.0);
        let vector_part = candidate.vector_score.unwrap_or(0.0);
        candidate.lexical_score = Some(lexical_part);
        candidate.vector_score = Some(vector_part);
        candidate.score = policy.lexical_weight * lexical_part + policy.vector_weight * vector_part;
    }

    merged.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| origin_rank(a).cmp(&origin_rank(b)))
    });

    merged
}

/// Scale a list's scores to [0, 1] by its own maximum.
///
/// A maximum of zero or below leaves the list untouched, since dividing by
/// it would be meaningless or amplifying.
fn normalize(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    let max = candidates.iter().map(|c| c.score).fold(0.0_f64, f64::max);
    if max > 0.0 {
        for candidate in &mut candidates {
            candidate.score /= max;
            if let Some(score) = candidate.lexical_score.as_mut() {
                *score /= max;
            }
            if let Some(score) = candidate.vector_score.as_mut() {
                *score /= max;
            }
        }
    }
    candidates
}

fn origin_rank(candidate: &Candidate) -> u8 {
    match candidate.origin {
        Origin::Hybrid => 0,
        Origin::Lexical | Origin::Vector => 1,
    }
}
