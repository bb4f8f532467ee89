/// Algorithm selection for a retrieval
///
/// Maps the configured mode token plus the backend capability signal onto
/// exactly one concrete algorithm path. Pure, no side effects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::KindredError;

/// Configured similarity mode token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityMode {
    Auto,
    Lexical,
    Vector,
    Hybrid,
}

impl fmt::Display for SimilarityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimilarityMode::Auto => write!(f, "auto"),
            SimilarityMode::Lexical => write!(f, "lexical"),
            SimilarityMode::Vector => write!(f, "vector"),
            SimilarityMode::Hybrid => write!(f, "hybrid"),
        }
    }
}

impl FromStr for SimilarityMode {
    type Err = KindredError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(SimilarityMode::Auto),
            "lexical" => Ok(SimilarityMode::Lexical),
            "vector" => Ok(SimilarityMode::Vector),
            "hybrid" => Ok(SimilarityMode::Hybrid),
            other => Err(KindredError::config(
                "similarity.mode",
                &format!("unknown mode token '{}' (expected auto|lexical|vector|hybrid)", other),
            )),
        }
    }
}

/// Concrete algorithm path a retrieval runs.
///
/// Hybrid issues both the lexical and vector sub-queries and fuses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmPath {
    Lexical,
    Vector,
    Hybrid,
}

impl fmt::Display for AlgorithmPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgorithmPath::Lexical => write!(f, "lexical"),
            AlgorithmPath::Vector => write!(f, "vector"),
            AlgorithmPath::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// Resolve a mode token against the "vector search enabled" capability signal.
///
/// `auto` picks hybrid when the backend carries vectors, lexical otherwise.
/// Explicit modes pass through untouched: a misconfigured explicit vector
/// mode surfaces as empty results from the backend, not as a silent rewrite.
pub fn resolve(mode: SimilarityMode, vector_search_enabled: bool) -> AlgorithmPath {
    match mode {
        SimilarityMode::Auto => {
            if vector_search_enabled {
                AlgorithmPath::Hybrid
            } else {
                AlgorithmPath::Lexical
            }
        }
        SimilarityMode::Lexical => AlgorithmPath::Lexical,
        SimilarityMode::Vector => AlgorithmPath::Vector,
        SimilarityMode::Hybrid => AlgorithmPath::Hybrid,
    }
}
