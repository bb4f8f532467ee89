/// Core document and candidate types
///
/// A DocumentRef identifies a content item independent of its search-index
/// representation; a Candidate is one normalized similar-document hit as the
/// parser, fusion engine, and policy filter pass it along.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::KindredError;

/// The (type, uid) pair identifying a content document.
///
/// Request-side refs are built through `new`, which rejects uid 0.
/// Parser-side refs may carry uid 0 when the index document lacks the field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Record type the document belongs to, e.g. "pages" or "tt_content"
    pub doc_type: String,
    /// Record uid within its type
    pub uid: u32,
}

impl DocumentRef {
    /// Build a validated reference to an existing document.
    pub fn new(doc_type: impl Into<String>, uid: u32) -> Result<Self, KindredError> {
        let doc_type = doc_type.into();
        if doc_type.trim().is_empty() {
            return Err(KindredError::InvalidConfiguration(
                "document type must not be empty".to_string(),
            ));
        }
        if uid == 0 {
            return Err(KindredError::InvalidConfiguration(
                "document uid must be greater than zero".to_string(),
            ));
        }
        Ok(DocumentRef { doc_type, uid })
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.doc_type, self.uid)
    }
}

/// Which retrieval leg produced a candidate.
///
/// Fusion upgrades a candidate found by both legs to Hybrid; the tag is kept
/// on the final result for observability and the tie-break rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Lexical,
    Vector,
    Hybrid,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Lexical => write!(f, "lexical"),
            Origin::Vector => write!(f, "vector"),
            Origin::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// One normalized similar-document hit.
///
/// Before fusion, `score` is on the backend-native scale and the subscore
/// matching `origin` mirrors it. After fusion, `score` is the weighted
/// combination of the [0, 1]-normalized subscores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Display title (first value when the index field is multivalued)
    pub title: String,
    /// Target URL, empty when the index document carries none
    pub url: String,
    /// Raw type token from the index document
    pub doc_type: String,
    /// Display label for the type; defaults to the raw type token
    pub type_label: String,
    /// Ranking score (backend-native pre-fusion, fused afterwards)
    pub score: f64,
    /// Lexical subscore, set by the lexical leg or zero-filled by fusion
    pub lexical_score: Option<f64>,
    /// Vector subscore, set by the vector leg or zero-filled by fusion
    pub vector_score: Option<f64>,
    /// Markup-stripped, truncated content preview
    pub snippet: String,
    /// Reference to the candidate document
    pub document: DocumentRef,
    /// Retrieval leg(s) that produced this candidate
    pub origin: Origin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_ref_rejects_zero_uid() {
        assert!(DocumentRef::new("pages", 0).is_err());
    }

    #[test]
    fn test_document_ref_rejects_empty_type() {
        assert!(DocumentRef::new("  ", 7).is_err());
    }

    #[test]
    fn test_document_ref_display() {
        let doc = DocumentRef::new("pages", 42).unwrap();
        assert_eq!(doc.to_string(), "pages:42");
    }

    #[test]
    fn test_origin_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Origin::Hybrid).unwrap(), "\"hybrid\"");
    }
}
