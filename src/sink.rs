/// Suggestion persistence sink
///
/// Optional seam for callers that precompute suggestions ahead of display:
/// replace-by-key persistence of one document's ranked suggestion set.
/// Retrieval never depends on a sink write succeeding; failures are logged
/// by the caller and the computed results are still returned.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::backend::routing::PartitionKey;
use crate::document::{Candidate, DocumentRef};
use crate::errors::KindredError;

/// One persisted suggestion set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSuggestions {
    pub document: DocumentRef,
    pub partition: PartitionKey,
    pub candidates: Vec<Candidate>,
    /// Computation time, for staleness checks by consumers
    pub computed_at: DateTime<Utc>,
}

/// Replace-by-key persistence of ranked suggestion sets.
#[async_trait]
pub trait SuggestionSink: Send + Sync {
    /// Idempotently replace the stored suggestions for one document.
    async fn replace(
        &self,
        document: &DocumentRef,
        partition: PartitionKey,
        candidates: &[Candidate],
    ) -> Result<(), KindredError>;
}

/// In-memory sink for tests and single-process precompute runs.
#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<HashMap<DocumentRef, StoredSuggestions>>,
}

impl MemorySink {
    pub fn new() -> Self {
        MemorySink::default()
    }

    /// Stored suggestions for a document, if any.
    pub async fn get(&self, document: &DocumentRef) -> Option<StoredSuggestions> {
        self.entries.lock().await.get(document).cloned()
    }

    /// Number of documents with stored suggestions.
    pub async fn count(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl SuggestionSink for MemorySink {
    async fn replace(
        &self,
        document: &DocumentRef,
        partition: PartitionKey,
        candidates: &[Candidate],
    ) -> Result<(), KindredError> {
        let record = StoredSuggestions {
            document: document.clone(),
            partition,
            candidates: candidates.to_vec(),
            computed_at: Utc::now(),
        };
        self.entries.lock().await.insert(document.clone(), record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Origin;

    fn candidate(uid: u32, score: f64) -> Candidate {
        Candidate {
            title: format!("doc-{}", uid),
            url: String::new(),
            doc_type: "pages".to_string(),
            type_label: "pages".to_string(),
            score,
            lexical_score: Some(score),
            vector_score: Some(0.0),
            snippet: String::new(),
            document: DocumentRef {
                doc_type: "pages".to_string(),
                uid,
            },
            origin: Origin::Lexical,
        }
    }

    #[tokio::test]
    async fn test_replace_stores_and_overwrites() {
        let sink = MemorySink::new();
        let document = DocumentRef::new("pages", 42).unwrap();
        let partition = PartitionKey {
            root_id: 1,
            language_id: 0,
        };

        sink.replace(&document, partition, &[candidate(1, 0.9), candidate(2, 0.5)])
            .await
            .unwrap();
        sink.replace(&document, partition, &[candidate(3, 0.7)])
            .await
            .unwrap();

        assert_eq!(sink.count().await, 1);
        let stored = sink.get(&document).await.unwrap();
        assert_eq!(stored.candidates.len(), 1);
        assert_eq!(stored.candidates[0].document.uid, 3);
        assert!(stored.computed_at <= Utc::now());
    }

    #[tokio::test]
    async fn test_get_unknown_document_is_none() {
        let sink = MemorySink::new();
        let document = DocumentRef::new("pages", 7).unwrap();
        assert!(sink.get(&document).await.is_none());
    }
}
