/// Bulk suggestion precompute
///
/// Enumerates the indexed documents under a root container and runs one
/// retrieval per document, letting the service's sink persist each result.
/// Calls are serialized with an optional throttle between them so a backend
/// partition never sees a burst. Per-document failures are counted and
/// skipped; they never abort the rest of the run.

use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::warn;

use crate::backend::routing::PartitionKey;
use crate::errors::KindredError;
use crate::service::SimilarityService;

/// Outcome counters for one bulk run.
#[derive(Debug, Clone, Serialize)]
pub struct BulkReport {
    pub root_id: u32,
    pub language_id: u32,
    /// Documents the run attempted
    pub processed: usize,
    /// Documents that ended with at least one suggestion
    pub suggested: usize,
    /// Documents that ended with none
    pub empty: usize,
    /// Documents whose retrieval failed outright
    pub failed: usize,
    pub elapsed_ms: u64,
}

/// Precompute suggestions for every indexed document under a root container.
///
/// `limit` additionally caps the enumerated set, on top of the configured
/// enumeration page size.
pub async fn run_bulk(
    service: &SimilarityService,
    root_id: u32,
    language_id: u32,
    limit: Option<usize>,
) -> Result<BulkReport, KindredError> {
    let started = Instant::now();

    let mut documents = service.enumerate(root_id, language_id).await?;
    if let Some(limit) = limit {
        documents.truncate(limit);
    }

    let throttle_ms = service.config().bulk.throttle_ms;
    let context = PartitionKey {
        root_id,
        language_id,
    };

    // Progress bar showing the current document and elapsed time
    let pb = ProgressBar::new(documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{pos}/{len}] {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut report = BulkReport {
        root_id,
        language_id,
        processed: 0,
        suggested: 0,
        empty: 0,
        failed: 0,
        elapsed_ms: 0,
    };

    for document in documents {
        pb.set_message(document.to_string());
        report.processed += 1;

        match service.find_similar_in(&document, context).await {
            Ok(candidates) if candidates.is_empty() => report.empty += 1,
            Ok(_) => report.suggested += 1,
            Err(e) => {
                warn!(
                    document = %document,
                    error = %e,
                    "Bulk retrieval failed for document, continuing"
                );
                report.failed += 1;
            }
        }
        pb.inc(1);

        if throttle_ms > 0 {
            tokio::time::sleep(Duration::from_millis(throttle_ms)).await;
        }
    }
    pb.finish_with_message("done");

    report.elapsed_ms = started.elapsed().as_millis() as u64;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::routing::{Partition, PartitionResolver};
    use crate::backend::{BackendError, IndexedDocument, RawResponse, SearchBackend};
    use crate::config::{Config, PartitionConfig};
    use crate::document::DocumentRef;
    use crate::query::QueryDescriptor;
    use crate::sink::MemorySink;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;

    struct StubBackend {
        suggest: bool,
    }

    #[async_trait]
    impl SearchBackend for StubBackend {
        async fn execute(
            &self,
            _partition: &Partition,
            query: &QueryDescriptor,
        ) -> Result<RawResponse, BackendError> {
            let docs = if self.suggest {
                json!([{ "type": "pages", "uid": 9, "title": "Hit", "score": 3.0 }])
            } else {
                json!([])
            };
            Ok(RawResponse {
                algorithm: query.algorithm,
                body: json!({ "moreLikeThis": ["id", { "docs": docs }] }),
            })
        }

        async fn resolve_document(
            &self,
            _partition: &Partition,
            document: &DocumentRef,
        ) -> Result<Option<IndexedDocument>, BackendError> {
            Ok(Some(IndexedDocument {
                id: format!("site/{}/{}", document.doc_type, document.uid),
                title: "Source".to_string(),
                content: String::new(),
            }))
        }

        async fn enumerate_documents(
            &self,
            _partition: &Partition,
            _root_id: u32,
            _excluded_types: &[String],
            _limit: u32,
        ) -> Result<Vec<DocumentRef>, BackendError> {
            Ok(vec![
                DocumentRef::new("pages", 1).unwrap(),
                DocumentRef::new("pages", 2).unwrap(),
                DocumentRef::new("news", 3).unwrap(),
            ])
        }
    }

    struct NoResolver;

    #[async_trait]
    impl PartitionResolver for NoResolver {
        async fn resolve(&self, _document: &DocumentRef) -> Option<PartitionKey> {
            None
        }
    }

    fn test_service(suggest: bool) -> (SimilarityService, Arc<MemorySink>) {
        let mut config = Config::default();
        config.similarity.mode = "lexical".to_string();
        config.backend.partitions = vec![PartitionConfig {
            root_id: 1,
            language_id: 0,
            url: "http://stub".to_string(),
        }];

        let sink = Arc::new(MemorySink::new());
        let service = SimilarityService::new(
            config,
            Arc::new(StubBackend { suggest }),
            Arc::new(NoResolver),
        )
        .unwrap()
        .with_sink(sink.clone());
        (service, sink)
    }

    #[tokio::test]
    async fn test_bulk_run_counts_and_persists() {
        let (service, sink) = test_service(true);

        let report = run_bulk(&service, 1, 0, None).await.unwrap();

        assert_eq!(report.processed, 3);
        assert_eq!(report.suggested, 3);
        assert_eq!(report.empty, 0);
        assert_eq!(report.failed, 0);
        assert_eq!(sink.count().await, 3);
    }

    #[tokio::test]
    async fn test_bulk_run_counts_empty_results() {
        let (service, _sink) = test_service(false);

        let report = run_bulk(&service, 1, 0, None).await.unwrap();

        assert_eq!(report.processed, 3);
        assert_eq!(report.suggested, 0);
        assert_eq!(report.empty, 3);
    }

    #[tokio::test]
    async fn test_bulk_run_respects_limit() {
        let (service, sink) = test_service(true);

        let report = run_bulk(&service, 1, 0, Some(2)).await.unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(sink.count().await, 2);
    }
}
